//! The in-memory schematic, independent of any file format.

use crate::{
    aux_data::EntityInfo,
    block::BlockState,
    error::{
        Result,
        error,
    },
    metadata::SchematicMetadata,
};
use region_data::{
    VoxelContainer,
    contains,
    copy_overlap,
};
use quartz_nbt::NbtCompound;
use std::{
    collections::HashMap,
    path::{
        Path,
        PathBuf,
    },
};
use vek::*;


/// A cuboid region of block states, plus its entities, block entities and
/// descriptive metadata.
///
/// The region size is fixed for the life of a schematic. `resized` makes a
/// new one.
#[derive(Debug, Clone)]
pub struct Schematic {
    file: Option<PathBuf>,
    metadata: SchematicMetadata,
    blocks: VoxelContainer<BlockState>,
    entities: Vec<EntityInfo>,
    block_entities: HashMap<Vec3<i32>, NbtCompound>,
    total_blocks_read_from_world: u64,
}

impl Schematic {
    /// Construct an all-air schematic.
    pub fn new(size: Vec3<i32>) -> Result<Self> {
        let blocks = VoxelContainer::new(size, BlockState::air())?;
        Ok(Self::from_parts(
            SchematicMetadata::default(),
            blocks,
            Vec::new(),
            HashMap::new(),
        ))
    }

    /// Assemble from decoded parts. The metadata's region size is set from
    /// the blocks.
    pub fn from_parts(
        mut metadata: SchematicMetadata,
        blocks: VoxelContainer<BlockState>,
        entities: Vec<EntityInfo>,
        block_entities: HashMap<Vec3<i32>, NbtCompound>,
    ) -> Self {
        metadata.region_size = blocks.size();
        Schematic {
            file: None,
            metadata,
            blocks,
            entities,
            block_entities,
            total_blocks_read_from_world: 0,
        }
    }

    pub fn metadata(&self) -> &SchematicMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut SchematicMetadata {
        &mut self.metadata
    }

    pub fn size(&self) -> Vec3<i32> {
        self.blocks.size()
    }

    pub fn blocks(&self) -> &VoxelContainer<BlockState> {
        &self.blocks
    }

    /// Panics if `pos` is outside the region.
    pub fn block(&self, pos: Vec3<i32>) -> &BlockState {
        self.blocks.get(pos)
    }

    pub fn try_block(&self, pos: Vec3<i32>) -> Option<&BlockState> {
        self.blocks.try_get(pos)
    }

    /// Fails with `OutOfBounds` if `pos` is outside the region.
    pub fn set_block(&mut self, pos: Vec3<i32>, state: BlockState) -> Result<()> {
        if !contains(self.size(), pos) {
            return Err(error!(
                OutOfBounds, None, "{:?} outside region of size {:?}", pos, self.size(),
            ));
        }
        self.blocks.set(pos, state);
        Ok(())
    }

    pub fn entities(&self) -> &[EntityInfo] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut Vec<EntityInfo> {
        &mut self.entities
    }

    pub fn block_entities(&self) -> &HashMap<Vec3<i32>, NbtCompound> {
        &self.block_entities
    }

    pub fn block_entities_mut(&mut self) -> &mut HashMap<Vec3<i32>, NbtCompound> {
        &mut self.block_entities
    }

    /// The file this schematic was read from, if any.
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
    }

    /// Number of blocks captured when this schematic was taken from a world.
    /// Not stored in any file format.
    pub fn total_blocks_read_from_world(&self) -> u64 {
        self.total_blocks_read_from_world
    }

    pub fn set_total_blocks_read_from_world(&mut self, n: u64) {
        self.total_blocks_read_from_world = n;
    }

    /// Recompute the derived metadata counts from the blocks.
    pub fn update_counts(&mut self) {
        let size = self.size();
        self.metadata.region_size = size;
        self.metadata.enclosing_size = size;
        self.metadata.region_count = 1;
        self.metadata.total_volume = self.blocks.volume() as i64;
        self.metadata.total_blocks = self.blocks.count(|state| !state.is_air()) as i64;
    }

    /// A copy with a different size. Content is kept where the old and new
    /// regions overlap. Entities and block entities outside the new region
    /// are dropped.
    pub fn resized(&self, new_size: Vec3<i32>) -> Result<Schematic> {
        let mut blocks = VoxelContainer::new(new_size, BlockState::air())?;
        copy_overlap(&self.blocks, &mut blocks);

        let bounds = new_size.map(|n| n as f64);
        let entities = self.entities.iter()
            .filter(|entity| {
                let p = entity.pos;
                p.x >= 0.0 && p.y >= 0.0 && p.z >= 0.0
                && p.x < bounds.x && p.y < bounds.y && p.z < bounds.z
            })
            .cloned()
            .collect::<Vec<_>>();
        let block_entities = self.block_entities.iter()
            .filter(|&(&pos, _)| contains(new_size, pos))
            .map(|(&pos, data)| (pos, data.clone()))
            .collect::<HashMap<_, _>>();
        let dropped = (self.entities.len() - entities.len())
            + (self.block_entities.len() - block_entities.len());
        if dropped > 0 {
            debug!(dropped, "resize dropped out-of-bounds entities and block entities");
        }

        let mut resized = Schematic::from_parts(
            self.metadata.clone(),
            blocks,
            entities,
            block_entities,
        );
        resized.file = self.file.clone();
        resized.update_counts();
        Ok(resized)
    }

    /// Whether two schematics hold the same content: metadata, palette
    /// order, cells, entities in order, and the same block entity set.
    pub fn content_eq(&self, other: &Schematic) -> bool {
        self.metadata == other.metadata
        && self.blocks == other.blocks
        && self.entities == other.entities
        && self.block_entities == other.block_entities
    }
}
