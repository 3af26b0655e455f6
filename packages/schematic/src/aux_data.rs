//! Tables of entities and block entities carried alongside the blocks.
//!
//! Both are opaque tag blobs as far as this library is concerned. An entity
//! keeps its precise position inside its blob as well as alongside it. A
//! block entity is keyed by its block position, which is stripped out of the
//! blob on read and injected back on write.

use crate::nbt;
use quartz_nbt::{
    NbtCompound,
    NbtList,
    NbtTag,
};
use std::collections::HashMap;
use vek::*;


/// An entity: precise position plus opaque data.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInfo {
    pub pos: Vec3<f64>,
    pub data: NbtCompound,
}

impl EntityInfo {
    pub fn new(pos: Vec3<f64>, data: NbtCompound) -> Self {
        EntityInfo { pos, data }
    }

    /// Translate by an offset, keeping the position stored in the blob under
    /// `pos_key` in agreement.
    pub fn translate(&mut self, offset: Vec3<f64>, pos_key: &str) {
        self.pos += offset;
        if nbt::get(&self.data, pos_key).is_some() {
            self.data.insert(pos_key, nbt::vec3d_list(self.pos));
        }
    }
}

/// How a block entity's position is stored within its blob.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockPosLayout {
    /// Separate `x`, `y`, `z` integer fields.
    Fields,
    /// One int array of three elements under the given key.
    IntArray(&'static str),
}

impl BlockPosLayout {
    /// Read the position from a blob.
    pub fn read(self, tag: &NbtCompound) -> Option<Vec3<i32>> {
        match self {
            BlockPosLayout::Fields => nbt::read_block_pos(tag),
            BlockPosLayout::IntArray(key) => nbt::read_int_triple(tag, key),
        }
    }

    /// Remove the position from a blob.
    pub fn strip(self, tag: &mut NbtCompound) {
        match self {
            BlockPosLayout::Fields => nbt::remove_block_pos(tag),
            BlockPosLayout::IntArray(key) => {
                nbt::remove(tag, key);
            }
        }
    }

    /// Write the position into a blob.
    pub fn inject(self, tag: &mut NbtCompound, pos: Vec3<i32>) {
        match self {
            BlockPosLayout::Fields => nbt::put_block_pos(tag, pos),
            BlockPosLayout::IntArray(key) => {
                tag.insert(key, nbt::int_array_triple(pos));
            }
        }
    }
}

/// Read an entity table, with each entity's position stored under `pos_key`
/// as a list of three doubles.
///
/// Elements whose position is missing or unreadable are dropped, as are
/// empty ones. Order is kept.
pub fn read_entities(list: &NbtList, pos_key: &str) -> Vec<EntityInfo> {
    let mut entities = Vec::new();
    let mut dropped = 0;
    for (i, tag) in list.iter().enumerate() {
        let data = match tag {
            &NbtTag::Compound(ref data) => data,
            _ => {
                dropped += 1;
                continue;
            }
        };
        match nbt::read_vec3d_list(data, pos_key) {
            Some(pos) if !data.inner().is_empty() => {
                entities.push(EntityInfo::new(pos, data.clone()));
            }
            _ => {
                trace!(index = i, "dropping entity without position");
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        debug!(dropped, kept = entities.len(), "dropped unreadable entities");
    }
    entities
}

/// Write an entity table. Blobs are written as they are.
pub fn write_entities(entities: &[EntityInfo]) -> NbtList {
    NbtList::from(entities.iter()
        .map(|entity| NbtTag::Compound(entity.data.clone()))
        .collect::<Vec<NbtTag>>())
}

/// Read a block entity table.
///
/// Each blob has its position extracted and stripped. Elements whose
/// position is missing, or which are empty once it is stripped, are dropped.
/// When two elements share a position the later one wins.
pub fn read_block_entities(
    list: &NbtList,
    layout: BlockPosLayout,
) -> HashMap<Vec3<i32>, NbtCompound> {
    let mut block_entities = HashMap::new();
    let mut dropped = 0;
    for tag in nbt::compounds(list) {
        let mut data = tag.clone();
        let pos = layout.read(&data);
        layout.strip(&mut data);
        match pos {
            Some(pos) if !data.inner().is_empty() => {
                if block_entities.insert(pos, data).is_some() {
                    debug!(?pos, "duplicate block entity position, keeping the later one");
                }
            }
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        debug!(dropped, kept = block_entities.len(), "dropped unreadable block entities");
    }
    block_entities
}

/// Write a block entity table, injecting each key position back into a copy
/// of its blob. Output is ordered by position, Y then Z then X.
pub fn write_block_entities(
    block_entities: &HashMap<Vec3<i32>, NbtCompound>,
    layout: BlockPosLayout,
) -> NbtList {
    NbtList::from(sorted_block_entities(block_entities)
        .into_iter()
        .map(|(pos, data)| {
            let mut data = data.clone();
            layout.inject(&mut data, pos);
            NbtTag::Compound(data)
        })
        .collect::<Vec<NbtTag>>())
}

/// Block entities ordered by position, Y then Z then X.
pub fn sorted_block_entities(
    block_entities: &HashMap<Vec3<i32>, NbtCompound>,
) -> Vec<(Vec3<i32>, &NbtCompound)> {
    let mut sorted = block_entities.iter()
        .map(|(&pos, data)| (pos, data))
        .collect::<Vec<_>>();
    sorted.sort_by_key(|&(pos, _)| (pos.y, pos.z, pos.x));
    sorted
}


#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, pos: Option<Vec3<f64>>) -> NbtTag {
        let mut tag = NbtCompound::new();
        tag.insert("id", NbtTag::String(id.into()));
        if let Some(pos) = pos {
            tag.insert("Pos", nbt::vec3d_list(pos));
        }
        NbtTag::Compound(tag)
    }

    fn chest(pos: Vec3<i32>, lock: &str) -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.insert("id", NbtTag::String("minecraft:chest".into()));
        tag.insert("Lock", NbtTag::String(lock.into()));
        nbt::put_block_pos(&mut tag, pos);
        tag
    }

    #[test]
    fn test_entities_filtered_in_order() {
        let list = NbtList::from(vec![
            entity("minecraft:pig", Some(Vec3::new(1.5, 0.0, 2.5))),
            entity("minecraft:cow", None),
            NbtTag::Int(3),
            entity("minecraft:sheep", Some(Vec3::new(0.5, 1.0, 0.5))),
        ]);
        let entities = read_entities(&list, "Pos");
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].pos, Vec3::new(1.5, 0.0, 2.5));
        assert_eq!(nbt::opt_str(&entities[1].data, "id"), Some("minecraft:sheep"));
        // position stays in the blob
        assert!(nbt::get(&entities[0].data, "Pos").is_some());

        let written = write_entities(&entities);
        assert_eq!(read_entities(&written, "Pos"), entities);
    }

    #[test]
    fn test_entity_translate() {
        let list = NbtList::from(vec![entity("minecraft:pig", Some(Vec3::new(1.0, 2.0, 3.0)))]);
        let mut entity = read_entities(&list, "Pos").remove(0);
        entity.translate(Vec3::new(-1.0, 0.0, 1.0), "Pos");
        assert_eq!(entity.pos, Vec3::new(0.0, 2.0, 4.0));
        assert_eq!(nbt::read_vec3d_list(&entity.data, "Pos"), Some(entity.pos));
    }

    #[test]
    fn test_block_entities_fields() {
        let mut empty_once_stripped = NbtCompound::new();
        nbt::put_block_pos(&mut empty_once_stripped, Vec3::new(9, 9, 9));
        let mut no_pos = chest(Vec3::zero(), "x");
        nbt::remove_block_pos(&mut no_pos);

        let list = NbtList::from(vec![
            NbtTag::Compound(chest(Vec3::new(2, 0, 1), "first")),
            NbtTag::Compound(empty_once_stripped),
            NbtTag::Compound(no_pos),
            NbtTag::Compound(chest(Vec3::new(2, 0, 1), "second")),
            NbtTag::Compound(chest(Vec3::new(0, 1, 0), "third")),
        ]);
        let block_entities = read_block_entities(&list, BlockPosLayout::Fields);
        assert_eq!(block_entities.len(), 2);
        let at = &block_entities[&Vec3::new(2, 0, 1)];
        assert_eq!(nbt::opt_str(at, "Lock"), Some("second"));
        assert!(nbt::read_block_pos(at).is_none());

        let written = write_block_entities(&block_entities, BlockPosLayout::Fields);
        let positions = nbt::compounds(&written)
            .map(|tag| nbt::read_block_pos(tag).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(positions, vec![Vec3::new(2, 0, 1), Vec3::new(0, 1, 0)]);
        assert_eq!(read_block_entities(&written, BlockPosLayout::Fields), block_entities);
    }

    #[test]
    fn test_block_entities_int_array() {
        let mut tag = NbtCompound::new();
        tag.insert("Id", NbtTag::String("minecraft:sign".into()));
        tag.insert("Pos", NbtTag::IntArray(vec![3, 4, 5]));
        let list = NbtList::from(vec![NbtTag::Compound(tag)]);

        let layout = BlockPosLayout::IntArray("Pos");
        let block_entities = read_block_entities(&list, layout);
        let data = &block_entities[&Vec3::new(3, 4, 5)];
        assert!(nbt::get(data, "Pos").is_none());

        let written = write_block_entities(&block_entities, layout);
        let tag = nbt::compound_at(&written, 0, "").unwrap();
        assert_eq!(nbt::read_int_triple(tag, "Pos"), Some(Vec3::new(3, 4, 5)));
    }
}
