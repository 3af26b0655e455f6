//! Vanilla structure block `.nbt` codec.
//!
//! ```txt
//! root
//! ├─ DataVersion   int, optional
//! ├─ size          list of 3 ints
//! ├─ palette       list of {Name, Properties}
//! │                (or palettes, a list of such lists, of which the first is used)
//! ├─ blocks        list of {pos: [3 ints], state: int, nbt: {}}
//! ├─ entities      list of {pos: [3 doubles], blockPos: [3 ints], nbt: {}}
//! ├─ author        string, optional, from old versions
//! └─ Metadata      compound, optional
//! ```
//!
//! Cells not listed in `blocks` are air.

use super::{
    check_size,
    stored_data_version,
    read_palette_list,
    write_palette_list,
};
use crate::{
    aux_data::{
        BlockPosLayout,
        EntityInfo,
    },
    block::BlockState,
    error::{
        Result,
        error,
        bail,
        ensure,
    },
    metadata::SchematicMetadata,
    nbt,
    registry::CodecContext,
    schematic::Schematic,
};
use region_data::{
    PackedIntArray,
    VoxelContainer,
    bits_for_len,
    contains,
    index_of,
    volume,
};
use quartz_nbt::{
    NbtCompound,
    NbtList,
    NbtTag,
};
use std::collections::HashMap;
use vek::*;


const BLOCK_POS: BlockPosLayout = BlockPosLayout::Fields;


pub fn decode(root: &NbtCompound, ctx: &CodecContext) -> Result<Schematic> {
    let data_version = stored_data_version(root, "DataVersion");
    ctx.note_stored_version(data_version);

    let mut metadata = SchematicMetadata::read_from_root(root);
    if metadata.author.is_empty() {
        if let Some(author) = nbt::opt_str(root, "author") {
            metadata.author = author.to_owned();
        }
    }

    let size = nbt::read_int_triple(root, "size")
        .ok_or_else(|| error!(MalformedTag, Some("size"), "missing structure size"))?;
    let size = check_size(size, "size")?;

    let (palette_list, palette_path) = match nbt::opt_list(root, "palette") {
        Some(list) => (list, "palette".to_owned()),
        None => {
            let palettes = nbt::req_list(root, "palettes", "")?;
            if palettes.len() > 1 {
                debug!(count = palettes.len(), "structure has palette variants, using the first");
            }
            match palettes.iter().next() {
                Some(&NbtTag::List(ref list)) => (list, nbt::elem("palettes", 0)),
                _ => return Err(error!(
                    MalformedTag, Some("palettes"), "expected a list of palettes",
                )),
            }
        }
    };
    let mut palette = read_palette_list(palette_list, data_version, ctx, &palette_path)?;

    // listed cells hold their state plus one, unlisted cells stay 0
    let len = volume(size);
    let mut listed = PackedIntArray::new(bits_for_len(palette.len() + 1), len);
    let mut listed_count = 0;
    let mut block_entities = HashMap::new();
    let blocks = nbt::req_list(root, "blocks", "")?;
    for i in 0..blocks.len() {
        let path = nbt::elem("blocks", i);
        let block = nbt::compound_at(blocks, i, "blocks")?;
        let pos = nbt::read_int_triple(block, "pos")
            .ok_or_else(|| error!(MalformedTag, Some(&nbt::child(&path, "pos")), "missing block position"))?;
        let index = index_of(size, pos)
            .ok_or_else(|| error!(
                MalformedTag, Some(&nbt::child(&path, "pos")),
                "block position {:?} outside structure of size {:?}", pos, size,
            ))?;
        let state = nbt::req_int(block, "state", &path)?;
        ensure!(
            state >= 0 && (state as usize) < palette.len(),
            MalformedTag, Some(&nbt::child(&path, "state")),
            "state {} not in palette of {} entries", state, palette.len(),
        );
        if listed.get(index) == 0 {
            listed_count += 1;
        }
        listed.set(index, state as u32 + 1);

        if let Some(data) = nbt::opt_compound(block, "nbt") {
            let mut data = data.clone();
            BLOCK_POS.strip(&mut data);
            if !data.inner().is_empty() {
                block_entities.insert(pos, data);
            }
        }
    }

    // unlisted cells are air, which may need adding to the palette
    let unlisted = len - listed_count;
    let air = if unlisted > 0 {
        trace!(unlisted, "filling unlisted structure cells with air");
        palette.intern(BlockState::air())
    } else {
        0
    };
    let blocks = VoxelContainer::from_ids(
        size,
        palette,
        listed.iter().map(|id| id.checked_sub(1).unwrap_or(air)),
    )?;

    let entities = nbt::opt_list(root, "entities")
        .map(read_entities)
        .unwrap_or_default();

    Ok(Schematic::from_parts(metadata, blocks, entities, block_entities))
}

fn read_entities(list: &NbtList) -> Vec<EntityInfo> {
    let mut entities = Vec::new();
    for entity in nbt::compounds(list) {
        let pos = nbt::read_vec3d_list(entity, "pos");
        let data = nbt::opt_compound(entity, "nbt");
        match (pos, data) {
            (Some(pos), Some(data)) if !data.inner().is_empty() => {
                entities.push(EntityInfo::new(pos, data.clone()));
            }
            _ => trace!("dropping structure entity without position or data"),
        }
    }
    entities
}

pub fn encode(schematic: &Schematic, ctx: &CodecContext) -> Result<NbtCompound> {
    let container = schematic.blocks();
    let block_entities = schematic.block_entities();

    // a block entity can only be stored on a listed cell
    if let Some(pos) = block_entities.keys().find(|&&pos| !contains(schematic.size(), pos)) {
        bail!(
            Unrepresentable, None,
            "block entity at {:?} outside structure of size {:?}", pos, schematic.size(),
        );
    }

    let air = BlockState::air();
    let mut blocks = Vec::new();
    for (pos, state) in container.iter() {
        let data = block_entities.get(&pos);
        if *state == air && data.is_none() {
            continue;
        }
        let mut block = NbtCompound::new();
        block.insert("pos", nbt::int_list_triple(pos));
        block.insert("state", NbtTag::Int(container.get_id(pos) as i32));
        if let Some(data) = data {
            let mut data = data.clone();
            BLOCK_POS.inject(&mut data, pos);
            block.insert("nbt", NbtTag::Compound(data));
        }
        blocks.push(NbtTag::Compound(block));
    }

    let entities = schematic.entities()
        .iter()
        .map(|entity| {
            let mut tag = NbtCompound::new();
            tag.insert("pos", nbt::vec3d_list(entity.pos));
            tag.insert("blockPos", nbt::int_list_triple(entity.pos.map(|n| n.floor() as i32)));
            tag.insert("nbt", NbtTag::Compound(entity.data.clone()));
            NbtTag::Compound(tag)
        })
        .collect::<Vec<NbtTag>>();

    let metadata = schematic.metadata();
    let mut root = NbtCompound::new();
    root.insert("DataVersion", NbtTag::Int(ctx.data_version));
    root.insert("size", nbt::int_list_triple(schematic.size()));
    root.insert("palette", NbtTag::List(write_palette_list(container.palette(), ctx)));
    root.insert("blocks", NbtTag::List(NbtList::from(blocks)));
    root.insert("entities", NbtTag::List(NbtList::from(entities)));
    if !metadata.author.is_empty() {
        root.insert("author", NbtTag::String(metadata.author.clone()));
    }
    root.insert("Metadata", NbtTag::Compound(metadata.to_tag()));
    Ok(root)
}
