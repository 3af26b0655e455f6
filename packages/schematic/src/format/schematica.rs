//! Schematica / MCEdit `.schematic` codec.
//!
//! Blocks are stored as legacy numeric ids plus 4-bit metadata values, with
//! no palette. Ids are 12 bits wide: the low 8 bits in `Blocks` and, only if
//! some id needs them, the high 4 bits in the `AddBlocks` nibble array, where
//! even indices take the low nibble of a byte. Schematica writes a
//! `SchematicaMapping` from block name to id, which makes the file readable
//! without knowledge of any particular game version's id table.

use super::check_size;
use crate::{
    aux_data::{
        BlockPosLayout,
        read_entities,
        write_entities,
        read_block_entities,
        write_block_entities,
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
    registry::{
        CodecContext,
        MAX_LEGACY_META,
        is_legacy_air,
    },
    schematic::Schematic,
};
use region_data::{
    Palette,
    VoxelContainer,
    volume,
};
use quartz_nbt::{
    NbtCompound,
    NbtTag,
};
use std::collections::{
    HashMap,
    HashSet,
};
use vek::*;


const MATERIALS: &'static str = "Alpha";

/// Number of distinct legacy block ids.
const MAX_LEGACY_IDS: usize = 1 << 12;

/// Largest extent of a region on any axis.
const MAX_EXTENT: i32 = i16::MAX as i32;


pub fn decode(root: &NbtCompound, ctx: &CodecContext) -> Result<Schematic> {
    if let Some(materials) = nbt::opt_str(root, "Materials") {
        ensure!(
            materials == MATERIALS,
            UnsupportedFormat, Some("Materials"), "unsupported materials {:?}", materials,
        );
    }
    ctx.note_stored_version(None);

    let metadata = SchematicMetadata::read_from_root(root);

    let size = Vec3::new(
        nbt::req_i32(root, "Width", "")?,
        nbt::req_i32(root, "Height", "")?,
        nbt::req_i32(root, "Length", "")?,
    );
    let size = check_size(size, "")?;
    let len = volume(size);

    let blocks = nbt::req_byte_array(root, "Blocks", "")?;
    let data = nbt::req_byte_array(root, "Data", "")?;
    ensure!(
        blocks.len() >= len,
        MalformedTag, Some("Blocks"), "{} block ids for {} cells", blocks.len(), len,
    );
    ensure!(
        data.len() >= len,
        MalformedTag, Some("Data"), "{} block metas for {} cells", data.len(), len,
    );
    let add_blocks = nbt::opt_byte_array(root, "AddBlocks");
    if let Some(add_blocks) = add_blocks {
        ensure!(
            add_blocks.len() >= (len + 1) / 2,
            MalformedTag, Some("AddBlocks"), "{} nibble bytes for {} cells", add_blocks.len(), len,
        );
    }

    let mapping = read_mapping(root)?;

    let key_at = |i: usize| -> (u16, u8) {
        let mut legacy_id = blocks[i] as u8 as u16;
        if let Some(add_blocks) = add_blocks {
            let byte = add_blocks[i >> 1] as u8;
            let nibble = if i & 1 == 0 { byte & 0xf } else { byte >> 4 };
            legacy_id |= (nibble as u16) << 8;
        }
        (legacy_id, data[i] as u8 & 0xf)
    };

    // air is id 0, then states in legacy order, which is the order the
    // encoder assigns legacy ids in
    let mut keys = (0..len).map(key_at).collect::<HashSet<_>>().into_iter().collect::<Vec<_>>();
    keys.sort_unstable();
    let mut palette = Palette::with_default(BlockState::air());
    let mut resolved: HashMap<(u16, u8), u32> = HashMap::with_capacity(keys.len());
    for (legacy_id, meta) in keys {
        let state = resolve(legacy_id, meta, &mapping, ctx)?;
        resolved.insert((legacy_id, meta), palette.intern(state));
    }
    let ids = (0..len).map(|i| resolved[&key_at(i)]);
    let blocks = VoxelContainer::from_ids(size, palette, ids)?;

    let entities = nbt::opt_list(root, "Entities")
        .map(|list| read_entities(list, "Pos"))
        .unwrap_or_default();
    let block_entities = nbt::opt_list(root, "TileEntities")
        .map(|list| read_block_entities(list, BlockPosLayout::Fields))
        .unwrap_or_default();

    Ok(Schematic::from_parts(metadata, blocks, entities, block_entities))
}

/// Read the name mapping as id to name.
fn read_mapping(root: &NbtCompound) -> Result<HashMap<u16, String>> {
    let mut mapping = HashMap::new();
    if let Some(tag) = nbt::opt_compound(root, "SchematicaMapping") {
        for (name, id) in tag.inner() {
            let id = nbt::as_int(id)
                .and_then(|id| u16::try_from(id).ok())
                .filter(|&id| (id as usize) < MAX_LEGACY_IDS)
                .ok_or_else(|| error!(
                    MalformedTag,
                    Some(&nbt::child("SchematicaMapping", name)),
                    "invalid legacy block id",
                ))?;
            if let Some(previous) = mapping.insert(id, name.clone()) {
                debug!(id, %previous, %name, "legacy block id mapped twice");
            }
        }
    }
    Ok(mapping)
}

fn resolve(
    legacy_id: u16,
    meta: u8,
    mapping: &HashMap<u16, String>,
    ctx: &CodecContext,
) -> Result<BlockState> {
    let name = match mapping.get(&legacy_id) {
        Some(name) => name.clone(),
        None if legacy_id == 0 => BlockState::air().name,
        None => ctx.registry.legacy_name(legacy_id)
            .ok_or_else(|| error!(
                MalformedTag, Some("Blocks"),
                "legacy block id {} not in the mapping or the registry", legacy_id,
            ))?,
    };
    ctx.registry.resolve_legacy(&name, meta)
}

pub fn encode(schematic: &Schematic, ctx: &CodecContext) -> Result<NbtCompound> {
    let size = schematic.size();
    ensure!(
        size.x <= MAX_EXTENT && size.y <= MAX_EXTENT && size.z <= MAX_EXTENT,
        Unrepresentable, None, "region size {:?} exceeds {} on some axis", size, MAX_EXTENT,
    );
    let container = schematic.blocks();
    let palette = container.palette();

    // only palette entries some cell uses need a legacy form
    let mut used = vec![false; palette.len()];
    for id in container.ids() {
        used[id as usize] = true;
    }

    let mut name_ids: HashMap<String, u16> = HashMap::new();
    let mut next_id: usize = 1;
    let mut legacy: Vec<(u16, u8)> = vec![(0, 0); palette.len()];
    for (id, state) in palette.iter() {
        if !used[id as usize] {
            continue;
        }
        let (name, meta) = ctx.registry.serialize_legacy(state)?;
        ensure!(
            meta <= MAX_LEGACY_META,
            Unrepresentable, None, "legacy meta {} of {} above {}", meta, state, MAX_LEGACY_META,
        );
        let legacy_id = match name_ids.get(&name) {
            Some(&legacy_id) => legacy_id,
            None => {
                let legacy_id = if is_legacy_air(&name) {
                    0
                } else {
                    if next_id >= MAX_LEGACY_IDS {
                        bail!(
                            Unrepresentable, None,
                            "more than {} distinct block names", MAX_LEGACY_IDS - 1,
                        );
                    }
                    next_id += 1;
                    (next_id - 1) as u16
                };
                name_ids.insert(name, legacy_id);
                legacy_id
            }
        };
        legacy[id as usize] = (legacy_id, meta);
    }

    let len = container.volume();
    let mut blocks = vec![0i8; len];
    let mut data = vec![0i8; len];
    let mut add_blocks = vec![0i8; (len + 1) / 2];
    let mut needs_add = false;
    for (i, id) in container.ids().enumerate() {
        let (legacy_id, meta) = legacy[id as usize];
        blocks[i] = legacy_id as u8 as i8;
        data[i] = meta as i8;
        let high = (legacy_id >> 8) as u8 & 0xf;
        if high != 0 {
            needs_add = true;
            let shift = (i & 1) * 4;
            add_blocks[i >> 1] = (add_blocks[i >> 1] as u8 | (high << shift)) as i8;
        }
    }

    let mut mapping = NbtCompound::new();
    for (name, &legacy_id) in &name_ids {
        mapping.insert(name.clone(), NbtTag::Short(legacy_id as i16));
    }

    let mut root = NbtCompound::new();
    root.insert("Width", NbtTag::Short(size.x as i16));
    root.insert("Height", NbtTag::Short(size.y as i16));
    root.insert("Length", NbtTag::Short(size.z as i16));
    root.insert("Materials", NbtTag::String(MATERIALS.to_owned()));
    root.insert("Blocks", NbtTag::ByteArray(blocks));
    root.insert("Data", NbtTag::ByteArray(data));
    if needs_add {
        root.insert("AddBlocks", NbtTag::ByteArray(add_blocks));
    }
    root.insert("SchematicaMapping", NbtTag::Compound(mapping));
    root.insert("TileEntities", NbtTag::List(write_block_entities(
        schematic.block_entities(),
        BlockPosLayout::Fields,
    )));
    root.insert("Entities", NbtTag::List(write_entities(schematic.entities())));
    root.insert("Metadata", NbtTag::Compound(schematic.metadata().to_tag()));
    Ok(root)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::ErrorKind,
        format::tests::sample,
        registry::BlockRegistry,
    };

    fn cells_eq(a: &Schematic, b: &Schematic) -> bool {
        a.size() == b.size() && a.blocks().iter().all(|(pos, state)| b.block(pos) == state)
    }

    #[test]
    fn test_round_trip() {
        let ctx = CodecContext::default();
        let original = sample();
        let root = encode(&original, &ctx).unwrap();
        assert!(nbt::get(&root, "AddBlocks").is_none());
        let mapping = nbt::opt_compound(&root, "SchematicaMapping").unwrap();
        assert_eq!(nbt::opt_int(mapping, "minecraft:air"), Some(0));

        let decoded = decode(&root, &ctx).unwrap();
        assert!(cells_eq(&decoded, &original));
        assert_eq!(decoded.blocks().palette(), original.blocks().palette());
        assert_eq!(decoded.metadata(), original.metadata());
        assert_eq!(decoded.entities(), original.entities());
        assert_eq!(decoded.block_entities(), original.block_entities());
    }

    #[test]
    fn test_air_is_id_zero() {
        // no air cell, and the stored ids are not in first-seen order
        let mut root = NbtCompound::new();
        root.insert("Width", NbtTag::Short(3));
        root.insert("Height", NbtTag::Short(1));
        root.insert("Length", NbtTag::Short(1));
        root.insert("Blocks", NbtTag::ByteArray(vec![2, 1, 2]));
        root.insert("Data", NbtTag::ByteArray(vec![5, 0, 1]));
        let mut mapping = NbtCompound::new();
        mapping.insert("minecraft:stone", NbtTag::Short(1));
        mapping.insert("minecraft:wool", NbtTag::Short(2));
        root.insert("SchematicaMapping", NbtTag::Compound(mapping));

        let decoded = decode(&root, &CodecContext::default()).unwrap();
        let palette = decoded.blocks().palette().mapping();
        assert!(palette[0].is_air());
        assert_eq!(palette[1..], [
            BlockState::new("minecraft:stone"),
            BlockState::new("minecraft:wool").with("meta", "1"),
            BlockState::new("minecraft:wool").with("meta", "5"),
        ]);
        assert_eq!(decoded.block(Vec3::new(0, 0, 0)), &palette[3]);
    }

    #[test]
    fn test_add_blocks_nibbles() {
        let ctx = CodecContext::default();
        let mut schematic = Schematic::new(Vec3::new(300, 1, 1)).unwrap();
        for x in 0..300 {
            schematic.set_block(Vec3::new(x, 0, 0), BlockState::new(format!("test:block_{}", x))).unwrap();
        }
        let root = encode(&schematic, &ctx).unwrap();
        let add_blocks = nbt::opt_byte_array(&root, "AddBlocks").unwrap();
        assert_eq!(add_blocks.len(), 150);
        assert!(add_blocks.iter().any(|&b| b != 0));
        let decoded = decode(&root, &ctx).unwrap();
        assert!(cells_eq(&decoded, &schematic));
    }

    #[test]
    fn test_nibble_order() {
        // even index takes the low nibble
        let mut root = NbtCompound::new();
        root.insert("Width", NbtTag::Short(2));
        root.insert("Height", NbtTag::Short(1));
        root.insert("Length", NbtTag::Short(1));
        root.insert("Blocks", NbtTag::ByteArray(vec![1, 2]));
        root.insert("Data", NbtTag::ByteArray(vec![0, 3]));
        root.insert("AddBlocks", NbtTag::ByteArray(vec![0x21]));
        let mut mapping = NbtCompound::new();
        mapping.insert("test:low", NbtTag::Short(0x101));
        mapping.insert("test:high", NbtTag::Short(0x202));
        root.insert("SchematicaMapping", NbtTag::Compound(mapping));

        let decoded = decode(&root, &CodecContext::default()).unwrap();
        assert_eq!(decoded.block(Vec3::new(0, 0, 0)), &BlockState::new("test:low"));
        assert_eq!(
            decoded.block(Vec3::new(1, 0, 0)),
            &BlockState::new("test:high").with("meta", "3"),
        );
    }

    #[test]
    fn test_unmapped_ids() {
        let mut root = NbtCompound::new();
        root.insert("Width", NbtTag::Short(2));
        root.insert("Height", NbtTag::Short(1));
        root.insert("Length", NbtTag::Short(1));
        root.insert("Blocks", NbtTag::ByteArray(vec![0, 0]));
        root.insert("Data", NbtTag::ByteArray(vec![0, 0]));
        let decoded = decode(&root, &CodecContext::default()).unwrap();
        assert!(decoded.block(Vec3::new(1, 0, 0)).is_air());

        root.insert("Blocks", NbtTag::ByteArray(vec![0, 1]));
        let err = decode(&root, &CodecContext::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTag);
    }

    struct LegacyTable;

    impl BlockRegistry for LegacyTable {
        fn resolve(&self, tag: &NbtCompound, path: &str) -> Result<BlockState> {
            BlockState::from_tag(tag, path)
        }

        fn serialize(&self, state: &BlockState) -> NbtCompound {
            state.to_tag()
        }

        fn legacy_name(&self, id: u16) -> Option<String> {
            match id {
                1 => Some("minecraft:stone".into()),
                _ => None,
            }
        }

        fn resolve_legacy(&self, name: &str, meta: u8) -> Result<BlockState> {
            crate::registry::PassthroughRegistry.resolve_legacy(name, meta)
        }

        fn serialize_legacy(&self, state: &BlockState) -> Result<(String, u8)> {
            crate::registry::PassthroughRegistry.serialize_legacy(state)
        }
    }

    #[test]
    fn test_registry_legacy_names() {
        let mut root = NbtCompound::new();
        root.insert("Width", NbtTag::Short(1));
        root.insert("Height", NbtTag::Short(1));
        root.insert("Length", NbtTag::Short(1));
        root.insert("Blocks", NbtTag::ByteArray(vec![1]));
        root.insert("Data", NbtTag::ByteArray(vec![0]));
        let ctx = CodecContext {
            registry: &LegacyTable,
            ..CodecContext::default()
        };
        let decoded = decode(&root, &ctx).unwrap();
        assert_eq!(decoded.block(Vec3::zero()), &BlockState::new("minecraft:stone"));
    }

    #[test]
    fn test_unrepresentable() {
        let ctx = CodecContext::default();
        let mut schematic = Schematic::new(Vec3::new(1, 1, 2)).unwrap();
        schematic
            .set_block(Vec3::new(0, 0, 1), BlockState::new("minecraft:oak_log").with("axis", "y"))
            .unwrap();
        assert_eq!(encode(&schematic, &ctx).unwrap_err().kind(), ErrorKind::Unrepresentable);

        // unused palette entries are not encoded
        schematic.set_block(Vec3::new(0, 0, 1), "minecraft:stone".into()).unwrap();
        assert!(encode(&schematic, &ctx).is_ok());

        let big = Schematic::new(Vec3::new(40_000, 1, 1)).unwrap();
        assert_eq!(encode(&big, &ctx).unwrap_err().kind(), ErrorKind::Unrepresentable);
    }

    #[test]
    fn test_zero_size() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        root.insert("Height", NbtTag::Short(0));
        assert_eq!(decode(&root, &ctx).unwrap_err().kind(), ErrorKind::InvalidSize);
    }

    #[test]
    fn test_foreign_materials() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        root.insert("Materials", NbtTag::String("Pocket".into()));
        assert_eq!(decode(&root, &ctx).unwrap_err().kind(), ErrorKind::UnsupportedFormat);
    }
}
