//! Litematica `.litematic` codec.
//!
//! ```txt
//! root
//! ├─ Version               int, 1..=6
//! ├─ SubVersion            int, optional
//! ├─ MinecraftDataVersion  int, optional
//! ├─ Metadata              compound
//! └─ Regions               compound of named regions
//!    └─ <name>
//!       ├─ Position            {x, y, z}
//!       ├─ Size                {x, y, z}, components may be negative
//!       ├─ BlockStatePalette   list of {Name, Properties}
//!       ├─ BlockStates         long array, bit-packed ids
//!       ├─ Entities            list, position in Pos
//!       ├─ TileEntities        list, position in x, y, z
//!       └─ PendingBlockTicks   list
//! ```

use super::{
    check_size,
    stored_data_version,
    read_palette_list,
    write_palette_list,
};
use crate::{
    aux_data::{
        BlockPosLayout,
        read_entities,
        write_entities,
        read_block_entities,
        write_block_entities,
    },
    error::{
        Result,
        Error,
        error,
        ensure,
    },
    metadata::SchematicMetadata,
    nbt,
    registry::CodecContext,
    schematic::Schematic,
};
use region_data::{
    MIN_BITS,
    PackedIntArray,
    VoxelContainer,
    volume,
    word_count,
};
use quartz_nbt::{
    NbtCompound,
    NbtList,
    NbtTag,
};
use vek::*;


const MIN_VERSION: i64 = 1;
const MAX_VERSION: i64 = 6;

/// Version written by the encoder.
const WRITE_VERSION: i32 = 4;

/// Name of the region written for an unnamed schematic.
const DEFAULT_REGION_NAME: &'static str = "Main";


pub fn decode(root: &NbtCompound, ctx: &CodecContext) -> Result<Schematic> {
    let version = nbt::req_int(root, "Version", "")?;
    ensure!(
        (MIN_VERSION..=MAX_VERSION).contains(&version),
        UnsupportedFormat, Some("Version"), "litematica version {} not supported", version,
    );
    let data_version = stored_data_version(root, "MinecraftDataVersion");
    ctx.note_stored_version(data_version);

    let metadata = SchematicMetadata::read_from_root(root);

    let regions = nbt::req_compound(root, "Regions", "")?;
    let (name, region) = pick_region(regions, &metadata.name)?;
    let path = nbt::child("Regions", name);

    let size_path = nbt::child(&path, "Size");
    let size = nbt::read_vec3i_compound(region, "Size")
        .ok_or_else(|| error!(MalformedTag, Some(&size_path), "missing region size"))?;
    let size = check_size(size.map(|n| n.checked_abs().unwrap_or(0)), &size_path)?;

    let palette_path = nbt::child(&path, "BlockStatePalette");
    let palette = read_palette_list(
        nbt::req_list(region, "BlockStatePalette", &path)?,
        data_version,
        ctx,
        &palette_path,
    )?;

    let states_path = nbt::child(&path, "BlockStates");
    let longs = nbt::req_long_array(region, "BlockStates", &path)?;
    let bits = palette.bits_needed(MIN_BITS);
    let len = volume(size);
    let expected = word_count(bits, len);
    ensure!(
        longs.len() >= expected,
        MalformedTag, Some(&states_path),
        "{} words of block states, expected {}", longs.len(), expected,
    );
    if longs.len() > expected {
        debug!(extra = longs.len() - expected, "ignoring trailing block state words");
    }
    let words = longs[..expected].iter().map(|&n| n as u64).collect();
    let ids = PackedIntArray::from_words(bits, len, words)
        .map_err(|e| Error::from(e).at(&states_path))?;
    let blocks = VoxelContainer::from_packed(size, palette, ids)
        .map_err(|e| Error::from(e).at(&states_path))?;

    let entities = nbt::opt_list(region, "Entities")
        .map(|list| read_entities(list, "Pos"))
        .unwrap_or_default();
    let block_entities = nbt::opt_list(region, "TileEntities")
        .map(|list| read_block_entities(list, BlockPosLayout::Fields))
        .unwrap_or_default();

    Ok(Schematic::from_parts(metadata, blocks, entities, block_entities))
}

/// Choose the region to decode: the one named like the schematic, otherwise
/// the first by name.
fn pick_region<'a>(
    regions: &'a NbtCompound,
    schematic_name: &str,
) -> Result<(&'a str, &'a NbtCompound)> {
    let mut candidates = regions.inner()
        .iter()
        .filter_map(|(name, tag)| match tag {
            &NbtTag::Compound(ref region) => Some((name.as_str(), region)),
            _ => None,
        })
        .collect::<Vec<_>>();
    ensure!(!candidates.is_empty(), MalformedTag, Some("Regions"), "no regions");
    candidates.sort_by_key(|&(name, _)| name);

    let picked = candidates.iter()
        .position(|&(name, _)| name == schematic_name)
        .unwrap_or(0);
    if candidates.len() > 1 {
        warn!(
            picked = candidates[picked].0,
            ignored = candidates.len() - 1,
            "schematic has multiple regions, only one is read",
        );
    }
    Ok(candidates[picked])
}

pub fn encode(schematic: &Schematic, ctx: &CodecContext) -> Result<NbtCompound> {
    let blocks = schematic.blocks();
    let ids = blocks.packed_with_min_bits(MIN_BITS);
    let longs = ids.words()
        .iter()
        .map(|&word| word as i64)
        .collect::<Vec<i64>>();

    let mut region = NbtCompound::new();
    region.insert("Position", nbt::vec3i_compound(Vec3::zero()));
    region.insert("Size", nbt::vec3i_compound(schematic.size()));
    region.insert("BlockStatePalette", NbtTag::List(write_palette_list(blocks.palette(), ctx)));
    region.insert("BlockStates", NbtTag::LongArray(longs));
    region.insert("Entities", NbtTag::List(write_entities(schematic.entities())));
    region.insert("TileEntities", NbtTag::List(write_block_entities(
        schematic.block_entities(),
        BlockPosLayout::Fields,
    )));
    region.insert("PendingBlockTicks", NbtTag::List(NbtList::new()));

    let metadata = schematic.metadata();
    let region_name = if metadata.name.is_empty() {
        DEFAULT_REGION_NAME
    } else {
        metadata.name.as_str()
    };
    let mut regions = NbtCompound::new();
    regions.insert(region_name, NbtTag::Compound(region));

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(WRITE_VERSION));
    root.insert("SubVersion", NbtTag::Int(0));
    root.insert("MinecraftDataVersion", NbtTag::Int(ctx.data_version));
    root.insert("Metadata", NbtTag::Compound(metadata.to_tag()));
    root.insert("Regions", NbtTag::Compound(regions));
    Ok(root)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::BlockState,
        error::ErrorKind,
        format::tests::sample,
        registry::{
            PassthroughRegistry,
            VersionUpgrader,
        },
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn region_mut<'a>(root: &'a mut NbtCompound, name: &str) -> &'a mut NbtCompound {
        match root.inner_mut().get_mut("Regions") {
            Some(&mut NbtTag::Compound(ref mut regions)) => match regions.inner_mut().get_mut(name) {
                Some(&mut NbtTag::Compound(ref mut region)) => region,
                _ => panic!("no region {}", name),
            },
            _ => panic!("no regions"),
        }
    }

    #[test]
    fn test_round_trip() {
        let ctx = CodecContext::default();
        let original = sample();
        let root = encode(&original, &ctx).unwrap();
        assert_eq!(nbt::opt_int(&root, "Version"), Some(4));
        assert_eq!(nbt::opt_int(&root, "MinecraftDataVersion"), Some(ctx.data_version as i64));
        assert!(nbt::opt_compound(nbt::opt_compound(&root, "Regions").unwrap(), "sample").is_some());

        let decoded = decode(&root, &ctx).unwrap();
        assert!(decoded.content_eq(&original));
    }

    #[test]
    fn test_unnamed_region() {
        let ctx = CodecContext::default();
        let mut schematic = Schematic::new(Vec3::new(1, 1, 1)).unwrap();
        schematic.set_block(Vec3::zero(), "minecraft:stone".into()).unwrap();
        let root = encode(&schematic, &ctx).unwrap();
        let regions = nbt::opt_compound(&root, "Regions").unwrap();
        assert!(nbt::opt_compound(regions, "Main").is_some());
        assert!(decode(&root, &ctx).unwrap().content_eq(&schematic));
    }

    #[test]
    fn test_negative_size() {
        let ctx = CodecContext::default();
        let original = sample();
        let mut root = encode(&original, &ctx).unwrap();
        region_mut(&mut root, "sample").insert("Size", nbt::vec3i_compound(Vec3::new(-3, 2, -4)));
        let decoded = decode(&root, &ctx).unwrap();
        assert_eq!(decoded.size(), Vec3::new(3, 2, 4));
        assert!(decoded.content_eq(&original));
    }

    #[test]
    fn test_zero_size() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        region_mut(&mut root, "sample").insert("Size", nbt::vec3i_compound(Vec3::new(0, 2, 4)));
        let err = decode(&root, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSize);
    }

    #[test]
    fn test_unsupported_version() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        root.insert("Version", NbtTag::Int(7));
        assert_eq!(decode(&root, &ctx).unwrap_err().kind(), ErrorKind::UnsupportedFormat);
        nbt::remove(&mut root, "Version");
        assert_eq!(decode(&root, &ctx).unwrap_err().kind(), ErrorKind::MalformedTag);
    }

    #[test]
    fn test_duplicate_palette_entry() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        let region = region_mut(&mut root, "sample");
        let mut palette = nbt::opt_list(region, "BlockStatePalette")
            .unwrap()
            .iter()
            .cloned()
            .collect::<Vec<NbtTag>>();
        palette.push(NbtTag::Compound(BlockState::air().to_tag()));
        region.insert("BlockStatePalette", NbtTag::List(NbtList::from(palette)));
        let err = decode(&root, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicatePaletteEntry);
    }

    #[test]
    fn test_short_block_states() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        // 24 cells at 2 bits fit in exactly one word
        region_mut(&mut root, "sample").insert("BlockStates", NbtTag::LongArray(vec![0]));
        assert!(decode(&root, &ctx).is_ok());

        region_mut(&mut root, "sample").insert("BlockStates", NbtTag::LongArray(vec![]));
        let err = decode(&root, &ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTag);
        assert_eq!(err.tag_path(), Some("Regions/sample/BlockStates"));
    }

    #[test]
    fn test_multiple_regions_picks_named() {
        let ctx = CodecContext::default();
        let mut root = encode(&sample(), &ctx).unwrap();
        let mut other = Schematic::new(Vec3::new(1, 1, 1)).unwrap();
        other.metadata_mut().name = "aaa".into();
        let other_root = encode(&other, &ctx).unwrap();
        let other_region = nbt::opt_compound(nbt::opt_compound(&other_root, "Regions").unwrap(), "aaa")
            .unwrap()
            .clone();
        match root.inner_mut().get_mut("Regions") {
            Some(&mut NbtTag::Compound(ref mut regions)) => {
                regions.insert("aaa", NbtTag::Compound(other_region));
            }
            _ => unreachable!(),
        }
        assert_eq!(nbt::opt_compound(&root, "Regions").unwrap().inner().len(), 2);
        let decoded = decode(&root, &ctx).unwrap();
        assert_eq!(decoded.size(), Vec3::new(3, 2, 4));

        // without a matching name, the first by name is taken
        match root.inner_mut().get_mut("Metadata") {
            Some(&mut NbtTag::Compound(ref mut metadata)) => {
                metadata.insert("Name", NbtTag::String("nothing".into()));
            }
            _ => unreachable!(),
        }
        assert_eq!(decode(&root, &ctx).unwrap().size(), Vec3::new(1, 1, 1));
    }

    struct CountingUpgrader(AtomicUsize);

    impl VersionUpgrader for CountingUpgrader {
        fn upgrade_block_state(&self, tag: NbtCompound, _: i32, _: i32) -> Result<NbtCompound> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(tag)
        }
    }

    #[test]
    fn test_upgrades_old_palette() {
        let upgrader = CountingUpgrader(AtomicUsize::new(0));
        let ctx = CodecContext {
            registry: &PassthroughRegistry,
            upgrader: &upgrader,
            data_version: 3000,
        };
        let original = sample();
        let palette_len = original.blocks().palette().len();

        let current = encode(&original, &ctx).unwrap();
        decode(&current, &ctx).unwrap();
        assert_eq!(upgrader.0.load(Ordering::SeqCst), 0);

        let old = encode(&original, &CodecContext::passthrough(1343)).unwrap();
        let decoded = decode(&old, &ctx).unwrap();
        assert_eq!(upgrader.0.load(Ordering::SeqCst), palette_len);
        assert!(decoded.content_eq(&original));

        // absent data version means no upgrade
        let mut unversioned = old;
        nbt::remove(&mut unversioned, "MinecraftDataVersion");
        decode(&unversioned, &ctx).unwrap();
        assert_eq!(upgrader.0.load(Ordering::SeqCst), palette_len);
    }
}
