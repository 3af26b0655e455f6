//! Sponge `.schem` codec.
//!
//! Versions 1 and 2 keep everything at the root:
//!
//! ```txt
//! root
//! ├─ Version         int
//! ├─ DataVersion     int, version 2 on
//! ├─ Width           short, unsigned
//! ├─ Height          short, unsigned
//! ├─ Length          short, unsigned
//! ├─ Offset          int array
//! ├─ Metadata        compound
//! ├─ PaletteMax      int
//! ├─ Palette         compound, block state string to id
//! ├─ BlockData       byte array of var len ids
//! ├─ BlockEntities   list, position in Pos (TileEntities in version 1)
//! └─ Entities        list, position in Pos, version 2 on
//! ```
//!
//! Version 3 wraps the tree in a `Schematic` compound and moves the palette,
//! ids and block entities into a `Blocks` compound, as `Palette`, `Data` and
//! `BlockEntities`.

use super::{
    check_size,
    stored_data_version,
    var_len::{
        VarLenReader,
        write_var_len_uint,
    },
};
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
    Palette,
    VoxelContainer,
    volume,
};
use quartz_nbt::{
    NbtCompound,
    NbtTag,
};
use vek::*;


const MIN_VERSION: i64 = 1;
const MAX_VERSION: i64 = 3;

/// Version written by the encoder.
const WRITE_VERSION: i32 = 2;

/// Largest extent of a region on any axis.
const MAX_EXTENT: i32 = u16::MAX as i32;

const BLOCK_POS: BlockPosLayout = BlockPosLayout::IntArray("Pos");


pub fn decode(root: &NbtCompound, ctx: &CodecContext) -> Result<Schematic> {
    let (root, root_path) = match nbt::opt_compound(root, "Schematic") {
        Some(inner) => (inner, "Schematic"),
        None => (root, ""),
    };
    let version = nbt::req_int(root, "Version", root_path)?;
    ensure!(
        (MIN_VERSION..=MAX_VERSION).contains(&version),
        UnsupportedFormat, Some(&nbt::child(root_path, "Version")),
        "sponge version {} not supported", version,
    );
    let data_version = match version {
        1 => None,
        _ => stored_data_version(root, "DataVersion"),
    };
    ctx.note_stored_version(data_version);

    let metadata = SchematicMetadata::read_from_root(root);

    let size = Vec3::new(
        read_extent(root, "Width", root_path)?,
        read_extent(root, "Height", root_path)?,
        read_extent(root, "Length", root_path)?,
    );
    let size = check_size(size, root_path)?;

    // version 3 moved block storage into its own compound
    let (blocks_tag, blocks_path, data_key) = match version {
        3 => {
            let blocks_path = nbt::child(root_path, "Blocks");
            (nbt::req_compound(root, "Blocks", root_path)?, blocks_path, "Data")
        }
        _ => (root, root_path.to_owned(), "BlockData"),
    };

    let palette_path = nbt::child(&blocks_path, "Palette");
    let palette = read_palette(
        nbt::req_compound(blocks_tag, "Palette", &blocks_path)?,
        data_version,
        ctx,
        &palette_path,
    )?;
    if let Some(max) = nbt::opt_int(blocks_tag, "PaletteMax") {
        if max != palette.len() as i64 {
            debug!(palette_max = max, palette_len = palette.len(), "palette max disagrees with palette");
        }
    }

    let data_path = nbt::child(&blocks_path, data_key);
    let data = nbt::req_byte_array(blocks_tag, data_key, &blocks_path)?;
    let ids = read_ids(data, volume(size), &data_path)?;
    let blocks = VoxelContainer::from_ids(size, palette, ids)
        .map_err(|e| Error::from(e).at(&data_path))?;

    let block_entities_key = match version {
        1 => "TileEntities",
        _ => "BlockEntities",
    };
    let block_entities = nbt::opt_list(blocks_tag, block_entities_key)
        .map(|list| read_block_entities(list, BLOCK_POS))
        .unwrap_or_default();
    let entities = nbt::opt_list(root, "Entities")
        .map(|list| read_entities(list, "Pos"))
        .unwrap_or_default();

    Ok(Schematic::from_parts(metadata, blocks, entities, block_entities))
}

/// Read an extent stored as an unsigned short.
fn read_extent(root: &NbtCompound, key: &str, path: &str) -> Result<i32> {
    match nbt::get(root, key) {
        Some(&NbtTag::Short(n)) => Ok(n as u16 as i32),
        _ => nbt::req_i32(root, key, path),
    }
}

/// Read a palette compound. Ids must be exactly `0..len`, each used once.
fn read_palette(
    tag: &NbtCompound,
    stored_version: Option<i32>,
    ctx: &CodecContext,
    path: &str,
) -> Result<Palette<BlockState>> {
    let len = tag.inner().len();
    let mut slots: Vec<Option<BlockState>> = vec![None; len];
    for (key, id) in tag.inner() {
        let entry_path = nbt::child(path, key);
        let id = nbt::as_int(id)
            .and_then(|id| usize::try_from(id).ok())
            .filter(|&id| id < len)
            .ok_or_else(|| error!(
                MalformedTag, Some(&entry_path),
                "palette id out of range 0..{}", len,
            ))?;
        ensure!(
            slots[id].is_none(),
            MalformedTag, Some(&entry_path), "palette id {} used twice", id,
        );
        let state = key.parse::<BlockState>()
            .map_err(|e| e.at(&entry_path))?;
        slots[id] = Some(ctx.resolve_stored(&state.to_tag(), stored_version, &entry_path)?);
    }
    // every slot is filled, since len distinct ids all fell below len
    let states = slots.into_iter().flatten().collect::<Vec<_>>();
    Palette::from_mapping(states).map_err(|e| Error::from(e).at(path))
}

fn read_ids(data: &[i8], len: usize, path: &str) -> Result<Vec<u32>> {
    // every id takes at least one byte
    ensure!(
        data.len() >= len,
        MalformedTag, Some(path), "{} bytes of block data for {} cells", data.len(), len,
    );
    let bytes = data.iter().map(|&b| b as u8).collect::<Vec<u8>>();
    let mut reader = VarLenReader::new(&bytes);
    let mut ids = Vec::with_capacity(len);
    for i in 0..len {
        let id = reader.read()
            .ok_or_else(|| error!(
                MalformedTag, Some(path),
                "block data ends or is malformed at byte {}, cell {} of {}", reader.offset(), i, len,
            ))?;
        ids.push(id);
    }
    ensure!(
        reader.is_done(),
        MalformedTag, Some(path), "{} trailing bytes of block data", bytes.len() - reader.offset(),
    );
    Ok(ids)
}

pub fn encode(schematic: &Schematic, ctx: &CodecContext) -> Result<NbtCompound> {
    let size = schematic.size();
    ensure!(
        size.x <= MAX_EXTENT && size.y <= MAX_EXTENT && size.z <= MAX_EXTENT,
        Unrepresentable, None, "region size {:?} exceeds {} on some axis", size, MAX_EXTENT,
    );
    let container = schematic.blocks();

    let mut palette = NbtCompound::new();
    for (id, state) in container.palette().iter() {
        let path = nbt::elem("Palette", id as usize);
        let stored = BlockState::from_tag(&ctx.registry.serialize(state), &path)?;
        ensure!(
            stored.has_string_form(),
            Unrepresentable, Some(&path), "block state {:?} has no palette key form", stored,
        );
        palette.insert(stored.to_string(), NbtTag::Int(id as i32));
    }

    let mut data = Vec::new();
    for id in container.ids() {
        write_var_len_uint(&mut data, id);
    }

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(WRITE_VERSION));
    root.insert("DataVersion", NbtTag::Int(ctx.data_version));
    root.insert("Width", NbtTag::Short(size.x as u16 as i16));
    root.insert("Height", NbtTag::Short(size.y as u16 as i16));
    root.insert("Length", NbtTag::Short(size.z as u16 as i16));
    root.insert("Offset", nbt::int_array_triple(Vec3::zero()));
    root.insert("Metadata", NbtTag::Compound(schematic.metadata().to_tag()));
    root.insert("PaletteMax", NbtTag::Int(container.palette().len() as i32));
    root.insert("Palette", NbtTag::Compound(palette));
    root.insert("BlockData", NbtTag::ByteArray(data.into_iter().map(|b| b as i8).collect()));
    root.insert("BlockEntities", NbtTag::List(write_block_entities(
        schematic.block_entities(),
        BLOCK_POS,
    )));
    root.insert("Entities", NbtTag::List(write_entities(schematic.entities())));
    Ok(root)
}
