//! Codecs between the in-memory `Schematic` and the tag trees of each
//! supported schematic file format.
//!
//! Every decoder follows the same order:
//!
//! 1. Check the format version, and note the stored data version. Data
//!    stored at an older data version has its block states passed through
//!    the upgrader before the registry sees them.
//! 2. Read the metadata, if present.
//! 3. Read the palette. A palette holding the same block state twice is
//!    rejected.
//! 4. Read the cell ids, sized by the declared region size, which must be
//!    strictly positive on every axis.
//! 5. Read the entity and block entity tables.
//!
//! Encoders write the metadata, palette, ids and tables, stamped with the
//! context's data version where the format has one.

mod var_len;
mod litematica;
mod schematica;
mod sponge;
mod vanilla;

use crate::{
    block::BlockState,
    error::{
        Result,
        Error,
        bail,
        ensure,
    },
    file_type::FileType,
    nbt,
    registry::CodecContext,
    schematic::Schematic,
};
use region_data::{
    Palette,
    is_size_valid,
};
use quartz_nbt::{
    NbtCompound,
    NbtList,
    NbtTag,
};
use std::fmt::{self, Formatter, Display};
use vek::*;


/// A supported schematic file format.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SchematicFormat {
    /// Litematica `.litematic`.
    Litematica,
    /// Schematica / MCEdit `.schematic`, with legacy numeric block ids.
    Schematica,
    /// Sponge `.schem`.
    Sponge,
    /// Vanilla structure block `.nbt`.
    VanillaStructure,
}

impl SchematicFormat {
    pub const ALL: [SchematicFormat; 4] = [
        SchematicFormat::Litematica,
        SchematicFormat::Schematica,
        SchematicFormat::Sponge,
        SchematicFormat::VanillaStructure,
    ];

    /// The codec for a detected file type. Fails with `UnsupportedFormat` for
    /// anything which is not a schematic.
    pub fn from_file_type(file_type: FileType) -> Result<Self> {
        match file_type.format() {
            Some(format) => Ok(format),
            None => bail!(
                UnsupportedFormat, None, "{:?} file is not a schematic", file_type,
            ),
        }
    }

    pub fn file_type(self) -> FileType {
        match self {
            SchematicFormat::Litematica => FileType::Litematica,
            SchematicFormat::Schematica => FileType::Schematica,
            SchematicFormat::Sponge => FileType::Sponge,
            SchematicFormat::VanillaStructure => FileType::VanillaStructure,
        }
    }

    /// File name suffix, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            SchematicFormat::Litematica => "litematic",
            SchematicFormat::Schematica => "schematic",
            SchematicFormat::Sponge => "schem",
            SchematicFormat::VanillaStructure => "nbt",
        }
    }

    /// Decode a root tag.
    pub fn decode(self, root: &NbtCompound, ctx: &CodecContext) -> Result<Schematic> {
        let schematic = match self {
            SchematicFormat::Litematica => litematica::decode(root, ctx),
            SchematicFormat::Schematica => schematica::decode(root, ctx),
            SchematicFormat::Sponge => sponge::decode(root, ctx),
            SchematicFormat::VanillaStructure => vanilla::decode(root, ctx),
        }?;
        debug!(
            format = %self,
            size = ?schematic.size(),
            palette_len = schematic.blocks().palette().len(),
            entities = schematic.entities().len(),
            block_entities = schematic.block_entities().len(),
            "decoded schematic",
        );
        Ok(schematic)
    }

    /// Encode to a root tag.
    pub fn encode(self, schematic: &Schematic, ctx: &CodecContext) -> Result<NbtCompound> {
        match self {
            SchematicFormat::Litematica => litematica::encode(schematic, ctx),
            SchematicFormat::Schematica => schematica::encode(schematic, ctx),
            SchematicFormat::Sponge => sponge::encode(schematic, ctx),
            SchematicFormat::VanillaStructure => vanilla::encode(schematic, ctx),
        }
    }
}

impl Display for SchematicFormat {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            SchematicFormat::Litematica => "litematica",
            SchematicFormat::Schematica => "schematica",
            SchematicFormat::Sponge => "sponge",
            SchematicFormat::VanillaStructure => "vanilla structure",
        })
    }
}


// ==== helpers shared between codecs ====


/// Validate a declared region size, and that its volume is addressable.
fn check_size(size: Vec3<i32>, path: &str) -> Result<Vec3<i32>> {
    ensure!(
        is_size_valid(size),
        InvalidSize, Some(path), "region size {:?} not positive on every axis", size,
    );
    let volume = (size.x as u64)
        .checked_mul(size.y as u64)
        .and_then(|n| n.checked_mul(size.z as u64))
        .filter(|&n| usize::try_from(n).is_ok() && n <= u32::MAX as u64);
    ensure!(volume.is_some(), InvalidSize, Some(path), "region size {:?} too large", size);
    Ok(size)
}

/// Read an optional stored data version.
fn stored_data_version(root: &NbtCompound, key: &str) -> Option<i32> {
    nbt::opt_int(root, key).and_then(|n| i32::try_from(n).ok())
}

/// Read a palette stored as a list of `{Name, Properties}` compounds.
fn read_palette_list(
    list: &NbtList,
    stored_version: Option<i32>,
    ctx: &CodecContext,
    path: &str,
) -> Result<Palette<BlockState>> {
    let mut states = Vec::with_capacity(list.len());
    for i in 0..list.len() {
        let entry_path = nbt::elem(path, i);
        let tag = nbt::compound_at(list, i, path)?;
        states.push(ctx.resolve_stored(tag, stored_version, &entry_path)?);
    }
    Palette::from_mapping(states).map_err(|e| Error::from(e).at(path))
}

/// Write a palette as a list of `{Name, Properties}` compounds, in id order.
fn write_palette_list(palette: &Palette<BlockState>, ctx: &CodecContext) -> NbtList {
    NbtList::from(palette.mapping()
        .iter()
        .map(|state| NbtTag::Compound(ctx.registry.serialize(state)))
        .collect::<Vec<NbtTag>>())
}
