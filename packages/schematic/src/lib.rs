//! Reading and writing of Minecraft schematic files: cuboid regions of block
//! states plus their entities, block entities and metadata.
//!
//! Basic example:
//!
//! ```
//! use schematic::{
//!     BlockState,
//!     CodecContext,
//!     Schematic,
//!     SchematicFormat,
//! };
//! use vek::*;
//!
//! let mut tower = Schematic::new(Vec3::new(1, 3, 1)).unwrap();
//! for y in 0..3 {
//!     tower.set_block(Vec3::new(0, y, 0), BlockState::new("minecraft:cobblestone")).unwrap();
//! }
//!
//! let ctx = CodecContext::default();
//! let root = SchematicFormat::Sponge.encode(&tower, &ctx).unwrap();
//! let decoded = SchematicFormat::Sponge.decode(&root, &ctx).unwrap();
//! assert_eq!(decoded.block(Vec3::new(0, 2, 0)).name, "minecraft:cobblestone");
//! ```
//!
//! ## formats
//!
//! Four formats are supported, see `SchematicFormat`. A file's format is
//! judged from its name by `FileType`. Codecs convert between a `Schematic`
//! and a tag tree, and the `io` functions convert between a tag tree and
//! gzipped bytes.
//!
//! ## block states and versions
//!
//! Block states are interpreted by a host-supplied `BlockRegistry`, and
//! block states stored by an older game version are first migrated by a
//! host-supplied `VersionUpgrader`. Both are passed to codecs in a
//! `CodecContext`. `PassthroughRegistry` and `NoopUpgrader` take everything
//! as stored.

#[macro_use]
extern crate tracing;

mod error;
mod nbt;
mod block;
mod registry;
mod metadata;
mod aux_data;
mod schematic;
mod file_type;
mod format;
mod io;


pub use self::{
    error::{
        Error,
        ErrorKind,
        Result,
    },
    block::{
        AIR,
        BlockState,
    },
    registry::{
        DEFAULT_DATA_VERSION,
        BlockRegistry,
        PassthroughRegistry,
        VersionUpgrader,
        NoopUpgrader,
        CodecContext,
    },
    metadata::SchematicMetadata,
    aux_data::{
        EntityInfo,
        BlockPosLayout,
        read_entities,
        write_entities,
        read_block_entities,
        write_block_entities,
    },
    schematic::Schematic,
    file_type::FileType,
    format::SchematicFormat,
    io::{
        read_schematic,
        read_schematic_bytes,
        read_root,
        write_schematic,
        write_schematic_bytes,
        write_root,
    },
};
pub use region_data::{
    is_size_valid,
    VoxelContainer,
    Palette,
};
