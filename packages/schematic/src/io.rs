//! Reading and writing schematic files.
//!
//! Codecs work on tag trees. This module adds the byte level: gzip, which
//! all supported formats use on disk, and the tag tree binary encoding.

use crate::{
    error::{
        Result,
        bail,
    },
    file_type::FileType,
    format::SchematicFormat,
    registry::CodecContext,
    schematic::Schematic,
};
use flate2::{
    read::GzDecoder,
    write::GzEncoder,
    Compression,
};
use quartz_nbt::{
    NbtCompound,
    io::{
        Flavor,
        read_nbt,
        write_nbt,
    },
};
use std::{
    fs,
    io::{
        Cursor,
        Read,
    },
    path::Path,
};


const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];


/// Read and decode a file, choosing the format by its name.
pub fn read_schematic(path: &Path, ctx: &CodecContext) -> Result<Schematic> {
    let format = match FileType::from_path(path) {
        FileType::Invalid => bail!(
            UnsupportedFormat, None, "{} is not a readable file", path.display(),
        ),
        file_type => SchematicFormat::from_file_type(file_type)?,
    };
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), %format, len = bytes.len(), "reading schematic");
    let mut schematic = read_schematic_bytes(&bytes, format, ctx)?;
    schematic.set_file(Some(path.to_owned()));
    Ok(schematic)
}

/// Decode file contents, gzipped or not.
pub fn read_schematic_bytes(
    bytes: &[u8],
    format: SchematicFormat,
    ctx: &CodecContext,
) -> Result<Schematic> {
    let root = read_root(bytes)?;
    format.decode(&root, ctx)
}

/// Parse a root tag, gunzipping first if the bytes start with the gzip
/// magic number.
pub fn read_root(bytes: &[u8]) -> Result<NbtCompound> {
    let (root, _name) = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut decoded)?;
        read_nbt(&mut Cursor::new(decoded), Flavor::Uncompressed)?
    } else {
        trace!("schematic bytes are not gzipped");
        read_nbt(&mut Cursor::new(bytes), Flavor::Uncompressed)?
    };
    Ok(root)
}

/// Encode to gzipped file contents.
pub fn write_schematic_bytes(
    schematic: &Schematic,
    format: SchematicFormat,
    ctx: &CodecContext,
) -> Result<Vec<u8>> {
    let root = format.encode(schematic, ctx)?;
    write_root(&root)
}

/// Serialize and gzip a root tag.
pub fn write_root(root: &NbtCompound) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    write_nbt(&mut encoder, None, root, Flavor::Uncompressed)?;
    Ok(encoder.finish()?)
}

/// Encode and write a file.
pub fn write_schematic(
    schematic: &Schematic,
    path: &Path,
    format: SchematicFormat,
    ctx: &CodecContext,
) -> Result<()> {
    let bytes = write_schematic_bytes(schematic, format, ctx)?;
    debug!(path = %path.display(), %format, len = bytes.len(), "writing schematic");
    fs::write(path, bytes)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        block::BlockState,
        error::ErrorKind,
    };
    use vek::*;

    fn small() -> Schematic {
        let mut schematic = Schematic::new(Vec3::new(2, 2, 2)).unwrap();
        schematic.set_block(Vec3::new(1, 1, 1), BlockState::new("minecraft:glass")).unwrap();
        schematic.metadata_mut().name = "small".into();
        schematic.update_counts();
        schematic
    }

    #[test]
    fn test_file_round_trip() {
        let ctx = CodecContext::default();
        let dir = tempfile::tempdir().unwrap();
        let original = small();
        for format in SchematicFormat::ALL {
            let path = dir.path().join(format!("small.{}", format.extension()));
            write_schematic(&original, &path, format, &ctx).unwrap();
            let read = read_schematic(&path, &ctx).unwrap();
            assert_eq!(read.file(), Some(path.as_path()));
            assert_eq!(read.block(Vec3::new(1, 1, 1)), &BlockState::new("minecraft:glass"), "{}", format);
            assert_eq!(read.metadata().name, "small");
        }
    }

    #[test]
    fn test_gzip_sniffing() {
        let ctx = CodecContext::default();
        let root = SchematicFormat::Sponge.encode(&small(), &ctx).unwrap();
        let gzipped = write_root(&root).unwrap();
        assert!(gzipped.starts_with(&GZIP_MAGIC));

        let mut plain = Vec::new();
        write_nbt(&mut plain, None, &root, Flavor::Uncompressed).unwrap();
        let from_plain = read_schematic_bytes(&plain, SchematicFormat::Sponge, &ctx).unwrap();
        let from_gzipped = read_schematic_bytes(&gzipped, SchematicFormat::Sponge, &ctx).unwrap();
        assert!(from_plain.content_eq(&from_gzipped));
    }

    #[test]
    fn test_garbage() {
        let ctx = CodecContext::default();
        let err = read_schematic_bytes(b"not a tag tree", SchematicFormat::Litematica, &ctx)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Nbt);
    }

    #[test]
    fn test_unsupported_files() {
        let ctx = CodecContext::default();
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("placements.json");
        fs::write(&json, b"{}").unwrap();
        assert_eq!(read_schematic(&json, &ctx).unwrap_err().kind(), ErrorKind::UnsupportedFormat);
        let missing = dir.path().join("missing.litematic");
        assert_eq!(
            read_schematic(&missing, &ctx).unwrap_err().kind(),
            ErrorKind::UnsupportedFormat,
        );
        assert_eq!(
            read_schematic(dir.path(), &ctx).unwrap_err().kind(),
            ErrorKind::UnsupportedFormat,
        );
    }
}
