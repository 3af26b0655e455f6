//! Classifying files by name.

use crate::format::SchematicFormat;
use std::{
    fs::File,
    path::Path,
};


/// What kind of file a path holds, judged by its name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FileType {
    /// Not a readable regular file.
    Invalid,
    /// A readable file with an unrecognized name.
    Unknown,
    Json,
    Litematica,
    Schematica,
    VanillaStructure,
    Sponge,
}

impl FileType {
    /// Classify by suffix. Case-sensitive.
    pub fn from_name(name: &str) -> Self {
        if name.ends_with(".litematic") {
            FileType::Litematica
        } else if name.ends_with(".schematic") {
            FileType::Schematica
        } else if name.ends_with(".nbt") {
            FileType::VanillaStructure
        } else if name.ends_with(".schem") {
            FileType::Sponge
        } else if name.ends_with(".json") {
            FileType::Json
        } else {
            FileType::Unknown
        }
    }

    /// Classify a path, which is `Invalid` unless it is a readable regular
    /// file.
    pub fn from_path(path: &Path) -> Self {
        if !path.is_file() || File::open(path).is_err() {
            return FileType::Invalid;
        }
        match path.file_name() {
            Some(name) => FileType::from_name(&name.to_string_lossy()),
            None => FileType::Invalid,
        }
    }

    /// File name suffix, without the dot.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            FileType::Invalid | FileType::Unknown => None,
            FileType::Json => Some("json"),
            FileType::Litematica => Some("litematic"),
            FileType::Schematica => Some("schematic"),
            FileType::VanillaStructure => Some("nbt"),
            FileType::Sponge => Some("schem"),
        }
    }

    pub fn is_schematic(self) -> bool {
        self.format().is_some()
    }

    /// The codec for this type of file, if it is a schematic.
    pub fn format(self) -> Option<SchematicFormat> {
        match self {
            FileType::Litematica => Some(SchematicFormat::Litematica),
            FileType::Schematica => Some(SchematicFormat::Schematica),
            FileType::VanillaStructure => Some(SchematicFormat::VanillaStructure),
            FileType::Sponge => Some(SchematicFormat::Sponge),
            FileType::Invalid | FileType::Unknown | FileType::Json => None,
        }
    }
}
