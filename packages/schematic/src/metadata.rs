//! Descriptive metadata which travels with a schematic.

use crate::nbt;
use quartz_nbt::{
    NbtCompound,
    NbtTag,
};
use serde::{
    Serialize,
    Deserialize,
};
use vek::*;


/// Descriptive header of a schematic.
///
/// Reading is tolerant: any field missing from the stored form keeps its
/// default value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchematicMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub region_size: Vec3<i32>,
    pub enclosing_size: Vec3<i32>,
    pub total_volume: i64,
    pub total_blocks: i64,
    pub region_count: i32,
    /// Milliseconds since the unix epoch.
    pub time_created: i64,
    /// Milliseconds since the unix epoch.
    pub time_modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_image: Option<Vec<i32>>,
}

impl SchematicMetadata {
    /// Read from a metadata compound.
    pub fn from_tag(tag: &NbtCompound) -> Self {
        let string = |key| nbt::opt_str(tag, key).unwrap_or("").to_owned();
        let int = |key| nbt::opt_int(tag, key);
        let vec = |key| nbt::read_vec3i_compound(tag, key)
            .or_else(|| nbt::read_int_triple(tag, key))
            .unwrap_or(Vec3::zero());

        SchematicMetadata {
            name: string("Name"),
            author: string("Author"),
            description: string("Description"),
            region_size: vec("RegionSize"),
            enclosing_size: vec("EnclosingSize"),
            total_volume: int("TotalVolume").unwrap_or(0),
            total_blocks: int("TotalBlocks").unwrap_or(0),
            region_count: int("RegionCount")
                .and_then(|n| i32::try_from(n).ok())
                .unwrap_or(0),
            time_created: int("TimeCreated")
                .or_else(|| int("Date"))
                .unwrap_or(0),
            time_modified: int("TimeModified").unwrap_or(0),
            preview_image: match nbt::get(tag, "PreviewImageData") {
                Some(&NbtTag::IntArray(ref data)) => Some(data.clone()),
                _ => None,
            },
        }
    }

    /// Read the `Metadata` compound of a root tag, defaulting if absent.
    pub fn read_from_root(root: &NbtCompound) -> Self {
        match nbt::opt_compound(root, "Metadata") {
            Some(tag) => SchematicMetadata::from_tag(tag),
            None => {
                trace!("no metadata compound, using defaults");
                SchematicMetadata::default()
            }
        }
    }

    /// Write as a metadata compound. Every field is written.
    pub fn to_tag(&self) -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.insert("Name", NbtTag::String(self.name.clone()));
        tag.insert("Author", NbtTag::String(self.author.clone()));
        tag.insert("Description", NbtTag::String(self.description.clone()));
        tag.insert("RegionSize", nbt::vec3i_compound(self.region_size));
        tag.insert("EnclosingSize", nbt::vec3i_compound(self.enclosing_size));
        tag.insert("TotalVolume", NbtTag::Long(self.total_volume));
        tag.insert("TotalBlocks", NbtTag::Long(self.total_blocks));
        tag.insert("RegionCount", NbtTag::Int(self.region_count));
        tag.insert("TimeCreated", NbtTag::Long(self.time_created));
        tag.insert("TimeModified", NbtTag::Long(self.time_modified));
        if let Some(ref data) = self.preview_image {
            tag.insert("PreviewImageData", NbtTag::IntArray(data.clone()));
        }
        tag
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let mut tag = NbtCompound::new();
        tag.insert("Name", NbtTag::String("tower".into()));
        tag.insert("TotalBlocks", NbtTag::Int(12));
        let metadata = SchematicMetadata::from_tag(&tag);
        assert_eq!(metadata.name, "tower");
        assert_eq!(metadata.total_blocks, 12);
        assert_eq!(metadata.author, "");
        assert_eq!(metadata.region_size, Vec3::zero());
        assert_eq!(metadata.preview_image, None);
    }

    #[test]
    fn test_absent_compound() {
        let root = NbtCompound::new();
        assert_eq!(SchematicMetadata::read_from_root(&root), SchematicMetadata::default());
    }

    #[test]
    fn test_date_alias() {
        let mut tag = NbtCompound::new();
        tag.insert("Date", NbtTag::Long(1_600_000_000_000));
        assert_eq!(SchematicMetadata::from_tag(&tag).time_created, 1_600_000_000_000);
    }

    #[test]
    fn test_tag_form() {
        let metadata = SchematicMetadata {
            name: "bridge".into(),
            author: "someone".into(),
            description: "spans the river".into(),
            region_size: Vec3::new(30, 8, 5),
            enclosing_size: Vec3::new(30, 8, 5),
            total_volume: 1200,
            total_blocks: 431,
            region_count: 1,
            time_created: 1,
            time_modified: 2,
            preview_image: Some(vec![-1, 0, 0x00ff00ff]),
        };
        let tag = metadata.to_tag();
        assert_eq!(nbt::opt_int(&tag, "TotalVolume"), Some(1200));
        assert_eq!(SchematicMetadata::from_tag(&tag), metadata);
    }
}
