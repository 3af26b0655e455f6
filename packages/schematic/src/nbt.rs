//! Accessors and sub-conventions over the tag tree shared by all formats.
//!
//! Accessors named `req_*` fail with `MalformedTag` and the tag path when the
//! tag is missing or has the wrong shape. Accessors named `opt_*` return
//! `None` instead. Integer accessors accept any integral tag width, since
//! different writers of the same format disagree on them.

use crate::error::{
    Result,
    error,
};
use quartz_nbt::{
    NbtCompound,
    NbtList,
    NbtTag,
};
use vek::*;


/// Path of a child tag, for error messages.
pub fn child(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{}/{}", parent, key)
    }
}

/// Path of a list element, for error messages.
pub fn elem(parent: &str, i: usize) -> String {
    format!("{}[{}]", parent, i)
}

pub fn get<'a>(tag: &'a NbtCompound, key: &str) -> Option<&'a NbtTag> {
    tag.inner().get(key)
}

pub fn as_int(tag: &NbtTag) -> Option<i64> {
    match tag {
        &NbtTag::Byte(n) => Some(n as i64),
        &NbtTag::Short(n) => Some(n as i64),
        &NbtTag::Int(n) => Some(n as i64),
        &NbtTag::Long(n) => Some(n),
        _ => None,
    }
}

pub fn as_double(tag: &NbtTag) -> Option<f64> {
    match tag {
        &NbtTag::Float(n) => Some(n as f64),
        &NbtTag::Double(n) => Some(n),
        tag => as_int(tag).map(|n| n as f64),
    }
}

pub fn opt_int(tag: &NbtCompound, key: &str) -> Option<i64> {
    get(tag, key).and_then(as_int)
}

pub fn req_int(tag: &NbtCompound, key: &str, path: &str) -> Result<i64> {
    match get(tag, key) {
        Some(value) => as_int(value)
            .ok_or_else(|| error!(
                MalformedTag, Some(&child(path, key)), "expected integer tag",
            )),
        None => Err(error!(
            MalformedTag, Some(&child(path, key)), "missing integer tag",
        )),
    }
}

/// Like `req_int`, but additionally fails if the value does not fit `i32`.
pub fn req_i32(tag: &NbtCompound, key: &str, path: &str) -> Result<i32> {
    let n = req_int(tag, key, path)?;
    i32::try_from(n)
        .map_err(|_| error!(
            MalformedTag, Some(&child(path, key)), "integer {} out of range", n,
        ))
}

pub fn opt_str<'a>(tag: &'a NbtCompound, key: &str) -> Option<&'a str> {
    match get(tag, key) {
        Some(&NbtTag::String(ref s)) => Some(s),
        _ => None,
    }
}

pub fn req_str<'a>(tag: &'a NbtCompound, key: &str, path: &str) -> Result<&'a str> {
    opt_str(tag, key)
        .ok_or_else(|| error!(
            MalformedTag, Some(&child(path, key)), "missing string tag",
        ))
}

pub fn opt_compound<'a>(tag: &'a NbtCompound, key: &str) -> Option<&'a NbtCompound> {
    match get(tag, key) {
        Some(&NbtTag::Compound(ref c)) => Some(c),
        _ => None,
    }
}

pub fn req_compound<'a>(
    tag: &'a NbtCompound,
    key: &str,
    path: &str,
) -> Result<&'a NbtCompound> {
    opt_compound(tag, key)
        .ok_or_else(|| error!(
            MalformedTag, Some(&child(path, key)), "missing compound tag",
        ))
}

pub fn opt_list<'a>(tag: &'a NbtCompound, key: &str) -> Option<&'a NbtList> {
    match get(tag, key) {
        Some(&NbtTag::List(ref l)) => Some(l),
        _ => None,
    }
}

pub fn req_list<'a>(tag: &'a NbtCompound, key: &str, path: &str) -> Result<&'a NbtList> {
    opt_list(tag, key)
        .ok_or_else(|| error!(
            MalformedTag, Some(&child(path, key)), "missing list tag",
        ))
}

pub fn req_long_array<'a>(
    tag: &'a NbtCompound,
    key: &str,
    path: &str,
) -> Result<&'a [i64]> {
    match get(tag, key) {
        Some(&NbtTag::LongArray(ref a)) => Ok(a),
        _ => Err(error!(
            MalformedTag, Some(&child(path, key)), "missing long array tag",
        )),
    }
}

pub fn opt_byte_array<'a>(tag: &'a NbtCompound, key: &str) -> Option<&'a [i8]> {
    match get(tag, key) {
        Some(&NbtTag::ByteArray(ref a)) => Some(a),
        _ => None,
    }
}

pub fn req_byte_array<'a>(
    tag: &'a NbtCompound,
    key: &str,
    path: &str,
) -> Result<&'a [i8]> {
    opt_byte_array(tag, key)
        .ok_or_else(|| error!(
            MalformedTag, Some(&child(path, key)), "missing byte array tag",
        ))
}

/// The compound at index `i` of a list.
pub fn compound_at<'a>(list: &'a NbtList, i: usize, path: &str) -> Result<&'a NbtCompound> {
    match list.iter().nth(i) {
        Some(&NbtTag::Compound(ref c)) => Ok(c),
        _ => Err(error!(MalformedTag, Some(&elem(path, i)), "expected compound")),
    }
}

/// Iterate over the compound elements of a list, skipping anything else.
pub fn compounds(list: &NbtList) -> impl Iterator<Item=&NbtCompound> + '_ {
    list.iter()
        .filter_map(|tag| match tag {
            &NbtTag::Compound(ref c) => Some(c),
            _ => None,
        })
}

/// Remove a tag, returning it if it was present.
pub fn remove(tag: &mut NbtCompound, key: &str) -> Option<NbtTag> {
    tag.inner_mut().remove(key)
}


// ==== position conventions ====


/// Read a block position stored as `x`, `y`, `z` integer fields.
pub fn read_block_pos(tag: &NbtCompound) -> Option<Vec3<i32>> {
    let field = |key| opt_int(tag, key).and_then(|n| i32::try_from(n).ok());
    Some(Vec3::new(field("x")?, field("y")?, field("z")?))
}

/// Remove the `x`, `y`, `z` fields of a block position.
pub fn remove_block_pos(tag: &mut NbtCompound) {
    for key in ["x", "y", "z"] {
        remove(tag, key);
    }
}

/// Write a block position as `x`, `y`, `z` integer fields.
pub fn put_block_pos(tag: &mut NbtCompound, pos: Vec3<i32>) {
    tag.insert("x", NbtTag::Int(pos.x));
    tag.insert("y", NbtTag::Int(pos.y));
    tag.insert("z", NbtTag::Int(pos.z));
}

/// Read a `{x, y, z}` compound.
pub fn read_vec3i_compound(tag: &NbtCompound, key: &str) -> Option<Vec3<i32>> {
    opt_compound(tag, key).and_then(read_block_pos)
}

/// A `{x, y, z}` compound.
pub fn vec3i_compound(v: Vec3<i32>) -> NbtTag {
    let mut tag = NbtCompound::new();
    put_block_pos(&mut tag, v);
    NbtTag::Compound(tag)
}

/// Read three integers stored either as an int array or a list of integer
/// tags.
pub fn read_int_triple(tag: &NbtCompound, key: &str) -> Option<Vec3<i32>> {
    match get(tag, key)? {
        &NbtTag::IntArray(ref a) if a.len() == 3 => Some(Vec3::new(a[0], a[1], a[2])),
        &NbtTag::List(ref l) if l.len() == 3 => {
            let mut n = l.iter().map(|t| as_int(t).and_then(|n| i32::try_from(n).ok()));
            Some(Vec3::new(n.next()??, n.next()??, n.next()??))
        }
        _ => None,
    }
}

/// Three integers as an int array.
pub fn int_array_triple(v: Vec3<i32>) -> NbtTag {
    NbtTag::IntArray(vec![v.x, v.y, v.z])
}

/// Three integers as a list of int tags.
pub fn int_list_triple(v: Vec3<i32>) -> NbtTag {
    NbtTag::List(NbtList::from(vec![
        NbtTag::Int(v.x),
        NbtTag::Int(v.y),
        NbtTag::Int(v.z),
    ]))
}

/// Read a precise position stored as a list of three doubles.
pub fn read_vec3d_list(tag: &NbtCompound, key: &str) -> Option<Vec3<f64>> {
    match get(tag, key)? {
        &NbtTag::List(ref l) if l.len() == 3 => {
            let mut n = l.iter().map(as_double);
            Some(Vec3::new(n.next()??, n.next()??, n.next()??))
        }
        _ => None,
    }
}

/// A precise position as a list of three doubles.
pub fn vec3d_list(v: Vec3<f64>) -> NbtTag {
    NbtTag::List(NbtList::from(vec![
        NbtTag::Double(v.x),
        NbtTag::Double(v.y),
        NbtTag::Double(v.z),
    ]))
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pos_fields() {
        let mut tag = NbtCompound::new();
        tag.insert("id", NbtTag::String("minecraft:chest".into()));
        put_block_pos(&mut tag, Vec3::new(1, -2, 3));
        assert_eq!(read_block_pos(&tag), Some(Vec3::new(1, -2, 3)));

        remove_block_pos(&mut tag);
        assert_eq!(read_block_pos(&tag), None);
        assert_eq!(tag.inner().len(), 1);
    }

    #[test]
    fn test_block_pos_narrow_ints() {
        let mut tag = NbtCompound::new();
        tag.insert("x", NbtTag::Short(4));
        tag.insert("y", NbtTag::Byte(5));
        tag.insert("z", NbtTag::Int(6));
        assert_eq!(read_block_pos(&tag), Some(Vec3::new(4, 5, 6)));
    }

    #[test]
    fn test_int_triples() {
        let mut tag = NbtCompound::new();
        tag.insert("a", int_array_triple(Vec3::new(1, 2, 3)));
        tag.insert("b", int_list_triple(Vec3::new(4, 5, 6)));
        tag.insert("c", NbtTag::IntArray(vec![1, 2]));
        assert_eq!(read_int_triple(&tag, "a"), Some(Vec3::new(1, 2, 3)));
        assert_eq!(read_int_triple(&tag, "b"), Some(Vec3::new(4, 5, 6)));
        assert_eq!(read_int_triple(&tag, "c"), None);
        assert_eq!(read_int_triple(&tag, "d"), None);
    }

    #[test]
    fn test_vec3d_list() {
        let mut tag = NbtCompound::new();
        tag.insert("Pos", vec3d_list(Vec3::new(0.5, 64.0, -3.25)));
        assert_eq!(read_vec3d_list(&tag, "Pos"), Some(Vec3::new(0.5, 64.0, -3.25)));
        tag.insert("Pos", NbtTag::String("nowhere".into()));
        assert_eq!(read_vec3d_list(&tag, "Pos"), None);
    }

    #[test]
    fn test_required_accessors_report_path() {
        let tag = NbtCompound::new();
        let err = req_int(&tag, "Version", "Regions/Main").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedTag);
        assert_eq!(err.tag_path(), Some("Regions/Main/Version"));
    }

    #[test]
    fn test_compound_at() {
        let mut first = NbtCompound::new();
        first.insert("id", NbtTag::String("minecraft:pig".into()));
        let list = NbtList::from(vec![
            NbtTag::Compound(first.clone()),
            NbtTag::Int(7),
        ]);
        assert_eq!(compound_at(&list, 0, "Entities").unwrap(), &first);
        let err = compound_at(&list, 1, "Entities").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedTag);
        assert_eq!(err.tag_path(), Some(elem("Entities", 1).as_str()));
        assert!(compound_at(&list, 2, "Entities").is_err());
    }
}
