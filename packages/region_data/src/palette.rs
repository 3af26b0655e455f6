//! Interning table between block values and small integer ids.

use crate::error::ContainerError;
use std::{
    collections::{
        HashMap,
        hash_map::Entry,
    },
    hash::Hash,
};


/// Bidirectional mapping between values and dense ids `0..len`.
///
/// Ids are handed out in insertion order and are never renumbered, except
/// by replacing the whole mapping with `set_mapping`.
#[derive(Debug, Clone)]
pub struct Palette<T> {
    id_to_value: Vec<T>,
    value_to_id: HashMap<T, u32>,
}

impl<T> Palette<T>
where
    T: Eq + Hash + Clone,
{
    /// Construct empty.
    pub fn new() -> Self {
        Palette {
            id_to_value: Vec::new(),
            value_to_id: HashMap::new(),
        }
    }

    /// Construct with `default` registered as id 0.
    pub fn with_default(default: T) -> Self {
        let mut palette = Palette::new();
        palette.intern(default);
        palette
    }

    /// Get the id of `value`, registering it at the next free id if it is not
    /// yet present.
    pub fn intern(&mut self, value: T) -> u32 {
        match self.value_to_id.entry(value) {
            Entry::Occupied(o) => *o.get(),
            Entry::Vacant(v) => {
                let id = self.id_to_value.len() as u32;
                self.id_to_value.push(v.key().clone());
                v.insert(id);
                id
            }
        }
    }

    /// Replace the whole palette, assigning each value its list index as id.
    ///
    /// Fails if the list contains the same value twice, in which case the
    /// palette is left as it was.
    pub fn set_mapping(&mut self, mapping: Vec<T>) -> Result<(), ContainerError> {
        let mut value_to_id = HashMap::with_capacity(mapping.len());
        for (i, value) in mapping.iter().enumerate() {
            if let Some(first) = value_to_id.insert(value.clone(), i as u32) {
                return Err(ContainerError::DuplicateEntry {
                    first: first as usize,
                    second: i,
                });
            }
        }
        self.id_to_value = mapping;
        self.value_to_id = value_to_id;
        Ok(())
    }

    /// Construct from an ordered list, failing on duplicates.
    pub fn from_mapping(mapping: Vec<T>) -> Result<Self, ContainerError> {
        let mut palette = Palette::new();
        palette.set_mapping(mapping)?;
        Ok(palette)
    }

    /// The id of `value`, if registered.
    pub fn id_of(&self, value: &T) -> Option<u32> {
        self.value_to_id.get(value).copied()
    }

    /// The value registered at `id`.
    pub fn get(&self, id: u32) -> Option<&T> {
        self.id_to_value.get(id as usize)
    }

    /// All values, indexed by id.
    pub fn mapping(&self) -> &[T] {
        &self.id_to_value
    }

    pub fn len(&self) -> usize {
        self.id_to_value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_value.is_empty()
    }

    /// Iterate over `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item=(u32, &T)> + '_ {
        self.id_to_value.iter().enumerate().map(|(i, value)| (i as u32, value))
    }

    /// Number of bits needed to store any id of this palette, but no fewer
    /// than `min_bits`.
    pub fn bits_needed(&self, min_bits: u32) -> u32 {
        bits_for_len(self.len()).max(min_bits)
    }
}

impl<T> Default for Palette<T>
where
    T: Eq + Hash + Clone,
{
    fn default() -> Self {
        Palette::new()
    }
}

impl<T: PartialEq> PartialEq for Palette<T> {
    fn eq(&self, rhs: &Self) -> bool {
        self.id_to_value == rhs.id_to_value
    }
}

impl<T: Eq> Eq for Palette<T> {}

/// Number of bits needed to store every id of a palette of `len` entries.
pub fn bits_for_len(len: usize) -> u32 {
    let max_id = len.saturating_sub(1) as u64;
    (64 - max_id.leading_zeros()).max(1)
}
