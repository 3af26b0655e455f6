//! Dense 3D array of palette-compressed values.

use crate::{
    coord::{
        is_size_valid,
        volume,
        index_of,
        pos_of,
        positions,
    },
    palette::Palette,
    packed::PackedIntArray,
    error::ContainerError,
};
use std::hash::Hash;
use vek::*;


/// Smallest entry width the id storage uses, however small the palette.
pub const MIN_BITS: u32 = 2;

/// Fixed-size cuboid of cells, each holding a `T`, stored as palette ids.
///
/// The container owns its palette. Interning a new value through `set` may
/// grow the palette past what the current id width can address, in which
/// case the id storage is repacked at a larger width.
///
/// Coordinate access outside of `size` panics. Callers are expected to check
/// against `size()` first, or use `try_get`.
#[derive(Debug, Clone)]
pub struct VoxelContainer<T> {
    size: Vec3<i32>,
    palette: Palette<T>,
    ids: PackedIntArray,
}

impl<T> VoxelContainer<T>
where
    T: Eq + Hash + Clone,
{
    /// Construct with every cell set to `default`, which becomes id 0.
    ///
    /// Fails without allocating if the size is not valid.
    pub fn new(size: Vec3<i32>, default: T) -> Result<Self, ContainerError> {
        Self::with_palette(size, Palette::with_default(default))
    }

    /// Construct with a pre-built palette and every cell set to id 0.
    pub fn with_palette(
        size: Vec3<i32>,
        palette: Palette<T>,
    ) -> Result<Self, ContainerError> {
        if !is_size_valid(size) {
            return Err(ContainerError::InvalidSize(size));
        }
        if palette.is_empty() {
            return Err(ContainerError::EmptyPalette);
        }
        let bits = palette.bits_needed(MIN_BITS);
        Ok(VoxelContainer {
            size,
            ids: PackedIntArray::new(bits, volume(size)),
            palette,
        })
    }

    /// Construct from a palette and already packed ids, validating that the
    /// ids cover the whole region and all refer to palette entries.
    pub fn from_packed(
        size: Vec3<i32>,
        palette: Palette<T>,
        ids: PackedIntArray,
    ) -> Result<Self, ContainerError> {
        if !is_size_valid(size) {
            return Err(ContainerError::InvalidSize(size));
        }
        if palette.is_empty() {
            return Err(ContainerError::EmptyPalette);
        }
        let expected = volume(size);
        if ids.len() != expected {
            return Err(ContainerError::WordCount {
                expected,
                actual: ids.len(),
            });
        }
        for (index, id) in ids.iter().enumerate() {
            if id as usize >= palette.len() {
                return Err(ContainerError::IdOutOfRange {
                    index,
                    id,
                    palette_len: palette.len(),
                });
            }
        }
        let mut container = VoxelContainer { size, palette, ids };
        container.fit_bits();
        Ok(container)
    }

    /// Construct from a palette and one id per cell in index order.
    pub fn from_ids<I>(
        size: Vec3<i32>,
        palette: Palette<T>,
        ids: I,
    ) -> Result<Self, ContainerError>
    where
        I: IntoIterator<Item=u32>,
    {
        let mut container = Self::with_palette(size, palette)?;
        let len = container.ids.len();
        let mut count = 0;
        for id in ids {
            if count >= len {
                count += 1;
                continue;
            }
            if id as usize >= container.palette.len() {
                return Err(ContainerError::IdOutOfRange {
                    index: count,
                    id,
                    palette_len: container.palette.len(),
                });
            }
            container.ids.set(count, id);
            count += 1;
        }
        if count != len {
            return Err(ContainerError::WordCount {
                expected: len,
                actual: count,
            });
        }
        Ok(container)
    }

    pub fn size(&self) -> Vec3<i32> {
        self.size
    }

    pub fn volume(&self) -> usize {
        self.ids.len()
    }

    pub fn palette(&self) -> &Palette<T> {
        &self.palette
    }

    /// The packed id storage, at its current width.
    pub fn packed(&self) -> &PackedIntArray {
        &self.ids
    }

    /// Current id width in bits.
    pub fn bits(&self) -> u32 {
        self.ids.bits()
    }

    fn index(&self, pos: Vec3<i32>) -> usize {
        match index_of(self.size, pos) {
            Some(i) => i,
            None => panic!(
                "position <{},{},{}> out of bounds for region <{},{},{}>",
                pos.x, pos.y, pos.z,
                self.size.x, self.size.y, self.size.z,
            ),
        }
    }

    /// Get the value at some position.
    ///
    /// Panics if out of bounds.
    pub fn get(&self, pos: Vec3<i32>) -> &T {
        let id = self.ids.get(self.index(pos));
        // every stored id is a palette index
        &self.palette.mapping()[id as usize]
    }

    /// Get the value at some position, or `None` if out of bounds.
    pub fn try_get(&self, pos: Vec3<i32>) -> Option<&T> {
        index_of(self.size, pos)
            .map(|i| &self.palette.mapping()[self.ids.get(i) as usize])
    }

    /// Set the value at some position, interning it if it's new.
    ///
    /// Panics if out of bounds.
    pub fn set(&mut self, pos: Vec3<i32>, value: T) {
        let i = self.index(pos);
        let id = self.palette.intern(value);
        self.fit_bits();
        self.ids.set(i, id);
    }

    /// Get the palette id at some position.
    ///
    /// Panics if out of bounds.
    pub fn get_id(&self, pos: Vec3<i32>) -> u32 {
        self.ids.get(self.index(pos))
    }

    /// Set the palette id at some position.
    ///
    /// Panics if out of bounds or if `id` is not in the palette.
    pub fn set_id(&mut self, pos: Vec3<i32>, id: u32) {
        assert!(
            (id as usize) < self.palette.len(),
            "id {} not in palette of {} entries", id, self.palette.len(),
        );
        let i = self.index(pos);
        self.ids.set(i, id);
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        let id = self.palette.intern(value);
        let bits = self.palette.bits_needed(MIN_BITS);
        let mut ids = PackedIntArray::new(bits, self.ids.len());
        for i in 0..ids.len() {
            ids.set(i, id);
        }
        self.ids = ids;
    }

    /// Iterate over every cell's id in index order.
    pub fn ids(&self) -> impl Iterator<Item=u32> + '_ {
        self.ids.iter()
    }

    /// Iterate over every cell's position and value in index order.
    pub fn iter(&self) -> impl Iterator<Item=(Vec3<i32>, &T)> + '_ {
        let size = self.size;
        let mapping = self.palette.mapping();
        self.ids.iter()
            .enumerate()
            .map(move |(i, id)| (pos_of(size, i), &mapping[id as usize]))
    }

    /// Count cells whose value satisfies `pred`.
    ///
    /// The predicate is evaluated once per palette entry, not once per cell.
    pub fn count<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let matches = self.palette.mapping()
            .iter()
            .map(|value| pred(value))
            .collect::<Vec<bool>>();
        self.ids.iter().filter(|&id| matches[id as usize]).count()
    }

    /// Ids packed at exactly the width needed for the current palette, no
    /// narrower than `min_bits`.
    pub fn packed_with_min_bits(&self, min_bits: u32) -> PackedIntArray {
        let bits = self.palette.bits_needed(min_bits);
        if bits == self.ids.bits() {
            self.ids.clone()
        } else {
            self.ids.repacked(bits)
        }
    }

    // widen id storage if the palette outgrew it
    fn fit_bits(&mut self) {
        let bits = self.palette.bits_needed(MIN_BITS);
        if bits > self.ids.bits() {
            trace!(from = self.ids.bits(), to = bits, "repacking voxel ids");
            self.ids = self.ids.repacked(bits);
        }
    }
}

impl<T: PartialEq> PartialEq for VoxelContainer<T> {
    /// Equal if same size, same palette order and same ids.
    fn eq(&self, rhs: &Self) -> bool {
        self.size == rhs.size
        && self.palette == rhs.palette
        && self.ids.iter().eq(rhs.ids.iter())
    }
}

/// Copy the overlapping region of two containers, cell by cell.
///
/// The overlap is the box at the origin whose extent on each axis is the
/// smaller of the two sizes. Values are resolved through `from`'s palette and
/// re-interned into `to`'s. Cells of `to` outside the overlap are untouched.
pub fn copy_overlap<T>(from: &VoxelContainer<T>, to: &mut VoxelContainer<T>)
where
    T: Eq + Hash + Clone,
{
    let (a, b) = (from.size(), to.size());
    let overlap = Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z));
    for pos in positions(overlap) {
        to.set(pos, from.get(pos).clone());
    }
}
