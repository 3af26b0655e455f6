//! Data structures for compact in-memory storage of a cuboid region of
//! blocks.
//!
//! Basic example:
//!
//! ```
//! use region_data::{
//!     VoxelContainer,
//!     copy_overlap,
//! };
//! use vek::*;
//!
//! let mut region = VoxelContainer::new(Vec3::new(4, 2, 4), "air").unwrap();
//! region.set(Vec3::new(1, 0, 3), "stone");
//! assert_eq!(*region.get(Vec3::new(1, 0, 3)), "stone");
//! assert_eq!(region.palette().mapping(), &["air", "stone"]);
//!
//! // copy into a smaller region, clipping whatever doesn't fit
//! let mut small = VoxelContainer::new(Vec3::new(2, 2, 2), "glass").unwrap();
//! copy_overlap(&region, &mut small);
//! assert_eq!(*small.get(Vec3::new(1, 1, 1)), "air");
//! ```
//!
//! ## region size, positions
//!
//! A region has a _size_, a 3-vec of signed integers, which is only valid if
//! every component is strictly positive. A cell of the region is identified
//! by a _position_, a 3-vec of integers between <0,0,0> (inclusive) and the
//! size (exclusive).
//!
//! ## cell indices
//!
//! Cells are stored in a flat array. A position converts to an index with X
//! varying fastest, then Z, then Y:
//!
//! ```txt
//! index = (y * size.z + z) * size.x + x
//! ```
//!
//! ## palettes, ids
//!
//! Regions tend to consist of a handful of distinct block values repeated
//! many times over. Rather than storing each value, a container stores for
//! each cell a small integer _id_ which indexes into a _palette_ of distinct
//! values. Id 0 is the container's default value. The ids are bit-packed at
//! just enough bits per cell to address the whole palette.

#[macro_use]
extern crate tracing;

mod coord;
mod error;
mod palette;
mod packed;
mod container;


pub use self::{
    coord::{
        is_size_valid,
        volume,
        contains,
        index_of,
        pos_of,
        positions,
    },
    error::ContainerError,
    palette::{
        Palette,
        bits_for_len,
    },
    packed::{
        PackedIntArray,
        word_count,
    },
    container::{
        MIN_BITS,
        VoxelContainer,
        copy_overlap,
    },
};
