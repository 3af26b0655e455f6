//! Error type for container construction.

use vek::*;
use std::fmt::{self, Formatter, Display};


/// Why a palette or container could not be built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ContainerError {
    /// Some axis of the requested size is zero or negative.
    InvalidSize(Vec3<i32>),
    /// A palette mapping contained the same value at two ids.
    DuplicateEntry {
        first: usize,
        second: usize,
    },
    /// A container requires at least one palette entry for its default cell.
    EmptyPalette,
    /// A cell referenced an id that the palette does not have.
    IdOutOfRange {
        index: usize,
        id: u32,
        palette_len: usize,
    },
    /// Packed storage had the wrong number of words for its entry count.
    WordCount {
        expected: usize,
        actual: usize,
    },
}

impl Display for ContainerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            &ContainerError::InvalidSize(size) => write!(
                f, "invalid region size <{},{},{}>", size.x, size.y, size.z,
            ),
            &ContainerError::DuplicateEntry { first, second } => write!(
                f, "duplicate palette entry at ids {} and {}", first, second,
            ),
            &ContainerError::EmptyPalette => f.write_str("empty palette"),
            &ContainerError::IdOutOfRange { index, id, palette_len } => write!(
                f, "cell {} has id {} but palette only has {} entries",
                index, id, palette_len,
            ),
            &ContainerError::WordCount { expected, actual } => write!(
                f, "expected {} packed words, got {}", expected, actual,
            ),
        }
    }
}

impl std::error::Error for ContainerError {}
