//! Region coordinate arithmetic.

use vek::*;


/// Whether every axis of `size` is strictly positive.
///
/// A region with a zero or negative extent on any axis cannot be allocated.
pub fn is_size_valid(size: Vec3<i32>) -> bool {
    size.x > 0 && size.y > 0 && size.z > 0
}

/// Number of cells in a region of the given size.
///
/// Panics if the size is not valid.
pub fn volume(size: Vec3<i32>) -> usize {
    assert!(is_size_valid(size), "invalid region size {:?}", size);
    size.x as usize * size.y as usize * size.z as usize
}

/// Whether `pos` lies within a region of the given size starting at the
/// origin.
pub fn contains(size: Vec3<i32>, pos: Vec3<i32>) -> bool {
    pos.x >= 0 && pos.y >= 0 && pos.z >= 0
    && pos.x < size.x && pos.y < size.y && pos.z < size.z
}

/// Convert a position to a linear cell index, or `None` if out of bounds.
///
/// X varies fastest, then Z, then Y. Every supported file layout stores its
/// cells in this order, so indices can be used directly against file data.
pub fn index_of(size: Vec3<i32>, pos: Vec3<i32>) -> Option<usize> {
    if !contains(size, pos) {
        return None;
    }
    let (sx, sz) = (size.x as usize, size.z as usize);
    Some((pos.y as usize * sz + pos.z as usize) * sx + pos.x as usize)
}

/// Convert a linear cell index back to a position.
///
/// Panics if the index is out of bounds.
pub fn pos_of(size: Vec3<i32>, index: usize) -> Vec3<i32> {
    assert!(index < volume(size), "cell index {} out of bounds", index);
    let (sx, sz) = (size.x as usize, size.z as usize);
    let layer = sx * sz;
    Vec3 {
        x: (index % sx) as i32,
        y: (index / layer) as i32,
        z: ((index % layer) / sx) as i32,
    }
}

/// Iterate over every position in a region of the given size, in index
/// order.
pub fn positions(size: Vec3<i32>) -> impl Iterator<Item=Vec3<i32>> {
    let size = size.map(|n| n.max(0));
    (0..size.y).flat_map(move |y| (0..size.z)
        .flat_map(move |z| (0..size.x)
            .map(move |x| Vec3 { x, y, z })))
}
