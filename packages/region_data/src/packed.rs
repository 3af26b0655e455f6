//! Bit-packed storage of small unsigned ints.

use crate::error::ContainerError;


/// Fixed-length array of `bits`-wide unsigned ints packed into `u64` words.
///
/// Entries are laid out back to back starting at the least significant bit
/// of word 0, and an entry may straddle two words. This is the layout used
/// by the litematica `BlockStates` long array, so the words can be written to
/// and read from a file directly.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PackedIntArray {
    bits: u32,
    mask: u64,
    len: usize,
    words: Vec<u64>,
}

/// Number of words needed to store `len` entries of `bits` bits.
pub fn word_count(bits: u32, len: usize) -> usize {
    (len * bits as usize + 63) / 64
}

impl PackedIntArray {
    /// Construct with all zeroes.
    ///
    /// Panics if `bits` is not within `1..=32`.
    pub fn new(bits: u32, len: usize) -> Self {
        assert!(bits >= 1 && bits <= 32, "unsupported entry width {}", bits);
        PackedIntArray {
            bits,
            mask: (1u64 << bits) - 1,
            len,
            words: vec![0; word_count(bits, len)],
        }
    }

    /// Wrap existing words, checking that there are exactly as many as
    /// `len` entries require.
    pub fn from_words(
        bits: u32,
        len: usize,
        words: Vec<u64>,
    ) -> Result<Self, ContainerError> {
        assert!(bits >= 1 && bits <= 32, "unsupported entry width {}", bits);
        let expected = word_count(bits, len);
        if words.len() != expected {
            return Err(ContainerError::WordCount {
                expected,
                actual: words.len(),
            });
        }
        Ok(PackedIntArray {
            bits,
            mask: (1u64 << bits) - 1,
            len,
            words,
        })
    }

    /// Get the value at some index.
    ///
    /// Panics if index out of range.
    pub fn get(&self, i: usize) -> u32 {
        assert!(i < self.len, "index {} out of range 0..{}", i, self.len);

        let start_bit = i * self.bits as usize;
        let start_word = start_bit >> 6;
        let end_word = ((i + 1) * self.bits as usize - 1) >> 6;
        let shift = (start_bit & 63) as u32;

        let value = if start_word == end_word {
            self.words[start_word] >> shift
        } else {
            (self.words[start_word] >> shift)
            | (self.words[end_word] << (64 - shift))
        };
        (value & self.mask) as u32
    }

    /// Set the value at some index.
    ///
    /// Panics if index out of range or value does not fit in the entry width.
    pub fn set(&mut self, i: usize, val: u32) {
        assert!(i < self.len, "index {} out of range 0..{}", i, self.len);
        assert!((val as u64 & !self.mask) == 0, "val {} out of range", val);

        let start_bit = i * self.bits as usize;
        let start_word = start_bit >> 6;
        let end_word = ((i + 1) * self.bits as usize - 1) >> 6;
        let shift = (start_bit & 63) as u32;
        let val = val as u64;

        let word = &mut self.words[start_word];
        *word = (*word & !(self.mask << shift)) | (val << shift);

        if start_word != end_word {
            let hi_shift = 64 - shift;
            let word = &mut self.words[end_word];
            *word = (*word & !(self.mask >> hi_shift)) | (val >> hi_shift);
        }
    }

    /// Copy into a new array with a different entry width.
    ///
    /// Panics if some stored value does not fit the new width.
    pub fn repacked(&self, bits: u32) -> Self {
        let mut packed = PackedIntArray::new(bits, self.len);
        for (i, val) in self.iter().enumerate() {
            packed.set(i, val);
        }
        packed
    }

    /// Iterate over every value in index order.
    pub fn iter(&self) -> impl Iterator<Item=u32> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn into_words(self) -> Vec<u64> {
        self.words
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(2, 32), 1);
        assert_eq!(word_count(2, 33), 2);
        assert_eq!(word_count(5, 64), 5);
        assert_eq!(word_count(3, 0), 0);
    }

    #[test]
    fn test_values_straddling_words() {
        // 5 bit entries do not divide 64, so entry 12 spans words 0 and 1
        let mut packed = PackedIntArray::new(5, 100);
        for i in 0..100 {
            packed.set(i, (i as u32 * 7) % 32);
        }
        for i in 0..100 {
            assert_eq!(packed.get(i), (i as u32 * 7) % 32, "index {}", i);
        }
    }

    #[test]
    fn test_set_leaves_neighbours() {
        let mut packed = PackedIntArray::new(3, 50);
        for i in 0..50 {
            packed.set(i, 7);
        }
        packed.set(21, 0);
        for i in 0..50 {
            assert_eq!(packed.get(i), if i == 21 { 0 } else { 7 });
        }
    }

    #[test]
    fn test_known_layout() {
        // two 2 bit entries: 1 at index 0, 2 at index 3
        let mut packed = PackedIntArray::new(2, 4);
        packed.set(0, 1);
        packed.set(3, 2);
        assert_eq!(packed.words(), &[0b10_00_00_01]);
    }

    #[test]
    fn test_repacked_keeps_values() {
        let mut packed = PackedIntArray::new(2, 40);
        for i in 0..40 {
            packed.set(i, i as u32 % 4);
        }
        let wide = packed.repacked(7);
        assert_eq!(wide.bits(), 7);
        assert!(packed.iter().eq(wide.iter()));
    }

    #[test]
    fn test_from_words_checks_count() {
        assert_eq!(
            PackedIntArray::from_words(4, 20, vec![0]),
            Err(ContainerError::WordCount { expected: 2, actual: 1 }),
        );
        assert!(PackedIntArray::from_words(4, 20, vec![0, 0]).is_ok());
    }

    #[test]
    #[should_panic]
    fn test_set_rejects_wide_values() {
        PackedIntArray::new(2, 4).set(0, 4);
    }
}
