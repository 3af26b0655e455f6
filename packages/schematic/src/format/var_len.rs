//! Variable-length unsigned ints, as packed into a sponge `BlockData` byte
//! array.

const MORE_BIT: u8  = 0b10000000;
const LO_7_BITS: u8 = 0b01111111;

/// Most bytes a `u32` can take.
const MAX_BYTES: usize = 5;


/// Append a variable length unsigned int.
pub fn write_var_len_uint(buf: &mut Vec<u8>, mut n: u32) {
    let mut more = true;
    while more {
        let curr_7_bits = (n & (LO_7_BITS as u32)) as u8;
        n >>= 7;
        more = n != 0;
        buf.push(((more as u8) << 7) | curr_7_bits);
    }
}

/// Reader of consecutive variable length unsigned ints from a byte slice.
#[derive(Debug, Clone)]
pub struct VarLenReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> VarLenReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        VarLenReader { bytes, offset: 0 }
    }

    /// Byte offset of the next int.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_done(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Read the next int, or `None` if the bytes end mid-int or the int
    /// does not fit `u32`.
    pub fn read(&mut self) -> Option<u32> {
        let mut n: u64 = 0;
        let mut shift = 0;
        for i in 0..MAX_BYTES {
            let curr_byte = *self.bytes.get(self.offset + i)?;
            n |= ((curr_byte & LO_7_BITS) as u64) << shift;
            shift += 7;
            if (curr_byte & MORE_BIT) == 0 {
                self.offset += i + 1;
                return u32::try_from(n).ok();
            }
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_len_uint() {
        let mut buf = Vec::new();
        for n in (0..2 << 10).chain([u32::MAX - 1, u32::MAX]) {
            buf.clear();
            write_var_len_uint(&mut buf, n);
            let mut reader = VarLenReader::new(&buf);
            assert_eq!(reader.read(), Some(n));
            assert!(reader.is_done());
        }
    }

    #[test]
    fn test_known_bytes() {
        let mut buf = Vec::new();
        write_var_len_uint(&mut buf, 1);
        write_var_len_uint(&mut buf, 300);
        assert_eq!(buf, [0x01, 0xac, 0x02]);
        let mut reader = VarLenReader::new(&buf);
        assert_eq!(reader.read(), Some(1));
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read(), Some(300));
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn test_truncated_and_oversized() {
        assert_eq!(VarLenReader::new(&[0x80, 0x80]).read(), None);
        assert_eq!(VarLenReader::new(&[0xff, 0xff, 0xff, 0xff, 0x7f]).read(), None);
        assert_eq!(VarLenReader::new(&[0xff; 6]).read(), None);
    }
}
