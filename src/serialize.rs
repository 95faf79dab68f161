//! Serializer trait and functions to help serialize blocks to vectors
//! of bytes and other data types.
use crate::error::Error;
use std::result::Result;

/// Serializer is a trait that lets you build custom serializers for
/// structures.
pub trait Serializer<'a> {
    /// Serialize a structure to a vector of bytes
    fn as_vec(&'a self) -> Result<Vec<u8>, Error>;
}

impl<'a> Serializer<'a> for Vec<u8> {
    fn as_vec(&'a self) -> Result<Vec<u8>, Error> {
        Ok(self.to_vec())
    }
}

/// Convert a 16-bit word to a little-endian pair of bytes
pub fn little_endian_word_to_bytes(word: u16) -> Vec<u8> {
    word.to_le_bytes().to_vec()
}

/// Convert a 32-bit word to little-endian bytes
pub fn little_endian_dword_to_bytes(dword: u32) -> Vec<u8> {
    dword.to_le_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::{little_endian_dword_to_bytes, little_endian_word_to_bytes};

    #[test]
    fn little_endian_word_to_bytes_works() {
        assert_eq!(little_endian_word_to_bytes(0x0208), vec![0x08, 0x02]);
    }

    #[test]
    fn little_endian_dword_to_bytes_works() {
        assert_eq!(
            little_endian_dword_to_bytes(156085230),
            vec![0xEE, 0xAB, 0x4D, 0x09]
        );
    }
}
