//! Splitting a turn file into framed blocks
//!
//! A turn file is a stream of 16-bit little-endian framing words, each
//! followed by its payload.  The word packs the payload size in the
//! high 10 bits and the block type id in the low 6 bits.  The framer
//! is content-agnostic: it never decrypts and never interprets, so it
//! can be reused by diagnostics tools on files whose keys are unknown.
use log::debug;

use nom::bytes::complete::take;
use nom::number::complete::le_u16;
use nom::IResult;

use crate::error::{Error, ErrorKind};
use crate::serialize::{little_endian_word_to_bytes, Serializer};

/// Mask for the type id bits of a framing word
const TYPE_ID_MASK: u16 = 0x3F;

/// Number of bits the size is shifted left in a framing word
const SIZE_SHIFT: u16 = 6;

/// A framed block as stored on disk: a type id, a size and the raw
/// (still encrypted) payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawBlock<'a> {
    /// The block type id, 0-63
    pub block_type: u8,
    /// The payload length in bytes, 0-1023
    pub size: u16,
    /// The payload as stored on disk
    pub data: &'a [u8],
}

/// Serialize a RawBlock back to its on-disk form.  The framer and this
/// impl round-trip: concatenating the serialized blocks reproduces the
/// original file bytewise.
impl<'a> Serializer<'a> for RawBlock<'a> {
    fn as_vec(&'a self) -> Result<Vec<u8>, Error> {
        let word = (self.size << SIZE_SHIFT) | (self.block_type as u16);
        let mut out = little_endian_word_to_bytes(word);
        out.extend_from_slice(self.data);
        Ok(out)
    }
}

/// Parse a single framed block
pub fn raw_block_parser(i: &[u8]) -> IResult<&[u8], RawBlock> {
    let (i, word) = le_u16(i)?;

    let block_type = (word & TYPE_ID_MASK) as u8;
    let size = word >> SIZE_SHIFT;

    let (i, data) = take(size as usize)(i)?;

    Ok((
        i,
        RawBlock {
            block_type,
            size,
            data,
        },
    ))
}

/// Split a whole file into its framed blocks.
///
/// # Returns
///
/// The ordered block list, or TruncatedFile if a framing word claims
/// more payload than the file still holds.
pub fn block_framer(data: &[u8]) -> Result<Vec<RawBlock>, Error> {
    let mut blocks = Vec::new();
    let mut i = data;

    while !i.is_empty() {
        match raw_block_parser(i) {
            Ok((rest, block)) => {
                debug!(
                    "framed block {} type {} size {}",
                    blocks.len(),
                    block.block_type,
                    block.size
                );
                blocks.push(block);
                i = rest;
            }
            Err(_) => return Err(Error::new(ErrorKind::TruncatedFile)),
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::{block_framer, raw_block_parser, RawBlock};
    use crate::serialize::Serializer;
    use pretty_assertions::assert_eq;

    /// size 3 type 6: word = (3 << 6) | 6 = 0xC6
    #[test]
    fn raw_block_parser_works() {
        let data = [0xC6, 0x00, 0xAA, 0xBB, 0xCC, 0xDD];

        let (rest, block) = raw_block_parser(&data).unwrap();
        assert_eq!(block.block_type, 6);
        assert_eq!(block.size, 3);
        assert_eq!(block.data, [0xAA, 0xBB, 0xCC]);
        assert_eq!(rest, [0xDD]);
    }

    #[test]
    fn block_framer_splits_a_stream() {
        // type 8 size 2, type 0 size 0
        let data = [0x88, 0x00, 0x11, 0x22, 0x00, 0x00];

        let blocks = block_framer(&data).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].block_type, 8);
        assert_eq!(blocks[0].size, 2);
        assert_eq!(blocks[1].block_type, 0);
        assert_eq!(blocks[1].size, 0);
        assert_eq!(blocks[1].data, &[] as &[u8]);
    }

    #[test]
    fn block_framer_reports_truncation() {
        // claims 4 payload bytes, carries 1
        let data = [0x06, 0x01, 0xAA];
        assert!(block_framer(&data).is_err());

        // a lone byte cannot hold a framing word
        let data = [0x06];
        assert!(block_framer(&data).is_err());
    }

    #[test]
    fn framing_round_trips() {
        let data = [0x88, 0x00, 0x11, 0x22, 0xC6, 0x00, 0xAA, 0xBB, 0xCC, 0x00, 0x00];

        let blocks = block_framer(&data).unwrap();
        let mut rebuilt: Vec<u8> = Vec::new();
        for block in &blocks {
            rebuilt.extend(block.as_vec().unwrap());
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn ten_bit_sizes_and_six_bit_types_unpack() {
        // size 1023, type 63: word 0xFFFF
        let mut data = vec![0xFF, 0xFF];
        data.extend(std::iter::repeat(0x5A).take(1023));

        let blocks = block_framer(&data).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].block_type, 63);
        assert_eq!(blocks[0].size, 1023);
        let expected = RawBlock {
            block_type: 63,
            size: 1023,
            data: &data[2..],
        };
        assert_eq!(blocks[0], expected);
    }
}
