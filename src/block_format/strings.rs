//! Encoding and decoding the compressed string format used in turn files
//!
//! Player race names, design names, fleet names, battle plan names and
//! message bodies are stored in a nibble-oriented encoding.  The first
//! byte of a stored string is the number of *characters* to produce;
//! the payload is read as a stream of hex nibbles, high nibble first.
//!
//! Frequent characters cost one nibble, the rest cost three:
//!
//! * `0x0`-`0xA` index the first alphabet directly
//! * `0xB`-`0xE` select one of four secondary alphabets; the next
//!   nibble indexes into it
//! * `0xF` is a literal escape; the next two nibbles form the raw byte
//!
//! The encoding is restartable and only lossy for characters outside
//! the alphabets, which fall back to the `0xF` escape.
use log::debug;

use nom::bytes::complete::take;
use nom::number::complete::le_u8;
use nom::IResult;

use crate::error::{Error, ErrorKind};

/// The one-nibble alphabet, by far the most common characters
const ALPHABET_DIRECT: &[u8; 11] = b" aehilnorst";

/// Secondary alphabet selected by a leading 0xB nibble
const ALPHABET_B: &[u8; 16] = b"ABCDEFGHIJKLMNOP";

/// Secondary alphabet selected by a leading 0xC nibble
const ALPHABET_C: &[u8; 16] = b"QRSTUVWXYZ012345";

/// Secondary alphabet selected by a leading 0xD nibble
const ALPHABET_D: &[u8; 16] = b"6789bcdfgjkmpquv";

/// Secondary alphabet selected by a leading 0xE nibble
const ALPHABET_E: &[u8; 16] = b"wxyz+-,!.?:;'*%$";

/// An iterator over the nibbles of a byte slice, high nibble first.
struct Nibbles<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Nibbles<'a> {
    fn new(data: &'a [u8]) -> Nibbles<'a> {
        Nibbles { data, pos: 0 }
    }

    /// Number of nibbles left in the stream
    fn remaining(&self) -> usize {
        self.data.len() * 2 - self.pos
    }

    fn next(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos / 2)?;
        let nibble = if self.pos % 2 == 0 {
            byte >> 4
        } else {
            byte & 0x0F
        };
        self.pos += 1;
        Some(nibble)
    }
}

/// Decode a compressed string.
///
/// The first byte of `data` is the target character count, the rest is
/// the nibble payload.
///
/// # Returns
///
/// The decoded string, or a DecodeString error if the payload runs out
/// before the advertised character count is produced.
pub fn decode_compressed_string(data: &[u8]) -> Result<String, Error> {
    let target = match data.first() {
        Some(t) => *t as usize,
        None => {
            return Err(Error::new(ErrorKind::DecodeString(String::from(
                "empty string buffer, missing character count",
            ))))
        }
    };

    let mut nibbles = Nibbles::new(&data[1..]);
    let mut out = String::with_capacity(target);
    let mut produced = 0;

    while produced < target {
        let lead = match nibbles.next() {
            Some(n) => n,
            None => {
                return Err(Error::new(ErrorKind::DecodeString(format!(
                    "ran out of input after {} of {} characters",
                    produced, target
                ))))
            }
        };

        match lead {
            0x0..=0xA => {
                out.push(ALPHABET_DIRECT[lead as usize] as char);
                produced += 1;
            }
            0xB..=0xE => {
                let index = match nibbles.next() {
                    Some(n) => n,
                    None => {
                        return Err(Error::new(ErrorKind::DecodeString(format!(
                            "alphabet {:X} selector at end of input",
                            lead
                        ))))
                    }
                };
                let table = match lead {
                    0xB => ALPHABET_B,
                    0xC => ALPHABET_C,
                    0xD => ALPHABET_D,
                    _ => ALPHABET_E,
                };
                out.push(table[index as usize] as char);
                produced += 1;
            }
            _ => {
                // Literal escape.  A truncated escape emits nothing.
                if nibbles.remaining() < 2 {
                    debug!("literal escape crosses end of buffer, skipping");
                    continue;
                }
                let high = nibbles.next().unwrap();
                let low = nibbles.next().unwrap();
                out.push(((high << 4) | low) as char);
                produced += 1;
            }
        }
    }

    Ok(out)
}

/// Encode a string into the compressed format, including the leading
/// character count byte.  The inverse of [decode_compressed_string]
/// for every character in the alphabets; anything else round-trips
/// through the literal escape.
pub fn encode_compressed_string(s: &str) -> Vec<u8> {
    let mut nibbles: Vec<u8> = Vec::with_capacity(s.len() * 2);

    for c in s.bytes() {
        if let Some(i) = ALPHABET_DIRECT.iter().position(|&a| a == c) {
            nibbles.push(i as u8);
        } else if let Some(i) = ALPHABET_B.iter().position(|&a| a == c) {
            nibbles.push(0xB);
            nibbles.push(i as u8);
        } else if let Some(i) = ALPHABET_C.iter().position(|&a| a == c) {
            nibbles.push(0xC);
            nibbles.push(i as u8);
        } else if let Some(i) = ALPHABET_D.iter().position(|&a| a == c) {
            nibbles.push(0xD);
            nibbles.push(i as u8);
        } else if let Some(i) = ALPHABET_E.iter().position(|&a| a == c) {
            nibbles.push(0xE);
            nibbles.push(i as u8);
        } else {
            nibbles.push(0xF);
            nibbles.push(c >> 4);
            nibbles.push(c & 0x0F);
        }
    }

    let mut out = Vec::with_capacity(2 + nibbles.len() / 2);
    out.push(s.len() as u8);
    for pair in nibbles.chunks(2) {
        let high = pair[0];
        let low = if pair.len() > 1 { pair[1] } else { 0 };
        out.push((high << 4) | low);
    }

    out
}

/// Parse a length-prefixed compressed string: a byte count, then that
/// many bytes holding the character count and nibble payload.
pub fn compressed_string_parser(i: &[u8]) -> IResult<&[u8], String> {
    let (i, byte_length) = le_u8(i)?;
    let (i, raw) = take(byte_length as usize)(i)?;

    match decode_compressed_string(raw) {
        Ok(s) => Ok((i, s)),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            raw,
            nom::error::ErrorKind::Verify,
        ))),
    }
}
