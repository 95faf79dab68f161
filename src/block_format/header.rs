//! The file header block
//!
//! The first block of every turn file is a 16-byte header stored in
//! the clear.  It identifies the game, the turn, the owning player and
//! carries the salt the keystream is seeded from, so it has to be
//! parsed before any other block can be decrypted.
use std::fmt::{Display, Formatter, Result};

use nom::bytes::complete::tag;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;

use crate::block_format::framing::RawBlock;
use crate::error::{Error, ErrorKind};

/// The block type id of the file header
pub const FILE_HEADER_BLOCK_TYPE: u8 = 8;

/// The magic identifier at the start of every turn file
pub const FILE_HEADER_MAGIC: &[u8; 4] = b"J3J3";

/// The parsed file header block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileHeaderBlock {
    /// The 32-bit game id the host assigned when the game was created
    pub game_id: u32,
    /// Major version of the game that wrote the file
    pub version_major: u8,
    /// Minor version
    pub version_minor: u8,
    /// Version increment
    pub version_increment: u8,
    /// The turn counter; turn 0 is game year 2400
    pub turn: u16,
    /// The 11-bit keystream salt
    pub salt: u16,
    /// The index of the player this file belongs to, 0-15
    pub player_index: u8,
    /// Discriminator for the file flavor the extension encodes
    pub file_type: u8,
    /// The player has submitted this turn
    pub turn_submitted: bool,
    /// The file is currently open in the host program
    pub host_using: bool,
    /// The file holds multiple turns
    pub multiple_turns: bool,
    /// The game is over
    pub game_over: bool,
    /// The file was written by the shareware edition
    pub shareware: bool,
}

impl FileHeaderBlock {
    /// The game year this file covers
    pub fn year(&self) -> u16 {
        2400 + self.turn
    }

    /// Upgrade the first framed block of a file into a file header.
    ///
    /// # Returns
    ///
    /// The parsed header, or InvalidFileHeaderBlock if the block has
    /// the wrong type id, is shorter than 16 bytes or does not start
    /// with the magic identifier.
    pub fn from_block(block: &RawBlock) -> std::result::Result<FileHeaderBlock, Error> {
        if block.block_type != FILE_HEADER_BLOCK_TYPE {
            return Err(Error::new(ErrorKind::InvalidFileHeaderBlock(format!(
                "first block has type {}, expected {}",
                block.block_type, FILE_HEADER_BLOCK_TYPE
            ))));
        }

        if block.data.len() < 16 {
            return Err(Error::new(ErrorKind::InvalidFileHeaderBlock(format!(
                "header payload is {} bytes, expected 16",
                block.data.len()
            ))));
        }

        match file_header_parser(block.data) {
            Ok((_, header)) => Ok(header),
            Err(_) => Err(Error::new(ErrorKind::InvalidFileHeaderBlock(String::from(
                "magic identifier mismatch",
            )))),
        }
    }
}

impl Display for FileHeaderBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "game: {:#010x}, version: {}.{}.{}, year: {}, ",
            self.game_id, self.version_major, self.version_minor, self.version_increment,
            self.year()
        )?;
        write!(
            f,
            "player: {}, submitted: {}, game over: {}",
            self.player_index, self.turn_submitted, self.game_over
        )
    }
}

/// Parse the 16-byte payload of a file header block
pub fn file_header_parser(i: &[u8]) -> IResult<&[u8], FileHeaderBlock> {
    let (i, _magic) = tag(&FILE_HEADER_MAGIC[..])(i)?;
    let (i, game_id) = le_u32(i)?;
    let (i, version) = le_u16(i)?;
    let (i, turn) = le_u16(i)?;
    let (i, player_word) = le_u16(i)?;
    let (i, file_type) = le_u8(i)?;
    let (i, flags) = le_u8(i)?;

    Ok((
        i,
        FileHeaderBlock {
            game_id,
            version_major: (version >> 12) as u8,
            version_minor: ((version >> 5) & 0x7F) as u8,
            version_increment: (version & 0x1F) as u8,
            turn,
            salt: player_word >> 5,
            player_index: (player_word & 0x1F) as u8,
            file_type,
            turn_submitted: flags & 0x01 != 0,
            host_using: flags & 0x02 != 0,
            multiple_turns: flags & 0x04 != 0,
            game_over: flags & 0x08 != 0,
            shareware: flags & 0x10 != 0,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::{file_header_parser, FileHeaderBlock};
    use crate::block_format::framing::RawBlock;
    use pretty_assertions::assert_eq;

    /// A header for game 0x12345678, version 2.83.0, turn 8, salt
    /// 0x2A5, player 1, turn submitted
    fn sample_header() -> [u8; 16] {
        // version word: 2 << 12 | 83 << 5 | 0 = 0x2A60
        // player word: 0x2A5 << 5 | 1 = 0x54A1
        [
            0x4A, 0x33, 0x4A, 0x33, 0x78, 0x56, 0x34, 0x12, 0x60, 0x2A, 0x08, 0x00, 0xA1, 0x54,
            0x00, 0x01,
        ]
    }

    #[test]
    fn file_header_parser_works() {
        let (_, header) = file_header_parser(&sample_header()).unwrap();

        assert_eq!(header.game_id, 0x12345678);
        assert_eq!(header.version_major, 2);
        assert_eq!(header.version_minor, 83);
        assert_eq!(header.version_increment, 0);
        assert_eq!(header.turn, 8);
        assert_eq!(header.year(), 2408);
        assert_eq!(header.salt, 0x2A5);
        assert_eq!(header.player_index, 1);
        assert_eq!(header.file_type, 0);
        assert!(header.turn_submitted);
        assert!(!header.host_using);
        assert!(!header.shareware);
    }

    #[test]
    fn from_block_rejects_wrong_type() {
        let data = sample_header();
        let block = RawBlock {
            block_type: 6,
            size: 16,
            data: &data,
        };
        assert!(FileHeaderBlock::from_block(&block).is_err());
    }

    #[test]
    fn from_block_rejects_short_payload() {
        let data = sample_header();
        let block = RawBlock {
            block_type: 8,
            size: 12,
            data: &data[0..12],
        };
        assert!(FileHeaderBlock::from_block(&block).is_err());
    }

    #[test]
    fn from_block_rejects_bad_magic() {
        let mut data = sample_header();
        data[0] = 0x4B;
        let block = RawBlock {
            block_type: 8,
            size: 16,
            data: &data,
        };
        assert!(FileHeaderBlock::from_block(&block).is_err());
    }

    #[test]
    fn from_block_accepts_a_valid_header() {
        let data = sample_header();
        let block = RawBlock {
            block_type: 8,
            size: 16,
            data: &data,
        };
        let header = FileHeaderBlock::from_block(&block).unwrap();
        assert_eq!(header.player_index, 1);
        assert_eq!(header.turn, 8);
    }
}
