//! The player block
//!
//! One player block per player appears in every turn file.  It carries
//! the player's identity, their object counts, and — when the "full
//! data" flag is set — a 0x68-byte stats blob that includes the
//! player's hashed password, followed by the diplomatic relations
//! vector.  The singular and plural race names close the block.
//!
//! Byte 6 doubles as the decryption canary: its low two bits are
//! always `0b11` in a correctly decrypted payload, so a mismatch there
//! is how a wrong player hash first shows up.
use std::fmt::{Display, Formatter, Result};

use log::debug;

use nom::bytes::complete::take;
use nom::number::complete::le_u8;
use nom::IResult;

use crate::block_format::strings::compressed_string_parser;
use crate::error::{Error, ErrorKind};

/// Length of the full-data stats blob
const FULL_DATA_LENGTH: usize = 0x68;

/// Offset of the hashed password inside the full-data blob
const PASSWORD_OFFSET: usize = 4;

/// The extended player state only present when the full-data flag is
/// set.  Most of the blob is carried verbatim; the hashed password is
/// the part the password tools care about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerFullData {
    /// The raw 0x68-byte stats blob
    pub data: Vec<u8>,
    /// Relation bytes toward each other player: 0 neutral, 1 friend,
    /// 2 enemy
    pub relations: Vec<u8>,
}

/// A decoded player block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerBlock {
    /// The player number, 0-15
    pub player_number: u8,
    /// Number of ship designs the player has
    pub ship_design_count: u8,
    /// Number of planets the player owns, 10 bits
    pub planet_count: u16,
    /// Number of fleets the player owns, 10 bits
    pub fleet_count: u16,
    /// Number of starbase designs the player has
    pub starbase_design_count: u8,
    /// The player's logo, 0-31
    pub logo: u8,
    /// Extended state, present when the full-data flag was set
    pub full_data: Option<PlayerFullData>,
    /// The singular race name
    pub race_name: String,
    /// The plural race name, empty when the file omits it
    pub race_name_plural: String,
}

impl PlayerBlock {
    /// The player's hashed password, verbatim from decrypted payload
    /// bytes 12..16.  Only present with full data; zero means no
    /// password is set.
    pub fn hashed_password(&self) -> Option<[u8; 4]> {
        self.full_data.as_ref().map(|full| {
            let mut hash = [0u8; 4];
            hash.copy_from_slice(&full.data[PASSWORD_OFFSET..PASSWORD_OFFSET + 4]);
            hash
        })
    }

    /// The hashed password as a u32 for the cipher and the
    /// brute-forcer
    pub fn hashed_password_u32(&self) -> Option<u32> {
        self.hashed_password().map(u32::from_le_bytes)
    }
}

impl Display for PlayerBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "player {}: {} ({}), {} planets, {} fleets, {} designs",
            self.player_number,
            self.race_name,
            self.race_name_plural,
            self.planet_count,
            self.fleet_count,
            self.ship_design_count
        )
    }
}

/// Whether a decrypted payload passes the player block's structural
/// canary: bits 0-1 of byte 6 must be `0b11`.  The container uses this
/// to tell a wrong player hash apart from a malformed block.
pub fn player_marker_valid(data: &[u8]) -> bool {
    match data.get(6) {
        Some(byte) => byte & 0x03 == 0x03,
        None => false,
    }
}

/// Parse the two race names: each length-prefixed, with a one-byte
/// alignment skip when the plural is omitted.
fn race_names_parser(i: &[u8]) -> IResult<&[u8], (String, String)> {
    let (i, singular) = compressed_string_parser(i)?;

    // peek the plural byte length for the alignment rule
    let (i, plural_length) = le_u8(i)?;
    if plural_length == 0 {
        let (i, _pad) = take(1_usize)(i)?;
        return Ok((i, (singular, String::new())));
    }

    let (i, raw) = take(plural_length as usize)(i)?;
    match crate::block_format::strings::decode_compressed_string(raw) {
        Ok(plural) => Ok((i, (singular, plural))),
        Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
            raw,
            nom::error::ErrorKind::Verify,
        ))),
    }
}

/// Decode a player block from a decrypted payload.
pub fn decode_player_block(data: &[u8]) -> std::result::Result<PlayerBlock, Error> {
    if data.len() < 8 {
        return Err(Error::new(ErrorKind::new(&format!(
            "player block is {} bytes, expected at least 8",
            data.len()
        ))));
    }

    let planet_high = data[3];
    if planet_high & 0xFC != 0 {
        return Err(Error::new(ErrorKind::new(
            "top 6 bits of byte 3 are not zero",
        )));
    }
    let planet_count = data[2] as u16 | ((planet_high as u16 & 0x03) << 8);

    let fleet_high = data[5];
    if fleet_high & 0x0C != 0 {
        return Err(Error::new(ErrorKind::new("bits 2-3 of byte 5 are not zero")));
    }
    let fleet_count = data[4] as u16 | ((fleet_high as u16 & 0x03) << 8);
    let starbase_design_count = fleet_high >> 4;

    if !player_marker_valid(data) {
        return Err(Error::new(ErrorKind::new("bits 0-1 of byte 6 are not 0b11")));
    }
    let full_data_flag = data[6] & 0x04 != 0;
    let logo = data[6] >> 3;

    let mut names_input = &data[8..];
    let full_data = if full_data_flag {
        if data.len() < 8 + FULL_DATA_LENGTH + 1 {
            return Err(Error::new(ErrorKind::new(
                "payload too short for the full data blob",
            )));
        }
        let blob = data[8..8 + FULL_DATA_LENGTH].to_vec();

        let relations_count = data[8 + FULL_DATA_LENGTH] as usize;
        let relations_start = 8 + FULL_DATA_LENGTH + 1;
        let relations = match data.get(relations_start..relations_start + relations_count) {
            Some(bytes) => bytes.to_vec(),
            None => {
                return Err(Error::new(ErrorKind::new(
                    "payload too short for the relations vector",
                )))
            }
        };
        debug!("player full data with {} relation entries", relations.len());

        names_input = &data[relations_start + relations_count..];
        Some(PlayerFullData {
            data: blob,
            relations,
        })
    } else {
        None
    };

    let (_, (race_name, race_name_plural)) =
        race_names_parser(names_input).map_err(|_| {
            Error::new(ErrorKind::new("race names are malformed or truncated"))
        })?;

    Ok(PlayerBlock {
        player_number: data[0],
        ship_design_count: data[1],
        planet_count,
        fleet_count,
        starbase_design_count,
        logo,
        full_data,
        race_name,
        race_name_plural,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode_player_block, player_marker_valid};
    use crate::block_format::strings::encode_compressed_string;
    use pretty_assertions::assert_eq;

    /// Build a brief (no full data) player block payload
    fn brief_player_payload() -> Vec<u8> {
        let mut data = vec![
            0x01, // player 1
            0x05, // 5 ship designs
            0x2A, 0x01, // 298 planets
            0x10, 0x21, // 272 fleets, 2 starbase designs
            0b01011_0_11, // logo 11, no full data, marker bits
            0x00, // reserved
        ];
        let singular = encode_compressed_string("Rabbitoid");
        data.push(singular.len() as u8);
        data.extend(&singular);
        let plural = encode_compressed_string("Rabbitoids");
        data.push(plural.len() as u8);
        data.extend(&plural);
        data
    }

    #[test]
    fn decode_brief_player_block_works() {
        let data = brief_player_payload();
        let player = decode_player_block(&data).unwrap();

        assert_eq!(player.player_number, 1);
        assert_eq!(player.ship_design_count, 5);
        assert_eq!(player.planet_count, 298);
        assert_eq!(player.fleet_count, 272);
        assert_eq!(player.starbase_design_count, 2);
        assert_eq!(player.logo, 11);
        assert_eq!(player.full_data, None);
        assert_eq!(player.race_name, "Rabbitoid");
        assert_eq!(player.race_name_plural, "Rabbitoids");
        assert_eq!(player.hashed_password(), None);
    }

    #[test]
    fn decode_full_data_player_block_works() {
        let mut data = vec![
            0x00, // player 0
            0x02, // designs
            0x01, 0x00, // 1 planet
            0x01, 0x00, // 1 fleet, 0 starbase designs
            0b00001_1_11, // logo 1, full data
            0x00,
        ];
        let mut blob = vec![0u8; 0x68];
        blob[4..8].copy_from_slice(&[0xEE, 0xAB, 0x4D, 0x09]);
        data.extend(&blob);
        data.push(3); // three relation entries
        data.extend([0, 1, 2]);
        let singular = encode_compressed_string("Humanoid");
        data.push(singular.len() as u8);
        data.extend(&singular);
        data.push(0); // plural omitted
        data.push(0); // alignment pad

        let player = decode_player_block(&data).unwrap();
        assert_eq!(player.race_name, "Humanoid");
        assert_eq!(player.race_name_plural, "");
        let full = player.full_data.as_ref().unwrap();
        assert_eq!(full.relations, vec![0, 1, 2]);
        assert_eq!(player.hashed_password(), Some([0xEE, 0xAB, 0x4D, 0x09]));
        assert_eq!(player.hashed_password_u32(), Some(156085230));
    }

    #[test]
    fn bad_marker_bits_fail() {
        let mut data = brief_player_payload();
        data[6] &= 0xFE;
        assert!(!player_marker_valid(&data));
        assert!(decode_player_block(&data).is_err());
    }

    #[test]
    fn nonzero_reserved_planet_bits_fail() {
        let mut data = brief_player_payload();
        data[3] = 0x10;
        assert!(decode_player_block(&data).is_err());
    }

    #[test]
    fn nonzero_reserved_fleet_bits_fail() {
        let mut data = brief_player_payload();
        data[5] |= 0x04;
        assert!(decode_player_block(&data).is_err());
    }
}
