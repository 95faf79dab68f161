//! Fleet blocks
//!
//! A full fleet block (type 16) describes one of the file owner's own
//! fleets down to its cargo hold.  Partial fleet blocks (type 17) are
//! the scanner's view of everyone else's fleets: position, mass and a
//! ship-type bitmask, but no cargo and no component breakdown.
use std::fmt::{Display, Formatter, Result};

use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;

use crate::block_format::strings::compressed_string_parser;
use crate::error::{Error, ErrorKind};

/// Unpack the fleet id word shared by both fleet shapes: a 9-bit fleet
/// number, a 5-bit owner and two reserved bits that must be zero.
fn fleet_id_word(word: u16) -> std::result::Result<(u16, u8), Error> {
    if word & 0xC000 != 0 {
        return Err(Error::new(ErrorKind::new(
            "top 2 bits of the fleet id word are not zero",
        )));
    }
    Ok((word & 0x01FF, ((word >> 9) & 0x1F) as u8))
}

/// Parse the per-design ship counts for each bit set in the ship-type
/// bitmask, ascending design number.
fn ship_counts_parser(ship_types: u16) -> impl Fn(&[u8]) -> IResult<&[u8], Vec<(u8, u16)>> {
    move |i| {
        let designs: Vec<u8> = (0_u8..16)
            .filter(|design| ship_types & (1_u16 << design) != 0)
            .collect();
        let (i, counts) = count(le_u16, designs.len())(i)?;
        Ok((i, designs.into_iter().zip(counts).collect()))
    }
}

/// One of the file owner's fleets, fully visible (block type 16).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FleetBlock {
    /// The fleet number, 9 bits
    pub fleet_number: u16,
    /// The owning player index
    pub owner: u8,
    /// X coordinate in light years
    pub x: u16,
    /// Y coordinate in light years
    pub y: u16,
    /// Bitmask of ship design numbers present in the fleet
    pub ship_types: u16,
    /// Ship count per design number, for each bit set in ship_types
    pub ship_counts: Vec<(u8, u16)>,
    /// Ironium in the cargo hold, in kT
    pub ironium: u32,
    /// Boranium in the cargo hold, in kT
    pub boranium: u32,
    /// Germanium in the cargo hold, in kT
    pub germanium: u32,
    /// Colonists in the cargo hold, in kT
    pub colonists: u32,
    /// Fuel on board, in mg
    pub fuel: u32,
    /// Number of waypoints on the fleet's course
    pub waypoint_count: u8,
    /// The battle plan the fleet follows
    pub battle_plan: u8,
}

impl FleetBlock {
    /// Total ships across all designs
    pub fn ship_count(&self) -> u32 {
        self.ship_counts.iter().map(|(_, n)| *n as u32).sum()
    }
}

impl Display for FleetBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "fleet {} of player {} at ({}, {}), {} ships, {} waypoints",
            self.fleet_number,
            self.owner,
            self.x,
            self.y,
            self.ship_count(),
            self.waypoint_count
        )
    }
}

/// Parse a full fleet block
pub fn fleet_block_parser(i: &[u8]) -> IResult<&[u8], (u16, FleetBlock)> {
    let (i, id_word) = le_u16(i)?;
    let (i, x) = le_u16(i)?;
    let (i, y) = le_u16(i)?;
    let (i, ship_types) = le_u16(i)?;
    let (i, ship_counts) = ship_counts_parser(ship_types)(i)?;
    let (i, ironium) = le_u32(i)?;
    let (i, boranium) = le_u32(i)?;
    let (i, germanium) = le_u32(i)?;
    let (i, colonists) = le_u32(i)?;
    let (i, fuel) = le_u32(i)?;
    let (i, waypoint_count) = le_u8(i)?;
    let (i, battle_plan) = le_u8(i)?;

    Ok((
        i,
        (
            id_word,
            FleetBlock {
                fleet_number: 0,
                owner: 0,
                x,
                y,
                ship_types,
                ship_counts,
                ironium,
                boranium,
                germanium,
                colonists,
                fuel,
                waypoint_count,
                battle_plan,
            },
        ),
    ))
}

/// Decode a full fleet block from a decrypted payload
pub fn decode_fleet_block(data: &[u8]) -> std::result::Result<FleetBlock, Error> {
    let (_, (id_word, mut fleet)) = fleet_block_parser(data).map_err(|_| {
        Error::new(ErrorKind::new(&format!(
            "fleet block is {} bytes, too short for its ship types",
            data.len()
        )))
    })?;

    let (fleet_number, owner) = fleet_id_word(id_word)?;
    fleet.fleet_number = fleet_number;
    fleet.owner = owner;
    Ok(fleet)
}

/// Another player's fleet as seen by the scanner (block type 17).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PartialFleetBlock {
    /// The fleet number, 9 bits
    pub fleet_number: u16,
    /// The owning player index
    pub owner: u8,
    /// X coordinate in light years
    pub x: u16,
    /// Y coordinate in light years
    pub y: u16,
    /// Bitmask of ship design numbers present in the fleet
    pub ship_types: u16,
    /// Ship count per design number, for each bit set in ship_types
    pub ship_counts: Vec<(u8, u16)>,
    /// Warp speed the fleet was observed at
    pub warp: u8,
    /// Estimated total mass in kT
    pub mass: u32,
}

impl PartialFleetBlock {
    /// Total ships across all designs
    pub fn ship_count(&self) -> u32 {
        self.ship_counts.iter().map(|(_, n)| *n as u32).sum()
    }
}

impl Display for PartialFleetBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "enemy fleet {} of player {} at ({}, {}), {} ships, warp {}, {} kT",
            self.fleet_number,
            self.owner,
            self.x,
            self.y,
            self.ship_count(),
            self.warp,
            self.mass
        )
    }
}

/// Parse a partial fleet block
pub fn partial_fleet_block_parser(i: &[u8]) -> IResult<&[u8], (u16, PartialFleetBlock)> {
    let (i, id_word) = le_u16(i)?;
    let (i, x) = le_u16(i)?;
    let (i, y) = le_u16(i)?;
    let (i, ship_types) = le_u16(i)?;
    let (i, ship_counts) = ship_counts_parser(ship_types)(i)?;
    let (i, warp) = le_u8(i)?;
    let (i, _reserved) = le_u8(i)?;
    let (i, mass) = le_u32(i)?;

    Ok((
        i,
        (
            id_word,
            PartialFleetBlock {
                fleet_number: 0,
                owner: 0,
                x,
                y,
                ship_types,
                ship_counts,
                warp,
                mass,
            },
        ),
    ))
}

/// Decode a partial fleet block from a decrypted payload
pub fn decode_partial_fleet_block(data: &[u8]) -> std::result::Result<PartialFleetBlock, Error> {
    let (_, (id_word, mut fleet)) = partial_fleet_block_parser(data).map_err(|_| {
        Error::new(ErrorKind::new(&format!(
            "partial fleet block is {} bytes, too short for its ship types",
            data.len()
        )))
    })?;

    let (fleet_number, owner) = fleet_id_word(id_word)?;
    fleet.fleet_number = fleet_number;
    fleet.owner = owner;
    Ok(fleet)
}

/// A fleet rename order (block type 21).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FleetNameBlock {
    /// The renamed fleet
    pub fleet_number: u16,
    /// The new name
    pub name: String,
}

impl Display for FleetNameBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "fleet {} named \"{}\"", self.fleet_number, self.name)
    }
}

/// Parse a fleet name block
pub fn fleet_name_parser(i: &[u8]) -> IResult<&[u8], FleetNameBlock> {
    let (i, fleet_number) = le_u16(i)?;
    let (i, name) = compressed_string_parser(i)?;

    Ok((i, FleetNameBlock { fleet_number, name }))
}

/// Decode a fleet name block from a decrypted payload
pub fn decode_fleet_name_block(data: &[u8]) -> std::result::Result<FleetNameBlock, Error> {
    match fleet_name_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(
            "fleet name block is truncated or its name is malformed",
        ))),
    }
}

/// An order merging fleets (block type 37): every listed fleet joins
/// the first one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FleetsMergeBlock {
    /// The fleet the others merge into
    pub target_fleet: u16,
    /// The fleets being merged away
    pub merged_fleets: Vec<u16>,
}

impl Display for FleetsMergeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "merge {} fleets into fleet {}",
            self.merged_fleets.len(),
            self.target_fleet
        )
    }
}

/// Decode a fleets-merge order from a decrypted payload
pub fn decode_fleets_merge_block(data: &[u8]) -> std::result::Result<FleetsMergeBlock, Error> {
    if data.len() < 4 || data.len() % 2 != 0 {
        return Err(Error::new(ErrorKind::new(&format!(
            "fleets merge order is {} bytes, expected an even count of at least 4",
            data.len()
        ))));
    }

    let mut words = data
        .chunks(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    let target_fleet = words.next().unwrap();

    Ok(FleetsMergeBlock {
        target_fleet,
        merged_fleets: words.collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        decode_fleet_block, decode_fleet_name_block, decode_fleets_merge_block,
        decode_partial_fleet_block,
    };
    use crate::block_format::strings::encode_compressed_string;
    use pretty_assertions::assert_eq;

    /// Fleet 5 of player 1, two designs (0 and 2), at (1004, 1132)
    fn sample_fleet_payload() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(0x0205_u16.to_le_bytes()); // fleet 5, owner 1
        data.extend(1004_u16.to_le_bytes());
        data.extend(1132_u16.to_le_bytes());
        data.extend(0x0005_u16.to_le_bytes()); // designs 0 and 2
        data.extend(3_u16.to_le_bytes()); // 3 ships of design 0
        data.extend(1_u16.to_le_bytes()); // 1 ship of design 2
        data.extend(120_u32.to_le_bytes()); // ironium
        data.extend(45_u32.to_le_bytes()); // boranium
        data.extend(300_u32.to_le_bytes()); // germanium
        data.extend(2500_u32.to_le_bytes()); // colonists
        data.extend(1800_u32.to_le_bytes()); // fuel
        data.push(2); // waypoints
        data.push(0); // battle plan
        data
    }

    #[test]
    fn decode_fleet_block_works() {
        let data = sample_fleet_payload();
        let fleet = decode_fleet_block(&data).unwrap();

        assert_eq!(fleet.fleet_number, 5);
        assert_eq!(fleet.owner, 1);
        assert_eq!(fleet.x, 1004);
        assert_eq!(fleet.y, 1132);
        assert_eq!(fleet.ship_types, 0x0005);
        assert_eq!(fleet.ship_counts, vec![(0, 3), (2, 1)]);
        assert_eq!(fleet.ship_count(), 4);
        assert_eq!(fleet.ironium, 120);
        assert_eq!(fleet.boranium, 45);
        assert_eq!(fleet.germanium, 300);
        assert_eq!(fleet.colonists, 2500);
        assert_eq!(fleet.fuel, 1800);
        assert_eq!(fleet.waypoint_count, 2);
    }

    #[test]
    fn fleet_id_reserved_bits_fail() {
        let mut data = sample_fleet_payload();
        data[1] |= 0x40;
        assert!(decode_fleet_block(&data).is_err());
    }

    #[test]
    fn truncated_ship_counts_fail() {
        let data = &sample_fleet_payload()[0..9];
        assert!(decode_fleet_block(data).is_err());
    }

    #[test]
    fn decode_partial_fleet_block_works() {
        let mut data = Vec::new();
        data.extend(0x0C07_u16.to_le_bytes()); // fleet 7, owner 6
        data.extend(2044_u16.to_le_bytes());
        data.extend(1132_u16.to_le_bytes());
        data.extend(0x0009_u16.to_le_bytes()); // designs 0 and 3
        data.extend(2_u16.to_le_bytes());
        data.extend(5_u16.to_le_bytes());
        data.push(7); // warp
        data.push(0);
        data.extend(540_u32.to_le_bytes()); // mass

        let fleet = decode_partial_fleet_block(&data).unwrap();
        assert_eq!(fleet.fleet_number, 7);
        assert_eq!(fleet.owner, 6);
        assert_eq!(fleet.x, 2044);
        assert_eq!(fleet.ship_counts, vec![(0, 2), (3, 5)]);
        assert_eq!(fleet.ship_count(), 7);
        assert_eq!(fleet.warp, 7);
        assert_eq!(fleet.mass, 540);
    }

    #[test]
    fn decode_fleet_name_works() {
        let mut data = Vec::new();
        data.extend(9_u16.to_le_bytes());
        let name = encode_compressed_string("Santa Maria");
        data.push(name.len() as u8);
        data.extend(&name);

        let block = decode_fleet_name_block(&data).unwrap();
        assert_eq!(block.fleet_number, 9);
        assert_eq!(block.name, "Santa Maria");
    }

    #[test]
    fn decode_fleets_merge_works() {
        let mut data = Vec::new();
        for fleet in [4_u16, 9, 12] {
            data.extend(fleet.to_le_bytes());
        }

        let block = decode_fleets_merge_block(&data).unwrap();
        assert_eq!(block.target_fleet, 4);
        assert_eq!(block.merged_fleets, vec![9, 12]);
    }

    #[test]
    fn merge_of_nothing_fails() {
        assert!(decode_fleets_merge_block(&[0x04, 0x00]).is_err());
    }
}
