//! Planet blocks
//!
//! The planets summary block (type 7) is the universe map: every
//! planet's id, position and name index.  Full planet blocks (type 13)
//! describe planets the file owner can see in detail, partial planet
//! blocks (type 14) are old scanner data, and planet-change orders
//! (type 35) edit a planet's route target.
use std::fmt::{Display, Formatter, Result};

use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;

use crate::error::{Error, ErrorKind};

/// The owner value marking an unowned planet
pub const UNOWNED: u8 = 0x1F;

/// One entry in the planets summary block.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanetSummary {
    /// The planet id
    pub id: u16,
    /// X coordinate in light years
    pub x: u16,
    /// Y coordinate in light years
    pub y: u16,
    /// Index into the game's planet name table
    pub name_id: u16,
}

/// The universe map (block type 7).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlanetsBlock {
    /// Every planet in the universe
    pub planets: Vec<PlanetSummary>,
}

impl Display for PlanetsBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "universe of {} planets", self.planets.len())
    }
}

/// Parse one planet summary record
fn planet_summary_parser(i: &[u8]) -> IResult<&[u8], PlanetSummary> {
    let (i, id) = le_u16(i)?;
    let (i, x) = le_u16(i)?;
    let (i, y) = le_u16(i)?;
    let (i, name_id) = le_u16(i)?;

    Ok((i, PlanetSummary { id, x, y, name_id }))
}

/// Parse a planets summary block
pub fn planets_block_parser(i: &[u8]) -> IResult<&[u8], PlanetsBlock> {
    let (i, planet_count) = le_u16(i)?;
    let (i, _reserved) = le_u16(i)?;
    let (i, planets) = count(planet_summary_parser, planet_count as usize)(i)?;

    Ok((i, PlanetsBlock { planets }))
}

/// Decode a planets summary block from a decrypted payload
pub fn decode_planets_block(data: &[u8]) -> std::result::Result<PlanetsBlock, Error> {
    match planets_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(
            "planets block is shorter than its planet count claims",
        ))),
    }
}

/// A planet in full detail (block type 13).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanetBlock {
    /// The planet number, 11 bits
    pub planet_number: u16,
    /// The owning player index, [UNOWNED] when nobody owns it
    pub owner: u8,
    /// This is the owner's homeworld
    pub homeworld: bool,
    /// A starbase orbits the planet
    pub starbase: bool,
    /// The planet holds an artifact
    pub artifact: bool,
    /// The planet has been terraformed
    pub terraformed: bool,
    /// Ironium concentration, 0-100
    pub ironium_concentration: u8,
    /// Boranium concentration, 0-100
    pub boranium_concentration: u8,
    /// Germanium concentration, 0-100
    pub germanium_concentration: u8,
    /// Gravity, in the game's clicks scale
    pub gravity: u8,
    /// Temperature, in the game's clicks scale
    pub temperature: u8,
    /// Radiation, in the game's clicks scale
    pub radiation: u8,
    /// Population
    pub population: u32,
    /// Ironium on the surface, in kT
    pub surface_ironium: u32,
    /// Boranium on the surface, in kT
    pub surface_boranium: u32,
    /// Germanium on the surface, in kT
    pub surface_germanium: u32,
}

impl Display for PlanetBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if self.owner == UNOWNED {
            write!(f, "planet {}, unowned", self.planet_number)
        } else {
            write!(
                f,
                "planet {} of player {}, population {}",
                self.planet_number, self.owner, self.population
            )
        }
    }
}

/// Split a planet id word into planet number and owner, and a flags
/// word into its booleans
fn planet_words(id_word: u16, flags: u16) -> (u16, u8, bool, bool, bool, bool) {
    (
        id_word & 0x07FF,
        (id_word >> 11) as u8,
        flags & 0x01 != 0,
        flags & 0x02 != 0,
        flags & 0x04 != 0,
        flags & 0x08 != 0,
    )
}

/// Parse a full planet block
pub fn planet_block_parser(i: &[u8]) -> IResult<&[u8], PlanetBlock> {
    let (i, id_word) = le_u16(i)?;
    let (i, flags) = le_u16(i)?;
    let (i, ironium_concentration) = le_u8(i)?;
    let (i, boranium_concentration) = le_u8(i)?;
    let (i, germanium_concentration) = le_u8(i)?;
    let (i, gravity) = le_u8(i)?;
    let (i, temperature) = le_u8(i)?;
    let (i, radiation) = le_u8(i)?;
    let (i, population) = le_u32(i)?;
    let (i, surface_ironium) = le_u32(i)?;
    let (i, surface_boranium) = le_u32(i)?;
    let (i, surface_germanium) = le_u32(i)?;

    let (planet_number, owner, homeworld, starbase, artifact, terraformed) =
        planet_words(id_word, flags);

    Ok((
        i,
        PlanetBlock {
            planet_number,
            owner,
            homeworld,
            starbase,
            artifact,
            terraformed,
            ironium_concentration,
            boranium_concentration,
            germanium_concentration,
            gravity,
            temperature,
            radiation,
            population,
            surface_ironium,
            surface_boranium,
            surface_germanium,
        },
    ))
}

/// Decode a full planet block from a decrypted payload
pub fn decode_planet_block(data: &[u8]) -> std::result::Result<PlanetBlock, Error> {
    match planet_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "planet block is {} bytes, expected 26",
            data.len()
        )))),
    }
}

/// Old scanner data for a planet (block type 14).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PartialPlanetBlock {
    /// The planet number, 11 bits
    pub planet_number: u16,
    /// The owning player index, [UNOWNED] when nobody owns it
    pub owner: u8,
    /// This is the owner's homeworld
    pub homeworld: bool,
    /// A starbase orbits the planet
    pub starbase: bool,
    /// The planet holds an artifact
    pub artifact: bool,
    /// The planet has been terraformed
    pub terraformed: bool,
    /// Ironium concentration, 0-100
    pub ironium_concentration: u8,
    /// Boranium concentration, 0-100
    pub boranium_concentration: u8,
    /// Germanium concentration, 0-100
    pub germanium_concentration: u8,
}

impl Display for PartialPlanetBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "scanned planet {}", self.planet_number)
    }
}

/// Parse a partial planet block
pub fn partial_planet_block_parser(i: &[u8]) -> IResult<&[u8], PartialPlanetBlock> {
    let (i, id_word) = le_u16(i)?;
    let (i, flags) = le_u16(i)?;
    let (i, ironium_concentration) = le_u8(i)?;
    let (i, boranium_concentration) = le_u8(i)?;
    let (i, germanium_concentration) = le_u8(i)?;

    let (planet_number, owner, homeworld, starbase, artifact, terraformed) =
        planet_words(id_word, flags);

    Ok((
        i,
        PartialPlanetBlock {
            planet_number,
            owner,
            homeworld,
            starbase,
            artifact,
            terraformed,
            ironium_concentration,
            boranium_concentration,
            germanium_concentration,
        },
    ))
}

/// Decode a partial planet block from a decrypted payload
pub fn decode_partial_planet_block(
    data: &[u8],
) -> std::result::Result<PartialPlanetBlock, Error> {
    match partial_planet_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "partial planet block is {} bytes, expected 7",
            data.len()
        )))),
    }
}

/// A planet route order (block type 35).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlanetChangeBlock {
    /// The planet whose orders change
    pub planet_number: u16,
    /// The new route target planet
    pub route_target: u16,
}

impl Display for PlanetChangeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "planet {} routes to {}",
            self.planet_number, self.route_target
        )
    }
}

/// Decode a planet-change order from a decrypted payload
pub fn decode_planet_change_block(data: &[u8]) -> std::result::Result<PlanetChangeBlock, Error> {
    if data.len() != 4 {
        return Err(Error::new(ErrorKind::new(&format!(
            "planet change order is {} bytes, expected 4",
            data.len()
        ))));
    }

    Ok(PlanetChangeBlock {
        planet_number: u16::from_le_bytes([data[0], data[1]]),
        route_target: u16::from_le_bytes([data[2], data[3]]),
    })
}
