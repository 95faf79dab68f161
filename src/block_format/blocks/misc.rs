//! The smaller block variants
//!
//! File hash, battle plan, counters, research and relation orders,
//! password changes and the score summary.  The battle recording
//! blocks are carried opaquely: their format is not fully understood
//! and a conforming reader preserves them without interpreting.
use std::fmt::{Display, Formatter, Result};

use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;

use crate::block_format::strings::compressed_string_parser;
use crate::error::{Error, ErrorKind};

/// Divisor for the serial prefix check: 36^4
const SERIAL_PREFIX_DIVISOR: u32 = 1_679_616;

/// Serial prefixes the anti-piracy check accepts
const VALID_SERIAL_PREFIXES: [u32; 5] = [2, 4, 6, 18, 22];

/// The anti-piracy file hash block (type 9): a registration serial and
/// a fingerprint of the machine that wrote the file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FileHashBlock {
    /// The registration serial number
    pub serial: u32,
    /// Volume label of drive C:
    pub volume_label_c: u16,
    /// Volume timestamp of drive C:
    pub volume_timestamp_c: u16,
    /// Volume label of drive D:
    pub volume_label_d: u16,
    /// Volume timestamp of drive D:
    pub volume_timestamp_d: u16,
    /// Combined drive sizes in 100 MB units
    pub combined_drive_size: u16,
    /// Reserved fingerprint byte
    pub reserved: u8,
    /// Two trailing bytes excluded from the anti-piracy checks
    pub trailer: [u8; 2],
}

impl FileHashBlock {
    /// Whether the serial passes the registration prefix check
    pub fn serial_valid(&self) -> bool {
        VALID_SERIAL_PREFIXES.contains(&(self.serial / SERIAL_PREFIX_DIVISOR))
    }
}

impl Display for FileHashBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "file hash, serial {} ({})",
            self.serial,
            if self.serial_valid() {
                "valid"
            } else {
                "invalid"
            }
        )
    }
}

/// Parse a file hash block
pub fn file_hash_parser(i: &[u8]) -> IResult<&[u8], FileHashBlock> {
    let (i, serial) = le_u32(i)?;
    let (i, volume_label_c) = le_u16(i)?;
    let (i, volume_timestamp_c) = le_u16(i)?;
    let (i, volume_label_d) = le_u16(i)?;
    let (i, volume_timestamp_d) = le_u16(i)?;
    let (i, combined_drive_size) = le_u16(i)?;
    let (i, reserved) = le_u8(i)?;
    let (i, trailer_a) = le_u8(i)?;
    let (i, trailer_b) = le_u8(i)?;

    Ok((
        i,
        FileHashBlock {
            serial,
            volume_label_c,
            volume_timestamp_c,
            volume_label_d,
            volume_timestamp_d,
            combined_drive_size,
            reserved,
            trailer: [trailer_a, trailer_b],
        },
    ))
}

/// Decode a file hash block from a decrypted payload
pub fn decode_file_hash_block(data: &[u8]) -> std::result::Result<FileHashBlock, Error> {
    if data.len() != 17 {
        return Err(Error::new(ErrorKind::new(&format!(
            "file hash block is {} bytes, expected 17",
            data.len()
        ))));
    }

    match file_hash_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new("file hash block is malformed"))),
    }
}

/// A battle plan (block type 30).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BattlePlanBlock {
    /// The plan slot, 0-15
    pub plan_number: u8,
    /// The tactic id
    pub tactic: u8,
    /// Primary target category
    pub primary_target: u8,
    /// Secondary target category
    pub secondary_target: u8,
    /// Which players the plan attacks
    pub attack_who: u8,
    /// Freighters jettison cargo before battle
    pub dump_cargo: bool,
    /// The plan name
    pub name: String,
}

impl Display for BattlePlanBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "battle plan {} \"{}\"", self.plan_number, self.name)
    }
}

/// Parse a battle plan block
pub fn battle_plan_parser(i: &[u8]) -> IResult<&[u8], BattlePlanBlock> {
    let (i, plan_tactic) = le_u8(i)?;
    let (i, targets) = le_u8(i)?;
    let (i, attack_who) = le_u8(i)?;
    let (i, flags) = le_u8(i)?;
    let (i, name) = compressed_string_parser(i)?;

    Ok((
        i,
        BattlePlanBlock {
            plan_number: plan_tactic >> 4,
            tactic: plan_tactic & 0x0F,
            primary_target: targets >> 4,
            secondary_target: targets & 0x0F,
            attack_who,
            dump_cargo: flags & 0x01 != 0,
            name,
        },
    ))
}

/// Decode a battle plan block from a decrypted payload
pub fn decode_battle_plan_block(data: &[u8]) -> std::result::Result<BattlePlanBlock, Error> {
    match battle_plan_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(
            "battle plan is truncated or its name is malformed",
        ))),
    }
}

/// The per-turn counters block (type 32).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CountersBlock {
    /// The counter values
    pub counters: Vec<u16>,
}

impl Display for CountersBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} counters", self.counters.len())
    }
}

/// Parse a counters block
fn counters_parser(i: &[u8]) -> IResult<&[u8], Vec<u16>> {
    let (i, counter_count) = le_u16(i)?;
    count(le_u16, counter_count as usize)(i)
}

/// Decode a counters block from a decrypted payload
pub fn decode_counters_block(data: &[u8]) -> std::result::Result<CountersBlock, Error> {
    match counters_parser(data) {
        Ok((_, counters)) => Ok(CountersBlock { counters }),
        Err(_) => Err(Error::new(ErrorKind::new(
            "counters block is shorter than its count claims",
        ))),
    }
}

/// The research fields a player can put their budget into.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResearchField {
    /// Energy research
    Energy,
    /// Weapons research
    Weapons,
    /// Propulsion research
    Propulsion,
    /// Construction research
    Construction,
    /// Electronics research
    Electronics,
    /// Biotechnology research
    Biotechnology,
}

impl ResearchField {
    /// Map a wire value to a research field
    pub fn from_id(id: u8) -> Option<ResearchField> {
        match id {
            0 => Some(ResearchField::Energy),
            1 => Some(ResearchField::Weapons),
            2 => Some(ResearchField::Propulsion),
            3 => Some(ResearchField::Construction),
            4 => Some(ResearchField::Electronics),
            5 => Some(ResearchField::Biotechnology),
            _ => None,
        }
    }
}

impl Display for ResearchField {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ResearchField::Energy => write!(f, "energy"),
            ResearchField::Weapons => write!(f, "weapons"),
            ResearchField::Propulsion => write!(f, "propulsion"),
            ResearchField::Construction => write!(f, "construction"),
            ResearchField::Electronics => write!(f, "electronics"),
            ResearchField::Biotechnology => write!(f, "biotechnology"),
        }
    }
}

/// A research order (block type 34).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ResearchChangeBlock {
    /// The field the budget goes to
    pub field: ResearchField,
    /// Percent of resources spent on research
    pub budget_percent: u8,
}

impl Display for ResearchChangeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "research {}% into {}", self.budget_percent, self.field)
    }
}

/// Decode a research order from a decrypted payload
pub fn decode_research_change_block(
    data: &[u8],
) -> std::result::Result<ResearchChangeBlock, Error> {
    if data.len() != 2 {
        return Err(Error::new(ErrorKind::new(&format!(
            "research order is {} bytes, expected 2",
            data.len()
        ))));
    }

    let field = match ResearchField::from_id(data[0] >> 4) {
        Some(field) => field,
        None => {
            return Err(Error::new(ErrorKind::new(&format!(
                "unknown research field {}",
                data[0] >> 4
            ))))
        }
    };

    if data[1] > 100 {
        return Err(Error::new(ErrorKind::new(&format!(
            "research budget {}% is over 100",
            data[1]
        ))));
    }

    Ok(ResearchChangeBlock {
        field,
        budget_percent: data[1],
    })
}

/// A password change order (block type 36).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ChangePasswordBlock {
    /// The replacement password hash
    pub new_hash: u32,
}

impl Display for ChangePasswordBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "change password to hash {:#010x}", self.new_hash)
    }
}

/// Decode a password change order from a decrypted payload
pub fn decode_change_password_block(
    data: &[u8],
) -> std::result::Result<ChangePasswordBlock, Error> {
    if data.len() != 4 {
        return Err(Error::new(ErrorKind::new(&format!(
            "password change is {} bytes, expected 4",
            data.len()
        ))));
    }

    Ok(ChangePasswordBlock {
        new_hash: u32::from_le_bytes([data[0], data[1], data[2], data[3]]),
    })
}

/// A diplomatic relations order (block type 38).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayersRelationChangeBlock {
    /// Relation bytes toward each other player: 0 neutral, 1 friend,
    /// 2 enemy
    pub relations: Vec<u8>,
}

impl Display for PlayersRelationChangeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "relations toward {} players", self.relations.len())
    }
}

/// Decode a relations order from a decrypted payload
pub fn decode_players_relation_change_block(
    data: &[u8],
) -> std::result::Result<PlayersRelationChangeBlock, Error> {
    let relation_count = match data.first() {
        Some(count) => *count as usize,
        None => {
            return Err(Error::new(ErrorKind::new("relations order is empty")))
        }
    };

    match data.get(1..1 + relation_count) {
        Some(relations) => Ok(PlayersRelationChangeBlock {
            relations: relations.to_vec(),
        }),
        None => Err(Error::new(ErrorKind::new(
            "relations order is shorter than its count claims",
        ))),
    }
}

/// The end-of-game score summary for one player (block type 44).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlayerScoresBlock {
    /// The player the scores belong to
    pub player: u8,
    /// The player's rank
    pub rank: u8,
    /// The score
    pub score: u32,
    /// Yearly resources
    pub resources: u32,
    /// Planets owned
    pub planets: u16,
    /// Starbases built
    pub starbases: u16,
    /// Unarmed ship count
    pub unarmed_ships: u16,
    /// Escort ship count
    pub escort_ships: u16,
    /// Capital ship count
    pub capital_ships: u16,
    /// Sum of tech levels
    pub tech_levels: u16,
}

impl Display for PlayerScoresBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "player {} rank {} score {}",
            self.player, self.rank, self.score
        )
    }
}

/// Parse a player scores block
pub fn player_scores_parser(i: &[u8]) -> IResult<&[u8], PlayerScoresBlock> {
    let (i, player) = le_u8(i)?;
    let (i, rank) = le_u8(i)?;
    let (i, score) = le_u32(i)?;
    let (i, resources) = le_u32(i)?;
    let (i, planets) = le_u16(i)?;
    let (i, starbases) = le_u16(i)?;
    let (i, unarmed_ships) = le_u16(i)?;
    let (i, escort_ships) = le_u16(i)?;
    let (i, capital_ships) = le_u16(i)?;
    let (i, tech_levels) = le_u16(i)?;

    Ok((
        i,
        PlayerScoresBlock {
            player,
            rank,
            score,
            resources,
            planets,
            starbases,
            unarmed_ships,
            escort_ships,
            capital_ships,
            tech_levels,
        },
    ))
}

/// Decode a player scores block from a decrypted payload
pub fn decode_player_scores_block(
    data: &[u8],
) -> std::result::Result<PlayerScoresBlock, Error> {
    match player_scores_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "player scores block is {} bytes, expected 22",
            data.len()
        )))),
    }
}
