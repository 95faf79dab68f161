//! Typed views of the block variants
//!
//! Every block a turn file can carry gets a decoder here, dispatched
//! on the 6-bit type id from the framing word.  Variants whose format
//! is not fully understood are preserved opaquely rather than guessed
//! at.
use std::fmt::{Display, Formatter, Result};

/// The player block
pub mod player;

/// Planet blocks
pub mod planet;

/// Fleet blocks
pub mod fleet;

/// Waypoint blocks and waypoint orders
pub mod waypoint;

/// Ship and starbase designs
pub mod design;

/// Production queues
pub mod queue;

/// Messages and events
pub mod message;

/// The smaller variants
pub mod misc;

use crate::block_format::header::FileHeaderBlock;
use crate::error::{Error, ErrorKind};

use design::{DesignBlock, DesignChangeBlock};
use fleet::{FleetBlock, FleetNameBlock, FleetsMergeBlock, PartialFleetBlock};
use message::{EventsBlock, MessageBlock, MessagesFilterBlock};
use misc::{
    BattlePlanBlock, ChangePasswordBlock, CountersBlock, FileHashBlock, PlayerScoresBlock,
    PlayersRelationChangeBlock, ResearchChangeBlock,
};
use planet::{PartialPlanetBlock, PlanetBlock, PlanetChangeBlock, PlanetsBlock};
use player::PlayerBlock;
use queue::ProductionQueueBlock;
use waypoint::{
    WaypointBlock, WaypointChangeTaskBlock, WaypointDeleteBlock, WaypointRepeatOrdersBlock,
};

/// A decoded block variant.
#[derive(Clone, Debug, PartialEq)]
pub enum BlockKind {
    /// The file footer (type 0), payload preserved opaquely
    FileFooter(Vec<u8>),
    /// A waypoint-delete order (type 3)
    WaypointDelete(WaypointDeleteBlock),
    /// A waypoint-add order (type 4)
    WaypointAdd(WaypointChangeTaskBlock),
    /// A waypoint-change-task order (type 5)
    WaypointChangeTask(WaypointChangeTaskBlock),
    /// A player block (type 6)
    Player(PlayerBlock),
    /// The universe map (type 7)
    Planets(PlanetsBlock),
    /// The file header (type 8)
    FileHeader(FileHeaderBlock),
    /// The anti-piracy file hash (type 9)
    FileHash(FileHashBlock),
    /// A repeat-orders toggle (type 10)
    WaypointRepeatOrders(WaypointRepeatOrdersBlock),
    /// The game event log (type 12)
    Events(EventsBlock),
    /// A planet in full detail (type 13)
    Planet(PlanetBlock),
    /// Old scanner data for a planet (type 14)
    PartialPlanet(PartialPlanetBlock),
    /// One of the owner's fleets (type 16)
    Fleet(FleetBlock),
    /// Another player's fleet (type 17)
    PartialFleet(PartialFleetBlock),
    /// A waypoint with task data (type 19)
    WaypointTask(WaypointBlock),
    /// A waypoint (type 20)
    Waypoint(WaypointBlock),
    /// A fleet rename (type 21)
    FleetName(FleetNameBlock),
    /// A ship or starbase design (type 26)
    Design(DesignBlock),
    /// A design change order (type 27)
    DesignChange(DesignChangeBlock),
    /// A production queue (type 28)
    ProductionQueue(ProductionQueueBlock),
    /// A production queue replacement order (type 29)
    ProductionQueueChange(ProductionQueueBlock),
    /// A battle plan (type 30)
    BattlePlan(BattlePlanBlock),
    /// A battle recording (type 31), preserved opaquely
    Battle(Vec<u8>),
    /// The per-turn counters (type 32)
    Counters(CountersBlock),
    /// The message filter (type 33)
    MessagesFilter(MessagesFilterBlock),
    /// A research order (type 34)
    ResearchChange(ResearchChangeBlock),
    /// A planet route order (type 35)
    PlanetChange(PlanetChangeBlock),
    /// A password change order (type 36)
    ChangePassword(ChangePasswordBlock),
    /// A fleet merge order (type 37)
    FleetsMerge(FleetsMergeBlock),
    /// A relations order (type 38)
    PlayersRelationChange(PlayersRelationChangeBlock),
    /// A battle recording continuation (type 39), preserved opaquely
    BattleContinuation(Vec<u8>),
    /// An in-game message (type 40)
    Message(MessageBlock),
    /// The score summary (type 44)
    PlayerScores(PlayerScoresBlock),
    /// The save-and-submit marker (type 45)
    SaveAndSubmit,
    /// Any type id this reader does not interpret
    Unknown,
}

/// A block of a turn file: the framed substructure plus the decoded
/// variant.  Blocks are immutable once decoded.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// The block type id from the framing word
    pub block_type: u8,
    /// The payload size from the framing word
    pub size: u16,
    /// The payload as stored on disk
    pub raw: Vec<u8>,
    /// The payload after keystream XOR (identical to raw for the file
    /// header, which is stored in the clear)
    pub decrypted: Vec<u8>,
    /// The decoded variant
    pub kind: BlockKind,
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.kind {
            BlockKind::FileFooter(_) => write!(f, "file footer, {} bytes", self.size),
            BlockKind::WaypointDelete(block) => write!(f, "{}", block),
            BlockKind::WaypointAdd(block) => write!(f, "add {}", block),
            BlockKind::WaypointChangeTask(block) => write!(f, "{}", block),
            BlockKind::Player(block) => write!(f, "{}", block),
            BlockKind::Planets(block) => write!(f, "{}", block),
            BlockKind::FileHeader(block) => write!(f, "{}", block),
            BlockKind::FileHash(block) => write!(f, "{}", block),
            BlockKind::WaypointRepeatOrders(block) => write!(f, "{}", block),
            BlockKind::Events(block) => write!(f, "{}", block),
            BlockKind::Planet(block) => write!(f, "{}", block),
            BlockKind::PartialPlanet(block) => write!(f, "{}", block),
            BlockKind::Fleet(block) => write!(f, "{}", block),
            BlockKind::PartialFleet(block) => write!(f, "{}", block),
            BlockKind::WaypointTask(block) => write!(f, "task {}", block),
            BlockKind::Waypoint(block) => write!(f, "{}", block),
            BlockKind::FleetName(block) => write!(f, "{}", block),
            BlockKind::Design(block) => write!(f, "{}", block),
            BlockKind::DesignChange(block) => write!(f, "{}", block),
            BlockKind::ProductionQueue(block) => write!(f, "{}", block),
            BlockKind::ProductionQueueChange(block) => write!(f, "replace {}", block),
            BlockKind::BattlePlan(block) => write!(f, "{}", block),
            BlockKind::Battle(data) => write!(f, "battle recording, {} bytes", data.len()),
            BlockKind::Counters(block) => write!(f, "{}", block),
            BlockKind::MessagesFilter(block) => write!(f, "{}", block),
            BlockKind::ResearchChange(block) => write!(f, "{}", block),
            BlockKind::PlanetChange(block) => write!(f, "{}", block),
            BlockKind::ChangePassword(block) => write!(f, "{}", block),
            BlockKind::FleetsMerge(block) => write!(f, "{}", block),
            BlockKind::PlayersRelationChange(block) => write!(f, "{}", block),
            BlockKind::BattleContinuation(data) => {
                write!(f, "battle recording continuation, {} bytes", data.len())
            }
            BlockKind::Message(block) => write!(f, "{}", block),
            BlockKind::PlayerScores(block) => write!(f, "{}", block),
            BlockKind::SaveAndSubmit => write!(f, "save and submit"),
            BlockKind::Unknown => {
                write!(f, "unknown block type {}, {} bytes", self.block_type, self.size)
            }
        }
    }
}

/// Decode a decrypted payload into its typed variant.
///
/// # Arguments
///
/// * `block_type` - The type id from the framing word
/// * `data` - The decrypted payload
///
/// # Returns
///
/// The decoded variant, or the reason the structural checks failed.
pub fn decode_block_kind(block_type: u8, data: &[u8]) -> std::result::Result<BlockKind, Error> {
    match block_type {
        0 => Ok(BlockKind::FileFooter(data.to_vec())),
        3 => Ok(BlockKind::WaypointDelete(
            waypoint::decode_waypoint_delete_block(data)?,
        )),
        4 => Ok(BlockKind::WaypointAdd(
            waypoint::decode_waypoint_change_task_block(data)?,
        )),
        5 => Ok(BlockKind::WaypointChangeTask(
            waypoint::decode_waypoint_change_task_block(data)?,
        )),
        6 => Ok(BlockKind::Player(player::decode_player_block(data)?)),
        7 => Ok(BlockKind::Planets(planet::decode_planets_block(data)?)),
        8 => match crate::block_format::header::file_header_parser(data) {
            Ok((_, header)) => Ok(BlockKind::FileHeader(header)),
            Err(_) => Err(Error::new(ErrorKind::new(
                "file header payload is malformed",
            ))),
        },
        9 => Ok(BlockKind::FileHash(misc::decode_file_hash_block(data)?)),
        10 => Ok(BlockKind::WaypointRepeatOrders(
            waypoint::decode_waypoint_repeat_orders_block(data)?,
        )),
        12 => Ok(BlockKind::Events(message::decode_events_block(data)?)),
        13 => Ok(BlockKind::Planet(planet::decode_planet_block(data)?)),
        14 => Ok(BlockKind::PartialPlanet(
            planet::decode_partial_planet_block(data)?,
        )),
        16 => Ok(BlockKind::Fleet(fleet::decode_fleet_block(data)?)),
        17 => Ok(BlockKind::PartialFleet(
            fleet::decode_partial_fleet_block(data)?,
        )),
        19 => Ok(BlockKind::WaypointTask(
            waypoint::decode_waypoint_block(data)?,
        )),
        20 => Ok(BlockKind::Waypoint(waypoint::decode_waypoint_block(data)?)),
        21 => Ok(BlockKind::FleetName(fleet::decode_fleet_name_block(data)?)),
        26 => Ok(BlockKind::Design(design::decode_design_block(data, false)?)),
        27 => Ok(BlockKind::DesignChange(
            design::decode_design_change_block(data)?,
        )),
        28 => Ok(BlockKind::ProductionQueue(
            queue::decode_production_queue_block(data)?,
        )),
        29 => Ok(BlockKind::ProductionQueueChange(
            queue::decode_production_queue_block(data)?,
        )),
        30 => Ok(BlockKind::BattlePlan(misc::decode_battle_plan_block(data)?)),
        31 => Ok(BlockKind::Battle(data.to_vec())),
        32 => Ok(BlockKind::Counters(misc::decode_counters_block(data)?)),
        33 => Ok(BlockKind::MessagesFilter(
            message::decode_messages_filter_block(data)?,
        )),
        34 => Ok(BlockKind::ResearchChange(
            misc::decode_research_change_block(data)?,
        )),
        35 => Ok(BlockKind::PlanetChange(
            planet::decode_planet_change_block(data)?,
        )),
        36 => Ok(BlockKind::ChangePassword(
            misc::decode_change_password_block(data)?,
        )),
        37 => Ok(BlockKind::FleetsMerge(fleet::decode_fleets_merge_block(
            data,
        )?)),
        38 => Ok(BlockKind::PlayersRelationChange(
            misc::decode_players_relation_change_block(data)?,
        )),
        39 => Ok(BlockKind::BattleContinuation(data.to_vec())),
        40 => Ok(BlockKind::Message(message::decode_message_block(data)?)),
        44 => Ok(BlockKind::PlayerScores(misc::decode_player_scores_block(
            data,
        )?)),
        45 => {
            if data.is_empty() {
                Ok(BlockKind::SaveAndSubmit)
            } else {
                Err(Error::new(ErrorKind::new(
                    "save-and-submit marker carries a payload",
                )))
            }
        }
        _ => Ok(BlockKind::Unknown),
    }
}
