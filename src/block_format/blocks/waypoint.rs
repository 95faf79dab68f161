//! Waypoint blocks and the waypoint order blocks
//!
//! A fleet's course is a list of waypoints.  Turn files carry the
//! waypoints themselves (types 19 and 20) and the orders a player
//! submits to edit them: delete (3), add (4), change-task (5) and
//! repeat-orders (10).
use std::fmt::{Display, Formatter, Result};

use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u8};
use nom::IResult;

use crate::error::{Error, ErrorKind};

/// What a fleet does when it arrives at a waypoint.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WaypointTask {
    /// No task
    None,
    /// Load or unload cargo
    Transport,
    /// Colonize the target planet
    Colonize,
    /// Strip minerals from an uninhabited planet
    RemoteMining,
    /// Merge with the target fleet
    MergeFleet,
    /// Scrap the fleet
    ScrapFleet,
    /// Lay a minefield
    LayMines,
    /// Patrol the area
    Patrol,
    /// Follow the target planet's route setting
    Route,
    /// Transfer the fleet to another player
    Transfer,
    /// A task id this reader does not know
    Unknown(u8),
}

impl From<u8> for WaypointTask {
    fn from(id: u8) -> Self {
        match id {
            0 => WaypointTask::None,
            1 => WaypointTask::Transport,
            2 => WaypointTask::Colonize,
            3 => WaypointTask::RemoteMining,
            4 => WaypointTask::MergeFleet,
            5 => WaypointTask::ScrapFleet,
            6 => WaypointTask::LayMines,
            7 => WaypointTask::Patrol,
            8 => WaypointTask::Route,
            9 => WaypointTask::Transfer,
            id => WaypointTask::Unknown(id),
        }
    }
}

impl Display for WaypointTask {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            WaypointTask::None => write!(f, "none"),
            WaypointTask::Transport => write!(f, "transport"),
            WaypointTask::Colonize => write!(f, "colonize"),
            WaypointTask::RemoteMining => write!(f, "remote mining"),
            WaypointTask::MergeFleet => write!(f, "merge with fleet"),
            WaypointTask::ScrapFleet => write!(f, "scrap fleet"),
            WaypointTask::LayMines => write!(f, "lay mines"),
            WaypointTask::Patrol => write!(f, "patrol"),
            WaypointTask::Route => write!(f, "route"),
            WaypointTask::Transfer => write!(f, "transfer"),
            WaypointTask::Unknown(id) => write!(f, "unknown task {}", id),
        }
    }
}

/// Bit flags describing what kind of object a waypoint targets
pub mod target_type {
    /// The target is a planet
    pub const PLANET: u8 = 1;
    /// The target is a fleet
    pub const FLEET: u8 = 2;
    /// The target is a point in deep space
    pub const DEEP_SPACE: u8 = 4;
    /// The target is a wormhole
    pub const WORMHOLE: u8 = 8;
}

/// A waypoint on a fleet's course (block types 19 and 20).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WaypointBlock {
    /// X coordinate in light years
    pub x: u16,
    /// Y coordinate in light years
    pub y: u16,
    /// Id of the object at this position, if any
    pub position_object: u16,
    /// Warp speed to travel at, 0-15
    pub warp: u8,
    /// The task to perform on arrival
    pub task: WaypointTask,
    /// Target-type bitmap, see [target_type]
    pub position_object_type: u8,
    /// Task parameters, carried verbatim
    pub task_data: Vec<u8>,
}

impl Display for WaypointBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "waypoint ({}, {}) warp {} task {}",
            self.x, self.y, self.warp, self.task
        )
    }
}

/// Parse a waypoint block: an 8-byte header plus a variable task tail
pub fn waypoint_block_parser(i: &[u8]) -> IResult<&[u8], WaypointBlock> {
    let (i, x) = le_u16(i)?;
    let (i, y) = le_u16(i)?;
    let (i, position_object) = le_u16(i)?;
    let (i, warp_task) = le_u8(i)?;
    let (i, position_object_type) = le_u8(i)?;

    Ok((
        &[],
        WaypointBlock {
            x,
            y,
            position_object,
            warp: warp_task >> 4,
            task: WaypointTask::from(warp_task & 0x0F),
            position_object_type,
            task_data: i.to_vec(),
        },
    ))
}

/// Decode a waypoint block from a decrypted payload
pub fn decode_waypoint_block(data: &[u8]) -> std::result::Result<WaypointBlock, Error> {
    match waypoint_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "waypoint block is {} bytes, expected at least 8",
            data.len()
        )))),
    }
}

/// An order deleting one waypoint from a fleet's course (type 3).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaypointDeleteBlock {
    /// The fleet whose course is edited, 9 bits
    pub fleet_number: u16,
    /// The index of the waypoint to delete
    pub waypoint_number: u8,
    /// Unidentified trailing byte
    pub unknown: u8,
}

impl Display for WaypointDeleteBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "delete waypoint {} of fleet {}",
            self.waypoint_number, self.fleet_number
        )
    }
}

/// Parse a waypoint-delete order
pub fn waypoint_delete_parser(i: &[u8]) -> IResult<&[u8], WaypointDeleteBlock> {
    let (i, fleet_word) = le_u16(i)?;
    let (i, waypoint_number) = le_u8(i)?;
    let (i, unknown) = le_u8(i)?;

    Ok((
        i,
        WaypointDeleteBlock {
            fleet_number: fleet_word & 0x01FF,
            waypoint_number,
            unknown,
        },
    ))
}

/// Decode a waypoint-delete order from a decrypted payload
pub fn decode_waypoint_delete_block(
    data: &[u8],
) -> std::result::Result<WaypointDeleteBlock, Error> {
    match waypoint_delete_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "waypoint delete order is {} bytes, expected 4",
            data.len()
        )))),
    }
}

/// An order adding a waypoint or changing a waypoint's task (types 4
/// and 5, which share their wire shape).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaypointChangeTaskBlock {
    /// The fleet whose course is edited, 9 bits
    pub fleet_number: u16,
    /// The index of the edited waypoint
    pub waypoint_number: u8,
    /// Unidentified byte after the waypoint index
    pub unknown: u8,
    /// X coordinate of the waypoint
    pub x: u16,
    /// Y coordinate of the waypoint
    pub y: u16,
    /// Id of the targeted object, 9 bits
    pub target: u16,
    /// Warp speed, 0-15
    pub warp: u8,
    /// The task to perform on arrival
    pub task: WaypointTask,
    /// Unidentified high nibble of the target-type byte
    pub unknown_nibble: u8,
    /// Target-type bitmap, see [target_type]
    pub target_type: u8,
    /// Sub-task selector, present for tasks that need one
    pub sub_task: Option<u8>,
}

impl Display for WaypointChangeTaskBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "waypoint {} of fleet {} -> ({}, {}) warp {} task {}",
            self.waypoint_number, self.fleet_number, self.x, self.y, self.warp, self.task
        )
    }
}

/// Parse a waypoint-add or waypoint-change-task order
pub fn waypoint_change_task_parser(i: &[u8]) -> IResult<&[u8], WaypointChangeTaskBlock> {
    let (i, fleet_word) = le_u16(i)?;
    let (i, waypoint_number) = le_u8(i)?;
    let (i, unknown) = le_u8(i)?;
    let (i, x) = le_u16(i)?;
    let (i, y) = le_u16(i)?;
    let (i, target_word) = le_u16(i)?;
    let (i, warp_task) = le_u8(i)?;
    let (i, type_byte) = le_u8(i)?;

    let (i, sub_task) = if i.is_empty() {
        (i, None)
    } else {
        let (i, byte) = take(1_usize)(i)?;
        (i, Some(byte[0]))
    };

    Ok((
        i,
        WaypointChangeTaskBlock {
            fleet_number: fleet_word & 0x01FF,
            waypoint_number,
            unknown,
            x,
            y,
            target: target_word & 0x01FF,
            warp: warp_task >> 4,
            task: WaypointTask::from(warp_task & 0x0F),
            unknown_nibble: type_byte >> 4,
            target_type: type_byte & 0x0F,
            sub_task,
        },
    ))
}

/// Decode a waypoint-add or change-task order from a decrypted payload
pub fn decode_waypoint_change_task_block(
    data: &[u8],
) -> std::result::Result<WaypointChangeTaskBlock, Error> {
    match waypoint_change_task_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "waypoint task order is {} bytes, expected 12 or 13",
            data.len()
        )))),
    }
}

/// An order toggling repeat-orders on a fleet (type 10).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaypointRepeatOrdersBlock {
    /// The fleet the toggle applies to
    pub fleet_number: u16,
    /// Whether the fleet repeats its waypoint orders
    pub repeat: bool,
}

impl Display for WaypointRepeatOrdersBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "fleet {} repeat orders: {}",
            self.fleet_number, self.repeat
        )
    }
}

/// Parse a repeat-orders toggle
pub fn waypoint_repeat_orders_parser(i: &[u8]) -> IResult<&[u8], WaypointRepeatOrdersBlock> {
    let (i, fleet_number) = le_u16(i)?;
    let (i, repeat) = le_u8(i)?;
    let (i, _pad) = le_u8(i)?;

    Ok((
        i,
        WaypointRepeatOrdersBlock {
            fleet_number,
            repeat: repeat != 0,
        },
    ))
}

/// Decode a repeat-orders toggle from a decrypted payload
pub fn decode_waypoint_repeat_orders_block(
    data: &[u8],
) -> std::result::Result<WaypointRepeatOrdersBlock, Error> {
    match waypoint_repeat_orders_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "repeat orders block is {} bytes, expected 4",
            data.len()
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_waypoint_block, decode_waypoint_change_task_block, decode_waypoint_delete_block,
        decode_waypoint_repeat_orders_block, target_type, WaypointTask,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_waypoint_block_works() {
        // (1004, 1132), object 42, warp 9 colonize, planet target
        let data = [0xEC, 0x03, 0x6C, 0x04, 0x2A, 0x00, 0x92, 0x01];

        let waypoint = decode_waypoint_block(&data).unwrap();
        assert_eq!(waypoint.x, 1004);
        assert_eq!(waypoint.y, 1132);
        assert_eq!(waypoint.position_object, 42);
        assert_eq!(waypoint.warp, 9);
        assert_eq!(waypoint.task, WaypointTask::Colonize);
        assert_eq!(waypoint.position_object_type, target_type::PLANET);
        assert!(waypoint.task_data.is_empty());
    }

    #[test]
    fn waypoint_task_tail_is_preserved() {
        let data = [
            0xEC, 0x03, 0x6C, 0x04, 0x2A, 0x00, 0x71, 0x01, 0xDE, 0xAD, 0xBE,
        ];
        let waypoint = decode_waypoint_block(&data).unwrap();
        assert_eq!(waypoint.task, WaypointTask::Transport);
        assert_eq!(waypoint.task_data, vec![0xDE, 0xAD, 0xBE]);
    }

    #[test]
    fn short_waypoint_block_fails() {
        assert!(decode_waypoint_block(&[0x01, 0x02, 0x03]).is_err());
    }

    #[test]
    fn decode_waypoint_delete_works() {
        // fleet 300 (0x12C), waypoint 2
        let data = [0x2C, 0x01, 0x02, 0x00];
        let order = decode_waypoint_delete_block(&data).unwrap();
        assert_eq!(order.fleet_number, 300);
        assert_eq!(order.waypoint_number, 2);
    }

    #[test]
    fn decode_waypoint_change_task_works() {
        let data = [
            0x2C, 0x01, // fleet 300
            0x01, // waypoint 1
            0x00, // unknown
            0xE8, 0x03, // x 1000
            0xD0, 0x07, // y 2000
            0x15, 0x00, // target 21
            0x74, // warp 7, merge-fleet
            0x02, // fleet target
        ];
        let order = decode_waypoint_change_task_block(&data).unwrap();
        assert_eq!(order.fleet_number, 300);
        assert_eq!(order.waypoint_number, 1);
        assert_eq!(order.x, 1000);
        assert_eq!(order.y, 2000);
        assert_eq!(order.target, 21);
        assert_eq!(order.warp, 7);
        assert_eq!(order.task, WaypointTask::MergeFleet);
        assert_eq!(order.target_type, target_type::FLEET);
        assert_eq!(order.sub_task, None);
    }

    #[test]
    fn change_task_sub_task_byte_is_read() {
        let data = [
            0x2C, 0x01, 0x01, 0x00, 0xE8, 0x03, 0xD0, 0x07, 0x15, 0x00, 0x61, 0x01, 0x03,
        ];
        let order = decode_waypoint_change_task_block(&data).unwrap();
        assert_eq!(order.task, WaypointTask::Transport);
        assert_eq!(order.sub_task, Some(3));
    }

    #[test]
    fn decode_repeat_orders_works() {
        let data = [0x05, 0x00, 0x01, 0x00];
        let order = decode_waypoint_repeat_orders_block(&data).unwrap();
        assert_eq!(order.fleet_number, 5);
        assert!(order.repeat);
    }
}
