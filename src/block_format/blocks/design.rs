//! Ship and starbase design blocks
//!
//! Designs come in two wire shapes: full designs carry the component
//! slot table, brief designs only the hull mass.  Two historical
//! writer bugs are detectable at decode time and surfaced as flags so
//! downstream tools can repair or reject the affected designs.
use std::fmt::{Display, Formatter, Result};

use nom::multi::count;
use nom::number::complete::{le_u16, le_u32, le_u8};
use nom::IResult;

use crate::block_format::strings::compressed_string_parser;
use crate::error::{Error, ErrorKind};

/// The hull id of the Space Dock
const SPACE_DOCK_HULL: u8 = 33;

/// The item id whose slot triggers the space-dock armor bug
const SPACE_DOCK_BUG_ITEM: u8 = 11;

/// The slot category whose presence triggers the space-dock armor bug
const SPACE_DOCK_BUG_CATEGORY: u16 = 8;

/// Minimum slot count for the space-dock armor bug
const SPACE_DOCK_BUG_COUNT: u8 = 22;

/// Minimum armor value for the space-dock armor bug
const SPACE_DOCK_BUG_ARMOR: u16 = 49518;

/// The category of a colonizer-module slot zeroed out by the writer
const COLONIZER_MODULE_CATEGORY: u16 = 4096;

/// One component slot of a full design.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DesignSlot {
    /// The component category bitmask
    pub category: u16,
    /// The item id within the category
    pub item_id: u8,
    /// How many of the item the slot holds
    pub count: u8,
}

/// The shape-specific part of a design block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DesignDetail {
    /// A full design with its component table
    Full {
        /// Armor strength
        armor: u16,
        /// The turn the design was created
        turn_designed: u16,
        /// Ships ever built from the design
        total_built: u32,
        /// Ships still alive
        total_remaining: u32,
        /// The component slots
        slots: Vec<DesignSlot>,
    },
    /// A brief design: just the mass
    Brief {
        /// Hull mass in kT
        mass: u16,
    },
}

/// A ship or starbase design (block type 26).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DesignBlock {
    /// The design number, 0-15
    pub design_number: u8,
    /// This is a starbase design
    pub starbase: bool,
    /// The design was transferred from another player
    pub transferred: bool,
    /// The hull id
    pub hull_id: u8,
    /// The picture id
    pub picture_id: u8,
    /// Full or brief detail
    pub detail: DesignDetail,
    /// The design name
    pub name: String,
    /// A colonizer-module slot was zeroed by the known writer bug
    pub colonizer_module_bug: bool,
    /// The design triggers the space-dock armor overflow bug
    pub space_dock_bug: bool,
}

impl Display for DesignBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let kind = if self.starbase { "starbase" } else { "ship" };
        write!(
            f,
            "{} design {} \"{}\" hull {}",
            kind, self.design_number, self.name, self.hull_id
        )
    }
}

/// Parse the body of a full design: combat stats, the slot table and
/// the name
fn full_design_body_parser(i: &[u8]) -> IResult<&[u8], (DesignDetail, String)> {
    let (i, armor) = le_u16(i)?;
    let (i, slot_count) = le_u8(i)?;
    let (i, turn_designed) = le_u16(i)?;
    let (i, total_built) = le_u32(i)?;
    let (i, total_remaining) = le_u32(i)?;
    let (i, slots) = count(design_slot_parser, slot_count as usize)(i)?;
    let (i, name) = compressed_string_parser(i)?;

    Ok((
        i,
        (
            DesignDetail::Full {
                armor,
                turn_designed,
                total_built,
                total_remaining,
                slots,
            },
            name,
        ),
    ))
}

/// Parse the body of a brief design: the mass and the name
fn brief_design_body_parser(i: &[u8]) -> IResult<&[u8], (DesignDetail, String)> {
    let (i, mass) = le_u16(i)?;
    let (i, name) = compressed_string_parser(i)?;

    Ok((i, (DesignDetail::Brief { mass }, name)))
}

/// Parse one component slot
fn design_slot_parser(i: &[u8]) -> IResult<&[u8], DesignSlot> {
    let (i, category) = le_u16(i)?;
    let (i, item_id) = le_u8(i)?;
    let (i, slot_count) = le_u8(i)?;

    Ok((
        i,
        DesignSlot {
            category,
            item_id,
            count: slot_count,
        },
    ))
}

/// Decode a design block from a decrypted payload.
///
/// `force_valid_marker` tolerates the known bad writer that clears
/// byte 1 bit 0 in design-change orders; plain design blocks pass
/// false and enforce the bit.
pub fn decode_design_block(
    data: &[u8],
    force_valid_marker: bool,
) -> std::result::Result<DesignBlock, Error> {
    if data.len() < 4 {
        return Err(Error::new(ErrorKind::new(&format!(
            "design block is {} bytes, expected at least 4",
            data.len()
        ))));
    }

    if data[0] & 0x03 != 0x03 {
        return Err(Error::new(ErrorKind::new("bits 0-1 of byte 0 are not 0b11")));
    }
    let full = data[0] & 0x04 != 0;

    let control = if force_valid_marker {
        data[1] | 0x01
    } else {
        data[1]
    };
    if control & 0x01 == 0 {
        return Err(Error::new(ErrorKind::new("bit 0 of byte 1 is not 1")));
    }
    if control & 0x02 != 0 {
        return Err(Error::new(ErrorKind::new("bit 1 of byte 1 is not 0")));
    }
    let design_number = (control >> 2) & 0x0F;
    let starbase = control & 0x40 != 0;
    let transferred = control & 0x80 != 0;

    let hull_id = data[2];
    let picture_id = data[3];

    let body = &data[4..];
    let parsed = if full {
        full_design_body_parser(body)
    } else {
        brief_design_body_parser(body)
    };

    let (detail, name) = match parsed {
        Ok((_, result)) => result,
        Err(_) => {
            return Err(Error::new(ErrorKind::new(
                "design body is truncated or its name is malformed",
            )))
        }
    };

    let (colonizer_module_bug, space_dock_bug) = match &detail {
        DesignDetail::Full { armor, slots, .. } => {
            let colonizer = slots.iter().any(|slot| {
                slot.item_id == 0 && slot.count == 0 && slot.category == COLONIZER_MODULE_CATEGORY
            });
            let space_dock = starbase
                && hull_id == SPACE_DOCK_HULL
                && *armor >= SPACE_DOCK_BUG_ARMOR
                && slots.iter().any(|slot| {
                    slot.item_id == SPACE_DOCK_BUG_ITEM
                        && slot.category == SPACE_DOCK_BUG_CATEGORY
                        && slot.count >= SPACE_DOCK_BUG_COUNT
                });
            (colonizer, space_dock)
        }
        DesignDetail::Brief { .. } => (false, false),
    };

    Ok(DesignBlock {
        design_number,
        starbase,
        transferred,
        hull_id,
        picture_id,
        detail,
        name,
        colonizer_module_bug,
        space_dock_bug,
    })
}

/// A design-change order (block type 27): either a deletion or a
/// replacement design.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DesignChangeBlock {
    /// Delete a design
    Delete {
        /// The design number to delete
        design_number: u8,
        /// Whether it is a starbase design
        is_starbase: bool,
    },
    /// Replace or add a design
    Change(DesignBlock),
}

impl Display for DesignChangeBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            DesignChangeBlock::Delete {
                design_number,
                is_starbase,
            } => {
                let kind = if *is_starbase { "starbase" } else { "ship" };
                write!(f, "delete {} design {}", kind, design_number)
            }
            DesignChangeBlock::Change(design) => write!(f, "change {}", design),
        }
    }
}

/// Decode a design-change order from a decrypted payload
pub fn decode_design_change_block(
    data: &[u8],
) -> std::result::Result<DesignChangeBlock, Error> {
    if data.len() < 2 {
        return Err(Error::new(ErrorKind::new(&format!(
            "design change order is {} bytes, expected at least 2",
            data.len()
        ))));
    }

    if data[0] >> 4 == 0 {
        return Ok(DesignChangeBlock::Delete {
            design_number: data[1] & 0x0F,
            is_starbase: data[1] & 0x10 != 0,
        });
    }

    // The remaining bytes reparse as a design block.  A known bad
    // writer clears the design marker bit, so it is forced here.
    let design = decode_design_block(&data[2..], true)?;
    Ok(DesignChangeBlock::Change(design))
}

#[cfg(test)]
mod tests {
    use super::{
        decode_design_block, decode_design_change_block, DesignChangeBlock, DesignDetail,
    };
    use crate::block_format::strings::encode_compressed_string;
    use pretty_assertions::assert_eq;

    fn push_name(data: &mut Vec<u8>, name: &str) {
        let encoded = encode_compressed_string(name);
        data.push(encoded.len() as u8);
        data.extend(&encoded);
    }

    /// A full design: number 3, ship, hull 5, two slots
    fn full_design_payload() -> Vec<u8> {
        let mut data = vec![
            0b0000_0111, // full design, marker bits
            0b0000_1101, // design 3, bit0 set
            5,           // hull
            12,          // picture
        ];
        data.extend(120_u16.to_le_bytes()); // armor
        data.push(2); // slots
        data.extend(30_u16.to_le_bytes()); // turn designed
        data.extend(17_u32.to_le_bytes()); // built
        data.extend(11_u32.to_le_bytes()); // remaining
        for (category, item, slot_count) in [(2_u16, 4_u8, 1_u8), (16, 9, 2)] {
            data.extend(category.to_le_bytes());
            data.push(item);
            data.push(slot_count);
        }
        push_name(&mut data, "Teamster");
        data
    }

    #[test]
    fn decode_full_design_works() {
        let data = full_design_payload();
        let design = decode_design_block(&data, false).unwrap();

        assert_eq!(design.design_number, 3);
        assert!(!design.starbase);
        assert!(!design.transferred);
        assert_eq!(design.hull_id, 5);
        assert_eq!(design.picture_id, 12);
        assert_eq!(design.name, "Teamster");
        match &design.detail {
            DesignDetail::Full {
                armor,
                turn_designed,
                total_built,
                total_remaining,
                slots,
            } => {
                assert_eq!(*armor, 120);
                assert_eq!(*turn_designed, 30);
                assert_eq!(*total_built, 17);
                assert_eq!(*total_remaining, 11);
                assert_eq!(slots.len(), 2);
                assert_eq!(slots[1].item_id, 9);
            }
            DesignDetail::Brief { .. } => panic!("expected a full design"),
        }
        assert!(!design.colonizer_module_bug);
        assert!(!design.space_dock_bug);
    }

    #[test]
    fn decode_brief_design_works() {
        let mut data = vec![
            0b0000_0011, // brief design
            0b1100_0101, // design 1, starbase, transferred
            33,
            7,
        ];
        data.extend(250_u16.to_le_bytes()); // mass
        push_name(&mut data, "Orbital Fort");

        let design = decode_design_block(&data, false).unwrap();
        assert_eq!(design.design_number, 1);
        assert!(design.starbase);
        assert!(design.transferred);
        assert_eq!(design.detail, DesignDetail::Brief { mass: 250 });
        assert_eq!(design.name, "Orbital Fort");
    }

    #[test]
    fn control_byte_checks_fail() {
        let mut data = full_design_payload();
        data[0] &= 0xFE;
        assert!(decode_design_block(&data, false).is_err());

        let mut data = full_design_payload();
        data[1] &= 0xFE; // clear the marker bit
        assert!(decode_design_block(&data, false).is_err());
        // the tolerant path forces it back on
        assert!(decode_design_block(&data, true).is_ok());

        let mut data = full_design_payload();
        data[1] |= 0x02;
        assert!(decode_design_block(&data, false).is_err());
    }

    #[test]
    fn colonizer_module_bug_is_detected() {
        let mut data = vec![0b0000_0111, 0b0000_1101, 5, 12];
        data.extend(50_u16.to_le_bytes());
        data.push(1);
        data.extend(1_u16.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(4096_u16.to_le_bytes()); // colonizer category
        data.push(0); // item 0
        data.push(0); // count 0
        push_name(&mut data, "Settler");

        let design = decode_design_block(&data, false).unwrap();
        assert!(design.colonizer_module_bug);

        // a populated colonizer slot is fine
        let mut data = vec![0b0000_0111, 0b0000_1101, 5, 12];
        data.extend(50_u16.to_le_bytes());
        data.push(1);
        data.extend(1_u16.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(4096_u16.to_le_bytes());
        data.push(1);
        data.push(1);
        push_name(&mut data, "Settler");
        let design = decode_design_block(&data, false).unwrap();
        assert!(!design.colonizer_module_bug);
    }

    #[test]
    fn space_dock_bug_is_detected() {
        let mut data = vec![
            0b0000_0111,
            0b0100_1101, // starbase, design 3
            33,          // space dock hull
            7,
        ];
        data.extend(49518_u16.to_le_bytes()); // bugged armor
        data.push(1);
        data.extend(5_u16.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(1_u32.to_le_bytes());
        data.extend(8_u16.to_le_bytes()); // category 8
        data.push(11); // item 11
        data.push(22); // count 22
        push_name(&mut data, "Dock");

        let design = decode_design_block(&data, false).unwrap();
        assert!(design.space_dock_bug);

        // below the armor threshold the flag stays off
        let mut data = data.clone();
        data[4..6].copy_from_slice(&49517_u16.to_le_bytes());
        let design = decode_design_block(&data, false).unwrap();
        assert!(!design.space_dock_bug);
    }

    #[test]
    fn decode_design_change_delete_works() {
        let data = [0x00, 0b0001_0010];
        let change = decode_design_change_block(&data).unwrap();
        assert_eq!(
            change,
            DesignChangeBlock::Delete {
                design_number: 2,
                is_starbase: true,
            }
        );
    }

    #[test]
    fn decode_design_change_replacement_works() {
        let mut data = vec![0x10, 0x00];
        let mut design = full_design_payload();
        design[1] &= 0xFE; // the bad writer clears the marker bit
        data.extend(&design);

        match decode_design_change_block(&data).unwrap() {
            DesignChangeBlock::Change(design) => {
                assert_eq!(design.design_number, 3);
                assert_eq!(design.name, "Teamster");
            }
            DesignChangeBlock::Delete { .. } => panic!("expected a change"),
        }
    }
}
