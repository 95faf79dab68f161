//! Production queue blocks
//!
//! A planet's production queue is a list of items, each packing the
//! item id and category into one word with a count alongside.  Type 28
//! is the queue as the host last saw it; type 29 is a player order
//! replacing it wholesale.
use std::fmt::{Display, Formatter, Result};

use nom::multi::many0;
use nom::number::complete::le_u16;
use nom::IResult;

use crate::error::{Error, ErrorKind};

/// One production queue entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ProductionQueueItem {
    /// The item id, 10 bits
    pub item_id: u16,
    /// The item category, 6 bits
    pub category: u8,
    /// How many to build
    pub count: u16,
}

/// Parse one queue item
fn production_queue_item_parser(i: &[u8]) -> IResult<&[u8], ProductionQueueItem> {
    let (i, word) = le_u16(i)?;
    let (i, item_count) = le_u16(i)?;

    Ok((
        i,
        ProductionQueueItem {
            item_id: word >> 6,
            category: (word & 0x3F) as u8,
            count: item_count,
        },
    ))
}

/// A planet's production queue (block type 28).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProductionQueueBlock {
    /// The planet the queue belongs to
    pub planet_number: u16,
    /// The queued items, in build order
    pub items: Vec<ProductionQueueItem>,
}

impl Display for ProductionQueueBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "planet {} queue, {} items",
            self.planet_number,
            self.items.len()
        )
    }
}

/// Parse a production queue block
pub fn production_queue_parser(i: &[u8]) -> IResult<&[u8], ProductionQueueBlock> {
    let (i, planet_number) = le_u16(i)?;
    let (i, items) = many0(production_queue_item_parser)(i)?;

    Ok((
        i,
        ProductionQueueBlock {
            planet_number,
            items,
        },
    ))
}

/// Decode a production queue block from a decrypted payload.  The item
/// list must tile the payload exactly.
pub fn decode_production_queue_block(
    data: &[u8],
) -> std::result::Result<ProductionQueueBlock, Error> {
    if data.len() < 2 || (data.len() - 2) % 4 != 0 {
        return Err(Error::new(ErrorKind::new(&format!(
            "production queue is {} bytes, expected 2 + a multiple of 4",
            data.len()
        ))));
    }

    match production_queue_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new("production queue is malformed"))),
    }
}

#[cfg(test)]
mod tests {
    use super::decode_production_queue_block;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_production_queue_works() {
        let mut data = Vec::new();
        data.extend(42_u16.to_le_bytes());
        // item 9 category 2, build 5
        data.extend(((9_u16 << 6) | 2).to_le_bytes());
        data.extend(5_u16.to_le_bytes());
        // item 1023 category 63, build 1
        data.extend(0xFFFF_u16.to_le_bytes());
        data.extend(1_u16.to_le_bytes());

        let queue = decode_production_queue_block(&data).unwrap();
        assert_eq!(queue.planet_number, 42);
        assert_eq!(queue.items.len(), 2);
        assert_eq!(queue.items[0].item_id, 9);
        assert_eq!(queue.items[0].category, 2);
        assert_eq!(queue.items[0].count, 5);
        assert_eq!(queue.items[1].item_id, 1023);
        assert_eq!(queue.items[1].category, 63);
    }

    #[test]
    fn empty_queue_decodes() {
        let data = 7_u16.to_le_bytes();
        let queue = decode_production_queue_block(&data).unwrap();
        assert_eq!(queue.planet_number, 7);
        assert!(queue.items.is_empty());
    }

    #[test]
    fn ragged_queue_fails() {
        let data = [0x07, 0x00, 0x01, 0x02, 0x03];
        assert!(decode_production_queue_block(&data).is_err());
    }
}
