//! Message and event blocks
//!
//! In-game messages (type 40) carry their text in the compressed
//! string encoding, with one twist: the 16-bit string header packs a
//! byte size and an indicator, and when the indicator is all-ones the
//! body is plain ASCII with an inverted length.  Event records (type
//! 12) and the message filter (type 33) are simple fixed layouts.
use std::fmt::{Display, Formatter, Result};

use nom::bytes::complete::take;
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32};
use nom::IResult;

use crate::block_format::strings::decode_compressed_string;
use crate::error::{Error, ErrorKind};

/// Indicator value marking a plain ASCII message body
const ASCII_INDICATOR: u16 = 0x3F;

/// Message kind word for a reply
const KIND_REPLY: u16 = 3;

/// An in-game message (block type 40).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageBlock {
    /// First unidentified header word
    pub unknown1: u16,
    /// Second unidentified header word
    pub unknown2: u16,
    /// The sending player
    pub sender: u16,
    /// The receiving player
    pub receiver: u16,
    /// The kind word: 3 reply, 4 normal
    pub kind: u16,
    /// The message text
    pub text: String,
}

impl MessageBlock {
    /// Whether this message is a reply
    pub fn is_reply(&self) -> bool {
        self.kind == KIND_REPLY
    }
}

impl Display for MessageBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "message from player {} to player {}: \"{}\"",
            self.sender, self.receiver, self.text
        )
    }
}

/// Parse a message block
pub fn message_block_parser(i: &[u8]) -> IResult<&[u8], MessageBlock> {
    let (i, unknown1) = le_u16(i)?;
    let (i, unknown2) = le_u16(i)?;
    let (i, sender) = le_u16(i)?;
    let (i, receiver) = le_u16(i)?;
    let (i, kind) = le_u16(i)?;
    let (i, string_header) = le_u16(i)?;

    let byte_size = string_header >> 6;
    let indicator = string_header & 0x3F;

    let (i, text) = if indicator == ASCII_INDICATOR {
        let ascii_size = (!byte_size) & 0x3FF;
        let (i, raw) = take(ascii_size as usize)(i)?;
        (i, String::from_utf8_lossy(raw).into_owned())
    } else {
        let (i, raw) = take(byte_size as usize)(i)?;
        match decode_compressed_string(raw) {
            Ok(text) => (i, text),
            Err(_) => {
                return Err(nom::Err::Failure(nom::error::Error::new(
                    raw,
                    nom::error::ErrorKind::Verify,
                )))
            }
        }
    };

    Ok((
        i,
        MessageBlock {
            unknown1,
            unknown2,
            sender,
            receiver,
            kind,
            text,
        },
    ))
}

/// Decode a message block from a decrypted payload
pub fn decode_message_block(data: &[u8]) -> std::result::Result<MessageBlock, Error> {
    match message_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(
            "message block is truncated or its text is malformed",
        ))),
    }
}

/// One game event record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EventRecord {
    /// The turn the event happened
    pub turn: u16,
    /// The event kind
    pub kind: u16,
    /// The object the event concerns
    pub target: u16,
    /// An event-specific argument
    pub argument: u16,
}

/// The game event log (block type 12).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EventsBlock {
    /// The recorded events
    pub events: Vec<EventRecord>,
}

impl Display for EventsBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{} game events", self.events.len())
    }
}

/// Parse one event record
fn event_record_parser(i: &[u8]) -> IResult<&[u8], EventRecord> {
    let (i, turn) = le_u16(i)?;
    let (i, kind) = le_u16(i)?;
    let (i, target) = le_u16(i)?;
    let (i, argument) = le_u16(i)?;

    Ok((
        i,
        EventRecord {
            turn,
            kind,
            target,
            argument,
        },
    ))
}

/// Parse an events block
pub fn events_block_parser(i: &[u8]) -> IResult<&[u8], EventsBlock> {
    let (i, event_count) = le_u16(i)?;
    let (i, events) = count(event_record_parser, event_count as usize)(i)?;

    Ok((i, EventsBlock { events }))
}

/// Decode an events block from a decrypted payload
pub fn decode_events_block(data: &[u8]) -> std::result::Result<EventsBlock, Error> {
    match events_block_parser(data) {
        Ok((_, block)) => Ok(block),
        Err(_) => Err(Error::new(ErrorKind::new(
            "events block is shorter than its event count claims",
        ))),
    }
}

/// The player's message filter (block type 33): a bitmask of muted
/// event categories.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessagesFilterBlock {
    /// Muted category bits
    pub muted: u32,
}

impl Display for MessagesFilterBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "message filter {:#010x}", self.muted)
    }
}

/// Decode a messages-filter block from a decrypted payload
pub fn decode_messages_filter_block(
    data: &[u8],
) -> std::result::Result<MessagesFilterBlock, Error> {
    match le_u32::<&[u8], nom::error::Error<&[u8]>>(data) {
        Ok((_, muted)) => Ok(MessagesFilterBlock { muted }),
        Err(_) => Err(Error::new(ErrorKind::new(&format!(
            "messages filter is {} bytes, expected 4",
            data.len()
        )))),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        decode_events_block, decode_message_block, decode_messages_filter_block,
    };
    use crate::block_format::strings::encode_compressed_string;
    use pretty_assertions::assert_eq;

    fn message_header(sender: u16, receiver: u16, kind: u16) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend(0_u16.to_le_bytes());
        data.extend(0_u16.to_le_bytes());
        data.extend(sender.to_le_bytes());
        data.extend(receiver.to_le_bytes());
        data.extend(kind.to_le_bytes());
        data
    }

    #[test]
    fn decode_compressed_message_works() {
        let mut data = message_header(1, 2, 4);
        let body = encode_compressed_string("we come in peace");
        let string_header = ((body.len() as u16) << 6) | 0x01;
        data.extend(string_header.to_le_bytes());
        data.extend(&body);

        let message = decode_message_block(&data).unwrap();
        assert_eq!(message.sender, 1);
        assert_eq!(message.receiver, 2);
        assert!(!message.is_reply());
        assert_eq!(message.text, "we come in peace");
    }

    #[test]
    fn decode_ascii_message_works() {
        let mut data = message_header(3, 0, 3);
        let body = b"ALL YOUR BASE";
        let byte_size = (!(body.len() as u16)) & 0x3FF;
        let string_header = (byte_size << 6) | 0x3F;
        data.extend(string_header.to_le_bytes());
        data.extend(body);

        let message = decode_message_block(&data).unwrap();
        assert!(message.is_reply());
        assert_eq!(message.text, "ALL YOUR BASE");
    }

    #[test]
    fn truncated_message_fails() {
        let mut data = message_header(1, 2, 4);
        data.extend(((8_u16) << 6 | 0x01).to_le_bytes());
        data.extend([0x04, 0x11]); // advertises more than present
        assert!(decode_message_block(&data).is_err());
    }

    #[test]
    fn decode_events_block_works() {
        let mut data = Vec::new();
        data.extend(2_u16.to_le_bytes());
        for record in [[8_u16, 1, 42, 0], [8, 3, 7, 150]] {
            for word in record {
                data.extend(word.to_le_bytes());
            }
        }

        let events = decode_events_block(&data).unwrap();
        assert_eq!(events.events.len(), 2);
        assert_eq!(events.events[0].target, 42);
        assert_eq!(events.events[1].argument, 150);
    }

    #[test]
    fn decode_messages_filter_works() {
        let data = 0x0000_0105_u32.to_le_bytes();
        let filter = decode_messages_filter_block(&data).unwrap();
        assert_eq!(filter.muted, 0x105);
    }
}
