//! Error results that can occur working with Stars! turn files
#![warn(missing_docs)]
#![warn(unsafe_code)]
use std::{
    fmt::{Debug, Display, Formatter, Result},
    io,
};

/// An error that can occur when processing a turn file, a block or a
/// password hash.
#[derive(PartialEq)]
pub struct Error {
    kind: ErrorKind,
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.kind)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a new Error with a given ErrorKind variant
    pub fn new(kind: ErrorKind) -> Error {
        Error { kind }
    }

    /// The kind of error that occurred
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(e: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        Error::new(ErrorKind::new(&e.to_string()))
    }
}

impl<'a> nom::error::ParseError<&'a [u8]> for Error {
    fn from_error_kind(_input: &'a [u8], kind: nom::error::ErrorKind) -> Self {
        Error::new(ErrorKind::new(kind.description()))
    }

    fn append(_input: &'a [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(e))
    }
}

/// The kinds of errors that can occur when processing a turn file.
pub enum ErrorKind {
    /// Generic error type
    Message(String),

    /// An error that occurs while reading or writing file data.
    Io(io::Error),

    /// The framing layer ran past the end of the file: a block header
    /// claimed more payload bytes than remain.
    TruncatedFile,

    /// The first block of the file is not a valid 16-byte file header.
    InvalidFileHeaderBlock(String),

    /// A block failed its variant decoder's structural checks.
    InvalidBlock {
        /// The block type id from the framing word
        block_type: u8,
        /// The index of the block in the file
        index: usize,
        /// Why the decoder rejected the payload
        reason: String,
    },

    /// The text codec ran out of input or hit an invalid nibble
    /// sequence before producing the advertised character count.
    DecodeString(String),

    /// A decrypted payload failed structural validation, which usually
    /// means the keystream was seeded with the wrong player hash.
    DecryptionMismatch {
        /// The index of the block that failed validation
        index: usize,
    },

    /// The file uses a format feature that is not supported.
    Unimplemented(String),

    /// The data requested was not found in the file.
    NotFound(String),
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Debug for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", self)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        match self {
            ErrorKind::Message(message) => write!(f, "An error occurred: {}", message),
            ErrorKind::Io(e) => write!(f, "{}", e),
            ErrorKind::TruncatedFile => {
                write!(f, "Truncated file: block size extends past end of file")
            }
            ErrorKind::InvalidFileHeaderBlock(message) => {
                write!(f, "Invalid file header block: {}", message)
            }
            ErrorKind::InvalidBlock {
                block_type,
                index,
                reason,
            } => write!(
                f,
                "Invalid block type {} at index {}: {}",
                block_type, index, reason
            ),
            ErrorKind::DecodeString(message) => {
                write!(f, "Error decoding string: {}", message)
            }
            ErrorKind::DecryptionMismatch { index } => write!(
                f,
                "Decrypted block {} failed validation, wrong player hash?",
                index
            ),
            ErrorKind::Unimplemented(message) => {
                write!(f, "Unimplemented feature: {}", message)
            }
            ErrorKind::NotFound(message) => {
                write!(f, "Data not found: {}", message)
            }
        }
    }
}

impl ErrorKind {
    /// Return a new generic ErrorKind::Message with a given string message.
    pub fn new(message: &str) -> ErrorKind {
        ErrorKind::Message(message.to_string())
    }

    /// Return a new ErrorKind::InvalidBlock for a failed structural check.
    pub fn invalid_block(block_type: u8, index: usize, reason: &str) -> ErrorKind {
        ErrorKind::InvalidBlock {
            block_type,
            index,
            reason: reason.to_string(),
        }
    }
}
