//! Functions for dealing with files
#![warn(missing_docs)]
#![warn(unsafe_code)]

use std::{fs, result::Result};

use crate::error::Error;

/// Open up a turn file and read in the data
///
/// # Arguments
///
/// * `filename` - A string reference to a filename to open and read
///
/// # Returns
///
/// Returns all the data as a u8 vector, or an Err result if there was
/// an error reading the file.
pub fn read_file(filename: &str) -> Result<Vec<u8>, Error> {
    Ok(fs::read(filename)?)
}

/// Parse a turn file straight from disk
///
/// # Arguments
///
/// * `filename` - A string reference to a filename to open and parse
///
/// # Returns
///
/// The parsed turn file, or the first read or parse error hit.
pub fn parse_file(
    filename: &str,
) -> Result<crate::block_format::turn_file::TurnFile, Error> {
    let data = read_file(filename)?;
    crate::block_format::turn_file::TurnFile::parse(&data)
}
