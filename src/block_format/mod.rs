#![warn(missing_docs)]
#![warn(unsafe_code)]
//!
//! The block-layer codec for turn files
//!
//! A turn file is a stream of typed, length-prefixed blocks whose
//! payloads past the header are scrambled with a keystream.  The
//! modules here take the file apart layer by layer: framing, header,
//! keystream, typed decoding, plus the text codec and password tools
//! several blocks depend on.

/// Little-endian reads and nibble helpers
pub mod primitives;

/// The compressed string codec
pub mod strings;

/// The keystream cipher
pub mod crypt;

/// The password hash and brute-forcer
pub mod password;

/// Splitting a file into framed blocks
pub mod framing;

/// The file header block
pub mod header;

/// Typed decoders for the block variants
pub mod blocks;

/// The file container
pub mod turn_file;
