#![warn(missing_docs)]
#![warn(unsafe_code)]
//! stars_rider is a library crate to parse the save and turn files of
//! the classic 4X strategy game Stars!.
//!
//! The primary entry point is
//! [TurnFile](crate::block_format::turn_file::TurnFile), which frames,
//! decrypts and decodes a whole file.  The layers underneath are
//! usable on their own: the
//! [framer](crate::block_format::framing::block_framer) for
//! diagnostics on undecryptable files, the
//! [text codec](crate::block_format::strings) for the compressed
//! string encoding, and the
//! [password tools](crate::block_format::password) for recovering a
//! lost password from its hash.
use log::error;

pub mod block_format;
pub mod config;
pub mod error;
pub mod file;
pub mod serialize;

/// Initialize the module.
/// This should be called before any parsing is performed.
/// Panics on failure or if there are any incompatibilities.
pub fn init() {
    // The block decoders index into whole-file buffers with usize, so
    // a 16-bit usize cannot address the larger turn files.
    if usize::BITS < 32 {
        error!(
            "Architecture usize {} is too small for this library",
            usize::BITS
        );
        panic!(
            "Architecture usize {} is too small for this library",
            usize::BITS
        );
    }
}
