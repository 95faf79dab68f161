//! The turn file container
//!
//! Orchestrates the read pipeline: framing, header recognition,
//! per-block decryption and typed decoding.  Reading is fail-fast: the
//! first structurally bad block aborts the parse with its index in
//! context.  The container never re-encrypts and never writes.
use log::{debug, info};

use crate::block_format::blocks::{decode_block_kind, player, Block, BlockKind};
use crate::block_format::crypt::Cipher;
use crate::block_format::framing::block_framer;
use crate::block_format::header::{FileHeaderBlock, FILE_HEADER_BLOCK_TYPE};
use crate::error::{Error, ErrorKind};

/// The type id of the file footer
const FILE_FOOTER_BLOCK_TYPE: u8 = 0;

/// The type id of the player block
const PLAYER_BLOCK_TYPE: u8 = 6;

/// A parsed turn file: the header plus the ordered, decoded block
/// list.  Each block owns copies of its raw and decrypted payloads,
/// so the input buffer can be dropped after parsing.
#[derive(Debug)]
pub struct TurnFile {
    header: FileHeaderBlock,
    blocks: Vec<Block>,
}

impl TurnFile {
    /// Parse a whole turn file.
    ///
    /// # Arguments
    ///
    /// * `data` - The file contents
    ///
    /// # Returns
    ///
    /// The parsed file, or the first framing, header, decryption or
    /// decode error hit.
    pub fn parse(data: &[u8]) -> Result<TurnFile, Error> {
        let raw_blocks = block_framer(data)?;

        if raw_blocks.is_empty() {
            return Err(Error::new(ErrorKind::InvalidFileHeaderBlock(String::from(
                "file contains no blocks",
            ))));
        }

        let header = FileHeaderBlock::from_block(&raw_blocks[0])?;
        info!("file header: {}", header);

        let mut cipher = Cipher::new(
            header.game_id,
            header.turn,
            header.player_index,
            header.salt,
            header.shareware,
        );

        let mut blocks = Vec::with_capacity(raw_blocks.len());
        for (index, raw_block) in raw_blocks.iter().enumerate() {
            // Header blocks are stored in the clear.  A multi-turn
            // file carries one per section; each re-seeds the cipher.
            let decrypted = if raw_block.block_type == FILE_HEADER_BLOCK_TYPE {
                let section_header = FileHeaderBlock::from_block(raw_block)?;
                if index > 0 {
                    debug!("new file section at block {}", index);
                    cipher = Cipher::new(
                        section_header.game_id,
                        section_header.turn,
                        section_header.player_index,
                        section_header.salt,
                        section_header.shareware,
                    );
                }
                raw_block.data.to_vec()
            } else {
                cipher.decrypt(raw_block.block_type, raw_block.data)
            };

            let kind = match decode_block_kind(raw_block.block_type, &decrypted) {
                Ok(kind) => kind,
                Err(error) => {
                    // A bad player canary means the keystream was
                    // wrong, not the block
                    if raw_block.block_type == PLAYER_BLOCK_TYPE
                        && !player::player_marker_valid(&decrypted)
                    {
                        return Err(Error::new(ErrorKind::DecryptionMismatch { index }));
                    }
                    return Err(Error::new(ErrorKind::invalid_block(
                        raw_block.block_type,
                        index,
                        &error.to_string(),
                    )));
                }
            };

            // The owner's player block reveals the hash that keys the
            // rest of the file
            if let BlockKind::Player(player_block) = &kind {
                if player_block.player_number == header.player_index {
                    if let Some(hash) = player_block.hashed_password_u32() {
                        if hash != 0 {
                            cipher.set_player_hash(hash);
                        }
                    }
                }
            }

            let is_footer = raw_block.block_type == FILE_FOOTER_BLOCK_TYPE;

            blocks.push(Block {
                block_type: raw_block.block_type,
                size: raw_block.size,
                raw: raw_block.data.to_vec(),
                decrypted,
                kind,
            });

            if is_footer {
                debug!("file footer at block {}, stopping", index);
                break;
            }
        }

        Ok(TurnFile { header, blocks })
    }

    /// The ordered block list
    pub fn block_list(&self) -> &[Block] {
        &self.blocks
    }

    /// The file header
    pub fn file_header(&self) -> &FileHeaderBlock {
        &self.header
    }

    /// The player this file belongs to
    pub fn player_index(&self) -> u8 {
        self.header.player_index
    }

    /// The blocks that carry an owner, filtered to one player.  A
    /// convenience for downstream tools assembling a per-player view.
    pub fn blocks_owned_by(&self, player: u8) -> Vec<&Block> {
        self.blocks
            .iter()
            .filter(|block| match &block.kind {
                BlockKind::Player(player_block) => player_block.player_number == player,
                BlockKind::Fleet(fleet) => fleet.owner == player,
                BlockKind::PartialFleet(fleet) => fleet.owner == player,
                BlockKind::Planet(planet) => planet.owner == player,
                BlockKind::PartialPlanet(planet) => planet.owner == player,
                _ => false,
            })
            .collect()
    }
}
