use serde::{Deserialize, Serialize};

/// Raw memory card image size: 16 blocks of 8 KiB.
pub const CARD_SIZE: usize = BLOCK_COUNT * BLOCK_SIZE;
pub const BLOCK_SIZE: usize = 8 * 1024;
pub const BLOCK_COUNT: usize = 16;
pub const FRAME_SIZE: usize = 128;
/// Frames in block 0 that carry the header and directory.
pub const DIRECTORY_FRAMES: usize = 16;
/// Data blocks 1..=15, one directory entry each.
pub const SLOT_COUNT: usize = 15;

pub const HEADER_MAGIC: [u8; 2] = *b"MC";
/// Checksum lives in the last byte of every frame.
pub const CHECKSUM_OFFSET: usize = FRAME_SIZE - 1;
/// Block 0 bytes after the directory frames (broken sector list and spares).
pub const RESERVED_OFFSET: usize = DIRECTORY_FRAMES * FRAME_SIZE;

pub const STATE_OFFSET: usize = 0x00;
pub const NO_NEXT_BLOCK: u16 = 0xFFFF;

pub const ICON_FRAME_BYTES: usize = 128;
pub const ICON_WIDTH: usize = 16;
pub const ICON_HEIGHT: usize = 16;
pub const PALETTE_ENTRIES: usize = 16;
pub const MAX_ICON_FRAMES: usize = 3;

/// Where the directory frame fields sit.
///
/// Tools disagree on this: the default matches the compact layout this
/// reader was written against, [`FrameLayout::retail`] matches cards
/// written by the console BIOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameLayout {
    pub size_offset: usize,
    pub next_offset: usize,
    pub product_code_offset: usize,
    pub product_code_len: usize,
    /// Added to a raw next pointer to get the data block number.
    pub next_block_base: u16,
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            size_offset: 0x01,
            next_offset: 0x05,
            product_code_offset: 0x0A,
            product_code_len: 20,
            next_block_base: 0,
        }
    }
}

impl FrameLayout {
    /// 32-bit state word, size at 0x04, zero-based next pointer at 0x08.
    pub fn retail() -> Self {
        Self {
            size_offset: 0x04,
            next_offset: 0x08,
            product_code_offset: 0x0A,
            product_code_len: 20,
            next_block_base: 1,
        }
    }

    /// Translate a raw next pointer into a data block number.
    ///
    /// Returns `None` for the end-of-chain sentinel. The result may still be
    /// out of range; the resolver reports that.
    pub fn next_block(&self, raw: u16) -> Option<u32> {
        if raw == NO_NEXT_BLOCK {
            None
        } else {
            Some(u32::from(raw) + u32::from(self.next_block_base))
        }
    }
}

/// Offsets of the icon header inside the first data block of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconLayout {
    pub header_offset: usize,
    pub magic: [u8; 2],
    pub flag_offset: usize,
    pub block_count_offset: usize,
    pub title_offset: usize,
    pub title_len: usize,
    pub palette_offset: usize,
    pub bitmap_offset: usize,
}

impl Default for IconLayout {
    fn default() -> Self {
        Self {
            header_offset: 0x00,
            magic: *b"SC",
            flag_offset: 0x02,
            block_count_offset: 0x03,
            title_offset: 0x04,
            title_len: 64,
            palette_offset: 0x60,
            bitmap_offset: 0x80,
        }
    }
}

impl IconLayout {
    /// Bytes needed, from the header start, to hold `frames` bitmaps.
    pub fn required_len(&self, frames: usize) -> usize {
        self.bitmap_offset + frames * ICON_FRAME_BYTES
    }
}
