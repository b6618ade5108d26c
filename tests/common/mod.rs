#![allow(dead_code)]

use cardreader::memcard::frame::frame_checksum;
use cardreader::memcard::layout::{
    BLOCK_SIZE, CARD_SIZE, CHECKSUM_OFFSET, DIRECTORY_FRAMES, FRAME_SIZE, ICON_FRAME_BYTES,
    NO_NEXT_BLOCK,
};

pub const FREE: u8 = 0xA0;
pub const FIRST: u8 = 0x51;
pub const MIDDLE: u8 = 0x52;
pub const LAST: u8 = 0x53;
pub const FIRST_DELETED: u8 = 0xA1;
pub const LAST_DELETED: u8 = 0xA3;

/// Builds synthetic card images in the default frame layout, keeping every
/// frame checksum valid unless told otherwise.
pub struct CardBuilder {
    data: Vec<u8>,
}

impl CardBuilder {
    /// Freshly formatted card: header plus 15 free frames.
    pub fn formatted() -> Self {
        let mut builder = Self {
            data: vec![0u8; CARD_SIZE],
        };
        builder.data[0..2].copy_from_slice(b"MC");
        builder.seal(0);
        for i in 1..DIRECTORY_FRAMES {
            builder = builder.entry(i, FREE, 0, NO_NEXT_BLOCK, "");
        }
        builder
    }

    fn seal(&mut self, frame: usize) {
        let start = frame * FRAME_SIZE;
        self.data[start + CHECKSUM_OFFSET] = frame_checksum(&self.data[start..start + FRAME_SIZE]);
    }

    pub fn entry(mut self, index: usize, state: u8, size: u32, next: u16, code: &str) -> Self {
        let start = index * FRAME_SIZE;
        self.data[start..start + FRAME_SIZE].fill(0);
        self.data[start] = state;
        self.data[start + 1..start + 5].copy_from_slice(&size.to_le_bytes());
        self.data[start + 5..start + 7].copy_from_slice(&next.to_le_bytes());
        self.data[start + 0x0A..start + 0x0A + code.len()].copy_from_slice(code.as_bytes());
        self.seal(index);
        self
    }

    /// Icon header at the start of data block `block`.
    pub fn icon(
        mut self,
        block: usize,
        flag: u8,
        title: &[u8],
        palette: &[u16; 16],
        frames: &[[u8; ICON_FRAME_BYTES]],
    ) -> Self {
        let base = block * BLOCK_SIZE;
        self.data[base..base + 2].copy_from_slice(b"SC");
        self.data[base + 2] = flag;
        self.data[base + 3] = 1;
        self.data[base + 4..base + 4 + title.len()].copy_from_slice(title);
        for (i, color) in palette.iter().enumerate() {
            let at = base + 0x60 + i * 2;
            self.data[at..at + 2].copy_from_slice(&color.to_le_bytes());
        }
        for (n, frame) in frames.iter().enumerate() {
            let at = base + 0x80 + n * ICON_FRAME_BYTES;
            self.data[at..at + ICON_FRAME_BYTES].copy_from_slice(frame);
        }
        self
    }

    /// Overwrite bytes without resealing.
    pub fn raw(mut self, offset: usize, bytes: &[u8]) -> Self {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self
    }

    pub fn corrupt_checksum(mut self, frame: usize) -> Self {
        self.data[frame * FRAME_SIZE + CHECKSUM_OFFSET] ^= 0xFF;
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// ASCII to full-width Shift-JIS letters and digits; anything else becomes
/// an ideographic space.
pub fn fullwidth(text: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for ch in text.bytes() {
        match ch {
            b'0'..=b'9' => out.extend_from_slice(&[0x82, 0x4F + (ch - b'0')]),
            b'A'..=b'Z' => out.extend_from_slice(&[0x82, 0x60 + (ch - b'A')]),
            b'a'..=b'z' => out.extend_from_slice(&[0x82, 0x81 + (ch - b'a')]),
            _ => out.extend_from_slice(&[0x81, 0x40]),
        }
    }
    out
}

/// 16x16 checkerboard of indices `a` and `b`, packed two pixels per byte.
pub fn checkerboard(a: u8, b: u8) -> [u8; ICON_FRAME_BYTES] {
    let mut frame = [0u8; ICON_FRAME_BYTES];
    for y in 0..16 {
        let (left, right) = if y % 2 == 0 { (a, b) } else { (b, a) };
        for pair in 0..8 {
            frame[y * 8 + pair] = (left & 0x0F) | ((right & 0x0F) << 4);
        }
    }
    frame
}

pub fn rgb15(r: u16, g: u16, b: u16) -> u16 {
    (r & 0x1F) | ((g & 0x1F) << 5) | ((b & 0x1F) << 10)
}
