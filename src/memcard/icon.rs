use serde::Serialize;
use tracing::debug;

use super::layout::{
    IconLayout, ICON_FRAME_BYTES, ICON_HEIGHT, ICON_WIDTH, MAX_ICON_FRAMES, PALETTE_ENTRIES,
};
use super::title::TitleDecoder;
use super::warning::{Warning, WarningKind};

/// PAL video rate the icon animation is timed against.
const PAL_FRAME_RATE: u64 = 25;

/// One 16-bit CLUT entry: 5 bits each of red, green and blue, low bits
/// first, with the semi-transparency flag in bit 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Color15(pub u16);

impl Color15 {
    pub const STP_BIT: u16 = 0x8000;

    pub fn pack(red: u8, green: u8, blue: u8, stp: bool) -> Self {
        let raw = u16::from(red & 0x1F)
            | (u16::from(green & 0x1F) << 5)
            | (u16::from(blue & 0x1F) << 10)
            | if stp { Self::STP_BIT } else { 0 };
        Color15(raw)
    }

    /// 5-bit red, green, blue.
    pub fn unpack(self) -> (u8, u8, u8) {
        (
            (self.0 & 0x1F) as u8,
            ((self.0 >> 5) & 0x1F) as u8,
            ((self.0 >> 10) & 0x1F) as u8,
        )
    }

    pub fn stp(self) -> bool {
        self.0 & Self::STP_BIT != 0
    }

    /// An all-zero entry is drawn as fully transparent.
    pub fn is_transparent(self) -> bool {
        self.0 == 0
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let (r, g, b) = self.unpack();
        [expand_channel(r), expand_channel(g), expand_channel(b)]
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let [r, g, b] = self.to_rgb8();
        let alpha = if self.is_transparent() { 0 } else { 0xFF };
        [r, g, b, alpha]
    }
}

/// Scale a 5-bit channel linearly onto 0..=255.
pub fn expand_channel(value: u8) -> u8 {
    (u16::from(value & 0x1F) * 255 / 31) as u8
}

/// Split a bitmap byte into (left, right) palette indices.
pub fn unpack_pixels(byte: u8) -> (u8, u8) {
    (byte & 0x0F, byte >> 4)
}

pub fn pack_pixels(left: u8, right: u8) -> u8 {
    (left & 0x0F) | ((right & 0x0F) << 4)
}

/// A 16x16 frame of palette indices, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bitmap {
    pub rows: [[u8; ICON_WIDTH]; ICON_HEIGHT],
}

impl Bitmap {
    /// Decode from packed bytes; missing bytes read as index 0.
    pub fn from_packed(bytes: &[u8]) -> Self {
        let mut rows = [[0u8; ICON_WIDTH]; ICON_HEIGHT];
        for (y, row) in rows.iter_mut().enumerate() {
            for x in (0..ICON_WIDTH).step_by(2) {
                let byte = bytes.get((y * ICON_WIDTH + x) / 2).copied().unwrap_or(0);
                let (left, right) = unpack_pixels(byte);
                row[x] = left;
                row[x + 1] = right;
            }
        }
        Bitmap { rows }
    }

    pub fn to_packed(&self) -> Vec<u8> {
        self.rows
            .iter()
            .flat_map(|row| row.chunks_exact(2).map(|pair| pack_pixels(pair[0], pair[1])))
            .collect()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y)?.get(x).copied()
    }
}

/// Icon and title metadata from the first block of a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub display_flag: u8,
    pub frame_count: u8,
    /// Block count byte as written by the game.
    pub block_count: u8,
    pub title: String,
    pub palette: [Color15; PALETTE_ENTRIES],
    pub frames: Vec<Bitmap>,
}

impl Icon {
    pub fn rgb_palette(&self) -> [[u8; 3]; PALETTE_ENTRIES] {
        self.palette.map(Color15::to_rgb8)
    }

    /// RGBA pixels of frame `n`, row-major, 256 entries.
    pub fn frame_rgba(&self, n: usize) -> Option<Vec<[u8; 4]>> {
        let frame = self.frames.get(n)?;
        Some(
            frame
                .rows
                .iter()
                .flatten()
                .map(|&index| self.palette[usize::from(index & 0x0F)].to_rgba8())
                .collect(),
        )
    }

    pub fn is_animated(&self) -> bool {
        self.frame_count > 1
    }

    /// How long each animation frame is shown: 11 video frames per icon
    /// frame for three-frame icons, 16 for two.
    pub fn frame_interval_ms(&self) -> Option<u64> {
        let video_frames = match self.frame_count {
            2 => 16,
            3 => 11,
            _ => return None,
        };
        Some(video_frames * 1000 / PAL_FRAME_RATE)
    }
}

/// Frame count for a display flag, `None` if the flag is not recognised.
pub fn frames_for_flag(flag: u8) -> Option<u8> {
    match flag {
        0x11 => Some(1),
        0x12 => Some(2),
        0x13 => Some(3),
        _ => None,
    }
}

fn read_u16_le(bytes: &[u8], offset: usize) -> u16 {
    match bytes.get(offset..offset + 2) {
        Some(pair) => u16::from_le_bytes([pair[0], pair[1]]),
        None => 0,
    }
}

/// Decode the icon header of save slot `index`.
///
/// `payload` is the first data block and `declared_size` the file size from
/// the directory. The magic is checked against the block itself; everything
/// after it is read only up to the declared size, and whatever lies beyond
/// that is zero-filled with a truncation warning. Returns `None` when the
/// magic does not match.
pub fn decode_icon(
    index: u8,
    payload: &[u8],
    declared_size: u32,
    layout: &IconLayout,
    titles: &dyn TitleDecoder,
    warnings: &mut Vec<Warning>,
) -> Option<Icon> {
    let block = payload.get(layout.header_offset..).unwrap_or(&[]);

    match block.get(0..2) {
        Some(magic) if magic == layout.magic => {}
        Some(magic) => {
            warnings.push(Warning::slot(
                index,
                WarningKind::IconMagicMismatch,
                format!(
                    "expected {:?}, found {:02X} {:02X}",
                    String::from_utf8_lossy(&layout.magic),
                    magic[0],
                    magic[1]
                ),
            ));
            return None;
        }
        None => {
            warnings.push(Warning::slot(
                index,
                WarningKind::IconMagicMismatch,
                format!("payload ends after {} bytes, before the icon magic", block.len()),
            ));
            return None;
        }
    }

    let declared = usize::try_from(declared_size)
        .unwrap_or(usize::MAX)
        .saturating_sub(layout.header_offset);
    let header = &block[..block.len().min(declared)];

    let (display_flag, frame_count) = match header.get(layout.flag_offset).copied() {
        Some(flag) => match frames_for_flag(flag) {
            Some(count) => (flag, count),
            None => {
                warnings.push(Warning::slot(
                    index,
                    WarningKind::UnknownIconFlag,
                    format!("display flag 0x{:02X}, showing a single frame", flag),
                ));
                (flag, 1)
            }
        },
        // Flag lies past the declared size; the truncation warning covers it.
        None => (0, 1),
    };
    let frames_wanted = usize::from(frame_count).min(MAX_ICON_FRAMES);

    let title_end = (layout.title_offset + layout.title_len).min(header.len());
    let raw_title = header.get(layout.title_offset..title_end).unwrap_or(&[]);
    let title = titles.decode(raw_title);
    if title.undecodable {
        warnings.push(Warning::slot(
            index,
            WarningKind::UndecodableTitle,
            format!("title contains undecodable bytes: {:?}", title.text),
        ));
    }

    let mut palette = [Color15::default(); PALETTE_ENTRIES];
    for (i, color) in palette.iter_mut().enumerate() {
        *color = Color15(read_u16_le(header, layout.palette_offset + i * 2));
    }

    let frames = (0..frames_wanted)
        .map(|n| {
            let start = layout.bitmap_offset + n * ICON_FRAME_BYTES;
            Bitmap::from_packed(header.get(start..).unwrap_or(&[]))
        })
        .collect();

    let required = layout.required_len(frames_wanted);
    if header.len() < required {
        warnings.push(Warning::slot(
            index,
            WarningKind::IconTruncated,
            format!(
                "{} frame icon needs {} bytes, only {} available",
                frames_wanted,
                required,
                header.len()
            ),
        ));
    }

    debug!(
        "Slot {}: icon flag=0x{:02X}, frames={}, title={:?}",
        index, display_flag, frame_count, title.text
    );

    Some(Icon {
        display_flag,
        frame_count,
        block_count: header.get(layout.block_count_offset).copied().unwrap_or(0),
        title: title.text,
        palette,
        frames,
    })
}
