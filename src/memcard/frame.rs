use serde::Serialize;
use std::fmt;
use tracing::debug;

use super::layout::{FrameLayout, CHECKSUM_OFFSET, FRAME_SIZE, NO_NEXT_BLOCK, STATE_OFFSET};
use super::warning::{Warning, WarningKind, WarningSource};

/// Block allocation state stored in byte 0 of a directory frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockState {
    Free,
    FirstOccupied,
    MiddleOccupied,
    LastOccupied,
    FirstDeleted,
    MiddleDeleted,
    LastDeleted,
    Unknown(u8),
}

/// Occupied and deleted chains never mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Occupied,
    Deleted,
}

/// Position of a block within its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    First,
    Middle,
    Last,
}

impl BlockState {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0xA0 => BlockState::Free,
            0x51 => BlockState::FirstOccupied,
            0x52 => BlockState::MiddleOccupied,
            0x53 => BlockState::LastOccupied,
            0xA1 => BlockState::FirstDeleted,
            0xA2 => BlockState::MiddleDeleted,
            0xA3 => BlockState::LastDeleted,
            other => BlockState::Unknown(other),
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BlockState::Free => 0xA0,
            BlockState::FirstOccupied => 0x51,
            BlockState::MiddleOccupied => 0x52,
            BlockState::LastOccupied => 0x53,
            BlockState::FirstDeleted => 0xA1,
            BlockState::MiddleDeleted => 0xA2,
            BlockState::LastDeleted => 0xA3,
            BlockState::Unknown(byte) => byte,
        }
    }

    /// Family and chain position, or `None` for free and unknown blocks.
    pub fn classify(self) -> Option<(Family, Link)> {
        match self {
            BlockState::FirstOccupied => Some((Family::Occupied, Link::First)),
            BlockState::MiddleOccupied => Some((Family::Occupied, Link::Middle)),
            BlockState::LastOccupied => Some((Family::Occupied, Link::Last)),
            BlockState::FirstDeleted => Some((Family::Deleted, Link::First)),
            BlockState::MiddleDeleted => Some((Family::Deleted, Link::Middle)),
            BlockState::LastDeleted => Some((Family::Deleted, Link::Last)),
            BlockState::Free | BlockState::Unknown(_) => None,
        }
    }

    pub fn family(self) -> Option<Family> {
        self.classify().map(|(family, _)| family)
    }

    pub fn link(self) -> Option<Link> {
        self.classify().map(|(_, link)| link)
    }

    pub fn is_first(self) -> bool {
        self.link() == Some(Link::First)
    }

    pub fn is_occupied(self) -> bool {
        self.family() == Some(Family::Occupied)
    }

    pub fn is_free(self) -> bool {
        self == BlockState::Free
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockState::Free => write!(f, "free"),
            BlockState::FirstOccupied => write!(f, "first (in use)"),
            BlockState::MiddleOccupied => write!(f, "middle (in use)"),
            BlockState::LastOccupied => write!(f, "last (in use)"),
            BlockState::FirstDeleted => write!(f, "first (deleted)"),
            BlockState::MiddleDeleted => write!(f, "middle (deleted)"),
            BlockState::LastDeleted => write!(f, "last (deleted)"),
            BlockState::Unknown(byte) => write!(f, "unknown (0x{:02X})", byte),
        }
    }
}

/// Sales region, from the first two characters of the product code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    Japan,
    Europe,
    America,
    Unknown,
}

impl Region {
    pub fn from_product_code(code: &str) -> Self {
        if code.starts_with("BI") {
            Region::Japan
        } else if code.starts_with("BE") {
            Region::Europe
        } else if code.starts_with("BA") {
            Region::America
        } else {
            Region::Unknown
        }
    }
}

/// One of the 15 directory frames, decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Directory position, which is also the data block it describes (1..=15).
    pub index: u8,
    pub state: BlockState,
    pub file_size: u32,
    /// Raw pointer; [`NO_NEXT_BLOCK`] ends the chain.
    pub next_block: u16,
    pub product_code: String,
    pub checksum: u8,
    pub checksum_valid: bool,
}

impl DirectoryEntry {
    pub fn has_next(&self) -> bool {
        self.next_block != NO_NEXT_BLOCK
    }

    pub fn region(&self) -> Region {
        Region::from_product_code(&self.product_code)
    }
}

/// Frame 0 of block 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderFrame {
    pub magic: [u8; 2],
    /// Bytes between the magic and the checksum, kept as found.
    #[serde(skip)]
    pub reserved: Vec<u8>,
    pub checksum: u8,
    pub checksum_valid: bool,
}

/// XOR of every byte before the checksum position.
pub fn frame_checksum(frame: &[u8]) -> u8 {
    frame
        .iter()
        .take(CHECKSUM_OFFSET)
        .fold(0u8, |acc, byte| acc ^ byte)
}

/// True when the frame is full length and its last byte matches the XOR.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.get(CHECKSUM_OFFSET) {
        Some(&stored) if frame.len() == FRAME_SIZE => frame_checksum(frame) == stored,
        _ => false,
    }
}

fn read_u16_le(frame: &[u8], offset: usize) -> Option<u16> {
    let bytes = frame.get(offset..offset + 2)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32_le(frame: &[u8], offset: usize) -> Option<u32> {
    let bytes = frame.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Zero-terminated ASCII field; stops at the first zero or the field end.
fn read_product_code(frame: &[u8], offset: usize, len: usize) -> String {
    let end = (offset + len).min(frame.len());
    let field = frame.get(offset..end).unwrap_or(&[]);

    field
        .iter()
        .take_while(|&&byte| byte != 0)
        .map(|&byte| {
            if (0x20..=0x7E).contains(&byte) {
                char::from(byte)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}

/// Decode directory frame `index` (1..=15). Never fails; anomalies are
/// appended to `warnings`.
pub fn decode_entry(
    index: u8,
    frame: &[u8],
    layout: &FrameLayout,
    warnings: &mut Vec<Warning>,
) -> DirectoryEntry {
    let raw_state = frame.get(STATE_OFFSET).copied().unwrap_or(0);
    let state = BlockState::from_byte(raw_state);
    let checksum = frame.get(CHECKSUM_OFFSET).copied().unwrap_or(0);
    let checksum_valid = verify_checksum(frame);

    let entry = DirectoryEntry {
        index,
        state,
        file_size: read_u32_le(frame, layout.size_offset).unwrap_or(0),
        next_block: read_u16_le(frame, layout.next_offset).unwrap_or(NO_NEXT_BLOCK),
        product_code: read_product_code(frame, layout.product_code_offset, layout.product_code_len),
        checksum,
        checksum_valid,
    };

    if !checksum_valid {
        warnings.push(Warning::slot(
            index,
            WarningKind::ChecksumMismatch,
            format!(
                "directory frame {} stores checksum 0x{:02X}, computed 0x{:02X}",
                index,
                checksum,
                frame_checksum(frame)
            ),
        ));
    }

    if let BlockState::Unknown(byte) = state {
        warnings.push(Warning::slot(
            index,
            WarningKind::UnknownState,
            format!("unrecognised state byte 0x{:02X}", byte),
        ));
    }

    debug!(
        "Frame {}: state={}, size={}, next=0x{:04X}, product={:?}",
        index, entry.state, entry.file_size, entry.next_block, entry.product_code
    );

    entry
}

/// Decode the header frame. A bad checksum is only a warning.
pub fn decode_header(frame: &[u8], warnings: &mut Vec<Warning>) -> HeaderFrame {
    let magic = [
        frame.first().copied().unwrap_or(0),
        frame.get(1).copied().unwrap_or(0),
    ];
    let reserved = frame.get(2..CHECKSUM_OFFSET).unwrap_or(&[]).to_vec();
    let checksum = frame.get(CHECKSUM_OFFSET).copied().unwrap_or(0);
    let checksum_valid = verify_checksum(frame);

    if !checksum_valid {
        warnings.push(Warning::new(
            WarningSource::Header,
            WarningKind::ChecksumMismatch,
            format!(
                "header frame stores checksum 0x{:02X}, computed 0x{:02X}",
                checksum,
                frame_checksum(frame)
            ),
        ));
    }

    HeaderFrame {
        magic,
        reserved,
        checksum,
        checksum_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seal(frame: &mut [u8; FRAME_SIZE]) {
        frame[CHECKSUM_OFFSET] = frame_checksum(frame);
    }

    fn entry_frame(state: u8, size: u32, next: u16, code: &[u8]) -> [u8; FRAME_SIZE] {
        let layout = FrameLayout::default();
        let mut frame = [0u8; FRAME_SIZE];
        frame[STATE_OFFSET] = state;
        frame[layout.size_offset..layout.size_offset + 4].copy_from_slice(&size.to_le_bytes());
        frame[layout.next_offset..layout.next_offset + 2].copy_from_slice(&next.to_le_bytes());
        frame[layout.product_code_offset..layout.product_code_offset + code.len()]
            .copy_from_slice(code);
        seal(&mut frame);
        frame
    }

    #[test]
    fn test_state_bytes_round_trip() {
        for byte in [0xA0, 0x51, 0x52, 0x53, 0xA1, 0xA2, 0xA3] {
            let state = BlockState::from_byte(byte);
            assert!(!matches!(state, BlockState::Unknown(_)));
            assert_eq!(state.to_byte(), byte);
        }
        assert_eq!(BlockState::from_byte(0x00), BlockState::Unknown(0x00));
        assert_eq!(BlockState::from_byte(0xFF), BlockState::Unknown(0xFF));
    }

    #[test]
    fn test_classify() {
        assert_eq!(
            BlockState::MiddleDeleted.classify(),
            Some((Family::Deleted, Link::Middle))
        );
        assert_eq!(BlockState::Free.classify(), None);
        assert!(BlockState::FirstOccupied.is_first());
        assert!(BlockState::LastOccupied.is_occupied());
        assert!(!BlockState::LastDeleted.is_occupied());
    }

    #[test]
    fn test_checksum_valid_and_invalid() {
        let mut frame = entry_frame(0x51, 8192, NO_NEXT_BLOCK, b"BASLUS-00067");
        assert!(verify_checksum(&frame));

        frame[CHECKSUM_OFFSET] ^= 0x01;
        assert!(!verify_checksum(&frame));
    }

    #[test]
    fn test_checksum_of_free_frame() {
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = 0xA0;
        frame[CHECKSUM_OFFSET] = 0xA0;
        assert!(verify_checksum(&frame));
    }

    #[test]
    fn test_short_frame_never_valid() {
        assert!(!verify_checksum(&[0u8; 64]));
    }

    #[test]
    fn test_decode_entry_fields() {
        let frame = entry_frame(0x51, 16384, 2, b"BESLES-01234GAME");
        let mut warnings = Vec::new();
        let entry = decode_entry(1, &frame, &FrameLayout::default(), &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(entry.index, 1);
        assert_eq!(entry.state, BlockState::FirstOccupied);
        assert_eq!(entry.file_size, 16384);
        assert_eq!(entry.next_block, 2);
        assert!(entry.has_next());
        assert_eq!(entry.product_code, "BESLES-01234GAME");
        assert_eq!(entry.region(), Region::Europe);
        assert!(entry.checksum_valid);
    }

    #[test]
    fn test_product_code_stops_at_field_boundary() {
        let mut frame = [0u8; FRAME_SIZE];
        let layout = FrameLayout::default();
        for byte in &mut frame[layout.product_code_offset..layout.product_code_offset + 30] {
            *byte = b'X';
        }
        seal(&mut frame);

        let mut warnings = Vec::new();
        let entry = decode_entry(3, &frame, &layout, &mut warnings);
        assert_eq!(entry.product_code.len(), 20);
    }

    #[test]
    fn test_unknown_state_and_bad_checksum_warn() {
        let mut frame = entry_frame(0x77, 0, NO_NEXT_BLOCK, b"");
        frame[CHECKSUM_OFFSET] ^= 0xFF;

        let mut warnings = Vec::new();
        let entry = decode_entry(5, &frame, &FrameLayout::default(), &mut warnings);

        assert_eq!(entry.state, BlockState::Unknown(0x77));
        assert!(!entry.checksum_valid);
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::ChecksumMismatch, WarningKind::UnknownState]
        );
        assert!(warnings.iter().all(|w| w.slot_index() == Some(5)));
    }

    #[test]
    fn test_retail_layout_fields() {
        let layout = FrameLayout::retail();
        let mut frame = [0u8; FRAME_SIZE];
        frame[0] = 0x51;
        frame[4..8].copy_from_slice(&8192u32.to_le_bytes());
        frame[8..10].copy_from_slice(&NO_NEXT_BLOCK.to_le_bytes());
        frame[0x0A..0x0E].copy_from_slice(b"BISL");
        seal(&mut frame);

        let mut warnings = Vec::new();
        let entry = decode_entry(1, &frame, &layout, &mut warnings);
        assert!(warnings.is_empty());
        assert_eq!(entry.file_size, 8192);
        assert!(!entry.has_next());
        assert_eq!(entry.region(), Region::Japan);
    }

    #[test]
    fn test_decode_header() {
        let mut frame = [0u8; FRAME_SIZE];
        frame[0..2].copy_from_slice(b"MC");
        seal(&mut frame);

        let mut warnings = Vec::new();
        let header = decode_header(&frame, &mut warnings);
        assert_eq!(&header.magic, b"MC");
        assert_eq!(header.checksum, b'M' ^ b'C');
        assert!(header.checksum_valid);
        assert_eq!(header.reserved.len(), FRAME_SIZE - 3);
        assert!(warnings.is_empty());

        frame[CHECKSUM_OFFSET] = 0;
        let header = decode_header(&frame, &mut warnings);
        assert!(!header.checksum_valid);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].source, WarningSource::Header);
    }
}
