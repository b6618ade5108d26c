use serde::Serialize;
use tracing::{debug, info};

use super::directory::{self, SaveSlot};
use super::frame::{self, DirectoryEntry, HeaderFrame};
use super::icon;
use super::layout::{
    BLOCK_SIZE, CARD_SIZE, DIRECTORY_FRAMES, FRAME_SIZE, HEADER_MAGIC, RESERVED_OFFSET, SLOT_COUNT,
};
use super::title::TitleDecoder;
use super::warning::Warning;
use crate::config::DecoderConfig;
use crate::error::FormatError;

/// A borrowed raw card image, validated for length and header magic.
#[derive(Debug, Clone, Copy)]
pub struct CardImage<'a> {
    data: &'a [u8],
}

impl<'a> CardImage<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self, FormatError> {
        if data.len() != CARD_SIZE {
            return Err(FormatError::InvalidLength {
                actual: data.len(),
                expected: CARD_SIZE,
            });
        }

        let found = [data[0], data[1]];
        if found != HEADER_MAGIC {
            return Err(FormatError::BadMagic { found });
        }

        Ok(Self { data })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Block `i` (0..=15), 8 KiB.
    pub fn block(&self, i: usize) -> &'a [u8] {
        let start = (i * BLOCK_SIZE).min(CARD_SIZE);
        let end = (start + BLOCK_SIZE).min(CARD_SIZE);
        &self.data[start..end]
    }

    /// Frame `i` of the directory block (0 is the header).
    pub fn frame(&self, i: usize) -> &'a [u8] {
        let start = (i * FRAME_SIZE).min(BLOCK_SIZE);
        let end = (start + FRAME_SIZE).min(BLOCK_SIZE);
        &self.data[start..end]
    }
}

/// Result of decoding a card image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedCard {
    pub header: HeaderFrame,
    /// One per data block, index 1 first.
    pub slots: Vec<SaveSlot>,
    /// Sorted by source: header, directory, then slot index.
    pub warnings: Vec<Warning>,
    /// Block 0 after the directory frames, preserved uninterpreted.
    #[serde(skip)]
    pub reserved: Vec<u8>,
}

impl DecodedCard {
    /// First-block slots of saves, live or deleted.
    pub fn saves(&self) -> impl Iterator<Item = &SaveSlot> {
        self.slots.iter().filter(|slot| slot.is_save())
    }

    /// Live saves only.
    pub fn live_saves(&self) -> impl Iterator<Item = &SaveSlot> {
        self.saves().filter(|slot| slot.entry.state.is_occupied())
    }

    pub fn slot(&self, index: u8) -> Option<&SaveSlot> {
        self.slots.iter().find(|slot| slot.index == index)
    }

    /// Blocks held by live saves.
    pub fn used_blocks(&self) -> usize {
        self.live_saves().map(SaveSlot::size_in_blocks).sum()
    }

    pub fn free_blocks(&self) -> usize {
        SLOT_COUNT.saturating_sub(self.used_blocks())
    }

    pub fn used_bytes(&self) -> usize {
        self.used_blocks() * BLOCK_SIZE
    }

    pub fn warnings_for(&self, index: u8) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .filter(move |warning| warning.slot_index() == Some(index))
    }
}

/// Decodes card images with a fixed configuration. Holds no state between
/// calls.
pub struct CardDecoder {
    config: DecoderConfig,
    titles: Box<dyn TitleDecoder>,
}

impl Default for CardDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl CardDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        let titles = config.title.decoder();
        Self { config, titles }
    }

    /// Replace the title table picked by the configuration.
    pub fn with_title_decoder(mut self, titles: Box<dyn TitleDecoder>) -> Self {
        self.titles = titles;
        self
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn decode(&self, data: &[u8]) -> Result<DecodedCard, FormatError> {
        let image = CardImage::new(data)?;
        Ok(self.decode_image(image))
    }

    pub fn decode_image(&self, image: CardImage<'_>) -> DecodedCard {
        let mut warnings = Vec::new();

        let header = frame::decode_header(image.frame(0), &mut warnings);

        let entries: Vec<DirectoryEntry> = (1..DIRECTORY_FRAMES)
            .map(|i| frame::decode_entry(i as u8, image.frame(i), &self.config.frame, &mut warnings))
            .collect();

        let mut slots = directory::resolve(&entries, &self.config.frame, &mut warnings);

        for slot in slots.iter_mut().filter(|s| s.is_save() && s.entry.state.is_occupied()) {
            let payload = image.block(usize::from(slot.index));
            slot.icon = icon::decode_icon(
                slot.index,
                payload,
                slot.entry.file_size,
                &self.config.icon,
                self.titles.as_ref(),
                &mut warnings,
            );
        }

        // Stable: keeps production order within each source.
        warnings.sort_by_key(|warning| warning.source);
        for warning in &warnings {
            debug!("{}", warning);
        }

        let reserved = image.block(0).get(RESERVED_OFFSET..).unwrap_or(&[]).to_vec();

        let card = DecodedCard {
            header,
            slots,
            warnings,
            reserved,
        };

        info!(
            "Decoded memory card: {} saves, {} blocks used, {} warnings",
            card.saves().count(),
            card.used_blocks(),
            card.warnings.len()
        );

        card
    }
}

/// Decode with the default layout and Shift-JIS titles.
pub fn decode_card(data: &[u8]) -> Result<DecodedCard, FormatError> {
    CardDecoder::default().decode(data)
}
