use std::fmt;

use crate::memcard::layout::{BLOCK_SIZE, SLOT_COUNT};
use crate::memcard::{DecodedCard, Region, SaveSlot, SlotRole};

fn region_tag(region: Region) -> &'static str {
    match region {
        Region::Japan => "JP",
        Region::Europe => "EU",
        Region::America => "US",
        Region::Unknown => "--",
    }
}

fn blocks_label(blocks: usize) -> String {
    if blocks == 1 {
        format!("{:^2} Block ", blocks)
    } else {
        format!("{:^2} Blocks", blocks)
    }
}

fn state_label(slot: &SaveSlot) -> &'static str {
    match slot.role {
        SlotRole::Save if slot.entry.state.is_occupied() => "in use",
        SlotRole::Save => "deleted",
        SlotRole::Orphan => "orphan",
        SlotRole::Unrecognized => "unknown",
        SlotRole::Continuation { .. } => "linked",
        SlotRole::Free => "free",
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, slot: &SaveSlot) -> fmt::Result {
    writeln!(
        f,
        "{:>4} | {:<7} | {} {:<20} | {:>3} KB | {} | {}",
        slot.index,
        state_label(slot),
        region_tag(slot.entry.region()),
        slot.entry.product_code,
        slot.entry.file_size as usize / 1024,
        blocks_label(slot.size_in_blocks()),
        slot.title().unwrap_or("")
    )
}

/// Plain-text slot table, totals and warnings for a decoded card.
pub struct CardReport<'a> {
    pub card: &'a DecodedCard,
    pub fingerprint: Option<&'a str>,
}

impl fmt::Display for CardReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let card = self.card;

        writeln!(
            f,
            "Slot | State   | File Name               | Size   | Blocks    | Title"
        )?;
        for slot in card.slots.iter().filter(|slot| {
            matches!(slot.role, SlotRole::Save | SlotRole::Orphan | SlotRole::Unrecognized)
        }) {
            write_row(f, slot)?;
        }

        let used = card.used_blocks();
        let free = card.free_blocks();
        writeln!(f)?;
        writeln!(f, "Total Size: {} KB ({} Blocks)", used * BLOCK_SIZE / 1024, used)?;
        writeln!(f, "Free Space: {} KB ({} Blocks)", free * BLOCK_SIZE / 1024, free)?;
        if let Some(fingerprint) = self.fingerprint {
            writeln!(f, "SHA-256:    {}", fingerprint)?;
        }

        if !card.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", card.warnings.len())?;
            for warning in &card.warnings {
                writeln!(f, "  {}", warning)?;
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Filename prefix: BI = Japan, BE = Europe, BA = America ({} blocks per card)",
            SLOT_COUNT
        )
    }
}

pub fn render_report(card: &DecodedCard, fingerprint: Option<&str>) -> String {
    CardReport { card, fingerprint }.to_string()
}
