use serde::Serialize;
use tracing::debug;

use super::frame::{DirectoryEntry, Link};
use super::icon::Icon;
use super::layout::{FrameLayout, BLOCK_SIZE, SLOT_COUNT};
use super::warning::{Warning, WarningKind};

/// Why a chain walk stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum AbortReason {
    /// The chain came back to a block it had already visited.
    CyclicChain { block: u8 },
    /// Pointer outside 1..=15, to block 0, or to the block itself.
    InvalidPointer { raw: u16 },
    DepthExceeded,
    /// The next block is not a middle/last block of the same family.
    UnexpectedState { block: u8 },
    /// The next block already belongs to another save.
    CrossLinked { block: u8, owner: u8 },
    /// A middle block ended the chain.
    MissingLast { block: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Terminated,
    Aborted(AbortReason),
}

impl ChainStatus {
    pub fn is_terminated(&self) -> bool {
        matches!(self, ChainStatus::Terminated)
    }
}

/// What a directory position holds once the chains are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotRole {
    Free,
    /// First block of a save, occupied or deleted.
    Save,
    /// Middle or last block reached from the save starting at `head`.
    Continuation { head: u8 },
    /// Middle or last block no chain reaches.
    Orphan,
    /// State byte not recognised.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveSlot {
    pub index: u8,
    pub entry: DirectoryEntry,
    pub role: SlotRole,
    /// Blocks making up this slot, in chain order. Empty for free,
    /// continuation and unrecognised slots.
    pub chain: Vec<u8>,
    /// Set for [`SlotRole::Save`] only.
    pub status: Option<ChainStatus>,
    pub icon: Option<Icon>,
}

impl SaveSlot {
    pub fn size_in_blocks(&self) -> usize {
        self.chain.len()
    }

    pub fn is_save(&self) -> bool {
        self.role == SlotRole::Save
    }

    pub fn is_free(&self) -> bool {
        self.role == SlotRole::Free
    }

    pub fn title(&self) -> Option<&str> {
        self.icon.as_ref().map(|icon| icon.title.as_str())
    }
}

/// Walks the chain starting at `head` and records ownership of every
/// block it consumes.
struct ChainWalker<'a> {
    entries: &'a [DirectoryEntry],
    layout: &'a FrameLayout,
    /// Owning save per block, indexed by block number.
    owner: [Option<u8>; SLOT_COUNT + 1],
}

impl<'a> ChainWalker<'a> {
    fn new(entries: &'a [DirectoryEntry], layout: &'a FrameLayout) -> Self {
        let mut owner = [None; SLOT_COUNT + 1];
        for entry in entries {
            if entry.state.is_first() {
                owner[usize::from(entry.index)] = Some(entry.index);
            }
        }
        Self {
            entries,
            layout,
            owner,
        }
    }

    fn entry(&self, block: u8) -> Option<&'a DirectoryEntry> {
        self.entries.get(usize::from(block).checked_sub(1)?)
    }

    fn walk(&mut self, head: &DirectoryEntry, warnings: &mut Vec<Warning>) -> (Vec<u8>, ChainStatus) {
        let family = head.state.family();
        let mut chain = vec![head.index];
        let mut current = head;

        let status = loop {
            if chain.len() > 1 && current.state.link() == Some(Link::Last) {
                break ChainStatus::Terminated;
            }

            let target = match self.layout.next_block(current.next_block) {
                Some(target) => target,
                None if chain.len() > 1 => {
                    warnings.push(Warning::slot(
                        head.index,
                        WarningKind::BrokenChain,
                        format!("chain ends at middle block {} with no last block", current.index),
                    ));
                    break ChainStatus::Aborted(AbortReason::MissingLast {
                        block: current.index,
                    });
                }
                None => break ChainStatus::Terminated,
            };

            let block = match u8::try_from(target) {
                Ok(block) if (1..=SLOT_COUNT as u8).contains(&block) && block != current.index => block,
                _ => {
                    warnings.push(Warning::slot(
                        head.index,
                        WarningKind::InvalidPointer,
                        format!(
                            "block {} points to 0x{:04X}, not a valid data block",
                            current.index, current.next_block
                        ),
                    ));
                    break ChainStatus::Aborted(AbortReason::InvalidPointer {
                        raw: current.next_block,
                    });
                }
            };

            match self.owner[usize::from(block)] {
                Some(owner) if owner == head.index => {
                    warnings.push(Warning::slot(
                        head.index,
                        WarningKind::CyclicChain,
                        format!("block {} leads back to block {}", current.index, block),
                    ));
                    break ChainStatus::Aborted(AbortReason::CyclicChain { block });
                }
                Some(owner) => {
                    warnings.push(Warning::slot(
                        head.index,
                        WarningKind::CrossLinked,
                        format!("block {} already belongs to slot {}", block, owner),
                    ));
                    break ChainStatus::Aborted(AbortReason::CrossLinked { block, owner });
                }
                None => {}
            }

            if chain.len() >= SLOT_COUNT {
                warnings.push(Warning::slot(
                    head.index,
                    WarningKind::ChainTooLong,
                    format!("chain exceeds {} blocks", SLOT_COUNT),
                ));
                break ChainStatus::Aborted(AbortReason::DepthExceeded);
            }

            let next = match self.entry(block) {
                Some(next) => next,
                None => break ChainStatus::Aborted(AbortReason::UnexpectedState { block }),
            };

            match next.state.classify() {
                Some((next_family, Link::Middle | Link::Last)) if Some(next_family) == family => {
                    self.owner[usize::from(block)] = Some(head.index);
                    chain.push(block);
                    current = next;
                }
                _ => {
                    warnings.push(Warning::slot(
                        head.index,
                        WarningKind::BrokenChain,
                        format!(
                            "block {} is {}, expected a middle or last block of a {} save",
                            block,
                            next.state,
                            if head.state.is_occupied() { "live" } else { "deleted" }
                        ),
                    ));
                    break ChainStatus::Aborted(AbortReason::UnexpectedState { block });
                }
            }
        };

        if status.is_terminated() {
            check_size(head, chain.len(), warnings);
        }

        debug!("Slot {}: chain {:?} -> {:?}", head.index, chain, status);
        (chain, status)
    }
}

fn check_size(head: &DirectoryEntry, blocks: usize, warnings: &mut Vec<Warning>) {
    let size = head.file_size as usize;
    if size % BLOCK_SIZE != 0 || size / BLOCK_SIZE != blocks {
        warnings.push(Warning::slot(
            head.index,
            WarningKind::SizeMismatch,
            format!(
                "declared size {} bytes does not match a chain of {} block(s)",
                head.file_size, blocks
            ),
        ));
    }
}

/// Resolve the 15 directory entries (block order 1..=15) into slots.
///
/// Always returns one slot per entry. Icons are left empty for the card
/// decoder to fill in.
pub fn resolve(
    entries: &[DirectoryEntry],
    layout: &FrameLayout,
    warnings: &mut Vec<Warning>,
) -> Vec<SaveSlot> {
    let mut walker = ChainWalker::new(entries, layout);

    let walks: Vec<Option<(Vec<u8>, ChainStatus)>> = entries
        .iter()
        .map(|entry| {
            if entry.state.is_first() {
                Some(walker.walk(entry, warnings))
            } else {
                None
            }
        })
        .collect();

    entries
        .iter()
        .zip(walks)
        .map(|(entry, walk)| {
            let (role, chain, status) = match (entry.state.link(), walk) {
                (Some(Link::First), Some((chain, status))) => (SlotRole::Save, chain, Some(status)),
                (Some(_), _) => match walker.owner[usize::from(entry.index)] {
                    Some(head) => (SlotRole::Continuation { head }, Vec::new(), None),
                    None => {
                        warnings.push(Warning::slot(
                            entry.index,
                            WarningKind::OrphanBlock,
                            format!("{} block is not reached by any save", entry.state),
                        ));
                        (SlotRole::Orphan, vec![entry.index], None)
                    }
                },
                (None, _) if entry.state.is_free() => (SlotRole::Free, Vec::new(), None),
                (None, _) => (SlotRole::Unrecognized, Vec::new(), None),
            };

            SaveSlot {
                index: entry.index,
                entry: entry.clone(),
                role,
                chain,
                status,
                icon: None,
            }
        })
        .collect()
}
