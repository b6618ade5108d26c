use serde::Serialize;
use std::fmt;

/// Which part of the card produced a warning.
///
/// Ordering puts the header first, then slots by index, which is the order
/// warnings are returned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningSource {
    Header,
    Slot(u8),
}

impl fmt::Display for WarningSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningSource::Header => write!(f, "header"),
            WarningSource::Slot(index) => write!(f, "slot {}", index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    ChecksumMismatch,
    UnknownState,
    CyclicChain,
    InvalidPointer,
    ChainTooLong,
    BrokenChain,
    CrossLinked,
    OrphanBlock,
    SizeMismatch,
    IconMagicMismatch,
    IconTruncated,
    UnknownIconFlag,
    UndecodableTitle,
}

impl WarningKind {
    pub fn label(&self) -> &'static str {
        match self {
            WarningKind::ChecksumMismatch => "checksum mismatch",
            WarningKind::UnknownState => "unknown state",
            WarningKind::CyclicChain => "cyclic chain",
            WarningKind::InvalidPointer => "invalid pointer",
            WarningKind::ChainTooLong => "chain too long",
            WarningKind::BrokenChain => "broken chain",
            WarningKind::CrossLinked => "cross-linked block",
            WarningKind::OrphanBlock => "orphan block",
            WarningKind::SizeMismatch => "size mismatch",
            WarningKind::IconMagicMismatch => "icon magic mismatch",
            WarningKind::IconTruncated => "truncated icon",
            WarningKind::UnknownIconFlag => "unknown icon flag",
            WarningKind::UndecodableTitle => "undecodable title",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A non-fatal anomaly found while decoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub source: WarningSource,
    pub kind: WarningKind,
    pub description: String,
}

impl Warning {
    pub fn new(source: WarningSource, kind: WarningKind, description: impl Into<String>) -> Self {
        Self {
            source,
            kind,
            description: description.into(),
        }
    }

    pub fn slot(index: u8, kind: WarningKind, description: impl Into<String>) -> Self {
        Self::new(WarningSource::Slot(index), kind, description)
    }

    /// Slot index this warning is attached to, if any.
    pub fn slot_index(&self) -> Option<u8> {
        match self.source {
            WarningSource::Slot(index) => Some(index),
            WarningSource::Header => None,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.source, self.kind, self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_ordering() {
        let mut sources = vec![
            WarningSource::Slot(3),
            WarningSource::Slot(12),
            WarningSource::Slot(1),
            WarningSource::Header,
        ];
        sources.sort();
        assert_eq!(
            sources,
            vec![
                WarningSource::Header,
                WarningSource::Slot(1),
                WarningSource::Slot(3),
                WarningSource::Slot(12),
            ]
        );
    }

    #[test]
    fn test_display() {
        let warning = Warning::slot(4, WarningKind::CyclicChain, "block 2 revisited");
        assert_eq!(warning.to_string(), "[slot 4] cyclic chain: block 2 revisited");
        assert_eq!(warning.slot_index(), Some(4));
    }
}
