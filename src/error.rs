use std::path::PathBuf;
use thiserror::Error;

/// Fatal decode failures. Everything else is reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("memory card image is {actual} bytes, expected exactly {expected}")]
    InvalidLength { actual: usize, expected: usize },

    #[error("header magic is {found:02X?}, expected \"MC\"; not a memory card image")]
    BadMagic { found: [u8; 2] },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
