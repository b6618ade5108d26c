use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::memcard::layout::{FrameLayout, IconLayout};
use crate::memcard::title::TitleEncoding;

/// Decoder settings. Every field has a default, so a config file only
/// needs to name what it changes:
///
/// ```toml
/// [frame]
/// size_offset = 4
/// next_offset = 8
/// next_block_base = 1
///
/// [title]
/// encoding = "ascii"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub frame: FrameLayout,
    pub icon: IconLayout,
    pub title: TitleEncoding,
}

impl DecoderConfig {
    /// Layout used by cards the console BIOS wrote.
    pub fn retail() -> Self {
        Self {
            frame: FrameLayout::retail(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded decoder config from {:?}", path);
        Ok(config)
    }

    /// `<config dir>/config.toml` for this application, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cardreader", "cardreader")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Explicit path if given (must exist), else the default path if a file
    /// is there, else built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }
}
