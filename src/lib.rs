//! Reads PlayStation memory card images into a slot directory with save
//! chains, icons and titles, plus a list of integrity warnings.

pub mod config;
pub mod error;
pub mod export;
pub mod hasher;
pub mod memcard;
pub mod report;

pub use config::DecoderConfig;
pub use error::{ConfigError, FormatError};
pub use memcard::{decode_card, CardDecoder, DecodedCard};
