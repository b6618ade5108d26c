//! Decoder for 128 KiB PlayStation memory card images.
//!
//! Block 0 holds a header frame and 15 directory frames, one per data
//! block. Saves span one or more data blocks linked through the directory;
//! the first block of each save starts with an icon header and title.

pub mod card;
pub mod directory;
pub mod frame;
pub mod icon;
pub mod layout;
pub mod title;
pub mod warning;

pub use card::{decode_card, CardDecoder, CardImage, DecodedCard};
pub use directory::{AbortReason, ChainStatus, SaveSlot, SlotRole};
pub use frame::{BlockState, DirectoryEntry, HeaderFrame, Region};
pub use icon::{Bitmap, Color15, Icon};
pub use title::{AsciiTable, DecodedTitle, ShiftJisTable, TitleDecoder, TitleEncoding};
pub use warning::{Warning, WarningKind, WarningSource};
