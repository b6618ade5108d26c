//! Save title decoding.
//!
//! Titles are stored as fixed-width, zero-padded byte strings. Japanese and
//! most western releases write them in Shift-JIS, usually with full-width
//! Latin letters, so the default table folds those back to ASCII.

use serde::{Deserialize, Serialize};

/// Substituted for every byte sequence the table cannot map.
pub const PLACEHOLDER: char = char::REPLACEMENT_CHARACTER;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedTitle {
    pub text: String,
    /// At least one placeholder was substituted.
    pub undecodable: bool,
}

/// Turns raw title bytes into text. Must never fail.
pub trait TitleDecoder: Send + Sync {
    fn decode(&self, raw: &[u8]) -> DecodedTitle;
}

/// Selects a built-in table from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum TitleEncoding {
    ShiftJis {
        #[serde(default = "default_fold")]
        fold_fullwidth: bool,
    },
    Ascii,
}

fn default_fold() -> bool {
    true
}

impl Default for TitleEncoding {
    fn default() -> Self {
        TitleEncoding::ShiftJis {
            fold_fullwidth: true,
        }
    }
}

impl TitleEncoding {
    pub fn decoder(&self) -> Box<dyn TitleDecoder> {
        match *self {
            TitleEncoding::ShiftJis { fold_fullwidth } => Box::new(ShiftJisTable { fold_fullwidth }),
            TitleEncoding::Ascii => Box::new(AsciiTable),
        }
    }
}

/// Printable ASCII only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsciiTable;

impl TitleDecoder for AsciiTable {
    fn decode(&self, raw: &[u8]) -> DecodedTitle {
        let mut title = DecodedTitle::default();
        for &byte in raw.iter().take_while(|&&b| b != 0) {
            if (0x20..=0x7E).contains(&byte) {
                title.text.push(char::from(byte));
            } else {
                title.text.push(PLACEHOLDER);
                title.undecodable = true;
            }
        }
        title.text.truncate(title.text.trim_end().len());
        title
    }
}

/// Shift-JIS subset covering what save titles use in practice: ASCII,
/// half-width katakana, JIS row 1 symbols, the head of row 2, full-width
/// digits and Latin letters, hiragana, katakana and Greek.
#[derive(Debug, Clone, Copy)]
pub struct ShiftJisTable {
    pub fold_fullwidth: bool,
}

impl Default for ShiftJisTable {
    fn default() -> Self {
        Self {
            fold_fullwidth: true,
        }
    }
}

/// JIS X 0208 row 1, in Shift-JIS order from 0x8140.
const ROW1: [char; 94] = [
    '\u{3000}', '、', '。', '，', '．', '・', '：', '；', '？', '！', '゛', '゜', '´', '｀', '¨',
    '＾', '￣', '＿', 'ヽ', 'ヾ', 'ゝ', 'ゞ', '〃', '仝', '々', '〆', '〇', 'ー', '―', '‐', '／',
    '＼', '～', '∥', '｜', '…', '‥', '‘', '’', '“', '”', '（', '）', '〔', '〕', '［', '］', '｛',
    '｝', '〈', '〉', '《', '》', '「', '」', '『', '』', '【', '】', '＋', '－', '±', '×', '÷',
    '＝', '≠', '＜', '＞', '≦', '≧', '∞', '∴', '♂', '♀', '°', '′', '″', '℃', '￥', '＄', '￠',
    '￡', '％', '＃', '＆', '＊', '＠', '§', '☆', '★', '○', '●', '◎', '◇',
];

/// Leading cells of JIS row 2, from 0x819F.
const ROW2_HEAD: [char; 14] = [
    '◆', '□', '■', '△', '▲', '▽', '▼', '※', '〒', '→', '←', '↑', '↓', '〓',
];

fn is_lead(byte: u8) -> bool {
    matches!(byte, 0x81..=0x9F | 0xE0..=0xFC)
}

fn is_trail(byte: u8) -> bool {
    matches!(byte, 0x40..=0x7E | 0x80..=0xFC)
}

fn offset_char(base: u32, delta: u8) -> Option<char> {
    char::from_u32(base + u32::from(delta))
}

/// Greek capitals and smalls skip the unused final-sigma slot.
fn greek(base: u32, delta: u8) -> Option<char> {
    let delta = if delta >= 17 { delta + 1 } else { delta };
    offset_char(base, delta)
}

fn double_byte(lead: u8, trail: u8) -> Option<char> {
    match (lead, trail) {
        (0x81, 0x40..=0x7E) => ROW1.get(usize::from(trail - 0x40)).copied(),
        (0x81, 0x80..=0x9E) => ROW1.get(usize::from(trail - 0x80) + 63).copied(),
        (0x81, 0x9F..=0xAC) => ROW2_HEAD.get(usize::from(trail - 0x9F)).copied(),
        (0x81, 0xF4) => Some('♪'),
        (0x82, 0x4F..=0x58) => offset_char(0xFF10, trail - 0x4F),
        (0x82, 0x60..=0x79) => offset_char(0xFF21, trail - 0x60),
        (0x82, 0x81..=0x9A) => offset_char(0xFF41, trail - 0x81),
        (0x82, 0x9F..=0xF1) => offset_char(0x3041, trail - 0x9F),
        (0x83, 0x40..=0x7E) => offset_char(0x30A1, trail - 0x40),
        (0x83, 0x80..=0x96) => offset_char(0x30E0, trail - 0x80),
        (0x83, 0x9F..=0xB6) => greek(0x0391, trail - 0x9F),
        (0x83, 0xBF..=0xD6) => greek(0x03B1, trail - 0xBF),
        _ => None,
    }
}

/// Full-width ASCII variants and the ideographic space to plain ASCII.
fn fold(ch: char) -> char {
    match ch {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => char::from_u32(ch as u32 - 0xFF01 + 0x21).unwrap_or(ch),
        _ => ch,
    }
}

impl TitleDecoder for ShiftJisTable {
    fn decode(&self, raw: &[u8]) -> DecodedTitle {
        let mut title = DecodedTitle::default();
        let mut i = 0;

        while i < raw.len() {
            let byte = raw[i];
            let decoded = match byte {
                0x00 => break,
                0x20..=0x7E => {
                    i += 1;
                    Some(char::from(byte))
                }
                0xA1..=0xDF => {
                    i += 1;
                    offset_char(0xFF61, byte - 0xA1)
                }
                lead if is_lead(lead) => match raw.get(i + 1) {
                    Some(&trail) if is_trail(trail) => {
                        i += 2;
                        double_byte(lead, trail)
                    }
                    // A bad trail byte may start the next character.
                    _ => {
                        i += 1;
                        None
                    }
                },
                _ => {
                    i += 1;
                    None
                }
            };

            match decoded {
                Some(ch) if self.fold_fullwidth => title.text.push(fold(ch)),
                Some(ch) => title.text.push(ch),
                None => {
                    title.text.push(PLACEHOLDER);
                    title.undecodable = true;
                }
            }
        }

        title.text.truncate(title.text.trim_end().len());
        title
    }
}
