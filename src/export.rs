use anyhow::{Context, Result};
use image::{ImageBuffer, Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::memcard::layout::{ICON_HEIGHT, ICON_WIDTH};
use crate::memcard::{DecodedCard, Icon};

/// Frame `n` of an icon as a 16x16 RGBA image.
pub fn frame_image(icon: &Icon, n: usize) -> Option<RgbaImage> {
    let pixels = icon.frame_rgba(n)?;
    Some(ImageBuffer::from_fn(
        ICON_WIDTH as u32,
        ICON_HEIGHT as u32,
        |x, y| Rgba(pixels[y as usize * ICON_WIDTH + x as usize]),
    ))
}

/// Write every icon frame of every live save as
/// `slot<NN>_<product code>_<frame>.png`. Returns the written paths.
pub fn export_icons(card: &DecodedCard, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    let mut written = Vec::new();
    for slot in card.live_saves() {
        let Some(icon) = slot.icon.as_ref() else {
            continue;
        };

        let code: String = slot
            .entry
            .product_code
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();

        for n in 0..icon.frames.len() {
            let Some(image) = frame_image(icon, n) else {
                continue;
            };
            let path = dir.join(format!("slot{:02}_{}_{}.png", slot.index, code, n));
            image
                .save(&path)
                .with_context(|| format!("Failed to write icon {:?}", path))?;
            written.push(path);
        }
    }

    info!("Exported {} icon frames to {:?}", written.len(), dir);
    Ok(written)
}
