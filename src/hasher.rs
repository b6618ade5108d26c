use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::debug;

/// SHA-256 of a card image, lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Read a card image from disk.
pub fn read_image(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    debug!("Read {} bytes from {:?}, sha256 {}", data.len(), path, &hash_bytes(&data)[..8]);
    Ok(data)
}
