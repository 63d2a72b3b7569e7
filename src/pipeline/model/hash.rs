use std::path::Path;

use sha2::{Digest, Sha256};

use super::ModelError;

/// Hex SHA-256 of artifact bytes.
pub fn fingerprint(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    format!("{hash:x}")
}

/// Hex SHA-256 of an artifact file.
pub fn file_fingerprint(path: &Path) -> Result<String, ModelError> {
    let content = std::fs::read(path)?;
    Ok(fingerprint(&content))
}
