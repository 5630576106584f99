//! Content digests used by file commands.
//!
//! Inline writes name their temporary file after the SHA-256 of the content;
//! source transfers announce the SHA-1 of the local file before streaming it.

use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;

/// Computes the lower-case hex SHA-256 of the given bytes.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Streams a local file through SHA-1 and returns its lower-case hex digest.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn file_sha1_hex(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
