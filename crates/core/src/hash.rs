use std::fmt::Display;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Derive the destination document identifier for a content type and a
/// natural key from the source system.
///
/// The identifier is the hex SHA-256 of `"{content_type}:{key}"`, so it is
/// stable across runs: re-importing an unchanged library overwrites the
/// same documents instead of creating new ones.
pub fn derive_ouuid(content_type: &str, natural_key: impl Display) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content_type.as_bytes());
    hasher.update(b":");
    hasher.update(natural_key.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 hash of a file's contents using streaming I/O.
/// Reads in 64KB chunks to avoid loading large files entirely into memory.
pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::with_capacity(64 * 1024, file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
