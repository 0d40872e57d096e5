//! Content fingerprints for change detection
//!
//! A fingerprint is the first 16 hex characters of the BLAKE3 digest of a
//! file's raw bytes. It only has to notice edits, so the truncation is fine.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

use rayon::prelude::*;

/// Length of a fingerprint in hex characters
pub const FINGERPRINT_LEN: usize = 16;

/// Relative path (`/`-separated) -> fingerprint
pub type FileHashes = BTreeMap<String, String>;

/// Fingerprint a file on disk.
///
/// Streams the file through the hasher, so large or binary files are fine.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let file = std::fs::File::open(path)?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut io::BufReader::new(file), &mut hasher)?;
    Ok(truncate(hasher.finalize()))
}

/// Fingerprint an in-memory buffer.
pub fn hash_bytes(bytes: &[u8]) -> String {
    truncate(blake3::hash(bytes))
}

fn truncate(hash: blake3::Hash) -> String {
    let mut hex = hash.to_hex().to_string();
    hex.truncate(FINGERPRINT_LEN);
    hex
}

/// Fingerprint every file in `files` (keys relative to `root`) in parallel.
///
/// Each worker fills its own map; the partial maps are merged at the end.
/// Files that vanish or cannot be read between discovery and hashing are
/// left out, which makes them show up as deleted.
pub fn hash_all(root: &Path, files: &BTreeSet<String>) -> FileHashes {
    let _span = tracing::debug_span!("hash_all", files = files.len()).entered();

    files
        .par_iter()
        .fold(FileHashes::new, |mut acc, rel| {
            match hash_file(&root.join(rel)) {
                Ok(fingerprint) => {
                    acc.insert(rel.clone(), fingerprint);
                }
                Err(e) => {
                    tracing::debug!(file = %rel, error = %e, "Skipping unreadable file");
                }
            }
            acc
        })
        .reduce(FileHashes::new, |mut left, right| {
            left.extend(right);
            left
        })
}
