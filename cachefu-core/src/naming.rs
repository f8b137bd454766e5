//! Key-to-file-name mapping for the disk tier.

use crate::DiskError;
use sha2::{Digest, Sha256};
use std::fmt;

/// Longest file name accepted by common filesystems.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Maps a cache key to the name of its file inside the cache directory.
///
/// Implementations must be deterministic: the same key always yields the same
/// name, across processes. The result must be a single path component.
pub trait KeyNamer<K>: Send + Sync {
    fn file_name(&self, key: &K) -> String;
}

/// Names files by the hex SHA-256 digest of the key's `Display` form.
///
/// Always 64 lowercase hex characters, so every key is filesystem-safe
/// regardless of its content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256KeyNamer;

impl<K: fmt::Display> KeyNamer<K> for Sha256KeyNamer {
    fn file_name(&self, key: &K) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Key namer built from a closure.
pub struct FnKeyNamer<F> {
    f: F,
}

impl<F> FnKeyNamer<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnKeyNamer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnKeyNamer")
    }
}

impl<K, F> KeyNamer<K> for FnKeyNamer<F>
where
    F: Fn(&K) -> String + Send + Sync,
{
    fn file_name(&self, key: &K) -> String {
        (self.f)(key)
    }
}

/// Check that a namer result is usable as a cache file name.
///
/// Leading dots are reserved for in-flight temporary files.
pub fn validate_file_name(name: &str) -> Result<(), DiskError> {
    let reject = |reason: &str| {
        Err(DiskError::InvalidFileName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > MAX_FILE_NAME_LEN {
        return reject("name exceeds 255 bytes");
    }
    if name.contains(['/', '\\']) {
        return reject("name contains a path separator");
    }
    if name.contains('\0') {
        return reject("name contains a NUL byte");
    }
    if name.starts_with('.') {
        return reject("name starts with '.'");
    }
    Ok(())
}
