//! Storage location selection for the disk tier.
//!
//! The cache never queries the platform for directories. Callers inject a
//! [`DirectoryResolver`] that turns a [`StorageLocation`] preference into a
//! root path; the cache then lays out `<root>/cachefu/<sanitized-name>/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the storage root that holds every cache.
pub const CACHE_ROOT_DIR: &str = "cachefu";

/// Where the caller would like the disk tier to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageLocation {
    /// Application-private cache directory. May be wiped by the platform.
    #[default]
    Internal,
    /// External or removable storage. Must be managed by the application.
    External,
}

/// Resolves a storage preference to a root directory.
pub trait DirectoryResolver {
    /// Root directory for the requested location, or `None` if no usable
    /// root exists.
    fn resolve(&self, location: StorageLocation) -> Option<PathBuf>;
}

/// Resolver that always answers with the same root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedRoot(pub PathBuf);

impl FixedRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }
}

impl DirectoryResolver for FixedRoot {
    fn resolve(&self, _location: StorageLocation) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Internal root plus an optional external root.
///
/// `External` resolves to the external root when one is mounted and falls
/// back to the internal root otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRoots {
    pub internal: PathBuf,
    pub external: Option<PathBuf>,
}

impl PlatformRoots {
    pub fn new(internal: impl Into<PathBuf>) -> Self {
        Self {
            internal: internal.into(),
            external: None,
        }
    }

    pub fn with_external(mut self, external: impl Into<PathBuf>) -> Self {
        self.external = Some(external.into());
        self
    }
}

impl DirectoryResolver for PlatformRoots {
    fn resolve(&self, location: StorageLocation) -> Option<PathBuf> {
        match location {
            StorageLocation::External => self
                .external
                .clone()
                .or_else(|| Some(self.internal.clone())),
            StorageLocation::Internal => Some(self.internal.clone()),
        }
    }
}

/// Turn a cache name into a single safe path component.
///
/// Whitespace is dropped, CamelCase and letter/digit boundaries become
/// underscores, the result is lowercased, and anything outside
/// `[a-z0-9_-]` becomes `_`.
///
/// ```
/// use cachefu_core::sanitize_cache_name;
///
/// assert_eq!(sanitize_cache_name("Remote ImageCache"), "remote_image_cache");
/// ```
pub fn sanitize_cache_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = String::with_capacity(chars.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            out.push('_');
            continue;
        }

        if i > 0 && c.is_ascii_alphanumeric() {
            let prev = chars[i - 1];
            let next = chars.get(i + 1).copied();
            let boundary = (c.is_ascii_uppercase()
                && (prev.is_ascii_lowercase() || prev.is_ascii_digit()))
                || (c.is_ascii_uppercase()
                    && prev.is_ascii_uppercase()
                    && next.is_some_and(|n| n.is_ascii_lowercase()))
                || (c.is_ascii_digit() && prev.is_ascii_alphabetic())
                || (c.is_ascii_alphabetic() && prev.is_ascii_digit());
            if boundary {
                out.push('_');
            }
        }

        out.push(c.to_ascii_lowercase());
    }

    out
}

/// Disk directory for a cache named `name` under `root`.
pub fn cache_directory(root: &Path, name: &str) -> PathBuf {
    root.join(CACHE_ROOT_DIR).join(sanitize_cache_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_camel_case() {
        assert_eq!(sanitize_cache_name("ImageCache"), "image_cache");
        assert_eq!(sanitize_cache_name("HTTPResponses"), "http_responses");
        assert_eq!(sanitize_cache_name("my_cache"), "my_cache");
    }

    #[test]
    fn test_sanitize_strips_whitespace() {
        assert_eq!(sanitize_cache_name("remote images"), "remoteimages");
        assert_eq!(sanitize_cache_name(" \tthumbs\n"), "thumbs");
    }

    #[test]
    fn test_sanitize_digits_and_separators() {
        assert_eq!(sanitize_cache_name("thumbs2"), "thumbs_2");
        assert_eq!(sanitize_cache_name("a/b"), "a_b");
        assert_eq!(sanitize_cache_name(".."), "__");
    }

    #[test]
    fn test_cache_directory_layout() {
        let dir = cache_directory(Path::new("/data/app"), "ImageCache");
        assert_eq!(dir, PathBuf::from("/data/app/cachefu/image_cache"));
    }

    #[test]
    fn test_platform_roots_fall_back_to_internal() {
        let roots = PlatformRoots::new("/data/internal");
        assert_eq!(
            roots.resolve(StorageLocation::External),
            Some(PathBuf::from("/data/internal"))
        );

        let roots = roots.with_external("/mnt/sdcard");
        assert_eq!(
            roots.resolve(StorageLocation::External),
            Some(PathBuf::from("/mnt/sdcard"))
        );
        assert_eq!(
            roots.resolve(StorageLocation::Internal),
            Some(PathBuf::from("/data/internal"))
        );
    }

    #[test]
    fn test_fixed_root_ignores_preference() {
        let root = FixedRoot::new("/tmp/x");
        assert_eq!(root.resolve(StorageLocation::External), Some(PathBuf::from("/tmp/x")));
        assert_eq!(root.resolve(StorageLocation::Internal), Some(PathBuf::from("/tmp/x")));
    }
}
