//! File-per-key disk tier.
//!
//! Layout is `<root>/cachefu/<sanitized-name>/<file_name(key)>`, file content
//! is exactly the codec's bytes for the value. Writes go to a dot-prefixed
//! temporary file in the same directory and are renamed over the target, so a
//! reader sees either the old complete file or the new complete file.
//!
//! Once enabled, the directory is not re-validated per call. While disabled,
//! every operation is a no-op that reports absence.

use std::fmt;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use cachefu_core::{
    cache_directory, validate_file_name, CacheResult, Codec, DiskError, KeyNamer,
};
use chrono::{DateTime, Utc};

const TEMP_PREFIX: &str = ".tmp-";
const PROBE_PREFIX: &str = ".probe-";

/// Durable write-through store, one file per key.
pub struct DiskTier<K, V, C, N> {
    name: String,
    directory: Option<PathBuf>,
    codec: C,
    namer: N,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, C, N> fmt::Debug for DiskTier<K, V, C, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiskTier")
            .field("name", &self.name)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl<K, V, C, N> DiskTier<K, V, C, N>
where
    C: Codec<V>,
    N: KeyNamer<K>,
{
    /// Create a disabled disk tier for the named cache.
    pub fn new(name: impl Into<String>, codec: C, namer: N) -> Self {
        Self {
            name: name.into(),
            directory: None,
            codec,
            namer,
            _marker: PhantomData,
        }
    }

    /// Create `<root>/cachefu/<sanitized-name>/` and check it is writable.
    ///
    /// On success the tier is enabled and the directory is returned. On
    /// failure the tier is disabled, even if an earlier call enabled it.
    pub fn enable(&mut self, root: &Path) -> CacheResult<&Path> {
        self.directory = None;
        let dir = cache_directory(root, &self.name);

        fs::create_dir_all(&dir).map_err(|e| DiskError::DirectoryUnavailable {
            path: dir.clone(),
            reason: e.to_string(),
        })?;

        if !dir.is_dir() {
            return Err(DiskError::DirectoryUnavailable {
                path: dir,
                reason: "not a directory".to_string(),
            }
            .into());
        }

        // Probe file is removed when dropped.
        tempfile::Builder::new()
            .prefix(PROBE_PREFIX)
            .tempfile_in(&dir)
            .map_err(|e| DiskError::DirectoryUnavailable {
                path: dir.clone(),
                reason: format!("directory is not writable: {e}"),
            })?;

        Ok(self.directory.insert(dir).as_path())
    }

    /// Turn the tier off. Files already on disk are left in place.
    pub fn disable(&mut self) {
        self.directory = None;
    }

    pub fn is_enabled(&self) -> bool {
        self.directory.is_some()
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the file holding `key`, if enabled.
    pub fn file_path(&self, key: &K) -> CacheResult<PathBuf> {
        let dir = self.directory.as_ref().ok_or(DiskError::Disabled)?;
        let file_name = self.namer.file_name(key);
        validate_file_name(&file_name)?;
        Ok(dir.join(file_name))
    }

    /// Encode `value` and atomically replace the file for `key`.
    pub fn write(&self, key: &K, value: &V) -> CacheResult<()> {
        let Some(dir) = self.directory.as_deref() else {
            return Ok(());
        };
        let path = self.file_path(key)?;
        let bytes = self.codec.encode(value)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| DiskError::io(dir, "create temp file", &e))?;
        tmp.write_all(&bytes)
            .and_then(|()| tmp.flush())
            .map_err(|e| DiskError::io(tmp.path(), "write", &e))?;
        tmp.persist(&path)
            .map_err(|e| DiskError::io(&path, "rename into place", &e.error))?;

        Ok(())
    }

    /// Read and decode the value for `key`.
    ///
    /// Returns the value with the file's modification time, or `None` when no
    /// file exists. Decoding failures are `CacheError::Codec`.
    pub fn read(&self, key: &K) -> CacheResult<Option<(V, DateTime<Utc>)>> {
        if self.directory.is_none() {
            return Ok(None);
        }
        let path = self.file_path(key)?;

        let mut file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DiskError::io(&path, "open", &e).into()),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| DiskError::io(&path, "read", &e))?;

        let modified_at = file
            .metadata()
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        let value = self.codec.decode(&bytes)?;
        Ok(Some((value, modified_at)))
    }

    /// Whether a file exists for `key`. False when disabled or unnameable.
    pub fn exists(&self, key: &K) -> bool {
        self.directory.is_some()
            && self
                .file_path(key)
                .map(|path| path.is_file())
                .unwrap_or(false)
    }

    /// Delete the file for `key`. Returns whether a file was removed.
    pub fn remove(&self, key: &K) -> CacheResult<bool> {
        if self.directory.is_none() {
            return Ok(false);
        }
        let path = self.file_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DiskError::io(&path, "remove", &e).into()),
        }
    }

    /// Delete every file in the cache directory, returning how many went.
    ///
    /// Files that cannot be deleted are logged and skipped.
    pub fn clear(&self) -> CacheResult<u64> {
        let Some(dir) = self.directory.as_deref() else {
            return Ok(0);
        };

        let entries = fs::read_dir(dir).map_err(|e| DiskError::io(dir, "list", &e))?;
        let mut removed = 0u64;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    tracing::warn!(cache = %self.name, error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        cache = %self.name,
                        path = %path.display(),
                        error = %e,
                        "failed to delete cache file"
                    );
                }
            }
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachefu_core::{
        BytesCodec, CacheError, CodecError, FnKeyNamer, JsonCodec, Sha256KeyNamer,
    };
    use tempfile::TempDir;

    type JsonTier = DiskTier<String, String, JsonCodec<String>, Sha256KeyNamer>;

    fn enabled_tier() -> (JsonTier, TempDir) {
        let temp_dir = TempDir::new().expect("TempDir creation should succeed");
        let mut tier = DiskTier::new("TestCache", JsonCodec::new(), Sha256KeyNamer);
        tier.enable(temp_dir.path()).expect("enable should succeed");
        (tier, temp_dir)
    }

    #[test]
    fn test_enable_creates_namespaced_directory() {
        let (tier, temp_dir) = enabled_tier();
        let expected = temp_dir.path().join("cachefu").join("test_cache");
        assert_eq!(tier.directory(), Some(expected.as_path()));
        assert!(expected.is_dir());
        // Probe file must not linger.
        assert_eq!(fs::read_dir(&expected).unwrap().count(), 0);
    }

    #[test]
    fn test_enable_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        let mut tier: JsonTier = DiskTier::new("c", JsonCodec::new(), Sha256KeyNamer);
        let err = tier.enable(&blocker).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Disk(DiskError::DirectoryUnavailable { .. })
        ));
        assert!(!tier.is_enabled());
    }

    #[test]
    fn test_failed_reenable_disables_tier() {
        let (mut tier, temp_dir) = enabled_tier();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, b"x").unwrap();

        assert!(tier.enable(&blocker).is_err());
        assert!(!tier.is_enabled());
        assert!(tier.directory().is_none());

        let key = "k".to_string();
        assert!(tier.write(&key, &"v".to_string()).is_ok());
        assert!(!tier.exists(&key));
    }

    #[test]
    fn test_debug_omits_collaborators() {
        let (tier, _temp_dir) = enabled_tier();
        let debug = format!("{tier:?}");
        assert!(debug.starts_with("DiskTier"));
        assert!(debug.contains("TestCache"));
        assert!(!debug.contains("JsonCodec"));
    }

    #[test]
    fn test_write_then_read() {
        let (tier, _temp_dir) = enabled_tier();
        let key = "user:42".to_string();
        tier.write(&key, &"avatar".to_string()).unwrap();

        assert!(tier.exists(&key));
        let (value, _modified) = tier.read(&key).unwrap().expect("file should exist");
        assert_eq!(value, "avatar");
    }

    #[test]
    fn test_file_content_is_raw_codec_bytes() {
        let temp_dir = TempDir::new().unwrap();
        let mut tier: DiskTier<String, Vec<u8>, _, _> =
            DiskTier::new("raw", BytesCodec, FnKeyNamer::new(|k: &String| k.clone()));
        tier.enable(temp_dir.path()).unwrap();

        tier.write(&"blob".to_string(), &vec![0xCA, 0xFE]).unwrap();
        let on_disk = fs::read(temp_dir.path().join("cachefu/raw/blob")).unwrap();
        assert_eq!(on_disk, vec![0xCA, 0xFE]);
    }

    #[test]
    fn test_overwrite_replaces_file_and_leaves_no_temp_files() {
        let (tier, _temp_dir) = enabled_tier();
        let key = "k".to_string();
        tier.write(&key, &"first".to_string()).unwrap();
        tier.write(&key, &"second value".to_string()).unwrap();

        let (value, _) = tier.read(&key).unwrap().unwrap();
        assert_eq!(value, "second value");

        let names: Vec<_> = fs::read_dir(tier.directory().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_read_missing_is_none() {
        let (tier, _temp_dir) = enabled_tier();
        assert!(tier.read(&"missing".to_string()).unwrap().is_none());
        assert!(!tier.exists(&"missing".to_string()));
    }

    #[test]
    fn test_truncated_file_is_decode_error() {
        let (tier, _temp_dir) = enabled_tier();
        let key = "k".to_string();
        tier.write(&key, &"a fairly long value".to_string()).unwrap();

        let path = tier.file_path(&key).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        let err = tier.read(&key).unwrap_err();
        assert!(matches!(err, CacheError::Codec(CodecError::Decode { .. })));
    }

    #[test]
    fn test_remove_reports_presence() {
        let (tier, _temp_dir) = enabled_tier();
        let key = "k".to_string();
        tier.write(&key, &"v".to_string()).unwrap();
        assert!(tier.remove(&key).unwrap());
        assert!(!tier.remove(&key).unwrap());
        assert!(!tier.exists(&key));
    }

    #[test]
    fn test_clear_deletes_every_file() {
        let (tier, _temp_dir) = enabled_tier();
        for i in 0..5 {
            tier.write(&format!("k{i}"), &format!("v{i}")).unwrap();
        }
        assert_eq!(tier.clear().unwrap(), 5);
        assert!(!tier.exists(&"k0".to_string()));
        assert_eq!(tier.clear().unwrap(), 0);
    }

    #[test]
    fn test_disabled_tier_is_noop() {
        let tier: JsonTier = DiskTier::new("off", JsonCodec::new(), Sha256KeyNamer);
        let key = "k".to_string();
        assert!(tier.write(&key, &"v".to_string()).is_ok());
        assert!(tier.read(&key).unwrap().is_none());
        assert!(!tier.exists(&key));
        assert!(!tier.remove(&key).unwrap());
        assert_eq!(tier.clear().unwrap(), 0);
        assert!(matches!(
            tier.file_path(&key),
            Err(CacheError::Disk(DiskError::Disabled))
        ));
    }

    #[test]
    fn test_unsafe_file_name_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut tier: DiskTier<String, String, _, _> = DiskTier::new(
            "c",
            JsonCodec::new(),
            FnKeyNamer::new(|k: &String| k.clone()),
        );
        tier.enable(temp_dir.path()).unwrap();

        let err = tier.write(&"../escape".to_string(), &"v".to_string()).unwrap_err();
        assert!(matches!(
            err,
            CacheError::Disk(DiskError::InvalidFileName { .. })
        ));
        assert!(!temp_dir.path().join("cachefu/escape").exists());
    }
}
