//! cachefu Core - Types and Collaborator Contracts
//!
//! Pure types with no cache orchestration. The storage crate depends on this
//! for its error taxonomy, configuration, and the three collaborators a cache
//! is built from:
//!
//! - [`Codec`]: value <-> bytes for the disk tier
//! - [`KeyNamer`]: key -> file name for the disk tier
//! - [`DirectoryResolver`]: storage preference -> root directory

pub mod codec;
pub mod config;
pub mod error;
pub mod location;
pub mod naming;

pub use codec::{BytesCodec, Codec, FnCodec, JsonCodec};
pub use config::CacheConfig;
pub use error::{CacheError, CacheResult, CodecError, ConfigError, DiskError};
pub use location::{
    cache_directory, sanitize_cache_name, DirectoryResolver, FixedRoot, PlatformRoots,
    StorageLocation, CACHE_ROOT_DIR,
};
pub use naming::{validate_file_name, FnKeyNamer, KeyNamer, Sha256KeyNamer, MAX_FILE_NAME_LEN};
