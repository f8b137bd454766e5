//! cachefu Storage - Memory Tier, Disk Tier and the Two-Tier Engine
//!
//! [`TwoTierCache`] fronts a bounded, expiring [`MemoryTier`] with an optional
//! file-per-key [`DiskTier`]. Reads fall through memory to disk and promote
//! disk hits; writes go to disk first, then memory.
//!
//! The collaborator contracts (codec, key namer, directory resolver) and the
//! error taxonomy live in `cachefu-core` and are re-exported here.

pub mod disk;
pub mod engine;
pub mod memory;
pub mod read;
pub mod stats;

pub use disk::DiskTier;
pub use engine::TwoTierCache;
pub use memory::MemoryTier;
pub use read::{CacheRead, Tier};
pub use stats::CacheStats;

// Re-export core types so most callers only need this crate
pub use cachefu_core::{
    BytesCodec, CacheConfig, CacheError, CacheResult, Codec, CodecError, ConfigError,
    DirectoryResolver, DiskError, FixedRoot, FnCodec, FnKeyNamer, JsonCodec, KeyNamer,
    PlatformRoots, Sha256KeyNamer, StorageLocation,
};
