//! bucketfs-core: filesystem-style paths over S3-compatible object storage
//!
//! This crate provides:
//! - Path parsing and classification ([`PathMatch`])
//! - The [`ObjectStore`] trait, the only boundary to a store
//! - The virtual directory engine ([`VirtualFs`])
//! - An in-memory store ([`MemoryStore`])
//! - Alias and configuration management
//!
//! Nothing here depends on a particular S3 SDK; see `bucketfs-s3` for the
//! network-backed store.

pub mod alias;
pub mod config;
pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod path;
pub mod traits;

pub use alias::{Alias, AliasManager, BucketLookup, RetryConfig, TimeoutConfig};
pub use config::{Config, ConfigManager};
pub use error::{Error, Result};
pub use fs::VirtualFs;
pub use memory::MemoryStore;
pub use object::{ObjectData, ObjectKind};
pub use path::{PathMatch, ROOT, require_directory, require_file};
pub use traits::{ListFilter, ObjectInfo, ObjectStore, PresignMethod, PutOptions};
