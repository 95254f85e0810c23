//! Local cache of blob records for md2walrus.
//!
//! The ledger is the source of truth for which documents an address owns, but
//! listing it is slow and it does not surface file contents. This crate keeps
//! a fast, content-capable mirror keyed by blob identifier.
//!
//! # Storage Backends
//!
//! The cache sits on a [`KeyValueStore`], a synchronous string-keyed store
//! scoped to one application instance:
//!
//! - [`InMemoryKvStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileKvStore`] -- one file per key under a directory
//!
//! # Design Rules
//!
//! 1. The cache never overrides chain state; chain refreshes win on every
//!    field except locally held `content`.
//! 2. Reads fail soft: an empty, missing, or corrupted store reads as an
//!    empty collection.
//! 3. Writes report errors but callers treat them as best-effort.

pub mod cache;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use cache::{LocalCache, DEFAULT_STORAGE_KEY};
pub use error::{CacheError, CacheResult};
pub use file::FileKvStore;
pub use memory::InMemoryKvStore;
pub use traits::KeyValueStore;
