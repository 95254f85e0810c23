use crate::error::CacheResult;

/// Synchronous string-keyed persistence, scoped to one application instance.
///
/// This is the browser `localStorage` contract: values are opaque strings and
/// the store never interprets them.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Create or replace a value.
    fn set(&self, key: &str, value: &str) -> CacheResult<()>;

    /// Remove a value. Returns `true` if the key existed.
    fn remove(&self, key: &str) -> CacheResult<bool>;
}
