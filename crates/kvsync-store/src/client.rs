//! The store contract consumed by the reconciliation engine

use crate::{ModifyIndex, Result, StoreEntry};

/// Capability set the engine needs from a key-value store.
///
/// Implementations provide last-write-wins versioning per key and atomic
/// compare-and-swap at the granularity of one key. Methods take `&self`;
/// stores that mutate in-process state use interior mutability.
pub trait KvStore {
    /// Every entry whose key starts with `prefix`, in key order.
    ///
    /// Directory markers are returned as-is; callers filter them.
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>>;

    /// The entry stored at exactly `key`, if any.
    fn get(&self, key: &str) -> Result<Option<StoreEntry>>;

    /// Unconditionally create or overwrite `key`, returning its new version.
    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex>;

    /// Write `value` only if `key` is still at `expected`.
    ///
    /// `Ok(false)` means another writer got there first.
    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool>;

    /// Delete `key` only if it is still at `expected`.
    ///
    /// Deleting a key that is already gone succeeds, as it does on Consul.
    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool>;
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> Result<Option<StoreEntry>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex> {
        (**self).put(key, value)
    }

    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool> {
        (**self).compare_and_swap(key, value, expected)
    }

    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool> {
        (**self).compare_and_delete(key, expected)
    }
}

impl<S: KvStore + ?Sized> KvStore for Box<S> {
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>> {
        (**self).list(prefix)
    }

    fn get(&self, key: &str) -> Result<Option<StoreEntry>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex> {
        (**self).put(key, value)
    }

    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool> {
        (**self).compare_and_swap(key, value, expected)
    }

    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool> {
        (**self).compare_and_delete(key, expected)
    }
}
