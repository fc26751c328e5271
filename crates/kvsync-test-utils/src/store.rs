//! [`ScriptedStore`] double for engine tests.
//!
//! Wraps a [`MemoryStore`], records every call, and can make conditional
//! operations lose their race a set number of times, either by refusing
//! them outright or by letting a simulated concurrent writer touch the key
//! first.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use kvsync_store::{KvStore, MemoryStore, ModifyIndex, Result, StoreEntry};

/// Pass to the `*_times` builders to fail forever.
pub const ALWAYS: usize = usize::MAX;

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(String),
    Get(String),
    Put(String),
    Cas(String),
    Delete(String),
}

impl Call {
    pub fn key(&self) -> &str {
        match self {
            Self::List(k) | Self::Get(k) | Self::Put(k) | Self::Cas(k) | Self::Delete(k) => k,
        }
    }

    /// Whether the call mutates (or tries to mutate) the store.
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Put(_) | Self::Cas(_) | Self::Delete(_))
    }
}

/// Store double with call recording and scripted contention.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    inner: MemoryStore,
    calls: Mutex<Vec<Call>>,
    refused_cas: AtomicUsize,
    refused_deletes: AtomicUsize,
    raced_cas: AtomicUsize,
    raced_deletes: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Answer the next `times` compare-and-swap calls with `false`
    /// without touching the store.
    pub fn refuse_cas_times(self, times: usize) -> Self {
        self.refused_cas.store(times, Ordering::SeqCst);
        self
    }

    /// Answer the next `times` compare-and-delete calls with `false`
    /// without touching the store.
    pub fn refuse_delete_times(self, times: usize) -> Self {
        self.refused_deletes.store(times, Ordering::SeqCst);
        self
    }

    /// Before each of the next `times` compare-and-swap calls, a concurrent
    /// writer overwrites the key so the caller's version goes stale.
    pub fn race_cas_times(self, times: usize) -> Self {
        self.raced_cas.store(times, Ordering::SeqCst);
        self
    }

    /// Before each of the next `times` compare-and-delete calls, a
    /// concurrent writer rewrites the key so the caller's version goes stale.
    pub fn race_delete_times(self, times: usize) -> Self {
        self.raced_deletes.store(times, Ordering::SeqCst);
        self
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of write calls (put, cas, delete) that targeted `key`.
    pub fn writes_to(&self, key: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.is_write() && call.key() == key)
            .count()
    }

    /// Number of calls equal to `call`.
    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).push(call);
    }

    fn interfere(&self, key: &str) -> Result<()> {
        let current = self.inner.get(key)?;
        let mut value = current.map(|entry| entry.value).unwrap_or_default();
        value.extend_from_slice(b"+concurrent");
        self.inner.put(key, &value)?;
        Ok(())
    }
}

fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| match n {
            0 => None,
            ALWAYS => Some(ALWAYS),
            n => Some(n - 1),
        })
        .is_ok()
}

impl KvStore for ScriptedStore {
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>> {
        self.record(Call::List(prefix.to_string()));
        self.inner.list(prefix)
    }

    fn get(&self, key: &str) -> Result<Option<StoreEntry>> {
        self.record(Call::Get(key.to_string()));
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex> {
        self.record(Call::Put(key.to_string()));
        self.inner.put(key, value)
    }

    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool> {
        self.record(Call::Cas(key.to_string()));
        if take(&self.refused_cas) {
            return Ok(false);
        }
        if take(&self.raced_cas) {
            self.interfere(key)?;
        }
        self.inner.compare_and_swap(key, value, expected)
    }

    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool> {
        self.record(Call::Delete(key.to_string()));
        if take(&self.refused_deletes) {
            return Ok(false);
        }
        if take(&self.raced_deletes) {
            self.interfere(key)?;
        }
        self.inner.compare_and_delete(key, expected)
    }
}
