//! In-process key-value store

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{KvStore, ModifyIndex, Result, StoreEntry};

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, (Vec<u8>, ModifyIndex)>,
    last_index: u64,
}

impl State {
    fn write(&mut self, key: &str, value: &[u8]) -> ModifyIndex {
        self.last_index += 1;
        let index = ModifyIndex(self.last_index);
        self.entries.insert(key.to_string(), (value.to_vec(), index));
        index
    }

    fn current(&self, key: &str) -> Option<ModifyIndex> {
        self.entries.get(key).map(|(_, index)| *index)
    }
}

/// Thread-safe store held entirely in memory.
///
/// Follows the same rules as Consul: a single global index grows with every
/// write, and a conditional write with index `0` succeeds only when the key
/// does not exist yet.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`, written in iteration order.
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<[u8]>,
    {
        let store = Self::new();
        {
            let mut state = store.lock();
            for (key, value) in entries {
                state.write(key.as_ref(), value.as_ref());
            }
        }
        store
    }

    /// Current keys and values, ignoring versions.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.lock()
            .entries
            .iter()
            .map(|(key, (value, _))| (key.clone(), value.clone()))
            .collect()
    }

    /// Current version of `key`, if present.
    pub fn version_of(&self, key: &str) -> Option<ModifyIndex> {
        self.lock().current(key)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KvStore for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<StoreEntry>> {
        Ok(self
            .lock()
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, (value, index))| StoreEntry::new(key.clone(), value.clone(), *index))
            .collect())
    }

    fn get(&self, key: &str) -> Result<Option<StoreEntry>> {
        Ok(self
            .lock()
            .entries
            .get(key)
            .map(|(value, index)| StoreEntry::new(key, value.clone(), *index)))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<ModifyIndex> {
        Ok(self.lock().write(key, value))
    }

    fn compare_and_swap(&self, key: &str, value: &[u8], expected: ModifyIndex) -> Result<bool> {
        let mut state = self.lock();
        let matches = match state.current(key) {
            Some(current) => current == expected,
            None => expected == ModifyIndex(0),
        };
        if matches {
            state.write(key, value);
        }
        Ok(matches)
    }

    fn compare_and_delete(&self, key: &str, expected: ModifyIndex) -> Result<bool> {
        let mut state = self.lock();
        match state.current(key) {
            None => Ok(true),
            Some(version) if version == expected => {
                state.entries.remove(key);
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }
}
