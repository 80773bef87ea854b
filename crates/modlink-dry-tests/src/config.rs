// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use modlink_config::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// This fake allows tests to verify config save/load behavior without
/// touching the filesystem. It also tracks call counts for verification.
///
/// # Example
///
/// ```
/// use modlink_config::{ConfigService, ModulePrefs, PREFS_KEY};
/// use modlink_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// service.save(PREFS_KEY, &ModulePrefs::default()).unwrap();
/// assert_eq!(store.load_count(), 0);
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<InMemoryConfigStoreInner>>,
}

#[derive(Default)]
struct InMemoryConfigStoreInner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
    fail_on_save: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given key-value pairs.
    pub fn with_data(data: HashMap<String, Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InMemoryConfigStoreInner {
                data,
                ..Default::default()
            })),
        }
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_load = fail;
    }

    /// Configure the store to fail on save operations.
    pub fn set_fail_on_save(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_save = fail;
    }

    /// Get the number of times `load_raw` was called (attempted, not successful).
    ///
    /// This counter is incremented at the start of each `load_raw` call,
    /// before any failure checks. It counts all attempts, including those
    /// that fail due to `set_fail_on_load(true)` or missing keys.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// Get the number of times `save_raw` was called (attempted, not successful).
    ///
    /// This counter is incremented at the start of each `save_raw` call,
    /// before any failure checks. It counts all attempts, including those
    /// that fail due to `set_fail_on_save(true)`.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }

    /// Return all keys currently present in the store.
    ///
    /// This includes keys from any source:
    /// - Keys added via `save_raw` calls
    /// - Keys pre-populated via [`with_data()`](Self::with_data)
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .keys()
            .cloned()
            .collect()
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .contains_key(key)
    }

    /// Reset the store to its initial empty state.
    ///
    /// Clears all fields:
    /// - `data`: All stored key-value pairs are removed
    /// - `load_count`: Reset to 0
    /// - `save_count`: Reset to 0
    /// - `fail_on_load`: Reset to false
    /// - `fail_on_save`: Reset to false
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.data.clear();
        inner.load_count = 0;
        inner.save_count = 0;
        inner.fail_on_load = false;
        inner.fail_on_save = false;
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;

        if inner.fail_on_save {
            return Err(ConfigError::Other("simulated save failure".into()));
        }

        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use modlink_config::{ConfigService, ModulePrefs, PREFS_KEY};

    #[test]
    fn load_missing_key_returns_not_found() {
        let store = InMemoryConfigStore::new();
        assert!(matches!(store.load_raw("missing"), Err(ConfigError::NotFound)));
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn prefs_survive_a_service_round_trip() {
        let store = InMemoryConfigStore::new();
        let service = ConfigService::new(store.clone());
        let prefs = ModulePrefs {
            server_socket: Some("unix:/run/host.sock".into()),
            ..ModulePrefs::default()
        };
        service.save(PREFS_KEY, &prefs).unwrap();
        assert!(store.contains_key(PREFS_KEY));
        assert_eq!(service.load::<ModulePrefs>(PREFS_KEY).unwrap(), Some(prefs));
    }

    #[test]
    fn failures_still_count_and_store_nothing() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_save(true);
        assert!(matches!(store.save_raw("key", b"v"), Err(ConfigError::Other(_))));
        assert_eq!(store.save_count(), 1);
        assert!(store.keys().is_empty());

        store.set_fail_on_load(true);
        assert!(store.load_raw("key").is_err());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn with_data_prepopulates_and_reset_clears() {
        let mut initial = HashMap::new();
        initial.insert(PREFS_KEY.to_string(), b"{}".to_vec());
        let store = InMemoryConfigStore::with_data(initial);
        assert_eq!(store.load_raw(PREFS_KEY).unwrap(), b"{}");

        store.set_fail_on_load(true);
        store.reset();
        assert!(store.keys().is_empty());
        assert_eq!(store.load_count(), 0);
        assert!(matches!(store.load_raw(PREFS_KEY), Err(ConfigError::NotFound)));
    }

    #[test]
    fn clones_share_state() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("shared", b"x").unwrap();
        assert_eq!(b.load_raw("shared").unwrap(), b"x");
        assert_eq!(b.save_count(), 1);
    }
}
