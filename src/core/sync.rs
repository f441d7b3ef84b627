//! Locking helpers and a keyed map of independently locked slots.
//!
//! Writers serialize per key (one mutex per decision or entity) while the
//! outer map is only write-locked for inserts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Read-lock an RwLock, recovering from poisoning.
pub fn read<T>(l: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock an RwLock, recovering from poisoning.
pub fn write<T>(l: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(PoisonError::into_inner)
}

/// Map from string key to an individually locked value.
pub struct KeyedSlots<T> {
    slots: RwLock<HashMap<String, Arc<Mutex<T>>>>,
}

impl<T> KeyedSlots<T> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Get the slot for `key`.
    pub fn get(&self, key: &str) -> Option<Arc<Mutex<T>>> {
        read(&self.slots).get(key).cloned()
    }

    /// Insert `value` only if `key` is absent. Returns false on conflict.
    pub fn insert_new(&self, key: &str, value: T) -> bool {
        let mut slots = write(&self.slots);
        if slots.contains_key(key) {
            return false;
        }
        slots.insert(key.to_string(), Arc::new(Mutex::new(value)));
        true
    }

    /// Get the slot for `key`, creating it with `init` when missing.
    pub fn get_or_insert_with(&self, key: &str, init: impl FnOnce() -> T) -> Arc<Mutex<T>> {
        if let Some(slot) = self.get(key) {
            return slot;
        }
        write(&self.slots)
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(init())))
            .clone()
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        read(&self.slots).contains_key(key)
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = read(&self.slots).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        read(&self.slots).len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> KeyedSlots<T> {
    /// Clone every value, ordered by key.
    pub fn snapshot(&self) -> Vec<T> {
        let slots: Vec<Arc<Mutex<T>>> = {
            let map = read(&self.slots);
            let mut keyed: Vec<(&String, &Arc<Mutex<T>>)> = map.iter().collect();
            keyed.sort_by(|a, b| a.0.cmp(b.0));
            keyed.into_iter().map(|(_, slot)| slot.clone()).collect()
        };
        slots.iter().map(|slot| lock(slot).clone()).collect()
    }
}

impl<T> Default for KeyedSlots<T> {
    fn default() -> Self {
        Self::new()
    }
}
