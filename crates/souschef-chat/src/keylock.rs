//! Named async locks for serializing cache fills.
//!
//! Two users asking for the same uncached search or recipe at once would
//! both miss the store and both call the recipe API. Holding the key's
//! lock across lookup-then-fill makes the second caller wait and then
//! find the first caller's record.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::ChatError;

/// A map of lazily created async locks keyed by string.
///
/// Entries hold weak references, so a key's lock is freed once no caller
/// holds or awaits it.
#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<String, Weak<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> Result<OwnedMutexGuard<()>, ChatError> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|e| ChatError::SessionLock(format!("key lock map poisoned: {}", e)))?;
            locks.retain(|_, weak| weak.strong_count() > 0);
            match locks.get(key).and_then(Weak::upgrade) {
                Some(existing) => existing,
                None => {
                    let fresh = Arc::new(AsyncMutex::new(()));
                    locks.insert(key.to_string(), Arc::downgrade(&fresh));
                    fresh
                }
            }
        };
        Ok(lock.lock_owned().await)
    }

    /// Number of keys with a live lock.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.values().filter(|w| w.strong_count() > 0).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
