// SPDX-License-Identifier: MPL-2.0

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::store::{StoreDb, StoreError};

/// Owns exactly one open store per (server URL, user id) pair.
///
/// Each logged-in account gets its own isolated store file, named by
/// [`store_key`]. Opening is lazy and idempotent per process lifetime: the
/// first `get_or_open` for a pair opens and caches the handle, later
/// calls return the same handle. A different pair never reuses a prior
/// handle; stale handles for inactive accounts simply stay open unused.
pub struct StoreManager {
    base_dir: PathBuf,
    stores: Mutex<HashMap<u32, StoreDb>>,
}

impl StoreManager {
    /// Stores live under the platform data dir, one file per account.
    pub fn new() -> Result<Self, StoreError> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| StoreError::Path("could not find data directory".to_string()))?;
        Ok(Self::with_base_dir(data_dir.join("postcache")))
    }

    /// Store files under an explicit directory instead of the platform
    /// data dir.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// The open store for the pair, opened on first use.
    ///
    /// Fails with [`StoreError::Unavailable`] when either identity is
    /// blank (no account resolved yet), which callers must be able to
    /// tell apart from an opened-but-empty store.
    pub fn get_or_open(&self, server_url: &str, user_id: &str) -> Result<StoreDb, StoreError> {
        let server_url = server_url.trim();
        let user_id = user_id.trim();
        if server_url.is_empty() || user_id.is_empty() {
            return Err(StoreError::Unavailable(
                "no active server or user".to_string(),
            ));
        }

        let key = store_key(server_url, user_id);

        let mut stores = match self.stores.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("store map mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        };
        if let Some(db) = stores.get(&key) {
            return Ok(db.clone());
        }

        let db = StoreDb::open_at(&self.base_dir, key)?;
        stores.insert(key, db.clone());
        Ok(db)
    }
}

/// Store key for a (server URL, user id) pair.
///
/// Order-sensitive 31-based hash over the UTF-16 units of the trimmed
/// concatenation, reduced to the absolute value of a wrapping 32-bit
/// accumulator. The key names the on-disk file, so every call site must
/// go through this one implementation.
pub fn store_key(server_url: &str, user_id: &str) -> u32 {
    let mut acc: i32 = 0;
    for unit in server_url
        .trim()
        .encode_utf16()
        .chain(user_id.trim().encode_utf16())
    {
        acc = acc
            .wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit));
    }
    acc.unsigned_abs()
}
