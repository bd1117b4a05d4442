// SPDX-License-Identifier: MPL-2.0

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::store::StoreError;
use crate::store::schema::SCHEMA;

/// Handle to the post store of one (server, user) pair.
///
/// Cloning is cheap and yields the same underlying connection; the
/// engine serializes writes through the mutex while WAL mode keeps
/// readers concurrent with an in-flight writer.
#[derive(Clone)]
pub struct StoreDb {
    conn: Arc<Mutex<Connection>>,
    key: u32,
}

impl StoreDb {
    /// Open or create the store file `{key}.db` under `base_dir` and run
    /// the idempotent schema.
    pub(crate) fn open_at(base_dir: &Path, key: u32) -> Result<Self, StoreError> {
        std::fs::create_dir_all(base_dir)
            .map_err(|e| StoreError::Path(format!("failed to create store dir: {e}")))?;

        let path = base_dir.join(format!("{key}.db"));
        let conn = Connection::open(&path)?;
        Self::configure(&conn);
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            key,
        })
    }

    /// WAL for concurrent readers, NORMAL sync, and a busy timeout so
    /// short lock contention waits instead of failing.
    fn configure(conn: &Connection) {
        // journal_mode returns a row, so pragma_update's result is ignored
        let _ = conn.pragma_update(None, "journal_mode", "WAL");
        let _ = conn.pragma_update(None, "synchronous", "NORMAL");
        let _ = conn.pragma_update(None, "busy_timeout", "5000");
    }

    /// Store key this handle was opened for.
    pub fn key(&self) -> u32 {
        self.key
    }

    /// Access the connection for operations. A poisoned lock is
    /// recovered rather than propagated so one panicked writer cannot
    /// take the cache down.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("store mutex was poisoned, recovering");
                poisoned.into_inner()
            },
        }
    }
}
