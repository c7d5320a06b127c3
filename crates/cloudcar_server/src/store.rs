//! Shared SQLite handle for request handlers.
//!
//! # Invariants
//! - One connection per process, serialized by a mutex.
//! - Storage work runs on the blocking pool, never on async worker threads.
//! - A handler that panics does not take the store down: the next caller
//!   recovers the lock and rolls back any transaction left open.

use crate::error::ApiError;
use cloudcar_core::db::{open_db, open_db_in_memory};
use cloudcar_core::{DbResult, RepoError, RepoResult};
use log::warn;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens a database file whose schema is already current.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a fresh, fully migrated in-memory database.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs `op` against the connection on the blocking thread pool.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&mut Connection) -> RepoResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().unwrap_or_else(|poisoned| {
                warn!("event=store_recover module=store status=poisoned");
                poisoned.into_inner()
            });
            if !guard.is_autocommit() {
                guard.execute_batch("ROLLBACK;").map_err(RepoError::from)?;
            }
            op(&mut *guard).map_err(ApiError::from)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?
    }
}
