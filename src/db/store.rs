//! Shared handle to the clinical database.
//!
//! Interactive triage submissions and scheduled scans run against the same
//! store. The connection sits behind a mutex; callers hold the guard only for
//! their own statements and must drop it before calling an external adapter.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;

pub struct ClinicalStore {
    conn: Mutex<Connection>,
}

impl ClinicalStore {
    /// Open (and migrate) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DatabaseError::ConstraintViolation(format!(
                        "cannot create {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Clinical store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Lock the connection for the duration of the returned guard.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockFailed)
    }
}
