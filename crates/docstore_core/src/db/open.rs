//! Shared store handle bootstrap and shutdown.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas and apply migrations before first use.
//! - Verify the store answers a ping, then hand out the handle.
//!
//! # Invariants
//! - A returned handle has migrations fully applied and answered a ping.
//! - A connection that fails bootstrap is dropped, never returned.
//! - Statements issued through one handle are serialized by its lock.

use super::config::{StoreConfig, StoreTarget};
use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Process-scoped connection to the document store.
///
/// Acquired once at startup and released with [`StoreHandle::close`] (or on
/// drop), then injected by reference into repositories.
#[derive(Debug)]
pub struct StoreHandle {
    conn: Mutex<Connection>,
    mode: &'static str,
}

impl StoreHandle {
    /// Opens the store described by `config`.
    pub fn connect(config: &StoreConfig) -> DbResult<Self> {
        match &config.target {
            StoreTarget::File(path) => Self::open(path),
            StoreTarget::Memory => Self::open_in_memory(),
        }
    }

    /// Opens a SQLite database file and applies all pending migrations.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::open_with("file", || Connection::open(path))
    }

    /// Opens an in-memory SQLite database and applies all pending migrations.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with duration and status.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open_with("memory", Connection::open_in_memory)
    }

    fn open_with(
        mode: &'static str,
        open: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode={mode}");

        let mut conn = match open() {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        match bootstrap_connection(&mut conn) {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    conn: Mutex::new(conn),
                    mode,
                })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Locks the shared connection for one statement or transaction.
    pub fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::ConnectionPoisoned)
    }

    /// Round-trips a trivial query.
    pub fn ping(&self) -> DbResult<()> {
        let conn = self.lock()?;
        ping_connection(&conn)
    }

    /// Releases the connection.
    ///
    /// # Side effects
    /// - Emits `db_close` logging events.
    pub fn close(self) -> DbResult<()> {
        let mode = self.mode;
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| DbError::ConnectionPoisoned)?;

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok mode={mode}");
                Ok(())
            }
            Err((_conn, err)) => {
                error!(
                    "event=db_close module=db status=error mode={mode} error_code=db_close_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    ping_connection(conn)
}

fn ping_connection(conn: &Connection) -> DbResult<()> {
    let ok: i64 = conn.query_row("SELECT 1;", [], |row| row.get(0))?;
    if ok != 1 {
        return Err(DbError::PingFailed(format!("ping returned {ok}")));
    }
    Ok(())
}
