//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections.
//! - Configure connection pragmas required by the referential rules.
//! - Keep schema migration a separate, explicit step for file databases.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - `open_db` never mutates the schema; it only verifies it.

use super::migrations::{apply_migrations, current_user_version, ensure_current, MigrationReport};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a SQLite database file whose schema is already current.
///
/// Fails with `DbError::PendingMigrations` when [`migrate_db`] has not been
/// run against this file yet.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let bootstrap = configure_connection(&conn).and_then(|()| ensure_current(&conn));
    match bootstrap {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode=file duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=file duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Applies all pending migrations to a SQLite database file.
///
/// Creates the file when it does not exist yet. Running it against a
/// current database is a no-op.
///
/// # Side effects
/// - Emits `db_migrate` logging events with version range and duration.
pub fn migrate_db(path: impl AsRef<Path>) -> DbResult<MigrationReport> {
    let started_at = Instant::now();
    info!("event=db_migrate module=db status=start");

    let result = Connection::open(path)
        .map_err(DbError::from)
        .and_then(|mut conn| {
            configure_connection(&conn)?;
            apply_migrations(&mut conn)
        });

    match result {
        Ok(report) => {
            info!(
                "event=db_migrate module=db status=ok from_version={} to_version={} duration_ms={}",
                report.from_version,
                report.to_version,
                started_at.elapsed().as_millis()
            );
            Ok(report)
        }
        Err(err) => {
            error!(
                "event=db_migrate module=db status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Reads the schema version of an existing database file without
/// modifying it.
pub fn schema_version(path: impl AsRef<Path>) -> DbResult<u32> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    current_user_version(&conn)
}

/// Opens an in-memory SQLite database and applies all migrations.
///
/// In-memory databases start empty on every open, so migrating here is the
/// only way to get a usable schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let mut conn = match Connection::open_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let bootstrap = configure_connection(&conn).and_then(|()| apply_migrations(&mut conn));
    match bootstrap {
        Ok(_) => {
            info!(
                "event=db_open module=db status=ok mode=memory duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=memory duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}
