//! Connection bootstrap utilities.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections with migrations applied.
//! - Open a MongoDB client and verify it with a `ping` round trip.
//!
//! # Invariants
//! - Returned SQLite connections have `foreign_keys=ON` and a busy timeout.
//! - URIs are redacted before they reach a log line.

use super::migrations::apply_migrations;
use super::{Connection, DbError, DbResult};
use crate::config::{redact_uri, Backend, StoreConfig};
use bson::doc;
use log::{debug, error, info};
use mongodb::Client;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<rusqlite::Connection> {
    open_sqlite("file", || rusqlite::Connection::open(path))
}

/// Opens an in-memory SQLite database and applies all pending migrations.
pub fn open_db_in_memory() -> DbResult<rusqlite::Connection> {
    open_sqlite("memory", rusqlite::Connection::open_in_memory)
}

/// Opens the connection described by `config`.
///
/// A missing or unsupported URI is returned as `DbError::Config` here,
/// when the connection is attempted, never earlier.
///
/// # Side effects
/// - Emits `db_open` logging events with backend mode, duration and status.
pub async fn connect(config: &StoreConfig) -> DbResult<Connection> {
    let backend = match config.backend() {
        Ok(backend) => backend,
        Err(err) => {
            error!(
                "event=db_open module=db status=error error_code=db_config_invalid error={}",
                err
            );
            return Err(err.into());
        }
    };

    debug!(
        "event=db_connect module=db status=start backend={}",
        backend.mode()
    );
    match backend {
        Backend::Mongo(uri) => connect_mongo(&uri, &config.database).await,
        Backend::SqliteFile(path) => blocking_open(move || open_db(path)).await,
        Backend::SqliteMemory => blocking_open(open_db_in_memory).await,
    }
}

async fn blocking_open<F>(open: F) -> DbResult<Connection>
where
    F: FnOnce() -> DbResult<rusqlite::Connection> + Send + 'static,
{
    let conn = tokio::task::spawn_blocking(open)
        .await
        .map_err(|err| DbError::Worker(err.to_string()))??;
    Ok(Connection::from_sqlite(conn))
}

async fn connect_mongo(uri: &str, fallback_database: &str) -> DbResult<Connection> {
    let started_at = Instant::now();
    let redacted = redact_uri(uri);
    info!(
        "event=db_open module=db status=start mode=mongodb uri={}",
        redacted
    );

    let result = async {
        let client = Client::with_uri_str(uri).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(fallback_database));
        database.run_command(doc! { "ping": 1 }).await?;
        Ok::<_, mongodb::error::Error>(database)
    }
    .await;

    match result {
        Ok(database) => {
            info!(
                "event=db_open module=db status=ok mode=mongodb database={} duration_ms={}",
                database.name(),
                started_at.elapsed().as_millis()
            );
            Ok(Connection::Mongo(database))
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode=mongodb uri={} duration_ms={} error_code=db_connect_failed error={}",
                redacted,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err.into())
        }
    }
}

fn open_sqlite<F>(mode: &'static str, open: F) -> DbResult<rusqlite::Connection>
where
    F: FnOnce() -> rusqlite::Result<rusqlite::Connection>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={}", mode);

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut rusqlite::Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
