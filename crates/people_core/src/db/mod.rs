//! Connection bootstrap for the person store backends.
//!
//! # Responsibility
//! - Open the single shared connection the store runs against.
//! - Apply embedded SQLite schema migrations before handing out a handle.
//!
//! # Invariants
//! - The connection is opened once per process and shared by every store
//!   operation; no teardown is modeled.
//! - Core code must not read/write SQLite data before migrations succeed.

use crate::config::ConfigError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

pub mod migrations;
mod open;

pub use open::{connect, open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Mutex-guarded SQLite connection shared across blocking workers.
pub type SqliteHandle = Arc<Mutex<rusqlite::Connection>>;

/// Transport-level failures: configuration, driver, or worker faults.
#[derive(Debug)]
pub enum DbError {
    Config(ConfigError),
    Sqlite(rusqlite::Error),
    Mongo(mongodb::error::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// A blocking worker panicked or a lock was poisoned.
    Worker(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Mongo(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::Worker(message) => write!(f, "database worker failed: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Sqlite(err) => Some(err),
            Self::Mongo(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } | Self::Worker(_) => None,
        }
    }
}

impl From<ConfigError> for DbError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Mongo(value)
    }
}

/// Open connection to one of the supported backends.
///
/// Cloning is cheap: both variants are reference-counted handles.
#[derive(Clone)]
pub enum Connection {
    Sqlite(SqliteHandle),
    Mongo(mongodb::Database),
}

impl Connection {
    /// Wraps an already-migrated SQLite connection.
    pub fn from_sqlite(conn: rusqlite::Connection) -> Self {
        Self::Sqlite(Arc::new(Mutex::new(conn)))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite",
            Self::Mongo(_) => "mongodb",
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(_) => f.write_str("Connection::Sqlite"),
            Self::Mongo(db) => write!(f, "Connection::Mongo({})", db.name()),
        }
    }
}
