//! Person document store.
//!
//! Typed CRUD and query access over one `people` collection, backed by
//! MongoDB or an embedded SQLite database selected by connection URI.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{redact_uri, Backend, ConfigError, StoreConfig, DEFAULT_LISTEN_PORT, URI_ENV};
pub use db::{connect, Connection, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::person::{
    parse_person_id, NewPerson, Person, PersonId, PersonSummary, PersonValidationError, SortField,
};
pub use repo::mongo_person_repo::MongoPersonRepository;
pub use repo::person_repo::{FoodQuery, PersonRepository, RepoError, RepoResult};
pub use repo::sqlite_person_repo::SqlitePersonRepository;
pub use service::person_store::PersonStore;

