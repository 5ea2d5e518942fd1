//! Person repository contract and error taxonomy.
//!
//! # Responsibility
//! - Define the data-access operations every backend must provide.
//! - Map backend failures onto validation / invalid-id / not-found /
//!   transport errors.
//!
//! # Invariants
//! - Write paths validate input before touching the backend.
//! - `save` is a full-document replace with no version check.
//! - `push_favorite_food` is a single engine-side update.

use crate::db::DbError;
use crate::model::person::{
    NewPerson, Person, PersonId, PersonSummary, PersonValidationError, SortField,
};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for person persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Required-field or type violation caught before any write.
    Validation(PersonValidationError),
    /// Identifier text is not a structurally valid person ID.
    ///
    /// Holds the caller's input; `Display` reports only its length.
    InvalidId(String),
    /// A well-formed ID resolved to no document.
    NotFound(PersonId),
    /// Connection, driver, or engine-side fault.
    Transport(DbError),
    /// A stored document could not be decoded.
    InvalidData(String),
}

impl RepoError {
    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::InvalidId(_) => "invalid_id",
            Self::NotFound(_) => "not_found",
            Self::Transport(_) => "transport_failed",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidId(value) => {
                write!(f, "invalid person id ({} chars)", value.chars().count())
            }
            Self::NotFound(id) => write!(f, "person not found: {id}"),
            Self::Transport(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted person data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::InvalidId(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<PersonValidationError> for RepoError {
    fn from(value: PersonValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Transport(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Transport(DbError::Sqlite(value))
    }
}

impl From<mongodb::error::Error> for RepoError {
    fn from(value: mongodb::error::Error) -> Self {
        Self::Transport(DbError::Mongo(value))
    }
}

/// Filter, sort and limit for projected food queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodQuery {
    /// Matched against any element of `favoriteFoods`.
    pub food: String,
    /// Maximum rows; `0` yields no rows.
    pub limit: u32,
    pub sort: SortField,
}

/// Validates every entry of a batch, reporting the first failing index.
pub(crate) fn validate_batch(
    records: Vec<NewPerson>,
) -> Result<Vec<Person>, PersonValidationError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            record
                .into_person()
                .map_err(|reason| PersonValidationError::InvalidBatchEntry {
                    index,
                    reason: Box::new(reason),
                })
        })
        .collect()
}

/// Data-access contract for the person collection.
#[async_trait]
pub trait PersonRepository: Send + Sync {
    async fn insert_one(&self, person: NewPerson) -> RepoResult<Person>;
    /// All-or-nothing with respect to validation; results keep input order.
    async fn insert_many(&self, records: Vec<NewPerson>) -> RepoResult<Vec<Person>>;
    async fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>>;
    async fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>>;
    async fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Replaces the stored document with `person`; last write wins.
    async fn save(&self, person: &Person) -> RepoResult<()>;
    /// Overwrites `age` on one engine-selected match; returns post-update state.
    async fn set_age_by_name(&self, name: &str, age: i32) -> RepoResult<Option<Person>>;
    async fn find_and_delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    async fn delete_many_by_name(&self, name: &str) -> RepoResult<u64>;
    /// Atomically appends `food`; returns post-update state.
    async fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>>;
    async fn query_by_food(&self, query: &FoodQuery) -> RepoResult<Vec<PersonSummary>>;
    async fn count(&self) -> RepoResult<u64>;
}
