//! Person store: the data-access use cases over one collection.
//!
//! # Responsibility
//! - Expose every person operation as an independently invokable async call.
//! - Parse textual IDs and turn required-document misses into `NotFound`.
//! - Log one outcome line per call at the operation boundary.
//!
//! # Invariants
//! - The store holds no state of its own between calls.
//! - Failures are logged and returned; nothing is retried.
//! - `append_favorite_food_and_save` is a read-modify-write without a
//!   version check. Two concurrent callers on the same ID can lose one
//!   append (last write wins). `push_favorite_food` is the atomic path.

use crate::db::Connection;
use crate::model::person::{
    parse_person_id, NewPerson, Person, PersonId, PersonSummary, SortField,
};
use crate::repo::mongo_person_repo::MongoPersonRepository;
use crate::repo::person_repo::{FoodQuery, PersonRepository, RepoError, RepoResult};
use crate::repo::sqlite_person_repo::SqlitePersonRepository;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

/// Typed accessor over the person collection.
#[derive(Clone)]
pub struct PersonStore {
    repo: Arc<dyn PersonRepository>,
}

impl PersonStore {
    /// Creates a store over an explicit repository implementation.
    pub fn new(repo: Arc<dyn PersonRepository>) -> Self {
        Self { repo }
    }

    /// Creates a store bound to `collection` on an open connection.
    ///
    /// The SQLite backend has a single fixed table, so `collection` only
    /// applies to MongoDB.
    pub fn connect_to(conn: &Connection, collection: &str) -> Self {
        let repo: Arc<dyn PersonRepository> = match conn {
            Connection::Sqlite(handle) => {
                Arc::new(SqlitePersonRepository::new(Arc::clone(handle)))
            }
            Connection::Mongo(database) => {
                Arc::new(MongoPersonRepository::new(database, collection))
            }
        };
        Self::new(repo)
    }

    /// Creates and saves one person.
    ///
    /// # Errors
    /// - `RepoError::Validation` when `name` is missing; nothing is written.
    pub async fn create_one(&self, fields: NewPerson) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = self.repo.insert_one(fields).await;
        match &result {
            Ok(person) => log_ok("create_one", started_at, format!("id={}", person.id)),
            Err(err) => log_error("create_one", started_at, err),
        }
        result
    }

    /// Creates a batch of people, returned in input order.
    ///
    /// All records are validated before any write; one invalid record
    /// rejects the whole batch.
    pub async fn create_many(&self, records: Vec<NewPerson>) -> RepoResult<Vec<Person>> {
        let started_at = Instant::now();
        let requested = records.len();
        let result = self.repo.insert_many(records).await;
        match &result {
            Ok(people) => log_ok(
                "create_many",
                started_at,
                format!("requested={} created={}", requested, people.len()),
            ),
            Err(err) => log_error("create_many", started_at, err),
        }
        result
    }

    /// Returns every person whose name matches exactly; empty when none.
    pub async fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let started_at = Instant::now();
        let result = self.repo.find_by_name(name).await;
        match &result {
            Ok(people) => log_ok("find_by_name", started_at, format!("matches={}", people.len())),
            Err(err) => log_error("find_by_name", started_at, err),
        }
        result
    }

    /// Returns one person whose favorite foods contain `food`.
    pub async fn find_one_by_favorite_food(&self, food: &str) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = self.repo.find_one_by_food(food).await;
        match &result {
            Ok(found) => log_ok("find_one_by_favorite_food", started_at, found_field(found)),
            Err(err) => log_error("find_one_by_favorite_food", started_at, err),
        }
        result
    }

    /// Looks up one person by textual ID.
    ///
    /// # Errors
    /// - `RepoError::InvalidId` when `id` is not a valid identifier.
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = match parse_id(id) {
            Ok(id) => self.repo.find_by_id(id).await,
            Err(err) => Err(err),
        };
        match &result {
            Ok(found) => log_ok("find_by_id", started_at, found_field(found)),
            Err(err) => log_error("find_by_id", started_at, err),
        }
        result
    }

    /// Loads a person, appends `food` locally, and saves the full document.
    ///
    /// Not atomic: a concurrent writer between the load and the save is
    /// overwritten. Use `push_favorite_food` when that matters.
    ///
    /// # Errors
    /// - `RepoError::InvalidId` for a malformed `id`.
    /// - `RepoError::NotFound` when `id` does not resolve.
    pub async fn append_favorite_food_and_save(&self, id: &str, food: &str) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = self.load_append_save(id, food).await;
        match &result {
            Ok(person) => log_ok(
                "append_favorite_food_and_save",
                started_at,
                format!("id={} foods={}", person.id, person.favorite_foods.len()),
            ),
            Err(err) => log_error("append_favorite_food_and_save", started_at, err),
        }
        result
    }

    /// Appends `food` with one engine-side update; safe under concurrency.
    ///
    /// # Errors
    /// - `RepoError::InvalidId` for a malformed `id`.
    /// - `RepoError::NotFound` when `id` does not resolve.
    pub async fn push_favorite_food(&self, id: &str, food: &str) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = match parse_id(id) {
            Ok(id) => self
                .repo
                .push_favorite_food(id, food)
                .await
                .and_then(|found| found.ok_or(RepoError::NotFound(id))),
            Err(err) => Err(err),
        };
        match &result {
            Ok(person) => log_ok(
                "push_favorite_food",
                started_at,
                format!("id={} foods={}", person.id, person.favorite_foods.len()),
            ),
            Err(err) => log_error("push_favorite_food", started_at, err),
        }
        result
    }

    /// Sets `age` on one person named `name` and returns the updated record.
    ///
    /// Returns `Ok(None)` when nobody matches. With several matches the
    /// engine picks which one is updated.
    pub async fn set_age_by_name(&self, name: &str, age: i32) -> RepoResult<Option<Person>> {
        let started_at = Instant::now();
        let result = self.repo.set_age_by_name(name, age).await;
        match &result {
            Ok(found) => log_ok("set_age_by_name", started_at, found_field(found)),
            Err(err) => log_error("set_age_by_name", started_at, err),
        }
        result
    }

    /// Deletes one person and returns the record as it was before deletion.
    ///
    /// # Errors
    /// - `RepoError::InvalidId` for a malformed `id`.
    /// - `RepoError::NotFound` when `id` does not resolve.
    pub async fn delete_by_id(&self, id: &str) -> RepoResult<Person> {
        let started_at = Instant::now();
        let result = match parse_id(id) {
            Ok(id) => self
                .repo
                .find_and_delete_by_id(id)
                .await
                .and_then(|found| found.ok_or(RepoError::NotFound(id))),
            Err(err) => Err(err),
        };
        match &result {
            Ok(person) => log_ok("delete_by_id", started_at, format!("id={}", person.id)),
            Err(err) => log_error("delete_by_id", started_at, err),
        }
        result
    }

    /// Deletes every person named exactly `name`; returns how many.
    pub async fn delete_all_by_name(&self, name: &str) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.repo.delete_many_by_name(name).await;
        match &result {
            Ok(deleted) => log_ok("delete_all_by_name", started_at, format!("deleted={deleted}")),
            Err(err) => log_error("delete_all_by_name", started_at, err),
        }
        result
    }

    /// Returns up to `limit` people who like `food`, sorted ascending by
    /// `sort`, projected to name and favorite foods.
    pub async fn query_by_food_sorted_limited(
        &self,
        food: &str,
        limit: u32,
        sort: SortField,
    ) -> RepoResult<Vec<PersonSummary>> {
        let started_at = Instant::now();
        let query = FoodQuery {
            food: food.to_string(),
            limit,
            sort,
        };
        let result = self.repo.query_by_food(&query).await;
        match &result {
            Ok(rows) => log_ok(
                "query_by_food_sorted_limited",
                started_at,
                format!("limit={} sort={} matches={}", limit, sort, rows.len()),
            ),
            Err(err) => log_error("query_by_food_sorted_limited", started_at, err),
        }
        result
    }

    /// Returns the number of documents in the collection.
    pub async fn count(&self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let result = self.repo.count().await;
        match &result {
            Ok(total) => log_ok("count", started_at, format!("total={total}")),
            Err(err) => log_error("count", started_at, err),
        }
        result
    }

    async fn load_append_save(&self, id: &str, food: &str) -> RepoResult<Person> {
        let id = parse_id(id)?;
        let mut person = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(RepoError::NotFound(id))?;
        person.push_favorite_food(food);
        self.repo.save(&person).await?;
        Ok(person)
    }
}

fn parse_id(value: &str) -> RepoResult<PersonId> {
    parse_person_id(value).ok_or_else(|| RepoError::InvalidId(value.to_string()))
}

fn found_field(found: &Option<Person>) -> String {
    match found {
        Some(person) => format!("found=true id={}", person.id),
        None => "found=false".to_string(),
    }
}

fn log_ok(operation: &str, started_at: Instant, fields: String) {
    info!(
        "event=person_{} module=store status=ok duration_ms={} {}",
        operation,
        started_at.elapsed().as_millis(),
        fields
    );
}

fn log_error(operation: &str, started_at: Instant, err: &RepoError) {
    error!(
        "event=person_{} module=store status=error duration_ms={} error_code={} error={}",
        operation,
        started_at.elapsed().as_millis(),
        err.code(),
        err
    );
}
