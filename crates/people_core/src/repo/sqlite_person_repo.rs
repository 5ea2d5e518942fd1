//! SQLite implementation of `PersonRepository`.
//!
//! # Responsibility
//! - Store one row per person document in the `people` table.
//! - Run blocking rusqlite work off the async executor.
//!
//! # Invariants
//! - Natural order is insertion order (`seq ASC`); it breaks every tie.
//! - `favorite_foods` is a JSON array; element matching goes through
//!   `json_each`.
//! - Multi-statement writes run in one transaction.

use super::person_repo::{validate_batch, FoodQuery, PersonRepository, RepoError, RepoResult};
use crate::db::{DbError, SqliteHandle};
use crate::model::person::{parse_person_id, NewPerson, Person, PersonId, PersonSummary};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERSON_SELECT_SQL: &str = "SELECT id, name, age, favorite_foods FROM people";

const FOOD_MATCH_SQL: &str =
    "EXISTS (SELECT 1 FROM json_each(people.favorite_foods) WHERE json_each.value = ?1)";

/// SQLite-backed person repository.
#[derive(Clone)]
pub struct SqlitePersonRepository {
    conn: SqliteHandle,
}

impl SqlitePersonRepository {
    pub fn new(conn: SqliteHandle) -> Self {
        Self { conn }
    }

    async fn run<T, F>(&self, op: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> RepoResult<T> + Send + 'static,
    {
        let conn = SqliteHandle::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| DbError::Worker("sqlite connection lock poisoned".to_string()))?;
            op(&mut *guard)
        })
        .await
        .map_err(|err| RepoError::Transport(DbError::Worker(err.to_string())))?
    }
}

#[async_trait]
impl PersonRepository for SqlitePersonRepository {
    async fn insert_one(&self, person: NewPerson) -> RepoResult<Person> {
        let person = person.into_person()?;
        self.run(move |conn| {
            insert_row(conn, &person)?;
            Ok(person)
        })
        .await
    }

    async fn insert_many(&self, records: Vec<NewPerson>) -> RepoResult<Vec<Person>> {
        let people = validate_batch(records)?;
        self.run(move |conn| {
            let tx = conn.transaction()?;
            for person in &people {
                insert_row(&tx, person)?;
            }
            tx.commit()?;
            Ok(people)
        })
        .await
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        let name = name.to_string();
        self.run(move |conn| {
            let mut stmt =
                conn.prepare(&format!("{PERSON_SELECT_SQL} WHERE name = ?1 ORDER BY seq ASC;"))?;
            let mut rows = stmt.query([name])?;
            let mut people = Vec::new();
            while let Some(row) = rows.next()? {
                people.push(parse_person_row(row)?);
            }
            Ok(people)
        })
        .await
    }

    async fn find_one_by_food(&self, food: &str) -> RepoResult<Option<Person>> {
        let food = food.to_string();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{PERSON_SELECT_SQL} WHERE {FOOD_MATCH_SQL} ORDER BY seq ASC LIMIT 1;"
            ))?;
            let mut rows = stmt.query([food])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_person_row(row)?)),
                None => Ok(None),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.run(move |conn| select_by_id(conn, id)).await
    }

    async fn save(&self, person: &Person) -> RepoResult<()> {
        let person = person.clone();
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE people SET name = ?1, age = ?2, favorite_foods = ?3 WHERE id = ?4;",
                params![
                    person.name.as_str(),
                    person.age,
                    encode_foods(&person.favorite_foods)?,
                    person.id.to_hex(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(person.id));
            }
            Ok(())
        })
        .await
    }

    async fn set_age_by_name(&self, name: &str, age: i32) -> RepoResult<Option<Person>> {
        let name = name.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let target: Option<String> = tx
                .query_row(
                    "SELECT id FROM people WHERE name = ?1 ORDER BY seq ASC LIMIT 1;",
                    [name],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(id_text) = target else {
                return Ok(None);
            };

            tx.execute(
                "UPDATE people SET age = ?1 WHERE id = ?2;",
                params![age, id_text.as_str()],
            )?;
            let updated = select_by_id(&tx, parse_stored_id(&id_text)?)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
    }

    async fn find_and_delete_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let existing = select_by_id(&tx, id)?;
            if existing.is_some() {
                tx.execute("DELETE FROM people WHERE id = ?1;", [id.to_hex()])?;
            }
            tx.commit()?;
            Ok(existing)
        })
        .await
    }

    async fn delete_many_by_name(&self, name: &str) -> RepoResult<u64> {
        let name = name.to_string();
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM people WHERE name = ?1;", [name])?;
            Ok(removed as u64)
        })
        .await
    }

    async fn push_favorite_food(&self, id: PersonId, food: &str) -> RepoResult<Option<Person>> {
        let food = food.to_string();
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE people
                 SET favorite_foods = json_insert(favorite_foods, '$[#]', ?1)
                 WHERE id = ?2;",
                params![food, id.to_hex()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            let updated = select_by_id(&tx, id)?;
            tx.commit()?;
            Ok(updated)
        })
        .await
    }

    async fn query_by_food(&self, query: &FoodQuery) -> RepoResult<Vec<PersonSummary>> {
        let query = query.clone();
        self.run(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT name, favorite_foods FROM people
                 WHERE {FOOD_MATCH_SQL}
                 ORDER BY {} ASC, seq ASC
                 LIMIT ?2;",
                query.sort.field_name()
            ))?;
            let mut rows = stmt.query(params![query.food, i64::from(query.limit)])?;
            let mut summaries = Vec::new();
            while let Some(row) = rows.next()? {
                let foods_json: String = row.get("favorite_foods")?;
                summaries.push(PersonSummary {
                    name: row.get("name")?,
                    favorite_foods: decode_foods(&foods_json)?,
                });
            }
            Ok(summaries)
        })
        .await
    }

    async fn count(&self) -> RepoResult<u64> {
        self.run(|conn| {
            let total: i64 = conn.query_row("SELECT COUNT(*) FROM people;", [], |row| row.get(0))?;
            Ok(total as u64)
        })
        .await
    }
}

fn insert_row(conn: &Connection, person: &Person) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO people (id, name, age, favorite_foods) VALUES (?1, ?2, ?3, ?4);",
        params![
            person.id.to_hex(),
            person.name.as_str(),
            person.age,
            encode_foods(&person.favorite_foods)?,
        ],
    )?;
    Ok(())
}

fn select_by_id(conn: &Connection, id: PersonId) -> RepoResult<Option<Person>> {
    let mut stmt = conn.prepare(&format!("{PERSON_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_hex()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_person_row(row)?)),
        None => Ok(None),
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let id_text: String = row.get("id")?;
    let foods_json: String = row.get("favorite_foods")?;
    Ok(Person {
        id: parse_stored_id(&id_text)?,
        name: row.get("name")?,
        age: row.get("age")?,
        favorite_foods: decode_foods(&foods_json)?,
    })
}

fn parse_stored_id(value: &str) -> RepoResult<PersonId> {
    parse_person_id(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid id value `{value}` in people.id")))
}

fn encode_foods(foods: &[String]) -> RepoResult<String> {
    serde_json::to_string(foods)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode favorite foods: {err}")))
}

fn decode_foods(value: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(value).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid favorite_foods value `{value}` in people.favorite_foods: {err}"
        ))
    })
}
