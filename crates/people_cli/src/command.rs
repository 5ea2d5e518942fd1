//! Store operation selected on the command line.
//!
//! # Responsibility
//! - Map one subcommand onto exactly one `PersonStore` call.
//! - Print the operation result to stdout.

use anyhow::Context;
use clap::Subcommand;
use people_core::{NewPerson, PersonStore, RepoResult, SortField};
use std::fmt::Display;
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create and save one person
    CreateOne {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: Option<i32>,
        /// Repeat for several foods; order is kept
        #[arg(long = "food")]
        foods: Vec<String>,
    },
    /// Create many people from a JSON array (defaults to a sample set)
    CreateMany {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Find everyone with an exact name
    FindByName { name: String },
    /// Find one person who likes a food
    FindOneByFood { food: String },
    /// Find one person by id
    FindById { id: String },
    /// Load, append a favorite food, and save the whole record
    AppendFood {
        id: String,
        #[arg(long, default_value = "hamburger")]
        food: String,
    },
    /// Append a favorite food with one atomic update
    PushFood { id: String, food: String },
    /// Set the age of one person found by name
    SetAge {
        name: String,
        #[arg(long, default_value_t = 20)]
        age: i32,
    },
    /// Delete one person by id
    DeleteById { id: String },
    /// Delete everyone with an exact name
    DeleteByName {
        #[arg(default_value = "Mary")]
        name: String,
    },
    /// Find people who like a food, sorted ascending and limited
    QueryFood {
        #[arg(default_value = "burritos")]
        food: String,
        #[arg(long, default_value_t = 2)]
        limit: u32,
        #[arg(long, default_value = "name", value_parser = parse_sort_field)]
        sort: SortField,
    },
    /// Count documents in the collection
    Count,
}

impl Command {
    /// Stable name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateOne { .. } => "create_one",
            Self::CreateMany { .. } => "create_many",
            Self::FindByName { .. } => "find_by_name",
            Self::FindOneByFood { .. } => "find_one_by_food",
            Self::FindById { .. } => "find_by_id",
            Self::AppendFood { .. } => "append_food",
            Self::PushFood { .. } => "push_food",
            Self::SetAge { .. } => "set_age",
            Self::DeleteById { .. } => "delete_by_id",
            Self::DeleteByName { .. } => "delete_by_name",
            Self::QueryFood { .. } => "query_food",
            Self::Count => "count",
        }
    }

    /// Runs the operation against `store` and prints its result.
    ///
    /// Store failures are already logged by the store; they come back here
    /// only so the caller can record the command outcome.
    pub async fn run(self, store: &PersonStore) -> anyhow::Result<()> {
        match self {
            Self::CreateOne { name, age, foods } => {
                let mut fields = NewPerson::new(name).with_favorite_foods(foods);
                fields.age = age;
                let person = store.create_one(fields).await?;
                println!("Person saved: {person}");
            }
            Self::CreateMany { file } => {
                let records = match file {
                    Some(path) => read_batch(&path)?,
                    None => sample_people(),
                };
                let people = store.create_many(records).await?;
                println!("Created {} people:", people.len());
                print_all(&people);
            }
            Self::FindByName { name } => {
                let people = store.find_by_name(&name).await?;
                println!("Found {} people named {name}:", people.len());
                print_all(&people);
            }
            Self::FindOneByFood { food } => {
                let found = store.find_one_by_favorite_food(&food).await;
                print_found(&format!("who likes {food}"), found)?;
            }
            Self::FindById { id } => {
                print_found("by id", store.find_by_id(&id).await)?;
            }
            Self::AppendFood { id, food } => {
                let person = store.append_favorite_food_and_save(&id, &food).await?;
                println!("Updated person: {person}");
            }
            Self::PushFood { id, food } => {
                let person = store.push_favorite_food(&id, &food).await?;
                println!("Updated person: {person}");
            }
            Self::SetAge { name, age } => {
                print_found("updated", store.set_age_by_name(&name, age).await)?;
            }
            Self::DeleteById { id } => {
                let person = store.delete_by_id(&id).await?;
                println!("Deleted person: {person}");
            }
            Self::DeleteByName { name } => {
                let deleted = store.delete_all_by_name(&name).await?;
                println!("Deleted {deleted} people named {name}");
            }
            Self::QueryFood { food, limit, sort } => {
                let rows = store.query_by_food_sorted_limited(&food, limit, sort).await?;
                println!("Query result ({} rows):", rows.len());
                print_all(&rows);
            }
            Self::Count => {
                println!("{} people", store.count().await?);
            }
        }
        Ok(())
    }
}

/// The three-record set seeded when `create-many` has no input file.
pub fn sample_people() -> Vec<NewPerson> {
    vec![
        NewPerson::new("Mary")
            .with_age(30)
            .with_favorite_foods(["burritos", "salad"]),
        NewPerson::new("David")
            .with_age(22)
            .with_favorite_foods(["rice", "chicken"]),
        NewPerson::new("Jane")
            .with_age(29)
            .with_favorite_foods(["burritos", "tacos"]),
    ]
}

fn read_batch(path: &Path) -> anyhow::Result<Vec<NewPerson>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a JSON array of people", path.display()))
}

fn parse_sort_field(value: &str) -> Result<SortField, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn print_found<T: Display>(label: &str, result: RepoResult<Option<T>>) -> anyhow::Result<()> {
    match result? {
        Some(item) => println!("Found person {label}: {item}"),
        None => println!("No person found {label}"),
    }
    Ok(())
}

fn print_all<T: Display>(items: &[T]) {
    for item in items {
        println!("  {item}");
    }
}

#[cfg(test)]
mod tests {
    use super::{sample_people, Command};
    use clap::Parser;
    use people_core::SortField;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Command,
    }

    #[test]
    fn query_food_defaults_mirror_sample_query() {
        let parsed = Harness::try_parse_from(["people", "query-food"]).unwrap();
        match parsed.command {
            Command::QueryFood { food, limit, sort } => {
                assert_eq!(food, "burritos");
                assert_eq!(limit, 2);
                assert_eq!(sort, SortField::Name);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        assert!(Harness::try_parse_from(["people", "query-food", "--sort", "_id"]).is_err());
    }

    #[test]
    fn create_one_collects_repeated_foods_in_order() {
        let parsed = Harness::try_parse_from([
            "people", "create-one", "--name", "John", "--age", "25", "--food", "pizza", "--food",
            "pasta",
        ])
        .unwrap();
        match parsed.command {
            Command::CreateOne { name, age, foods } => {
                assert_eq!(name, "John");
                assert_eq!(age, Some(25));
                assert_eq!(foods, vec!["pizza", "pasta"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sample_people_are_all_valid() {
        assert!(sample_people().iter().all(|person| person.validate().is_ok()));
    }
}
