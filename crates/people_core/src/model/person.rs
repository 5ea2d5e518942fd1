//! Person domain model.
//!
//! # Responsibility
//! - Define the canonical person document stored in the `people` collection.
//! - Validate creation input before any write reaches a backend.
//!
//! # Invariants
//! - `id` is assigned exactly once, in `NewPerson::into_person`, and never
//!   changes afterwards.
//! - A persisted person always has a non-empty `name`.
//! - `favorite_foods` keeps insertion order; appends go to the end.

use bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Opaque engine-style identifier for a person document.
///
/// Kept as a type alias so signatures read in domain terms.
pub type PersonId = ObjectId;

/// Parses a textual person ID.
///
/// Returns `None` when `value` is not exactly a 24-hex-digit object id;
/// surrounding whitespace is not stripped.
pub fn parse_person_id(value: &str) -> Option<PersonId> {
    ObjectId::parse_str(value).ok()
}

/// Validation errors raised before a person is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonValidationError {
    /// `name` is required and was missing or empty.
    MissingName,
    /// Sort requested on a field that is not sortable.
    UnknownSortField(String),
    /// A batch entry failed validation; `index` is its input position.
    InvalidBatchEntry {
        index: usize,
        reason: Box<PersonValidationError>,
    },
}

impl Display for PersonValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "person validation failed: `name` is required"),
            Self::UnknownSortField(field) => {
                write!(f, "unknown sort field `{field}`; expected name|age")
            }
            Self::InvalidBatchEntry { index, reason } => {
                write!(f, "batch entry {index} is invalid: {reason}")
            }
        }
    }
}

impl Error for PersonValidationError {}

/// Canonical person document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Assigned at creation; stored as the document `_id`.
    #[serde(rename = "_id")]
    pub id: PersonId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    /// Ordered, duplicates allowed.
    #[serde(rename = "favoriteFoods", default)]
    pub favorite_foods: Vec<String>,
}

impl Person {
    /// Appends one food to the end of `favorite_foods`.
    pub fn push_favorite_food(&mut self, food: impl Into<String>) {
        self.favorite_foods.push(food.into());
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ _id: {}, name: {:?}", self.id.to_hex(), self.name)?;
        if let Some(age) = self.age {
            write!(f, ", age: {age}")?;
        }
        write!(f, ", favoriteFoods: {:?} }}", self.favorite_foods)
    }
}

/// Field set accepted by create operations.
///
/// `name` defaults to empty when absent or `null` in deserialized input so
/// that the missing-name case surfaces as a validation error rather than a
/// parse failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(rename = "favoriteFoods", default)]
    pub favorite_foods: Vec<String>,
}

impl NewPerson {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_favorite_foods<I, S>(mut self, foods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.favorite_foods = foods.into_iter().map(Into::into).collect();
        self
    }

    /// Checks required fields.
    ///
    /// Only an empty `name` is rejected; whitespace-only names pass, the
    /// same way a schema-level `required` check behaves.
    pub fn validate(&self) -> Result<(), PersonValidationError> {
        if self.name.is_empty() {
            return Err(PersonValidationError::MissingName);
        }
        Ok(())
    }

    /// Validates and converts into a person with a freshly generated ID.
    pub fn into_person(self) -> Result<Person, PersonValidationError> {
        self.validate()?;
        Ok(Person {
            id: ObjectId::new(),
            name: self.name,
            age: self.age,
            favorite_foods: self.favorite_foods,
        })
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Projection returned by sorted food queries: no `_id`, no `age`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
    pub name: String,
    #[serde(rename = "favoriteFoods", default)]
    pub favorite_foods: Vec<String>,
}

impl Display for PersonSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ name: {:?}, favoriteFoods: {:?} }}",
            self.name, self.favorite_foods
        )
    }
}

/// Fields a sorted query may order by (always ascending).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    #[default]
    Name,
    Age,
}

impl SortField {
    /// Document field name used by backends.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Age => "age",
        }
    }
}

impl FromStr for SortField {
    type Err = PersonValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "age" => Ok(Self::Age),
            other => Err(PersonValidationError::UnknownSortField(other.to_string())),
        }
    }
}

impl Display for SortField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}
