//! Person domain model.
//!
//! # Responsibility
//! - Define the data structures shared by repositories and the store.
//!
//! # Invariants
//! - Every person is identified by a stable `PersonId`.
//! - Deletion is physical; there is no tombstone state.

pub mod person;
