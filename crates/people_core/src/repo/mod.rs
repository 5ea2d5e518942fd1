//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the person data-access contract.
//! - Keep SQL and driver query details out of the store layer.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`, `InvalidId`) in
//!   addition to transport errors.

pub mod mongo_person_repo;
pub mod person_repo;
pub mod sqlite_person_repo;
