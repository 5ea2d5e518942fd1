//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the process entrypoint decoupled from storage details.

pub mod person_store;
