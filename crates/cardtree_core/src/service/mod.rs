//! Core use-case services.
//!
//! # Responsibility
//! - Own and mutate the active board (`forest_store`).
//! - Manage the project list and persistence round-trips (`workspace`).
//! - Bridge the text-generation collaborator to content updates (`generation`).

pub mod forest_store;
pub mod generation;
pub mod workspace;
