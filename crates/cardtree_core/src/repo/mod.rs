//! Repository layer: durable storage behind a key-value contract.
//!
//! # Responsibility
//! - Define the get/set blob contract the core persists through.
//! - Isolate SQLite and JSON encoding details from services.
//!
//! # Invariants
//! - Repository APIs report transport and decode failures as `RepoError`;
//!   deciding how to recover is left to the caller.

pub mod kv_store;
pub mod project_repo;
