//! Identifier generation for cards, columns and projects.
//!
//! # Invariants
//! - Generated ids are 32 lowercase hex chars (uuid v4, simple form).
//! - Ids are opaque strings; callers never parse them.

use uuid::Uuid;

/// Returns a fresh collision-resistant identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
