//! Board domain model.
//!
//! # Responsibility
//! - Define cards, columns, projects and the persisted blob shape.
//! - Provide the pure algorithms the forest store relies on: order paths,
//!   fractional positioning and the color cascade.
//!
//! # Invariants
//! - Every card and project is identified by a stable generated string id.

pub mod card;
pub mod color;
pub mod id;
pub mod order_path;
pub mod project;
