//! Pointer-driven drag-and-drop over the rendered board.
//!
//! # Responsibility
//! - Hit-test pointer positions against the last rendered layout (`layout`).
//! - Resolve drop targets and apply drops as store moves (`session`).
//! - Scroll columns while the pointer rests near an edge (`autoscroll`).

pub mod autoscroll;
pub mod layout;
pub mod session;
