//! Core engine of a hierarchical multi-column card board.
//! Cards form an ordered forest laid out one depth level per column.

pub mod config;
pub mod db;
pub mod drag;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EngineConfig};
pub use drag::autoscroll::{AutoScrollSettings, FrameHandle, FrameScheduler, ScrollStep};
pub use drag::layout::{CardBox, ColumnBox, GroupBox, LayoutSnapshot, Point, Rect};
pub use drag::session::{DragFeedback, DragSession, DropOutcome, DropTarget, GapIndicator};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::card::{Card, CardId, Column};
pub use model::color::{CardColor, Palette};
pub use model::project::{Project, ProjectData, ProjectId, ProjectsBlob};
pub use repo::kv_store::{KeyValueStore, MemoryKvStore, RepoError, RepoResult, SqliteKvStore};
pub use repo::project_repo::ProjectRepository;
pub use service::forest_store::{DeleteOutcome, ForestStore};
pub use service::generation::{
    run_generation, GenerationError, GenerationMode, GenerationRequest, GenerationSink,
    TextGenerator,
};
pub use service::workspace::{ProjectSummary, Workspace};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
