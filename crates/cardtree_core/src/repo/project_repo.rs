//! Projects blob persistence over a key-value store.
//!
//! # Responsibility
//! - Encode/decode the projects blob and the active project id.
//!
//! # Invariants
//! - The projects blob and the active id live under separate keys.
//! - A blob that is not a JSON object is an error as a whole.
//! - Inside the object, each record decodes on its own; unreadable records
//!   are skipped so the rest survive. If none decode, the blob is an error.

use crate::model::project::ProjectsBlob;
use crate::repo::kv_store::{KeyValueStore, RepoResult};
use log::{debug, error, warn};
use serde_json::{Map, Value};

/// Key holding the JSON projects blob.
pub const PROJECTS_KEY: &str = "cardtree.projects";
/// Key holding the active project id.
pub const ACTIVE_PROJECT_KEY: &str = "cardtree.active_project";

/// Project persistence facade over any key-value backend.
pub struct ProjectRepository<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProjectRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads all projects. `Ok(None)` when nothing was saved yet.
    pub fn load_projects(&self) -> RepoResult<Option<ProjectsBlob>> {
        let Some(raw) = self.store.get(PROJECTS_KEY)? else {
            debug!("event=projects_load module=repo status=empty");
            return Ok(None);
        };
        let entries: Map<String, Value> = serde_json::from_str(&raw).map_err(|err| {
            error!("event=projects_load module=repo status=error error={err}");
            err
        })?;
        let total = entries.len();
        let mut blob = ProjectsBlob::new();
        let mut last_err = None;
        for (id, value) in entries {
            match serde_json::from_value(value) {
                Ok(project) => {
                    blob.insert(id, project);
                }
                Err(err) => {
                    warn!(
                        "event=projects_load module=repo status=skipped project_id={id} error={err}"
                    );
                    last_err = Some(err);
                }
            }
        }
        if blob.is_empty() {
            if let Some(err) = last_err {
                error!("event=projects_load module=repo status=error records={total}");
                return Err(err.into());
            }
        }
        debug!(
            "event=projects_load module=repo status=ok projects={}",
            blob.len()
        );
        Ok(Some(blob))
    }

    pub fn save_projects(&self, blob: &ProjectsBlob) -> RepoResult<()> {
        let raw = serde_json::to_string(blob)?;
        self.store.set(PROJECTS_KEY, &raw).map_err(|err| {
            error!("event=projects_save module=repo status=error error={err}");
            err
        })
    }

    pub fn load_active_project_id(&self) -> RepoResult<Option<String>> {
        Ok(self
            .store
            .get(ACTIVE_PROJECT_KEY)?
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty()))
    }

    pub fn save_active_project_id(&self, id: &str) -> RepoResult<()> {
        self.store.set(ACTIVE_PROJECT_KEY, id)
    }
}
