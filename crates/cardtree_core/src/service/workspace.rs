//! Project list and active-project selection.
//!
//! # Responsibility
//! - Hold every project, with the active one wrapped in a `ForestStore`.
//! - Create, rename, delete and switch projects.
//! - Load from and save to the durable key-value store.
//!
//! # Invariants
//! - Exactly one project is active at all times.
//! - Corrupt or absent persisted data yields one default project.

use crate::model::color::Palette;
use crate::model::project::{Project, ProjectId, ProjectsBlob, DEFAULT_PROJECT_TITLE};
use crate::repo::kv_store::{KeyValueStore, RepoResult};
use crate::repo::project_repo::ProjectRepository;
use crate::service::forest_store::ForestStore;
use log::{debug, info, warn};

/// Lightweight listing entry for project pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub title: String,
    pub last_modified: i64,
}

/// All projects of one user, one of them active.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Inactive projects only; the active one lives in `active`.
    others: ProjectsBlob,
    active: ForestStore,
    palette: Palette,
}

impl Workspace {
    /// Creates a workspace holding one fresh default project.
    pub fn new(palette: Palette) -> Self {
        Self {
            others: ProjectsBlob::new(),
            active: ForestStore::with_palette(Project::new(DEFAULT_PROJECT_TITLE), palette),
            palette,
        }
    }

    /// Builds a workspace from loaded projects.
    ///
    /// A missing or dangling `active_id` selects the most recently modified
    /// project; an empty blob yields one default project.
    pub fn from_parts(mut projects: ProjectsBlob, active_id: Option<&str>, palette: Palette) -> Self {
        let chosen = active_id
            .filter(|id| projects.contains_key(*id))
            .map(str::to_string)
            .or_else(|| most_recent(&projects));

        let Some(chosen) = chosen else {
            info!("event=workspace_load module=workspace status=default reason=no_projects");
            return Self::new(palette);
        };
        if active_id != Some(chosen.as_str()) {
            warn!(
                "event=workspace_load module=workspace status=repaired reason=active_fallback requested={:?} chosen={}",
                active_id, chosen
            );
        }

        let Some(project) = projects.remove(&chosen) else {
            return Self::new(palette);
        };
        Self {
            others: projects,
            active: ForestStore::with_palette(project, palette),
            palette,
        }
    }

    /// Loads the workspace from durable storage.
    ///
    /// Read or decode failures are logged and replaced by a default project.
    pub fn load<S: KeyValueStore>(repo: &ProjectRepository<S>, palette: Palette) -> Self {
        let projects = match repo.load_projects() {
            Ok(projects) => projects.unwrap_or_default(),
            Err(err) => {
                warn!(
                    "event=workspace_load module=workspace status=repaired reason=unreadable_projects error={}",
                    err
                );
                ProjectsBlob::new()
            }
        };
        let active_id = match repo.load_active_project_id() {
            Ok(id) => id,
            Err(err) => {
                warn!(
                    "event=workspace_load module=workspace status=repaired reason=unreadable_active_id error={}",
                    err
                );
                None
            }
        };
        let workspace = Self::from_parts(projects, active_id.as_deref(), palette);
        info!(
            "event=workspace_load module=workspace status=ok projects={} active={}",
            workspace.project_count(),
            workspace.active_project_id()
        );
        workspace
    }

    /// Persists all projects and the active id.
    pub fn save<S: KeyValueStore>(&self, repo: &ProjectRepository<S>) -> RepoResult<()> {
        repo.save_projects(&self.to_blob())?;
        repo.save_active_project_id(self.active_project_id())?;
        debug!(
            "event=workspace_save module=workspace status=ok projects={}",
            self.project_count()
        );
        Ok(())
    }

    pub fn store(&self) -> &ForestStore {
        &self.active
    }

    pub fn store_mut(&mut self) -> &mut ForestStore {
        &mut self.active
    }

    pub fn active_project_id(&self) -> &str {
        &self.active.project().id
    }

    pub fn project_count(&self) -> usize {
        self.others.len() + 1
    }

    /// Snapshot of every project, active one included.
    pub fn to_blob(&self) -> ProjectsBlob {
        let mut blob = self.others.clone();
        let active = self.active.project().clone();
        blob.insert(active.id.clone(), active);
        blob
    }

    /// Projects sorted by `last_modified`, newest first.
    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        let mut summaries: Vec<ProjectSummary> = self
            .others
            .values()
            .chain(std::iter::once(self.active.project()))
            .map(|project| ProjectSummary {
                id: project.id.clone(),
                title: project.title.clone(),
                last_modified: project.last_modified,
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.last_modified
                .cmp(&a.last_modified)
                .then_with(|| a.id.cmp(&b.id))
        });
        summaries
    }

    /// Creates an empty project and makes it active.
    pub fn create_project(&mut self, title: impl Into<String>) -> ProjectId {
        let project = Project::new(normalize_title(title.into()));
        let id = project.id.clone();
        self.activate(project);
        info!("event=project_create module=workspace status=ok project_id={id}");
        id
    }

    /// Makes `id` the active project. Returns `false` for unknown ids.
    pub fn switch_project(&mut self, id: &str) -> bool {
        if self.active_project_id() == id {
            return true;
        }
        let Some(project) = self.others.remove(id) else {
            debug!("event=project_switch module=workspace status=noop reason=not_found project_id={id}");
            return false;
        };
        self.activate(project);
        info!("event=project_switch module=workspace status=ok project_id={id}");
        true
    }

    pub fn rename_project(&mut self, id: &str, title: impl Into<String>) -> bool {
        let title = normalize_title(title.into());
        if self.active_project_id() == id {
            self.active.set_title(title);
            return true;
        }
        let Some(project) = self.others.get_mut(id) else {
            debug!("event=project_rename module=workspace status=noop reason=not_found project_id={id}");
            return false;
        };
        project.title = title;
        project.touch();
        true
    }

    /// Deletes a project. Deleting the active project activates the most
    /// recent remaining one, or a fresh default when none remain.
    pub fn delete_project(&mut self, id: &str) -> bool {
        if self.others.remove(id).is_some() {
            info!("event=project_delete module=workspace status=ok project_id={id}");
            return true;
        }
        if self.active_project_id() != id {
            debug!("event=project_delete module=workspace status=noop reason=not_found project_id={id}");
            return false;
        }

        let next = most_recent(&self.others)
            .and_then(|next_id| self.others.remove(&next_id))
            .unwrap_or_else(|| Project::new(DEFAULT_PROJECT_TITLE));
        self.active = ForestStore::with_palette(next, self.palette);
        info!(
            "event=project_delete module=workspace status=ok project_id={} active={}",
            id,
            self.active_project_id()
        );
        true
    }

    fn activate(&mut self, project: Project) {
        let previous = std::mem::replace(
            &mut self.active,
            ForestStore::with_palette(project, self.palette),
        );
        let previous = previous.into_project();
        self.others.insert(previous.id.clone(), previous);
    }
}

fn most_recent(projects: &ProjectsBlob) -> Option<ProjectId> {
    projects
        .values()
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|project| project.id.clone())
}

fn normalize_title(title: String) -> String {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        DEFAULT_PROJECT_TITLE.to_string()
    } else {
        trimmed.to_string()
    }
}
