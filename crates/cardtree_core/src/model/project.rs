//! Project records and their board data.
//!
//! # Responsibility
//! - Define `Project`, `ProjectData` and the persisted projects blob shape.
//! - Repair structurally invalid board data to a usable default.
//!
//! # Invariants
//! - `ProjectData::columns.len() >= MIN_COLUMNS` after `repair()`.
//! - Every card's `column_index` is a valid column index after `repair()`.
//! - A card map key always equals the card's own `id` after `repair()`.

use crate::model::card::{Card, CardId, Column};
use crate::model::id::generate_id;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Minimum number of columns a board keeps at all times.
pub const MIN_COLUMNS: usize = 3;

/// Title given to synthesized projects.
pub const DEFAULT_PROJECT_TITLE: &str = "Untitled project";

/// Stable project identifier.
pub type ProjectId = String;

/// Persisted mapping of project id to project.
pub type ProjectsBlob = BTreeMap<ProjectId, Project>;

/// Board content of one project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    pub columns: Vec<Column>,
    pub cards: BTreeMap<CardId, Card>,
    #[serde(default)]
    pub global_prompt: String,
}

impl Default for ProjectData {
    fn default() -> Self {
        Self {
            columns: (0..MIN_COLUMNS).map(|_| Column::new()).collect(),
            cards: BTreeMap::new(),
            global_prompt: String::new(),
        }
    }
}

impl ProjectData {
    /// Builds board data from an untyped JSON value, salvaging what parses.
    ///
    /// A value that is not an object, or whose `columns`/`cards` members do not
    /// have the expected shape, has those members replaced by defaults.
    pub fn from_value(value: serde_json::Value) -> Self {
        if let Ok(mut data) = serde_json::from_value::<ProjectData>(value.clone()) {
            data.repair();
            return data;
        }

        warn!("event=project_data_repair module=model status=repaired reason=invalid_shape");
        let mut data = ProjectData::default();
        if let serde_json::Value::Object(map) = value {
            if let Some(columns) = map
                .get("columns")
                .cloned()
                .and_then(|v| serde_json::from_value::<Vec<Column>>(v).ok())
            {
                data.columns = columns;
            }
            if let Some(cards) = map
                .get("cards")
                .cloned()
                .and_then(|v| serde_json::from_value::<BTreeMap<CardId, Card>>(v).ok())
            {
                data.cards = cards;
            }
            if let Some(prompt) = map.get("globalPrompt").and_then(|v| v.as_str()) {
                data.global_prompt = prompt.to_string();
            }
        }
        data.repair();
        data
    }

    /// Restores structural invariants in place. Returns whether anything changed.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;

        let keyed_wrong: Vec<CardId> = self
            .cards
            .iter()
            .filter(|(key, card)| **key != card.id)
            .map(|(key, _)| key.clone())
            .collect();
        for key in keyed_wrong {
            if let Some(card) = self.cards.remove(&key) {
                warn!(
                    "event=project_data_repair module=model status=repaired reason=card_key_mismatch key={} card_id={}",
                    key, card.id
                );
                self.cards.insert(card.id.clone(), card);
                changed = true;
            }
        }

        let needed = self
            .cards
            .values()
            .map(|card| card.column_index + 1)
            .max()
            .unwrap_or(0)
            .max(MIN_COLUMNS);
        if self.columns.len() < needed {
            warn!(
                "event=project_data_repair module=model status=repaired reason=missing_columns have={} need={}",
                self.columns.len(),
                needed
            );
            self.columns.resize_with(needed, Column::new);
            changed = true;
        }

        changed
    }
}

/// One project record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    /// Epoch ms of the last mutation.
    #[serde(default)]
    pub last_modified: i64,
    #[serde(default, deserialize_with = "lenient_project_data")]
    pub data: ProjectData,
}

impl Project {
    /// Creates an empty project with `MIN_COLUMNS` columns and no cards.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            title: title.into(),
            last_modified: now_ms(),
            data: ProjectData::default(),
        }
    }

    /// Stamps `last_modified` with the current time.
    pub fn touch(&mut self) {
        // Never move backwards, even if the clock does.
        self.last_modified = now_ms().max(self.last_modified.saturating_add(1));
    }
}

fn lenient_project_data<'de, D>(deserializer: D) -> Result<ProjectData, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(ProjectData::from_value(value))
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{Project, ProjectData, MIN_COLUMNS};
    use crate::model::card::Card;
    use serde_json::json;

    #[test]
    fn new_project_has_minimum_columns_and_no_cards() {
        let project = Project::new("Draft");
        assert_eq!(project.data.columns.len(), MIN_COLUMNS);
        assert!(project.data.cards.is_empty());
        assert!(project.last_modified > 0);
    }

    #[test]
    fn repair_adds_columns_for_deep_cards() {
        let mut data = ProjectData::default();
        let card = Card::new(Some("x".to_string()), 4, 0.0);
        data.cards.insert(card.id.clone(), card);

        assert!(data.repair());
        assert_eq!(data.columns.len(), 5);
        assert!(!data.repair());
    }

    #[test]
    fn invalid_shape_falls_back_to_default_structure() {
        let data = ProjectData::from_value(json!({ "columns": 7, "cards": "nope" }));
        assert_eq!(data.columns.len(), MIN_COLUMNS);
        assert!(data.cards.is_empty());
    }

    #[test]
    fn project_with_missing_data_deserializes_to_default_board() {
        let project: Project =
            serde_json::from_value(json!({ "id": "p1", "title": "Old" })).unwrap();
        assert_eq!(project.data.columns.len(), MIN_COLUMNS);
    }

    #[test]
    fn salvage_keeps_valid_cards_when_columns_are_broken() {
        let data = ProjectData::from_value(json!({
            "columns": null,
            "cards": {
                "a": { "id": "a", "parentId": null, "columnIndex": 0, "order": 1.0 }
            }
        }));
        assert_eq!(data.cards.len(), 1);
        assert_eq!(data.columns.len(), MIN_COLUMNS);
    }

    #[test]
    fn touch_is_monotonic() {
        let mut project = Project::new("Draft");
        project.last_modified = i64::MAX / 2;
        let before = project.last_modified;
        project.touch();
        assert!(project.last_modified > before);
    }

    #[test]
    fn touch_saturates_at_max_timestamp() {
        let mut project = Project::new("Draft");
        project.last_modified = i64::MAX;
        project.touch();
        assert_eq!(project.last_modified, i64::MAX);
    }
}
