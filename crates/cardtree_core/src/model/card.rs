//! Card and column records.
//!
//! # Responsibility
//! - Define the persisted shape of one card and one column.
//!
//! # Invariants
//! - Root cards (`parent_id == None`) live in column 0.
//! - A child card lives exactly one column right of its parent.
//! - `order` is only meaningful among siblings sharing `(parent_id, column_index)`.
//! - `color` is a cached value of the color cascade for the current ancestry.

use crate::model::id::generate_id;
use serde::{Deserialize, Serialize};

/// Stable card identifier.
pub type CardId = String;

/// Stable column identifier.
pub type ColumnId = String;

/// One card in the ordered forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    /// `None` means root card.
    pub parent_id: Option<CardId>,
    pub column_index: usize,
    /// Relative position among siblings. Not unique.
    pub order: f64,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub name: Option<String>,
    /// CSS `hsl(...)` string produced by the color cascade.
    #[serde(default)]
    pub color: String,
}

impl Card {
    /// Creates an empty card with a generated id and no color yet.
    pub fn new(parent_id: Option<CardId>, column_index: usize, order: f64) -> Self {
        Self {
            id: generate_id(),
            parent_id,
            column_index,
            order,
            content: String::new(),
            name: None,
            color: String::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns whether `other` shares this card's sibling group.
    pub fn is_sibling_of(&self, other: &Card) -> bool {
        self.parent_id == other.parent_id && self.column_index == other.column_index
    }
}

/// One column of the board. Its index is its position in `ProjectData::columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    /// Guidance text for generation requests scoped to this column.
    #[serde(default)]
    pub prompt: String,
}

impl Column {
    pub fn new() -> Self {
        Self {
            id: generate_id(),
            prompt: String::new(),
        }
    }
}

impl Default for Column {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Card;

    #[test]
    fn card_serializes_with_camel_case_keys() {
        let card = Card::new(Some("p".to_string()), 1, 2.5);
        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["parentId"], "p");
        assert_eq!(value["columnIndex"], 1);
        assert_eq!(value["order"], 2.5);
        assert!(value["name"].is_null());
    }

    #[test]
    fn card_without_optional_fields_deserializes() {
        let card: Card = serde_json::from_str(
            r#"{"id":"a","parentId":null,"columnIndex":0,"order":1.0}"#,
        )
        .unwrap();
        assert!(card.is_root());
        assert!(card.content.is_empty());
        assert!(card.color.is_empty());
    }
}
