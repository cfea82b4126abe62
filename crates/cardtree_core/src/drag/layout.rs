//! Render-tree geometry supplied by the presentation layer.
//!
//! # Responsibility
//! - Describe where columns, sibling groups and cards were last drawn.
//! - Hit-test a pointer position against that snapshot.
//!
//! # Invariants
//! - Hit priority is card, then group, then column.
//! - Coordinates share one space (viewport pixels, y grows downward).

use crate::model::card::CardId;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `contains` is inclusive on the top/left edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn mid_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.bottom()
    }
}

/// One drawn card.
#[derive(Debug, Clone, PartialEq)]
pub struct CardBox {
    pub card_id: CardId,
    pub rect: Rect,
}

/// One drawn sibling group: children of `parent_id` within a column.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBox {
    /// `None` for the root group in column 0.
    pub parent_id: Option<CardId>,
    pub column_index: usize,
    pub rect: Rect,
    /// Members in visual (top to bottom) order.
    pub cards: Vec<CardBox>,
}

/// One drawn column; its rect is the scrollable viewport of the column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBox {
    pub index: usize,
    pub rect: Rect,
    pub groups: Vec<GroupBox>,
}

/// What lies under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit<'a> {
    Card {
        column: &'a ColumnBox,
        group: &'a GroupBox,
        card: &'a CardBox,
    },
    Group {
        column: &'a ColumnBox,
        group: &'a GroupBox,
    },
    Column(&'a ColumnBox),
    Outside,
}

/// Geometry of the board as last rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutSnapshot {
    pub columns: Vec<ColumnBox>,
}

impl LayoutSnapshot {
    pub fn new(columns: Vec<ColumnBox>) -> Self {
        Self { columns }
    }

    pub fn hit_test(&self, point: Point) -> Hit<'_> {
        let Some(column) = self.columns.iter().find(|column| column.rect.contains(point)) else {
            return Hit::Outside;
        };
        for group in &column.groups {
            if let Some(card) = group.cards.iter().find(|card| card.rect.contains(point)) {
                return Hit::Card {
                    column,
                    group,
                    card,
                };
            }
            if group.rect.contains(point) {
                return Hit::Group { column, group };
            }
        }
        Hit::Column(column)
    }

    /// Where `card_id` was drawn, if it is on screen.
    pub fn element_for_card(&self, card_id: &str) -> Option<Rect> {
        self.columns
            .iter()
            .flat_map(|column| column.groups.iter())
            .flat_map(|group| group.cards.iter())
            .find(|card| card.card_id == card_id)
            .map(|card| card.rect)
    }

    /// Index of the column under `point`.
    pub fn column_index_at(&self, point: Point) -> Option<usize> {
        self.columns
            .iter()
            .find(|column| column.rect.contains(point))
            .map(|column| column.index)
    }

    pub fn column(&self, index: usize) -> Option<&ColumnBox> {
        self.columns.iter().find(|column| column.index == index)
    }
}
