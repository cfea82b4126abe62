//! Drag-and-drop targeting and the drop-to-move protocol.
//!
//! # Responsibility
//! - Track one drag session: `Idle -> Dragging -> (Dropped | Cancelled) -> Idle`.
//! - Resolve the pointer into a drop target on every move.
//! - Turn the last resolved target into one store move on release.
//!
//! # Invariants
//! - Targets resolve in priority order: another card, another sibling group,
//!   the empty root column.
//! - The dragged card itself, its own sibling group and its own subtree are
//!   never targets.
//! - Every terminal transition clears the target, the gap indicator, the
//!   compact flag, the source id and any running autoscroll.

use crate::drag::autoscroll::{
    AutoScrollSettings, AutoScroller, FrameHandle, FrameScheduler, ScrollStep, ScrollZone,
};
use crate::drag::layout::{ColumnBox, GroupBox, Hit, LayoutSnapshot, Point};
use crate::model::card::CardId;
use crate::service::forest_store::ForestStore;
use log::{debug, info};
use std::collections::BTreeSet;

/// A resolved drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Become the last child of `parent_id`.
    Reparent {
        parent_id: CardId,
        column_index: usize,
    },
    /// Join the sibling group of `parent_id`, before `before_id` or at the end.
    InsertIntoGroup {
        parent_id: Option<CardId>,
        column_index: usize,
        before_id: Option<CardId>,
    },
    /// Join the root list at its first visible position.
    InsertIntoColumn {
        column_index: usize,
        before_id: Option<CardId>,
    },
}

/// Parameters handed to the store on drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropPlacement {
    pub parent_id: Option<CardId>,
    pub column_index: usize,
    pub before_id: Option<CardId>,
}

impl DropTarget {
    pub fn placement(&self) -> DropPlacement {
        match self {
            Self::Reparent {
                parent_id,
                column_index,
            } => DropPlacement {
                parent_id: Some(parent_id.clone()),
                column_index: *column_index,
                before_id: None,
            },
            Self::InsertIntoGroup {
                parent_id,
                column_index,
                before_id,
            } => DropPlacement {
                parent_id: parent_id.clone(),
                column_index: *column_index,
                before_id: before_id.clone(),
            },
            Self::InsertIntoColumn {
                column_index,
                before_id,
            } => DropPlacement {
                parent_id: None,
                column_index: *column_index,
                before_id: before_id.clone(),
            },
        }
    }
}

/// Where the insertion gap is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct GapIndicator {
    pub column_index: usize,
    pub parent_id: Option<CardId>,
    pub before_id: Option<CardId>,
    /// Vertical position of the gap line.
    pub y: f32,
}

impl GapIndicator {
    fn same_slot(&self, other: &GapIndicator) -> bool {
        self.column_index == other.column_index
            && self.parent_id == other.parent_id
            && self.before_id == other.before_id
    }
}

/// Visual affordances after one pointer move.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DragFeedback {
    pub target: Option<DropTarget>,
    /// Card to highlight as the reparent target.
    pub highlight: Option<CardId>,
    pub gap: Option<GapIndicator>,
    /// True when the gap must be redrawn (moved, appeared or vanished).
    pub gap_changed: bool,
    pub scroll_zone: Option<ScrollZone>,
}

/// Result of releasing the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped {
        card_id: CardId,
        placement: DropPlacement,
        /// Columns to re-render.
        affected_columns: BTreeSet<usize>,
    },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
enum DragState {
    Idle,
    Dragging {
        source_id: CardId,
        target: Option<DropTarget>,
        gap: Option<GapIndicator>,
    },
}

/// One drag-and-drop session over the board.
#[derive(Debug)]
pub struct DragSession<S: FrameScheduler> {
    state: DragState,
    scroller: AutoScroller<S>,
}

impl<S: FrameScheduler> DragSession<S> {
    pub fn new(scheduler: S, settings: AutoScrollSettings) -> Self {
        Self {
            state: DragState::Idle,
            scroller: AutoScroller::new(scheduler, settings),
        }
    }

    /// Starts dragging `card_id`. Unknown cards, or a drag already in
    /// progress, leave the session unchanged.
    pub fn begin(&mut self, card_id: &str, store: &ForestStore) -> bool {
        if self.is_dragging() {
            debug!("event=drag_begin module=drag status=noop reason=already_dragging card_id={card_id}");
            return false;
        }
        if store.get_card(card_id).is_none() {
            debug!("event=drag_begin module=drag status=noop reason=not_found card_id={card_id}");
            return false;
        }
        self.state = DragState::Dragging {
            source_id: card_id.to_string(),
            target: None,
            gap: None,
        };
        debug!("event=drag_begin module=drag status=ok card_id={card_id}");
        true
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Compact presentation mode is on for the whole drag.
    pub fn is_compact(&self) -> bool {
        self.is_dragging()
    }

    pub fn source_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { source_id, .. } => Some(source_id),
            DragState::Idle => None,
        }
    }

    pub fn current_target(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging { target, .. } => target.as_ref(),
            DragState::Idle => None,
        }
    }

    pub fn gap_indicator(&self) -> Option<&GapIndicator> {
        match &self.state {
            DragState::Dragging { gap, .. } => gap.as_ref(),
            DragState::Idle => None,
        }
    }

    pub fn autoscroller(&self) -> &AutoScroller<S> {
        &self.scroller
    }

    /// Re-resolves the drop target for the pointer at `point`.
    pub fn pointer_move(
        &mut self,
        point: Point,
        layout: &LayoutSnapshot,
        store: &ForestStore,
    ) -> DragFeedback {
        let DragState::Dragging {
            source_id,
            target,
            gap,
        } = &mut self.state
        else {
            return DragFeedback::default();
        };

        let resolved = resolve_target(source_id, point, layout, store);
        let highlight = match &resolved {
            Some(DropTarget::Reparent { parent_id, .. }) => Some(parent_id.clone()),
            _ => None,
        };
        let next_gap = resolved
            .as_ref()
            .and_then(|target| gap_for(target, layout));
        let gap_changed = match (gap.as_ref(), next_gap.as_ref()) {
            (None, None) => false,
            (Some(old), Some(new)) => !old.same_slot(new),
            _ => true,
        };

        *target = resolved.clone();
        *gap = next_gap.clone();

        let scroll_zone = scroll_zone_at(point, layout, self.scroller.settings());
        self.scroller.update(scroll_zone);

        DragFeedback {
            target: resolved,
            highlight,
            gap: next_gap,
            gap_changed,
            scroll_zone,
        }
    }

    /// Forwards a fired animation frame to the autoscroller.
    pub fn on_frame(&mut self, handle: FrameHandle) -> Option<ScrollStep> {
        if !self.is_dragging() {
            return None;
        }
        self.scroller.on_frame(handle)
    }

    /// Ends the drag and applies the last resolved target to `store`.
    pub fn release(&mut self, store: &mut ForestStore) -> DropOutcome {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        self.scroller.stop();

        let DragState::Dragging {
            source_id,
            target: Some(target),
            ..
        } = state
        else {
            debug!("event=drag_drop module=drag status=cancelled reason=no_target");
            return DropOutcome::Cancelled;
        };

        let placement = target.placement();
        let moved = store.move_card_before(
            &source_id,
            placement.parent_id.as_deref(),
            placement.before_id.as_deref(),
        );
        match moved {
            Some(affected_columns) => {
                info!(
                    "event=drag_drop module=drag status=ok card_id={} parent_id={:?} before_id={:?}",
                    source_id, placement.parent_id, placement.before_id
                );
                DropOutcome::Dropped {
                    card_id: source_id,
                    placement,
                    affected_columns,
                }
            }
            None => {
                debug!("event=drag_drop module=drag status=cancelled reason=rejected card_id={source_id}");
                DropOutcome::Cancelled
            }
        }
    }

    /// Ends the drag without mutating anything.
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("event=drag_cancel module=drag status=ok");
        }
        self.state = DragState::Idle;
        self.scroller.stop();
    }
}

fn resolve_target(
    source_id: &str,
    point: Point,
    layout: &LayoutSnapshot,
    store: &ForestStore,
) -> Option<DropTarget> {
    let source = store.get_card(source_id)?;
    let subtree = store.get_descendant_ids(source_id);
    let inside_subtree = |id: &str| id == source_id || subtree.iter().any(|d| d == id);

    match layout.hit_test(point) {
        Hit::Card { card, .. } => {
            if inside_subtree(&card.card_id) {
                return None;
            }
            let parent = store.get_card(&card.card_id)?;
            Some(DropTarget::Reparent {
                parent_id: parent.id.clone(),
                column_index: parent.column_index + 1,
            })
        }
        Hit::Group { group, .. } => {
            let own_group = group.parent_id == source.parent_id
                && group.column_index == source.column_index;
            if own_group {
                return None;
            }
            let column_index = match group.parent_id.as_deref() {
                Some(parent_id) if inside_subtree(parent_id) => return None,
                Some(parent_id) => store.get_card(parent_id)?.column_index + 1,
                None => 0,
            };
            Some(DropTarget::InsertIntoGroup {
                parent_id: group.parent_id.clone(),
                column_index,
                before_id: insertion_point(group, point, source_id),
            })
        }
        Hit::Column(column) if column.index == 0 => Some(DropTarget::InsertIntoColumn {
            column_index: 0,
            before_id: store
                .root_ids()
                .into_iter()
                .find(|id| id != source_id),
        }),
        Hit::Column(_) | Hit::Outside => None,
    }
}

/// First member (other than the dragged card) whose vertical midpoint lies
/// below the pointer.
fn insertion_point(group: &GroupBox, point: Point, source_id: &str) -> Option<CardId> {
    group
        .cards
        .iter()
        .filter(|card| card.card_id != source_id)
        .find(|card| point.y < card.rect.mid_y())
        .map(|card| card.card_id.clone())
}

fn gap_for(target: &DropTarget, layout: &LayoutSnapshot) -> Option<GapIndicator> {
    let placement = target.placement();
    let y = match target {
        DropTarget::Reparent { .. } => return None,
        DropTarget::InsertIntoGroup { .. } => match placement.before_id.as_deref() {
            Some(before) => layout.element_for_card(before)?.top(),
            None => group_box(layout, &placement)?.rect.bottom(),
        },
        DropTarget::InsertIntoColumn { column_index, .. } => {
            match placement.before_id.as_deref() {
                Some(before) => layout.element_for_card(before)?.top(),
                None => layout.column(*column_index)?.rect.top(),
            }
        }
    };
    Some(GapIndicator {
        column_index: placement.column_index,
        parent_id: placement.parent_id,
        before_id: placement.before_id,
        y,
    })
}

fn group_box<'a>(layout: &'a LayoutSnapshot, placement: &DropPlacement) -> Option<&'a GroupBox> {
    layout
        .column(placement.column_index)?
        .groups
        .iter()
        .find(|group| group.parent_id == placement.parent_id)
}

fn scroll_zone_at(
    point: Point,
    layout: &LayoutSnapshot,
    settings: &AutoScrollSettings,
) -> Option<ScrollZone> {
    layout
        .columns
        .iter()
        .find(|column: &&ColumnBox| column.rect.contains(point))
        .and_then(|column| {
            settings
                .direction_for(column.rect, point)
                .map(|direction| ScrollZone {
                    column_index: column.index,
                    direction,
                })
        })
}
