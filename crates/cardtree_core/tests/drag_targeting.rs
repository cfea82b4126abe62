use cardtree_core::drag::autoscroll::{ScrollDirection, ScrollZone};
use cardtree_core::{
    AutoScrollSettings, CardBox, ColumnBox, DragSession, DropOutcome, DropTarget, ForestStore,
    FrameHandle, FrameScheduler, GroupBox, LayoutSnapshot, Point, Project, Rect,
};

const COLUMN_WIDTH: f32 = 200.0;
const VIEWPORT_HEIGHT: f32 = 1000.0;
const TOP: f32 = 100.0;
const PADDING: f32 = 10.0;
const CARD_HEIGHT: f32 = 40.0;
const GROUP_GAP: f32 = 30.0;

#[derive(Debug, Default)]
struct TestScheduler {
    next: u64,
    requested: Vec<FrameHandle>,
    cancelled: Vec<FrameHandle>,
}

impl FrameScheduler for TestScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.requested.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.cancelled.push(handle);
    }
}

fn session() -> DragSession<TestScheduler> {
    DragSession::new(TestScheduler::default(), AutoScrollSettings::default())
}

/// Stacks each column's sibling groups top to bottom, the way the board draws
/// them: padded group boxes separated by a gap, one card box per member.
fn layout_of(store: &ForestStore) -> LayoutSnapshot {
    let mut columns = Vec::new();
    for index in 0..store.columns().len() {
        let x = index as f32 * COLUMN_WIDTH;
        let mut groups: Vec<GroupBox> = Vec::new();
        for card in store.get_column_cards(index) {
            let starts_group = groups
                .last()
                .map_or(true, |group| group.parent_id != card.parent_id);
            if starts_group {
                let y = groups
                    .last()
                    .map_or(TOP, |group| group.rect.bottom() + GROUP_GAP);
                groups.push(GroupBox {
                    parent_id: card.parent_id.clone(),
                    column_index: index,
                    rect: Rect::new(x, y, COLUMN_WIDTH, PADDING),
                    cards: Vec::new(),
                });
            }
            let group = groups.last_mut().unwrap();
            let top = group.rect.bottom();
            group.cards.push(CardBox {
                card_id: card.id.clone(),
                rect: Rect::new(x + 5.0, top, COLUMN_WIDTH - 10.0, CARD_HEIGHT),
            });
            group.rect.height += CARD_HEIGHT + PADDING;
        }
        columns.push(ColumnBox {
            index,
            rect: Rect::new(x, 0.0, COLUMN_WIDTH, VIEWPORT_HEIGHT),
            groups,
        });
    }
    LayoutSnapshot::new(columns)
}

fn center_of(layout: &LayoutSnapshot, card_id: &str) -> Point {
    let rect = layout.element_for_card(card_id).unwrap();
    Point::new(rect.x + rect.width / 2.0, rect.mid_y())
}

/// Two roots `(first, second)`; `second` owns one child.
fn two_roots() -> (ForestStore, String, String, String) {
    let mut store = ForestStore::new(Project::new("drag"));
    let first = store.insert_card(None, None);
    let second = store.insert_card(None, None);
    let child = store.insert_card(Some(second.id.as_str()), None);
    (store, first.id, second.id, child.id)
}

#[test]
fn pointer_above_only_member_inserts_before_it() {
    let mut store = ForestStore::new(Project::new("drag"));
    let first = store.insert_card(None, None);
    let second = store.insert_card(None, None);
    store.insert_card(Some(first.id.as_str()), None);
    store.delete_subtree(&first.id);
    let third = store.insert_card(None, None);
    let member = store.insert_card(Some(third.id.as_str()), None);

    let layout = layout_of(&store);
    let mut drag = session();
    assert!(drag.begin(&second.id, &store));
    assert!(drag.is_compact());

    let feedback = drag.pointer_move(Point::new(COLUMN_WIDTH + 20.0, TOP + 5.0), &layout, &store);
    let expected = DropTarget::InsertIntoGroup {
        parent_id: Some(third.id.clone()),
        column_index: 1,
        before_id: Some(member.id.clone()),
    };
    assert_eq!(feedback.target, Some(expected.clone()));
    assert_eq!(drag.current_target(), Some(&expected));
    assert!(feedback.gap_changed);
    assert_eq!(
        feedback.gap.unwrap().y,
        layout.element_for_card(&member.id).unwrap().top()
    );

    let outcome = drag.release(&mut store);
    assert!(matches!(outcome, DropOutcome::Dropped { ref card_id, .. } if *card_id == second.id));
    let moved = store.get_card(&second.id).unwrap();
    assert_eq!(moved.parent_id.as_deref(), Some(third.id.as_str()));
    assert_eq!(moved.column_index, 1);
    assert!(moved.order < store.get_card(&member.id).unwrap().order);
    assert!(!drag.is_compact());
    assert_eq!(drag.source_id(), None);
}

#[test]
fn pointer_below_members_appends_to_group() {
    let (mut store, first, _second, child) = two_roots();
    let layout = layout_of(&store);
    let group_bottom = layout.element_for_card(&child).unwrap().bottom() + 5.0;

    let mut drag = session();
    drag.begin(&first, &store);
    let feedback = drag.pointer_move(Point::new(COLUMN_WIDTH + 20.0, group_bottom), &layout, &store);
    assert!(matches!(
        feedback.target,
        Some(DropTarget::InsertIntoGroup { before_id: None, .. })
    ));

    drag.release(&mut store);
    let members: Vec<String> = store
        .get_siblings(&child)
        .into_iter()
        .map(|card| card.id.clone())
        .collect();
    assert_eq!(members, vec![first]);
    assert!(store.get_card(&members[0]).unwrap().order > store.get_card(&child).unwrap().order);
}

#[test]
fn hovering_another_card_reparents_onto_it() {
    let (mut store, first, second, child) = two_roots();
    let layout = layout_of(&store);

    let mut drag = session();
    drag.begin(&first, &store);
    let feedback = drag.pointer_move(center_of(&layout, &child), &layout, &store);
    assert_eq!(
        feedback.target,
        Some(DropTarget::Reparent {
            parent_id: child.clone(),
            column_index: 2,
        })
    );
    assert_eq!(feedback.highlight.as_deref(), Some(child.as_str()));
    assert_eq!(feedback.gap, None);

    match drag.release(&mut store) {
        DropOutcome::Dropped {
            affected_columns, ..
        } => assert!(affected_columns.contains(&0) && affected_columns.contains(&2)),
        DropOutcome::Cancelled => panic!("drop should apply"),
    }
    assert_eq!(store.get_ancestor_ids(&first), vec![second, child]);
    assert_eq!(store.get_card(&first).unwrap().column_index, 2);
}

#[test]
fn self_own_group_and_own_subtree_are_not_targets() {
    let (store, first, second, child) = two_roots();
    let layout = layout_of(&store);

    let mut drag = session();
    drag.begin(&second, &store);

    let over_self = drag.pointer_move(center_of(&layout, &second), &layout, &store);
    assert_eq!(over_self.target, None);

    let own_group_padding = Point::new(20.0, TOP + 2.0);
    assert_eq!(
        drag.pointer_move(own_group_padding, &layout, &store).target,
        None
    );

    let over_child = drag.pointer_move(center_of(&layout, &child), &layout, &store);
    assert_eq!(over_child.target, None);

    let over_sibling = drag.pointer_move(center_of(&layout, &first), &layout, &store);
    assert!(matches!(
        over_sibling.target,
        Some(DropTarget::Reparent { ref parent_id, .. }) if *parent_id == first
    ));
}

#[test]
fn empty_root_column_area_inserts_at_first_position() {
    let (mut store, first, _second, child) = two_roots();
    let layout = layout_of(&store);

    let mut drag = session();
    drag.begin(&child, &store);
    let feedback = drag.pointer_move(Point::new(20.0, 600.0), &layout, &store);
    assert_eq!(
        feedback.target,
        Some(DropTarget::InsertIntoColumn {
            column_index: 0,
            before_id: Some(first.clone()),
        })
    );

    drag.release(&mut store);
    let roots: Vec<String> = store
        .get_column_cards(0)
        .into_iter()
        .map(|card| card.id.clone())
        .collect();
    assert_eq!(roots[0], child);
    assert_eq!(store.get_card(&child).unwrap().parent_id, None);
}

#[test]
fn release_without_target_cancels_without_mutation() {
    let (mut store, first, _second, _child) = two_roots();
    let layout = layout_of(&store);
    let before = store.project().clone();

    let mut drag = session();
    drag.begin(&first, &store);
    let empty_column = Point::new(2.0 * COLUMN_WIDTH + 20.0, 600.0);
    assert_eq!(drag.pointer_move(empty_column, &layout, &store).target, None);
    let outside = Point::new(50.0 * COLUMN_WIDTH, 600.0);
    assert_eq!(drag.pointer_move(outside, &layout, &store).target, None);

    assert_eq!(drag.release(&mut store), DropOutcome::Cancelled);
    assert_eq!(store.project(), &before);
    assert_eq!(drag.current_target(), None);
}

#[test]
fn begin_requires_known_card_and_idle_session() {
    let (store, first, second, _child) = two_roots();
    let mut drag = session();

    assert!(!drag.begin("missing", &store));
    assert!(!drag.is_dragging());
    assert!(drag.begin(&first, &store));
    assert!(!drag.begin(&second, &store));
    assert_eq!(drag.source_id(), Some(first.as_str()));

    drag.cancel();
    assert!(!drag.is_compact());
    assert_eq!(drag.source_id(), None);
}

#[test]
fn gap_changes_only_when_slot_moves() {
    let mut store = ForestStore::new(Project::new("drag"));
    let dragged = store.insert_card(None, None);
    let parent = store.insert_card(None, None);
    let upper = store.insert_card(Some(parent.id.as_str()), None);
    store.insert_card(Some(parent.id.as_str()), None);
    let layout = layout_of(&store);
    let x = COLUMN_WIDTH + 20.0;

    let mut drag = session();
    drag.begin(&dragged.id, &store);
    assert!(drag.pointer_move(Point::new(x, TOP + 2.0), &layout, &store).gap_changed);
    assert!(!drag.pointer_move(Point::new(x, TOP + 4.0), &layout, &store).gap_changed);

    let upper_rect = layout.element_for_card(&upper.id).unwrap();
    let between = Point::new(x, upper_rect.bottom() + 2.0);
    let feedback = drag.pointer_move(between, &layout, &store);
    assert!(feedback.gap_changed);
    assert_eq!(drag.gap_indicator(), feedback.gap.as_ref());

    let off_board = Point::new(-10.0, 500.0);
    assert!(drag.pointer_move(off_board, &layout, &store).gap_changed);
    assert_eq!(drag.gap_indicator(), None);
}

#[test]
fn edge_zone_drives_autoscroll_until_drag_ends() {
    let (store, first, _second, _child) = two_roots();
    let layout = layout_of(&store);

    let mut drag = session();
    drag.begin(&first, &store);
    let feedback = drag.pointer_move(Point::new(20.0, VIEWPORT_HEIGHT - 5.0), &layout, &store);
    assert_eq!(
        feedback.scroll_zone,
        Some(ScrollZone {
            column_index: 0,
            direction: ScrollDirection::Down,
        })
    );

    let step = drag.on_frame(FrameHandle(1)).unwrap();
    assert_eq!(step.column_index, 0);
    assert!(step.delta_y > 0.0);
    assert!(drag.on_frame(FrameHandle(2)).is_some());

    drag.pointer_move(Point::new(20.0, 500.0), &layout, &store);
    assert!(!drag.autoscroller().is_active());
    assert_eq!(drag.autoscroller().scheduler().cancelled, vec![FrameHandle(3)]);

    drag.pointer_move(Point::new(20.0, 5.0), &layout, &store);
    assert!(drag.autoscroller().is_active());
    drag.cancel();
    assert!(!drag.autoscroller().is_active());
    assert_eq!(drag.on_frame(FrameHandle(4)), None);
}
