//! Ordered-forest store for the active project.
//!
//! # Responsibility
//! - Own the card and column maps of one project.
//! - Answer structural queries (children, siblings, ancestry, column order).
//! - Apply add/delete/move/reparent mutations and keep cached colors current.
//!
//! # Invariants
//! - Root cards live in column 0; children live one column right of their parent.
//! - `columns.len() >= MIN_COLUMNS` and covers every card's column.
//! - Unknown ids are no-ops (`false`, `None` or empty results), never errors.
//! - `move_card` recolors only the moved card; `reparent_children` recolors the
//!   moved cards and all their descendants.

use crate::model::card::{Card, CardId, Column};
use crate::model::color::{child_color, root_color, CardColor, Palette};
use crate::model::order_path::{order_between, order_path, sort_by_order_path};
use crate::model::project::{Project, MIN_COLUMNS};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Result of `delete_subtree`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The deleted card and all of its descendants.
    pub removed_ids: BTreeSet<CardId>,
    /// Column indices that lost at least one card.
    pub touched_columns: BTreeSet<usize>,
}

impl DeleteOutcome {
    pub fn is_empty(&self) -> bool {
        self.removed_ids.is_empty()
    }
}

/// Single owner of the active project's board.
#[derive(Debug, Clone)]
pub struct ForestStore {
    project: Project,
    palette: Palette,
}

impl ForestStore {
    /// Wraps a project using the default palette.
    pub fn new(project: Project) -> Self {
        Self::with_palette(project, Palette::default())
    }

    /// Wraps a project, repairing its structure and refreshing all colors.
    pub fn with_palette(project: Project, palette: Palette) -> Self {
        let mut store = Self { project, palette };
        let mut repaired = store.project.data.repair();
        repaired |= store.repair_links();
        let recolored = store.recolor_all();
        if repaired {
            warn!(
                "event=store_open module=store status=repaired project_id={} cards={}",
                store.project.id,
                store.project.data.cards.len()
            );
        } else {
            debug!(
                "event=store_open module=store status=ok project_id={} cards={} recolored={}",
                store.project.id,
                store.project.data.cards.len(),
                recolored
            );
        }
        store
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    // ----- queries -----

    pub fn get_card(&self, id: &str) -> Option<&Card> {
        self.cards().get(id)
    }

    pub fn card_count(&self) -> usize {
        self.cards().len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.project.data.columns
    }

    pub fn get_column(&self, index: usize) -> Option<&Column> {
        self.project.data.columns.get(index)
    }

    pub fn global_prompt(&self) -> &str {
        &self.project.data.global_prompt
    }

    /// All cards of one column in global order-path order.
    pub fn get_column_cards(&self, index: usize) -> Vec<&Card> {
        let column = self
            .cards()
            .values()
            .filter(|card| card.column_index == index)
            .collect();
        sort_by_order_path(self.cards(), column)
    }

    /// Children of `parent_id` (`None` = roots), ordered by `order`.
    ///
    /// `column_index` narrows the result to one column when given.
    pub fn get_children(&self, parent_id: Option<&str>, column_index: Option<usize>) -> Vec<&Card> {
        let mut children: Vec<&Card> = self
            .cards()
            .values()
            .filter(|card| card.parent_id.as_deref() == parent_id)
            .filter(|card| column_index.map_or(true, |column| card.column_index == column))
            .collect();
        sort_sibling_group(&mut children);
        children
    }

    /// Other members of the card's sibling group, ordered by `order`.
    pub fn get_siblings(&self, id: &str) -> Vec<&Card> {
        let Some(card) = self.get_card(id) else {
            return Vec::new();
        };
        let mut siblings: Vec<&Card> = self
            .cards()
            .values()
            .filter(|other| other.id != card.id && other.is_sibling_of(card))
            .collect();
        sort_sibling_group(&mut siblings);
        siblings
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn get_descendant_ids(&self, id: &str) -> Vec<CardId> {
        let mut result = Vec::new();
        if self.get_card(id).is_none() {
            return result;
        }
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut stack: Vec<&Card> = self.get_children(Some(id), None);
        stack.reverse();
        while let Some(card) = stack.pop() {
            if !seen.insert(card.id.as_str()) {
                continue;
            }
            result.push(card.id.clone());
            let mut children = self.get_children(Some(card.id.as_str()), None);
            children.reverse();
            stack.extend(children);
        }
        result
    }

    /// Ancestors of `id`, root first, immediate parent last.
    pub fn get_ancestor_ids(&self, id: &str) -> Vec<CardId> {
        let mut ancestors = Vec::new();
        let mut seen: HashSet<&str> = HashSet::from([id]);
        let mut cursor = self
            .get_card(id)
            .and_then(|card| card.parent_id.as_deref())
            .and_then(|parent| self.get_card(parent));
        while let Some(card) = cursor {
            if !seen.insert(card.id.as_str()) {
                break;
            }
            ancestors.push(card.id.clone());
            cursor = card.parent_id.as_deref().and_then(|parent| self.get_card(parent));
        }
        ancestors.reverse();
        ancestors
    }

    /// Order path of `id` (root order first).
    pub fn order_path(&self, id: &str) -> Vec<f64> {
        order_path(self.cards(), id)
    }

    /// Root ids ordered by `order`, ties broken by id.
    pub fn root_ids(&self) -> Vec<CardId> {
        self.get_children(None, Some(0))
            .into_iter()
            .map(|card| card.id.clone())
            .collect()
    }

    /// Zero-based position of the card's root among all roots.
    pub fn root_index(&self, card: &Card) -> usize {
        let root_id = self
            .get_ancestor_ids(&card.id)
            .into_iter()
            .next()
            .unwrap_or_else(|| card.id.clone());
        self.root_ids()
            .iter()
            .position(|id| *id == root_id)
            .unwrap_or(0)
    }

    /// Cascade color for `card` given its current ancestry.
    ///
    /// Evaluated top-down on every call: the parent's color is computed first,
    /// then darkened one step.
    pub fn color_of(&self, card: &Card) -> CardColor {
        self.color_within(card, self.cards().len())
    }

    fn color_within(&self, card: &Card, budget: usize) -> CardColor {
        let parent = card
            .parent_id
            .as_deref()
            .and_then(|parent| self.get_card(parent));
        match parent {
            Some(parent) if budget > 0 => {
                child_color(&self.palette, self.color_within(parent, budget - 1))
            }
            _ => root_color(&self.palette, self.root_index(card)),
        }
    }

    /// Order for a card inserted into the group `(parent_id, column_index)`
    /// right before `before_id`, or after the last member when `before_id` is
    /// `None` or not in the group. `exclude_id` is left out of the group.
    pub fn order_for_insert(
        &self,
        parent_id: Option<&str>,
        column_index: usize,
        before_id: Option<&str>,
        exclude_id: Option<&str>,
    ) -> f64 {
        let group: Vec<&Card> = self
            .get_children(parent_id, Some(column_index))
            .into_iter()
            .filter(|card| Some(card.id.as_str()) != exclude_id)
            .collect();
        let position = before_id.and_then(|before| group.iter().position(|card| card.id == before));
        match position {
            Some(index) => order_between(
                index.checked_sub(1).map(|prev| group[prev].order),
                Some(group[index].order),
            ),
            None => order_between(group.last().map(|card| card.order), None),
        }
    }

    // ----- mutations -----

    /// Creates an empty card and returns a copy of it.
    ///
    /// The column is derived from the parent: a known parent puts the card one
    /// column right of it, a missing or unknown parent makes it a root in
    /// column 0. A disagreeing `column_index` is corrected and logged.
    pub fn add_card(&mut self, parent_id: Option<&str>, column_index: usize, order: f64) -> Card {
        let (parent_id, column_index) = self.normalize_placement(parent_id, Some(column_index));
        let roots_before = self.root_ids();
        self.ensure_columns(column_index + 1);

        let card = Card::new(parent_id, column_index, order);
        let id = card.id.clone();
        self.project.data.cards.insert(id.clone(), card);
        self.refresh_color(&id);
        self.recolor_shifted_roots(&roots_before, Some(id.as_str()));
        self.project.touch();

        info!(
            "event=card_add module=store status=ok card_id={} column={} order={}",
            id, column_index, order
        );
        self.project.data.cards[&id].clone()
    }

    /// Creates an empty card in the group of `parent_id`, placed before
    /// `before_id` or at the end of the group.
    pub fn insert_card(&mut self, parent_id: Option<&str>, before_id: Option<&str>) -> Card {
        let (parent_id, column_index) = self.normalize_placement(parent_id, None);
        let order = self.order_for_insert(parent_id.as_deref(), column_index, before_id, None);
        self.add_card(parent_id.as_deref(), column_index, order)
    }

    pub fn update_content(&mut self, id: &str, text: impl Into<String>) -> bool {
        let Some(card) = self.project.data.cards.get_mut(id) else {
            debug!("event=card_update module=store status=noop reason=not_found card_id={id}");
            return false;
        };
        card.content = text.into();
        self.project.touch();
        true
    }

    /// Sets or clears the card name. Blank names are stored as `None`.
    pub fn update_name(&mut self, id: &str, name: Option<String>) -> bool {
        let Some(card) = self.project.data.cards.get_mut(id) else {
            debug!("event=card_rename module=store status=noop reason=not_found card_id={id}");
            return false;
        };
        card.name = name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self.project.touch();
        true
    }

    /// Removes `id` and every descendant.
    pub fn delete_subtree(&mut self, id: &str) -> DeleteOutcome {
        if self.get_card(id).is_none() {
            debug!("event=card_delete module=store status=noop reason=not_found card_id={id}");
            return DeleteOutcome::default();
        }
        let roots_before = self.root_ids();

        let mut outcome = DeleteOutcome::default();
        let mut doomed = vec![id.to_string()];
        doomed.extend(self.get_descendant_ids(id));
        for card_id in doomed {
            if let Some(card) = self.project.data.cards.remove(&card_id) {
                outcome.touched_columns.insert(card.column_index);
                outcome.removed_ids.insert(card.id);
            }
        }

        self.recolor_shifted_roots(&roots_before, None);
        self.project.touch();
        info!(
            "event=card_delete module=store status=ok card_id={} removed={} columns={:?}",
            id,
            outcome.removed_ids.len(),
            outcome.touched_columns
        );
        outcome
    }

    /// Moves one card (with its subtree) to a new parent, column and order.
    ///
    /// Returns the affected column indices, or `None` when the card or target
    /// parent is unknown or the target parent lies inside the card's own
    /// subtree. Descendants are shifted by the same column delta but keep
    /// their cached colors.
    pub fn move_card(
        &mut self,
        id: &str,
        target_column_index: usize,
        target_parent_id: Option<&str>,
        order: f64,
    ) -> Option<BTreeSet<usize>> {
        let Some(card) = self.get_card(id) else {
            debug!("event=card_move module=store status=noop reason=not_found card_id={id}");
            return None;
        };
        let old_column = card.column_index;

        if let Some(parent) = target_parent_id {
            if self.get_card(parent).is_none() {
                debug!(
                    "event=card_move module=store status=noop reason=not_found card_id={id} parent_id={parent}"
                );
                return None;
            }
            if parent == id || self.get_descendant_ids(id).iter().any(|d| d == parent) {
                warn!(
                    "event=card_move module=store status=rejected reason=cycle card_id={id} parent_id={parent}"
                );
                return None;
            }
        }

        let (parent_id, column_index) =
            self.normalize_placement(target_parent_id, Some(target_column_index));
        let roots_before = self.root_ids();
        let mut affected = BTreeSet::from([old_column, column_index]);
        affected.extend(self.shift_subtree_columns(id, old_column, column_index));

        if let Some(card) = self.project.data.cards.get_mut(id) {
            card.parent_id = parent_id;
            card.column_index = column_index;
            card.order = order;
        }
        self.refresh_color(id);
        self.recolor_shifted_roots(&roots_before, Some(id));
        self.project.touch();

        info!(
            "event=card_move module=store status=ok card_id={} from_column={} to_column={} order={}",
            id, old_column, column_index, order
        );
        Some(affected)
    }

    /// Moves `id` into the group of `target_parent_id`, right before
    /// `before_id` or at the end of the group.
    pub fn move_card_before(
        &mut self,
        id: &str,
        target_parent_id: Option<&str>,
        before_id: Option<&str>,
    ) -> Option<BTreeSet<usize>> {
        if let Some(parent) = target_parent_id.filter(|parent| self.get_card(parent).is_none()) {
            debug!(
                "event=card_move module=store status=noop reason=not_found card_id={id} parent_id={parent}"
            );
            return None;
        }
        let (parent_id, column_index) = self.normalize_placement(target_parent_id, None);
        let order = self.order_for_insert(parent_id.as_deref(), column_index, before_id, Some(id));
        self.move_card(id, column_index, parent_id.as_deref(), order)
    }

    /// Moves every direct child of `old_parent_id` under `new_parent_id`,
    /// after the new parent's existing children, keeping their relative order.
    ///
    /// Moved cards and all their descendants are recolored.
    pub fn reparent_children(&mut self, old_parent_id: &str, new_parent_id: &str) -> BTreeSet<usize> {
        let mut affected = BTreeSet::new();
        let (Some(old_parent), Some(new_parent)) =
            (self.get_card(old_parent_id), self.get_card(new_parent_id))
        else {
            debug!(
                "event=card_reparent module=store status=noop reason=not_found old_parent_id={old_parent_id} new_parent_id={new_parent_id}"
            );
            return affected;
        };
        if old_parent_id == new_parent_id
            || self
                .get_descendant_ids(old_parent_id)
                .iter()
                .any(|d| d == new_parent_id)
        {
            warn!(
                "event=card_reparent module=store status=rejected reason=cycle old_parent_id={old_parent_id} new_parent_id={new_parent_id}"
            );
            return affected;
        }

        let old_column = old_parent.column_index + 1;
        let new_column = new_parent.column_index + 1;
        let moved: Vec<CardId> = self
            .get_children(Some(old_parent_id), None)
            .into_iter()
            .map(|card| card.id.clone())
            .collect();
        if moved.is_empty() {
            debug!(
                "event=card_reparent module=store status=noop reason=no_children old_parent_id={old_parent_id}"
            );
            return affected;
        }

        let mut previous = self
            .get_children(Some(new_parent_id), Some(new_column))
            .last()
            .map(|card| card.order);
        affected.insert(old_column);
        affected.insert(new_column);
        for child_id in &moved {
            let order = order_between(previous, None);
            previous = Some(order);
            affected.extend(self.shift_subtree_columns(child_id, old_column, new_column));
            if let Some(card) = self.project.data.cards.get_mut(child_id) {
                card.parent_id = Some(new_parent_id.to_string());
                card.column_index = new_column;
                card.order = order;
            }
        }
        for child_id in &moved {
            self.refresh_subtree_colors(child_id);
        }
        self.project.touch();

        info!(
            "event=card_reparent module=store status=ok old_parent_id={} new_parent_id={} moved={}",
            old_parent_id,
            new_parent_id,
            moved.len()
        );
        affected
    }

    /// Recomputes every cached color. Returns how many changed.
    pub fn recolor_all(&mut self) -> usize {
        let ids: Vec<CardId> = self.cards().keys().cloned().collect();
        ids.iter().filter(|id| self.refresh_color(id)).count()
    }

    // ----- columns and prompts -----

    /// Appends an empty column and returns its index.
    pub fn add_column(&mut self) -> usize {
        self.project.data.columns.push(Column::new());
        self.project.touch();
        let index = self.project.data.columns.len() - 1;
        info!("event=column_add module=store status=ok column={index}");
        index
    }

    /// Removes the rightmost column when it is empty and above the minimum.
    pub fn remove_last_column(&mut self) -> bool {
        let count = self.project.data.columns.len();
        if count <= MIN_COLUMNS {
            debug!("event=column_remove module=store status=noop reason=minimum columns={count}");
            return false;
        }
        let last = count - 1;
        if self.cards().values().any(|card| card.column_index == last) {
            debug!("event=column_remove module=store status=noop reason=not_empty column={last}");
            return false;
        }
        self.project.data.columns.pop();
        self.project.touch();
        info!("event=column_remove module=store status=ok column={last}");
        true
    }

    pub fn set_column_prompt(&mut self, index: usize, prompt: impl Into<String>) -> bool {
        let Some(column) = self.project.data.columns.get_mut(index) else {
            debug!("event=column_prompt module=store status=noop reason=not_found column={index}");
            return false;
        };
        column.prompt = prompt.into();
        self.project.touch();
        true
    }

    pub fn set_global_prompt(&mut self, prompt: impl Into<String>) {
        self.project.data.global_prompt = prompt.into();
        self.project.touch();
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.project.title = title.into();
        self.project.touch();
    }

    // ----- internals -----

    fn cards(&self) -> &BTreeMap<CardId, Card> {
        &self.project.data.cards
    }

    /// Resolves `(parent, column)` from the parent card. `requested` is the
    /// caller's column, if it named one.
    fn normalize_placement(
        &self,
        parent_id: Option<&str>,
        requested: Option<usize>,
    ) -> (Option<CardId>, usize) {
        let placement = match parent_id.and_then(|parent| self.get_card(parent)) {
            Some(parent) => (Some(parent.id.clone()), parent.column_index + 1),
            None => (None, 0),
        };
        let column_mismatch = requested.is_some_and(|column| column != placement.1);
        if column_mismatch || placement.0.as_deref() != parent_id {
            warn!(
                "event=placement_normalize module=store status=repaired parent_id={:?} column={:?} resolved_parent_id={:?} resolved_column={}",
                parent_id, requested, placement.0, placement.1
            );
        }
        placement
    }

    fn ensure_columns(&mut self, count: usize) {
        let columns = &mut self.project.data.columns;
        if columns.len() < count {
            columns.resize_with(count, Column::new);
        }
    }

    /// Shifts every descendant of `id` by `to - from` columns.
    ///
    /// Returns each descendant's old and new column.
    fn shift_subtree_columns(&mut self, id: &str, from: usize, to: usize) -> BTreeSet<usize> {
        let mut touched = BTreeSet::new();
        let descendants = self.get_descendant_ids(id);
        let mut widest = 0;
        for descendant in &descendants {
            if let Some(card) = self.project.data.cards.get_mut(descendant) {
                touched.insert(card.column_index);
                card.column_index = (card.column_index + to).saturating_sub(from);
                touched.insert(card.column_index);
                widest = widest.max(card.column_index + 1);
            }
        }
        self.ensure_columns(widest);
        touched
    }

    /// Stores the freshly computed color of `id`. Returns whether it changed.
    fn refresh_color(&mut self, id: &str) -> bool {
        let Some(card) = self.get_card(id) else {
            return false;
        };
        let color = self.color_of(card);
        // Cached strings that parse to the same color are left untouched.
        if card.color.parse::<CardColor>().is_ok_and(|cached| cached == color) {
            return false;
        }
        match self.project.data.cards.get_mut(id) {
            Some(card) => {
                card.color = color.to_string();
                true
            }
            None => false,
        }
    }

    fn refresh_subtree_colors(&mut self, id: &str) {
        self.refresh_color(id);
        for descendant in self.get_descendant_ids(id) {
            self.refresh_color(&descendant);
        }
    }

    /// Recolors subtrees of roots whose position changed since `before`.
    fn recolor_shifted_roots(&mut self, before: &[CardId], skip: Option<&str>) {
        let after = self.root_ids();
        for (index, root_id) in after.iter().enumerate() {
            if Some(root_id.as_str()) == skip {
                continue;
            }
            if before.get(index) != Some(root_id) {
                self.refresh_subtree_colors(root_id);
            }
        }
    }

    /// Detaches cards with dangling or cyclic parents and realigns columns
    /// with depth. Returns whether anything changed.
    fn repair_links(&mut self) -> bool {
        let ids: Vec<CardId> = self.cards().keys().cloned().collect();
        let mut changed = false;

        for id in &ids {
            let detach = {
                let mut seen: HashSet<&str> = HashSet::from([id.as_str()]);
                let mut cursor = self.get_card(id).and_then(|card| card.parent_id.as_deref());
                loop {
                    match cursor {
                        None => break false,
                        Some(parent) => match self.get_card(parent) {
                            None => break true,
                            Some(_) if !seen.insert(parent) => break true,
                            Some(card) => cursor = card.parent_id.as_deref(),
                        },
                    }
                }
            };
            if detach {
                if let Some(card) = self.project.data.cards.get_mut(id) {
                    warn!(
                        "event=card_repair module=store status=repaired reason=broken_parent card_id={} parent_id={:?}",
                        id, card.parent_id
                    );
                    card.parent_id = None;
                    changed = true;
                }
            }
        }

        for id in &ids {
            let depth = self.get_ancestor_ids(id).len();
            if let Some(card) = self.project.data.cards.get_mut(id) {
                if card.column_index != depth {
                    warn!(
                        "event=card_repair module=store status=repaired reason=column_mismatch card_id={} column={} expected={}",
                        id, card.column_index, depth
                    );
                    card.column_index = depth;
                    changed = true;
                }
            }
        }

        let widest = self
            .cards()
            .values()
            .map(|card| card.column_index + 1)
            .max()
            .unwrap_or(0);
        self.ensure_columns(widest);
        changed
    }
}

fn sort_sibling_group(cards: &mut [&Card]) {
    cards.sort_by(|left, right| {
        left.order
            .total_cmp(&right.order)
            .then_with(|| left.id.cmp(&right.id))
    });
}
