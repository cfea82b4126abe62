//! Global column ordering and fractional sibling positioning.
//!
//! # Responsibility
//! - Build a card's order path (root order first, own order last).
//! - Compare order paths lexicographically to get one global column order.
//! - Compute fractional orders for insertion between siblings.
//!
//! # Invariants
//! - Comparison is a total order over paths (`f64::total_cmp` per element).
//! - A strict prefix sorts before any longer path that extends it.
//! - Orders are never renumbered; repeated midpoints lose precision over time.

use crate::model::card::{Card, CardId};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// Returns the order path of `card_id`, or an empty path for unknown ids.
///
/// Walking stops at a missing parent or at a revisited id, so a damaged
/// parent chain still yields a finite path.
pub fn order_path(cards: &BTreeMap<CardId, Card>, card_id: &str) -> Vec<f64> {
    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = cards.get(card_id);
    while let Some(card) = cursor {
        if !seen.insert(card.id.as_str()) {
            break;
        }
        path.push(card.order);
        cursor = card.parent_id.as_deref().and_then(|parent| cards.get(parent));
    }
    path.reverse();
    path
}

/// Lexicographic comparison of two order paths.
pub fn compare_order_paths(left: &[f64], right: &[f64]) -> Ordering {
    for (a, b) in left.iter().zip(right.iter()) {
        match a.total_cmp(b) {
            Ordering::Equal => continue,
            decided => return decided,
        }
    }
    left.len().cmp(&right.len())
}

/// Sorts cards into global column order.
///
/// Cards with equal paths keep a deterministic id order.
pub fn sort_by_order_path<'a>(cards: &'a BTreeMap<CardId, Card>, column: Vec<&'a Card>) -> Vec<&'a Card> {
    let mut keyed: Vec<(Vec<f64>, &Card)> = column
        .into_iter()
        .map(|card| (order_path(cards, &card.id), card))
        .collect();
    keyed.sort_by(|(left_path, left), (right_path, right)| {
        compare_order_paths(left_path, right_path).then_with(|| left.id.cmp(&right.id))
    });
    keyed.into_iter().map(|(_, card)| card).collect()
}

/// Order for a new sibling placed between `prev` and `next`.
///
/// - Both neighbors: midpoint.
/// - Only `prev`: one past it.
/// - Only `next`: one before it.
/// - Empty group: `0.0`.
pub fn order_between(prev: Option<f64>, next: Option<f64>) -> f64 {
    match (prev, next) {
        (Some(p), Some(n)) => (p + n) / 2.0,
        (Some(p), None) => p + 1.0,
        (None, Some(n)) => n - 1.0,
        (None, None) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_order_paths, order_between, order_path, sort_by_order_path};
    use crate::model::card::{Card, CardId};
    use std::cmp::Ordering;
    use std::collections::BTreeMap;

    fn card(id: &str, parent: Option<&str>, column: usize, order: f64) -> Card {
        Card {
            id: id.to_string(),
            parent_id: parent.map(str::to_string),
            column_index: column,
            order,
            content: String::new(),
            name: None,
            color: String::new(),
        }
    }

    fn forest(cards: Vec<Card>) -> BTreeMap<CardId, Card> {
        cards.into_iter().map(|c| (c.id.clone(), c)).collect()
    }

    #[test]
    fn root_path_is_singleton() {
        let cards = forest(vec![card("r", None, 0, 3.0)]);
        assert_eq!(order_path(&cards, "r"), vec![3.0]);
    }

    #[test]
    fn path_runs_root_first() {
        let cards = forest(vec![
            card("r", None, 0, 2.0),
            card("c", Some("r"), 1, 5.0),
            card("g", Some("c"), 2, 0.5),
        ]);
        assert_eq!(order_path(&cards, "g"), vec![2.0, 5.0, 0.5]);
        assert!(order_path(&cards, "missing").is_empty());
    }

    #[test]
    fn cyclic_parent_chain_terminates() {
        let cards = forest(vec![card("a", Some("b"), 1, 1.0), card("b", Some("a"), 1, 2.0)]);
        assert_eq!(order_path(&cards, "a").len(), 2);
    }

    #[test]
    fn comparison_decides_on_first_difference_then_length() {
        assert_eq!(compare_order_paths(&[1.0, 9.0], &[2.0, 0.0]), Ordering::Less);
        assert_eq!(compare_order_paths(&[1.0], &[1.0, 0.0]), Ordering::Less);
        assert_eq!(compare_order_paths(&[1.0, 2.0], &[1.0, 2.0]), Ordering::Equal);
        assert_eq!(compare_order_paths(&[], &[]), Ordering::Equal);
    }

    #[test]
    fn comparison_is_irreflexive_and_transitive() {
        let paths: Vec<Vec<f64>> = vec![
            vec![0.0],
            vec![0.0, -1.0],
            vec![0.0, 0.5, 3.0],
            vec![1.0],
            vec![1.0, 0.0],
            vec![-2.0, 7.0],
        ];
        for a in &paths {
            assert_ne!(compare_order_paths(a, a), Ordering::Less);
            for b in &paths {
                assert_eq!(
                    compare_order_paths(a, b),
                    compare_order_paths(b, a).reverse()
                );
                for c in &paths {
                    if compare_order_paths(a, b) == Ordering::Less
                        && compare_order_paths(b, c) == Ordering::Less
                    {
                        assert_eq!(compare_order_paths(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn groups_follow_parent_order_across_levels() {
        let cards = forest(vec![
            card("r1", None, 0, 0.0),
            card("r2", None, 0, 1.0),
            card("a", Some("r2"), 1, 0.0),
            card("b", Some("r1"), 1, 5.0),
            card("b2", Some("r1"), 1, 1.0),
        ]);
        let column: Vec<&Card> = cards.values().filter(|c| c.column_index == 1).collect();
        let ids: Vec<&str> = sort_by_order_path(&cards, column)
            .into_iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b2", "b", "a"]);
    }

    #[test]
    fn order_between_uses_midpoint_and_sentinels() {
        assert_eq!(order_between(Some(1.0), Some(2.0)), 1.5);
        assert_eq!(order_between(Some(4.0), None), 5.0);
        assert_eq!(order_between(None, Some(-3.0)), -4.0);
        assert_eq!(order_between(None, None), 0.0);
    }
}
