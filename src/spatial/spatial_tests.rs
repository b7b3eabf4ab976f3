use super::*;
use std::f64::consts::PI;

fn pos(t: f64, r: f64, theta: f64) -> Position {
    Position::new(t, r, theta).unwrap()
}

#[test]
fn insert_and_find_exact_round_trips() {
    let mut tree = RTree::new(4, 2);
    let id = Uuid::new_v4();
    tree.insert(pos(1.0, 2.0, 0.0), id);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.find_exact(&pos(1.0, 2.0, 0.0)), vec![id]);
}

#[test]
fn insert_beyond_max_entries_forces_splits() {
    let mut tree = RTree::new(4, 2);
    let ids: Vec<Uuid> = (0..50).map(|i| {
        let id = Uuid::new_v4();
        tree.insert(pos(i as f64, 1.0, 0.0), id);
        id
    }).collect();
    assert_eq!(tree.len(), 50);
    for id in &ids {
        let rect = Rectangle::new(0.0, 49.0, 0.0, 2.0, 0.0, 0.01);
        // not all points satisfy this narrow theta band; just sanity-check structure holds
        let _ = rect;
    }
    let full_rect = Rectangle::new(-1.0, 50.0, 0.0, 2.0, 0.0, 2.0 * PI - 0.001);
    let (found, cancelled) = tree.range_query(&full_rect, None);
    assert!(!cancelled);
    assert_eq!(found.len(), 50);
}

#[test]
fn delete_then_find_exact_is_empty() {
    let mut tree = RTree::new(4, 2);
    let id = Uuid::new_v4();
    let p = pos(1.0, 2.0, 0.0);
    tree.insert(p, id);
    assert!(tree.delete(&p, id));
    assert_eq!(tree.len(), 0);
    assert!(tree.find_exact(&p).is_empty());
}

#[test]
fn delete_missing_id_returns_false() {
    let mut tree = RTree::new(4, 2);
    assert!(!tree.delete(&pos(0.0, 0.0, 0.0), Uuid::new_v4()));
}

#[test]
fn update_moves_a_point() {
    let mut tree = RTree::new(4, 2);
    let id = Uuid::new_v4();
    let old = pos(0.0, 1.0, 0.0);
    let new = pos(5.0, 1.0, 0.0);
    tree.insert(old, id);
    tree.update(&old, new, id);
    assert_eq!(tree.len(), 1);
    assert!(tree.find_exact(&old).is_empty());
    assert_eq!(tree.find_exact(&new), vec![id]);
}

#[test]
fn update_with_missing_old_still_inserts() {
    let mut tree = RTree::new(4, 2);
    let id = Uuid::new_v4();
    let new = pos(1.0, 1.0, 0.0);
    tree.update(&pos(0.0, 0.0, 0.0), new, id);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.find_exact(&new), vec![id]);
}

#[test]
fn bulk_insert_and_delete_preserves_survivors() {
    let mut tree = RTree::new(4, 2);
    let ids: Vec<Uuid> = (0..40).map(|i| {
        let id = Uuid::new_v4();
        tree.insert(pos(i as f64, (i % 5) as f64, 0.0), id);
        id
    }).collect();
    for id in ids.iter().take(20) {
        // position isn't used to locate the item, so any placeholder works
        tree.delete(&pos(0.0, 0.0, 0.0), *id);
    }
    assert_eq!(tree.len(), 20);
    let full_rect = Rectangle::new(-1.0, 40.0, 0.0, 5.0, 0.0, 2.0 * PI - 0.001);
    let (found, _) = tree.range_query(&full_rect, None);
    assert_eq!(found.len(), 20);
    for id in ids.iter().skip(20) {
        assert!(found.contains(id));
    }
}

#[test]
fn len_matches_surviving_points_after_condense_triggers_reinsert() {
    // max_entries=4 with 60 points guarantees multiple tree levels, so
    // deleting down past min_entries forces condense_tree to dissolve
    // underflowing subtrees and reinsert their still-present leaves.
    let mut tree = RTree::new(4, 2);
    let ids: Vec<Uuid> = (0..60)
        .map(|i| {
            let id = Uuid::new_v4();
            tree.insert(pos(i as f64, 1.0, 0.0), id);
            id
        })
        .collect();

    for id in ids.iter().take(45) {
        assert!(tree.delete(&pos(0.0, 0.0, 0.0), *id));
    }

    let full_rect = Rectangle::new(-1.0, 60.0, 0.0, 2.0, 0.0, 2.0 * PI - 0.001);
    let (found, _) = tree.range_query(&full_rect, None);
    assert_eq!(tree.len(), 15);
    assert_eq!(found.len(), tree.len());
    for id in ids.iter().skip(45) {
        assert!(found.contains(id));
    }
}

#[test]
fn range_query_wraparound_scenario_s2() {
    let mut tree = RTree::new(50, 20);
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let c = Uuid::new_v4();
    tree.insert(pos(0.0, 1.0, 0.1), a);
    tree.insert(pos(0.0, 1.0, 6.0), b);
    tree.insert(pos(0.0, 1.0, 3.0), c);

    let rect = Rectangle::new(-1.0, 1.0, 0.0, 2.0, 5.5, 0.5);
    let (found, _) = tree.range_query(&rect, None);
    assert!(found.contains(&a));
    assert!(found.contains(&b));
    assert!(!found.contains(&c));
}

#[test]
fn cancellation_token_stops_range_query() {
    let mut tree = RTree::new(4, 2);
    for i in 0..20 {
        tree.insert(pos(i as f64, 1.0, 0.0), Uuid::new_v4());
    }
    let token = CancellationToken::new();
    token.cancel();
    let full_rect = Rectangle::new(-1.0, 20.0, 0.0, 2.0, 0.0, 2.0 * PI - 0.001);
    let (_, cancelled) = tree.range_query(&full_rect, Some(&token));
    assert!(cancelled);
}
