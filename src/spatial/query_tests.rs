use super::super::RTree;
use crate::coord::Position;
use std::f64::consts::PI;
use uuid::Uuid;

fn pos(t: f64, r: f64, theta: f64) -> Position {
    Position::new(t, r, theta).unwrap()
}

#[test]
fn knn_returns_k_nearest_sorted_ascending() {
    let mut tree = RTree::new(8, 2);
    let ids: Vec<Uuid> = (0..10)
        .map(|i| {
            let id = Uuid::new_v4();
            tree.insert(pos(i as f64, 1.0, 0.0), id);
            id
        })
        .collect();
    let (results, cancelled) = tree.nearest_neighbors(&pos(4.5, 1.0, 0.0), 3, None);
    assert!(!cancelled);
    assert_eq!(results.len(), 3);
    for w in results.windows(2) {
        assert!(w[0].0 <= w[1].0);
    }
    let nearest_ids: Vec<Uuid> = results.iter().map(|(_, id)| *id).collect();
    assert!(nearest_ids.contains(&ids[4]) || nearest_ids.contains(&ids[5]));
}

#[test]
fn knn_k_zero_returns_empty() {
    let mut tree = RTree::new(8, 2);
    tree.insert(pos(0.0, 1.0, 0.0), Uuid::new_v4());
    let (results, _) = tree.nearest_neighbors(&pos(0.0, 1.0, 0.0), 0, None);
    assert!(results.is_empty());
}

#[test]
fn knn_with_more_k_than_points_returns_all() {
    let mut tree = RTree::new(8, 2);
    for i in 0..3 {
        tree.insert(pos(i as f64, 1.0, 0.0), Uuid::new_v4());
    }
    let (results, _) = tree.nearest_neighbors(&pos(0.0, 1.0, 0.0), 10, None);
    assert_eq!(results.len(), 3);
}

#[test]
fn knn_with_custom_weights_uses_same_metric_for_leaves_and_nodes() {
    // Zeroing the theta weight should make a point that differs only in
    // theta rank ahead of a point that differs only in t, even though the
    // opposite is true under the default unweighted metric.
    let mut tree = RTree::new(8, 2).with_weights((1.0, 1.0, 0.0));
    let near_in_t = Uuid::new_v4();
    let near_in_theta = Uuid::new_v4();
    tree.insert(pos(1.0, 1.0, 0.0), near_in_t);
    tree.insert(pos(0.0, 1.0, PI), near_in_theta);

    let (results, _) = tree.nearest_neighbors(&pos(0.0, 1.0, 0.0), 2, None);
    assert_eq!(results[0].1, near_in_theta);
    assert_eq!(results[1].1, near_in_t);
    assert!(results[0].0 < results[1].0);
}
