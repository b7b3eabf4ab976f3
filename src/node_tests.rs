use super::*;
use crate::coord::Position;

fn pos() -> Position {
    Position::new(0.0, 1.0, 0.0).unwrap()
}

#[test]
fn deterministic_id_is_stable_for_same_name() {
    let ns = Uuid::new_v4();
    let a = Node::deterministic_id(ns, "alpha");
    let b = Node::deterministic_id(ns, "alpha");
    let c = Node::deterministic_id(ns, "beta");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn connection_strength_is_clamped() {
    let c = Connection::new(Uuid::new_v4(), "ref", 5.0);
    assert_eq!(c.strength, 1.0);
    let c2 = Connection::new(Uuid::new_v4(), "ref", -5.0);
    assert_eq!(c2.strength, 0.0);
}

#[test]
fn remove_connection_reports_presence() {
    let mut node = Node::new(pos(), Value::Null);
    let target = Uuid::new_v4();
    node.add_connection(Connection::new(target, "ref", 0.5));
    assert!(node.remove_connection(target));
    assert!(!node.remove_connection(target));
}
