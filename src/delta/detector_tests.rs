use super::*;
use serde_json::json;

#[test]
fn identical_content_yields_no_ops() {
    let v = json!({"a": 1, "b": [1, 2, 3]});
    assert!(detect_changes(&v, &v).is_empty());
}

#[test]
fn added_key_yields_set_value() {
    let old = json!({"a": 1});
    let new = json!({"a": 1, "b": 2});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::SetValue { path: key_path(&["b"]), new: json!(2), old: None }]);
}

#[test]
fn removed_key_yields_delete_value() {
    let old = json!({"a": 1, "b": 2});
    let new = json!({"a": 1});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::DeleteValue { path: key_path(&["b"]), old: Some(json!(2)) }]);
}

#[test]
fn changed_scalar_yields_set_value_with_old() {
    let old = json!({"a": 1});
    let new = json!({"a": 2});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::SetValue { path: key_path(&["a"]), new: json!(2), old: Some(json!(1)) }]);
}

#[test]
fn nested_object_change_recurses_into_path() {
    let old = json!({"outer": {"inner": 1}});
    let new = json!({"outer": {"inner": 2}});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops.len(), 1);
    match &ops[0] {
        DeltaOp::SetValue { path, new, old } => {
            assert_eq!(*path, key_path(&["outer", "inner"]));
            assert_eq!(*new, json!(2));
            assert_eq!(*old, Some(json!(1)));
        }
        other => panic!("expected SetValue, got {other:?}"),
    }
}

#[test]
fn array_append_yields_single_insert() {
    let old = json!({"tags": ["x", "z"]});
    let new = json!({"tags": ["x", "z", "w"]});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::ArrayInsert { path: key_path(&["tags"]), index: 2, value: json!("w") }]);
}

#[test]
fn array_middle_insert_matches_scenario_s3_shape() {
    let old = json!({"tags": ["x", "z"]});
    let new = json!({"tags": ["x", "y", "z"]});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::ArrayInsert { path: key_path(&["tags"]), index: 1, value: json!("y") }]);
}

#[test]
fn array_removal_yields_delete_with_old_value() {
    let old = json!({"tags": ["x", "y", "z"]});
    let new = json!({"tags": ["x", "z"]});
    let ops = detect_changes(&old, &new);
    assert_eq!(ops, vec![DeltaOp::ArrayDelete { path: key_path(&["tags"]), index: 1, old: Some(json!("y")) }]);
}

#[test]
fn detected_ops_applied_in_order_reproduce_new_content() {
    let old = json!({"tags": ["a", "b", "c", "d"]});
    let new = json!({"tags": ["a", "x", "c", "y", "d"]});
    let ops = detect_changes(&old, &new);
    let mut current = old;
    for op in &ops {
        current = op.apply(&current).unwrap();
    }
    assert_eq!(current, new);
}

#[test]
fn short_string_change_is_set_value_not_text_diff() {
    let old = json!({"body": "hello"});
    let new = json!({"body": "hellox"});
    let ops = detect_changes(&old, &new);
    assert!(matches!(ops[0], DeltaOp::SetValue { .. }));
}

#[test]
fn long_string_small_edit_yields_text_diff() {
    let base = "a".repeat(150);
    let old = json!({"body": format!("{base}END")});
    let new = json!({"body": format!("{base}start")});
    let ops = detect_changes(&old, &new);
    assert!(matches!(ops[0], DeltaOp::TextDiff { .. }), "expected TextDiff, got {:?}", ops[0]);
    let applied = ops[0].apply(&old).unwrap();
    assert_eq!(applied, new);
}

#[test]
fn long_string_near_total_rewrite_prefers_set_value() {
    let old = json!({"body": "a".repeat(150)});
    let new = json!({"body": "z".repeat(150)});
    let ops = detect_changes(&old, &new);
    assert!(matches!(ops[0], DeltaOp::SetValue { .. }));
}
