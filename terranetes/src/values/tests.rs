//! Tests for scoped values and their file and environment sources.

use super::*;
use anyhow::Result;
use rstest::rstest;
use serde_json::{Map, Value, json};
use test_helpers::{FixtureTree, env};

use crate::TerranetesError;

fn layer(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[rstest]
fn nested_scopes_restore_previous_bindings() {
    let mut stack = ValueStack::default();
    stack.scoped(Overrides::new().set("foo", "top"), |outer| {
        assert_eq!(outer.get("foo"), Some(&json!("top")));
        outer.scoped(Overrides::new().set("foo", "bottom"), |inner| {
            assert_eq!(inner.get("foo"), Some(&json!("bottom")));
        });
        assert_eq!(outer.get("foo"), Some(&json!("top")));
    });
    assert_eq!(stack.get("foo"), None);
    assert_eq!(stack.depth(), 1);
}

#[rstest]
fn set_is_visible_inside_and_gone_after_exit() {
    let mut stack = ValueStack::default();
    stack.scoped(Overrides::new(), |outer| {
        outer.set("foo", json!("bar"));
        outer.scoped(Overrides::new(), |inner| {
            assert_eq!(inner.get("foo"), Some(&json!("bar")));
        });
    });
    assert_eq!(stack.get("foo"), None);
}

#[rstest]
fn named_overrides_beat_layers_and_later_layers_win() {
    let mut stack = ValueStack::default();
    let overrides = Overrides::new()
        .layer(layer(json!({"a": 1, "b": 1, "c": 1})))
        .layer(layer(json!({"b": 2, "c": 2})))
        .set("c", 3);
    let guard = stack.enter(overrides);
    assert_eq!(guard.get("a"), Some(&json!(1)));
    assert_eq!(guard.get("b"), Some(&json!(2)));
    assert_eq!(guard.get("c"), Some(&json!(3)));
}

#[rstest]
fn scope_is_restored_when_body_fails() {
    let mut stack = ValueStack::with_root(layer(json!({"foo": "root"})));
    let result: Result<(), &str> = stack.scoped(Overrides::new().set("foo", "inner"), |inner| {
        inner.set("bar", json!(true));
        Err("boom")
    });
    assert!(result.is_err());
    assert_eq!(stack.get("foo"), Some(&json!("root")));
    assert_eq!(stack.get("bar"), None);
}

#[rstest]
fn guard_unwinds_scopes_left_open() {
    let mut stack = ValueStack::default();
    {
        let mut guard = stack.enter(Overrides::new().set("k", 1));
        guard.push(Overrides::new().set("k", 2));
        guard.push(Overrides::new().set("k", 3));
        assert_eq!(guard.depth(), 4);
    }
    assert_eq!(stack.depth(), 1);
    assert_eq!(stack.get("k"), None);
}

#[rstest]
fn get_or_falls_back() {
    let stack = ValueStack::default();
    assert_eq!(stack.get_or("missing", json!("default")), json!("default"));
}

#[rstest]
fn values_files_closer_directories_win() -> Result<()> {
    let tree = FixtureTree::with_files([
        ("values.yaml", "env: prd\nregion: eu\nnested:\n  a: 1\n"),
        ("app/values.yaml", "env: dev\nnested:\n  b: 2\n"),
        ("app/svc/values.yaml", ""),
    ])?;
    let values = values_from_files(&tree.path("app/svc"), "values.yaml")?;
    assert_eq!(values.get("env"), Some(&json!("dev")));
    assert_eq!(values.get("region"), Some(&json!("eu")));
    assert_eq!(values.get("nested"), Some(&json!({"a": 1, "b": 2})));
    Ok(())
}

#[rstest]
fn values_files_missing_start_is_discovery_error() -> Result<()> {
    let tree = FixtureTree::new()?;
    let err = values_from_files(&tree.path("absent"), "values.yaml")
        .expect_err("missing directory must fail");
    assert!(matches!(err, TerranetesError::Discovery { .. }));
    Ok(())
}

#[rstest]
fn values_files_reject_non_mappings() -> Result<()> {
    let tree = FixtureTree::with_files([("values.yaml", "- a\n- b\n")])?;
    let err = values_from_files(tree.root(), "values.yaml").expect_err("list must fail");
    assert!(matches!(err.root(), TerranetesError::Parse { .. }));
    assert_eq!(err.unit_path(), Some(&tree.path("values.yaml")));
    Ok(())
}

#[rstest]
fn env_snapshot_sees_process_variables() {
    let _lock = env::lock();
    let _guard = env::set_var("TERRANETES_VALUES_MARKER", "present");
    let values = values_from_env();
    assert_eq!(values.get("TERRANETES_VALUES_MARKER"), Some(&json!("present")));
}
