//! Tests for error construction and display.

use super::*;
use crate::block::Block;
use camino::Utf8Path;
use rstest::rstest;
use serde_json::json;
use std::error::Error as _;

#[rstest]
fn parse_error_keeps_source_and_text() {
    let inner = std::io::Error::other("boom");
    let err = TerranetesError::parse(SourceFormat::Hcl, "key { ", inner);
    let rendered = err.to_string();
    assert!(rendered.starts_with("Unable to parse hcl source"));
    assert!(rendered.contains("key { "));
    assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("boom"));
}

#[rstest]
fn duplicate_error_names_key_path() {
    let existing = Block::resource("type", "name", json!({"a": 1}));
    let incoming = Block::resource("type", "name", json!({"b": 2}));
    let err = TerranetesError::duplicate(existing, incoming);
    assert!(err.to_string().contains("resource.type.name"));
}

#[rstest]
fn unit_wrapping_is_not_repeated() {
    let path = Utf8Path::new("/work/main.tn");
    let err = TerranetesError::MissingOutputTarget { format: "json" }
        .in_unit(path)
        .in_unit(Utf8Path::new("/other.tn"));
    assert_eq!(err.unit_path().map(|p| p.as_str()), Some("/work/main.tn"));
    assert!(matches!(
        err.root(),
        TerranetesError::MissingOutputTarget { format: "json" }
    ));
}
