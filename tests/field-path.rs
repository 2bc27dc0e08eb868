//!
//! ```
//! RUST_LOG=trace cargo test --test field-path -- --nocapture
//! ```

use anyhow::Result;
use serde_json::json;

use form_body::*;

#[path = "./lib/mod.rs"]
mod lib;

use lib::tracing_init;

fn value<'a>(tree: &'a FieldTree<&'static str>, name: &str) -> Option<&'a str> {
    tree.get_path(name).and_then(FieldTree::as_value).copied()
}

#[test]
fn parse_segments() {
    assert_eq!(
        FieldPath::parse("foo[][bar]").segments(),
        &[
            Segment::Key(Key::Name("foo".into())),
            Segment::Auto,
            Segment::Key(Key::Name("bar".into())),
        ]
    );

    assert_eq!(
        FieldPath::parse("foo[1][007][-1]").segments(),
        &[
            Segment::Key(Key::Name("foo".into())),
            Segment::Key(Key::Index(1)),
            Segment::Key(Key::Name("007".into())),
            Segment::Key(Key::Name("-1".into())),
        ]
    );

    assert_eq!(
        FieldPath::parse("plain").segments(),
        &[Segment::Key(Key::Name("plain".into()))]
    );
    assert!(FieldPath::parse("").is_empty());
}

#[test]
fn parse_malformed_names() {
    // unclosed first bracket keeps the whole name
    assert_eq!(
        FieldPath::parse("foo[bar").segments(),
        &[Segment::Key(Key::Name("foo[bar".into()))]
    );

    // leading bracket keeps the whole name
    assert_eq!(
        FieldPath::parse("[foo]").segments(),
        &[Segment::Key(Key::Name("[foo]".into()))]
    );

    // trailing text is ignored
    assert_eq!(
        FieldPath::parse("a[b]c[d]").segments(),
        &[
            Segment::Key(Key::Name("a".into())),
            Segment::Key(Key::Name("b".into())),
        ]
    );
}

#[test]
fn plain_names() {
    for name in ["foo", "with space", "0", "dots.and-dashes"] {
        let mut tree = FieldTree::new();
        tree.insert(name, "v");

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(name).and_then(FieldTree::as_value), Some(&"v"));
    }
}

#[test]
fn auto_index_is_increasing() {
    let mut tree = FieldTree::new();
    for v in ["a", "b", "c", "d"] {
        tree.insert("list[]", v);
    }

    let keys = tree
        .get("list")
        .map(|l| l.iter().map(|(k, _)| k.clone()).collect::<Vec<_>>())
        .unwrap_or_default();
    assert_eq!(keys, (0..4).map(Key::Index).collect::<Vec<_>>());

    assert_eq!(value(&tree, "list[0]"), Some("a"));
    assert_eq!(value(&tree, "list[3]"), Some("d"));
}

#[test]
fn auto_index_follows_largest_integer_key() {
    let mut tree = FieldTree::new();
    tree.insert("a[5]", "five");
    tree.insert("a[name]", "named");
    tree.insert("a[]", "six");

    assert_eq!(value(&tree, "a[6]"), Some("six"));
    assert_eq!(value(&tree, "a[name]"), Some("named"));
}

#[test]
fn nested_auto_index() -> Result<()> {
    tracing_init()?;

    let mut tree = FieldTree::new();
    tree.insert("foo[][]", "1");
    tree.insert("foo[1][]", "1");
    tree.insert("foo[1][]", "1");

    assert_eq!(
        serde_json::to_value(&tree)?,
        json!({"foo": {"0": {"0": "1"}, "1": {"0": "1", "1": "1"}}})
    );

    Ok(())
}

#[test]
fn collision_replaces_value_with_level() {
    let mut tree = FieldTree::new();
    tree.insert("user", "scalar");
    tree.insert("user[name]", "ferris");

    assert_eq!(value(&tree, "user[name]"), Some("ferris"));
    assert!(tree.get("user").and_then(FieldTree::as_value).is_none());

    // the terminal segment overwrites a level
    tree.insert("user", "again");
    assert_eq!(value(&tree, "user"), Some("again"));
}

#[test]
fn terminal_overwrites_value() {
    let mut tree = FieldTree::new();
    tree.insert("a[b]", "1");
    tree.insert("a[b]", "2");

    assert_eq!(value(&tree, "a[b]"), Some("2"));
    assert_eq!(tree.get("a").map(FieldTree::len), Some(1));
}

#[test]
fn empty_name_is_dropped() {
    let mut tree = FieldTree::new();
    tree.insert("", "nothing");

    assert!(tree.is_empty());
}

#[test]
fn map_keeps_shape() {
    let mut tree = FieldTree::new();
    tree.insert("a[]", "x");
    tree.insert("a[]", "yy");
    tree.insert("b", "zzz");

    let lengths = tree.map(|v| v.len());

    assert_eq!(lengths.get_path("a[1]").and_then(FieldTree::as_value), Some(&2));
    assert_eq!(lengths.get_path("b").and_then(FieldTree::as_value), Some(&3));
}
