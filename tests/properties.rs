//! Property tests for the rewrite engine over generated stream data.
mod common;
use common::*;
use henka::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};

fn entry_strategy() -> impl Strategy<Value = Value> {
    (prop_oneof![Just("char1"), Just("char2")], "[a-z ]{0,12}", "[0-9a-f]{8}")
        .prop_map(|(name, text, id)| json!({"type": name, "value": text, "id": id}))
}

fn stream_strategy() -> impl Strategy<Value = Value> {
    prop::collection::vec(entry_strategy(), 0..24).prop_map(Value::Array)
}

fn apply_at_root(raw: Value, operation: &dyn BlockOperation) -> Value {
    engine::apply(raw, &simple_stream(), &BlockPath::root(), operation).expect("migration failed")
}

fn count(raw: &Value, name: &str) -> usize {
    entries_named(raw, name).len()
}

proptest! {
    #[test]
    fn prop_unmatched_path_is_identity(raw in stream_strategy()) {
        let schema = BlockDef::stream([("char1", char_block()), ("inner", simple_stream())]);
        let migrated = engine::apply(
            raw.clone(),
            &schema,
            &BlockPath::parse("inner"),
            &RemoveStreamChildren::new("char1"),
        )
        .expect("migration failed");
        prop_assert_eq!(migrated, raw);
    }

    #[test]
    fn prop_remove_keeps_siblings_in_order(raw in stream_strategy()) {
        let migrated = apply_at_root(raw.clone(), &RemoveStreamChildren::new("char1"));
        let expected: Vec<&Value> = entries_named(&raw, "char2");
        let actual: Vec<&Value> = entries_named(&migrated, "char2");
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn prop_remove_cardinality(raw in stream_strategy()) {
        let before = raw.as_array().map_or(0, Vec::len);
        let removed = count(&raw, "char1");
        let migrated = apply_at_root(raw, &RemoveStreamChildren::new("char1"));
        prop_assert_eq!(migrated.as_array().map_or(0, Vec::len), before - removed);
        prop_assert_eq!(count(&migrated, "char1"), 0);
    }

    #[test]
    fn prop_rename_is_reversible(raw in stream_strategy()) {
        let renamed = apply_at_root(raw.clone(), &RenameStreamChildren::new("char1", "heading"));
        prop_assert_eq!(count(&renamed, "heading"), count(&raw, "char1"));
        prop_assert_eq!(count(&renamed, "char1"), 0);

        let restored = apply_at_root(renamed, &RenameStreamChildren::new("heading", "char1"));
        prop_assert_eq!(restored, raw);
    }

    #[test]
    fn prop_struct_rename_keeps_field_position(first in "[a-z]{1,8}", second in "[a-z]{1,8}") {
        let raw = json!({"char1": first.clone(), "char2": second});
        let migrated = engine::apply(
            raw,
            &simple_struct(),
            &BlockPath::root(),
            &RenameStructChildren::new("char1", "title"),
        )
        .expect("migration failed");
        let keys: Vec<&String> = migrated.as_object().map(|m| m.keys().collect()).unwrap_or_default();
        prop_assert_eq!(keys, ["title", "char2"]);
        prop_assert_eq!(&migrated["title"], &json!(first));
    }
}
