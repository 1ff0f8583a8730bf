//! Tests for persisted migration plans and batch migration of stored records.
mod common;
use common::*;
use henka::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// Renames `char1` everywhere below `nestedstream` and drops the top-level `char2`.
fn nested_plan() -> MigrationPlan {
    let mut plan = MigrationPlan::new();
    plan.push(RenameStreamChildren::new("char1", "renamed1"), "nestedstream.stream1");
    plan.push(RenameStructChildren::new("char1", "renamed1"), "nestedstream.struct1");
    plan.push(RenameStreamChildren::new("char1", "renamed1"), "nestedstream");
    plan.push(RemoveStreamChildren::new("char2"), "");
    plan
}

#[cfg(test)]
mod plan_tests {
    use super::*;

    #[test]
    fn test_plan_survives_save_and_load() {
        let mut plan = nested_plan();
        plan.push(
            StreamChildrenToList::new("char1", "list1"),
            BlockPath::parse("simplestream"),
        );
        plan.push(
            AlterBlockValue::new("char2", json!("Replaced")),
            BlockPath::parse("simplestream"),
        );
        plan.unresolved.push(BlockPath::parse("nestedlist_stream.item.char2"));

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("plan.json");
        let path_str = path.to_str().expect("temp path is not valid UTF-8");
        plan.save(path_str).expect("Failed to save plan");
        let loaded = MigrationPlan::from_file(path_str).expect("Failed to load plan");

        assert_eq!(loaded, plan);
    }

    #[test]
    fn test_missing_plan_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("missing.json");
        let err = MigrationPlan::from_file(path.to_str().expect("temp path is not valid UTF-8"))
            .unwrap_err();
        assert!(matches!(err, PlanError::Io { .. }));
    }

    #[test]
    fn test_unknown_operation_is_rejected() {
        let json = r#"{"changes": [{"operation": {"op": "explode"}, "block_path": ""}]}"#;
        let err = MigrationPlan::from_json(json).unwrap_err();
        assert!(matches!(err, PlanError::JsonParseError(_)));
    }

    #[test]
    fn test_multi_step_plan_over_base_data() {
        let raw = base_stream_data();
        let migrated = nested_plan()
            .apply(raw.clone(), &base_stream())
            .expect("migration failed");

        assert!(entries_named(&migrated, "char2").is_empty());
        assert_eq!(entries_named(&migrated, "char1").len(), 1);

        let nested = entries_named(&migrated, "nestedstream");
        for stream in nested {
            let value = &stream["value"];
            assert!(entries_named(value, "char1").is_empty());
            for inner in entries_named(value, "stream1") {
                assert!(entries_named(&inner["value"], "char1").is_empty());
            }
            for inner in entries_named(value, "struct1") {
                assert!(inner["value"].get("char1").is_none());
                assert!(inner["value"].get("renamed1").is_some());
            }
        }
        // Untouched blocks keep their data and ids.
        let original = entries_named(&raw, "nestedlist_stream")[0].clone();
        assert_eq!(entries_named(&migrated, "nestedlist_stream")[0], &original);
    }

    #[test]
    fn test_failing_step_reports_migration_error() {
        let mut plan = MigrationPlan::new();
        plan.push(RemoveStreamChildren::new("char1"), "simplestream");
        plan.push(RemoveStructChildren::new("char1"), "simplestream");
        let err = plan.apply(base_stream_data(), &base_stream()).unwrap_err();
        assert!(matches!(
            err,
            PlanError::Migration(MigrationError::IncompatibleOperation { .. })
        ));
    }
}

#[cfg(test)]
mod batch_tests {
    use super::*;

    fn records() -> Vec<StreamRecord> {
        vec![
            StreamRecord::new("1", base_stream_data()),
            StreamRecord::new("2", json!([{"type": "char1", "value": "only char1"}])),
            StreamRecord::new("3", json!([])),
        ]
    }

    #[test]
    fn test_batch_keeps_order_and_reports_changes() {
        let report = migrate_records(records(), &nested_plan(), &base_stream(), ErrorPolicy::Abort)
            .expect("batch failed");

        let ids: Vec<&str> = report.migrated.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        assert_eq!(report.changed_ids, ["1"]);
        assert!(report.skipped.is_empty());
        assert_eq!(report.migrated[1].raw, json!([{"type": "char1", "value": "only char1"}]));
    }

    #[test]
    fn test_batch_abort_names_the_record() {
        let mut batch = records();
        batch.insert(1, StreamRecord::new(
            "broken",
            json!([{"type": "nestedstream", "value": {"char1": "not a stream"}}]),
        ));

        let err = migrate_records(batch, &nested_plan(), &base_stream(), ErrorPolicy::Abort)
            .unwrap_err();
        assert!(err.to_string().contains("(record 'broken')"));
    }

    #[test]
    fn test_batch_skip_policy() {
        let mut batch = records();
        batch.push(StreamRecord::new(
            "malformed",
            json!([{"type": "nestedstream", "value": "not a list"}]),
        ));

        let report = migrate_records(batch, &nested_plan(), &base_stream(), ErrorPolicy::SkipAndLog)
            .expect("skip policy never fails");
        assert_eq!(report.migrated.len(), 3);
        assert_eq!(report.skipped.len(), 1);
        let (record, error) = &report.skipped[0];
        assert_eq!(record.id, "malformed");
        assert!(matches!(error, MigrationError::MalformedBlock { record: Some(id), .. } if id == "malformed"));
    }
}
