use crate::error::MigrationError;
use crate::plan::MigrationPlan;
use crate::schema::BlockSchema;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

/// One stored block tree together with the identifier of the record that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub id: String,
    pub raw: Value,
}

impl StreamRecord {
    pub fn new(id: impl Into<String>, raw: Value) -> Self {
        Self { id: id.into(), raw }
    }
}

/// What to do when one record cannot be migrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Stop and return the first error.
    #[default]
    Abort,
    /// Log the error, keep the record out of the result and carry on.
    SkipAndLog,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Every successfully migrated record, in input order.
    pub migrated: Vec<StreamRecord>,
    /// Ids of the migrated records whose data actually changed.
    pub changed_ids: Vec<String>,
    /// Records left out under [`ErrorPolicy::SkipAndLog`], with the reason.
    pub skipped: Vec<(StreamRecord, MigrationError)>,
}

enum Outcome {
    Migrated { record: StreamRecord, changed: bool },
    Failed(StreamRecord, MigrationError),
}

/// Runs `plan` over every record in parallel.
///
/// Errors carry the id of the failing record. Under [`ErrorPolicy::Abort`] the first
/// failing record in input order is reported.
pub fn migrate_records(
    records: Vec<StreamRecord>,
    plan: &MigrationPlan,
    schema: &dyn BlockSchema,
    policy: ErrorPolicy,
) -> Result<BatchReport, MigrationError> {
    let outcomes: Vec<Outcome> = records
        .into_par_iter()
        .map(|record| migrate_one(record, plan, schema))
        .collect();

    let mut report = BatchReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Migrated { record, changed } => {
                if changed {
                    report.changed_ids.push(record.id.clone());
                }
                report.migrated.push(record);
            }
            Outcome::Failed(record, error) => match policy {
                ErrorPolicy::Abort => return Err(error),
                ErrorPolicy::SkipAndLog => {
                    warn!(record = %record.id, error = %error, "Skipping record");
                    report.skipped.push((record, error));
                }
            },
        }
    }

    info!(
        migrated = report.migrated.len(),
        changed = report.changed_ids.len(),
        skipped = report.skipped.len(),
        "Batch migration finished"
    );
    Ok(report)
}

fn migrate_one(record: StreamRecord, plan: &MigrationPlan, schema: &dyn BlockSchema) -> Outcome {
    let mut current = record.raw.clone();
    for change in plan {
        match crate::engine::apply(current, schema, &change.block_path, &change.operation) {
            Ok(rewritten) => current = rewritten,
            Err(error) => {
                let error = error.with_record(&record.id);
                return Outcome::Failed(record, error);
            }
        }
    }
    let changed = current != record.raw;
    Outcome::Migrated {
        record: StreamRecord {
            id: record.id,
            raw: current,
        },
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::RenameStreamChildren;
    use crate::schema::BlockDef;
    use serde_json::json;

    fn schema() -> BlockDef {
        BlockDef::stream([("char1", BlockDef::leaf("CharBlock")), ("char2", BlockDef::leaf("CharBlock"))])
    }

    fn plan() -> MigrationPlan {
        let mut plan = MigrationPlan::new();
        plan.push(RenameStreamChildren::new("char1", "renamed1"), "");
        plan
    }

    #[test]
    fn reports_changed_records_only() {
        let records = vec![
            StreamRecord::new("1", json!([{"type": "char1", "value": "X"}])),
            StreamRecord::new("2", json!([{"type": "char2", "value": "Y"}])),
        ];
        let report = migrate_records(records, &plan(), &schema(), ErrorPolicy::Abort).unwrap();
        assert_eq!(report.migrated.len(), 2);
        assert_eq!(report.changed_ids, ["1"]);
        assert_eq!(report.migrated[0].raw, json!([{"type": "renamed1", "value": "X"}]));
    }

    #[test]
    fn skip_policy_keeps_going() {
        let records = vec![
            StreamRecord::new("bad", json!({"not": "a stream"})),
            StreamRecord::new("good", json!([{"type": "char1", "value": "X"}])),
        ];
        let report =
            migrate_records(records.clone(), &plan(), &schema(), ErrorPolicy::SkipAndLog).unwrap();
        assert_eq!(report.migrated.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0.id, "bad");

        let err = migrate_records(records, &plan(), &schema(), ErrorPolicy::Abort).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::MalformedBlock { record: Some(ref id), .. } if id == "bad"
        ));
    }
}
