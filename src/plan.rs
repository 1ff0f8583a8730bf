use crate::block::BlockPath;
use crate::engine;
use crate::error::PlanError;
use crate::operations::Operation;
use crate::schema::BlockSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::fs;

/// One operation and the path of the parent whose children it rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedChange {
    pub operation: Operation,
    pub block_path: BlockPath,
}

impl PlannedChange {
    pub fn new(operation: impl Into<Operation>, block_path: impl Into<BlockPath>) -> Self {
        Self {
            operation: operation.into(),
            block_path: block_path.into(),
        }
    }
}

/// An ordered list of changes to run against stored block trees.
///
/// `unresolved` lists old schema paths the detector could neither map nor remove; they
/// produce no operation and are kept for the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MigrationPlan {
    pub changes: Vec<PlannedChange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<BlockPath>,
}

impl MigrationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: impl Into<Operation>, block_path: impl Into<BlockPath>) {
        self.changes.push(PlannedChange::new(operation, block_path));
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlannedChange> {
        self.changes.iter()
    }

    /// Runs every change, in order, against one stored tree.
    ///
    /// `schema` is the schema the stored data currently conforms to. Plans produced by
    /// the change detector name blocks by their old names, deepest first, so they are
    /// applied with the old schema. Trees holding none of the affected blocks come back
    /// unchanged under either schema.
    pub fn apply(&self, raw: Value, schema: &dyn BlockSchema) -> Result<Value, PlanError> {
        self.changes.iter().try_fold(raw, |raw, change| {
            engine::apply(raw, schema, &change.block_path, &change.operation)
                .map_err(PlanError::from)
        })
    }

    pub fn to_json(&self) -> Result<String, PlanError> {
        serde_json::to_string_pretty(self).map_err(|e| PlanError::JsonParseError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, PlanError> {
        serde_json::from_str(json).map_err(|e| PlanError::JsonParseError(e.to_string()))
    }

    pub fn save(&self, path: &str) -> Result<(), PlanError> {
        fs::write(path, self.to_json()?).map_err(|e| PlanError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a plan from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|e| PlanError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

impl<'a> IntoIterator for &'a MigrationPlan {
    type Item = &'a PlannedChange;
    type IntoIter = std::slice::Iter<'a, PlannedChange>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for change in &self.changes {
            let path = if change.block_path.is_root() {
                "<root>".to_string()
            } else {
                change.block_path.to_string()
            };
            writeln!(f, "{} (at {})", change.operation, path)?;
        }
        for path in &self.unresolved {
            writeln!(f, "UNRESOLVED {}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::{RemoveStructChildren, RenameStreamChildren};

    #[test]
    fn plan_json_shape() {
        let mut plan = MigrationPlan::new();
        plan.push(RemoveStructChildren::new("char1"), "struct1");
        plan.push(RenameStreamChildren::new("struct1", "record"), "");

        let json = plan.to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["changes"][0]["block_path"], "struct1");
        assert_eq!(value["changes"][0]["operation"]["op"], "remove_struct_children");
        assert!(value.get("unresolved").is_none());

        assert_eq!(MigrationPlan::from_json(&json).unwrap(), plan);
    }

    #[test]
    fn display_lists_one_line_per_change() {
        let mut plan = MigrationPlan::new();
        plan.push(RemoveStructChildren::new("char1"), "struct1");
        plan.push(RenameStreamChildren::new("a", "b"), "");
        plan.unresolved.push(BlockPath::parse("char9"));
        assert_eq!(
            plan.to_string(),
            "REMOVE char1 (at struct1)\nRENAME a TO b (at <root>)\nUNRESOLVED char9\n"
        );
    }
}
