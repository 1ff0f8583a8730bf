//! The path-guided mutation engine.
//!
//! [`apply`] walks a stored block tree together with its schema, following a [`BlockPath`]
//! to the designated parent and letting an operation rewrite that parent's children. Nodes
//! off the path are moved through untouched.

mod cursor;

use crate::block::BlockPath;
use crate::error::MigrationError;
use crate::operations::BlockOperation;
use crate::schema::BlockSchema;
use cursor::Cursor;
use serde_json::Value;

/// Applies `operation` at `path` inside `raw`, the stored value of a node described by `schema`.
///
/// `path` addresses the parent whose children are rewritten, with `""` meaning the root.
/// A path ending in the operation's target name is accepted too, so `"list1.item.char1"`
/// with a rename of `char1` rewrites the children of every `list1` item.
pub fn apply(
    raw: Value,
    schema: &dyn BlockSchema,
    path: &BlockPath,
    operation: &dyn BlockOperation,
) -> Result<Value, MigrationError> {
    Cursor::new(schema, path, operation).rewrite(raw)
}

/// Like [`apply`], for tree data held as a JSON string.
pub fn apply_str(
    json: &str,
    schema: &dyn BlockSchema,
    path: &BlockPath,
    operation: &dyn BlockOperation,
) -> Result<String, MigrationError> {
    let raw: Value =
        serde_json::from_str(json).map_err(|e| MigrationError::JsonParseError(e.to_string()))?;
    let rewritten = apply(raw, schema, path, operation)?;
    serde_json::to_string(&rewritten).map_err(|e| MigrationError::JsonParseError(e.to_string()))
}
