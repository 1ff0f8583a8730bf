use crate::block::{BlockKind, BlockPath, BlockValue, LIST_ITEM_NAME, raw_block_name};
use crate::error::MigrationError;
use crate::operations::{BlockOperation, ChildBlocks};
use crate::schema::BlockSchema;
use serde_json::Value;
use tracing::debug;

/// A position in the walk: the schema node describing the value being visited, the path
/// segments still to consume, and where in the tree we are.
pub(crate) struct Cursor<'a> {
    schema: &'a dyn BlockSchema,
    remaining: &'a [String],
    trail: BlockPath,
    operation: &'a dyn BlockOperation,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(
        schema: &'a dyn BlockSchema,
        path: &'a BlockPath,
        operation: &'a dyn BlockOperation,
    ) -> Self {
        Self {
            schema,
            remaining: path.segments(),
            trail: BlockPath::root(),
            operation,
        }
    }

    fn descend(&self, name: &str, schema: &'a dyn BlockSchema, consume: bool) -> Cursor<'a> {
        Cursor {
            schema,
            remaining: if consume {
                &self.remaining[1..]
            } else {
                self.remaining
            },
            trail: self.trail.child(name),
            operation: self.operation,
        }
    }

    /// Whether the node under the cursor is the one whose children get rewritten.
    ///
    /// Either the path is used up, or its last segment names the operation's target and
    /// that name is not a container the path could still descend into.
    fn is_designated_parent(&self) -> bool {
        match self.remaining {
            [] => true,
            [last] => {
                self.schema.kind().is_container()
                    && self.operation.target() == Some(last.as_str())
                    && !self.declares_container(last)
            }
            _ => false,
        }
    }

    fn declares_container(&self, name: &str) -> bool {
        let child = match self.schema.kind() {
            BlockKind::List => self.schema.child_block(),
            _ => self.schema.child(name),
        };
        child.is_some_and(|child| child.kind().is_container())
    }

    fn mismatch(&self, name: &str) -> MigrationError {
        MigrationError::SchemaMismatch {
            name: name.to_string(),
            path: self.trail.to_string(),
            record: None,
        }
    }

    fn malformed(&self, expected: &str) -> MigrationError {
        MigrationError::MalformedBlock {
            path: self.trail.to_string(),
            expected: expected.to_string(),
            record: None,
        }
    }

    /// Rewrites `raw`, the value of the node under the cursor.
    pub(crate) fn rewrite(&self, raw: Value) -> Result<Value, MigrationError> {
        if self.is_designated_parent() {
            return self.rewrite_children(raw);
        }
        let Some(segment) = self.remaining.first() else {
            return self.rewrite_children(raw);
        };

        match self.schema.kind() {
            BlockKind::Leaf => Err(self.mismatch(segment)),
            BlockKind::Stream => self.rewrite_stream(segment, raw),
            BlockKind::Struct => self.rewrite_struct(segment, raw),
            BlockKind::List => self.rewrite_list(segment, raw),
        }
    }

    /// Cursor for the declared child `segment`. Only called once the data actually holds a
    /// child of that name.
    fn child_cursor(&self, segment: &str) -> Result<Cursor<'a>, MigrationError> {
        let child_schema = self.schema.child(segment).ok_or_else(|| self.mismatch(segment))?;
        Ok(self.descend(segment, child_schema, true))
    }

    fn rewrite_stream(&self, segment: &str, raw: Value) -> Result<Value, MigrationError> {
        let Value::Array(entries) = raw else {
            return Err(self.malformed("a sequence of blocks"));
        };
        let mut next: Option<Cursor<'a>> = None;

        entries
            .into_iter()
            .map(|mut entry| {
                if raw_block_name(&entry) == Some(segment) {
                    if let Some(value) = entry.get_mut("value") {
                        if next.is_none() {
                            next = Some(self.child_cursor(segment)?);
                        }
                        if let Some(cursor) = &next {
                            *value = cursor.rewrite(std::mem::take(value))?;
                        }
                    }
                }
                Ok::<_, MigrationError>(entry)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn rewrite_struct(&self, segment: &str, raw: Value) -> Result<Value, MigrationError> {
        let Value::Object(mut fields) = raw else {
            return Err(self.malformed("an object of named child values"));
        };
        if let Some(value) = fields.get_mut(segment) {
            let next = self.child_cursor(segment)?;
            *value = next.rewrite(std::mem::take(value))?;
        }
        Ok(Value::Object(fields))
    }

    fn rewrite_list(&self, segment: &str, raw: Value) -> Result<Value, MigrationError> {
        let child_schema = self
            .schema
            .child_block()
            .ok_or_else(|| self.mismatch(segment))?;
        let next = self.descend(LIST_ITEM_NAME, child_schema, segment == LIST_ITEM_NAME);

        let BlockValue::List(mut items) = BlockValue::decode(raw, BlockKind::List, &self.trail)?
        else {
            return Err(self.malformed("a sequence of list items"));
        };
        for item in &mut items {
            item.value = next.rewrite(std::mem::take(&mut item.value))?;
        }
        Ok(BlockValue::List(items).into_raw())
    }

    fn rewrite_children(&self, raw: Value) -> Result<Value, MigrationError> {
        let kind = self.schema.kind();
        if !kind.is_container() {
            return Err(MigrationError::NotAContainer {
                path: self.trail.to_string(),
            });
        }
        let incompatible = || MigrationError::IncompatibleOperation {
            operation: self.operation.name().to_string(),
            kind,
            path: self.trail.to_string(),
        };
        if !self.operation.parent_shape().accepts(kind) {
            return Err(incompatible());
        }

        let children = ChildBlocks::from_value(BlockValue::decode(raw, kind, &self.trail)?)
            .ok_or_else(incompatible)?;
        let before = children.len();
        let rewritten = self.operation.apply(children);
        debug!(
            operation = %self.operation,
            path = %self.trail,
            before,
            after = rewritten.len(),
            "Rewrote children"
        );

        rewritten
            .into_value(kind)
            .map(BlockValue::into_raw)
            .ok_or_else(incompatible)
    }
}
