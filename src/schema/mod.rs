pub mod conversion;
pub mod definition;

pub use conversion::*;
pub use definition::*;

use crate::block::{BlockKind, LIST_ITEM_NAME};
use indexmap::IndexMap;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt::Debug;

/// Declared options of a schema node, resolved with their defaults. Order carries no meaning.
pub type BlockOptions = IndexMap<String, Value>;

/// Read-only view of one schema node.
///
/// The engine and the comparator only ever talk to schemas through this trait, so any
/// schema source can be plugged in. [`BlockDef`] is the serde-loadable implementation
/// shipped with the crate.
pub trait BlockSchema: Send + Sync + Debug {
    fn kind(&self) -> BlockKind;

    /// The declared type identity, e.g. `wagtail.blocks.CharBlock`.
    fn type_name(&self) -> &str;

    fn options(&self) -> Cow<'_, BlockOptions>;

    /// A named child of a Stream or Struct node.
    fn child(&self, name: &str) -> Option<&dyn BlockSchema>;

    /// Named children in declaration order. Empty for List and Leaf nodes.
    fn children(&self) -> Vec<(&str, &dyn BlockSchema)>;

    /// The single child of a List node.
    fn child_block(&self) -> Option<&dyn BlockSchema>;

    /// Children as seen by structural comparison: the named children, or the List child
    /// under the `"item"` placeholder.
    fn structural_children(&self) -> Vec<(&str, &dyn BlockSchema)> {
        match self.kind() {
            BlockKind::List => self
                .child_block()
                .map(|child| vec![(LIST_ITEM_NAME, child)])
                .unwrap_or_default(),
            _ => self.children(),
        }
    }

    /// Looks up a structural child, accepting `"item"` for the child of a List.
    fn structural_child(&self, name: &str) -> Option<&dyn BlockSchema> {
        match self.kind() {
            BlockKind::List if name == LIST_ITEM_NAME => self.child_block(),
            _ => self.child(name),
        }
    }
}

/// Address-based identity of a schema node, stable for the lifetime of the borrow.
pub fn identity(schema: &dyn BlockSchema) -> usize {
    std::ptr::from_ref(schema).cast::<()>() as usize
}
