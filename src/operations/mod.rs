//! Stateless rewrites of one container's children.
//!
//! Every operation receives the designated parent's children in their parent-shaped form
//! ([`ChildBlocks`]) and returns the rewritten children. Locating the parent and checking
//! that its shape fits is the engine's job; operations never fail.

pub mod remove;
pub mod rename;
pub mod restructure;

pub use remove::*;
pub use rename::*;
pub use restructure::*;

use crate::block::{Block, BlockKind, BlockValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Debug, Display};

/// The children of a designated parent, in the shape the parent stores them.
#[derive(Debug, Clone, PartialEq)]
pub enum ChildBlocks {
    /// Entries of a Stream or items of a List, in order.
    Sequence(Vec<Block>),
    /// Keyed children of a Struct.
    Mapping(Map<String, Value>),
}

impl ChildBlocks {
    pub fn len(&self) -> usize {
        match self {
            ChildBlocks::Sequence(blocks) => blocks.len(),
            ChildBlocks::Mapping(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits a container payload into its children. `None` for leaves.
    pub fn from_value(value: BlockValue) -> Option<Self> {
        match value {
            BlockValue::Stream(blocks) | BlockValue::List(blocks) => {
                Some(ChildBlocks::Sequence(blocks))
            }
            BlockValue::Struct(map) => Some(ChildBlocks::Mapping(map)),
            BlockValue::Leaf(_) => None,
        }
    }

    /// Puts rewritten children back into a payload of `kind`. `None` when the shapes disagree.
    pub fn into_value(self, kind: BlockKind) -> Option<BlockValue> {
        match (self, kind) {
            (ChildBlocks::Sequence(blocks), BlockKind::Stream) => Some(BlockValue::Stream(blocks)),
            (ChildBlocks::Sequence(blocks), BlockKind::List) => Some(BlockValue::List(blocks)),
            (ChildBlocks::Mapping(map), BlockKind::Struct) => Some(BlockValue::Struct(map)),
            _ => None,
        }
    }
}

/// The kinds of parent an operation knows how to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentShape {
    Stream,
    Struct,
    List,
    /// Stream or List.
    Sequence,
    Any,
}

impl ParentShape {
    pub fn accepts(self, kind: BlockKind) -> bool {
        match self {
            ParentShape::Stream => kind == BlockKind::Stream,
            ParentShape::Struct => kind == BlockKind::Struct,
            ParentShape::List => kind == BlockKind::List,
            ParentShape::Sequence => matches!(kind, BlockKind::Stream | BlockKind::List),
            ParentShape::Any => kind.is_container(),
        }
    }
}

/// Defines the contract for rewriting the children of one designated parent.
pub trait BlockOperation: Send + Sync + Debug + Display {
    /// Stable identifier, used in logs and errors.
    fn name(&self) -> &'static str;

    fn parent_shape(&self) -> ParentShape;

    /// The child name this operation acts on, when it acts on a single name.
    fn target(&self) -> Option<&str>;

    fn apply(&self, children: ChildBlocks) -> ChildBlocks;
}

/// Generates the serializable [`Operation`] enum over every built-in operation.
macro_rules! define_operations {
    ( $( ($variant:ident, $op_type:ty) ),* $(,)? ) => {
        /// Any built-in operation, in the form stored in migration plans.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "op", rename_all = "snake_case")]
        pub enum Operation {
            $( $variant($op_type), )*
        }

        impl Operation {
            pub fn as_dyn(&self) -> &dyn BlockOperation {
                match self {
                    $( Operation::$variant(op) => op, )*
                }
            }
        }

        $(
            impl From<$op_type> for Operation {
                fn from(op: $op_type) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

define_operations! {
    (RenameStreamChildren, RenameStreamChildren),
    (RenameStructChildren, RenameStructChildren),
    (RemoveStreamChildren, RemoveStreamChildren),
    (RemoveStructChildren, RemoveStructChildren),
    (StreamChildrenToList, StreamChildrenToList),
    (StreamChildrenToStream, StreamChildrenToStream),
    (StreamChildrenToStruct, StreamChildrenToStruct),
    (ListChildrenToStruct, ListChildrenToStruct),
    (AlterBlockValue, AlterBlockValue),
}

impl BlockOperation for Operation {
    fn name(&self) -> &'static str {
        self.as_dyn().name()
    }

    fn parent_shape(&self) -> ParentShape {
        self.as_dyn().parent_shape()
    }

    fn target(&self) -> Option<&str> {
        self.as_dyn().target()
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        self.as_dyn().apply(children)
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(self.as_dyn(), f)
    }
}
