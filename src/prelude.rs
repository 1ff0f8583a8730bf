//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use henka::prelude::*;
//!
//! let schema = BlockDef::struct_block([
//!     ("char1", BlockDef::leaf("CharBlock")),
//!     ("char2", BlockDef::leaf("CharBlock")),
//! ]);
//! let data = serde_json::json!({"char1": "X", "char2": "Y"});
//! let migrated = engine::apply(
//!     data,
//!     &schema,
//!     &BlockPath::root(),
//!     &RemoveStructChildren::new("char1"),
//! )
//! .unwrap();
//! assert_eq!(migrated, serde_json::json!({"char2": "Y"}));
//! ```

// Tree model and paths
pub use crate::block::{Block, BlockKind, BlockPath, BlockValue, LIST_ITEM_NAME};

// Schemas
pub use crate::schema::{BlockDef, BlockOptions, BlockSchema, DeconstructedBlock, IntoBlockDef};

// Operations and the engine
pub use crate::engine;
pub use crate::operations::{
    AlterBlockValue, BlockOperation, ChildBlocks, ListChildrenToStruct, Operation, ParentShape,
    RemoveStreamChildren, RemoveStructChildren, RenameStreamChildren, RenameStructChildren,
    StreamChildrenToList, StreamChildrenToStream, StreamChildrenToStruct,
};

// Change detection
pub use crate::autodetect::{
    AlwaysConfirm, ChangeDetector, DecisionSource, InteractiveQuestioner, NeverConfirm,
    RecordedDecisions, SimilarityConfig, StructuralComparator, Weights,
};

// Plans and batches
pub use crate::batch::{BatchReport, ErrorPolicy, StreamRecord, migrate_records};
pub use crate::plan::{MigrationPlan, PlannedChange};

// Error types
pub use crate::error::{
    ConfigError, DecisionError, DetectionError, MigrationError, PlanError, SchemaError,
};
