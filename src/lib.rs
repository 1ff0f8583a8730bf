//! # Henka - Block-Tree Data Migrations
//!
//! **Henka** rewrites stored block trees (the nested, self-describing stream data used by
//! Wagtail's StreamField and similar content systems) when the schema that produced them
//! changes shape. It can also work out what changed between two schema versions.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the schemas**: Load a [`BlockDef`](schema::BlockDef) from JSON, build one in
//!     code, or implement `IntoBlockDef` for your own schema model. Any type implementing
//!     [`BlockSchema`](schema::BlockSchema) works.
//! 2.  **Detect changes**: Run a [`ChangeDetector`](autodetect::ChangeDetector) over the old and
//!     the new schema. Confident renames are taken as they are; ambiguous ones and removals are
//!     put to a [`DecisionSource`](autodetect::DecisionSource).
//! 3.  **Apply**: Feed the resulting [`MigrationPlan`](plan::MigrationPlan) to stored trees, one
//!     at a time or in parallel with [`batch::migrate_records`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use henka::prelude::*;
//! use serde_json::json;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let old = BlockDef::stream([
//!         ("char1", BlockDef::leaf("CharBlock")),
//!         ("char2", BlockDef::leaf("CharBlock")),
//!     ]);
//!     let new = BlockDef::stream([
//!         ("renamed1", BlockDef::leaf("CharBlock")),
//!         ("char2", BlockDef::leaf("CharBlock")),
//!     ]);
//!
//!     // Ask on the terminal whenever the comparator is unsure.
//!     let mut detector = ChangeDetector::new(InteractiveQuestioner::stdio());
//!     let plan = detector.detect(&old, &new)?;
//!     print!("{}", plan);
//!
//!     let data = json!([
//!         {"type": "char1", "value": "X", "id": "a"},
//!         {"type": "char2", "value": "Y", "id": "b"}
//!     ]);
//!     let migrated = plan.apply(data, &old)?;
//!     println!("{}", migrated);
//!
//!     Ok(())
//! }
//! ```

pub mod autodetect;
pub mod batch;
pub mod block;
pub mod engine;
pub mod error;
pub mod operations;
pub mod plan;
pub mod prelude;
pub mod schema;

#[cfg(feature = "python-bindings")]
mod python;
