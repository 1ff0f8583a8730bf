//! Detection of renamed and removed blocks between two schema versions.
//!
//! The [`StructuralComparator`] scores pairs of definitions; the [`ChangeDetector`] walks
//! both schemas, trusts same-name children, scores the rest, and asks a [`DecisionSource`]
//! when a score falls in the ambiguous band.

pub mod comparer;
pub mod config;
pub mod detector;
pub mod questioner;

pub use comparer::*;
pub use config::*;
pub use detector::*;
pub use questioner::*;
