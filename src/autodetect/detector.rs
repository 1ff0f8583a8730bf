use super::comparer::{ComparisonMemo, StructuralComparator};
use super::config::Confidence;
use super::questioner::DecisionSource;
use crate::block::{BlockKind, BlockPath};
use crate::error::DetectionError;
use crate::operations::{
    Operation, RemoveStreamChildren, RemoveStructChildren, RenameStreamChildren,
    RenameStructChildren,
};
use crate::plan::MigrationPlan;
use crate::schema::BlockSchema;
use std::cmp::Reverse;
use tracing::{debug, info, warn};

/// A change recorded against the old schema path of the affected child.
struct DetectedChange {
    old_path: BlockPath,
    operation: Operation,
}

impl DetectedChange {
    fn sort_key(&self) -> (Reverse<usize>, Reverse<String>) {
        (
            Reverse(self.old_path.depth()),
            Reverse(self.old_path.to_string()),
        )
    }
}

/// Accumulated state of one detection run.
#[derive(Default)]
struct Detection {
    memo: ComparisonMemo,
    renames: Vec<DetectedChange>,
    removals: Vec<DetectedChange>,
    unresolved: Vec<BlockPath>,
}

/// Walks two schema versions side by side and works out which children were renamed or
/// removed, asking a [`DecisionSource`] whenever the comparator is not sure.
pub struct ChangeDetector<Q> {
    comparator: StructuralComparator,
    questioner: Q,
}

impl<Q: DecisionSource> ChangeDetector<Q> {
    pub fn new(questioner: Q) -> Self {
        Self::with_comparator(StructuralComparator::default(), questioner)
    }

    pub fn with_comparator(comparator: StructuralComparator, questioner: Q) -> Self {
        Self {
            comparator,
            questioner,
        }
    }

    pub fn comparator(&self) -> &StructuralComparator {
        &self.comparator
    }

    pub fn questioner(&self) -> &Q {
        &self.questioner
    }

    pub fn into_questioner(self) -> Q {
        self.questioner
    }

    /// Compares `old` against `new` and returns the changes needed to migrate data stored
    /// under `old`.
    ///
    /// Paths in the plan use old schema names, deepest first, so the plan is applied with
    /// `old` as the walk schema.
    pub fn detect(
        &mut self,
        old: &dyn BlockSchema,
        new: &dyn BlockSchema,
    ) -> Result<MigrationPlan, DetectionError> {
        let mut detection = Detection::default();
        self.compare_children(&mut detection, old, new, &BlockPath::root())?;

        let Detection {
            mut renames,
            mut removals,
            unresolved,
            ..
        } = detection;
        renames.sort_by_key(DetectedChange::sort_key);
        removals.sort_by_key(DetectedChange::sort_key);

        // Stable sort: at equal keys renames stay ahead of removals.
        let mut changes = renames;
        changes.append(&mut removals);
        changes.sort_by_key(DetectedChange::sort_key);

        let mut plan = MigrationPlan::new();
        for change in changes {
            let parent = change.old_path.parent().unwrap_or_default();
            plan.push(change.operation, parent);
        }
        plan.unresolved = unresolved;
        Ok(plan)
    }

    fn compare_children(
        &mut self,
        detection: &mut Detection,
        old: &dyn BlockSchema,
        new: &dyn BlockSchema,
        parent_path: &BlockPath,
    ) -> Result<(), DetectionError> {
        let old_children = old.structural_children();
        let new_children = new.structural_children();
        let mut new_only: Vec<(&str, &dyn BlockSchema)> = new_children
            .iter()
            .filter(|(name, _)| old.structural_child(name).is_none())
            .copied()
            .collect();

        for (old_name, old_child) in old_children {
            let old_path = parent_path.child(old_name);

            if let Some(new_child) = new.structural_child(old_name) {
                if old_child.kind() == new_child.kind() {
                    self.compare_children(detection, old_child, new_child, &old_path)?;
                } else {
                    debug!(path = %old_path, "Block changed kind, not descending");
                }
                continue;
            }

            let renamed_to =
                self.find_rename(detection, old_child, old_name, &old_path, &new_only)?;
            if let Some(index) = renamed_to {
                let (new_name, new_child) = new_only.remove(index);
                info!(from = %old_path, to = new_name, "Detected rename");
                detection.renames.push(DetectedChange {
                    operation: rename_operation(old.kind(), old_name, new_name),
                    old_path: old_path.clone(),
                });
                if old_child.kind() == new_child.kind() {
                    self.compare_children(detection, old_child, new_child, &old_path)?;
                }
                continue;
            }

            if self.questioner.confirm_removal(&old_path)? {
                info!(path = %old_path, "Detected removal");
                detection.removals.push(DetectedChange {
                    operation: remove_operation(old.kind(), old_name),
                    old_path,
                });
            } else {
                warn!(
                    path = %old_path,
                    "Block was neither renamed nor removed, no operation emitted"
                );
                detection.unresolved.push(old_path);
            }
        }
        Ok(())
    }

    /// Index into `candidates` of the new child `old_child` was renamed to, if any.
    fn find_rename(
        &mut self,
        detection: &mut Detection,
        old_child: &dyn BlockSchema,
        old_name: &str,
        old_path: &BlockPath,
        candidates: &[(&str, &dyn BlockSchema)],
    ) -> Result<Option<usize>, DetectionError> {
        let config = self.comparator.config();
        let mut scored: Vec<(usize, f64)> = candidates
            .iter()
            .enumerate()
            .map(|(index, (new_name, new_child))| {
                let score = self.comparator.score_with_memo(
                    old_child,
                    old_name,
                    *new_child,
                    new_name,
                    &mut detection.memo,
                );
                (index, score)
            })
            .filter(|(_, score)| config.classify(*score) != Confidence::Dissimilar)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (index, score) in scored {
            let new_path = old_path
                .parent()
                .unwrap_or_default()
                .child(candidates[index].0);
            match config.classify(score) {
                Confidence::Confident => return Ok(Some(index)),
                _ => {
                    if self.questioner.confirm_rename(old_path, &new_path)? {
                        return Ok(Some(index));
                    }
                }
            }
        }
        Ok(None)
    }
}

fn rename_operation(parent_kind: BlockKind, old_name: &str, new_name: &str) -> Operation {
    match parent_kind {
        BlockKind::Struct => RenameStructChildren::new(old_name, new_name).into(),
        _ => RenameStreamChildren::new(old_name, new_name).into(),
    }
}

fn remove_operation(parent_kind: BlockKind, name: &str) -> Operation {
    match parent_kind {
        BlockKind::Struct => RemoveStructChildren::new(name).into(),
        _ => RemoveStreamChildren::new(name).into(),
    }
}
