use super::config::{SimilarityConfig, Weights};
use crate::block::BlockKind;
use crate::schema::{BlockSchema, identity};
use ahash::AHashMap;
use tracing::debug;

/// Scores already computed during one detection run, keyed by the identity of both schema
/// nodes and the names they were compared under.
#[derive(Debug, Default)]
pub struct ComparisonMemo {
    scores: AHashMap<(usize, usize, String, String), f64>,
}

impl ComparisonMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// State handed to a comparer so it can score child pairs recursively.
pub struct CompareContext<'c> {
    comparator: &'c StructuralComparator,
    memo: &'c mut ComparisonMemo,
}

impl CompareContext<'_> {
    pub fn config(&self) -> &SimilarityConfig {
        self.comparator.config()
    }

    pub fn score(
        &mut self,
        old: &dyn BlockSchema,
        old_name: &str,
        new: &dyn BlockSchema,
        new_name: &str,
    ) -> f64 {
        self.comparator
            .score_with_memo(old, old_name, new, new_name, self.memo)
    }

    /// Whether the pair clears the verifying threshold.
    pub fn is_match(
        &mut self,
        old: &dyn BlockSchema,
        old_name: &str,
        new: &dyn BlockSchema,
        new_name: &str,
    ) -> bool {
        self.score(old, old_name, new, new_name) >= self.config().verifying_threshold
    }
}

/// Defines how two definitions of one block type are compared.
pub trait BlockDefComparer: Send + Sync {
    /// Whether the two definitions can be the same node at all. A `false` vetoes the pair.
    fn compare_types(&self, old: &dyn BlockSchema, new: &dyn BlockSchema) -> bool {
        old.kind() == new.kind() && old.type_name() == new.type_name()
    }

    /// Fraction of options, over the union of both key sets, that are equal on both sides.
    fn compare_options(&self, old: &dyn BlockSchema, new: &dyn BlockSchema) -> f64 {
        let old_options = old.options();
        let new_options = new.options();
        let union = old_options.len()
            + new_options
                .keys()
                .filter(|key| !old_options.contains_key(*key))
                .count();
        if union == 0 {
            return 1.0;
        }
        let equal = old_options
            .iter()
            .filter(|(key, value)| new_options.get(*key) == Some(*value))
            .count();
        equal as f64 / union as f64
    }

    fn compare_children(
        &self,
        ctx: &mut CompareContext<'_>,
        old: &dyn BlockSchema,
        new: &dyn BlockSchema,
    ) -> f64;

    fn weights<'a>(&self, config: &'a SimilarityConfig) -> &'a Weights;
}

/// Fraction of the old children that survive under the same name with a matching definition.
/// Additions on the new side are not penalised.
fn surviving_children(
    ctx: &mut CompareContext<'_>,
    old: &dyn BlockSchema,
    new: &dyn BlockSchema,
) -> f64 {
    let old_children = old.structural_children();
    if old_children.is_empty() {
        return 1.0;
    }
    let survivors = old_children
        .iter()
        .filter(|(name, old_child)| {
            new.structural_child(name)
                .is_some_and(|new_child| ctx.is_match(*old_child, name, new_child, name))
        })
        .count();
    survivors as f64 / old_children.len() as f64
}

/// Leaves: same type required, judged on their options.
pub struct LeafComparer;

impl BlockDefComparer for LeafComparer {
    fn compare_children(
        &self,
        _ctx: &mut CompareContext<'_>,
        _old: &dyn BlockSchema,
        _new: &dyn BlockSchema,
    ) -> f64 {
        1.0
    }

    fn weights<'a>(&self, config: &'a SimilarityConfig) -> &'a Weights {
        &config.leaf
    }
}

/// Stream and Struct blocks. Any two blocks of the same kind qualify, since user-defined
/// subclasses carry their own type names.
pub struct StreamOrStructComparer;

impl BlockDefComparer for StreamOrStructComparer {
    fn compare_types(&self, old: &dyn BlockSchema, new: &dyn BlockSchema) -> bool {
        old.kind() == new.kind()
    }

    fn compare_children(
        &self,
        ctx: &mut CompareContext<'_>,
        old: &dyn BlockSchema,
        new: &dyn BlockSchema,
    ) -> f64 {
        surviving_children(ctx, old, new)
    }

    fn weights<'a>(&self, config: &'a SimilarityConfig) -> &'a Weights {
        &config.container
    }
}

/// List blocks, judged on their single child.
pub struct ListComparer;

impl BlockDefComparer for ListComparer {
    fn compare_types(&self, old: &dyn BlockSchema, new: &dyn BlockSchema) -> bool {
        old.kind() == BlockKind::List && new.kind() == BlockKind::List
    }

    fn compare_children(
        &self,
        ctx: &mut CompareContext<'_>,
        old: &dyn BlockSchema,
        new: &dyn BlockSchema,
    ) -> f64 {
        surviving_children(ctx, old, new)
    }

    fn weights<'a>(&self, config: &'a SimilarityConfig) -> &'a Weights {
        &config.container
    }
}

const DEFAULT_STREAM_TYPES: &[&str] = &["StreamBlock", "wagtail.blocks.StreamBlock"];
const DEFAULT_STRUCT_TYPES: &[&str] = &["StructBlock", "wagtail.blocks.StructBlock"];
const DEFAULT_LIST_TYPES: &[&str] = &["ListBlock", "wagtail.blocks.ListBlock"];

fn register_default_comparers(registry: &mut AHashMap<String, Box<dyn BlockDefComparer>>) {
    for type_name in DEFAULT_STREAM_TYPES.iter().chain(DEFAULT_STRUCT_TYPES) {
        registry.insert(type_name.to_string(), Box::new(StreamOrStructComparer));
    }
    for type_name in DEFAULT_LIST_TYPES {
        registry.insert(type_name.to_string(), Box::new(ListComparer));
    }
}

/// Creates one of the built-in comparers by name: `leaf`, `stream_or_struct` or `list`.
fn create_comparer_by_name(name: &str) -> Option<Box<dyn BlockDefComparer>> {
    match name {
        "leaf" => Some(Box::new(LeafComparer)),
        "stream_or_struct" => Some(Box::new(StreamOrStructComparer)),
        "list" => Some(Box::new(ListComparer)),
        _ => None,
    }
}

/// Scores how likely two schema nodes are the same node across schema versions.
pub struct StructuralComparator {
    config: SimilarityConfig,
    registry: AHashMap<String, Box<dyn BlockDefComparer>>,
}

pub struct ComparatorBuilder {
    config: SimilarityConfig,
    registry: AHashMap<String, Box<dyn BlockDefComparer>>,
}

impl ComparatorBuilder {
    pub fn new(config: SimilarityConfig) -> Self {
        let mut registry: AHashMap<String, Box<dyn BlockDefComparer>> = AHashMap::new();
        register_default_comparers(&mut registry);
        Self { config, registry }
    }

    /// Uses the built-in comparer `comparer_name` for blocks of `type_name`.
    pub fn with_type_mapping(mut self, type_name: &str, comparer_name: &str) -> Self {
        if let Some(comparer) = create_comparer_by_name(comparer_name) {
            self.registry.insert(type_name.to_string(), comparer);
        }
        self
    }

    pub fn with_comparer(mut self, type_name: &str, comparer: Box<dyn BlockDefComparer>) -> Self {
        self.registry.insert(type_name.to_string(), comparer);
        self
    }

    pub fn build(self) -> StructuralComparator {
        StructuralComparator {
            config: self.config,
            registry: self.registry,
        }
    }
}

impl Default for StructuralComparator {
    fn default() -> Self {
        Self::new(SimilarityConfig::default())
    }
}

impl StructuralComparator {
    pub fn new(config: SimilarityConfig) -> Self {
        Self::builder(config).build()
    }

    pub fn builder(config: SimilarityConfig) -> ComparatorBuilder {
        ComparatorBuilder::new(config)
    }

    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    fn comparer_for(&self, schema: &dyn BlockSchema) -> &dyn BlockDefComparer {
        if let Some(comparer) = self.registry.get(schema.type_name()) {
            return comparer.as_ref();
        }
        match schema.kind() {
            BlockKind::Leaf => &LeafComparer,
            BlockKind::Stream | BlockKind::Struct => &StreamOrStructComparer,
            BlockKind::List => &ListComparer,
        }
    }

    /// Similarity of two definitions in `[0, 1]`; `0` when their types are incompatible.
    pub fn compare(
        &self,
        old: &dyn BlockSchema,
        old_name: &str,
        new: &dyn BlockSchema,
        new_name: &str,
    ) -> f64 {
        let mut memo = ComparisonMemo::new();
        self.score_with_memo(old, old_name, new, new_name, &mut memo)
    }

    /// Like [`compare`](Self::compare), reusing scores from `memo`. A memo must only be
    /// shared between calls on the same borrowed schemas.
    pub fn score_with_memo(
        &self,
        old: &dyn BlockSchema,
        old_name: &str,
        new: &dyn BlockSchema,
        new_name: &str,
        memo: &mut ComparisonMemo,
    ) -> f64 {
        let key = (
            identity(old),
            identity(new),
            old_name.to_string(),
            new_name.to_string(),
        );
        if let Some(score) = memo.scores.get(&key) {
            return *score;
        }

        let comparer = self.comparer_for(old);
        let score = if comparer.compare_types(old, new) {
            let name = if old_name == new_name { 1.0 } else { 0.0 };
            let options = comparer.compare_options(old, new);
            let mut ctx = CompareContext {
                comparator: self,
                memo: &mut *memo,
            };
            let children = comparer.compare_children(&mut ctx, old, new);
            comparer.weights(&self.config).combine(name, options, children)
        } else {
            0.0
        };

        debug!(old = old_name, new = new_name, score, "Compared block definitions");
        memo.scores.insert(key, score);
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BlockDef;
    use serde_json::json;

    fn char_block() -> BlockDef {
        BlockDef::leaf("CharBlock")
    }

    #[test]
    fn options_compared_over_union() {
        let old = char_block()
            .with_option("max_length", json!(255))
            .with_option("label", json!("Name"));
        let new = char_block()
            .with_option("max_length", json!(255))
            .with_option("help_text", json!("?"));
        let similarity = LeafComparer.compare_options(&old, &new);
        assert!((similarity - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(LeafComparer.compare_options(&char_block(), &char_block()), 1.0);
    }

    #[test]
    fn leaf_types_must_match() {
        let comparator = StructuralComparator::default();
        let score = comparator.compare(&char_block(), "a", &BlockDef::leaf("IntegerBlock"), "a");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn renamed_leaf_with_same_options_is_ambiguous() {
        let comparator = StructuralComparator::default();
        let score = comparator.compare(&char_block(), "a", &char_block(), "b");
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn memo_is_filled_and_reused() {
        let comparator = StructuralComparator::default();
        let old = BlockDef::struct_block([("first", char_block()), ("last", char_block())]);
        let new = BlockDef::struct_block([("first", char_block())]);
        let mut memo = ComparisonMemo::new();
        let first = comparator.score_with_memo(&old, "name", &new, "name", &mut memo);
        let entries = memo.len();
        assert!(entries >= 2);
        let second = comparator.score_with_memo(&old, "name", &new, "name", &mut memo);
        assert_eq!(first, second);
        assert_eq!(memo.len(), entries);
    }

    #[test]
    fn type_mapping_selects_builtin_comparer() {
        let comparator = StructuralComparator::builder(SimilarityConfig::default())
            .with_type_mapping("myapp.blocks.Card", "stream_or_struct")
            .build();
        let old = BlockDef::struct_block([("title", char_block())]).with_type("myapp.blocks.Card");
        let new = BlockDef::struct_block([("title", char_block())]).with_type("myapp.blocks.Tile");
        assert!(comparator.compare(&old, "card", &new, "tile") >= 0.9);
    }
}
