use super::{BlockOperation, ChildBlocks, ParentShape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Renames every Stream entry (or List item) called `old_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameStreamChildren {
    pub old_name: String,
    pub new_name: String,
}

impl RenameStreamChildren {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }
}

impl BlockOperation for RenameStreamChildren {
    fn name(&self) -> &'static str {
        "rename_stream_children"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Sequence
    }

    fn target(&self) -> Option<&str> {
        Some(&self.old_name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        match children {
            ChildBlocks::Sequence(blocks) => ChildBlocks::Sequence(
                blocks
                    .into_iter()
                    .map(|mut block| {
                        if block.name == self.old_name {
                            block.name = self.new_name.clone();
                        }
                        block
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}

impl fmt::Display for RenameStreamChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RENAME {} TO {}", self.old_name, self.new_name)
    }
}

/// Rekeys the Struct child `old_name` to `new_name`, keeping its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameStructChildren {
    pub old_name: String,
    pub new_name: String,
}

impl RenameStructChildren {
    pub fn new(old_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            old_name: old_name.into(),
            new_name: new_name.into(),
        }
    }
}

impl BlockOperation for RenameStructChildren {
    fn name(&self) -> &'static str {
        "rename_struct_children"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Struct
    }

    fn target(&self) -> Option<&str> {
        Some(&self.old_name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        match children {
            ChildBlocks::Mapping(map) => ChildBlocks::Mapping(
                map.into_iter()
                    .map(|(key, value)| {
                        if key == self.old_name {
                            (self.new_name.clone(), value)
                        } else {
                            (key, value)
                        }
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}

impl fmt::Display for RenameStructChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RENAME {} TO {}", self.old_name, self.new_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use serde_json::{Map, Value, json};

    #[test]
    fn renames_every_matching_entry() {
        let children = ChildBlocks::Sequence(vec![
            Block::new("char1", json!("X")).with_id("1"),
            Block::new("char2", json!("Y")),
            Block::new("char1", json!("Z")),
        ]);
        let ChildBlocks::Sequence(blocks) =
            RenameStreamChildren::new("char1", "renamed1").apply(children)
        else {
            panic!("expected a sequence");
        };
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["renamed1", "char2", "renamed1"]);
        assert_eq!(blocks[0].id.as_deref(), Some("1"));
        assert_eq!(blocks[2].value, json!("Z"));
    }

    #[test]
    fn struct_rename_keeps_key_position() {
        let map: Map<String, Value> = serde_json::from_value(json!({"a": 1, "char1": 2, "b": 3})).unwrap();
        let ChildBlocks::Mapping(map) =
            RenameStructChildren::new("char1", "renamed1").apply(ChildBlocks::Mapping(map))
        else {
            panic!("expected a mapping");
        };
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "renamed1", "b"]);
        assert_eq!(map["renamed1"], json!(2));
    }

    #[test]
    fn mismatched_shape_is_returned_unchanged() {
        let children = ChildBlocks::Mapping(Map::new());
        assert_eq!(
            RenameStreamChildren::new("a", "b").apply(children.clone()),
            children
        );
    }
}
