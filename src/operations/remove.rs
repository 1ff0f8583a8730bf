use super::{BlockOperation, ChildBlocks, ParentShape};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Drops every Stream entry (or List item) called `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStreamChildren {
    pub name: String,
}

impl RemoveStreamChildren {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BlockOperation for RemoveStreamChildren {
    fn name(&self) -> &'static str {
        "remove_stream_children"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Sequence
    }

    fn target(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        match children {
            ChildBlocks::Sequence(blocks) => ChildBlocks::Sequence(
                blocks
                    .into_iter()
                    .filter(|block| block.name != self.name)
                    .collect(),
            ),
            other => other,
        }
    }
}

impl fmt::Display for RemoveStreamChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REMOVE {}", self.name)
    }
}

/// Deletes the Struct child `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStructChildren {
    pub name: String,
}

impl RemoveStructChildren {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl BlockOperation for RemoveStructChildren {
    fn name(&self) -> &'static str {
        "remove_struct_children"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Struct
    }

    fn target(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        match children {
            ChildBlocks::Mapping(mut map) => {
                map.shift_remove(&self.name);
                ChildBlocks::Mapping(map)
            }
            other => other,
        }
    }
}

impl fmt::Display for RemoveStructChildren {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "REMOVE {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use serde_json::{Map, Value, json};

    #[test]
    fn removes_all_matches_and_keeps_order() {
        let children = ChildBlocks::Sequence(vec![
            Block::new("char1", json!("X")),
            Block::new("char2", json!("Y")),
            Block::new("char1", json!("Z")),
            Block::new("char3", json!("W")),
        ]);
        let ChildBlocks::Sequence(blocks) = RemoveStreamChildren::new("char1").apply(children)
        else {
            panic!("expected a sequence");
        };
        let names: Vec<_> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["char2", "char3"]);
    }

    #[test]
    fn removes_struct_key() {
        let map: Map<String, Value> =
            serde_json::from_value(json!({"char1": "X", "char2": "Y"})).unwrap();
        let result = RemoveStructChildren::new("char1").apply(ChildBlocks::Mapping(map));
        assert_eq!(result.len(), 1);
        let ChildBlocks::Mapping(map) = result else {
            panic!("expected a mapping");
        };
        assert_eq!(Value::Object(map), json!({"char2": "Y"}));
    }
}
