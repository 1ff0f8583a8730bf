use super::{BlockOperation, ChildBlocks, ParentShape};
use crate::block::{Block, LIST_ITEM_NAME};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Moves every Stream entry called `block_name` into one new List entry appended at the end.
///
/// Each moved entry becomes a List item carrying the entry's value and id. Nothing is
/// appended when there are no matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChildrenToList {
    pub block_name: String,
    pub list_block_name: String,
}

impl StreamChildrenToList {
    pub fn new(block_name: impl Into<String>, list_block_name: impl Into<String>) -> Self {
        Self {
            block_name: block_name.into(),
            list_block_name: list_block_name.into(),
        }
    }
}

impl BlockOperation for StreamChildrenToList {
    fn name(&self) -> &'static str {
        "stream_children_to_list"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Stream
    }

    fn target(&self) -> Option<&str> {
        Some(&self.block_name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        let blocks = match children {
            ChildBlocks::Sequence(blocks) => blocks,
            other => return other,
        };
        let (matched, mut kept): (Vec<Block>, Vec<Block>) = blocks
            .into_iter()
            .partition(|block| block.name == self.block_name);
        if matched.is_empty() {
            return ChildBlocks::Sequence(kept);
        }

        let items = matched
            .into_iter()
            .map(|block| {
                Block {
                    name: LIST_ITEM_NAME.to_string(),
                    value: block.value,
                    id: block.id,
                    extra: Map::new(),
                }
                .into_raw()
            })
            .collect();
        kept.push(Block::new(self.list_block_name.clone(), Value::Array(items)));
        ChildBlocks::Sequence(kept)
    }
}

impl fmt::Display for StreamChildrenToList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MOVE {} INTO LIST {}", self.block_name, self.list_block_name)
    }
}

/// Moves every Stream entry whose name is in `block_names` into one new Stream entry
/// appended at the end. Moved entries keep their names and ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChildrenToStream {
    pub block_names: Vec<String>,
    pub stream_block_name: String,
}

impl StreamChildrenToStream {
    pub fn new<I, S>(block_names: I, stream_block_name: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            block_names: block_names.into_iter().map(Into::into).collect(),
            stream_block_name: stream_block_name.into(),
        }
    }
}

impl BlockOperation for StreamChildrenToStream {
    fn name(&self) -> &'static str {
        "stream_children_to_stream"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Stream
    }

    fn target(&self) -> Option<&str> {
        None
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        let blocks = match children {
            ChildBlocks::Sequence(blocks) => blocks,
            other => return other,
        };
        let (matched, mut kept): (Vec<Block>, Vec<Block>) = blocks
            .into_iter()
            .partition(|block| self.block_names.contains(&block.name));
        if matched.is_empty() {
            return ChildBlocks::Sequence(kept);
        }

        let entries = matched.into_iter().map(Block::into_raw).collect();
        kept.push(Block::new(self.stream_block_name.clone(), Value::Array(entries)));
        ChildBlocks::Sequence(kept)
    }
}

impl fmt::Display for StreamChildrenToStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MOVE {} INTO STREAM {}",
            self.block_names.iter().join(", "),
            self.stream_block_name
        )
    }
}

/// Wraps every Stream entry called `block_name`, in place, into a Struct entry named
/// `struct_block_name` whose single child `block_name` holds the old value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChildrenToStruct {
    pub block_name: String,
    pub struct_block_name: String,
}

impl StreamChildrenToStruct {
    pub fn new(block_name: impl Into<String>, struct_block_name: impl Into<String>) -> Self {
        Self {
            block_name: block_name.into(),
            struct_block_name: struct_block_name.into(),
        }
    }
}

impl BlockOperation for StreamChildrenToStruct {
    fn name(&self) -> &'static str {
        "stream_children_to_struct"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Stream
    }

    fn target(&self) -> Option<&str> {
        Some(&self.block_name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        let blocks = match children {
            ChildBlocks::Sequence(blocks) => blocks,
            other => return other,
        };
        ChildBlocks::Sequence(
            blocks
                .into_iter()
                .map(|mut block| {
                    if block.name == self.block_name {
                        let mut fields = Map::new();
                        fields.insert(self.block_name.clone(), std::mem::take(&mut block.value));
                        block.name = self.struct_block_name.clone();
                        block.value = Value::Object(fields);
                    }
                    block
                })
                .collect(),
        )
    }
}

impl fmt::Display for StreamChildrenToStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WRAP {} IN STRUCT {}", self.block_name, self.struct_block_name)
    }
}

/// Turns every List item's value into a Struct value `{block_name: value}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListChildrenToStruct {
    pub block_name: String,
}

impl ListChildrenToStruct {
    pub fn new(block_name: impl Into<String>) -> Self {
        Self {
            block_name: block_name.into(),
        }
    }
}

impl BlockOperation for ListChildrenToStruct {
    fn name(&self) -> &'static str {
        "list_children_to_struct"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::List
    }

    fn target(&self) -> Option<&str> {
        None
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        let items = match children {
            ChildBlocks::Sequence(items) => items,
            other => return other,
        };
        ChildBlocks::Sequence(
            items
                .into_iter()
                .map(|mut item| {
                    let mut fields = Map::new();
                    fields.insert(self.block_name.clone(), std::mem::take(&mut item.value));
                    item.value = Value::Object(fields);
                    item
                })
                .collect(),
        )
    }
}

impl fmt::Display for ListChildrenToStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WRAP ITEMS IN STRUCT AS {}", self.block_name)
    }
}

/// Replaces the value of every child called `name` with `new_value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterBlockValue {
    pub name: String,
    pub new_value: Value,
}

impl AlterBlockValue {
    pub fn new(name: impl Into<String>, new_value: Value) -> Self {
        Self {
            name: name.into(),
            new_value,
        }
    }
}

impl BlockOperation for AlterBlockValue {
    fn name(&self) -> &'static str {
        "alter_block_value"
    }

    fn parent_shape(&self) -> ParentShape {
        ParentShape::Any
    }

    fn target(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn apply(&self, children: ChildBlocks) -> ChildBlocks {
        match children {
            ChildBlocks::Sequence(blocks) => ChildBlocks::Sequence(
                blocks
                    .into_iter()
                    .map(|mut block| {
                        if block.name == self.name {
                            block.value = self.new_value.clone();
                        }
                        block
                    })
                    .collect(),
            ),
            ChildBlocks::Mapping(mut map) => {
                if let Some(value) = map.get_mut(&self.name) {
                    *value = self.new_value.clone();
                }
                ChildBlocks::Mapping(map)
            }
        }
    }
}

impl fmt::Display for AlterBlockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SET VALUE OF {} TO {}", self.name, self.new_value)
    }
}
