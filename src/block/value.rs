use super::BlockPath;
use crate::error::MigrationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Placeholder name carried by every List item and used in paths to step into a List.
pub const LIST_ITEM_NAME: &str = "item";

const TYPE_KEY: &str = "type";
const VALUE_KEY: &str = "value";
const ID_KEY: &str = "id";

/// The fundamental category of a node in a block tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Stream,
    Struct,
    List,
    Leaf,
}

impl BlockKind {
    pub fn is_container(self) -> bool {
        !matches!(self, BlockKind::Leaf)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockKind::Stream => "stream",
            BlockKind::Struct => "struct",
            BlockKind::List => "list",
            BlockKind::Leaf => "leaf",
        };
        f.write_str(name)
    }
}

/// One entry of a Stream or List payload.
///
/// On the wire this is `{"type": name, "value": ..., "id": ...}`. Any other keys found on
/// the entry are kept in `extra` and written back after the known ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub value: Value,
    pub id: Option<String>,
    pub extra: Map<String, Value>,
}

impl Block {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            id: None,
            extra: Map::new(),
        }
    }

    /// A List item wrapping `value`.
    pub fn item(value: Value) -> Self {
        Self::new(LIST_ITEM_NAME, value)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Reads an entry from its wire form. Hands the value back untouched when it is not an
    /// object carrying a string `type` and a `value`.
    pub fn from_raw(raw: Value) -> Result<Self, Value> {
        let is_block = raw
            .as_object()
            .is_some_and(|map| {
                map.get(TYPE_KEY).is_some_and(Value::is_string) && map.contains_key(VALUE_KEY)
            });
        if !is_block {
            return Err(raw);
        }
        let mut map = match raw {
            Value::Object(map) => map,
            other => return Err(other),
        };

        let name = match map.shift_remove(TYPE_KEY) {
            Some(Value::String(name)) => name,
            _ => String::new(),
        };
        let value = map.shift_remove(VALUE_KEY).unwrap_or(Value::Null);
        let id = match map.get(ID_KEY) {
            Some(Value::String(_)) => match map.shift_remove(ID_KEY) {
                Some(Value::String(id)) => Some(id),
                _ => None,
            },
            _ => None,
        };

        Ok(Self {
            name,
            value,
            id,
            extra: map,
        })
    }

    pub fn into_raw(self) -> Value {
        let mut map = Map::with_capacity(3 + self.extra.len());
        map.insert(TYPE_KEY.to_string(), Value::String(self.name));
        map.insert(VALUE_KEY.to_string(), self.value);
        if let Some(id) = self.id {
            map.insert(ID_KEY.to_string(), Value::String(id));
        }
        map.extend(self.extra);
        Value::Object(map)
    }
}

/// Peeks at the name of a raw Stream or List entry without decoding it.
pub fn raw_block_name(raw: &Value) -> Option<&str> {
    raw.get(TYPE_KEY).and_then(Value::as_str)
}

/// Whether `raw` is already in the wrapped `{"type": "item", "value": ...}` List form.
pub fn is_wrapped_item(raw: &Value) -> bool {
    raw_block_name(raw) == Some(LIST_ITEM_NAME) && raw.get(VALUE_KEY).is_some()
}

/// The decoded payload of one node. Children stay in their raw form.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockValue {
    Stream(Vec<Block>),
    Struct(Map<String, Value>),
    List(Vec<Block>),
    Leaf(Value),
}

impl BlockValue {
    /// Decodes `raw` as a payload of the given kind.
    ///
    /// List payloads in the legacy bare form are wrapped into items here; items that are
    /// already wrapped keep their ids.
    pub fn decode(raw: Value, kind: BlockKind, path: &BlockPath) -> Result<Self, MigrationError> {
        match kind {
            BlockKind::Stream => decode_stream(raw, path).map(BlockValue::Stream),
            BlockKind::Struct => decode_struct(raw, path).map(BlockValue::Struct),
            BlockKind::List => decode_list(raw, path).map(BlockValue::List),
            BlockKind::Leaf => Ok(BlockValue::Leaf(raw)),
        }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            BlockValue::Stream(_) => BlockKind::Stream,
            BlockValue::Struct(_) => BlockKind::Struct,
            BlockValue::List(_) => BlockKind::List,
            BlockValue::Leaf(_) => BlockKind::Leaf,
        }
    }

    pub fn into_raw(self) -> Value {
        match self {
            BlockValue::Stream(blocks) | BlockValue::List(blocks) => {
                Value::Array(blocks.into_iter().map(Block::into_raw).collect())
            }
            BlockValue::Struct(map) => Value::Object(map),
            BlockValue::Leaf(value) => value,
        }
    }
}

fn malformed(path: &BlockPath, expected: &str) -> MigrationError {
    MigrationError::MalformedBlock {
        path: path.to_string(),
        expected: expected.to_string(),
        record: None,
    }
}

fn decode_stream(raw: Value, path: &BlockPath) -> Result<Vec<Block>, MigrationError> {
    let Value::Array(entries) = raw else {
        return Err(malformed(path, "a sequence of blocks"));
    };
    entries
        .into_iter()
        .map(|entry| {
            Block::from_raw(entry)
                .map_err(|_| malformed(path, "a block with a string 'type' and a 'value'"))
        })
        .collect()
}

fn decode_struct(raw: Value, path: &BlockPath) -> Result<Map<String, Value>, MigrationError> {
    match raw {
        Value::Object(map) => Ok(map),
        _ => Err(malformed(path, "an object of named child values")),
    }
}

fn decode_list(raw: Value, path: &BlockPath) -> Result<Vec<Block>, MigrationError> {
    let Value::Array(entries) = raw else {
        return Err(malformed(path, "a sequence of list items"));
    };
    Ok(entries
        .into_iter()
        .map(|entry| {
            if is_wrapped_item(&entry) {
                Block::from_raw(entry).unwrap_or_else(Block::item)
            } else {
                Block::item(entry)
            }
        })
        .collect())
}
