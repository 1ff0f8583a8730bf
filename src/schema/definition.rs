use super::{BlockOptions, BlockSchema};
use crate::block::BlockKind;
use crate::error::SchemaError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fs;

fn default_stream_type() -> String {
    "StreamBlock".to_string()
}

fn default_struct_type() -> String {
    "StructBlock".to_string()
}

fn default_list_type() -> String {
    "ListBlock".to_string()
}

/// A schema node definition that can be written by hand or loaded from JSON.
///
/// ```json
/// {"kind": "stream", "children": {
///     "char1": {"kind": "leaf", "type": "CharBlock", "options": {"max_length": 255}},
///     "list1": {"kind": "list", "child": {"kind": "leaf", "type": "CharBlock"}}
/// }}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockDef {
    Stream {
        #[serde(rename = "type", default = "default_stream_type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        options: BlockOptions,
        #[serde(default)]
        children: IndexMap<String, BlockDef>,
    },
    Struct {
        #[serde(rename = "type", default = "default_struct_type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        options: BlockOptions,
        #[serde(default)]
        children: IndexMap<String, BlockDef>,
    },
    List {
        #[serde(rename = "type", default = "default_list_type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        options: BlockOptions,
        child: Box<BlockDef>,
    },
    Leaf {
        #[serde(rename = "type")]
        type_name: String,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        options: BlockOptions,
    },
}

impl BlockDef {
    pub fn leaf(type_name: impl Into<String>) -> Self {
        BlockDef::Leaf {
            type_name: type_name.into(),
            options: BlockOptions::new(),
        }
    }

    pub fn stream<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, BlockDef)>,
        S: Into<String>,
    {
        BlockDef::Stream {
            type_name: default_stream_type(),
            options: BlockOptions::new(),
            children: collect_children(children),
        }
    }

    pub fn struct_block<I, S>(children: I) -> Self
    where
        I: IntoIterator<Item = (S, BlockDef)>,
        S: Into<String>,
    {
        BlockDef::Struct {
            type_name: default_struct_type(),
            options: BlockOptions::new(),
            children: collect_children(children),
        }
    }

    pub fn list(child: BlockDef) -> Self {
        BlockDef::List {
            type_name: default_list_type(),
            options: BlockOptions::new(),
            child: Box::new(child),
        }
    }

    /// Replaces the declared type name, keeping kind, options and children.
    pub fn with_type(mut self, name: impl Into<String>) -> Self {
        match &mut self {
            BlockDef::Stream { type_name, .. }
            | BlockDef::Struct { type_name, .. }
            | BlockDef::List { type_name, .. }
            | BlockDef::Leaf { type_name, .. } => *type_name = name.into(),
        }
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options_mut().insert(key.into(), value);
        self
    }

    fn options_mut(&mut self) -> &mut BlockOptions {
        match self {
            BlockDef::Stream { options, .. }
            | BlockDef::Struct { options, .. }
            | BlockDef::List { options, .. }
            | BlockDef::Leaf { options, .. } => options,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }

    /// Load a schema definition from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Io {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        serde_json::to_string_pretty(self).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }
}

fn collect_children<I, S>(children: I) -> IndexMap<String, BlockDef>
where
    I: IntoIterator<Item = (S, BlockDef)>,
    S: Into<String>,
{
    children
        .into_iter()
        .map(|(name, def)| (name.into(), def))
        .collect()
}

impl BlockSchema for BlockDef {
    fn kind(&self) -> BlockKind {
        match self {
            BlockDef::Stream { .. } => BlockKind::Stream,
            BlockDef::Struct { .. } => BlockKind::Struct,
            BlockDef::List { .. } => BlockKind::List,
            BlockDef::Leaf { .. } => BlockKind::Leaf,
        }
    }

    fn type_name(&self) -> &str {
        match self {
            BlockDef::Stream { type_name, .. }
            | BlockDef::Struct { type_name, .. }
            | BlockDef::List { type_name, .. }
            | BlockDef::Leaf { type_name, .. } => type_name,
        }
    }

    fn options(&self) -> Cow<'_, BlockOptions> {
        match self {
            BlockDef::Stream { options, .. }
            | BlockDef::Struct { options, .. }
            | BlockDef::List { options, .. }
            | BlockDef::Leaf { options, .. } => Cow::Borrowed(options),
        }
    }

    fn child(&self, name: &str) -> Option<&dyn BlockSchema> {
        match self {
            BlockDef::Stream { children, .. } | BlockDef::Struct { children, .. } => {
                children.get(name).map(|def| def as &dyn BlockSchema)
            }
            _ => None,
        }
    }

    fn children(&self) -> Vec<(&str, &dyn BlockSchema)> {
        match self {
            BlockDef::Stream { children, .. } | BlockDef::Struct { children, .. } => children
                .iter()
                .map(|(name, def)| (name.as_str(), def as &dyn BlockSchema))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn child_block(&self) -> Option<&dyn BlockSchema> {
        match self {
            BlockDef::List { child, .. } => Some(child.as_ref() as &dyn BlockSchema),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_with_default_type_names() {
        let def = BlockDef::from_json(
            r#"{"kind": "stream", "children": {
                "char1": {"kind": "leaf", "type": "CharBlock", "options": {"max_length": 255}},
                "list1": {"kind": "list", "child": {"kind": "leaf", "type": "CharBlock"}}
            }}"#,
        )
        .unwrap();

        assert_eq!(def.kind(), BlockKind::Stream);
        assert_eq!(def.type_name(), "StreamBlock");
        let names: Vec<_> = def.children().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["char1", "list1"]);

        let char1 = def.child("char1").unwrap();
        assert_eq!(char1.options().get("max_length"), Some(&json!(255)));

        let list1 = def.child("list1").unwrap();
        assert_eq!(list1.structural_children()[0].0, "item");
        assert_eq!(list1.structural_child("item").unwrap().type_name(), "CharBlock");
    }

    #[test]
    fn leaf_without_type_is_rejected() {
        let err = BlockDef::from_json(r#"{"kind": "leaf"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::JsonParseError(_)));
    }
}
