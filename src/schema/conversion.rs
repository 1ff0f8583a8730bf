use super::{BlockDef, BlockOptions};
use crate::error::SchemaError;
use indexmap::IndexMap;
use serde_json::Value;

/// A trait for foreign schema descriptions that can be converted into a [`BlockDef`].
///
/// Implement it on your own schema model to let the detector and engine work with it
/// without writing the `BlockDef` JSON by hand.
///
/// # Example
///
/// ```rust,no_run
/// use henka::prelude::*;
/// use henka::error::SchemaError;
///
/// struct MyField { name: String, type_name: String }
/// struct MyForm { fields: Vec<MyField> }
///
/// impl IntoBlockDef for MyForm {
///     fn into_block_def(self) -> Result<BlockDef, SchemaError> {
///         Ok(BlockDef::struct_block(
///             self.fields
///                 .into_iter()
///                 .map(|field| (field.name, BlockDef::leaf(field.type_name))),
///         ))
///     }
/// }
/// ```
pub trait IntoBlockDef {
    fn into_block_def(self) -> Result<BlockDef, SchemaError>;
}

impl IntoBlockDef for BlockDef {
    fn into_block_def(self) -> Result<BlockDef, SchemaError> {
        Ok(self)
    }
}

impl IntoBlockDef for Value {
    fn into_block_def(self) -> Result<BlockDef, SchemaError> {
        serde_json::from_value(self).map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }
}

/// A block definition in the `[path, args, kwargs]` shape that Wagtail's `deconstruct()`
/// produces and that appears in its migration files.
///
/// The kind is inferred from the class path: paths ending in `StreamBlock`, `StructBlock`
/// or `ListBlock` are containers, everything else is a leaf. For Stream and Struct blocks
/// `args[0]` holds the `[name, child]` pairs; for List blocks it holds the child itself.
/// `kwargs` become the node options, and leaf positional args are kept under an `args` option.
#[derive(Debug, Clone, PartialEq)]
pub struct DeconstructedBlock(pub Value);

impl DeconstructedBlock {
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json)
            .map(DeconstructedBlock)
            .map_err(|e| SchemaError::JsonParseError(e.to_string()))
    }
}

impl IntoBlockDef for DeconstructedBlock {
    fn into_block_def(self) -> Result<BlockDef, SchemaError> {
        convert(self.0)
    }
}

fn conversion_error(message: impl Into<String>) -> SchemaError {
    SchemaError::Conversion(message.into())
}

fn convert(raw: Value) -> Result<BlockDef, SchemaError> {
    let Value::Array(parts) = raw else {
        return Err(conversion_error("expected a [path, args, kwargs] array"));
    };
    let mut parts = parts.into_iter();
    let path = match parts.next() {
        Some(Value::String(path)) => path,
        _ => return Err(conversion_error("block path must be a string")),
    };
    let args = match parts.next() {
        Some(Value::Array(args)) => args,
        None | Some(Value::Null) => Vec::new(),
        Some(_) => return Err(conversion_error(format!("args of '{}' must be an array", path))),
    };
    let options: BlockOptions = match parts.next() {
        Some(Value::Object(kwargs)) => kwargs.into_iter().collect(),
        None | Some(Value::Null) => BlockOptions::new(),
        Some(_) => return Err(conversion_error(format!("kwargs of '{}' must be an object", path))),
    };

    let class_name = path.rsplit('.').next().unwrap_or(path.as_str());
    let def = if class_name.ends_with("StreamBlock") || class_name.ends_with("StructBlock") {
        let children = convert_children(&path, args)?;
        if class_name.ends_with("StreamBlock") {
            BlockDef::Stream {
                type_name: path,
                options,
                children,
            }
        } else {
            BlockDef::Struct {
                type_name: path,
                options,
                children,
            }
        }
    } else if class_name.ends_with("ListBlock") {
        let child = args
            .into_iter()
            .next()
            .ok_or_else(|| conversion_error(format!("'{}' is missing its child block", path)))?;
        BlockDef::List {
            type_name: path,
            options,
            child: Box::new(convert(child)?),
        }
    } else {
        let mut options = options;
        if !args.is_empty() {
            options.insert("args".to_string(), Value::Array(args));
        }
        BlockDef::Leaf {
            type_name: path,
            options,
        }
    };
    Ok(def)
}

fn convert_children(path: &str, args: Vec<Value>) -> Result<IndexMap<String, BlockDef>, SchemaError> {
    let Some(pairs) = args.into_iter().next() else {
        return Ok(IndexMap::new());
    };
    let Value::Array(pairs) = pairs else {
        return Err(conversion_error(format!("children of '{}' must be an array", path)));
    };

    pairs
        .into_iter()
        .map(|pair| match pair {
            Value::Array(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                match (pair.next(), pair.next()) {
                    (Some(Value::String(name)), Some(child)) => Ok((name, convert(child)?)),
                    _ => Err(conversion_error(format!("invalid child entry in '{}'", path))),
                }
            }
            _ => Err(conversion_error(format!("invalid child entry in '{}'", path))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockKind;
    use crate::schema::BlockSchema;
    use serde_json::json;

    #[test]
    fn converts_deconstructed_stream() {
        let raw = json!([
            "wagtail.blocks.StreamBlock",
            [[
                ["char1", ["wagtail.blocks.CharBlock", [], {"max_length": 255}]],
                ["list1", ["wagtail.blocks.ListBlock", [["wagtail.blocks.CharBlock", [], {}]], {}]],
                ["struct1", ["wagtail.blocks.StructBlock", [[
                    ["name", ["wagtail.blocks.CharBlock", [], {}]]
                ]], {"icon": "user"}]]
            ]],
            {}
        ]);

        let def = DeconstructedBlock(raw).into_block_def().unwrap();
        assert_eq!(def.kind(), BlockKind::Stream);
        assert_eq!(def.type_name(), "wagtail.blocks.StreamBlock");

        let char1 = def.child("char1").unwrap();
        assert_eq!(char1.kind(), BlockKind::Leaf);
        assert_eq!(char1.options().get("max_length"), Some(&json!(255)));

        let list1 = def.child("list1").unwrap();
        assert_eq!(list1.kind(), BlockKind::List);
        assert_eq!(list1.child_block().unwrap().type_name(), "wagtail.blocks.CharBlock");

        let struct1 = def.child("struct1").unwrap();
        assert_eq!(struct1.kind(), BlockKind::Struct);
        assert!(struct1.child("name").is_some());
    }

    #[test]
    fn rejects_list_without_child() {
        let err = DeconstructedBlock(json!(["wagtail.blocks.ListBlock", [], {}]))
            .into_block_def()
            .unwrap_err();
        assert!(matches!(err, SchemaError::Conversion(_)));
    }
}
