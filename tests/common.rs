//! Common test utilities for building schemas and stored block data.
use henka::prelude::*;
use serde_json::{Value, json};

#[allow(dead_code)]
pub fn char_block() -> BlockDef {
    BlockDef::leaf("wagtail.blocks.CharBlock")
}

/// `{char1, char2}` struct.
#[allow(dead_code)]
pub fn simple_struct() -> BlockDef {
    BlockDef::struct_block([("char1", char_block()), ("char2", char_block())])
}

/// `{char1, char2}` stream.
#[allow(dead_code)]
pub fn simple_stream() -> BlockDef {
    BlockDef::stream([("char1", char_block()), ("char2", char_block())])
}

#[allow(dead_code)]
pub fn nested_struct() -> BlockDef {
    BlockDef::struct_block([
        ("char1", char_block()),
        ("stream1", simple_stream()),
        ("struct1", simple_struct()),
        ("list1", BlockDef::list(char_block())),
    ])
}

#[allow(dead_code)]
pub fn nested_stream() -> BlockDef {
    BlockDef::stream([
        ("char1", char_block()),
        ("stream1", simple_stream()),
        ("struct1", simple_struct()),
        ("list1", BlockDef::list(char_block())),
    ])
}

/// The top-level stream used by most tests, with every container combination.
#[allow(dead_code)]
pub fn base_stream() -> BlockDef {
    BlockDef::stream([
        ("char1", char_block()),
        ("char2", char_block()),
        ("simplestruct", simple_struct()),
        ("simplestream", simple_stream()),
        ("simplelist", BlockDef::list(char_block())),
        ("nestedstruct", nested_struct()),
        ("nestedstream", nested_stream()),
        ("nestedlist_struct", BlockDef::list(simple_struct())),
        ("nestedlist_stream", BlockDef::list(simple_stream())),
    ])
}

/// Stored data for [`base_stream`] touching every top-level block once, with ids.
#[allow(dead_code)]
pub fn base_stream_data() -> Value {
    json!([
        {"type": "char1", "value": "Char Block 1", "id": "0001"},
        {"type": "char2", "value": "Char Block 2", "id": "0002"},
        {"type": "simplestruct", "value": {"char1": "Char Block 1", "char2": "Char Block 2"}, "id": "0003"},
        {"type": "simplestream", "value": [
            {"type": "char1", "value": "Char Block 1", "id": "0005"},
            {"type": "char2", "value": "Char Block 2", "id": "0006"}
        ], "id": "0004"},
        {"type": "simplelist", "value": [
            {"type": "item", "value": "Item 1", "id": "0008"},
            {"type": "item", "value": "Item 2", "id": "0009"}
        ], "id": "0007"},
        {"type": "nestedstruct", "value": {
            "char1": "Char Block 1",
            "stream1": [{"type": "char1", "value": "Char Block 1", "id": "0011"}],
            "struct1": {"char1": "Char Block 1", "char2": "Char Block 2"},
            "list1": [{"type": "item", "value": "Item 1", "id": "0012"}]
        }, "id": "0010"},
        {"type": "nestedstream", "value": [
            {"type": "char1", "value": "Char Block 1", "id": "0014"},
            {"type": "struct1", "value": {"char1": "Char Block 1", "char2": "Char Block 2"}, "id": "0015"},
            {"type": "stream1", "value": [{"type": "char1", "value": "Char Block 1", "id": "0016"}], "id": "0017"}
        ], "id": "0013"},
        {"type": "nestedlist_struct", "value": [
            {"type": "item", "value": {"char1": "Char Block 1", "char2": "Char Block 2"}, "id": "0019"}
        ], "id": "0018"},
        {"type": "nestedlist_stream", "value": [
            {"type": "item", "value": [
                {"type": "char1", "value": "Char Block 1", "id": "0021"},
                {"type": "char2", "value": "Char Block 2", "id": "0022"}
            ], "id": "0023"}
        ], "id": "0020"}
    ])
}

/// The entries of a stored stream whose type is `name`.
#[allow(dead_code)]
pub fn entries_named<'a>(stream: &'a Value, name: &str) -> Vec<&'a Value> {
    stream
        .as_array()
        .map(|entries| entries.iter().filter(|entry| entry["type"] == name).collect())
        .unwrap_or_default()
}
