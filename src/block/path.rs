use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Addresses a location inside a block tree as a sequence of child names.
///
/// The string form joins the segments with dots (`"nestedstream.item.char1"`); the empty
/// string is the root. List children are addressed with the `"item"` placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockPath {
    segments: Vec<String>,
}

impl BlockPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Self {
        if path.is_empty() {
            return Self::root();
        }
        Self {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments, i.e. the nesting depth of the addressed node.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The path without its last segment. `None` for the root.
    pub fn parent(&self) -> Option<BlockPath> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    pub fn child(&self, name: &str) -> BlockPath {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join("."))
    }
}

impl FromStr for BlockPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for BlockPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl Serialize for BlockPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlockPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Ok(Self::parse(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_top_level_and_nested_paths() {
        assert_eq!(BlockPath::parse("char1").segments(), ["char1"]);
        assert_eq!(
            BlockPath::parse("struct1.struct1_char1").segments(),
            ["struct1", "struct1_char1"]
        );
        assert!(BlockPath::parse("").is_root());
    }

    #[test]
    fn parent_and_child_round_trip() {
        let path = BlockPath::parse("a.b.c");
        assert_eq!(path.depth(), 3);
        assert_eq!(path.last(), Some("c"));
        assert_eq!(path.parent().unwrap().to_string(), "a.b");
        assert_eq!(path.parent().unwrap().child("c"), path);
        assert_eq!(BlockPath::root().parent(), None);
        assert_eq!(BlockPath::root().child("a").to_string(), "a");
    }

    #[test]
    fn serializes_as_dotted_string() {
        let path = BlockPath::parse("list1.item");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"list1.item\"");
        let back: BlockPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
