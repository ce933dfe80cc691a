//! Archive header model and JSON decoding.
//!
//! The header document looks like:
//!
//! ```text
//! {"files": {
//!     "a.txt": {"offset": "0", "size": 5},
//!     "sub":   {"files": {"b.txt": {"offset": "5", "size": 3, "executable": true}}}
//! }}
//! ```
//!
//! A node holding a `"files"` object is a directory; anything else is a
//! file and must carry `offset` and `size`. The classification happens once,
//! here, and is never re-inspected.

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// Key holding a directory's children
const FILES_KEY: &str = "files";

/// Decoded archive header: the root level of the node tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    files: BTreeMap<String, Node>,
}

/// One node of the header tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Directory(BTreeMap<String, Node>),
    File(FileNode),
}

/// Location of a file's bytes within the archive data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FileNode {
    /// Offset relative to the end of the header
    #[serde(deserialize_with = "deserialize_offset")]
    pub offset: u64,
    /// Size in bytes
    pub size: u64,
    #[serde(default)]
    pub executable: bool,
}

impl Header {
    /// Decode header text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] naming the path of the node that
    /// failed to decode ("" for the document root).
    pub fn parse(text: &[u8]) -> Result<Self> {
        let doc: Value =
            serde_json::from_slice(text).map_err(|e| Error::malformed("", e.to_string()))?;

        let files = match doc.get(FILES_KEY) {
            Some(Value::Object(map)) => decode_children("", map)?,
            Some(_) => return Err(Error::malformed("", "'files' is not an object")),
            None => return Err(Error::malformed("", "missing field 'files'")),
        };

        Ok(Self { files })
    }

    pub fn files(&self) -> &BTreeMap<String, Node> {
        &self.files
    }

    /// Number of file nodes in the whole tree
    pub fn file_count(&self) -> usize {
        count(&self.files).0
    }

    /// Number of directory nodes in the whole tree
    pub fn directory_count(&self) -> usize {
        count(&self.files).1
    }
}

impl From<BTreeMap<String, Node>> for Header {
    fn from(files: BTreeMap<String, Node>) -> Self {
        Self { files }
    }
}

impl Node {
    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory(_))
    }
}

fn count(nodes: &BTreeMap<String, Node>) -> (usize, usize) {
    nodes.values().fold((0, 0), |(files, dirs), node| match node {
        Node::File(_) => (files + 1, dirs),
        Node::Directory(children) => {
            let (f, d) = count(children);
            (files + f, dirs + d + 1)
        }
    })
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

fn decode_children(path: &str, map: &Map<String, Value>) -> Result<BTreeMap<String, Node>> {
    map.iter()
        .map(|(name, value)| {
            let path = join(path, name);
            decode_node(&path, value).map(|node| (name.clone(), node))
        })
        .collect()
}

fn decode_node(path: &str, value: &Value) -> Result<Node> {
    if let Some(Value::Object(children)) = value.get(FILES_KEY) {
        return decode_children(path, children).map(Node::Directory);
    }

    let file =
        FileNode::deserialize(value).map_err(|e| Error::malformed(path, e.to_string()))?;

    if file.size > i64::MAX as u64 {
        return Err(Error::malformed(
            path,
            format!("size {} exceeds the 64-bit offset range", file.size),
        ));
    }

    Ok(Node::File(file))
}

/// Offsets arrive as a decimal string or a plain number; both must fit a
/// non-negative `i64`.
fn deserialize_offset<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct OffsetVisitor;

    impl Visitor<'_> for OffsetVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a non-negative 64-bit offset as integer or decimal string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("offset {v} is negative")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<u64, E> {
            if v > i64::MAX as u64 {
                return Err(E::custom(format!("offset {v} exceeds the 64-bit offset range")));
            }
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<u64, E> {
            let parsed: i64 = v
                .parse()
                .map_err(|_| E::custom(format!("offset {v:?} is not a 64-bit integer")))?;
            self.visit_i64(parsed)
        }
    }

    deserializer.deserialize_any(OffsetVisitor)
}
