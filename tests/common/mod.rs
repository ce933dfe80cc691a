//! Archive fixtures for integration tests.

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

use asarfs::HeaderBoundary;

/// Builds an archive in memory from `(path, contents)` pairs.
#[derive(Default)]
pub struct ArchiveBuilder {
    root: Map<String, Value>,
    data: Vec<u8>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at a '/'-separated path, creating directories on the way
    pub fn file(mut self, path: &str, contents: &[u8]) -> Self {
        let node = json!({
            "offset": self.data.len().to_string(),
            "size": contents.len(),
            "integrity": {"algorithm": "SHA256", "hash": "00", "blockSize": 4096, "blocks": []}
        });
        self.data.extend_from_slice(contents);
        self.insert(path, node);
        self
    }

    /// Add an empty directory
    pub fn dir(mut self, path: &str) -> Self {
        self.insert(path, json!({"files": {}}));
        self
    }

    /// Add a raw node, for header shapes the helpers can't express
    pub fn node(mut self, path: &str, node: Value) -> Self {
        self.insert(path, node);
        self
    }

    fn insert(&mut self, path: &str, node: Value) {
        let mut segments: Vec<&str> = path.split('/').collect();
        let name = segments.pop().unwrap();

        let mut dir = &mut self.root;
        for segment in segments {
            let entry = dir
                .entry(segment.to_string())
                .or_insert_with(|| json!({"files": {}}));
            dir = entry
                .get_mut("files")
                .and_then(Value::as_object_mut)
                .unwrap();
        }
        dir.insert(name.to_string(), node);
    }

    pub fn header_json(&self) -> String {
        json!({ "files": self.root }).to_string()
    }

    /// Serialize the archive. With [`HeaderBoundary::Legacy`] one filler byte
    /// separates the header from the data section.
    pub fn build(&self, boundary: HeaderBoundary) -> Vec<u8> {
        let text = self.header_json();

        let mut payload = Vec::new();
        payload.write_u32::<LittleEndian>(text.len() as u32).unwrap();
        payload.extend_from_slice(text.as_bytes());
        while payload.len() % 4 != 0 {
            payload.push(0);
        }

        let mut out = Vec::new();
        out.write_u32::<LittleEndian>(4).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32 + 4).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.extend_from_slice(&payload);
        if boundary == HeaderBoundary::Legacy {
            out.push(0xAA);
        }
        out.extend_from_slice(&self.data);
        out
    }

    /// Write the archive into `dir` and return its path
    pub fn write_to(&self, dir: &tempfile::TempDir, boundary: HeaderBoundary) -> PathBuf {
        let path = dir.path().join("app.asar");
        std::fs::write(&path, self.build(boundary)).unwrap();
        path
    }
}

/// The small scenario-style archive most tests use.
pub fn sample() -> ArchiveBuilder {
    ArchiveBuilder::new()
        .file("package.json", br#"{"name":"game"}"#)
        .file("data/scenario/first.ks", b"[cg_image_button graphic=\"a,b\"]\n")
        .file("data/scenario/cg.ks", b"*start\n[cg]\n")
        .file("data/scenario/sub/replay.ks", b"[setreplay name=\"r1\"]\n")
        .file("data/bgimage/title.png", &[0x89, b'P', b'N', b'G', 0, 1, 2, 3])
        .file("data/empty.txt", b"")
        .dir("data/others")
}
