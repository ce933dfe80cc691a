//! Navigable view of the archive tree.
//!
//! Handles are cheap copies of `(archive, id)` and borrow the archive, so
//! none of them can outlive it.

use std::fmt;
use std::io::{self, Read};
use std::path::Path;

use super::archive::Archive;
use super::header::FileNode;
use super::stream::EntryStream;
use super::tree::{EntryId, Slot, SlotKind};
use crate::error::{Error, Result};

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Either kind of entry.
#[derive(Clone, Copy)]
pub enum Entry<'a> {
    File(FileEntry<'a>),
    Directory(DirectoryEntry<'a>),
}

/// A directory inside an archive.
#[derive(Clone, Copy)]
pub struct DirectoryEntry<'a> {
    archive: &'a Archive,
    id: EntryId,
}

/// A file inside an archive.
#[derive(Clone, Copy)]
pub struct FileEntry<'a> {
    archive: &'a Archive,
    id: EntryId,
    node: FileNode,
}

fn slot(archive: &Archive, id: EntryId) -> &Slot {
    archive.tree().slot(id)
}

/// Archive path of `id`: ancestor names joined with '/', empty for the root.
fn archive_path(archive: &Archive, id: EntryId) -> String {
    let mut names = Vec::new();
    let mut current = Some(id);

    while let Some(id) = current {
        let slot = slot(archive, id);
        if slot.parent.is_some() {
            names.push(slot.name.as_str());
        }
        current = slot.parent;
    }

    names.reverse();
    names.join("/")
}

impl<'a> Entry<'a> {
    fn new(archive: &'a Archive, id: EntryId) -> Self {
        match &slot(archive, id).kind {
            SlotKind::File(node) => Entry::File(FileEntry {
                archive,
                id,
                node: *node,
            }),
            SlotKind::Directory(_) => Entry::Directory(DirectoryEntry { archive, id }),
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Entry::File(f) => f.name(),
            Entry::Directory(d) => d.name(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Entry::File(f) => f.path(),
            Entry::Directory(d) => d.path(),
        }
    }

    pub fn parent(&self) -> Option<DirectoryEntry<'a>> {
        match self {
            Entry::File(f) => Some(f.parent()),
            Entry::Directory(d) => d.parent(),
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Entry::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Entry::Directory(_))
    }

    pub fn as_file(&self) -> Option<FileEntry<'a>> {
        match self {
            Entry::File(f) => Some(*f),
            Entry::Directory(_) => None,
        }
    }

    pub fn as_directory(&self) -> Option<DirectoryEntry<'a>> {
        match self {
            Entry::Directory(d) => Some(*d),
            Entry::File(_) => None,
        }
    }
}

impl<'a> DirectoryEntry<'a> {
    pub(crate) fn new(archive: &'a Archive, id: EntryId) -> Self {
        Self { archive, id }
    }

    fn children_map(&self) -> impl Iterator<Item = (&'a String, &'a EntryId)> + use<'a> {
        let children = match &slot(self.archive, self.id).kind {
            SlotKind::Directory(children) => Some(children),
            SlotKind::File(_) => None,
        };
        children.into_iter().flatten()
    }

    /// Directory name; empty for the root
    pub fn name(&self) -> &'a str {
        &slot(self.archive, self.id).name
    }

    pub fn path(&self) -> String {
        archive_path(self.archive, self.id)
    }

    /// Parent directory, `None` for the root
    pub fn parent(&self) -> Option<DirectoryEntry<'a>> {
        slot(self.archive, self.id)
            .parent
            .map(|id| DirectoryEntry::new(self.archive, id))
    }

    pub fn is_root(&self) -> bool {
        self.id == EntryId::ROOT
    }

    /// Number of immediate children
    pub fn len(&self) -> usize {
        self.children_map().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immediate children of both kinds, in name order
    pub fn children(&self) -> impl Iterator<Item = Entry<'a>> + use<'a> {
        let archive = self.archive;
        self.children_map().map(move |(_, id)| Entry::new(archive, *id))
    }

    /// Immediate file children, in name order
    pub fn files(&self) -> impl Iterator<Item = FileEntry<'a>> + use<'a> {
        self.children().filter_map(|entry| entry.as_file())
    }

    /// Immediate directory children, in name order
    pub fn directories(&self) -> impl Iterator<Item = DirectoryEntry<'a>> + use<'a> {
        self.children().filter_map(|entry| entry.as_directory())
    }

    /// Immediate child called `name`, of either kind
    pub fn get(&self, name: &str) -> Option<Entry<'a>> {
        match &slot(self.archive, self.id).kind {
            SlotKind::Directory(children) => children
                .get(name)
                .map(|id| Entry::new(self.archive, *id)),
            SlotKind::File(_) => None,
        }
    }

    /// Resolve a relative path to a file entry.
    ///
    /// Both `/` and `\` separate segments. Every segment but the last must
    /// name a directory and the last must name a file; a path ending at a
    /// directory resolves to nothing (use [`directory`](Self::directory)).
    pub fn try_resolve(&self, path: &str) -> Option<Entry<'a>> {
        match path.split_once(is_separator) {
            None => self.get(path).filter(Entry::is_file),
            Some((head, rest)) => self.get(head)?.as_directory()?.try_resolve(rest),
        }
    }

    /// Like [`try_resolve`](Self::try_resolve), failing with
    /// [`Error::NotFound`] carrying the queried path.
    pub fn resolve(&self, path: &str) -> Result<Entry<'a>> {
        self.try_resolve(path).ok_or_else(|| Error::NotFound {
            path: path.to_string(),
        })
    }

    /// Resolve a relative path that ends at a directory. An empty path is
    /// this directory.
    pub fn directory(&self, path: &str) -> Option<DirectoryEntry<'a>> {
        if path.is_empty() {
            return Some(*self);
        }

        path.split(is_separator)
            .try_fold(*self, |dir, segment| dir.get(segment)?.as_directory())
    }

    /// Every file below this directory: its own files first, then each
    /// subdirectory in name order, recursively.
    pub fn walk_files(&self) -> WalkFiles<'a> {
        WalkFiles {
            pending: vec![*self],
            current: Vec::new().into_iter(),
        }
    }

    /// Files below this directory whose extension is `ext` (leading dot optional)
    pub fn find_by_extension(&self, ext: &str) -> impl Iterator<Item = FileEntry<'a>> + use<'a> {
        let ext = ext.strip_prefix('.').unwrap_or(ext).to_string();
        self.walk_files().filter(move |file| {
            Path::new(file.name())
                .extension()
                .is_some_and(|e| e == ext.as_str())
        })
    }
}

impl<'a> FileEntry<'a> {
    pub fn name(&self) -> &'a str {
        &slot(self.archive, self.id).name
    }

    pub fn path(&self) -> String {
        archive_path(self.archive, self.id)
    }

    /// Directory containing this file
    pub fn parent(&self) -> DirectoryEntry<'a> {
        let parent = slot(self.archive, self.id).parent.unwrap_or(EntryId::ROOT);
        DirectoryEntry::new(self.archive, parent)
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.node.size
    }

    /// Offset relative to the archive's data section
    pub fn offset(&self) -> u64 {
        self.node.offset
    }

    pub fn is_executable(&self) -> bool {
        self.node.executable
    }

    /// Absolute offset of the file's bytes in the archive source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OffsetOverflow`] if the offset does not fit a signed
    /// 64-bit position.
    pub fn absolute_offset(&self) -> Result<u64> {
        let start = self.archive.data_offset().checked_add(self.node.offset);
        let end = start.and_then(|start| start.checked_add(self.node.size));

        start
            .filter(|_| end.is_some_and(|end| end <= i64::MAX as u64))
            .ok_or_else(|| Error::OffsetOverflow {
                path: self.path(),
                offset: self.node.offset,
            })
    }

    /// Open a bounded stream over this file's bytes.
    ///
    /// The stream shares the archive's byte source and moves its cursor.
    pub fn open_read_stream(&self) -> Result<EntryStream> {
        let offset = self.absolute_offset()?;
        EntryStream::new(self.archive.source().clone(), offset, self.node.size)
    }

    /// Read the whole file into memory
    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let mut stream = self.open_read_stream()?;
        let mut buf = Vec::with_capacity(self.node.size.min(16 * 1024 * 1024) as usize);
        stream.read_to_end(&mut buf)?;

        if buf.len() as u64 != self.node.size {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "'{}' ends after {} of {} bytes",
                    self.path(),
                    buf.len(),
                    self.node.size
                ),
            )));
        }
        Ok(buf)
    }
}

/// Depth-first iterator over files, returned by [`DirectoryEntry::walk_files`].
pub struct WalkFiles<'a> {
    pending: Vec<DirectoryEntry<'a>>,
    current: std::vec::IntoIter<FileEntry<'a>>,
}

impl<'a> Iterator for WalkFiles<'a> {
    type Item = FileEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(file) = self.current.next() {
                return Some(file);
            }

            let dir = self.pending.pop()?;
            self.current = dir.files().collect::<Vec<_>>().into_iter();

            let subdirs: Vec<_> = dir.directories().collect();
            self.pending.extend(subdirs.into_iter().rev());
        }
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::File(file) => fmt::Debug::fmt(file, f),
            Entry::Directory(dir) => fmt::Debug::fmt(dir, f),
        }
    }
}

impl fmt::Debug for DirectoryEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryEntry")
            .field("path", &self.path())
            .field("children", &self.len())
            .finish()
    }
}

impl fmt::Debug for FileEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileEntry")
            .field("path", &self.path())
            .field("offset", &self.node.offset)
            .field("size", &self.node.size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asar::OpenOptions;
    use std::io::Cursor;

    fn archive() -> Archive {
        let json = br#"{"files":{"a.txt":{"offset":"0","size":5},"sub":{"files":{"b.txt":{"offset":"5","size":3}}}}}"#;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&(json.len() as u32 + 8).to_le_bytes());
        bytes.extend_from_slice(&(json.len() as u32 + 4).to_le_bytes());
        bytes.extend_from_slice(&(json.len() as u32).to_le_bytes());
        bytes.extend_from_slice(json);
        bytes.push(0);
        bytes.extend_from_slice(b"helloabc");

        Archive::from_source(Cursor::new(bytes), &OpenOptions::new()).unwrap()
    }

    #[test]
    fn resolves_offsets_against_data_section() {
        let archive = archive();
        let base = archive.data_offset();

        let a = archive.root().resolve("a.txt").unwrap().as_file().unwrap();
        assert_eq!(a.absolute_offset().unwrap(), base);
        assert_eq!(a.size(), 5);

        let b = archive.root().resolve("sub/b.txt").unwrap().as_file().unwrap();
        assert_eq!(b.absolute_offset().unwrap(), base + 5);
        assert_eq!(b.size(), 3);

        assert!(archive.root().try_resolve("sub").is_none());
    }

    #[test]
    fn root_and_parent_links() {
        let archive = archive();
        let root = archive.root();

        assert!(root.is_root());
        assert_eq!(root.name(), "");
        assert_eq!(root.path(), "");
        assert!(root.parent().is_none());

        let sub = root.directory("sub").unwrap();
        assert_eq!(sub.parent().unwrap().path(), "");
        assert!(sub.parent().unwrap().is_root());

        let b = sub.get("b.txt").unwrap();
        assert_eq!(b.path(), "sub/b.txt");
        assert_eq!(b.parent().unwrap().name(), "sub");
        assert!(root.directory("").is_some_and(|d| d.is_root()));
    }

    #[test]
    fn file_is_not_a_directory() {
        let archive = archive();
        assert!(archive.root().directory("a.txt").is_none());
        assert!(archive.root().directory("sub/b.txt").is_none());
        assert!(archive.root().get("a.txt").unwrap().as_directory().is_none());
    }
}
