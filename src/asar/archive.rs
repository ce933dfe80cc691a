use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use super::entry::DirectoryEntry;
use super::frame;
use super::header::Header;
use super::tree::{EntryId, Tree};
use crate::error::Result;
use crate::io::{ArchiveSource, LocalFileReader, SharedSource};

/// Where the data section starts relative to the end of the header frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderBoundary {
    /// One byte past the header frame: entry offsets are read against a data
    /// section shifted by one byte.
    #[default]
    Legacy,
    /// Directly after the header frame, as conventional ASAR writers lay it out.
    Exact,
}

impl HeaderBoundary {
    /// Absolute position of the data section for a header frame ending at `header_end`
    pub fn data_offset(self, header_end: u64) -> u64 {
        match self {
            HeaderBoundary::Legacy => header_end + 1,
            HeaderBoundary::Exact => header_end,
        }
    }
}

/// Options for opening an archive, in the style of [`std::fs::OpenOptions`].
///
/// ```no_run
/// use asarfs::{HeaderBoundary, OpenOptions};
///
/// let archive = OpenOptions::new()
///     .boundary(HeaderBoundary::Exact)
///     .parallel(false)
///     .open("resources/app.asar")?;
/// # Ok::<(), asarfs::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    boundary: HeaderBoundary,
    parallel: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            boundary: HeaderBoundary::default(),
            parallel: cfg!(feature = "parallel"),
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select how the data section boundary is computed
    pub fn boundary(&mut self, boundary: HeaderBoundary) -> &mut Self {
        self.boundary = boundary;
        self
    }

    /// Build sibling subtrees concurrently. Has no effect without the
    /// `parallel` feature.
    pub fn parallel(&mut self, parallel: bool) -> &mut Self {
        self.parallel = parallel;
        self
    }

    /// Open the archive file at `path`
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Archive> {
        let path = path.as_ref();
        let reader = LocalFileReader::new(path)?;
        debug!(path = %path.display(), size = reader.size(), "opening archive");
        Archive::from_source(reader, self)
    }
}

/// An open archive: the byte source, its decoded header and the entry tree.
///
/// The archive is the only owner of the byte source. Entry handles borrow
/// the archive; streams share the source and stop working once the archive
/// is closed or dropped.
pub struct Archive {
    source: SharedSource,
    header: Header,
    tree: Tree,
    data_offset: u64,
}

impl Archive {
    /// Open the archive at `path` with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new().open(path)
    }

    /// Read an archive from any seekable source, starting at its current position.
    ///
    /// # Errors
    ///
    /// Returns an IO or format error if the framing is damaged, and
    /// [`Error::MalformedHeader`](crate::Error::MalformedHeader) if the header
    /// text does not decode. No partial archive is ever returned.
    pub fn from_source<R: ArchiveSource + 'static>(
        mut reader: R,
        options: &OpenOptions,
    ) -> Result<Self> {
        let start = reader.stream_position()?;
        let size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(start))?;

        let (header, header_end) = read_header(&mut reader)?;
        let data_offset = options.boundary.data_offset(header_end);
        let tree = Tree::materialize(&header, options.parallel);

        debug!(
            header_end,
            data_offset,
            files = header.file_count(),
            directories = header.directory_count(),
            parallel = options.parallel,
            "archive header loaded"
        );

        Ok(Self {
            source: SharedSource::new(reader, header_end, size),
            header,
            tree,
            data_offset,
        })
    }

    /// Root directory of the archive
    pub fn root(&self) -> DirectoryEntry<'_> {
        DirectoryEntry::new(self, EntryId::ROOT)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Absolute position that header offsets are relative to
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Total size of the underlying source in bytes
    pub fn source_len(&self) -> u64 {
        self.source.size()
    }

    /// Number of entries in the tree, root included
    pub fn entry_count(&self) -> usize {
        self.tree.len()
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_closed()
    }

    /// Release the byte source and the entry tree.
    ///
    /// Streams still alive afterwards fail with
    /// [`Error::Closed`](crate::Error::Closed).
    pub fn close(self) {
        debug!(entries = self.tree.len(), "closing archive");
        self.source.close();
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }

    pub(crate) fn source(&self) -> &SharedSource {
        &self.source
    }
}

impl Drop for Archive {
    fn drop(&mut self) {
        self.source.close();
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("data_offset", &self.data_offset)
            .field("source_len", &self.source.size())
            .field("entries", &self.tree.len())
            .field("closed", &self.source.is_closed())
            .finish()
    }
}

/// Read the nested header frames, returning the header and the absolute
/// position right after the header frame.
fn read_header<R: Read + Seek>(reader: &mut R) -> Result<(Header, u64)> {
    let header_size: u32 = frame::read_fixed(reader)?;
    let payload = frame::read_frame(reader)?;
    let header_end = reader.stream_position()?;

    if payload.len() as u64 + frame::FRAME_PREFIX_LEN as u64 != header_size as u64 {
        debug!(
            header_size,
            frame_len = payload.len(),
            "header size disagrees with header frame length"
        );
    }

    let text = frame::text_payload(&payload)?;
    Ok((Header::parse(text)?, header_end))
}
