//! ASAR archive reading.
//!
//! ## Architecture
//!
//! - [`frame`]: length-prefixed binary blocks (the container's low-level framing)
//! - [`header`]: the JSON header decoded into a directory/file node tree
//! - `tree`: the header materialized into an arena of entries
//! - [`entry`]: navigable handles over that arena (directories, files, path lookup)
//! - [`stream`]: bounded read/seek streams over a single file's bytes
//! - `archive`: the archive handle tying source, header and tree together
//!
//! ## Format Overview
//!
//! ```text
//! [u32 LE: 4][u32 LE: header_size]                 8-byte size frame
//! [u32 LE: frame_len][u32 LE: text_len][text][pad] header frame
//! [file bytes...]                                  data section
//! ```
//!
//! File offsets in the header are relative to the data section, which begins
//! at the end of the header frame (see [`HeaderBoundary`] for the
//! one-byte-shifted variant).
//!
//! ## Limitations
//!
//! - Read only; archives cannot be created or modified
//! - `integrity` hashes are not verified
//! - Entries marked `unpacked` (stored beside the archive) are not supported

mod archive;
pub mod entry;
pub mod frame;
pub mod header;
pub mod stream;
mod tree;

pub use archive::{Archive, HeaderBoundary, OpenOptions};
pub use entry::{DirectoryEntry, Entry, FileEntry, WalkFiles};
pub use header::{FileNode, Header, Node};
pub use stream::EntryStream;
