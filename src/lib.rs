//! # asarfs
//!
//! Read ASAR archives as a virtual file system.
//!
//! An ASAR archive packs a directory tree into a single file: a JSON header
//! describing every entry, followed by the raw bytes of each file. This
//! library parses the header into a navigable tree and opens bounded,
//! seekable streams over individual files, all sharing one open handle to
//! the archive.
//!
//! ## Features
//!
//! - Path lookup with `/` or `\` separators
//! - Enumeration of files and directories, recursive walks, extension search
//! - `Read + Seek` entry streams that never stray outside their entry
//! - Streams from one archive may be interleaved; access to the shared
//!   handle is serialized internally
//! - Optional parallel tree construction (`parallel` feature, on by default)
//!
//! ## Example
//!
//! ```no_run
//! use std::io::Read;
//! use asarfs::Archive;
//!
//! fn main() -> asarfs::Result<()> {
//!     let archive = Archive::open("resources/app.asar")?;
//!
//!     for file in archive.root().find_by_extension("js") {
//!         println!("{} ({} bytes)", file.path(), file.size());
//!     }
//!
//!     let entry = archive.root().resolve("package.json")?;
//!     let mut text = String::new();
//!     if let Some(file) = entry.as_file() {
//!         file.open_read_stream()?.read_to_string(&mut text)?;
//!     }
//!
//!     archive.close();
//!     Ok(())
//! }
//! ```

pub mod asar;
pub mod cli;
pub mod error;
pub mod io;

pub use asar::{
    Archive, DirectoryEntry, Entry, EntryStream, FileEntry, FileNode, Header, HeaderBoundary,
    Node, OpenOptions,
};
pub use cli::Cli;
pub use error::{Error, Result};
pub use io::LocalFileReader;
