mod local;
mod shared;

pub use local::LocalFileReader;
pub use shared::SharedSource;

use std::io::{Read, Seek};

/// Trait for a randomly seekable byte source an archive can be read from
pub trait ArchiveSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> ArchiveSource for T {}
