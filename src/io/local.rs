use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{Error, Result};

/// Local archive file with random access support
///
/// Reads are buffered; the archive header is parsed through many small reads
/// before entry streams take over with larger ones.
pub struct LocalFileReader {
    file: BufReader<File>,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let open = |path: &Path| -> io::Result<(File, u64)> {
            let file = File::open(path)?;
            let size = file.metadata()?.len();
            Ok((file, size))
        };

        let (file, size) = open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file: BufReader::new(file),
            size,
        })
    }

    /// Total size of the file on disk
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Read for LocalFileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for LocalFileReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        self.file.stream_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reports_size_and_reads() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"hello world").unwrap();

        let mut reader = LocalFileReader::new(tmp.path()).unwrap();
        assert_eq!(reader.size(), 11);

        reader.seek(SeekFrom::Start(6)).unwrap();
        let mut buf = String::new();
        reader.read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "world");
    }

    #[test]
    fn missing_file_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.asar");

        match LocalFileReader::new(&path) {
            Err(Error::Open { path: p, .. }) => assert_eq!(p, path),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing file succeeded"),
        }
    }
}
