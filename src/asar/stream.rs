//! Bounded read/seek view over one entry's byte range.

use std::io::{self, Read, Seek, SeekFrom};

use tracing::trace;

use crate::error::{Error, Result};
use crate::io::SharedSource;

/// Read stream over a single file entry.
///
/// Logical position `p` always stays in `[0, len]`; the byte fetched for
/// `p` lives at absolute position `offset + p` of the shared archive source.
/// Reads never cross `offset + len`, however large the source is.
pub struct EntryStream {
    source: SharedSource,
    offset: u64,
    size: u64,
    position: u64,
}

impl EntryStream {
    /// Open a view of `size` bytes starting at absolute `offset`.
    ///
    /// Moves the shared cursor to `offset`.
    pub(crate) fn new(source: SharedSource, offset: u64, size: u64) -> Result<Self> {
        source.seek_to(offset)?;
        trace!(offset, size, "opened entry stream");

        Ok(Self {
            source,
            offset,
            size,
            position: 0,
        })
    }

    /// Size of the entry in bytes
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Current logical position
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Bytes left before the end of the entry
    pub fn remaining(&self) -> u64 {
        self.size - self.position
    }

    /// Absolute offset of the entry within the archive source
    pub fn archive_offset(&self) -> u64 {
        self.offset
    }

    /// Read up to `buf.len()` bytes, never past the end of the entry.
    ///
    /// Returns `Ok(0)` once the end is reached.
    pub fn read_bounded(&mut self, buf: &mut [u8]) -> Result<usize> {
        let want = (buf.len() as u64).min(self.remaining()) as usize;
        if want == 0 {
            return Ok(0);
        }

        let n = self
            .source
            .read_at(self.offset + self.position, &mut buf[..want])?;
        self.position += n as u64;
        Ok(n)
    }

    /// Read one byte, or `None` at the end of the entry
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.position >= self.size {
            return Ok(None);
        }

        let mut byte = [0u8; 1];
        match self.read_bounded(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Move the logical position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfRange`] if the target lies outside `[0, len]`;
    /// the position is left unchanged in that case.
    pub fn try_seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(n) => self.position as i128 + n as i128,
            SeekFrom::End(n) => self.size as i128 + n as i128,
        };

        if target < 0 || target > self.size as i128 {
            return Err(Error::OutOfRange {
                position: target.clamp(i64::MIN as i128, i64::MAX as i128) as i64,
                size: self.size,
            });
        }

        let target = target as u64;
        self.source.seek_to(self.offset + target)?;
        self.position = target;
        Ok(target)
    }
}

impl Read for EntryStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_bounded(buf)?)
    }
}

impl Seek for EntryStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.try_seek(pos)?)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}
