use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

use super::ArchiveSource;
use crate::error::{Error, Result};

/// Cursor position after a failed seek or read; forces the next access to seek
const UNKNOWN_POSITION: u64 = u64::MAX;

struct Inner {
    reader: Box<dyn ArchiveSource>,
    /// Absolute cursor position of `reader`, tracked to skip redundant seeks
    position: u64,
}

impl Inner {
    fn seek_to(&mut self, offset: u64) -> Result<()> {
        if self.position == offset {
            return Ok(());
        }

        match self.reader.seek(SeekFrom::Start(offset)) {
            Ok(position) => {
                self.position = position;
                Ok(())
            }
            Err(e) => {
                self.position = UNKNOWN_POSITION;
                Err(e.into())
            }
        }
    }
}

/// The single byte source behind one archive, shared by every entry stream.
///
/// All access goes through a mutex, and every read names the absolute
/// position it wants, so streams derived from the same archive may be used
/// in any interleaving. Once [`close`](Self::close) runs, every clone
/// reports [`Error::Closed`].
#[derive(Clone)]
pub struct SharedSource {
    inner: Arc<Mutex<Option<Inner>>>,
    size: u64,
}

impl SharedSource {
    pub fn new<R: ArchiveSource + 'static>(reader: R, position: u64, size: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(Inner {
                reader: Box::new(reader),
                position,
            }))),
            size,
        }
    }

    /// Read into `buf` starting at absolute `offset`
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(Error::Closed)?;

        inner.seek_to(offset)?;
        match inner.reader.read(buf) {
            Ok(n) => {
                inner.position += n as u64;
                Ok(n)
            }
            Err(e) => {
                inner.position = UNKNOWN_POSITION;
                Err(e.into())
            }
        }
    }

    /// Move the shared cursor to absolute `offset`
    pub fn seek_to(&self, offset: u64) -> Result<()> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or(Error::Closed)?;
        inner.seek_to(offset)
    }

    /// Current absolute cursor position
    pub fn position(&self) -> Result<u64> {
        self.inner
            .lock()
            .as_ref()
            .map(|inner| inner.position)
            .ok_or(Error::Closed)
    }

    /// Total size of the source in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Drop the underlying reader. Idempotent.
    pub fn close(&self) {
        self.inner.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Cursor whose next read fails after moving the position
    struct FailingReader {
        cursor: Cursor<Vec<u8>>,
        fail: Arc<AtomicBool>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail.swap(false, Ordering::SeqCst) {
                self.cursor.set_position(self.cursor.position() + 3);
                return Err(io::Error::other("device hiccup"));
            }
            self.cursor.read(buf)
        }
    }

    impl Seek for FailingReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.cursor.seek(pos)
        }
    }

    fn source() -> SharedSource {
        SharedSource::new(Cursor::new(b"0123456789".to_vec()), 0, 10)
    }

    #[test]
    fn reads_at_absolute_offsets() {
        let src = source();
        let mut buf = [0u8; 3];

        assert_eq!(src.read_at(4, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"456");
        assert_eq!(src.position().unwrap(), 7);

        assert_eq!(src.read_at(1, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"123");
    }

    #[test]
    fn failed_read_forces_a_fresh_seek() {
        let fail = Arc::new(AtomicBool::new(false));
        let reader = FailingReader {
            cursor: Cursor::new(b"0123456789".to_vec()),
            fail: fail.clone(),
        };
        let src = SharedSource::new(reader, 0, 10);
        let mut buf = [0u8; 3];

        fail.store(true, Ordering::SeqCst);
        assert!(matches!(src.read_at(2, &mut buf), Err(Error::Io(_))));

        assert_eq!(src.read_at(2, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"234");
        assert_eq!(src.position().unwrap(), 5);
    }

    #[test]
    fn clones_alias_one_cursor() {
        let a = source();
        let b = a.clone();

        a.seek_to(8).unwrap();
        assert_eq!(b.position().unwrap(), 8);
    }

    #[test]
    fn close_invalidates_every_clone() {
        let a = source();
        let b = a.clone();

        a.close();
        a.close();

        assert!(b.is_closed());
        let mut buf = [0u8; 1];
        assert!(matches!(b.read_at(0, &mut buf), Err(Error::Closed)));
        assert!(matches!(b.seek_to(0), Err(Error::Closed)));
    }
}
