use crate::config::SpoolConfig;
use crate::constants;
use std::fmt::{self, Debug, Formatter};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// A seekable byte buffer holding one part's content.
///
/// Data is kept in memory until it would grow past the configured threshold,
/// then it is moved into an anonymous temporary file. Either way the buffer
/// reads, writes and seeks like a file.
pub struct SpoolBuffer {
    inner: Inner,
    len: u64,
    memory_threshold: usize,
    spill_dir: Option<PathBuf>,
}

enum Inner {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

impl SpoolBuffer {
    /// Creates an empty buffer governed by `config`.
    pub fn new(config: &SpoolConfig) -> SpoolBuffer {
        SpoolBuffer {
            inner: Inner::Memory(Cursor::new(Vec::new())),
            len: 0,
            memory_threshold: config.memory_threshold,
            spill_dir: config.spill_dir_path().map(|dir| dir.to_path_buf()),
        }
    }

    /// The number of bytes in the buffer.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the content has been moved to a temporary file.
    pub fn is_spilled(&self) -> bool {
        matches!(self.inner, Inner::File(_))
    }

    /// Drops the CRLF that precedes a delimiter line and rewinds the buffer.
    pub(crate) fn seal(&mut self) -> io::Result<()> {
        let end = self.seek(SeekFrom::End(0))?;
        self.set_len(end.saturating_sub(constants::CRLF.len() as u64))?;
        self.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        match &mut self.inner {
            Inner::Memory(cursor) => cursor.get_mut().resize(len as usize, 0),
            Inner::File(file) => file.set_len(len)?,
        }
        self.len = len;
        Ok(())
    }

    fn spill(&mut self) -> io::Result<()> {
        let mut file = match &self.spill_dir {
            Some(dir) => tempfile::tempfile_in(dir)?,
            None => tempfile::tempfile()?,
        };

        if let Inner::Memory(cursor) = &self.inner {
            file.write_all(cursor.get_ref())?;
            file.seek(SeekFrom::Start(cursor.position()))?;
        }

        log::debug!("spilling part buffer of {} bytes to a temporary file", self.len);

        self.inner = Inner::File(file);
        Ok(())
    }
}

impl Default for SpoolBuffer {
    fn default() -> Self {
        SpoolBuffer::new(&SpoolConfig::default())
    }
}

impl Debug for SpoolBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpoolBuffer")
            .field("len", &self.len)
            .field("spilled", &self.is_spilled())
            .finish()
    }
}

impl Write for SpoolBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let needs_spill = match &self.inner {
            Inner::Memory(cursor) => {
                !buf.is_empty() && cursor.position() + buf.len() as u64 > self.memory_threshold as u64
            }
            Inner::File(_) => false,
        };

        if needs_spill {
            self.spill()?;
        }

        let written = match &mut self.inner {
            Inner::Memory(cursor) => cursor.write(buf)?,
            Inner::File(file) => file.write(buf)?,
        };

        let pos = self.stream_position()?;
        self.len = self.len.max(pos);

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            Inner::Memory(_) => Ok(()),
            Inner::File(file) => file.flush(),
        }
    }
}

impl Read for SpoolBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Memory(cursor) => cursor.read(buf),
            Inner::File(file) => file.read(buf),
        }
    }
}

impl Seek for SpoolBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.inner {
            Inner::Memory(cursor) => cursor.seek(pos),
            Inner::File(file) => file.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(buf: &mut SpoolBuffer) -> Vec<u8> {
        let mut out = Vec::new();
        buf.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_memory_buffer_seal() {
        let mut buf = SpoolBuffer::default();
        buf.write_all(b"hello\r\n").unwrap();
        assert_eq!(buf.len(), 7);

        buf.seal().unwrap();
        assert_eq!(buf.len(), 5);
        assert!(!buf.is_spilled());
        assert_eq!(read_all(&mut buf), b"hello");
    }

    #[test]
    fn test_seal_short_buffer() {
        let mut buf = SpoolBuffer::default();
        buf.seal().unwrap();
        assert!(buf.is_empty());

        let mut buf = SpoolBuffer::default();
        buf.write_all(b"\n").unwrap();
        buf.seal().unwrap();
        assert!(buf.is_empty());
        assert!(read_all(&mut buf).is_empty());
    }

    #[test]
    fn test_spill_past_threshold() {
        let config = SpoolConfig::new().memory_threshold(8);
        let mut buf = SpoolBuffer::new(&config);

        buf.write_all(b"0123").unwrap();
        assert!(!buf.is_spilled());

        buf.write_all(b"4567").unwrap();
        assert!(!buf.is_spilled());

        buf.write_all(b"89\r\n").unwrap();
        assert!(buf.is_spilled());
        assert_eq!(buf.len(), 12);

        buf.seal().unwrap();
        assert_eq!(buf.len(), 10);
        assert_eq!(read_all(&mut buf), b"0123456789");
    }

    #[test]
    fn test_zero_threshold_spills_into_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = SpoolConfig::new().memory_threshold(0).spill_dir(dir.path());
        let mut buf = SpoolBuffer::new(&config);

        buf.write_all(b"").unwrap();
        assert!(!buf.is_spilled());

        buf.write_all(b"x").unwrap();
        assert!(buf.is_spilled());
        buf.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(read_all(&mut buf), b"x");
    }
}
