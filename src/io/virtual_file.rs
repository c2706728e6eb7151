//! In-memory virtual file
//!
//! A growable byte store with a cursor that behaves like a random-access
//! file: reads, writes and seeks at arbitrary offsets, with seeks past the
//! end allowed and the gap zero-filled by the next write.

use std::io::{self, Read, Seek, SeekFrom, Write};
use crate::error::{Error, Result};

/// Origin for [`VirtualFile::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Offset is absolute
    Start,
    /// Offset is relative to the cursor
    Current,
    /// Offset is relative to the end of storage
    End,
}

impl SeekOrigin {
    /// Maps a POSIX `whence` value (SEEK_SET, SEEK_CUR, SEEK_END)
    pub fn from_whence(whence: i32) -> Option<Self> {
        match whence {
            0 => Some(SeekOrigin::Start),
            1 => Some(SeekOrigin::Current),
            2 => Some(SeekOrigin::End),
            _ => None,
        }
    }

    /// Returns the POSIX `whence` value for this origin
    pub fn whence(&self) -> i32 {
        match self {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => 1,
            SeekOrigin::End => 2,
        }
    }
}

/// A growable in-memory file
///
/// `storage.len()` is the file size. The cursor is never negative but may
/// sit beyond the end of storage; only a write grows the storage.
#[derive(Debug, Clone, Default)]
pub struct VirtualFile {
    storage: Vec<u8>,
    cursor: i64,
}

impl VirtualFile {
    /// Creates an empty file
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty file with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Wraps existing bytes, with the cursor at the start
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            storage: bytes,
            cursor: 0,
        }
    }

    /// Returns the current cursor position
    pub fn cursor(&self) -> u64 {
        self.cursor as u64
    }

    /// Returns the file size in bytes
    pub fn size(&self) -> u64 {
        self.storage.len() as u64
    }

    /// Returns the file contents
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage
    }

    /// Copies up to `buf.len()` bytes from the cursor into `buf`
    ///
    /// Returns the number of bytes copied, which is 0 at or past the end.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let pos = self.cursor as u64;
        if buf.is_empty() || pos >= self.size() {
            return 0;
        }

        let start = pos as usize;
        let count = buf.len().min(self.storage.len() - start);
        buf[..count].copy_from_slice(&self.storage[start..start + count]);
        self.cursor += count as i64;
        count
    }

    /// Writes `data` at the cursor, growing and zero-filling as needed
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        let start = usize::try_from(self.cursor)
            .map_err(|_| Error::AllocationFailed(usize::MAX))?;
        let end = start
            .checked_add(data.len())
            .filter(|&end| i64::try_from(end).is_ok())
            .ok_or(Error::AllocationFailed(usize::MAX))?;

        if end > self.storage.len() {
            self.storage
                .try_reserve(end - self.storage.len())
                .map_err(|_| Error::AllocationFailed(end))?;
            self.storage.resize(end, 0);
        }

        self.storage[start..end].copy_from_slice(data);
        self.cursor = end as i64;
        Ok(data.len())
    }

    /// Moves the cursor and returns the new position
    ///
    /// A target that is negative or overflows is rejected and the cursor
    /// is left where it was. Seeking past the end does not grow storage.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let base = match origin {
            SeekOrigin::Start => Some(0),
            SeekOrigin::Current => Some(self.cursor),
            SeekOrigin::End => i64::try_from(self.storage.len()).ok(),
        };

        let target = base
            .and_then(|base| base.checked_add(offset))
            .ok_or_else(|| Error::InvalidArgument(format!(
                "seek by {} from {:?} overflows", offset, origin
            )))?;

        if target < 0 {
            return Err(Error::InvalidArgument(format!(
                "seek to negative offset {}", target
            )));
        }

        self.cursor = target;
        Ok(target as u64)
    }

    /// Closes the file. Storage stays valid and readable.
    pub fn close(&mut self) {}

    /// Consumes the file and returns its contents
    pub fn into_inner(self) -> Vec<u8> {
        self.storage
    }
}

fn to_io_error(error: Error) -> io::Error {
    let kind = match error {
        Error::AllocationFailed(_) => io::ErrorKind::OutOfMemory,
        _ => io::ErrorKind::InvalidInput,
    };
    io::Error::new(kind, error)
}

impl Read for VirtualFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(VirtualFile::read(self, buf))
    }
}

impl Write for VirtualFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        VirtualFile::write(self, buf).map_err(to_io_error)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for VirtualFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let (offset, origin) = match pos {
            SeekFrom::Start(offset) => {
                let offset = i64::try_from(offset).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidInput, "seek offset exceeds i64")
                })?;
                (offset, SeekOrigin::Start)
            }
            SeekFrom::Current(offset) => (offset, SeekOrigin::Current),
            SeekFrom::End(offset) => (offset, SeekOrigin::End),
        };
        VirtualFile::seek(self, offset, origin).map_err(to_io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_into_hole_zero_fills() {
        let mut file = VirtualFile::new();
        let payload = [0xABu8; 10];

        file.seek(100, SeekOrigin::Start).unwrap();
        assert_eq!(file.write(&payload).unwrap(), 10);

        assert_eq!(file.size(), 110);
        assert!(file.as_bytes()[..100].iter().all(|&b| b == 0));
        assert_eq!(&file.as_bytes()[100..110], &payload);
        assert_eq!(file.cursor(), 110);
    }

    #[test]
    fn test_size_tracks_furthest_write() {
        let mut file = VirtualFile::new();
        let writes: [(i64, &[u8]); 4] = [
            (0, b"head"),
            (10, b"abc"),
            (40, b"tail!"),
            (12, b"XY"),
        ];

        for (offset, data) in writes {
            file.seek(offset, SeekOrigin::Start).unwrap();
            file.write(data).unwrap();
        }

        assert_eq!(file.size(), 45);
        assert_eq!(&file.as_bytes()[0..4], b"head");
        assert!(file.as_bytes()[4..10].iter().all(|&b| b == 0));
        assert_eq!(&file.as_bytes()[10..14], b"abXY");
        assert!(file.as_bytes()[14..40].iter().all(|&b| b == 0));
        assert_eq!(&file.as_bytes()[40..45], b"tail!");
    }

    #[test]
    fn test_overwrite_keeps_earlier_bytes() {
        let mut file = VirtualFile::new();
        file.write(b"0123456789").unwrap();
        file.seek(3, SeekOrigin::Start).unwrap();
        file.write(b"abc").unwrap();

        assert_eq!(file.as_bytes(), b"012abc6789");
        assert_eq!(file.size(), 10);
    }

    #[test]
    fn test_seek_does_not_grow() {
        let mut file = VirtualFile::from_bytes(vec![1u8; 20]);

        for offset in [0, 5, 20] {
            file.seek(offset, SeekOrigin::Start).unwrap();
            assert_eq!(file.size(), 20);
        }

        assert_eq!(file.seek(500, SeekOrigin::Start).unwrap(), 500);
        assert_eq!(file.size(), 20);
    }

    #[test]
    fn test_relative_seeks() {
        let mut file = VirtualFile::new();

        assert_eq!(file.seek(50, SeekOrigin::Start).unwrap(), 50);
        assert_eq!(file.seek(-20, SeekOrigin::Current).unwrap(), 30);
        assert!(matches!(
            file.seek(-40, SeekOrigin::Current),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(file.cursor(), 30);
    }

    #[test]
    fn test_seek_from_end() {
        let mut file = VirtualFile::from_bytes(vec![0u8; 16]);
        assert_eq!(file.seek(-4, SeekOrigin::End).unwrap(), 12);
        assert_eq!(file.seek(4, SeekOrigin::End).unwrap(), 20);
        assert!(file.seek(-17, SeekOrigin::End).is_err());
        assert_eq!(file.cursor(), 20);
    }

    #[test]
    fn test_negative_seek_leaves_state_unchanged() {
        let mut file = VirtualFile::from_bytes(b"abcdef".to_vec());
        file.seek(2, SeekOrigin::Start).unwrap();

        assert!(file.seek(-1, SeekOrigin::Start).is_err());
        assert_eq!(file.cursor(), 2);
        assert_eq!(file.as_bytes(), b"abcdef");
    }

    #[test]
    fn test_overflowing_seek_is_rejected() {
        let mut file = VirtualFile::new();
        file.seek(i64::MAX, SeekOrigin::Start).unwrap();

        assert!(file.seek(1, SeekOrigin::Current).is_err());
        assert_eq!(file.cursor(), i64::MAX as u64);
    }

    #[test]
    fn test_write_at_huge_cursor_fails_cleanly() {
        let mut file = VirtualFile::new();
        file.seek(i64::MAX, SeekOrigin::Start).unwrap();

        assert!(matches!(file.write(b"x"), Err(Error::AllocationFailed(_))));
        assert_eq!(file.size(), 0);
    }

    #[test]
    fn test_read_saturates_at_end() {
        let mut file = VirtualFile::from_bytes(vec![1, 2, 3, 4, 5]);
        file.seek(3, SeekOrigin::Start).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf), 2);
        assert_eq!(&buf[..2], &[4, 5]);
        assert_eq!(file.cursor(), 5);

        assert_eq!(file.read(&mut buf), 0);
        file.seek(100, SeekOrigin::Start).unwrap();
        assert_eq!(file.read(&mut buf), 0);
        assert_eq!(file.cursor(), 100);
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut file = VirtualFile::new();
        file.write(b"keep me").unwrap();

        file.close();
        file.close();

        assert_eq!(file.as_bytes(), b"keep me");
        assert_eq!(file.into_inner(), b"keep me".to_vec());
    }

    #[test]
    fn test_whence_mapping() {
        assert_eq!(SeekOrigin::from_whence(0), Some(SeekOrigin::Start));
        assert_eq!(SeekOrigin::from_whence(1), Some(SeekOrigin::Current));
        assert_eq!(SeekOrigin::from_whence(2), Some(SeekOrigin::End));
        assert_eq!(SeekOrigin::from_whence(3), None);
        assert_eq!(SeekOrigin::End.whence(), 2);
    }

    #[test]
    fn test_std_io_traits() {
        let mut file = VirtualFile::new();
        file.write_all(b"hello world").unwrap();
        Seek::seek(&mut file, SeekFrom::Start(6)).unwrap();

        let mut rest = String::new();
        file.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "world");

        let err = Seek::seek(&mut file, SeekFrom::Current(-100)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
