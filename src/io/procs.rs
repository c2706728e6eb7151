//! TIFF client I/O procedures backed by [`VirtualFile`]
//!
//! The TIFF client never touches storage directly. It is handed a
//! [`TiffIoProcs`] table and an opaque [`Handle`], and performs every read,
//! write, seek, size query and close through those five functions. Failures
//! are reported with sentinel values: `-1` for read/write/close and
//! `u64::MAX` for seek.
//!
//! Handles resolve through a process-wide registry. Each handle maps to
//! exactly one file, and independent sessions never share an entry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use dashmap::DashMap;
use log::{debug, warn};

use super::virtual_file::{SeekOrigin, VirtualFile};

/// Returned by `read`/`write`/`close` on failure
pub const IO_FAILURE: isize = -1;

/// Returned by `seek` on failure
pub const SEEK_FAILURE: u64 = u64::MAX;

/// Read procedure: `(handle, buffer, length) -> bytes read or -1`
pub type ReadProc = fn(Handle, Option<&mut [u8]>, usize) -> isize;

/// Write procedure: `(handle, buffer, length) -> bytes written or -1`
pub type WriteProc = fn(Handle, Option<&[u8]>, usize) -> isize;

/// Seek procedure: `(handle, offset, whence) -> new offset or u64::MAX`
pub type SeekProc = fn(Handle, i64, i32) -> u64;

/// Close procedure: `(handle) -> 0 or -1`
pub type CloseProc = fn(Handle) -> i32;

/// Size procedure: `(handle) -> file size`
pub type SizeProc = fn(Handle) -> u64;

/// Opaque token identifying a registered [`VirtualFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Returns the raw token value
    pub fn token(&self) -> u64 {
        self.0
    }
}

/// The five-function I/O table a TIFF client is opened against
#[derive(Debug, Clone, Copy)]
pub struct TiffIoProcs {
    pub read: ReadProc,
    pub write: WriteProc,
    pub seek: SeekProc,
    pub close: CloseProc,
    pub size: SizeProc,
}

impl TiffIoProcs {
    /// Returns the procedures that operate on registered virtual files
    pub const fn virtual_file() -> Self {
        Self {
            read: vf_read,
            write: vf_write,
            seek: vf_seek,
            close: vf_close,
            size: vf_size,
        }
    }
}

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn files() -> &'static DashMap<u64, VirtualFile> {
    static FILES: OnceLock<DashMap<u64, VirtualFile>> = OnceLock::new();
    FILES.get_or_init(DashMap::new)
}

/// Registers a file and returns the handle that now owns it
pub fn register(file: VirtualFile) -> Handle {
    let handle = Handle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
    files().insert(handle.0, file);
    debug!("registered virtual file handle {}", handle.0);
    handle
}

/// Removes a file from the registry and hands ownership to the caller
pub fn release(handle: Handle) -> Option<VirtualFile> {
    let released = files().remove(&handle.0).map(|(_, file)| file);
    if released.is_none() {
        warn!("release of unknown virtual file handle {}", handle.0);
    }
    released
}

/// Runs `f` against the file behind `handle`
pub fn with_file<T>(handle: Handle, f: impl FnOnce(&mut VirtualFile) -> T) -> Option<T> {
    files().get_mut(&handle.0).map(|mut entry| f(entry.value_mut()))
}

/// Returns whether `handle` is currently registered
pub fn is_registered(handle: Handle) -> bool {
    files().contains_key(&handle.0)
}

fn vf_read(handle: Handle, buf: Option<&mut [u8]>, size: usize) -> isize {
    if size == 0 {
        return 0;
    }
    let Some(buf) = buf else {
        return IO_FAILURE;
    };
    if size > buf.len() {
        return IO_FAILURE;
    }

    with_file(handle, |file| file.read(&mut buf[..size]) as isize).unwrap_or(IO_FAILURE)
}

fn vf_write(handle: Handle, buf: Option<&[u8]>, size: usize) -> isize {
    if size == 0 {
        return 0;
    }
    let Some(buf) = buf else {
        return IO_FAILURE;
    };
    if size > buf.len() {
        return IO_FAILURE;
    }

    with_file(handle, |file| match file.write(&buf[..size]) {
        Ok(written) => written as isize,
        Err(e) => {
            debug!("virtual file write of {} bytes failed: {}", size, e);
            IO_FAILURE
        }
    })
    .unwrap_or(IO_FAILURE)
}

fn vf_seek(handle: Handle, offset: i64, whence: i32) -> u64 {
    let Some(origin) = SeekOrigin::from_whence(whence) else {
        return SEEK_FAILURE;
    };

    with_file(handle, |file| file.seek(offset, origin).unwrap_or(SEEK_FAILURE))
        .unwrap_or(SEEK_FAILURE)
}

fn vf_close(handle: Handle) -> i32 {
    with_file(handle, |file| {
        file.close();
        0
    })
    .unwrap_or(IO_FAILURE as i32)
}

fn vf_size(handle: Handle) -> u64 {
    with_file(handle, |file| file.size()).unwrap_or(0)
}
