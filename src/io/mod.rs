//! I/O utilities for skyforest-geotiff
//!
//! Provides the in-memory virtual file, the I/O procedure table that TIFF
//! output is routed through, and byte order encoding.

pub mod byte_order;
pub mod procs;
pub mod virtual_file;

pub use byte_order::ByteOrder;
pub use procs::{Handle, TiffIoProcs};
pub use virtual_file::{SeekOrigin, VirtualFile};
