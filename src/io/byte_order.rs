//! Byte order (endianness) handling
//!
//! Provides utilities for encoding multi-byte values in either byte order.
//! TIFF output may be written little-endian ("II") or big-endian ("MM").

/// Represents the byte order (endianness) of binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Little-endian byte order (least significant byte first)
    #[default]
    LittleEndian,
    /// Big-endian byte order (most significant byte first)
    BigEndian,
}

impl ByteOrder {
    /// Returns the TIFF magic bytes announcing this byte order
    pub fn tiff_magic(&self) -> [u8; 2] {
        match self {
            ByteOrder::LittleEndian => *b"II",
            ByteOrder::BigEndian => *b"MM",
        }
    }

    /// Creates a handler for this byte order
    pub fn handler(&self) -> Box<dyn ByteOrderHandler> {
        match self {
            ByteOrder::LittleEndian => Box::new(LittleEndian),
            ByteOrder::BigEndian => Box::new(BigEndian),
        }
    }
}

/// Trait for appending typed values with a specific byte order
pub trait ByteOrderHandler: Send + Sync {
    /// Appends an unsigned 16-bit integer
    fn put_u16(&self, out: &mut Vec<u8>, value: u16);

    /// Appends an unsigned 32-bit integer
    fn put_u32(&self, out: &mut Vec<u8>, value: u32);

    /// Appends a 64-bit floating point number
    fn put_f64(&self, out: &mut Vec<u8>, value: f64);
}

struct LittleEndian;

impl ByteOrderHandler for LittleEndian {
    fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f64(&self, out: &mut Vec<u8>, value: f64) {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

struct BigEndian;

impl ByteOrderHandler for BigEndian {
    fn put_u16(&self, out: &mut Vec<u8>, value: u16) {
        out.extend_from_slice(&value.to_be_bytes());
    }

    fn put_u32(&self, out: &mut Vec<u8>, value: u32) {
        out.extend_from_slice(&value.to_be_bytes());
    }

    fn put_f64(&self, out: &mut Vec<u8>, value: f64) {
        out.extend_from_slice(&value.to_be_bytes());
    }
}
