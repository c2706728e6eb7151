//! Core data types for skyforest-geotiff

use serde::{Deserialize, Serialize};

use crate::formats::tiff::tags::SampleFormat;

/// Represents pixel data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Unsigned 8-bit integer
    U8,
    /// Unsigned 16-bit integer
    U16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 8-bit integer
    I8,
    /// Signed 16-bit integer
    I16,
    /// Signed 32-bit integer
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl DataType {
    /// Returns the size in bytes for this data type
    pub fn size(&self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::U16 | DataType::I16 => 2,
            DataType::U32 | DataType::I32 | DataType::F32 => 4,
            DataType::F64 => 8,
        }
    }

    /// Returns the BitsPerSample value for this data type
    pub fn bits(&self) -> u16 {
        (self.size() * 8) as u16
    }

    /// Returns the SampleFormat tag value for this data type
    pub fn sample_format(&self) -> SampleFormat {
        match self {
            DataType::U8 | DataType::U16 | DataType::U32 => SampleFormat::Uint,
            DataType::I8 | DataType::I16 | DataType::I32 => SampleFormat::Int,
            DataType::F32 | DataType::F64 => SampleFormat::IeeeFp,
        }
    }

    /// Returns the name of this data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "U8",
            DataType::U16 => "U16",
            DataType::U32 => "U32",
            DataType::I8 => "I8",
            DataType::I16 => "I16",
            DataType::I32 => "I32",
            DataType::F32 => "F32",
            DataType::F64 => "F64",
        }
    }
}

/// Represents image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Creates new dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_size() {
        assert_eq!(DataType::U8.size(), 1);
        assert_eq!(DataType::U16.size(), 2);
        assert_eq!(DataType::U32.size(), 4);
        assert_eq!(DataType::F32.size(), 4);
        assert_eq!(DataType::F64.size(), 8);
    }

    #[test]
    fn test_data_type_bits_and_format() {
        assert_eq!(DataType::U8.bits(), 8);
        assert_eq!(DataType::I16.bits(), 16);
        assert_eq!(DataType::F64.bits(), 64);
        assert_eq!(DataType::U16.sample_format(), SampleFormat::Uint);
        assert_eq!(DataType::I32.sample_format(), SampleFormat::Int);
        assert_eq!(DataType::F32.sample_format(), SampleFormat::IeeeFp);
    }

    #[test]
    fn test_data_type_name() {
        assert_eq!(DataType::U8.name(), "U8");
        assert_eq!(DataType::F32.name(), "F32");
    }

    #[test]
    fn test_dimensions() {
        let dims = Dimensions::new(100, 200);
        assert_eq!(dims.width, 100);
        assert_eq!(dims.height, 200);
        assert_eq!(dims.pixel_count(), 20000);
    }

    #[test]
    fn test_pixel_count_does_not_overflow_u32() {
        let dims = Dimensions::new(u32::MAX, 2);
        assert_eq!(dims.pixel_count(), u32::MAX as u64 * 2);
    }
}
