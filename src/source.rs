//! JPEG image source
//!
//! Decodes a JPEG into the contiguous, interleaved pixel buffer the
//! scanline writer expects.

use std::fs;
use std::path::Path;
use jpeg_decoder::{ImageInfo, PixelFormat};
use log::debug;

use crate::error::{Error, Result};
use crate::formats::tiff::tags::Photometric;
use crate::io::ByteOrder;
use crate::types::{DataType, Dimensions};
use crate::writer::ScanlineSpec;

/// Pixels decoded from an image source
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub data_type: DataType,
    pub photometric: Photometric,
    /// Byte order of multi-byte samples
    pub byte_order: ByteOrder,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decodes JPEG bytes
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let mut decoder = jpeg_decoder::Decoder::new(data);

        let pixels = decoder.decode()
            .map_err(|e| Error::ImageSource(format!("JPEG error: {}", e)))?;
        let info = decoder.info()
            .ok_or_else(|| Error::ImageSource("JPEG has no frame header".to_string()))?;

        Self::from_decoded(info, pixels)
    }

    /// Reads and decodes a JPEG file
    pub fn from_jpeg_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .map_err(|e| Error::ImageSource(format!("{}: {}", path.display(), e)))?;
        Self::from_jpeg(&data)
    }

    fn from_decoded(info: ImageInfo, pixels: Vec<u8>) -> Result<Self> {
        let (channels, data_type, photometric) = match info.pixel_format {
            PixelFormat::L8 => (1, DataType::U8, Photometric::MinIsBlack),
            // 16-bit luminance comes out big-endian
            PixelFormat::L16 => (1, DataType::U16, Photometric::MinIsBlack),
            PixelFormat::RGB24 => (3, DataType::U8, Photometric::Rgb),
            PixelFormat::CMYK32 => (4, DataType::U8, Photometric::Separated),
        };

        let image = Self {
            width: info.width as u32,
            height: info.height as u32,
            channels,
            data_type,
            photometric,
            byte_order: ByteOrder::BigEndian,
            pixels,
        };

        let expected = image.dimensions().pixel_count() * channels as u64 * data_type.size() as u64;
        if image.pixels.len() as u64 != expected {
            return Err(Error::ImageSource(format!(
                "decoded {} bytes, expected {} for {}x{} {:?}",
                image.pixels.len(), expected, image.width, image.height, info.pixel_format
            )));
        }

        debug!(
            "decoded {}x{} JPEG ({:?}, {} channels)",
            image.width, image.height, info.pixel_format, channels
        );
        Ok(image)
    }

    /// Returns the image dimensions
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Reorders multi-byte samples for output in `order`
    pub fn into_byte_order(mut self, order: ByteOrder) -> Self {
        let sample_size = self.data_type.size();
        if sample_size > 1 && self.byte_order != order {
            for sample in self.pixels.chunks_exact_mut(sample_size) {
                sample.reverse();
            }
        }
        self.byte_order = order;
        self
    }

    /// Describes the pixels for the scanline writer
    pub fn to_spec(&self) -> ScanlineSpec<'_> {
        ScanlineSpec::new(self.dimensions(), self.channels, self.data_type, &self.pixels)
            .with_photometric(self.photometric)
    }
}

/// 2x2 baseline JPEG, three components, every coefficient zero
///
/// Decodes to mid gray (128) in every channel.
#[cfg(test)]
pub(crate) const MID_GRAY_JPEG: &[u8] = &[
    // SOI, DQT (all ones)
    0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x43, 0x00,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    // SOF0: 8 bit, 2x2, components 1..3 at 1x1 using table 0
    0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x02, 0x00, 0x02,
    0x03, 0x01, 0x11, 0x00, 0x02, 0x11, 0x00, 0x03, 0x11, 0x00,
    // DHT: standard luminance DC table, then an AC table of EOB and 0x01
    0xFF, 0xC4, 0x00, 0x32,
    0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
    0x10, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x01,
    // SOS, then DC 0 / EOB for each component padded with ones
    0xFF, 0xDA, 0x00, 0x0C, 0x03, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x3F, 0x00,
    0x00, 0x0F,
    // EOI
    0xFF, 0xD9,
];
