//! Scanline writer
//!
//! Pushes a contiguous, interleaved pixel buffer through a [`TiffClient`]
//! one row at a time, after setting the format fields and the GeoKey
//! defaults for an area raster.

use log::debug;

use crate::error::{Error, Result};
use crate::formats::tiff::tags::{self, Compression, Photometric, PlanarConfig, SampleFormat};
use crate::formats::tiff::{GeoKeyDirectory, TagValue, TiffClient};
use crate::types::{DataType, Dimensions};

/// ExtraSamples value for unassociated alpha
const EXTRA_SAMPLE_UNASSOCIATED_ALPHA: u16 = 2;

/// Layout fields of a [`ScanlineSpec`], without the pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout {
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub bits_per_channel: u16,
    pub photometric: Photometric,
    pub sample_format: SampleFormat,
}

/// Describes one image to be written
#[derive(Debug, Clone, Copy)]
pub struct ScanlineSpec<'a> {
    pub width: u32,
    pub height: u32,
    pub channels: u16,
    pub bits_per_channel: u16,
    pub photometric: Photometric,
    pub sample_format: SampleFormat,
    /// Rows top to bottom, channels interleaved
    pub pixels: &'a [u8],
}

impl<'a> ScanlineSpec<'a> {
    /// Creates a spec from dimensions and a pixel data type
    ///
    /// The photometric interpretation defaults to RGB for three or more
    /// channels and min-is-black otherwise.
    pub fn new(dims: Dimensions, channels: u16, data_type: DataType, pixels: &'a [u8]) -> Self {
        Self {
            width: dims.width,
            height: dims.height,
            channels,
            bits_per_channel: data_type.bits(),
            photometric: Photometric::for_channels(channels),
            sample_format: data_type.sample_format(),
            pixels,
        }
    }

    /// Overrides the photometric interpretation
    pub fn with_photometric(mut self, photometric: Photometric) -> Self {
        self.photometric = photometric;
        self
    }

    /// Returns the image dimensions
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Returns the layout fields
    pub fn layout(&self) -> ImageLayout {
        ImageLayout {
            width: self.width,
            height: self.height,
            channels: self.channels,
            bits_per_channel: self.bits_per_channel,
            photometric: self.photometric,
            sample_format: self.sample_format,
        }
    }

    /// Returns the byte length of one row
    pub fn stride(&self) -> Result<usize> {
        if self.bits_per_channel == 0 || self.bits_per_channel % 8 != 0 {
            return Err(Error::InvalidArgument(format!(
                "bits per channel must be a positive multiple of 8, got {}",
                self.bits_per_channel
            )));
        }

        (self.width as usize)
            .checked_mul(self.channels as usize)
            .and_then(|v| v.checked_mul(self.bits_per_channel as usize / 8))
            .ok_or_else(|| Error::InvalidArgument("row stride overflows".to_string()))
    }

    /// Checks dimensions against the pixel buffer and returns the stride
    pub fn validate(&self) -> Result<usize> {
        if self.width == 0 || self.height == 0 || self.channels == 0 {
            return Err(Error::InvalidArgument(format!(
                "image must be non-empty, got {}x{} with {} channels",
                self.width, self.height, self.channels
            )));
        }

        if self.photometric == Photometric::Palette {
            return Err(Error::InvalidArgument(
                "palette images need a color map, which is not written".to_string()
            ));
        }
        if self.channels < self.base_channels() {
            return Err(Error::InvalidArgument(format!(
                "{:?} needs at least {} channels, got {}",
                self.photometric, self.base_channels(), self.channels
            )));
        }

        let stride = self.stride()?;
        let expected = stride
            .checked_mul(self.height as usize)
            .ok_or_else(|| Error::InvalidArgument("image size overflows".to_string()))?;

        if self.pixels.len() != expected {
            return Err(Error::InvalidArgument(format!(
                "pixel buffer has {} bytes, {}x{}x{} at {} bits needs {}",
                self.pixels.len(), self.width, self.height, self.channels,
                self.bits_per_channel, expected
            )));
        }

        Ok(stride)
    }

    fn base_channels(&self) -> u16 {
        match self.photometric {
            Photometric::Rgb => 3,
            Photometric::Separated => 4,
            _ => 1,
        }
    }
}

/// Sets the format fields and GeoKey defaults for `spec`
pub fn set_metadata(client: &mut TiffClient, geokeys: &mut GeoKeyDirectory, spec: &ScanlineSpec) -> Result<()> {
    spec.validate()?;

    client.set_field(tags::COMPRESSION, TagValue::Short(vec![Compression::None.tag_value()]))?;
    client.set_field(tags::PLANAR_CONFIGURATION, TagValue::Short(vec![PlanarConfig::Contig.tag_value()]))?;
    client.set_field(tags::PHOTOMETRIC_INTERPRETATION, TagValue::Short(vec![spec.photometric.tag_value()]))?;
    client.set_field(tags::SAMPLE_FORMAT, TagValue::Short(vec![spec.sample_format.tag_value(); spec.channels as usize]))?;
    client.set_field(tags::IMAGE_WIDTH, TagValue::Long(vec![spec.width]))?;
    client.set_field(tags::IMAGE_LENGTH, TagValue::Long(vec![spec.height]))?;
    client.set_field(tags::ROWS_PER_STRIP, TagValue::Long(vec![1]))?;
    client.set_field(tags::SAMPLES_PER_PIXEL, TagValue::Short(vec![spec.channels]))?;
    client.set_field(tags::BITS_PER_SAMPLE, TagValue::Short(vec![spec.bits_per_channel; spec.channels as usize]))?;

    let extra = spec.channels.saturating_sub(spec.base_channels());
    if extra > 0 {
        client.set_field(tags::EXTRA_SAMPLES, TagValue::Short(vec![EXTRA_SAMPLE_UNASSOCIATED_ALPHA; extra as usize]))?;
    }

    geokeys.set_area_defaults()
}

/// Writes every row of `spec` in increasing order
///
/// Stops at the first failed row; nothing is retried.
pub fn write_rows(client: &mut TiffClient, spec: &ScanlineSpec) -> Result<()> {
    let stride = spec.validate()?;

    for (row, line) in spec.pixels.chunks_exact(stride).enumerate() {
        client.write_scanline(row as u32, line)?;
    }

    debug!("'{}': wrote {} rows of {} bytes", client.name(), spec.height, stride);
    Ok(())
}

/// Sets metadata and writes all rows for `spec`
pub fn write_image(client: &mut TiffClient, geokeys: &mut GeoKeyDirectory, spec: &ScanlineSpec) -> Result<()> {
    set_metadata(client, geokeys, spec)?;
    write_rows(client, spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::tiff::geotiff::{geo_keys, geo_values, GeoKeyValue};
    use crate::io::procs::{self, Handle, TiffIoProcs};
    use crate::io::{ByteOrder, VirtualFile};

    const PROCS: TiffIoProcs = TiffIoProcs::virtual_file();

    fn open_client() -> (Handle, TiffClient) {
        let handle = procs::register(VirtualFile::new());
        let client = TiffClient::open("writer.tif", handle, &PROCS, ByteOrder::LittleEndian).unwrap();
        (handle, client)
    }

    #[test]
    fn test_stride_and_validate() {
        let pixels = vec![0u8; 300];
        let spec = ScanlineSpec::new(Dimensions::new(10, 10), 3, DataType::U8, &pixels);
        assert_eq!(spec.stride().unwrap(), 30);
        assert_eq!(spec.validate().unwrap(), 30);
        assert_eq!(spec.photometric, Photometric::Rgb);
    }

    #[test]
    fn test_validate_rejects_short_buffer() {
        let pixels = vec![0u8; 299];
        let spec = ScanlineSpec::new(Dimensions::new(10, 10), 3, DataType::U8, &pixels);
        assert!(matches!(spec.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_validate_rejects_odd_bits_and_empty() {
        let pixels = vec![0u8; 4];
        let mut spec = ScanlineSpec::new(Dimensions::new(2, 2), 1, DataType::U8, &pixels);
        spec.bits_per_channel = 12;
        assert!(spec.validate().is_err());

        let spec = ScanlineSpec::new(Dimensions::new(0, 2), 1, DataType::U8, &[]);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_photometric_mismatch() {
        let pixels = vec![0u8; 4];
        let gray = ScanlineSpec::new(Dimensions::new(2, 2), 1, DataType::U8, &pixels);
        assert!(gray.validate().is_ok());

        let rgb = gray.with_photometric(Photometric::Rgb);
        assert!(matches!(rgb.validate(), Err(Error::InvalidArgument(_))));

        let palette = gray.with_photometric(Photometric::Palette);
        assert!(matches!(palette.validate(), Err(Error::InvalidArgument(_))));

        let cmyk_pixels = vec![0u8; 2 * 2 * 3];
        let short_cmyk = ScanlineSpec::new(Dimensions::new(2, 2), 3, DataType::U8, &cmyk_pixels)
            .with_photometric(Photometric::Separated);
        assert!(short_cmyk.validate().is_err());
    }

    #[test]
    fn test_layout_ignores_pixels() {
        let a = vec![0u8; 4];
        let b = vec![9u8; 4];
        let first = ScanlineSpec::new(Dimensions::new(2, 2), 1, DataType::U8, &a);
        let second = ScanlineSpec::new(Dimensions::new(2, 2), 1, DataType::U8, &b);

        assert_eq!(first.layout(), second.layout());
        assert_ne!(first.layout(), ScanlineSpec::new(Dimensions::new(4, 1), 1, DataType::U8, &a).layout());
    }

    #[test]
    fn test_size_mismatch_sets_nothing() {
        let (handle, mut client) = open_client();
        let mut geokeys = GeoKeyDirectory::new();
        let pixels = vec![0u8; 299];
        let spec = ScanlineSpec::new(Dimensions::new(10, 10), 3, DataType::U8, &pixels);

        assert!(matches!(
            write_image(&mut client, &mut geokeys, &spec),
            Err(Error::InvalidArgument(_))
        ));
        assert!(client.get_field(tags::IMAGE_WIDTH).is_none());
        assert!(geokeys.is_empty());
        assert_eq!(client.rows_written(), 0);

        client.abandon();
        procs::release(handle);
    }

    #[test]
    fn test_metadata_fields() {
        let (handle, mut client) = open_client();
        let mut geokeys = GeoKeyDirectory::new();
        let pixels = vec![0u8; 2 * 2 * 4 * 2];
        let spec = ScanlineSpec::new(Dimensions::new(2, 2), 4, DataType::U16, &pixels);

        set_metadata(&mut client, &mut geokeys, &spec).unwrap();

        assert_eq!(client.get_field(tags::BITS_PER_SAMPLE), Some(&TagValue::Short(vec![16; 4])));
        assert_eq!(client.get_field(tags::SAMPLES_PER_PIXEL), Some(&TagValue::Short(vec![4])));
        assert_eq!(client.get_field(tags::ROWS_PER_STRIP), Some(&TagValue::Long(vec![1])));
        assert_eq!(client.get_field(tags::COMPRESSION), Some(&TagValue::Short(vec![1])));
        assert_eq!(client.get_field(tags::PLANAR_CONFIGURATION), Some(&TagValue::Short(vec![1])));
        assert_eq!(client.get_field(tags::EXTRA_SAMPLES), Some(&TagValue::Short(vec![2])));
        assert_eq!(
            geokeys.get(geo_keys::GT_MODEL_TYPE),
            Some(&GeoKeyValue::Short(geo_values::MODEL_TYPE_GEOGRAPHIC))
        );

        client.abandon();
        procs::release(handle);
    }

    #[test]
    fn test_rows_land_in_order() {
        let (handle, mut client) = open_client();
        let mut geokeys = GeoKeyDirectory::new();
        let pixels: Vec<u8> = (0..12).collect();
        let spec = ScanlineSpec::new(Dimensions::new(4, 3), 1, DataType::U8, &pixels);

        write_image(&mut client, &mut geokeys, &spec).unwrap();
        assert_eq!(client.rows_written(), 3);
        client.close().unwrap();

        let bytes = procs::release(handle).unwrap().into_inner();
        assert_eq!(&bytes[8..20], pixels.as_slice());
    }
}
