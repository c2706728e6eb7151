//! TIFF tag constants and typed tag values
//!
//! The numeric constants are what goes on the wire. The enums give the
//! handful of enumerated fields a typed face so callers cannot pass a
//! photometric value where a sample format is expected.

use std::sync::OnceLock;
use dashmap::DashMap;

/// Image width in pixels
pub const IMAGE_WIDTH: u16 = 256;

/// Image height in pixels
pub const IMAGE_LENGTH: u16 = 257;

/// Bits per sample
pub const BITS_PER_SAMPLE: u16 = 258;

/// Compression scheme
pub const COMPRESSION: u16 = 259;

/// Photometric interpretation
pub const PHOTOMETRIC_INTERPRETATION: u16 = 262;

/// Image description
pub const IMAGE_DESCRIPTION: u16 = 270;

/// Strip offsets
pub const STRIP_OFFSETS: u16 = 273;

/// Samples per pixel
pub const SAMPLES_PER_PIXEL: u16 = 277;

/// Rows per strip
pub const ROWS_PER_STRIP: u16 = 278;

/// Strip byte counts
pub const STRIP_BYTE_COUNTS: u16 = 279;

/// Planar configuration
pub const PLANAR_CONFIGURATION: u16 = 284;

/// Software
pub const SOFTWARE: u16 = 305;

/// Date/time
pub const DATE_TIME: u16 = 306;

/// Extra samples
pub const EXTRA_SAMPLES: u16 = 338;

/// Sample format
pub const SAMPLE_FORMAT: u16 = 339;

/// GeoTIFF ModelPixelScaleTag
pub const MODEL_PIXEL_SCALE: u16 = 33550;

/// GeoTIFF ModelTiepointTag
pub const MODEL_TIEPOINT: u16 = 33922;

/// GeoTIFF ModelTransformationTag
pub const MODEL_TRANSFORMATION: u16 = 34264;

/// GeoTIFF GeoKeyDirectoryTag
pub const GEO_KEY_DIRECTORY: u16 = 34735;

/// GeoTIFF GeoDoubleParamsTag
pub const GEO_DOUBLE_PARAMS: u16 = 34736;

/// GeoTIFF GeoAsciiParamsTag
pub const GEO_ASCII_PARAMS: u16 = 34737;

/// Returns the name of a TIFF tag
pub fn tag_name(tag: u16) -> &'static str {
    match tag {
        IMAGE_WIDTH => "ImageWidth",
        IMAGE_LENGTH => "ImageLength",
        BITS_PER_SAMPLE => "BitsPerSample",
        COMPRESSION => "Compression",
        PHOTOMETRIC_INTERPRETATION => "PhotometricInterpretation",
        IMAGE_DESCRIPTION => "ImageDescription",
        STRIP_OFFSETS => "StripOffsets",
        SAMPLES_PER_PIXEL => "SamplesPerPixel",
        ROWS_PER_STRIP => "RowsPerStrip",
        STRIP_BYTE_COUNTS => "StripByteCounts",
        PLANAR_CONFIGURATION => "PlanarConfiguration",
        SOFTWARE => "Software",
        DATE_TIME => "DateTime",
        EXTRA_SAMPLES => "ExtraSamples",
        SAMPLE_FORMAT => "SampleFormat",
        MODEL_PIXEL_SCALE => "ModelPixelScale",
        MODEL_TIEPOINT => "ModelTiepoint",
        MODEL_TRANSFORMATION => "ModelTransformation",
        GEO_KEY_DIRECTORY => "GeoKeyDirectory",
        GEO_DOUBLE_PARAMS => "GeoDoubleParams",
        GEO_ASCII_PARAMS => "GeoAsciiParams",
        _ => "Unknown",
    }
}

/// Field type constants
pub mod field_types {
    /// BYTE (8-bit unsigned)
    pub const BYTE: u16 = 1;

    /// ASCII string
    pub const ASCII: u16 = 2;

    /// SHORT (16-bit unsigned)
    pub const SHORT: u16 = 3;

    /// LONG (32-bit unsigned)
    pub const LONG: u16 = 4;

    /// DOUBLE (64-bit IEEE double)
    pub const DOUBLE: u16 = 12;
}

/// Returns the name of a field type
pub fn field_type_name(field_type: u16) -> &'static str {
    match field_type {
        field_types::BYTE => "BYTE",
        field_types::ASCII => "ASCII",
        field_types::SHORT => "SHORT",
        field_types::LONG => "LONG",
        field_types::DOUBLE => "DOUBLE",
        _ => "Unknown",
    }
}

/// Compression schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression
    None,
    /// LZW compression
    Lzw,
    /// Deflate/ZIP compression
    Deflate,
    /// PackBits compression
    PackBits,
}

impl Compression {
    /// Creates compression from TIFF compression tag value
    pub fn from_tag(value: u32) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            5 => Some(Compression::Lzw),
            8 => Some(Compression::Deflate),
            32773 => Some(Compression::PackBits),
            _ => None,
        }
    }

    /// Returns the TIFF tag value
    pub fn tag_value(&self) -> u16 {
        match self {
            Compression::None => 1,
            Compression::Lzw => 5,
            Compression::Deflate => 8,
            Compression::PackBits => 32773,
        }
    }

    /// Returns the name of this compression type
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Lzw => "LZW",
            Compression::Deflate => "Deflate/ZIP",
            Compression::PackBits => "PackBits",
        }
    }
}

/// Photometric interpretation of the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Photometric {
    /// Single channel, 0 is white
    MinIsWhite,
    /// Single channel, 0 is black
    MinIsBlack,
    /// Red, green, blue
    Rgb,
    /// Palette index
    Palette,
    /// Separated, usually CMYK
    Separated,
}

impl Photometric {
    /// Returns the TIFF tag value
    pub fn tag_value(&self) -> u16 {
        match self {
            Photometric::MinIsWhite => 0,
            Photometric::MinIsBlack => 1,
            Photometric::Rgb => 2,
            Photometric::Palette => 3,
            Photometric::Separated => 5,
        }
    }

    /// Picks the usual interpretation for a channel count
    pub fn for_channels(channels: u16) -> Self {
        if channels >= 3 {
            Photometric::Rgb
        } else {
            Photometric::MinIsBlack
        }
    }
}

/// Planar configuration of the samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanarConfig {
    /// Channels interleaved per pixel
    Contig,
    /// One plane per channel
    Separate,
}

impl PlanarConfig {
    /// Returns the TIFF tag value
    pub fn tag_value(&self) -> u16 {
        match self {
            PlanarConfig::Contig => 1,
            PlanarConfig::Separate => 2,
        }
    }
}

/// Interpretation of each sample's bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// Unsigned integer
    Uint,
    /// Two's complement signed integer
    Int,
    /// IEEE floating point
    IeeeFp,
    /// Undefined
    Void,
}

impl SampleFormat {
    /// Returns the TIFF tag value
    pub fn tag_value(&self) -> u16 {
        match self {
            SampleFormat::Uint => 1,
            SampleFormat::Int => 2,
            SampleFormat::IeeeFp => 3,
            SampleFormat::Void => 4,
        }
    }
}

/// Describes a tag the TIFF client knows how to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub tag: u16,
    pub field_type: u16,
    pub name: &'static str,
}

impl FieldInfo {
    pub const fn new(tag: u16, field_type: u16, name: &'static str) -> Self {
        Self { tag, field_type, name }
    }
}

const BASELINE_FIELDS: &[FieldInfo] = &[
    FieldInfo::new(IMAGE_WIDTH, field_types::LONG, "ImageWidth"),
    FieldInfo::new(IMAGE_LENGTH, field_types::LONG, "ImageLength"),
    FieldInfo::new(BITS_PER_SAMPLE, field_types::SHORT, "BitsPerSample"),
    FieldInfo::new(COMPRESSION, field_types::SHORT, "Compression"),
    FieldInfo::new(PHOTOMETRIC_INTERPRETATION, field_types::SHORT, "PhotometricInterpretation"),
    FieldInfo::new(IMAGE_DESCRIPTION, field_types::ASCII, "ImageDescription"),
    FieldInfo::new(STRIP_OFFSETS, field_types::LONG, "StripOffsets"),
    FieldInfo::new(SAMPLES_PER_PIXEL, field_types::SHORT, "SamplesPerPixel"),
    FieldInfo::new(ROWS_PER_STRIP, field_types::LONG, "RowsPerStrip"),
    FieldInfo::new(STRIP_BYTE_COUNTS, field_types::LONG, "StripByteCounts"),
    FieldInfo::new(PLANAR_CONFIGURATION, field_types::SHORT, "PlanarConfiguration"),
    FieldInfo::new(SOFTWARE, field_types::ASCII, "Software"),
    FieldInfo::new(DATE_TIME, field_types::ASCII, "DateTime"),
    FieldInfo::new(EXTRA_SAMPLES, field_types::SHORT, "ExtraSamples"),
    FieldInfo::new(SAMPLE_FORMAT, field_types::SHORT, "SampleFormat"),
];

fn extended_fields() -> &'static DashMap<u16, FieldInfo> {
    static EXTENDED: OnceLock<DashMap<u16, FieldInfo>> = OnceLock::new();
    EXTENDED.get_or_init(DashMap::new)
}

/// Makes an extension tag known to every TIFF client in the process
pub fn register_field(info: FieldInfo) {
    extended_fields().insert(info.tag, info);
}

/// Looks up the field description for a tag
pub fn field_info(tag: u16) -> Option<FieldInfo> {
    BASELINE_FIELDS
        .iter()
        .find(|info| info.tag == tag)
        .copied()
        .or_else(|| extended_fields().get(&tag).map(|entry| *entry.value()))
}
