//! GeoTIFF specific functionality
//!
//! Georeferencing is carried by three kinds of tags: the model tiepoint and
//! pixel scale (plain DOUBLE arrays) and the GeoKey directory, a SHORT array
//! of key entries whose DOUBLE and ASCII values spill into companion tags.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Once;
use log::debug;

use crate::error::{Error, Result};
use super::client::TiffClient;
use super::ifd::TagValue;
use super::tags::{self, field_types, FieldInfo};

/// GeoKey identifiers
pub mod geo_keys {
    pub const GT_MODEL_TYPE: u16 = 1024;
    pub const GT_RASTER_TYPE: u16 = 1025;
    pub const GT_CITATION: u16 = 1026;
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const GEOG_CITATION: u16 = 2049;
    pub const GEOG_ANGULAR_UNITS: u16 = 2054;
    pub const GEOG_SEMI_MAJOR_AXIS: u16 = 2057;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
    pub const PROJ_LINEAR_UNITS: u16 = 3076;
}

/// Common GeoKey values
pub mod geo_values {
    pub const MODEL_TYPE_PROJECTED: u16 = 1;
    pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
    pub const MODEL_TYPE_GEOCENTRIC: u16 = 3;
    pub const RASTER_PIXEL_IS_AREA: u16 = 1;
    pub const RASTER_PIXEL_IS_POINT: u16 = 2;
    pub const ANGULAR_DEGREE: u16 = 9102;
    pub const LINEAR_METER: u16 = 9001;
    pub const GCS_WGS_84: u16 = 4326;
}

const KEY_DIRECTORY_VERSION: u16 = 1;
const KEY_REVISION: u16 = 1;
const MINOR_REVISION: u16 = 0;

const GEOTIFF_FIELDS: [FieldInfo; 6] = [
    FieldInfo::new(tags::MODEL_PIXEL_SCALE, field_types::DOUBLE, "ModelPixelScale"),
    FieldInfo::new(tags::MODEL_TIEPOINT, field_types::DOUBLE, "ModelTiepoint"),
    FieldInfo::new(tags::MODEL_TRANSFORMATION, field_types::DOUBLE, "ModelTransformation"),
    FieldInfo::new(tags::GEO_KEY_DIRECTORY, field_types::SHORT, "GeoKeyDirectory"),
    FieldInfo::new(tags::GEO_DOUBLE_PARAMS, field_types::DOUBLE, "GeoDoubleParams"),
    FieldInfo::new(tags::GEO_ASCII_PARAMS, field_types::ASCII, "GeoAsciiParams"),
];

/// Registers the GeoTIFF tags with the TIFF field registry
///
/// Runs once per process; later calls return immediately.
pub fn register_geotiff_fields() {
    static EXTENDER: Once = Once::new();
    EXTENDER.call_once(|| {
        for info in GEOTIFF_FIELDS {
            tags::register_field(info);
        }
        debug!("registered {} GeoTIFF fields", GEOTIFF_FIELDS.len());
    });
}

/// Builds a ModelTiepoint value mapping a raster point to a model point
pub fn tiepoint(raster_x: f64, raster_y: f64, model_x: f64, model_y: f64) -> TagValue {
    TagValue::Double(vec![raster_x, raster_y, 0.0, model_x, model_y, 0.0])
}

/// Builds a ModelPixelScale value
pub fn pixel_scale(scale_x: f64, scale_y: f64) -> TagValue {
    TagValue::Double(vec![scale_x, scale_y, 0.0])
}

/// A GeoKey value
#[derive(Debug, Clone, PartialEq)]
pub enum GeoKeyValue {
    Short(u16),
    Double(Vec<f64>),
    Ascii(String),
}

/// GeoKeys collected for one image, written as the GeoKeyDirectory tag
#[derive(Debug, Clone, Default)]
pub struct GeoKeyDirectory {
    keys: BTreeMap<u16, GeoKeyValue>,
}

/// Serialised form of a [`GeoKeyDirectory`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGeoKeys {
    pub directory: Vec<u16>,
    pub doubles: Vec<f64>,
    pub ascii: String,
}

impl GeoKeyDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a key, replacing any previous value
    pub fn set(&mut self, key: u16, value: GeoKeyValue) -> Result<()> {
        match &value {
            GeoKeyValue::Double(values) if values.is_empty() => {
                return Err(Error::InvalidArgument(format!("GeoKey {} has no values", key)));
            }
            GeoKeyValue::Ascii(text) if !text.is_ascii() => {
                return Err(Error::InvalidArgument(format!(
                    "GeoKey {} text must be ASCII, got {:?}", key, text
                )));
            }
            GeoKeyValue::Ascii(text) if text.contains('|') || text.contains('\0') => {
                return Err(Error::InvalidArgument(format!(
                    "GeoKey {} text may not contain '|' or NUL", key
                )));
            }
            _ => {}
        }
        self.keys.insert(key, value);
        Ok(())
    }

    /// Gets the value of a key
    pub fn get(&self, key: u16) -> Option<&GeoKeyValue> {
        self.keys.get(&key)
    }

    /// Returns the number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns whether no keys are set
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sets the keys describing an area raster in degrees and metres
    ///
    /// Keys already present are left alone.
    pub fn set_area_defaults(&mut self) -> Result<()> {
        let defaults = [
            (geo_keys::GT_MODEL_TYPE, geo_values::MODEL_TYPE_GEOGRAPHIC),
            (geo_keys::GT_RASTER_TYPE, geo_values::RASTER_PIXEL_IS_AREA),
            (geo_keys::GEOG_ANGULAR_UNITS, geo_values::ANGULAR_DEGREE),
            (geo_keys::PROJ_LINEAR_UNITS, geo_values::LINEAR_METER),
        ];
        for (key, value) in defaults {
            self.keys.entry(key).or_insert(GeoKeyValue::Short(value));
        }
        Ok(())
    }

    /// Serialises the keys into directory, double and ASCII parameters
    pub fn encode(&self) -> Result<EncodedGeoKeys> {
        let too_large = || Error::UnderlyingWriteFailed("GeoKey directory too large".to_string());

        let key_count = u16::try_from(self.keys.len()).map_err(|_| too_large())?;
        let mut directory = vec![KEY_DIRECTORY_VERSION, KEY_REVISION, MINOR_REVISION, key_count];
        let mut doubles = Vec::new();
        let mut ascii = String::new();

        for (&key, value) in &self.keys {
            let (location, count, value_offset) = match value {
                GeoKeyValue::Short(v) => (0, 1, *v),
                GeoKeyValue::Double(values) => {
                    let index = u16::try_from(doubles.len()).map_err(|_| too_large())?;
                    let count = u16::try_from(values.len()).map_err(|_| too_large())?;
                    doubles.extend_from_slice(values);
                    (tags::GEO_DOUBLE_PARAMS, count, index)
                }
                GeoKeyValue::Ascii(text) => {
                    let index = u16::try_from(ascii.len()).map_err(|_| too_large())?;
                    let count = u16::try_from(text.len() + 1).map_err(|_| too_large())?;
                    ascii.push_str(text);
                    ascii.push('|');
                    (tags::GEO_ASCII_PARAMS, count, index)
                }
            };
            directory.extend_from_slice(&[key, location, count, value_offset]);
        }

        Ok(EncodedGeoKeys { directory, doubles, ascii })
    }

    /// Writes the directory and its parameter tags through `client`
    pub fn write_to(&self, client: &mut TiffClient) -> Result<()> {
        let encoded = self.encode()?;
        debug!(
            "writing {} GeoKeys ({} doubles, {} ASCII bytes)",
            self.keys.len(), encoded.doubles.len(), encoded.ascii.len()
        );

        client.set_field(tags::GEO_KEY_DIRECTORY, TagValue::Short(encoded.directory))?;
        if !encoded.doubles.is_empty() {
            client.set_field(tags::GEO_DOUBLE_PARAMS, TagValue::Double(encoded.doubles))?;
        }
        if !encoded.ascii.is_empty() {
            client.set_field(tags::GEO_ASCII_PARAMS, TagValue::Ascii(encoded.ascii))?;
        }
        Ok(())
    }
}

/// Affine georeference derived from a tiepoint and pixel scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub raster_x: f64,
    pub raster_y: f64,
    pub model_x: f64,
    pub model_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl GeoTransform {
    /// Returns [a, b, c, d, e, f] where:
    /// model_x = a + b * pixel_x + c * pixel_y
    /// model_y = d + e * pixel_x + f * pixel_y
    pub fn affine(&self) -> [f64; 6] {
        [
            self.model_x - self.scale_x * self.raster_x,
            self.scale_x,
            0.0,
            self.model_y + self.scale_y * self.raster_y,
            0.0,
            -self.scale_y,
        ]
    }

    /// Converts a raster position to model coordinates
    pub fn pixel_to_model(&self, pixel_x: f64, pixel_y: f64) -> (f64, f64) {
        let t = self.affine();
        (
            t[0] + t[1] * pixel_x + t[2] * pixel_y,
            t[3] + t[4] * pixel_x + t[5] * pixel_y,
        )
    }

    /// Computes the bounding box in model coordinates
    ///
    /// Returns (min_x, min_y, max_x, max_y)
    pub fn bounding_box(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.pixel_to_model(0.0, 0.0);
        let (x1, y1) = self.pixel_to_model(width as f64, height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "GeoTIFF Georeference:")?;
        writeln!(f, "  Tiepoint: raster ({}, {}) -> model ({}, {})",
            self.raster_x, self.raster_y, self.model_x, self.model_y)?;
        writeln!(f, "  Pixel Size: {} x {}", self.scale_x, self.scale_y)
    }
}
