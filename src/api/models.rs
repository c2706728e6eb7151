use serde::{Deserialize, Serialize};

use crate::formats::tiff::GeoTransform;
use crate::types::DataType;

/// Georeference supplied with an upload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoreferenceParams {
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    #[serde(default)]
    pub raster_x: f64,
    #[serde(default)]
    pub raster_y: f64,
}

impl GeoreferenceParams {
    pub fn transform(&self) -> GeoTransform {
        GeoTransform {
            raster_x: self.raster_x,
            raster_y: self.raster_y,
            model_x: self.origin_x,
            model_y: self.origin_y,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
        }
    }
}

/// Query parameters of the raw pixel endpoint
///
/// Multi-byte samples in the body must already be in the requested
/// output byte order.
#[derive(Debug, Deserialize)]
pub struct RawImageParams {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_data_type")]
    pub data_type: DataType,
    #[serde(default)]
    pub big_endian: bool,
    pub origin_x: f64,
    pub origin_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    #[serde(default)]
    pub raster_x: f64,
    #[serde(default)]
    pub raster_y: f64,
}

impl RawImageParams {
    pub fn georeference(&self) -> GeoreferenceParams {
        GeoreferenceParams {
            origin_x: self.origin_x,
            origin_y: self.origin_y,
            scale_x: self.scale_x,
            scale_y: self.scale_y,
            raster_x: self.raster_x,
            raster_y: self.raster_y,
        }
    }
}

fn default_channels() -> u16 {
    1
}

fn default_data_type() -> DataType {
    DataType::U8
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
