//! TIFF and GeoTIFF output support

pub mod tags;
pub mod ifd;
pub mod client;
pub mod geotiff;

pub use ifd::{IFD, TagValue};
pub use client::TiffClient;
pub use geotiff::{GeoKeyDirectory, GeoKeyValue, GeoTransform};

/// TIFF magic number (42)
pub const TIFF_MAGIC: u16 = 42;
