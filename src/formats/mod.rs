//! Raster output formats

pub mod tiff;
