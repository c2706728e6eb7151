//! skyforest-geotiff - GeoTIFF output into memory for Rust
//!
//! skyforest-geotiff writes georeferenced TIFF images into an in-memory
//! virtual file and hands back the finished bytes. All TIFF output runs
//! through a table of I/O procedures bound to a registry handle, so the
//! same writer could target any storage that implements them.
//!
//! # Examples
//!
//! ## Writing an RGB raster
//!
//! ```
//! use skyforest_geotiff::{DataType, Dimensions, GeoTiffSession, ScanlineSpec};
//!
//! let pixels = vec![0u8; 64 * 64 * 3];
//! let mut session = GeoTiffSession::open("zeros.tif")?;
//! session.set_origin(0.0, 0.0, -113.5, 53.5)?;
//! session.set_pixel_scale(0.001, 0.001)?;
//! session.write_image(&ScanlineSpec::new(Dimensions::new(64, 64), 3, DataType::U8, &pixels))?;
//!
//! let tiff = session.close()?;
//! println!("GeoTIFF is {} bytes", tiff.len());
//! # Ok::<(), skyforest_geotiff::Error>(())
//! ```
//!
//! ## Converting a JPEG on disk
//!
//! ```no_run
//! use skyforest_geotiff::{DecodedImage, GeoTiffSession};
//!
//! let image = DecodedImage::from_jpeg_file("photo.jpg")?;
//! let mut session = GeoTiffSession::create("photo.tif")?;
//! session.set_origin(0.0, 0.0, 10.0, 50.0)?;
//! session.set_pixel_scale(0.0001, 0.0001)?;
//! session.write_image(&image.to_spec())?;
//! session.close()?;
//! # Ok::<(), skyforest_geotiff::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod formats;
pub mod writer;
pub mod session;
pub mod source;
pub mod api;

pub use error::{Error, Result};
pub use types::{DataType, Dimensions};
pub use formats::tiff::{
    GeoKeyDirectory, GeoKeyValue, GeoTransform, TagValue, TiffClient,
    tags, TIFF_MAGIC
};
pub use io::{ByteOrder, Handle, SeekOrigin, TiffIoProcs, VirtualFile};
pub use writer::{ImageLayout, ScanlineSpec};
pub use session::{GeoTiffSession, SessionOptions, SessionState};
pub use source::DecodedImage;
