//! GeoTIFF writing sessions
//!
//! A [`GeoTiffSession`] owns one registered virtual file and the TIFF client
//! bound to it. Callers set the georeference, write one image and close the
//! session to receive the finished bytes.
//!
//! ```
//! use skyforest_geotiff::{DataType, Dimensions, GeoTiffSession, ScanlineSpec};
//!
//! let pixels = vec![0u8; 4 * 4 * 3];
//! let mut session = GeoTiffSession::open("tile.tif")?;
//! session.set_origin(0.0, 0.0, 10.0, 50.0)?;
//! session.set_pixel_scale(0.01, 0.01)?;
//! session.write_image(&ScanlineSpec::new(Dimensions::new(4, 4), 3, DataType::U8, &pixels))?;
//! let bytes = session.close()?;
//! assert_eq!(&bytes[..2], b"II");
//! # Ok::<(), skyforest_geotiff::Error>(())
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::formats::tiff::geotiff::{self, GeoKeyValue};
use crate::formats::tiff::{tags, GeoKeyDirectory, GeoTransform, TagValue, TiffClient};
use crate::io::procs::{self, Handle, TiffIoProcs};
use crate::io::{ByteOrder, VirtualFile};
use crate::writer::{self, ImageLayout, ScanlineSpec};

static VIRTUAL_FILE_PROCS: TiffIoProcs = TiffIoProcs::virtual_file();

/// Options applied when a session is opened
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Byte order of the output file
    pub byte_order: ByteOrder,
    /// Bytes preallocated for the virtual file
    pub initial_capacity: usize,
    /// Value of the Software tag, if any
    pub software: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
            initial_capacity: 64 * 1024,
            software: Some(format!("skyforest-geotiff {}", env!("CARGO_PKG_VERSION"))),
        }
    }
}

/// Lifecycle of a writing session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Header written, no image yet
    Opened,
    /// Format fields and GeoKey defaults set
    MetadataSet,
    /// Rows are being or have been written
    RowsWriting { rows_written: u32 },
    /// Directory written and file handed off
    Closed,
    /// A call failed; only close or drop is legal
    Failed,
}

/// A GeoTIFF being written into a virtual file
pub struct GeoTiffSession {
    name: String,
    handle: Handle,
    client: Option<TiffClient>,
    geokeys: GeoKeyDirectory,
    state: SessionState,
    destination: Option<PathBuf>,
    origin: Option<(f64, f64, f64, f64)>,
    scale: Option<(f64, f64)>,
    layout: Option<ImageLayout>,
}

impl GeoTiffSession {
    /// Opens an in-memory session with default options
    pub fn open(name: &str) -> Result<Self> {
        Self::open_with_options(name, SessionOptions::default())
    }

    /// Opens an in-memory session
    pub fn open_with_options(name: &str, options: SessionOptions) -> Result<Self> {
        geotiff::register_geotiff_fields();

        let handle = procs::register(VirtualFile::with_capacity(options.initial_capacity));
        let mut client = match TiffClient::open(name, handle, &VIRTUAL_FILE_PROCS, options.byte_order) {
            Ok(client) => client,
            Err(e) => {
                procs::release(handle);
                return Err(e);
            }
        };

        if let Some(software) = options.software {
            if let Err(e) = client.set_field(tags::SOFTWARE, TagValue::Ascii(software)) {
                client.abandon();
                procs::release(handle);
                return Err(Error::OpenFailed(format!("{}: {}", name, e)));
            }
        }

        debug!("session '{}' opened on handle {}", name, handle.token());
        Ok(Self {
            name: name.to_string(),
            handle,
            client: Some(client),
            geokeys: GeoKeyDirectory::new(),
            state: SessionState::Opened,
            destination: None,
            origin: None,
            scale: None,
            layout: None,
        })
    }

    /// Opens a session whose bytes are also written to `path` on close
    ///
    /// The file is created immediately so an unwritable path fails here
    /// rather than after the image has been encoded.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::create_with_options(path, SessionOptions::default())
    }

    /// Opens a disk-backed session with custom options
    pub fn create_with_options<P: AsRef<Path>>(path: P, options: SessionOptions) -> Result<Self> {
        let path = path.as_ref();
        File::create(path)
            .map_err(|e| Error::OpenFailed(format!("{}: {}", path.display(), e)))?;

        let mut session = Self::open_with_options(&path.display().to_string(), options)?;
        session.destination = Some(path.to_path_buf());
        Ok(session)
    }

    /// Returns the session name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the handle of the backing virtual file
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the current size of the output in bytes
    pub fn size(&self) -> u64 {
        (VIRTUAL_FILE_PROCS.size)(self.handle)
    }

    /// Ties raster position (`raster_x`, `raster_y`) to model coordinates
    pub fn set_origin(&mut self, raster_x: f64, raster_y: f64, model_x: f64, model_y: f64) -> Result<()> {
        self.guarded(|session| {
            session.client()?.set_field(
                tags::MODEL_TIEPOINT,
                geotiff::tiepoint(raster_x, raster_y, model_x, model_y),
            )?;
            session.origin = Some((raster_x, raster_y, model_x, model_y));
            Ok(())
        })
    }

    /// Sets the model size of one pixel
    pub fn set_pixel_scale(&mut self, scale_x: f64, scale_y: f64) -> Result<()> {
        self.guarded(|session| {
            session.client()?.set_field(tags::MODEL_PIXEL_SCALE, geotiff::pixel_scale(scale_x, scale_y))?;
            session.scale = Some((scale_x, scale_y));
            Ok(())
        })
    }

    /// Sets a GeoKey, overriding the defaults the writer applies
    pub fn set_geo_key(&mut self, key: u16, value: GeoKeyValue) -> Result<()> {
        self.guarded(|session| {
            session.ensure_active()?;
            session.geokeys.set(key, value)
        })
    }

    /// Returns the georeference set so far, if both origin and scale are known
    pub fn georeference(&self) -> Option<GeoTransform> {
        let (raster_x, raster_y, model_x, model_y) = self.origin?;
        let (scale_x, scale_y) = self.scale?;
        Some(GeoTransform { raster_x, raster_y, model_x, model_y, scale_x, scale_y })
    }

    /// Writes the image described by `spec`
    ///
    /// Equivalent to [`set_metadata`](Self::set_metadata) followed by
    /// [`write_rows`](Self::write_rows). Only one image may be written per
    /// session.
    pub fn write_image(&mut self, spec: &ScanlineSpec) -> Result<()> {
        self.set_metadata(spec)?;
        self.write_rows(spec)
    }

    /// Sets the format fields and GeoKey defaults for `spec`
    ///
    /// Moves the session to [`SessionState::MetadataSet`].
    pub fn set_metadata(&mut self, spec: &ScanlineSpec) -> Result<()> {
        self.guarded(|session| {
            if session.state != SessionState::Opened {
                return Err(Error::InvalidArgument(format!(
                    "'{}': cannot set image metadata in state {:?}", session.name, session.state
                )));
            }

            let client = session.client.as_mut()
                .ok_or_else(|| Error::InvalidArgument("session is closed".to_string()))?;
            writer::set_metadata(client, &mut session.geokeys, spec)?;
            session.layout = Some(spec.layout());
            session.state = SessionState::MetadataSet;
            Ok(())
        })
    }

    /// Writes every row of `spec`
    ///
    /// `spec` must describe the same layout passed to
    /// [`set_metadata`](Self::set_metadata).
    pub fn write_rows(&mut self, spec: &ScanlineSpec) -> Result<()> {
        self.guarded(|session| {
            if session.state != SessionState::MetadataSet {
                return Err(Error::InvalidArgument(format!(
                    "'{}': cannot write rows in state {:?}", session.name, session.state
                )));
            }
            if session.layout != Some(spec.layout()) {
                return Err(Error::InvalidArgument(format!(
                    "'{}': rows do not match the metadata layout", session.name
                )));
            }

            let client = session.client.as_mut()
                .ok_or_else(|| Error::InvalidArgument("session is closed".to_string()))?;
            session.state = SessionState::RowsWriting { rows_written: 0 };
            let result = writer::write_rows(client, spec);
            session.state = SessionState::RowsWriting { rows_written: client.rows_written() };
            result
        })
    }

    /// Finishes the file and hands the bytes to the caller
    ///
    /// A session that failed earlier is released and reported as an error;
    /// its partial output is discarded.
    pub fn close(mut self) -> Result<Vec<u8>> {
        let client = self.client.take();
        let failed = self.state == SessionState::Failed;
        self.state = SessionState::Closed;

        let finished = match client {
            Some(client) if failed => {
                client.abandon();
                Err(Error::UnderlyingWriteFailed(format!(
                    "'{}' failed earlier; output discarded", self.name
                )))
            }
            Some(mut client) => {
                let keys = if self.geokeys.is_empty() {
                    Ok(())
                } else {
                    self.geokeys.write_to(&mut client)
                };
                match keys {
                    Ok(()) => client.close(),
                    Err(e) => {
                        client.abandon();
                        Err(e)
                    }
                }
            }
            None => Err(Error::InvalidArgument(format!("'{}' is already closed", self.name))),
        };

        let file = procs::release(self.handle);
        finished?;

        let bytes = file
            .ok_or_else(|| Error::UnderlyingWriteFailed(format!("'{}': virtual file missing", self.name)))?
            .into_inner();

        if let Some(path) = &self.destination {
            std::fs::write(path, &bytes)?;
            debug!("session '{}' wrote {} bytes to {}", self.name, bytes.len(), path.display());
        }

        debug!("session '{}' closed with {} bytes", self.name, bytes.len());
        Ok(bytes)
    }

    fn client(&mut self) -> Result<&mut TiffClient> {
        self.ensure_active()?;
        self.client
            .as_mut()
            .ok_or_else(|| Error::InvalidArgument("session is closed".to_string()))
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Failed => Err(Error::InvalidArgument(format!(
                "'{}' has failed; only close is allowed", self.name
            ))),
            SessionState::Closed => Err(Error::InvalidArgument(format!(
                "'{}' is closed", self.name
            ))),
            _ => Ok(()),
        }
    }

    fn guarded<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let result = f(self);
        if let Err(e) = &result {
            if self.state != SessionState::Closed {
                warn!("session '{}' failed: {}", self.name, e);
                self.state = SessionState::Failed;
            }
        }
        result
    }
}

impl Drop for GeoTiffSession {
    fn drop(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        warn!("session '{}' dropped without close; discarding output", self.name);
        if let Some(client) = self.client.take() {
            client.abandon();
        }
        procs::release(self.handle);
    }
}
