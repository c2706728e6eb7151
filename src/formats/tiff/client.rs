//! Strip-oriented TIFF writer driven through an I/O procedure table
//!
//! [`TiffClient`] never owns storage. It is opened against a [`Handle`] and
//! a [`TiffIoProcs`] table and performs every byte of output through those
//! procedures:
//!
//! - `open` writes the 8-byte header with a zero first-IFD offset;
//! - each scanline is one strip, appended at end of file;
//! - the directory is written on a word boundary after the last strip and
//!   the header's first-IFD offset is patched to point at it.

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::io::byte_order::{ByteOrder, ByteOrderHandler};
use crate::io::procs::{Handle, TiffIoProcs, SEEK_FAILURE};
use crate::io::virtual_file::SeekOrigin;
use super::ifd::{to_offset, TagValue, IFD};
use super::tags::{self, field_types, Compression, PlanarConfig};
use super::TIFF_MAGIC;

/// Byte offset of the first-IFD pointer in the header
const FIRST_IFD_POINTER: i64 = 4;

/// Tags that fix the strip layout once the first row is written
const LAYOUT_TAGS: [u16; 7] = [
    tags::IMAGE_WIDTH,
    tags::IMAGE_LENGTH,
    tags::BITS_PER_SAMPLE,
    tags::SAMPLES_PER_PIXEL,
    tags::COMPRESSION,
    tags::PLANAR_CONFIGURATION,
    tags::ROWS_PER_STRIP,
];

/// A TIFF being written through I/O procedures
pub struct TiffClient {
    name: String,
    handle: Handle,
    procs: TiffIoProcs,
    handler: Box<dyn ByteOrderHandler>,
    ifd: IFD,
    strips: Vec<Option<(u32, u32)>>,
    rows_written: u32,
    directory_offset: Option<u64>,
}

impl TiffClient {
    /// Opens a client for writing and emits the TIFF header
    pub fn open(name: &str, handle: Handle, procs: &TiffIoProcs, byte_order: ByteOrder) -> Result<Self> {
        let handler = byte_order.handler();
        let client = Self {
            name: name.to_string(),
            handle,
            procs: *procs,
            handler,
            ifd: IFD::new(),
            strips: Vec::new(),
            rows_written: 0,
            directory_offset: None,
        };

        let mut header = Vec::with_capacity(8);
        header.extend_from_slice(&byte_order.tiff_magic());
        client.handler.put_u16(&mut header, TIFF_MAGIC);
        client.handler.put_u32(&mut header, 0);

        client
            .seek(0, SeekOrigin::Start)
            .and_then(|_| client.write_all(&header))
            .map_err(|e| Error::OpenFailed(format!("{}: cannot write TIFF header: {}", name, e)))?;

        debug!("opened TIFF client '{}' ({:?})", name, byte_order);
        Ok(client)
    }

    /// Returns the name the client was opened with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of distinct rows written so far
    pub fn rows_written(&self) -> u32 {
        self.rows_written
    }

    /// Returns the current file size as reported by the size procedure
    pub fn file_size(&self) -> u64 {
        (self.procs.size)(self.handle)
    }

    /// Gets a field previously set on the directory
    pub fn get_field(&self, tag: u16) -> Option<&TagValue> {
        self.ifd.get(tag)
    }

    /// Sets a directory field
    ///
    /// The tag must be known to the field registry and the value must match
    /// its declared type. Strip offsets and byte counts are managed by the
    /// client. Layout fields cannot change once rows have been written.
    pub fn set_field(&mut self, tag: u16, value: TagValue) -> Result<()> {
        self.ensure_open()?;

        let info = tags::field_info(tag)
            .ok_or_else(|| Error::UnderlyingWriteFailed(format!("unknown tag {}", tag)))?;

        let type_matches = value.field_type() == info.field_type
            || (info.field_type == field_types::LONG && value.field_type() == field_types::SHORT);
        if !type_matches {
            return Err(Error::UnderlyingWriteFailed(format!(
                "{} expects {} values, got {}",
                info.name,
                tags::field_type_name(info.field_type),
                tags::field_type_name(value.field_type())
            )));
        }

        if value.is_empty() {
            return Err(Error::UnderlyingWriteFailed(format!("{} has no values", info.name)));
        }

        if tag == tags::STRIP_OFFSETS || tag == tags::STRIP_BYTE_COUNTS {
            return Err(Error::UnderlyingWriteFailed(format!(
                "{} is maintained by the writer", info.name
            )));
        }

        if tag == tags::COMPRESSION {
            let scheme = value.first_u32().and_then(Compression::from_tag);
            if scheme != Some(Compression::None) {
                let name = scheme.map(|c| c.name()).unwrap_or("unknown");
                return Err(Error::UnderlyingWriteFailed(format!(
                    "compression {} is not supported", name
                )));
            }
        }

        if self.rows_written > 0 && LAYOUT_TAGS.contains(&tag) && self.ifd.get(tag) != Some(&value) {
            return Err(Error::UnderlyingWriteFailed(format!(
                "cannot change {} after scanlines were written", info.name
            )));
        }

        self.ifd.set(tag, value);
        Ok(())
    }

    /// Returns the byte length of one scanline
    pub fn scanline_size(&self) -> Result<usize> {
        let width = self.require_u32(tags::IMAGE_WIDTH)? as u64;
        let bits = self.require_u32(tags::BITS_PER_SAMPLE)? as u64;
        let samples = self.ifd.get_u32(tags::SAMPLES_PER_PIXEL).unwrap_or(1) as u64;

        width
            .checked_mul(samples)
            .and_then(|v| v.checked_mul(bits))
            .map(|total_bits| total_bits.div_ceil(8))
            .and_then(|bytes| usize::try_from(bytes).ok())
            .ok_or_else(|| Error::UnderlyingWriteFailed("scanline size overflows".to_string()))
    }

    /// Writes one row of contiguous pixel data as its own strip
    pub fn write_scanline(&mut self, row: u32, data: &[u8]) -> Result<()> {
        self.ensure_open()?;

        let length = self.require_u32(tags::IMAGE_LENGTH)?;
        if row >= length {
            return Err(Error::UnderlyingWriteFailed(format!(
                "row {} is outside image length {}", row, length
            )));
        }

        let planar = self.ifd.get_u32(tags::PLANAR_CONFIGURATION)
            .unwrap_or(PlanarConfig::Contig.tag_value() as u32);
        if planar != PlanarConfig::Contig.tag_value() as u32 {
            return Err(Error::UnderlyingWriteFailed(
                "only contiguous planar configuration is supported".to_string()
            ));
        }

        match self.ifd.get_u32(tags::ROWS_PER_STRIP) {
            None => self.ifd.set(tags::ROWS_PER_STRIP, TagValue::Long(vec![1])),
            Some(1) => {}
            Some(other) => {
                return Err(Error::UnderlyingWriteFailed(format!(
                    "rows per strip must be 1, got {}", other
                )));
            }
        }

        let size = self.scanline_size()?;
        if data.len() < size {
            return Err(Error::UnderlyingWriteFailed(format!(
                "scanline {} has {} bytes, expected {}", row, data.len(), size
            )));
        }

        let offset = self.seek(0, SeekOrigin::End)?;
        self.write_all(&data[..size])?;

        if self.strips.len() != length as usize {
            self.strips.resize(length as usize, None);
        }
        let strip = &mut self.strips[row as usize];
        if strip.is_none() {
            self.rows_written += 1;
        }
        *strip = Some((to_offset(offset)?, to_offset(size as u64)?));

        trace!("'{}': row {} -> {} bytes at offset {}", self.name, row, size, offset);
        Ok(())
    }

    /// Writes the image directory and points the header at it
    ///
    /// Returns the offset of the directory. Rows never written are recorded
    /// with a zero offset and length.
    pub fn write_directory(&mut self) -> Result<u64> {
        self.ensure_open()?;

        self.require_u32(tags::IMAGE_WIDTH)?;
        let length = self.require_u32(tags::IMAGE_LENGTH)?;
        self.strips.resize(length as usize, None);

        let (offsets, counts): (Vec<u32>, Vec<u32>) = self.strips
            .iter()
            .map(|strip| strip.unwrap_or((0, 0)))
            .unzip();

        if self.ifd.get(tags::COMPRESSION).is_none() {
            self.ifd.set(tags::COMPRESSION, TagValue::Short(vec![Compression::None.tag_value()]));
        }
        if self.ifd.get(tags::ROWS_PER_STRIP).is_none() {
            self.ifd.set(tags::ROWS_PER_STRIP, TagValue::Long(vec![1]));
        }
        if self.ifd.get(tags::PLANAR_CONFIGURATION).is_none() {
            self.ifd.set(tags::PLANAR_CONFIGURATION, TagValue::Short(vec![PlanarConfig::Contig.tag_value()]));
        }
        self.ifd.set(tags::STRIP_OFFSETS, TagValue::Long(offsets));
        self.ifd.set(tags::STRIP_BYTE_COUNTS, TagValue::Long(counts));

        let end = self.file_size();
        let ifd_offset = end + end % 2;
        let block = self.ifd.encode(ifd_offset, &*self.handler)?;

        // Seeking past the end leaves a one byte hole that the write zero-fills.
        self.seek(ifd_offset as i64, SeekOrigin::Start)?;
        self.write_all(&block)?;

        let mut pointer = Vec::with_capacity(4);
        self.handler.put_u32(&mut pointer, to_offset(ifd_offset)?);
        self.seek(FIRST_IFD_POINTER, SeekOrigin::Start)?;
        self.write_all(&pointer)?;

        debug!(
            "'{}': wrote directory with {} entries at offset {} ({} rows)",
            self.name, self.ifd.entry_count(), ifd_offset, self.rows_written
        );
        self.directory_offset = Some(ifd_offset);
        Ok(ifd_offset)
    }

    /// Writes the directory if needed and closes the underlying file
    pub fn close(mut self) -> Result<()> {
        let result = match self.directory_offset {
            Some(_) => Ok(()),
            None => self.write_directory().map(|_| ()),
        };
        (self.procs.close)(self.handle);
        result
    }

    /// Closes the underlying file without writing a directory
    pub fn abandon(self) {
        debug!("'{}': abandoned after {} rows", self.name, self.rows_written);
        (self.procs.close)(self.handle);
    }

    fn ensure_open(&self) -> Result<()> {
        match self.directory_offset {
            Some(_) => Err(Error::UnderlyingWriteFailed(format!(
                "'{}': directory already written", self.name
            ))),
            None => Ok(()),
        }
    }

    fn require_u32(&self, tag: u16) -> Result<u32> {
        self.ifd.get_u32(tag).ok_or_else(|| {
            Error::UnderlyingWriteFailed(format!("missing required field {}", tags::tag_name(tag)))
        })
    }

    fn seek(&self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        match (self.procs.seek)(self.handle, offset, origin.whence()) {
            SEEK_FAILURE => Err(Error::UnderlyingWriteFailed(format!(
                "seek to {} from {:?} failed", offset, origin
            ))),
            position => Ok(position),
        }
    }

    fn write_all(&self, data: &[u8]) -> Result<()> {
        let written = (self.procs.write)(self.handle, Some(data), data.len());
        if written < 0 || written as usize != data.len() {
            return Err(Error::UnderlyingWriteFailed(format!(
                "short write: {} of {} bytes", written, data.len()
            )));
        }
        Ok(())
    }
}
