//! Image File Directory (IFD) structures
//!
//! An [`IFD`] collects typed tag values and serialises them into a classic
//! TIFF directory block: the entry table, the next-IFD pointer and any
//! values too large to sit inline in an entry.

use std::collections::BTreeMap;
use crate::error::{Error, Result};
use crate::io::byte_order::ByteOrderHandler;
use super::tags::{self, field_types};

/// Bytes of an IFD entry's value field
const INLINE_SIZE: usize = 4;

/// Bytes of one serialised IFD entry
const ENTRY_SIZE: usize = 12;

/// A typed tag value
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Double(Vec<f64>),
    Ascii(String),
}

impl TagValue {
    /// Returns the TIFF field type
    pub fn field_type(&self) -> u16 {
        match self {
            TagValue::Short(_) => field_types::SHORT,
            TagValue::Long(_) => field_types::LONG,
            TagValue::Double(_) => field_types::DOUBLE,
            TagValue::Ascii(_) => field_types::ASCII,
        }
    }

    /// Returns the number of values, counting the ASCII terminator
    pub fn count(&self) -> usize {
        match self {
            TagValue::Short(v) => v.len(),
            TagValue::Long(v) => v.len(),
            TagValue::Double(v) => v.len(),
            TagValue::Ascii(s) => s.len() + 1,
        }
    }

    /// Returns whether there is nothing to write
    pub fn is_empty(&self) -> bool {
        match self {
            TagValue::Ascii(_) => false,
            _ => self.count() == 0,
        }
    }

    /// Returns the first value of an integer field
    pub fn first_u32(&self) -> Option<u32> {
        match self {
            TagValue::Short(v) => v.first().map(|&x| x as u32),
            TagValue::Long(v) => v.first().copied(),
            _ => None,
        }
    }

    /// Returns the size in bytes of this field type
    pub fn field_type_size(&self) -> usize {
        match self {
            TagValue::Ascii(_) => 1,
            TagValue::Short(_) => 2,
            TagValue::Long(_) => 4,
            TagValue::Double(_) => 8,
        }
    }

    /// Returns whether the value fits in the entry's value field
    pub fn is_inline(&self) -> bool {
        self.field_type_size() * self.count() <= INLINE_SIZE
    }

    /// Encodes the values in the given byte order
    pub fn encode(&self, handler: &dyn ByteOrderHandler) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.field_type_size() * self.count());
        match self {
            TagValue::Short(values) => values.iter().for_each(|&v| handler.put_u16(&mut out, v)),
            TagValue::Long(values) => values.iter().for_each(|&v| handler.put_u32(&mut out, v)),
            TagValue::Double(values) => values.iter().for_each(|&v| handler.put_f64(&mut out, v)),
            TagValue::Ascii(s) => {
                out.extend_from_slice(s.as_bytes());
                out.push(0);
            }
        }
        out
    }
}

/// Represents an Image File Directory being assembled for output
#[derive(Debug, Clone, Default)]
pub struct IFD {
    entries: BTreeMap<u16, TagValue>,
}

impl IFD {
    /// Creates an empty IFD
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a tag, replacing any previous value
    pub fn set(&mut self, tag: u16, value: TagValue) {
        self.entries.insert(tag, value);
    }

    /// Gets the value of a tag
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.entries.get(&tag)
    }

    /// Gets the first value of an integer tag
    pub fn get_u32(&self, tag: u16) -> Option<u32> {
        self.get(tag).and_then(TagValue::first_u32)
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the tags in ascending order
    pub fn tags(&self) -> impl Iterator<Item = u16> + '_ {
        self.entries.keys().copied()
    }

    /// Serialises the directory for placement at `ifd_offset`
    ///
    /// The block holds the entry table, a zero next-IFD pointer and then
    /// the out-of-line values, each starting on a word boundary.
    pub fn encode(&self, ifd_offset: u64, handler: &dyn ByteOrderHandler) -> Result<Vec<u8>> {
        let entry_count = u16::try_from(self.entries.len()).map_err(|_| {
            Error::UnderlyingWriteFailed(format!("too many IFD entries: {}", self.entries.len()))
        })?;
        let table_len = 2 + ENTRY_SIZE * self.entries.len() + 4;

        let mut table = Vec::with_capacity(table_len);
        let mut data = Vec::new();
        handler.put_u16(&mut table, entry_count);

        for (&tag, value) in &self.entries {
            let count = u32::try_from(value.count()).map_err(|_| {
                Error::UnderlyingWriteFailed(format!("{} has too many values", tags::tag_name(tag)))
            })?;
            let payload = value.encode(handler);

            handler.put_u16(&mut table, tag);
            handler.put_u16(&mut table, value.field_type());
            handler.put_u32(&mut table, count);

            if value.is_inline() {
                table.extend_from_slice(&payload);
                table.resize(table.len() + INLINE_SIZE - payload.len(), 0);
            } else {
                let offset = ifd_offset + (table_len + data.len()) as u64;
                handler.put_u32(&mut table, to_offset(offset)?);
                data.extend_from_slice(&payload);
                if data.len() % 2 == 1 {
                    data.push(0);
                }
            }
        }

        handler.put_u32(&mut table, 0);
        to_offset(ifd_offset + (table_len + data.len()) as u64)?;
        table.extend_from_slice(&data);
        Ok(table)
    }
}

/// Narrows a file offset to the 32 bits classic TIFF allows
pub fn to_offset(offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| {
        Error::UnderlyingWriteFailed(format!(
            "offset {} exceeds the classic TIFF 4 GiB limit", offset
        ))
    })
}
