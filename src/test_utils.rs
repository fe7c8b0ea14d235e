//! Helpers for building AA01 archives in memory.
//!
//! Used by the unit and integration tests; the builders write exactly the
//! wire encoding the decoder reads.
//!
//! # Panics
//!
//! Builders panic when a record body outgrows the 16-bit length field, which
//! is acceptable for test input.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use crate::aa01::{RECORD_HEADER_SIZE, RECORD_MAGIC, SectionKind};

/// Builds one record: header, tagged fields and optional trailing payload.
///
/// # Examples
///
/// ```
/// use aa01::test_utils::RecordBuilder;
///
/// let record = RecordBuilder::new()
///     .char_field("TYP", 'F')
///     .text("PAT", "a/b/c.bin")
///     .size("DAT", 3)
///     .payload(b"xyz")
///     .build();
/// assert_eq!(&record[..4], b"AA01");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordBuilder {
    body: Vec<u8>,
    payload: Vec<u8>,
}

impl RecordBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag with an already encoded value.
    #[must_use]
    pub fn raw_tag(mut self, name: &str, code: char, value: &[u8]) -> Self {
        assert_eq!(name.len(), 3, "field names are three characters");
        self.body.extend_from_slice(name.as_bytes());
        self.body.push(code as u8);
        self.body.extend_from_slice(value);
        self
    }

    /// Append bytes to the body with no tag in front of them.
    #[must_use]
    pub fn raw_bytes(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    /// A single character stored as an 8-bit value (`1`).
    #[must_use]
    pub fn char_field(self, name: &str, value: char) -> Self {
        self.raw_tag(name, '1', &[value as u8])
    }

    /// An integer in the narrowest of `1 2 4 8` that holds it.
    #[must_use]
    pub fn uint(self, name: &str, value: u64) -> Self {
        if let Ok(v) = u8::try_from(value) {
            self.raw_tag(name, '1', &[v])
        } else if let Ok(v) = u16::try_from(value) {
            self.raw_tag(name, '2', &v.to_le_bytes())
        } else if let Ok(v) = u32::try_from(value) {
            self.raw_tag(name, '4', &v.to_le_bytes())
        } else {
            self.raw_tag(name, '8', &value.to_le_bytes())
        }
    }

    /// A size as `A` (16-bit) or `B` (32-bit).
    #[must_use]
    pub fn size(self, name: &str, value: u32) -> Self {
        match u16::try_from(value) {
            Ok(v) => self.raw_tag(name, 'A', &v.to_le_bytes()),
            Err(_) => self.raw_tag(name, 'B', &value.to_le_bytes()),
        }
    }

    /// A length-prefixed string (`P`).
    #[must_use]
    pub fn text(self, name: &str, value: &str) -> Self {
        let mut encoded = u16::try_from(value.len()).unwrap().to_le_bytes().to_vec();
        encoded.extend_from_slice(value.as_bytes());
        self.raw_tag(name, 'P', &encoded)
    }

    /// A plain timestamp (`S`).
    #[must_use]
    pub fn timestamp(self, name: &str, value: u64) -> Self {
        self.raw_tag(name, 'S', &value.to_le_bytes())
    }

    /// A timestamp followed by four reserved bytes (`T`).
    #[must_use]
    pub fn timestamp_with_trailer(self, name: &str, value: u64) -> Self {
        let mut encoded = value.to_le_bytes().to_vec();
        encoded.extend_from_slice(&[0; 4]);
        self.raw_tag(name, 'T', &encoded)
    }

    /// Bytes placed after the record body.
    #[must_use]
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.payload.extend_from_slice(bytes);
        self
    }

    /// Encode the record followed by its payload.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let length = u16::try_from(self.body.len() as u64 + RECORD_HEADER_SIZE).unwrap();

        let mut out = Vec::with_capacity(usize::from(length) + self.payload.len());
        out.extend_from_slice(RECORD_MAGIC);
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&self.body);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Builds a complete archive out of top-level sections.
///
/// # Examples
///
/// ```
/// use aa01::test_utils::{ArchiveBuilder, RecordBuilder};
///
/// let archive = ArchiveBuilder::new()
///     .data_section(vec![RecordBuilder::new().text("PAT", "hello.txt").build()])
///     .build();
/// assert!(!archive.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArchiveBuilder {
    bytes: Vec<u8>,
}

impl ArchiveBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a container record of kind `kind` wrapping `records`.
    #[must_use]
    pub fn section(mut self, kind: char, label: &str, records: Vec<Vec<u8>>) -> Self {
        let nested = records.concat();
        let container = RecordBuilder::new()
            .char_field("TYP", 'S')
            .char_field("YOP", kind)
            .text("LBL", label)
            .size("DAT", u32::try_from(nested.len()).unwrap())
            .payload(&nested)
            .build();
        self.bytes.extend_from_slice(&container);
        self
    }

    #[must_use]
    pub fn locator_section(self, records: Vec<Vec<u8>>) -> Self {
        self.section(SectionKind::Locator.as_char(), "info", records)
    }

    #[must_use]
    pub fn data_section(self, records: Vec<Vec<u8>>) -> Self {
        self.section(SectionKind::Data.as_char(), "data", records)
    }

    #[must_use]
    pub fn metadata_section(self, records: Vec<Vec<u8>>) -> Self {
        self.section(SectionKind::Metadata.as_char(), "meta", records)
    }

    /// Append an already encoded top-level record.
    #[must_use]
    pub fn raw(mut self, record: Vec<u8>) -> Self {
        self.bytes.extend_from_slice(&record);
        self
    }

    #[must_use]
    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// A data record for a regular file with `contents` as its payload.
#[must_use]
pub fn file_record(path: &str, contents: &[u8]) -> Vec<u8> {
    RecordBuilder::new()
        .char_field("TYP", 'F')
        .text("PAT", path)
        .uint("FLG", 0)
        .size("DAT", u32::try_from(contents.len()).unwrap())
        .payload(contents)
        .build()
}

/// A data record for a directory.
#[must_use]
pub fn dir_record(path: &str) -> Vec<u8> {
    RecordBuilder::new()
        .char_field("TYP", 'D')
        .text("PAT", path)
        .build()
}
