//! Error types for AA01 decoding and extraction.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while decoding or extracting an AA01 archive.
///
/// Every decode error carries the absolute byte offset in the archive where
/// the problem was detected.
#[derive(Debug, Error)]
pub enum Aa01Error {
    /// A record did not start with the `AA01` magic.
    #[error("bad record magic {found:02x?} at offset {offset:#x}")]
    BadMagic { offset: u64, found: [u8; 4] },

    /// A record declared a total length smaller than its own header.
    #[error("record at offset {offset:#x} declares length {length}, smaller than the 6 byte header")]
    InvalidLength { offset: u64, length: u16 },

    /// A tag carried a type code outside `1 2 4 8 A B P T S`.
    #[error("unknown field type code {code:?} in tag at offset {offset:#x}")]
    UnknownFieldType { offset: u64, code: char },

    /// A known field was encoded with a type code it cannot hold.
    #[error("field {field:?} cannot hold a value of type {code:?} (tag at offset {offset:#x})")]
    FieldTypeMismatch {
        offset: u64,
        field: String,
        code: char,
    },

    /// Fewer bytes were available than the current step requires.
    #[error("truncated read at offset {offset:#x}: wanted {wanted} bytes, {available} available")]
    TruncatedRead {
        offset: u64,
        wanted: u64,
        available: u64,
    },

    /// A record body ended in the middle of a tag.
    #[error("record body ends mid-tag at offset {offset:#x} with {remaining} bytes left")]
    TruncatedRecord { offset: u64, remaining: u64 },

    /// A seek landed outside the view's window.
    #[error("seek to {offset:#x} is outside a window of {length} bytes")]
    SeekOutOfRange { offset: u64, length: u64 },

    /// An archive path would escape the extraction directory.
    #[error("refusing to extract unsafe path {path:?}")]
    UnsafePath { path: String },

    /// Writing an extracted file failed.
    #[error("failed to extract {}: {source}", .path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying byte source failed.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

/// A convenience `Result` alias using [`Aa01Error`].
pub type Result<T> = std::result::Result<T, Aa01Error>;
