//! AA01 archive decoding and extraction.
//!
//! AA01 archives bundle file metadata and file contents for firmware
//! patches. Every part of the file, top level or nested, uses one record
//! encoding: a `AA01` magic, a 16-bit total length, and a body of tagged
//! fields whose fourth tag character selects the value encoding.
//!
//! ## Architecture
//!
//! - [`structures`]: constants, enumerations and the four record variants
//! - [`value`]: decoding of a single typed field value
//! - [`parser`]: the generic record decoder, one lazy iterator per stream
//! - [`dispatcher`]: walks the top-level containers and recurses into the
//!   section each one bounds
//! - [`extractor`]: writes data record payloads to disk
//!
//! ## Archive Layout
//!
//! The top level is a run of container records. Each container names a
//! section kind (`M` locator, `O` metadata, `E` data) and carries a `dat`
//! payload that is itself a stream of records of that kind. Data records
//! carry the file contents as their own `dat` payload, which is located but
//! never read while walking the archive.
//!
//! ## Limitations
//!
//! - Decode only; archives cannot be written
//! - Metadata (owner, mode, timestamps) is listed but never applied on extraction
//! - No payload integrity checks

mod dispatcher;
mod extractor;
mod parser;
mod structures;
mod value;

pub use dispatcher::{Aa01Archive, Entries};
pub use extractor::{
    Aa01Extractor, ExtractOptions, ExtractOutcome, ExtractStats, OverwritePolicy, sanitize_path,
    write_payload,
};
pub use parser::RecordDecoder;
pub use structures::*;
pub use value::{FieldType, FieldValue, decode_value};
