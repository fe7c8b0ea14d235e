//! # aa01
//!
//! A lister and extractor for AA01 firmware-patch archives.
//!
//! AA01 is a self-describing, recursively nested, tagged binary container
//! used to ship file metadata and file contents together. This library
//! decodes such archives lazily from any random-access source: a local file,
//! an in-memory buffer, or a remote URL read with HTTP Range requests, so a
//! single file can be pulled out of a large remote archive without
//! downloading all of it.
//!
//! ## Features
//!
//! - One generic decoder for the container, locator, metadata and data records
//! - Lazy, pull-based walk over the whole archive in file order
//! - File contents are located, not buffered, and copied out in bounded chunks
//! - Extraction refuses paths that would escape the destination directory
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use aa01::{Aa01Archive, Aa01Extractor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = Aa01Archive::open(Path::new("patch.aa"))?;
//!
//!     // List every entity in the archive
//!     for entity in archive.entries() {
//!         println!("{}", entity?);
//!     }
//!
//!     // Write all file contents below ./out
//!     let stats = Aa01Extractor::new("out").extract_all(archive.entries())?;
//!     println!("{} files", stats.files);
//!
//!     Ok(())
//! }
//! ```

pub mod aa01;
pub mod cli;
pub mod error;
pub mod io;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use aa01::{Aa01Archive, Aa01Extractor, DataRecord, Entity};
pub use cli::Cli;
pub use error::{Aa01Error, Result};
pub use io::{BoundedView, HttpRangeReader, LocalFileReader, MemoryReader, ReadAt, SharedSource};
