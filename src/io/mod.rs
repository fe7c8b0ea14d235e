mod http;
mod local;
mod memory;
mod view;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;
pub use view::{BoundedView, COPY_CHUNK_SIZE};

use anyhow::Result;
use std::sync::Arc;

/// Trait for random access reading from a data source
///
/// Reads are positioned: each call names its own absolute offset, so any
/// number of views can share one source without disturbing each other.
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}

/// A byte source shared between nested views and decoded records.
pub type SharedSource = Arc<dyn ReadAt>;
