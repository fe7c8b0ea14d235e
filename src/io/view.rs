//! Windowed, independently cursored access to a shared byte source.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use super::{MemoryReader, SharedSource};
use crate::error::{Aa01Error, Result};

/// Chunk size used when copying a window out to a writer (1 MiB).
pub const COPY_CHUNK_SIZE: usize = 0x10_0000;

/// A read-only cursor over the absolute window `[start, start + len)` of a
/// shared source.
///
/// Views never own the source. Cloning a view, or opening a [`subview`],
/// yields a new cursor over the same bytes; moving one cursor is never
/// observable through another, since every read is issued at an absolute
/// offset computed from the view's own position.
///
/// [`subview`]: BoundedView::subview
#[derive(Clone)]
pub struct BoundedView {
    source: SharedSource,
    start: u64,
    len: u64,
    pos: u64,
}

impl BoundedView {
    /// Open a view over `[start, start + len)` of `source`.
    ///
    /// Fails with [`Aa01Error::TruncatedRead`] when the window reaches past the
    /// end of the source.
    pub fn new(source: SharedSource, start: u64, len: u64) -> Result<Self> {
        let size = source.size();
        let end = start.checked_add(len);
        if end.is_none_or(|end| end > size) {
            return Err(Aa01Error::TruncatedRead {
                offset: start,
                wanted: len,
                available: size.saturating_sub(start),
            });
        }

        Ok(Self {
            source,
            start,
            len,
            pos: 0,
        })
    }

    /// Open a view over the whole source.
    pub fn whole(source: SharedSource) -> Self {
        let len = source.size();
        Self {
            source,
            start: 0,
            len,
            pos: 0,
        }
    }

    /// The shared source this view reads from.
    pub fn source(&self) -> &SharedSource {
        &self.source
    }

    /// Absolute offset of the window start.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Window length in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cursor position relative to the window start.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Cursor position as an absolute source offset.
    pub fn absolute_position(&self) -> u64 {
        self.start + self.pos
    }

    /// Bytes left between the cursor and the window end.
    pub fn remaining(&self) -> u64 {
        self.len - self.pos
    }

    pub fn at_end(&self) -> bool {
        self.pos == self.len
    }

    /// Move the cursor to `offset` bytes past the window start.
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len {
            return Err(Aa01Error::SeekOutOfRange {
                offset,
                length: self.len,
            });
        }
        self.pos = offset;
        Ok(())
    }

    /// Advance the cursor by `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        self.ensure_available(n)?;
        self.pos += n;
        Ok(())
    }

    /// Fill `buf` from the cursor and advance past it.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let wanted = buf.len() as u64;
        self.ensure_available(wanted)?;

        let base = self.absolute_position();
        let mut filled = 0;
        while filled < buf.len() {
            let offset = base + filled as u64;
            let n = self.source.read_at(offset, &mut buf[filled..])?;
            if n == 0 {
                // The source shrank underneath us.
                return Err(Aa01Error::TruncatedRead {
                    offset,
                    wanted: wanted - filled as u64,
                    available: 0,
                });
            }
            filled += n;
        }

        self.pos += wanted;
        Ok(())
    }

    /// Read `n` bytes from the cursor.
    pub fn read(&mut self, n: u64) -> Result<Vec<u8>> {
        self.ensure_available(n)?;
        let mut buf = vec![0u8; n as usize];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(&self.read_array::<2>()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(&self.read_array::<4>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(&self.read_array::<8>()?))
    }

    /// Open an independent view over the next `len` bytes.
    ///
    /// The parent cursor stays where it is; callers [`skip`](Self::skip) past
    /// the bytes once they are done with the child.
    pub fn subview(&self, len: u64) -> Result<Self> {
        self.ensure_available(len)?;
        Ok(Self {
            source: Arc::clone(&self.source),
            start: self.absolute_position(),
            len,
            pos: 0,
        })
    }

    /// Load the remaining window into memory.
    ///
    /// The returned view covers the same absolute offsets, so positions and
    /// error offsets are unchanged, but further reads no longer touch the
    /// shared source.
    pub fn into_buffered(mut self) -> Result<Self> {
        let start = self.absolute_position();
        let data = self.read(self.remaining())?;
        let len = data.len() as u64;

        Ok(Self {
            source: Arc::new(MemoryReader::with_base(data, start)),
            start,
            len,
            pos: 0,
        })
    }

    /// Copy the remaining window to `writer` in [`COPY_CHUNK_SIZE`] chunks.
    ///
    /// Returns the number of bytes copied. Write failures surface as
    /// [`Aa01Error::Io`].
    pub fn copy_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64> {
        let mut buf = vec![0u8; COPY_CHUNK_SIZE.min(self.remaining() as usize)];
        let mut copied = 0;

        while !self.at_end() {
            let want = (self.remaining() as usize).min(buf.len());
            self.read_exact(&mut buf[..want])?;
            writer.write_all(&buf[..want])?;
            copied += want as u64;
        }

        Ok(copied)
    }

    fn ensure_available(&self, n: u64) -> Result<()> {
        if n > self.remaining() {
            return Err(Aa01Error::TruncatedRead {
                offset: self.absolute_position(),
                wanted: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for BoundedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedView")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}

/// Two views are equal when they cover the same window of the same source
/// with the same cursor.
impl PartialEq for BoundedView {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
            && self.start == other.start
            && self.len == other.len
            && self.pos == other.pos
    }
}
