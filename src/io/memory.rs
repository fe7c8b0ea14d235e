use super::ReadAt;
use anyhow::Result;

/// In-memory byte source.
///
/// The buffer may be anchored at a non-zero `base` so that a slice copied out
/// of a larger source keeps answering to the same absolute offsets.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    data: Vec<u8>,
    base: u64,
}

impl MemoryReader {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, base: 0 }
    }

    /// Wrap `data` so that its first byte lives at absolute offset `base`.
    pub fn with_base(data: Vec<u8>, base: u64) -> Self {
        Self { data, base }
    }
}

impl ReadAt for MemoryReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let Some(start) = offset.checked_sub(self.base) else {
            return Ok(0);
        };
        let Ok(start) = usize::try_from(start) else {
            return Ok(0);
        };
        if start >= self.data.len() {
            return Ok(0);
        }

        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }

    fn size(&self) -> u64 {
        self.base + self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_relative_to_base() {
        let reader = MemoryReader::with_base(b"abcdef".to_vec(), 100);
        let mut buf = [0u8; 3];

        assert_eq!(reader.read_at(102, &mut buf).unwrap(), 3);
        assert_eq!(&buf, b"cde");
        assert_eq!(reader.size(), 106);
    }

    #[test]
    fn short_read_at_end_and_outside() {
        let reader = MemoryReader::with_base(b"abcdef".to_vec(), 100);
        let mut buf = [0u8; 4];

        assert_eq!(reader.read_at(104, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ef");
        assert_eq!(reader.read_at(99, &mut buf).unwrap(), 0);
        assert_eq!(reader.read_at(200, &mut buf).unwrap(), 0);
    }
}
