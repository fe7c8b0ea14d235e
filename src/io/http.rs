use reqwest::blocking::Client;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ReadAt;
use anyhow::{Result, anyhow, bail};

/// Smallest request issued to the server.
///
/// Record headers and bodies are tiny, so short reads are widened to this
/// size and answered from the cached block afterwards.
const READAHEAD_SIZE: u64 = 64 * 1024;

/// HTTP Range reader for remote AA01 archives
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
    max_retry: u32,
    /// Last fetched block: (absolute offset, bytes)
    cache: Mutex<Option<(u64, Vec<u8>)>>,
}

impl HttpRangeReader {
    /// Create a new HTTP Range reader
    ///
    /// This will send a HEAD request to verify Range support and get file size
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        // Send HEAD request to check capabilities
        let resp = client.head(&url).send()?;

        if !resp.status().is_success() {
            bail!("HTTP request failed with status: {}", resp.status());
        }

        let accept_ranges = resp
            .headers()
            .get("accept-ranges")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("none");

        if !accept_ranges.contains("bytes") {
            bail!("Remote server does not support Range requests");
        }

        let size = resp
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| anyhow!("Remote server did not return Content-Length"))?;

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
            cache: Mutex::new(None),
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Fetch `[offset, offset + len)` from the server, retrying transient failures.
    fn fetch(&self, offset: u64, len: u64) -> Result<Vec<u8>> {
        let end = (offset + len - 1).min(self.size - 1);
        let expected_size = (end - offset + 1) as usize;

        let mut out = Vec::with_capacity(expected_size);
        let mut retry_count = 0;

        while out.len() < expected_size {
            let current_start = offset + out.len() as u64;
            let range = format!("bytes={}-{}", current_start, end);

            let result = self.client.get(&self.url).header("Range", &range).send();

            match result {
                Ok(resp) => {
                    if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    let bytes = resp.bytes()?;
                    if bytes.is_empty() {
                        bail!("Server returned an empty range for {}", range);
                    }
                    let chunk_len = bytes.len().min(expected_size - out.len());
                    out.extend_from_slice(&bytes[..chunk_len]);

                    self.transferred_bytes
                        .fetch_add(chunk_len as u64, Ordering::Relaxed);
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded");
                    }
                    log::warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count,
                        self.max_retry,
                        e
                    );
                    std::thread::sleep(Duration::from_millis(500 * retry_count as u64));
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(out)
    }

    /// Serve the read from the cached block if it fully covers it.
    fn read_cached(&self, offset: u64, buf: &mut [u8]) -> Result<bool> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("range cache lock poisoned"))?;

        if let Some((start, block)) = cache.as_ref() {
            let end = start + block.len() as u64;
            if offset >= *start && offset + buf.len() as u64 <= end {
                let at = (offset - start) as usize;
                buf.copy_from_slice(&block[at..at + buf.len()]);
                return Ok(true);
            }
        }

        Ok(false)
    }
}

impl ReadAt for HttpRangeReader {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let wanted = (buf.len() as u64).min(self.size - offset) as usize;
        let buf = &mut buf[..wanted];

        if self.read_cached(offset, buf)? {
            return Ok(wanted);
        }

        // Large payload reads go straight through without touching the cache.
        if wanted as u64 >= READAHEAD_SIZE {
            let data = self.fetch(offset, wanted as u64)?;
            buf.copy_from_slice(&data);
            return Ok(wanted);
        }

        let block = self.fetch(offset, READAHEAD_SIZE)?;
        buf.copy_from_slice(&block[..wanted]);

        let mut cache = self
            .cache
            .lock()
            .map_err(|_| anyhow!("range cache lock poisoned"))?;
        *cache = Some((offset, block));

        Ok(wanted)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
