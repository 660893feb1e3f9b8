//! Bounded HTTP fetches for thumbnails

use crate::error::ImageProcessingError;
use std::io::Read;
use std::time::Duration;

/// Largest thumbnail body accepted, in bytes
pub const MAX_THUMBNAIL_BYTES: u64 = 20 * 1024 * 1024;

/// Blocking HTTP client with connect/read timeouts
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout(timeout)
            .build();
        Self {
            agent,
            max_bytes: MAX_THUMBNAIL_BYTES,
        }
    }

    /// Set the largest accepted body
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// GET a URL and return the body. Non-2xx statuses, empty bodies and
    /// bodies over the size limit are errors.
    pub fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ImageProcessingError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|error| match error {
                ureq::Error::Status(code, _) => {
                    ImageProcessingError::Fetch(format!("HTTP status {}", code))
                }
                ureq::Error::Transport(transport) => {
                    ImageProcessingError::Fetch(transport.to_string())
                }
            })?;

        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|error| ImageProcessingError::Fetch(format!("read failed: {}", error)))?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(ImageProcessingError::Fetch(format!(
                "thumbnail too large (over {} bytes)",
                self.max_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(ImageProcessingError::Empty);
        }
        Ok(bytes)
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}
