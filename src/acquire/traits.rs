//! Acquisition trait definitions

use crate::model::SourceMetadata;
use anyhow::Result;
use std::path::Path;

/// Acquisition backend - allows swapping yt-dlp for other sources (or fakes in tests)
pub trait MediaSource {
    /// Fetch the item's metadata without downloading media
    fn probe(&self, url: &str) -> Result<SourceMetadata>;

    /// Download the item into `scratch_dir` and return its metadata.
    ///
    /// Audio and thumbnail files are left in `scratch_dir`; the caller
    /// discovers them by extension.
    fn acquire(&self, url: &str, scratch_dir: &Path) -> Result<SourceMetadata>;
}

/// Reject empty and playlist URLs; returns the trimmed URL
pub fn validate_url(url: &str) -> Result<&str> {
    let url = url.trim();
    if url.is_empty() {
        anyhow::bail!("no URL given");
    }
    if url.contains("list=") {
        anyhow::bail!("playlists are not supported, pass a single video URL");
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url("  https://youtu.be/abc ").unwrap(),
            "https://youtu.be/abc"
        );
        assert!(validate_url("   ").is_err());
        assert!(validate_url("https://www.youtube.com/watch?v=abc&list=PL123").is_err());
    }
}
