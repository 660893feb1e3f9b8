use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Metadata record produced once per run by the acquisition backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Freeform title as published (e.g. a video title)
    pub raw_title: String,

    /// Channel or account that published the item
    pub uploader: Option<String>,

    /// Where the source thumbnail can be found
    pub thumbnail_ref: Option<ThumbnailRef>,

    /// Backend identifier of the item (e.g. a YouTube video id)
    pub media_id: String,

    /// Duration in seconds, when the backend reports it
    pub duration_secs: Option<u64>,

    /// Free-text description, when the backend reports it
    pub description: Option<String>,
}

/// Location of a source thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThumbnailRef {
    /// Remote image, fetched over HTTP(S)
    Url(String),
    /// Image already present on the local filesystem
    Path(PathBuf),
}

impl SourceMetadata {
    /// Create a metadata record with only the mandatory fields set
    pub fn new(raw_title: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            raw_title: raw_title.into(),
            uploader: None,
            thumbnail_ref: None,
            media_id: media_id.into(),
            duration_secs: None,
            description: None,
        }
    }

    /// Set the uploader
    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = Some(uploader.into());
        self
    }

    /// Set the thumbnail reference
    pub fn with_thumbnail(mut self, thumbnail: ThumbnailRef) -> Self {
        self.thumbnail_ref = Some(thumbnail);
        self
    }

    /// Thumbnail URL, if the thumbnail is remote
    pub fn thumbnail_url(&self) -> Option<&str> {
        match &self.thumbnail_ref {
            Some(ThumbnailRef::Url(url)) => Some(url.as_str()),
            _ => None,
        }
    }
}

impl ThumbnailRef {
    /// Classify a backend-provided string as URL or local path
    pub fn parse(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ThumbnailRef::Url(value.to_string())
        } else {
            ThumbnailRef::Path(PathBuf::from(value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_ref_parse() {
        assert_eq!(
            ThumbnailRef::parse("https://i.ytimg.com/vi/x/hqdefault.jpg"),
            ThumbnailRef::Url("https://i.ytimg.com/vi/x/hqdefault.jpg".to_string())
        );
        assert_eq!(
            ThumbnailRef::parse("/tmp/thumb.webp"),
            ThumbnailRef::Path(PathBuf::from("/tmp/thumb.webp"))
        );
    }

    #[test]
    fn test_thumbnail_url_only_for_remote() {
        let meta = SourceMetadata::new("t", "id")
            .with_thumbnail(ThumbnailRef::Path(PathBuf::from("/tmp/a.jpg")));
        assert!(meta.thumbnail_url().is_none());
    }
}
