use serde::{Deserialize, Serialize};

/// Artist used when no attribution can be derived
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Resolved (title, artist) pair for one media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,
}

/// How an attribution was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    /// Uploader taken as the artist
    UploaderAnchored,
    /// Split on a separator pattern in the title
    Separator,
    /// Nothing matched; whole title kept and artist unknown
    Unresolved,
    /// Supplied by the caller, resolver bypassed
    Override,
}

impl Attribution {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
        }
    }
}

impl ResolutionMethod {
    /// Whether the resolver had to give up on splitting the title
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, ResolutionMethod::Unresolved)
    }
}
