//! Data model shared by the tagging pipeline
//!
//! These types are independent of both the acquisition backend (yt-dlp)
//! and the output container format.

mod attribution;
mod source;

pub use attribution::{Attribution, ResolutionMethod, UNKNOWN_ARTIST};
pub use source::{SourceMetadata, ThumbnailRef};
