//! m4a-tagger - single-item audio downloader and tagger
//!
//! Downloads one media item, derives a title/artist attribution from its
//! metadata, builds a square cover from its thumbnail and embeds both into
//! the audio container.

pub mod acquire;
pub mod artwork;
pub mod attribution;
pub mod error;
pub mod http;
pub mod model;
pub mod pipeline;
pub mod tagging;
pub mod transcoder;

pub use error::{ImageProcessingError, PipelineError, TagWriteError};
pub use pipeline::{Pipeline, PipelineConfig};
