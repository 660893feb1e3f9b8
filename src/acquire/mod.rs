//! Media acquisition
//!
//! The pipeline only sees the [`MediaSource`] trait: given a URL it stages
//! audio (and usually a thumbnail) into a scratch directory and returns the
//! item's metadata. [`YtDlpSource`] is the production backend.

mod traits;
mod ytdlp;

pub use traits::{validate_url, MediaSource};
pub use ytdlp::{find_yt_dlp, YtDlpSource};
