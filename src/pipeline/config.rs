//! Pipeline configuration

use std::path::PathBuf;
use std::time::Duration;

/// Container extension the pipeline produces by default (MPEG-4 audio)
pub const DEFAULT_TARGET_EXTENSION: &str = "m4a";

/// Audio-bearing extensions accepted (and relabelled) when the target is missing
pub const DEFAULT_FALLBACK_EXTENSIONS: &[&str] = &["webm", "mp4", "aac"];

/// Fallback containers that are accepted but cannot be tagged (Matroska)
pub const UNTAGGABLE_FALLBACK_EXTENSIONS: &[&str] = &["webm"];

/// Configuration for one pipeline instance
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Durable directory receiving finished files
    pub output_dir: PathBuf,

    /// Directory under which per-run scratch directories are created
    pub work_root: PathBuf,

    /// Container extension of the output file, without the dot
    pub target_extension: String,

    /// Extensions accepted in place of the target, in order of preference.
    /// Such files are renamed to the target extension, not transcoded.
    pub fallback_extensions: Vec<String>,

    /// Timeout for thumbnail downloads
    pub http_timeout: Duration,
}

impl PipelineConfig {
    /// Create a configuration writing into `output_dir`
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            work_root: std::env::temp_dir().join("m4a-tagger"),
            target_extension: DEFAULT_TARGET_EXTENSION.to_string(),
            fallback_extensions: DEFAULT_FALLBACK_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Set the root for scratch directories
    pub fn with_work_root(mut self, work_root: PathBuf) -> Self {
        self.work_root = work_root;
        self
    }

    /// Set the output container extension
    pub fn with_target_extension(mut self, extension: &str) -> Self {
        self.target_extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self
    }

    /// Set the fallback container extensions
    pub fn with_fallback_extensions(mut self, extensions: &[&str]) -> Self {
        self.fallback_extensions = extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Set the thumbnail download timeout
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::new(PathBuf::from("/srv/out"));
        assert_eq!(config.target_extension, "m4a");
        assert_eq!(config.fallback_extensions, vec!["webm", "mp4", "aac"]);
    }

    #[test]
    fn test_extensions_are_normalized() {
        let config = PipelineConfig::new(PathBuf::from("/srv/out"))
            .with_target_extension(".WAV")
            .with_fallback_extensions(&[".WebM"]);
        assert_eq!(config.target_extension, "wav");
        assert_eq!(config.fallback_extensions, vec!["webm"]);
    }
}
