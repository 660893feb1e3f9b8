//! yt-dlp backed acquisition

use super::traits::{validate_url, MediaSource};
use crate::model::{SourceMetadata, ThumbnailRef};
use crate::transcoder::TranscoderCapability;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

/// Format selector used when audio can be extracted with the transcoder
const FORMAT_WITH_TRANSCODER: &str = "bestaudio/best";

/// Format selector preferring MP4 audio when no transcoder is available
const FORMAT_DIRECT: &str =
    "bestaudio[ext=m4a]/bestaudio[acodec=aac]/bestaudio[acodec^=mp4a]/bestaudio/best";

/// Subset of yt-dlp's JSON info dict
#[derive(Debug, Deserialize)]
struct InfoPayload {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    duration: Option<f64>,
    description: Option<String>,
    thumbnail: Option<String>,
}

impl From<InfoPayload> for SourceMetadata {
    fn from(info: InfoPayload) -> Self {
        SourceMetadata {
            raw_title: info.title.unwrap_or_default(),
            uploader: info.uploader,
            thumbnail_ref: info
                .thumbnail
                .filter(|t| !t.trim().is_empty())
                .map(|t| ThumbnailRef::parse(&t)),
            media_id: info.id.unwrap_or_else(|| "thumb".to_string()),
            duration_secs: info.duration.filter(|d| *d >= 0.0).map(|d| d.round() as u64),
            description: info.description,
        }
    }
}

/// Acquisition through the yt-dlp command line tool
#[derive(Debug, Clone)]
pub struct YtDlpSource {
    binary: PathBuf,
    transcoder: TranscoderCapability,
    socket_timeout: Duration,
    retries: u32,
}

impl YtDlpSource {
    pub fn new(binary: PathBuf, transcoder: TranscoderCapability) -> Self {
        Self {
            binary,
            transcoder,
            socket_timeout: Duration::from_secs(120),
            retries: 15,
        }
    }

    /// Set the per-socket network timeout passed to yt-dlp
    pub fn with_socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = timeout;
        self
    }

    /// Arguments shared by probe and download
    fn base_args(&self) -> Vec<String> {
        vec![
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.socket_timeout.as_secs().max(1).to_string(),
            "--retries".to_string(),
            self.retries.to_string(),
        ]
    }

    fn download_args(&self, scratch_dir: &Path) -> Vec<String> {
        let mut args = self.base_args();
        args.push("--no-simulate".to_string());
        args.push("--write-thumbnail".to_string());
        args.push("-o".to_string());
        args.push(scratch_dir.join("%(id)s.%(ext)s").to_string_lossy().into_owned());

        match (self.transcoder.available, &self.transcoder.invocation_path) {
            (true, Some(ffmpeg)) => {
                args.extend(
                    [
                        "-f",
                        FORMAT_WITH_TRANSCODER,
                        "-x",
                        "--audio-format",
                        "m4a",
                        "--audio-quality",
                        "128K",
                        "--ffmpeg-location",
                    ]
                    .map(String::from),
                );
                args.push(ffmpeg.to_string_lossy().into_owned());
            }
            _ => {
                args.extend(["-f", FORMAT_DIRECT].map(String::from));
            }
        }
        args
    }

    fn run(&self, args: &[String], url: &str) -> Result<SourceMetadata> {
        log::debug!("Running {} {:?}", self.binary.display(), args);
        let output = Command::new(&self.binary)
            .args(args)
            .arg(url)
            .output()
            .with_context(|| format!("failed to execute {}", self.binary.display()))?;

        parse_output(&output)
    }
}

impl MediaSource for YtDlpSource {
    fn probe(&self, url: &str) -> Result<SourceMetadata> {
        let url = validate_url(url)?;
        log::info!("Fetching video info: {}", url);

        let mut args = self.base_args();
        args.push("--skip-download".to_string());
        self.run(&args, url)
    }

    fn acquire(&self, url: &str, scratch_dir: &Path) -> Result<SourceMetadata> {
        let url = validate_url(url)?;
        if self.transcoder.available {
            log::info!("Downloading audio (extracting to m4a): {}", url);
        } else {
            log::info!("Downloading audio (no transcoder, m4a preferred): {}", url);
        }

        let args = self.download_args(scratch_dir);
        self.run(&args, url)
    }
}

fn parse_output(output: &Output) -> Result<SourceMetadata> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("yt-dlp failed");
        anyhow::bail!("{}", message.trim());
    }

    let info: InfoPayload =
        serde_json::from_slice(&output.stdout).context("failed to parse yt-dlp response")?;
    Ok(info.into())
}

/// Find the yt-dlp binary
///
/// Searches in order:
/// 1. YT_DLP_PATH environment variable
/// 2. PATH
pub fn find_yt_dlp() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("YT_DLP_PATH").map(PathBuf::from) {
        if path.exists() {
            return Some(path);
        }
    }

    let names: &[&str] = if cfg!(windows) {
        &["yt-dlp.exe", "yt-dlp"]
    } else {
        &["yt-dlp", "yt-dlp_linux", "yt-dlp_macos"]
    };

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_payload_conversion() {
        let json = r#"{
            "id": "abc123",
            "title": "Imagine Dragons - Believer (Official Music Video)",
            "uploader": "ImagineDragonsVEVO",
            "duration": 204.4,
            "description": "desc",
            "thumbnail": "https://i.ytimg.com/vi/abc123/hqdefault.jpg",
            "formats": []
        }"#;
        let info: InfoPayload = serde_json::from_str(json).unwrap();
        let meta = SourceMetadata::from(info);

        assert_eq!(meta.media_id, "abc123");
        assert_eq!(meta.uploader.as_deref(), Some("ImagineDragonsVEVO"));
        assert_eq!(meta.duration_secs, Some(204));
        assert_eq!(
            meta.thumbnail_url(),
            Some("https://i.ytimg.com/vi/abc123/hqdefault.jpg")
        );
    }

    #[test]
    fn test_info_payload_missing_fields() {
        let info: InfoPayload = serde_json::from_str("{}").unwrap();
        let meta = SourceMetadata::from(info);
        assert_eq!(meta.raw_title, "");
        assert_eq!(meta.media_id, "thumb");
        assert!(meta.thumbnail_ref.is_none());
    }

    #[test]
    fn test_download_args_depend_on_transcoder() {
        let scratch = Path::new("/tmp/scratch");

        let direct = YtDlpSource::new(PathBuf::from("yt-dlp"), TranscoderCapability::unavailable());
        let args = direct.download_args(scratch);
        assert!(args.contains(&FORMAT_DIRECT.to_string()));
        assert!(!args.contains(&"-x".to_string()));

        let extracting = YtDlpSource::new(
            PathBuf::from("yt-dlp"),
            TranscoderCapability::at(PathBuf::from("/usr/bin/ffmpeg")),
        );
        let args = extracting.download_args(scratch);
        assert!(args.contains(&"-x".to_string()));
        assert!(args.contains(&"/usr/bin/ffmpeg".to_string()));
        assert!(args.contains(&"--write-thumbnail".to_string()));
    }

    #[test]
    fn test_missing_binary_is_error() {
        let source = YtDlpSource::new(
            PathBuf::from("/nonexistent/yt-dlp"),
            TranscoderCapability::unavailable(),
        );
        assert!(source.probe("https://youtu.be/abc").is_err());
        assert!(source.probe("https://youtu.be/abc?list=PL1").is_err());
    }
}
