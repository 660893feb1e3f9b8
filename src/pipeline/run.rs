//! Per-run orchestration
//!
//! One run: acquire into a fresh scratch directory, resolve attribution,
//! source a cover, tag, and move the result into the output directory.
//! Acquisition, textual tagging and finalizing are fatal; attribution and
//! cover problems only degrade the result. The scratch directory is removed
//! on every exit path.

use super::config::{PipelineConfig, UNTAGGABLE_FALLBACK_EXTENSIONS};
use super::organizer::{OutputOrganizer, ScratchDir};
use crate::acquire::MediaSource;
use crate::artwork::{CoverImage, CoverNormalizer, CoverSource};
use crate::attribution;
use crate::error::PipelineError;
use crate::http::HttpFetcher;
use crate::model::{Attribution, ResolutionMethod, SourceMetadata, ThumbnailRef};
use crate::tagging;
use chrono::Datelike;
use std::path::{Path, PathBuf};

/// File name of the normalized cover inside the scratch directory
const COVER_FILE_NAME: &str = "cover.jpg";

/// Characters of the description kept in previews
const PREVIEW_DESCRIPTION_CHARS: usize = 200;

/// States of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Acquiring,
    Attributing,
    CoverSourcing,
    Tagging,
    Finalizing,
    Done,
    Failed,
}

impl PipelineError {
    /// State the run was in when it failed
    pub fn failed_in(&self) -> RunState {
        match self {
            PipelineError::InvalidRequest(_) | PipelineError::Acquisition(_) => {
                RunState::Acquiring
            }
            PipelineError::TagWrite(_) => RunState::Tagging,
            PipelineError::Finalize(_) => RunState::Finalizing,
        }
    }
}

/// Result of a completed (possibly degraded) run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Final location of the tagged file
    pub output_path: PathBuf,

    /// File name inside the output directory
    pub file_name: String,

    /// Attribution written to the file
    pub attribution: Attribution,

    /// How the attribution was obtained
    pub method: ResolutionMethod,

    /// Whether cover art was embedded
    pub cover_embedded: bool,

    /// Original extension if the audio file was relabelled rather than transcoded
    pub relabelled_from: Option<String>,

    /// Low-severity notes about degraded steps
    pub notes: Vec<String>,
}

/// Metadata shown before downloading
#[derive(Debug, Clone)]
pub struct Preview {
    pub attribution: Attribution,
    pub uploader: Option<String>,
    pub duration_secs: Option<u64>,
    pub description: String,
    pub thumbnail_url: Option<String>,
}

/// Main tagging pipeline
pub struct Pipeline<S: MediaSource> {
    config: PipelineConfig,
    organizer: OutputOrganizer,
    normalizer: CoverNormalizer,
    source: S,
}

impl<S: MediaSource> Pipeline<S> {
    /// Create a new pipeline
    pub fn new(config: PipelineConfig, source: S) -> Self {
        let organizer = OutputOrganizer::new(config.output_dir.clone());
        let normalizer = CoverNormalizer::new(HttpFetcher::new(config.http_timeout));

        Self {
            config,
            organizer,
            normalizer,
            source,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn organizer(&self) -> &OutputOrganizer {
        &self.organizer
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Download, attribute from the item's metadata, tag and store
    pub fn run(&self, url: &str) -> Result<RunOutcome, PipelineError> {
        self.execute(url, None)
    }

    /// Like [`Pipeline::run`] but with a caller-supplied attribution
    pub fn run_with_attribution(
        &self,
        url: &str,
        attribution: Attribution,
    ) -> Result<RunOutcome, PipelineError> {
        let title = attribution.title.trim();
        let artist = attribution.artist.trim();
        if title.is_empty() {
            return Err(PipelineError::InvalidRequest("title is empty".to_string()));
        }
        if artist.is_empty() {
            return Err(PipelineError::InvalidRequest("artist is empty".to_string()));
        }
        self.execute(url, Some(Attribution::new(title, artist)))
    }

    /// Fetch metadata only and resolve the attribution
    pub fn preview(&self, url: &str) -> Result<Preview, PipelineError> {
        let metadata = self.source.probe(url).map_err(|e| {
            log::error!("Preview failed: {:#}", e);
            PipelineError::Acquisition(format!("{:#}", e))
        })?;

        let attribution = attribution::resolve(&metadata.raw_title, metadata.uploader.as_deref());
        log::info!("Preview: {} by {}", attribution.title, attribution.artist);

        Ok(Preview {
            attribution,
            thumbnail_url: metadata.thumbnail_url().map(str::to_string),
            uploader: metadata.uploader,
            duration_secs: metadata.duration_secs,
            description: metadata
                .description
                .unwrap_or_default()
                .chars()
                .take(PREVIEW_DESCRIPTION_CHARS)
                .collect(),
        })
    }

    fn execute(
        &self,
        url: &str,
        attribution_override: Option<Attribution>,
    ) -> Result<RunOutcome, PipelineError> {
        let scratch = ScratchDir::create(&self.config.work_root).map_err(|e| {
            PipelineError::Acquisition(format!("could not create scratch directory: {}", e))
        })?;

        let result = self.execute_in(url, attribution_override, &scratch);
        match &result {
            Ok(outcome) => {
                log_state(RunState::Done);
                log::info!("Done: {}", outcome.file_name);
            }
            Err(e) => {
                log_state(RunState::Failed);
                log::error!("Run failed while {:?}: {}", e.failed_in(), e);
            }
        }

        if let Err(e) = scratch.remove() {
            log::warn!("Failed to remove scratch directory: {}", e);
        }
        result
    }

    fn execute_in(
        &self,
        url: &str,
        attribution_override: Option<Attribution>,
        scratch: &ScratchDir,
    ) -> Result<RunOutcome, PipelineError> {
        let mut notes = Vec::new();

        log_state(RunState::Acquiring);
        let metadata = self
            .source
            .acquire(url, scratch.path())
            .map_err(|e| PipelineError::Acquisition(scrub_paths(&format!("{:#}", e), scratch.path())))?;

        let (audio_path, relabelled_from) = scratch
            .find_audio(&self.config.target_extension, &self.config.fallback_extensions)
            .map_err(|e| PipelineError::Acquisition(format!("could not inspect downloaded files: {}", e)))?
            .ok_or_else(|| PipelineError::Acquisition("no audio file was produced".to_string()))?;
        if let Some(original) = &relabelled_from {
            notes.push(format!(
                "audio was delivered as .{} and relabelled as .{} without transcoding",
                original, self.config.target_extension
            ));
            if UNTAGGABLE_FALLBACK_EXTENSIONS.contains(&original.as_str()) {
                log::warn!(
                    ".{} audio cannot be tagged; install ffmpeg so audio is extracted to .{}",
                    original,
                    self.config.target_extension
                );
            }
        }

        log_state(RunState::Attributing);
        log::info!(
            "Video info: title {:?}, uploader {:?}",
            metadata.raw_title,
            metadata.uploader
        );
        let (attribution, method) = match attribution_override {
            Some(attribution) => (attribution, ResolutionMethod::Override),
            None => attribution::resolve_traced(&metadata.raw_title, metadata.uploader.as_deref()),
        };
        if method.is_ambiguous() {
            log::info!("Could not split title; artist set to {:?}", attribution.artist);
            notes.push("artist could not be determined from the title".to_string());
        }
        log::info!("Attribution: {} - {}", attribution.artist, attribution.title);

        log_state(RunState::CoverSourcing);
        let cover_path = match self.source_cover(scratch, &metadata, &mut notes) {
            Some(cover) => {
                let path = scratch.path().join(COVER_FILE_NAME);
                match cover.write_to(&path) {
                    Ok(()) => Some(path),
                    Err(e) => {
                        log::warn!("Failed to stage cover image: {}", e);
                        notes.push("cover image could not be staged".to_string());
                        None
                    }
                }
            }
            None => None,
        };

        log_state(RunState::Tagging);
        let year = chrono::Local::now().year();
        let outcome = tagging::tag_file(
            &audio_path,
            &attribution.title,
            &attribution.artist,
            Some(year),
            cover_path.as_deref(),
        )?;
        if cover_path.is_some() && !outcome.cover_embedded {
            notes.push("cover image could not be embedded".to_string());
        }

        log_state(RunState::Finalizing);
        let file_name = self
            .organizer
            .file_name(&attribution, &self.config.target_extension);
        let output_path = self
            .organizer
            .publish(&audio_path, &file_name)
            .map_err(|e| PipelineError::Finalize(e.to_string()))?;

        Ok(RunOutcome {
            output_path,
            file_name,
            attribution,
            method,
            cover_embedded: outcome.cover_embedded,
            relabelled_from,
            notes,
        })
    }

    /// Prefer a thumbnail staged by the acquisition step, then the metadata's
    /// thumbnail reference. Any failure means no cover.
    fn source_cover(
        &self,
        scratch: &ScratchDir,
        metadata: &SourceMetadata,
        notes: &mut Vec<String>,
    ) -> Option<CoverImage> {
        match scratch.find_thumbnail() {
            Ok(Some(staged)) => match self.normalizer.normalize(CoverSource::File(staged), None) {
                Ok(cover) => {
                    log::info!("Cover created from downloaded thumbnail");
                    return Some(cover);
                }
                Err(e) => log::warn!("Downloaded thumbnail unusable: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Could not look for downloaded thumbnail: {}", e),
        }

        let result = match &metadata.thumbnail_ref {
            Some(ThumbnailRef::Url(url)) => self
                .normalizer
                .normalize(CoverSource::Url(url.clone()), Some(url.as_str())),
            Some(ThumbnailRef::Path(path)) => self
                .normalizer
                .normalize(CoverSource::File(path.clone()), None),
            None => {
                log::warn!("No thumbnail available");
                notes.push("no thumbnail available".to_string());
                return None;
            }
        };

        match result {
            Ok(cover) => {
                log::info!("Cover created from thumbnail reference");
                Some(cover)
            }
            Err(e) => {
                log::warn!("Thumbnail processing failed: {}", e);
                notes.push(format!("cover skipped: {}", scrub_paths(&e.to_string(), scratch.path())));
                None
            }
        }
    }
}

fn log_state(state: RunState) {
    log::debug!("State: {:?}", state);
}

/// Replace the scratch directory path in a message with a placeholder
fn scrub_paths(message: &str, scratch: &Path) -> String {
    let scratch = scratch.to_string_lossy();
    if scratch.is_empty() {
        return message.to_string();
    }
    message.replace(scratch.as_ref(), "<scratch>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_in() {
        assert_eq!(
            PipelineError::Acquisition("gone".to_string()).failed_in(),
            RunState::Acquiring
        );
        assert_eq!(
            PipelineError::Finalize("read-only".to_string()).failed_in(),
            RunState::Finalizing
        );
    }

    #[test]
    fn test_scrub_paths() {
        let scratch = Path::new("/tmp/m4a-tagger/0f3a");
        assert_eq!(
            scrub_paths("ERROR: unable to open /tmp/m4a-tagger/0f3a/x.part", scratch),
            "ERROR: unable to open <scratch>/x.part"
        );
        assert_eq!(scrub_paths("network down", scratch), "network down");
    }
}
