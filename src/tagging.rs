//! Container tagging
//!
//! Replaces all tags of an audio file with title, artist, year, genre and
//! an optional front cover. Textual tags must succeed; the cover is
//! best-effort and skipped (with a warning) when it cannot be read.

use crate::error::TagWriteError;
use chrono::Datelike;
use lofty::config::{ParseOptions, WriteOptions};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::{ItemKey, Tag};
use std::fs;
use std::path::Path;

/// Genre written to every file
pub const GENRE: &str = "Music";

/// Result of a successful tagging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagOutcome {
    /// Whether a cover picture was embedded
    pub cover_embedded: bool,
}

/// Tag `audio_path` in place.
///
/// `year` defaults to the current calendar year. `cover` is a path to JPEG
/// bytes; an unreadable, empty or non-JPEG cover is skipped.
///
/// The container is recognised by content, so a file relabelled to another
/// extension is still tagged in its real format. Nothing is written when the
/// container cannot be parsed. Secondary tags are removed before the new
/// primary tag is saved; if writing fails midway, the file keeps its
/// previous primary tag but may have lost secondary ones.
pub fn tag_file(
    audio_path: &Path,
    title: &str,
    artist: &str,
    year: Option<i32>,
    cover: Option<&Path>,
) -> Result<TagOutcome, TagWriteError> {
    log::info!("Writing tags: {} - {}", artist, title);

    // Parse first so a corrupt container is rejected before anything is written
    let tagged_file = Probe::open(audio_path)
        .map_err(TagWriteError::Open)?
        .options(ParseOptions::new().read_properties(false))
        .guess_file_type()
        .map_err(|e| TagWriteError::Open(e.into()))?
        .read()
        .map_err(TagWriteError::Open)?;

    let file_type = tagged_file.file_type();
    let tag_type = file_type.primary_tag_type();
    let year = year.unwrap_or_else(|| chrono::Local::now().year());

    let mut tag = Tag::new(tag_type);
    tag.set_title(title.to_string());
    tag.set_artist(artist.to_string());
    tag.set_genre(GENRE.to_string());
    if !tag.insert_text(ItemKey::RecordingDate, format!("{:04}", year)) {
        return Err(TagWriteError::Unsupported(format!("{:?} year", tag_type)));
    }

    let picture = cover.and_then(load_cover);
    let cover_embedded = picture.is_some();
    if let Some(picture) = picture {
        tag.push_picture(picture);
    }

    for existing in tagged_file.tags() {
        let existing_type = existing.tag_type();
        if existing_type != tag_type {
            log::debug!("Removing {:?} tag", existing_type);
            existing_type
                .remove_from_path(audio_path)
                .map_err(TagWriteError::Save)?;
        }
    }

    // Writing the primary tag replaces it wholesale
    tag.save_to_path(audio_path, WriteOptions::default())
        .map_err(TagWriteError::Save)?;

    if cover_embedded {
        log::info!("Tags written with cover art");
    } else {
        log::info!("Tags written without cover art");
    }
    Ok(TagOutcome { cover_embedded })
}

/// Read the cover JPEG for embedding, or None if it is unusable
fn load_cover(path: &Path) -> Option<Picture> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to read cover image, skipping artwork: {}", e);
            return None;
        }
    };

    if data.is_empty() {
        log::warn!("Cover image is empty, skipping artwork");
        return None;
    }
    if !data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        log::warn!("Cover image is not a JPEG, skipping artwork");
        return None;
    }

    log::debug!("Embedding cover ({} bytes)", data.len());
    Some(Picture::new_unchecked(
        PictureType::CoverFront,
        Some(MimeType::Jpeg),
        None,
        data,
    ))
}
