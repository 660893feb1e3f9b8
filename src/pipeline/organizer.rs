//! Scratch and output directory handling

use crate::model::Attribution;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Characters that are replaced in output file names
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest sanitized artist or title component, in bytes
const MAX_COMPONENT_BYTES: usize = 120;

/// Extensions recognised as staged thumbnails
const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Per-run scratch directory, removed when dropped
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Create a fresh, uniquely named directory under `work_root`
    pub fn create(work_root: &Path) -> io::Result<Self> {
        fs::create_dir_all(work_root)?;
        let path = work_root.join(uuid::Uuid::new_v4().simple().to_string());
        fs::create_dir(&path)?;
        log::debug!("Scratch directory created: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory. Removing an already removed directory is fine.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Locate the staged audio file.
    ///
    /// A file with `target` extension wins. Otherwise the first file with a
    /// `fallbacks` extension is renamed to the target extension; the bytes
    /// are not converted. Returns the path and the original extension if a
    /// relabel happened.
    pub fn find_audio(
        &self,
        target: &str,
        fallbacks: &[String],
    ) -> io::Result<Option<(PathBuf, Option<String>)>> {
        let files = self.files()?;

        if let Some(path) = files.iter().find(|p| has_extension(p, target)) {
            return Ok(Some((path.clone(), None)));
        }

        for fallback in fallbacks {
            if let Some(path) = files.iter().find(|p| has_extension(p, fallback)) {
                let relabelled = path.with_extension(target);
                fs::rename(path, &relabelled)?;
                log::warn!(
                    "No .{} file produced; using .{} file labelled as .{} (not transcoded)",
                    target,
                    fallback,
                    target
                );
                return Ok(Some((relabelled, Some(fallback.clone()))));
            }
        }

        Ok(None)
    }

    /// Locate a thumbnail staged by the acquisition step
    pub fn find_thumbnail(&self) -> io::Result<Option<PathBuf>> {
        Ok(self.files()?.into_iter().find(|p| {
            THUMBNAIL_EXTENSIONS.iter().any(|ext| has_extension(p, ext))
        }))
    }

    /// Regular files directly inside the directory, sorted by name
    fn files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.path).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match self.remove() {
            Ok(()) => log::debug!("Scratch directory removed: {}", self.path.display()),
            Err(e) => log::warn!("Failed to remove scratch directory {}: {}", self.path.display(), e),
        }
    }
}

/// Manages the durable output directory
#[derive(Debug, Clone)]
pub struct OutputOrganizer {
    output_dir: PathBuf,
}

impl OutputOrganizer {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `"<artist>-<title>.<ext>"` with both components sanitized
    pub fn file_name(&self, attribution: &Attribution, extension: &str) -> String {
        format!(
            "{}-{}.{}",
            sanitize_component(&attribution.artist),
            sanitize_component(&attribution.title),
            extension
        )
    }

    /// Move a finished file into the output directory under `file_name`.
    ///
    /// A plain rename is tried first. Across filesystems the file is copied
    /// to a hidden temporary name in the output directory and renamed from
    /// there, so readers never see a partial file. An existing file with
    /// the same name is replaced.
    pub fn publish(&self, source: &Path, file_name: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let dest = self.output_dir.join(file_name);

        if fs::rename(source, &dest).is_ok() {
            log::info!("Moved to output: {}", file_name);
            return Ok(dest);
        }

        let partial = self
            .output_dir
            .join(format!(".{}.partial", uuid::Uuid::new_v4().simple()));
        if let Err(e) = fs::copy(source, &partial).and_then(|_| fs::rename(&partial, &dest)) {
            let _ = fs::remove_file(&partial);
            return Err(e);
        }
        fs::remove_file(source)?;

        log::info!("Copied to output: {}", file_name);
        Ok(dest)
    }

    /// Delete output files last modified more than `max_age` ago.
    /// Returns the number of files deleted.
    pub fn prune(&self, max_age: Duration) -> Result<usize> {
        if !self.output_dir.exists() {
            return Ok(0);
        }
        let cutoff = SystemTime::now()
            .checked_sub(max_age)
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let mut deleted = 0;
        for entry in WalkDir::new(&self.output_dir).min_depth(1).max_depth(1) {
            let entry = entry.context("Failed to list output directory")?;
            if !entry.file_type().is_file() {
                continue;
            }
            let modified = entry
                .metadata()
                .context("Failed to read file metadata")?
                .modified()?;
            if modified > cutoff {
                continue;
            }

            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    deleted += 1;
                    log::info!("Deleted old file: {}", entry.file_name().to_string_lossy());
                }
                Err(e) => log::warn!(
                    "Failed to delete {}: {}",
                    entry.file_name().to_string_lossy(),
                    e
                ),
            }
        }
        Ok(deleted)
    }
}

/// Make one file name component safe.
///
/// `< > : " / \ | ? *`, whitespace and control characters become `_`, and
/// the result is cut to a bounded length on a character boundary.
pub fn sanitize_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        let c = if ILLEGAL_FILENAME_CHARS.contains(&c) || c.is_whitespace() || c.is_control() {
            '_'
        } else {
            c
        };
        if out.len() + c.len_utf8() > MAX_COMPONENT_BYTES {
            break;
        }
        out.push(c);
    }
    out
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
