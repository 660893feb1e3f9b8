//! Optional transcoder (ffmpeg) discovery
//!
//! Probed once at startup; the result only decides how the acquisition
//! backend asks for audio.

use std::path::{Path, PathBuf};

/// Well-known install locations checked after `$PATH`
const KNOWN_LOCATIONS: &[&str] = &[
    "/usr/bin/ffmpeg",
    "/usr/local/bin/ffmpeg",
    "/bin/ffmpeg",
    "/root/.nix-profile/bin/ffmpeg",
    "/nix/var/nix/profiles/default/bin/ffmpeg",
    "/opt/homebrew/bin/ffmpeg",
];

/// Whether a transcoder is usable, and how to invoke it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TranscoderCapability {
    pub available: bool,
    pub invocation_path: Option<PathBuf>,
}

impl TranscoderCapability {
    /// Capability for a known binary
    pub fn at(path: PathBuf) -> Self {
        Self {
            available: true,
            invocation_path: Some(path),
        }
    }

    /// No transcoder
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// Look for an executable `ffmpeg` on `$PATH`, then in well-known locations
pub fn probe_transcoder() -> TranscoderCapability {
    let binary = binary_name();
    let on_path = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|dir| dir.join(binary));

    let known = KNOWN_LOCATIONS.iter().map(PathBuf::from);

    match on_path.chain(known).find(|p| is_executable(p)) {
        Some(path) => {
            log::info!("Transcoder found: {}", path.display());
            TranscoderCapability::at(path)
        }
        None => {
            log::warn!("No transcoder found; audio will be downloaded as-is");
            TranscoderCapability::unavailable()
        }
    }
}

fn binary_name() -> &'static str {
    if cfg!(windows) {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_is_consistent() {
        let capability = probe_transcoder();
        assert_eq!(capability.available, capability.invocation_path.is_some());
        if let Some(path) = capability.invocation_path {
            assert!(is_executable(&path));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_executable_file_is_ignored() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ffmpeg");
        std::fs::write(&path, b"#!/bin/sh\n").unwrap();
        assert!(!is_executable(&path));
        assert!(!is_executable(dir.path()));
    }
}
