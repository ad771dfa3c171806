pub mod select;

pub use select::select_track;

use crate::error::Result;
use crate::video::media::probe_duration;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audio file extensions accepted in the music catalog.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// One background track from the music catalog. The catalog is
/// read-only during processing; many windows may reference the same
/// track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub duration: Duration,
}

impl Track {
    /// Lowercased file stem used for keyword matching.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }
}

/// Scan a flat directory of audio files into a track catalog.
///
/// A missing directory yields an empty catalog rather than an error;
/// the pipeline degrades to music-less clips in that case. Duration
/// probing failures are tolerated since duration only informs looping.
pub fn scan_catalog(dir: &Path) -> Result<Vec<Track>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut tracks = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        let is_audio = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);

        if !path.is_file() || !is_audio {
            continue;
        }

        let duration = probe_duration(&path).unwrap_or(Duration::ZERO);
        tracks.push(Track { path, duration });
    }

    // Stable catalog order keeps seeded selection deterministic
    tracks.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(tracks)
}
