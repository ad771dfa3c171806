use crate::config::Config;
use crate::error::{ReelsmithError, Result};
use crate::mix::{mix_audio, GainPlan, MixSettings};
use crate::music::{select_track, Track};
use crate::prosody::{analyze, MoodScorer, ProsodyProfile, TempoThresholds};
use crate::segment::{TranscriptSlice, Window};
use crate::subtitle::{format_srt, render_cues};
use crate::video::{
    burn_subtitles, cut_segment, probe_dimensions, reformat_portrait, FramePlacement,
};
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{info, warn};

/// A finished clip written to the output directory. Terminal artifact;
/// never mutated after it is written.
#[derive(Debug, Clone)]
pub struct Clip {
    pub window: Window,
    pub video_path: PathBuf,
    pub has_subtitles: bool,
    pub has_music: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStatus {
    /// Full result: video, subtitles and music.
    Success,
    /// A clip was produced but some step fell back to a safe default.
    Degraded,
    /// No clip was produced for this window.
    Failed,
}

impl std::fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowStatus::Success => write!(f, "success"),
            WindowStatus::Degraded => write!(f, "degraded"),
            WindowStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Per-window result. Failures never cross the window boundary; they
/// are recorded here and the run moves on.
#[derive(Debug)]
pub struct WindowReport {
    pub window: Window,
    pub profile: ProsodyProfile,
    pub track: Option<PathBuf>,
    pub clip: Option<Clip>,
    pub degradations: Vec<String>,
    pub failure: Option<String>,
}

impl WindowReport {
    pub fn status(&self) -> WindowStatus {
        if self.failure.is_some() {
            WindowStatus::Failed
        } else if self.degradations.is_empty() {
            WindowStatus::Success
        } else {
            WindowStatus::Degraded
        }
    }
}

/// Assembles one clip per window from the source video.
pub struct Assembler<'a> {
    pub source: &'a Path,
    pub output_dir: &'a Path,
    pub config: &'a Config,
    pub catalog: &'a [Track],
    pub scorer: &'a dyn MoodScorer,
    pub music_enabled: bool,
    pub subtitles_enabled: bool,
}

impl Assembler<'_> {
    /// Produce the clip for one window.
    ///
    /// All intermediate files live in a temp workspace scoped to this
    /// call; the workspace is removed on every exit path. Mood, track
    /// and subtitle problems degrade the window; encode and mux
    /// problems fail it. Neither aborts the run.
    pub fn assemble_window<R: Rng + ?Sized>(
        &self,
        slice: &TranscriptSlice,
        rng: &mut R,
    ) -> WindowReport {
        let window = slice.window;
        let mut report = WindowReport {
            window,
            profile: ProsodyProfile::neutral(),
            track: None,
            clip: None,
            degradations: Vec::new(),
            failure: None,
        };

        let thresholds = TempoThresholds {
            slow_wpm_max: self.config.slow_wpm_max,
            fast_wpm_min: self.config.fast_wpm_min,
        };
        report.profile = analyze(slice, self.scorer, thresholds);

        let track = if self.music_enabled {
            match select_track(&report.profile, self.catalog, rng) {
                Ok(track) => {
                    report.track = Some(track.path.clone());
                    Some(track.clone())
                }
                Err(e) => {
                    warn!("{}: no music: {}", window.label(), e);
                    report.degradations.push(format!("no music: {e}"));
                    None
                }
            }
        } else {
            None
        };

        match self.build_clip(slice, track.as_ref(), &mut report) {
            Ok(clip) => {
                info!("{}: wrote {}", window.label(), clip.video_path.display());
                report.clip = Some(clip);
            }
            Err(e) => {
                warn!("{}: assembly failed: {}", window.label(), e);
                report.failure = Some(e.to_string());
            }
        }

        report
    }

    fn build_clip(
        &self,
        slice: &TranscriptSlice,
        track: Option<&Track>,
        report: &mut WindowReport,
    ) -> Result<Clip> {
        let window = slice.window;
        let workspace = TempDir::new().map_err(|e| {
            ReelsmithError::Assembly(format!("Failed to create temp workspace: {e}"))
        })?;
        let work = workspace.path();

        // Cut the window's segment out of the source
        let raw = work.join("segment.mp4");
        cut_segment(self.source, &raw, window.start, window.length())?;

        // Place it on the vertical canvas
        let (src_w, src_h) = probe_dimensions(&raw)?;
        let placement = FramePlacement::compute(
            src_w,
            src_h,
            self.config.output_width,
            self.config.output_height,
        )?;
        let portrait = work.join("portrait.mp4");
        reformat_portrait(&raw, &portrait, &placement)?;

        // Burn subtitles; failure falls back to the unsubtitled video
        let mut current = portrait;
        let mut has_subtitles = false;

        if self.subtitles_enabled {
            let cues = render_cues(slice, self.config.max_chars_per_cue);
            if cues.is_empty() {
                report
                    .degradations
                    .push("no subtitles: no speech in window".to_string());
            } else {
                let srt_path = work.join("captions.srt");
                let subtitled = work.join("subtitled.mp4");
                let result = fs::write(&srt_path, format_srt(&cues))
                    .map_err(ReelsmithError::from)
                    .and_then(|_| burn_subtitles(&current, &srt_path, &subtitled));

                match result {
                    Ok(()) => {
                        current = subtitled;
                        has_subtitles = true;
                    }
                    Err(e) => {
                        warn!("{}: subtitle burn-in failed: {}", window.label(), e);
                        report.degradations.push(format!("no subtitles: {e}"));
                    }
                }
            }
        } else {
            report
                .degradations
                .push("no subtitles: disabled".to_string());
        }

        // Mix background music; failure falls back to narration only
        let mut has_music = false;
        if let Some(track) = track {
            let settings = MixSettings {
                music_volume: self.config.music_volume,
                duck_factor: self.config.duck_factor,
                ramp: self.config.duck_ramp(),
            };
            let plan = GainPlan::build(&slice.speech_intervals(), window.length(), settings);
            let mixed = work.join("mixed.mp4");

            match mix_audio(&current, track, &mixed, &plan, window.length()) {
                Ok(()) => {
                    current = mixed;
                    has_music = true;
                }
                Err(e) => {
                    warn!("{}: music mix failed: {}", window.label(), e);
                    report.degradations.push(format!("no music: {e}"));
                }
            }
        } else if !self.music_enabled {
            // A missing track with music enabled was already recorded
            // as a degradation when selection failed
            report.degradations.push("no music: disabled".to_string());
        }

        // Move the result out of the workspace before it is dropped
        let output_path = self.output_dir.join(format!("{}.mp4", window.label()));
        fs::copy(&current, &output_path).map_err(|e| {
            ReelsmithError::Assembly(format!(
                "Failed to write {}: {e}",
                output_path.display()
            ))
        })?;

        Ok(Clip {
            window,
            video_path: output_path,
            has_subtitles,
            has_music,
        })
    }
}
