use crate::error::{ReelsmithError, Result};
use crate::music::Track;
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info};

/// Speech intervals closer than this are treated as one continuous
/// stretch of narration, so the music doesn't pump between sentences.
const MERGE_GAP: Duration = Duration::from_secs(1);

/// Volume levels for the background track.
#[derive(Debug, Clone, Copy)]
pub struct MixSettings {
    /// Background music volume, 0.0 to 1.0.
    pub music_volume: f64,
    /// Multiplier applied while speech is present, 0.0 to 1.0.
    pub duck_factor: f64,
    /// Linear ramp between gain levels.
    pub ramp: Duration,
}

/// A stretch of the clip timeline with one target background gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainSegment {
    pub start: Duration,
    pub end: Duration,
    pub level: f64,
}

/// Background-gain automation for one clip: M x K while speech is
/// present, M elsewhere, with linear ramps at each transition.
/// Narration gain is always 1.0 and is not part of the plan.
#[derive(Debug, Clone)]
pub struct GainPlan {
    segments: Vec<GainSegment>,
    ramp: Duration,
    clip_len: Duration,
}

impl GainPlan {
    pub fn build(
        speech: &[(Duration, Duration)],
        clip_len: Duration,
        settings: MixSettings,
    ) -> Self {
        let full = settings.music_volume;
        let ducked = settings.music_volume * settings.duck_factor;

        let merged = merge_intervals(speech, clip_len);

        let mut segments = Vec::new();
        let mut cursor = Duration::ZERO;

        for (start, end) in merged {
            if start > cursor {
                segments.push(GainSegment {
                    start: cursor,
                    end: start,
                    level: full,
                });
            }
            segments.push(GainSegment {
                start,
                end,
                level: ducked,
            });
            cursor = end;
        }

        if cursor < clip_len || segments.is_empty() {
            segments.push(GainSegment {
                start: cursor,
                end: clip_len,
                level: full,
            });
        }

        Self {
            segments,
            ramp: settings.ramp,
            clip_len,
        }
    }

    pub fn segments(&self) -> &[GainSegment] {
        &self.segments
    }

    /// Sample the background gain at a point in clip time. Each level
    /// transition ramps linearly over `ramp` starting at the segment
    /// boundary, clamped to the segment's own length.
    pub fn gain_at(&self, t: Duration) -> f64 {
        let t = t.min(self.clip_len);

        for (i, seg) in self.segments.iter().enumerate() {
            if t >= seg.end && !(i == self.segments.len() - 1 && t == seg.end) {
                continue;
            }

            if i > 0 && !self.ramp.is_zero() {
                let ramp_end = (seg.start + self.ramp).min(seg.end);
                if t < ramp_end {
                    let prev = self.segments[i - 1].level;
                    let progress = (t - seg.start).as_secs_f64()
                        / (ramp_end - seg.start).as_secs_f64();
                    return prev + (seg.level - prev) * progress;
                }
            }

            return seg.level;
        }

        self.segments.last().map(|s| s.level).unwrap_or(0.0)
    }

    /// Build the ffmpeg `volume` filter expression implementing this
    /// plan, evaluated per frame.
    pub fn to_volume_filter(&self) -> String {
        let mut pieces: Vec<(Duration, String)> = Vec::new();

        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 && !self.ramp.is_zero() {
                let ramp_end = (seg.start + self.ramp).min(seg.end);
                let prev = self.segments[i - 1].level;
                let ramp_secs = (ramp_end - seg.start).as_secs_f64();
                if ramp_secs > 0.0 {
                    pieces.push((
                        ramp_end,
                        format!(
                            "{:.4}+({:.4})*(t-{:.3})/{:.3}",
                            prev,
                            seg.level - prev,
                            seg.start.as_secs_f64(),
                            ramp_secs
                        ),
                    ));
                }
                if ramp_end < seg.end {
                    pieces.push((seg.end, format!("{:.4}", seg.level)));
                }
            } else {
                pieces.push((seg.end, format!("{:.4}", seg.level)));
            }
        }

        // Nest right-to-left: if(lt(t,end_0), expr_0, if(lt(t,end_1), ...))
        let mut expr = pieces
            .last()
            .map(|(_, e)| e.clone())
            .unwrap_or_else(|| "0".to_string());
        for (end, piece) in pieces.iter().rev().skip(1) {
            expr = format!("if(lt(t\\,{:.3})\\,{}\\,{})", end.as_secs_f64(), piece, expr);
        }

        format!("volume={expr}:eval=frame")
    }
}

/// Clamp speech intervals to the clip and merge any separated by less
/// than `MERGE_GAP`.
fn merge_intervals(
    speech: &[(Duration, Duration)],
    clip_len: Duration,
) -> Vec<(Duration, Duration)> {
    let mut clamped: Vec<(Duration, Duration)> = speech
        .iter()
        .map(|&(s, e)| (s.min(clip_len), e.min(clip_len)))
        .filter(|(s, e)| e > s)
        .collect();
    clamped.sort();

    let mut merged: Vec<(Duration, Duration)> = Vec::new();
    for (start, end) in clamped {
        match merged.last_mut() {
            Some((_, last_end)) if start.saturating_sub(*last_end) < MERGE_GAP => {
                *last_end = (*last_end).max(end);
            }
            _ => merged.push((start, end)),
        }
    }

    merged
}

/// How many extra times the background track must repeat to cover the
/// clip. `None` when the track duration is unknown, in which case the
/// track is looped indefinitely and cut by `-shortest`.
pub fn loop_count(track: &Track, clip_len: Duration) -> Option<u32> {
    if track.duration.is_zero() {
        return None;
    }
    if track.duration >= clip_len {
        return Some(0);
    }
    let repeats =
        (clip_len.as_secs_f64() / track.duration.as_secs_f64()).ceil() as u32;
    Some(repeats.saturating_sub(1))
}

/// Mix the background track under the clip's narration.
///
/// The music is looped or trimmed to the video duration, attenuated by
/// the gain plan, and mixed with narration at unit gain. The output's
/// audio duration always matches the video's.
pub fn mix_audio(
    video_in: &Path,
    track: &Track,
    output: &Path,
    plan: &GainPlan,
    clip_len: Duration,
) -> Result<()> {
    let loops = loop_count(track, clip_len);
    let stream_loop = match loops {
        Some(n) => n.to_string(),
        None => "-1".to_string(),
    };

    if let Some(n) = loops {
        if n > 0 {
            debug!("Looping music {} extra times to cover the clip", n);
        }
    }

    let filter = format!(
        "[1:a]{}[bg];[0:a][bg]amix=inputs=2:duration=first:normalize=0[aout]",
        plan.to_volume_filter()
    );

    info!("Mixing background music: {}", track.path.display());

    let status = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(video_in)
        .args(["-stream_loop", &stream_loop, "-i"])
        .arg(&track.path)
        .args(["-filter_complex", &filter])
        .args(["-map", "0:v", "-map", "[aout]"])
        .args(["-c:v", "copy", "-shortest"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg audio mix failed".to_string(),
        ));
    }

    Ok(())
}
