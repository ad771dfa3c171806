// SRT subtitle format
use super::CaptionCue;
use crate::error::{ReelsmithError, Result};
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Format cues as an SRT document. Indices are 1-based and sequential.
pub fn format_srt(cues: &[CaptionCue]) -> String {
    cues.iter()
        .enumerate()
        .map(|(i, cue)| {
            format!(
                "{}\n{} --> {}\n{}\n",
                i + 1,
                format_timestamp(cue.start),
                format_timestamp(cue.end),
                cue.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{2}):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2})[,.](\d{3})",
        )
        .expect("valid timing regex")
    })
}

/// Parse an SRT document into cues.
///
/// Accepts the interchange cue-block format: index line, timing line
/// (`HH:MM:SS,mmm --> HH:MM:SS,mmm`), one or more text lines, blank
/// line. The index line is optional since some tools omit it.
pub fn parse_srt(content: &str) -> Result<Vec<CaptionCue>> {
    let mut cues = Vec::new();

    for block in content.replace("\r\n", "\n").split("\n\n") {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            continue;
        }

        // Skip the index line when present
        let timing_line_idx = if timing_regex().is_match(lines[0].trim()) {
            0
        } else {
            1
        };

        let timing_line = lines.get(timing_line_idx).ok_or_else(|| {
            ReelsmithError::Subtitle(format!("Cue block missing timing line: {block:?}"))
        })?;

        let caps = timing_regex().captures(timing_line.trim()).ok_or_else(|| {
            ReelsmithError::Subtitle(format!("Malformed SRT timing line: {timing_line:?}"))
        })?;

        let field = |i: usize| -> u64 { caps[i].parse().unwrap_or(0) };
        let start = hms_to_duration(field(1), field(2), field(3), field(4));
        let end = hms_to_duration(field(5), field(6), field(7), field(8));

        let text = lines[timing_line_idx + 1..].join("\n");
        if text.is_empty() {
            continue;
        }

        cues.push(CaptionCue { start, end, text });
    }

    Ok(cues)
}

fn hms_to_duration(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Duration {
    Duration::from_millis(((hours * 60 + minutes) * 60 + seconds) * 1000 + millis)
}
