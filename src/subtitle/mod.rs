pub mod srt;

pub use srt::{format_srt, parse_srt};

use crate::segment::TranscriptSlice;
use std::time::Duration;

/// A single timed caption in window-relative time.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionCue {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// Convert a transcript slice into caption cues.
///
/// Cue times are clamped to the window length. An utterance longer than
/// `max_chars` is split at word boundaries; each piece receives a time
/// sub-interval proportional to its character share of the utterance,
/// which keeps the reading pace roughly constant regardless of word
/// length.
pub fn render_cues(slice: &TranscriptSlice, max_chars: usize) -> Vec<CaptionCue> {
    let clip_len = slice.window.length();
    let mut cues = Vec::new();

    for utterance in &slice.utterances {
        let text = utterance.text.trim();
        if text.is_empty() {
            continue;
        }

        let start = utterance.start.min(clip_len);
        let end = utterance.end.min(clip_len);

        let mut pieces = split_at_words(text, max_chars);
        if pieces.len() == 1 {
            if let Some(text) = pieces.pop() {
                cues.push(CaptionCue { start, end, text });
            }
            continue;
        }

        let total_duration = end.saturating_sub(start);
        let total_chars: usize = pieces.iter().map(|p| p.chars().count()).sum();
        let num_pieces = pieces.len();
        let mut current_start = start;

        for (i, piece) in pieces.into_iter().enumerate() {
            let share = piece.chars().count() as f64 / total_chars.max(1) as f64;
            let piece_end = if i == num_pieces - 1 {
                end // last piece gets the exact end time
            } else {
                current_start + Duration::from_secs_f64(total_duration.as_secs_f64() * share)
            };

            cues.push(CaptionCue {
                start: current_start,
                end: piece_end,
                text: piece,
            });

            current_start = piece_end;
        }
    }

    cues
}

/// Split text into pieces of at most `max_chars` characters at word
/// boundaries. A single word longer than the limit stays whole.
fn split_at_words(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.chars().count() + 1 + word.chars().count() <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            pieces.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
