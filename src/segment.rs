use crate::error::{ReelsmithError, Result};
use crate::transcript::{Transcript, Utterance};
use std::time::Duration;

/// A fixed-duration time slice of the source recording that becomes one
/// output clip. Windows partition the source timeline with no gaps and
/// no overlaps; only the final window may be shorter than the
/// configured length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
}

impl Window {
    pub fn length(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    /// Zero-padded label used for output file naming, e.g. `reel_01`.
    pub fn label(&self) -> String {
        format!("reel_{:02}", self.index + 1)
    }
}

/// The ordered subsequence of utterances intersecting one window, with
/// times re-based to window-relative zero. Owned by the window that
/// created it and discarded once the window's clip is produced.
#[derive(Debug, Clone)]
pub struct TranscriptSlice {
    pub window: Window,
    pub utterances: Vec<Utterance>,
}

impl TranscriptSlice {
    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.utterances.iter().map(|u| u.word_count()).sum()
    }

    /// Concatenated text of all utterances in the slice.
    pub fn full_text(&self) -> String {
        self.utterances
            .iter()
            .map(|u| u.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Span from the first utterance start to the last utterance end.
    pub fn speech_duration(&self) -> Duration {
        match (self.utterances.first(), self.utterances.last()) {
            (Some(first), Some(last)) => last.end.saturating_sub(first.start),
            _ => Duration::ZERO,
        }
    }

    /// Window-relative (start, end) intervals where speech is present,
    /// used to drive music ducking.
    pub fn speech_intervals(&self) -> Vec<(Duration, Duration)> {
        self.utterances.iter().map(|u| (u.start, u.end)).collect()
    }
}

/// Divide the source timeline into windows of `len`, the last one
/// covering whatever remains.
pub fn plan_windows(total: Duration, len: Duration) -> Result<Vec<Window>> {
    if len.is_zero() {
        return Err(ReelsmithError::InvalidConfiguration(
            "Window length must be greater than 0".to_string(),
        ));
    }
    if total.is_zero() {
        return Err(ReelsmithError::InvalidConfiguration(
            "Source duration must be greater than 0".to_string(),
        ));
    }

    // Nanosecond arithmetic: truncating to a coarser unit would turn a
    // sub-millisecond length into zero
    let total_ns = total.as_nanos();
    let len_ns = len.as_nanos();
    let count = total_ns.div_ceil(len_ns);

    let windows = (0..count)
        .map(|i| Window {
            index: i as usize,
            start: duration_from_nanos(i * len_ns),
            end: duration_from_nanos(((i + 1) * len_ns).min(total_ns)),
        })
        .collect();

    Ok(windows)
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

fn duration_from_nanos(ns: u128) -> Duration {
    Duration::new((ns / NANOS_PER_SEC) as u64, (ns % NANOS_PER_SEC) as u32)
}

/// Slice the transcript to one window.
///
/// An utterance belongs to the window if its interval overlaps the
/// window's interval. An utterance straddling a boundary is clipped to
/// the window rather than re-emitted whole, so adjacent clips never
/// carry duplicate captions.
pub fn slice_transcript(transcript: &Transcript, window: &Window) -> TranscriptSlice {
    let utterances = transcript
        .utterances
        .iter()
        .filter(|u| u.end > window.start && u.start < window.end)
        .map(|u| Utterance {
            start: u.start.max(window.start) - window.start,
            end: u.end.min(window.end) - window.start,
            text: u.text.clone(),
        })
        .collect();

    TranscriptSlice {
        window: *window,
        utterances,
    }
}
