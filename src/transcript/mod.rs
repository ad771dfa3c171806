pub mod source;

pub use source::{SrtFileSource, TranscriptSource, WhisperApiSource};

use std::time::Duration;

/// A single time-aligned utterance from the source recording.
///
/// Utterances are produced once by the transcription source and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

impl Utterance {
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Time-aligned utterances covering the whole source recording.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    pub utterances: Vec<Utterance>,
}

impl Transcript {
    pub fn new(utterances: Vec<Utterance>) -> Self {
        Self { utterances }
    }

    /// An empty transcript, used when transcription is unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utterance_duration() {
        let u = Utterance {
            start: Duration::from_millis(1500),
            end: Duration::from_millis(4000),
            text: "Hello world".to_string(),
        };
        assert_eq!(u.duration(), Duration::from_millis(2500));
        assert_eq!(u.word_count(), 2);
    }

    #[test]
    fn test_utterance_duration_saturates() {
        let u = Utterance {
            start: Duration::from_secs(5),
            end: Duration::from_secs(3),
            text: String::new(),
        };
        assert_eq!(u.duration(), Duration::ZERO);
    }

    #[test]
    fn test_empty_transcript() {
        let t = Transcript::empty();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
    }
}
