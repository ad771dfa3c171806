use crate::segment::TranscriptSlice;
use serde::{Deserialize, Serialize};

/// Closed set of moods a transcript slice can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Energetic,
    Calm,
    Neutral,
}

impl Mood {
    /// Tie-break priority when lexical scores are equal. Lower wins.
    fn priority(&self) -> u8 {
        match self {
            Mood::Energetic => 0,
            Mood::Happy => 1,
            Mood::Sad => 2,
            Mood::Calm => 3,
            Mood::Neutral => 4,
        }
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mood::Happy => write!(f, "happy"),
            Mood::Sad => write!(f, "sad"),
            Mood::Energetic => write!(f, "energetic"),
            Mood::Calm => write!(f, "calm"),
            Mood::Neutral => write!(f, "neutral"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tempo {
    Slow,
    Medium,
    Fast,
}

impl std::fmt::Display for Tempo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tempo::Slow => write!(f, "slow"),
            Tempo::Medium => write!(f, "medium"),
            Tempo::Fast => write!(f, "fast"),
        }
    }
}

/// Mood and tempo derived from one transcript slice. Not persisted
/// beyond the window's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProsodyProfile {
    pub mood: Mood,
    pub tempo: Tempo,
}

impl ProsodyProfile {
    /// The profile used when no transcript is available.
    pub fn neutral() -> Self {
        Self {
            mood: Mood::Neutral,
            tempo: Tempo::Medium,
        }
    }
}

/// Scores slice text against each mood. Implementations must be pure so
/// the analyzer stays deterministic; alternative classifiers can be
/// substituted without touching the pipeline.
pub trait MoodScorer: Send + Sync {
    fn score(&self, text: &str) -> Vec<(Mood, u32)>;
}

/// Default lexical scorer: counts keyword occurrences per mood in the
/// lowercased text.
pub struct KeywordScorer;

const HAPPY_WORDS: &[&str] = &[
    "happy", "joy", "laugh", "fun", "exciting", "amazing", "great", "love", "smile",
];
const SAD_WORDS: &[&str] = &[
    "sad", "cry", "tragic", "depressing", "sorry", "apology", "unfortunate", "regret",
];
const ENERGETIC_WORDS: &[&str] = &[
    "energy", "fast", "quick", "rush", "action", "dynamic", "power", "intense", "dramatic",
];
const CALM_WORDS: &[&str] = &[
    "calm", "peaceful", "quiet", "relax", "gentle", "soothing", "slow",
];

impl MoodScorer for KeywordScorer {
    fn score(&self, text: &str) -> Vec<(Mood, u32)> {
        let lower = text.to_lowercase();
        let count = |words: &[&str]| -> u32 {
            words
                .iter()
                .map(|w| lower.matches(w).count() as u32)
                .sum()
        };

        vec![
            (Mood::Happy, count(HAPPY_WORDS)),
            (Mood::Sad, count(SAD_WORDS)),
            (Mood::Energetic, count(ENERGETIC_WORDS)),
            (Mood::Calm, count(CALM_WORDS)),
        ]
    }
}

/// Word-per-minute boundaries for the tempo buckets.
#[derive(Debug, Clone, Copy)]
pub struct TempoThresholds {
    pub slow_wpm_max: f64,
    pub fast_wpm_min: f64,
}

impl Default for TempoThresholds {
    fn default() -> Self {
        Self {
            slow_wpm_max: 120.0,
            fast_wpm_min: 160.0,
        }
    }
}

/// Derive a prosody profile from a transcript slice.
///
/// A slice with zero words or zero speech duration yields
/// `{neutral, medium}` so a silent window still gets a playable result.
pub fn analyze(
    slice: &TranscriptSlice,
    scorer: &dyn MoodScorer,
    thresholds: TempoThresholds,
) -> ProsodyProfile {
    let words = slice.word_count();
    let speech_secs = slice.speech_duration().as_secs_f64();

    if words == 0 || speech_secs <= 0.0 {
        return ProsodyProfile::neutral();
    }

    let mood = classify_mood(&slice.full_text(), scorer);
    let wpm = (words as f64 / speech_secs) * 60.0;
    let tempo = classify_tempo(wpm, thresholds);

    ProsodyProfile { mood, tempo }
}

fn classify_mood(text: &str, scorer: &dyn MoodScorer) -> Mood {
    let scores = scorer.score(text);

    let best = scores
        .iter()
        .filter(|(_, score)| *score > 0)
        .max_by(|(a_mood, a), (b_mood, b)| {
            // Highest score wins; equal scores fall back to the fixed
            // mood priority (energetic > happy > sad > calm > neutral)
            a.cmp(b)
                .then_with(|| b_mood.priority().cmp(&a_mood.priority()))
        });

    match best {
        Some((mood, _)) => *mood,
        None => Mood::Neutral,
    }
}

fn classify_tempo(wpm: f64, thresholds: TempoThresholds) -> Tempo {
    if wpm < thresholds.slow_wpm_max {
        Tempo::Slow
    } else if wpm > thresholds.fast_wpm_min {
        Tempo::Fast
    } else {
        Tempo::Medium
    }
}
