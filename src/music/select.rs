use super::Track;
use crate::error::{ReelsmithError, Result};
use crate::prosody::{Mood, ProsodyProfile, Tempo};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Filename keywords that mark a track as matching a mood.
fn mood_keywords(mood: Mood) -> &'static [&'static str] {
    match mood {
        Mood::Happy => &["happy", "upbeat", "cheerful", "bright"],
        Mood::Sad => &["sad", "melancholy", "somber", "minor"],
        Mood::Energetic => &["energetic", "epic", "drive", "power", "rock"],
        Mood::Calm => &["calm", "ambient", "chill", "mellow", "acoustic"],
        Mood::Neutral => &[],
    }
}

/// Filename keywords that mark a track as matching a tempo.
fn tempo_keywords(tempo: Tempo) -> &'static [&'static str] {
    match tempo {
        Tempo::Slow => &["slow", "downtempo"],
        Tempo::Medium => &["mid", "medium"],
        Tempo::Fast => &["fast", "uptempo", "quick"],
    }
}

fn matches_any(stem: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| stem.contains(k))
}

/// Select one background track for a prosody profile.
///
/// Tracks whose filenames match the profile's mood keywords form the
/// candidate set, narrowed by tempo keywords when that narrowing is
/// non-empty. A profile with no matching tracks falls back to the full
/// catalog. Selection within the candidates is uniform-random from the
/// injected rng, which keeps a seeded run deterministic. There is no
/// persistent preference state.
pub fn select_track<'a, R: Rng + ?Sized>(
    profile: &ProsodyProfile,
    catalog: &'a [Track],
    rng: &mut R,
) -> Result<&'a Track> {
    if catalog.is_empty() {
        return Err(ReelsmithError::NoMusicAvailable(
            "Music catalog is empty".to_string(),
        ));
    }

    let mood_matches: Vec<&Track> = catalog
        .iter()
        .filter(|t| matches_any(&t.stem(), mood_keywords(profile.mood)))
        .collect();

    let candidates: Vec<&Track> = if mood_matches.is_empty() {
        catalog.iter().collect()
    } else {
        let narrowed: Vec<&Track> = mood_matches
            .iter()
            .copied()
            .filter(|t| matches_any(&t.stem(), tempo_keywords(profile.tempo)))
            .collect();
        if narrowed.is_empty() {
            mood_matches
        } else {
            narrowed
        }
    };

    let track = candidates.choose(rng).copied().ok_or_else(|| {
        ReelsmithError::NoMusicAvailable("No candidate tracks".to_string())
    })?;

    debug!(
        "Selected track {:?} for mood={} tempo={} ({} candidates)",
        track.path,
        profile.mood,
        profile.tempo,
        candidates.len()
    );

    Ok(track)
}
