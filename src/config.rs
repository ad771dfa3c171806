use crate::error::{ReelsmithError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Pipeline configuration.
///
/// Loaded from `~/.config/reelsmith/config.toml` when present, then
/// overridden by environment variables. Values the CLI exposes as flags
/// are applied on top of this by `main`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of each output clip in seconds.
    pub clip_duration_secs: u64,
    /// Output canvas width in pixels (portrait).
    pub output_width: u32,
    /// Output canvas height in pixels (portrait).
    pub output_height: u32,
    /// Background music volume, 0.0 to 1.0.
    pub music_volume: f64,
    /// Multiplier applied to music volume while speech is present, 0.0 to 1.0.
    pub duck_factor: f64,
    /// Linear ramp between gain levels, in milliseconds.
    pub duck_ramp_ms: u64,
    /// Maximum characters per caption cue before splitting.
    pub max_chars_per_cue: usize,
    /// Speaking rates at or below this are "slow" (words per minute).
    pub slow_wpm_max: f64,
    /// Speaking rates at or above this are "fast" (words per minute).
    pub fast_wpm_min: f64,
    /// Flat directory of background music files.
    pub music_dir: PathBuf,
    /// OpenAI API key for live transcription.
    pub openai_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clip_duration_secs: 600,
            output_width: 1080,
            output_height: 1920,
            music_volume: 0.2,
            duck_factor: 0.3,
            duck_ramp_ms: 100,
            max_chars_per_cue: 42,
            slow_wpm_max: 120.0,
            fast_wpm_min: 160.0,
            music_dir: PathBuf::from("music"),
            openai_api_key: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(secs) = std::env::var("REELSMITH_CLIP_DURATION") {
            if let Ok(s) = secs.parse() {
                config.clip_duration_secs = s;
            }
        }
        if let Ok(dir) = std::env::var("REELSMITH_MUSIC_DIR") {
            config.music_dir = PathBuf::from(dir);
        }
        if let Ok(vol) = std::env::var("REELSMITH_MUSIC_VOLUME") {
            if let Ok(v) = vol.parse() {
                config.music_volume = v;
            }
        }
        if let Ok(duck) = std::env::var("REELSMITH_DUCK_FACTOR") {
            if let Ok(d) = duck.parse() {
                config.duck_factor = d;
            }
        }

        Ok(config)
    }

    /// Validate the configuration. Failures here are fatal and abort the
    /// run before any window is processed.
    pub fn validate(&self) -> Result<()> {
        if self.clip_duration_secs == 0 {
            return Err(ReelsmithError::InvalidConfiguration(
                "Clip duration must be greater than 0".to_string(),
            ));
        }

        if self.output_width == 0 || self.output_height == 0 {
            return Err(ReelsmithError::InvalidConfiguration(
                "Output dimensions must be greater than 0".to_string(),
            ));
        }

        if self.output_width >= self.output_height {
            return Err(ReelsmithError::InvalidConfiguration(format!(
                "Output canvas must be portrait, got {}x{}",
                self.output_width, self.output_height
            )));
        }

        if !(0.0..=1.0).contains(&self.music_volume) {
            return Err(ReelsmithError::InvalidConfiguration(
                "Music volume must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.duck_factor) {
            return Err(ReelsmithError::InvalidConfiguration(
                "Duck factor must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.slow_wpm_max >= self.fast_wpm_min {
            return Err(ReelsmithError::InvalidConfiguration(format!(
                "Tempo thresholds must be ordered: slow_wpm_max ({}) < fast_wpm_min ({})",
                self.slow_wpm_max, self.fast_wpm_min
            )));
        }

        if self.max_chars_per_cue == 0 {
            return Err(ReelsmithError::InvalidConfiguration(
                "Max characters per cue must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn clip_duration(&self) -> Duration {
        Duration::from_secs(self.clip_duration_secs)
    }

    pub fn duck_ramp(&self) -> Duration {
        Duration::from_millis(self.duck_ramp_ms)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reelsmith").join("config.toml"))
    }
}
