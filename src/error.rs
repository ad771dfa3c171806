use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReelsmithError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Transcription unavailable: {0}")]
    TranscriptionUnavailable(String),

    #[error("No music available: {0}")]
    NoMusicAvailable(String),

    #[error("Assembly failed: {0}")]
    Assembly(String),

    #[error("Media probe failed: {0}")]
    MediaProbe(String),

    #[error("Subtitle error: {0}")]
    Subtitle(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReelsmithError {
    /// Whether this error aborts the run rather than degrading a single window.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ReelsmithError::InvalidConfiguration(_) | ReelsmithError::FileNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReelsmithError>;
