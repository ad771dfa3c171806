use crate::error::{ReelsmithError, Result};
use crate::subtitle::parse_srt;
use crate::transcript::{Transcript, Utterance};
use crate::video::media::{extract_audio_segment, probe_duration};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, warn};

/// OpenAI Whisper API endpoint.
const WHISPER_API_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Maximum file size for the Whisper API (25 MB).
const MAX_FILE_SIZE: usize = 25 * 1024 * 1024;

/// Chunk length for audio that exceeds the API size limit. 10 minutes
/// of 16 kHz mono 16-bit WAV is ~19.2 MB, comfortably under the cap.
const MAX_CHUNK_DURATION: Duration = Duration::from_secs(600);

/// Maximum retries for API calls.
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (milliseconds).
const BASE_DELAY_MS: u64 = 1000;

/// Provides the time-aligned utterance sequence for a source recording,
/// either from a live transcription call or a pre-supplied subtitle
/// file.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<Transcript>;
    fn name(&self) -> &'static str;
}

/// Transcript source backed by a pre-supplied SRT file. The audio path
/// argument is ignored.
pub struct SrtFileSource {
    path: PathBuf,
}

impl SrtFileSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TranscriptSource for SrtFileSource {
    async fn transcribe(&self, _audio: &Path) -> Result<Transcript> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            ReelsmithError::TranscriptionUnavailable(format!(
                "Failed to read subtitle file {}: {e}",
                self.path.display()
            ))
        })?;

        let cues = parse_srt(&content).map_err(|e| {
            ReelsmithError::TranscriptionUnavailable(format!(
                "Failed to parse subtitle file {}: {e}",
                self.path.display()
            ))
        })?;

        let utterances = cues
            .into_iter()
            .map(|cue| Utterance {
                start: cue.start,
                end: cue.end,
                text: cue.text,
            })
            .collect();

        Ok(Transcript::new(utterances))
    }

    fn name(&self) -> &'static str {
        "SRT file"
    }
}

/// OpenAI Whisper API transcript source.
pub struct WhisperApiSource {
    client: reqwest::Client,
    api_key: String,
    language: Option<String>,
}

impl WhisperApiSource {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            language: None,
        }
    }

    /// Set the source language (ISO 639-1 code).
    pub fn with_language(mut self, language: String) -> Self {
        self.language = Some(language);
        self
    }

    /// Build the multipart form for the API request.
    async fn build_form(&self, audio_path: &Path) -> Result<Form> {
        let file_bytes = fs::read(audio_path).await?;
        let file_name = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let mime_type = match audio_path.extension().and_then(|e| e.to_str()) {
            Some("wav") => "audio/wav",
            Some("mp3") => "audio/mpeg",
            Some("m4a") => "audio/mp4",
            Some("flac") => "audio/flac",
            Some("ogg") => "audio/ogg",
            _ => "application/octet-stream",
        };

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str(mime_type)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", "whisper-1")
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");

        if let Some(ref lang) = self.language {
            form = form.text("language", lang.clone());
        }

        Ok(form)
    }

    /// Make the API request (form is consumed, so no retries at this level).
    async fn call_api(&self, form: Form) -> Result<WhisperResponse> {
        let response = self
            .client
            .post(WHISPER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!("Whisper API response status: {}", status);

        if status.is_success() {
            let body = response.text().await?;
            let parsed: WhisperResponse = serde_json::from_str(&body)?;
            return Ok(parsed);
        }

        let error_body = response.text().await.unwrap_or_default();

        if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&error_body) {
            return Err(ReelsmithError::Api(format!(
                "Whisper API error: {} ({})",
                api_error.error.message, api_error.error.r#type
            )));
        }

        Err(ReelsmithError::Api(format!(
            "Whisper API error ({}): {}",
            status, error_body
        )))
    }

    /// Transcribe with retry logic, rebuilding the form on each attempt.
    async fn transcribe_with_retry(&self, audio: &Path) -> Result<WhisperResponse> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_DELAY_MS * 2u64.pow(attempt - 1);
                debug!("Retry attempt {} after {}ms delay", attempt, delay);
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            let form = self.build_form(audio).await?;

            match self.call_api(form).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    // Don't retry on client errors
                    let error_str = e.to_string();
                    if error_str.contains("API error (4") {
                        return Err(e);
                    }
                    warn!("Attempt {} failed: {}", attempt + 1, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ReelsmithError::Api("Unknown error".to_string())))
    }

    /// Convert an API response into utterances. Segment times are
    /// relative to the uploaded audio, so `offset` re-bases them to the
    /// source timeline when the upload was a chunk.
    fn parse_response(&self, response: WhisperResponse, offset: Duration) -> Transcript {
        let utterances = if let Some(segments) = response.segments {
            segments
                .into_iter()
                .map(|seg| Utterance {
                    start: offset + Duration::from_secs_f64(seg.start.max(0.0)),
                    end: offset + Duration::from_secs_f64(seg.end.max(0.0)),
                    text: seg.text.trim().to_string(),
                })
                .filter(|u| !u.text.is_empty())
                .collect()
        } else if !response.text.trim().is_empty() {
            vec![Utterance {
                start: offset,
                end: offset + Duration::from_secs_f64(response.duration.max(0.0)),
                text: response.text.trim().to_string(),
            }]
        } else {
            Vec::new()
        };

        Transcript::new(utterances)
    }

    /// Transcribe audio too large for a single upload: split it into
    /// fixed-length chunks, transcribe them sequentially, and re-base
    /// each chunk's utterances by its start offset.
    async fn transcribe_chunked(&self, audio: &Path) -> Result<Transcript> {
        let total = probe_duration(audio).map_err(|e| {
            ReelsmithError::TranscriptionUnavailable(format!(
                "Failed to probe audio duration for chunking: {e}"
            ))
        })?;

        let chunks = plan_chunks(total, MAX_CHUNK_DURATION);
        info!(
            "Audio exceeds the upload size limit, transcribing {} chunks",
            chunks.len()
        );

        let workspace = tempfile::TempDir::new()?;
        let mut utterances = Vec::new();

        for (index, &(start, end)) in chunks.iter().enumerate() {
            let chunk_path = workspace.path().join(format!("chunk_{:04}.wav", index));
            extract_audio_segment(audio, &chunk_path, start, end.saturating_sub(start))
                .map_err(|e| {
                    ReelsmithError::TranscriptionUnavailable(format!(
                        "Chunk extraction failed: {e}"
                    ))
                })?;

            debug!(
                "Transcribing chunk {}/{} ({:.1}s..{:.1}s)",
                index + 1,
                chunks.len(),
                start.as_secs_f64(),
                end.as_secs_f64()
            );

            let response = self.transcribe_with_retry(&chunk_path).await?;
            utterances.extend(self.parse_response(response, start).utterances);
        }

        Ok(Transcript::new(utterances))
    }
}

/// Plan fixed-length chunk intervals covering `[0, total)`.
fn plan_chunks(total: Duration, chunk_len: Duration) -> Vec<(Duration, Duration)> {
    let mut chunks = Vec::new();
    let mut current = Duration::ZERO;

    while current < total {
        let end = (current + chunk_len).min(total);
        chunks.push((current, end));
        current = end;
    }

    chunks
}

#[async_trait]
impl TranscriptSource for WhisperApiSource {
    async fn transcribe(&self, audio: &Path) -> Result<Transcript> {
        let metadata = fs::metadata(audio).await?;

        let transcript = if metadata.len() as usize > MAX_FILE_SIZE {
            self.transcribe_chunked(audio).await?
        } else {
            let response = self.transcribe_with_retry(audio).await?;
            self.parse_response(response, Duration::ZERO)
        };

        debug!("Whisper returned {} utterances", transcript.len());

        Ok(transcript)
    }

    fn name(&self) -> &'static str {
        "OpenAI Whisper"
    }
}

// API response types

#[derive(Debug, Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    segments: Option<Vec<WhisperSegment>>,
    #[serde(default)]
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
    r#type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response_with_segments() {
        let source = WhisperApiSource::new("test-key".to_string());

        let response = WhisperResponse {
            text: "Hello world. How are you?".to_string(),
            segments: Some(vec![
                WhisperSegment {
                    start: 0.0,
                    end: 2.0,
                    text: " Hello world.".to_string(),
                },
                WhisperSegment {
                    start: 2.5,
                    end: 4.0,
                    text: "How are you?".to_string(),
                },
            ]),
            duration: 4.0,
        };

        let transcript = source.parse_response(response, Duration::ZERO);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.utterances[0].text, "Hello world.");
        assert_eq!(transcript.utterances[1].start, Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_response_rebases_by_chunk_offset() {
        let source = WhisperApiSource::new("test-key".to_string());

        let response = WhisperResponse {
            text: "Later on".to_string(),
            segments: Some(vec![WhisperSegment {
                start: 1.0,
                end: 3.0,
                text: "Later on".to_string(),
            }]),
            duration: 3.0,
        };

        // Second chunk of a long recording starts at 600s
        let transcript = source.parse_response(response, Duration::from_secs(600));
        assert_eq!(transcript.utterances[0].start, Duration::from_secs(601));
        assert_eq!(transcript.utterances[0].end, Duration::from_secs(603));
    }

    #[test]
    fn test_plan_chunks_covers_audio() {
        // 25 minutes of audio splits into three 10-minute-capped chunks
        let chunks = plan_chunks(Duration::from_secs(1500), Duration::from_secs(600));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], (Duration::ZERO, Duration::from_secs(600)));
        assert_eq!(
            chunks[2],
            (Duration::from_secs(1200), Duration::from_secs(1500))
        );
        for pair in chunks.windows(2) {
            assert_eq!(pair[0].1, pair[1].0);
        }
    }

    #[test]
    fn test_plan_chunks_short_audio_single_chunk() {
        let chunks = plan_chunks(Duration::from_secs(90), Duration::from_secs(600));
        assert_eq!(chunks, vec![(Duration::ZERO, Duration::from_secs(90))]);
    }

    #[test]
    fn test_parse_response_without_segments() {
        let source = WhisperApiSource::new("test-key".to_string());

        let response = WhisperResponse {
            text: "Hello world".to_string(),
            segments: None,
            duration: 2.0,
        };

        let transcript = source.parse_response(response, Duration::ZERO);
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.utterances[0].end, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_srt_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.srt");
        std::fs::write(
            &path,
            "1\n00:00:01,000 --> 00:00:03,000\nHello there\n\n2\n00:00:04,000 --> 00:00:06,000\nSecond line\n",
        )
        .unwrap();

        let source = SrtFileSource::new(path);
        let transcript = source.transcribe(Path::new("/unused.wav")).await.unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.utterances[0].start, Duration::from_secs(1));
        assert_eq!(transcript.utterances[1].text, "Second line");
    }

    #[tokio::test]
    async fn test_srt_file_source_missing_file() {
        let source = SrtFileSource::new(PathBuf::from("/nonexistent/subs.srt"));
        let result = source.transcribe(Path::new("/unused.wav")).await;
        assert!(matches!(
            result,
            Err(ReelsmithError::TranscriptionUnavailable(_))
        ));
    }
}
