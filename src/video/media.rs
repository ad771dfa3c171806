use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ReelsmithError, Result};

use super::frame::FramePlacement;

/// Check if FFmpeg is installed and accessible.
pub fn check_ffmpeg() -> Result<()> {
    let output = Command::new("ffmpeg").arg("-version").output().map_err(|e| {
        ReelsmithError::InvalidConfiguration(format!(
            "FFmpeg not found. Please install FFmpeg and ensure it's in your PATH. Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(ReelsmithError::InvalidConfiguration(
            "FFmpeg check failed".to_string(),
        ));
    }

    debug!("FFmpeg is available");
    Ok(())
}

/// Check if FFprobe is installed and accessible.
pub fn check_ffprobe() -> Result<()> {
    let output = Command::new("ffprobe").arg("-version").output().map_err(|e| {
        ReelsmithError::InvalidConfiguration(format!(
            "FFprobe not found. Please install FFmpeg (includes FFprobe). Error: {e}"
        ))
    })?;

    if !output.status.success() {
        return Err(ReelsmithError::InvalidConfiguration(
            "FFprobe check failed".to_string(),
        ));
    }

    debug!("FFprobe is available");
    Ok(())
}

/// Get media duration using FFprobe.
pub fn probe_duration(input: &Path) -> Result<Duration> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(input)
        .output()
        .map_err(|e| ReelsmithError::MediaProbe(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReelsmithError::MediaProbe(format!(
            "FFprobe failed: {stderr}"
        )));
    }

    let duration_str = String::from_utf8_lossy(&output.stdout);
    let duration_secs: f64 = duration_str.trim().parse().map_err(|e| {
        ReelsmithError::MediaProbe(format!(
            "Failed to parse duration '{}': {e}",
            duration_str.trim()
        ))
    })?;

    Ok(Duration::from_secs_f64(duration_secs))
}

/// Get the frame dimensions of the first video stream.
pub fn probe_dimensions(input: &Path) -> Result<(u32, u32)> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=s=,:p=0",
        ])
        .arg(input)
        .output()
        .map_err(|e| ReelsmithError::MediaProbe(format!("Failed to run FFprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReelsmithError::MediaProbe(format!(
            "FFprobe failed: {stderr}"
        )));
    }

    let info_str = String::from_utf8_lossy(&output.stdout);
    let parts: Vec<&str> = info_str.trim().split(',').collect();

    if parts.len() < 2 {
        return Err(ReelsmithError::MediaProbe(format!(
            "Failed to parse video dimensions: {}",
            info_str.trim()
        )));
    }

    let width: u32 = parts[0]
        .parse()
        .map_err(|e| ReelsmithError::MediaProbe(format!("Failed to parse width: {e}")))?;
    let height: u32 = parts[1]
        .parse()
        .map_err(|e| ReelsmithError::MediaProbe(format!("Failed to parse height: {e}")))?;

    Ok((width, height))
}

/// Extract audio from a video/audio file to mono 16 kHz WAV, the format
/// the transcription source expects.
pub fn extract_audio(input: &Path, output: &Path) -> Result<()> {
    if !input.exists() {
        return Err(ReelsmithError::FileNotFound(input.display().to_string()));
    }

    info!("Extracting audio from {}", input.display());

    let status = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg audio extraction failed".to_string(),
        ));
    }

    if !output.exists() {
        return Err(ReelsmithError::Assembly(
            "Audio output file was not created".to_string(),
        ));
    }

    Ok(())
}

/// Extract one time range of an audio file, same WAV format as
/// `extract_audio`. Used to keep transcription uploads under the API
/// size limit.
pub fn extract_audio_segment(
    input: &Path,
    output: &Path,
    start: Duration,
    length: Duration,
) -> Result<()> {
    if !input.exists() {
        return Err(ReelsmithError::FileNotFound(input.display().to_string()));
    }
    if length.is_zero() {
        return Err(ReelsmithError::Assembly(
            "Segment duration is zero".to_string(),
        ));
    }

    let start_secs = format!("{:.3}", start.as_secs_f64());
    let length_secs = format!("{:.3}", length.as_secs_f64());

    debug!(
        "Extracting audio segment: start={}, length={}",
        start_secs, length_secs
    );

    let status = Command::new("ffmpeg")
        .args(["-y", "-ss"])
        .arg(&start_secs)
        .arg("-i")
        .arg(input)
        .arg("-t")
        .arg(&length_secs)
        .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg audio segment extraction failed".to_string(),
        ));
    }

    Ok(())
}

/// Cut one window's segment out of the source video.
pub fn cut_segment(input: &Path, output: &Path, start: Duration, length: Duration) -> Result<()> {
    if length.is_zero() {
        return Err(ReelsmithError::Assembly(
            "Segment length is zero".to_string(),
        ));
    }

    let start_secs = format!("{:.3}", start.as_secs_f64());
    let length_secs = format!("{:.3}", length.as_secs_f64());

    debug!("Cutting segment: start={}, length={}", start_secs, length_secs);

    let status = Command::new("ffmpeg")
        .args(["-y", "-ss"])
        .arg(&start_secs)
        .arg("-i")
        .arg(input)
        .arg("-t")
        .arg(&length_secs)
        .args(["-c:v", "libx264", "-preset", "fast", "-c:a", "aac"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg segment cut failed".to_string(),
        ));
    }

    Ok(())
}

/// Re-encode a clip onto the vertical canvas with centered padding.
pub fn reformat_portrait(input: &Path, output: &Path, placement: &FramePlacement) -> Result<()> {
    info!(
        "Converting to portrait format ({}x{})",
        placement.canvas_w, placement.canvas_h
    );

    let status = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .arg("-vf")
        .arg(placement.to_video_filter())
        .args(["-c:v", "libx264", "-preset", "fast", "-c:a", "copy"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg portrait conversion failed".to_string(),
        ));
    }

    Ok(())
}

/// Burn a subtitle file into the video stream.
pub fn burn_subtitles(input: &Path, subtitle_file: &Path, output: &Path) -> Result<()> {
    info!("Burning subtitles from {}", subtitle_file.display());

    // The subtitles filter parses its argument, so escape filter-special
    // characters in the path
    let escaped = subtitle_file
        .display()
        .to_string()
        .replace('\\', "/")
        .replace(':', "\\:");

    let status = Command::new("ffmpeg")
        .args(["-y", "-i"])
        .arg(input)
        .arg("-vf")
        .arg(format!("subtitles=filename='{escaped}'"))
        .args(["-c:v", "libx264", "-preset", "fast", "-c:a", "copy"])
        .arg(output)
        .status()
        .map_err(|e| ReelsmithError::Assembly(format!("Failed to run FFmpeg: {e}")))?;

    if !status.success() {
        return Err(ReelsmithError::Assembly(
            "FFmpeg subtitle burn-in failed".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffmpeg_available() -> bool {
        Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    #[test]
    fn test_check_ffmpeg() {
        if !ffmpeg_available() {
            eprintln!("Skipping test: FFmpeg not available");
            return;
        }
        assert!(check_ffmpeg().is_ok());
    }

    #[test]
    fn test_extract_audio_missing_input() {
        let result = extract_audio(Path::new("/nonexistent/file.mp4"), Path::new("/tmp/out.wav"));
        assert!(matches!(result, Err(ReelsmithError::FileNotFound(_))));
    }

    #[test]
    fn test_extract_audio_segment_zero_length() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.wav");
        std::fs::write(&input, b"x").unwrap();

        let result = extract_audio_segment(
            &input,
            &dir.path().join("out.wav"),
            Duration::ZERO,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(ReelsmithError::Assembly(_))));
    }

    #[test]
    fn test_cut_segment_zero_length() {
        let result = cut_segment(
            Path::new("/tmp/in.mp4"),
            Path::new("/tmp/out.mp4"),
            Duration::ZERO,
            Duration::ZERO,
        );
        assert!(matches!(result, Err(ReelsmithError::Assembly(_))));
    }
}
