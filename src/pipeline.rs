use crate::assemble::{Assembler, WindowReport, WindowStatus};
use crate::config::Config;
use crate::error::{ReelsmithError, Result};
use crate::music::scan_catalog;
use crate::prosody::KeywordScorer;
use crate::segment::{plan_windows, slice_transcript};
use crate::transcript::{SrtFileSource, Transcript, TranscriptSource, WhisperApiSource};
use crate::video::{check_ffmpeg, check_ffprobe, extract_audio, probe_duration};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{info, warn};

/// Per-run options supplied by the CLI on top of the config file.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Pre-supplied transcript file instead of live transcription.
    pub subtitle_file: Option<PathBuf>,
    /// Source language for live transcription.
    pub language: String,
    /// Disable background music.
    pub no_music: bool,
    /// Disable subtitle burn-in.
    pub no_subtitles: bool,
    /// Seed for deterministic track selection.
    pub seed: Option<u64>,
    /// Show a progress bar.
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            subtitle_file: None,
            language: "en".to_string(),
            no_music: false,
            no_subtitles: false,
            seed: None,
            show_progress: true,
        }
    }
}

/// Aggregated result of one run.
#[derive(Debug)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub attempted: usize,
    pub succeeded: usize,
    pub degraded: usize,
    pub failed: usize,
    pub reports: Vec<WindowReport>,
    /// Reason transcription was unavailable, when it was.
    pub transcription_note: Option<String>,
    /// Reason music was unavailable, when it was.
    pub music_note: Option<String>,
    pub total_time: std::time::Duration,
}

/// One line of the append-only structured event log.
#[derive(Debug, Serialize)]
struct WindowEvent<'a> {
    /// 1-based, matching the reel_NN output filenames.
    window: usize,
    start_secs: f64,
    end_secs: f64,
    mood: String,
    tempo: String,
    track: Option<&'a str>,
    status: String,
    degradations: &'a [String],
    failure: Option<&'a str>,
}

/// Append-only JSON-lines log of per-window outcomes.
struct RunLog {
    file: fs::File,
}

impl RunLog {
    fn create(output_dir: &Path) -> Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(output_dir.join("run_log.jsonl"))?;
        Ok(Self { file })
    }

    fn record(&mut self, report: &WindowReport) -> Result<()> {
        let event = WindowEvent {
            window: report.window.index + 1,
            start_secs: report.window.start.as_secs_f64(),
            end_secs: report.window.end.as_secs_f64(),
            mood: report.profile.mood.to_string(),
            tempo: report.profile.tempo.to_string(),
            track: report.track.as_ref().and_then(|p| p.to_str()),
            status: report.status().to_string(),
            degradations: &report.degradations,
            failure: report.failure.as_deref(),
        };
        writeln!(self.file, "{}", serde_json::to_string(&event)?)?;
        Ok(())
    }
}

/// Produce one clip per window from the source recording.
pub async fn produce_clips(
    input: &Path,
    output_root: &Path,
    config: &Config,
    options: RunOptions,
) -> Result<RunReport> {
    let cancelled = Arc::new(AtomicBool::new(false));
    produce_clips_with_cancel(input, output_root, config, options, cancelled).await
}

/// Produce clips with cancellation support: the flag is checked between
/// windows, so a cancelled run still finishes the window in flight and
/// releases its workspace.
pub async fn produce_clips_with_cancel(
    input: &Path,
    output_root: &Path,
    config: &Config,
    options: RunOptions,
    cancelled: Arc<AtomicBool>,
) -> Result<RunReport> {
    let start_time = Instant::now();

    config.validate()?;

    if !input.exists() {
        return Err(ReelsmithError::FileNotFound(input.display().to_string()));
    }

    check_ffmpeg()?;
    check_ffprobe()?;

    // Clips land in a per-source subdirectory of the output root
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "clips".to_string());
    let output_dir = output_root.join(stem);
    fs::create_dir_all(&output_dir)?;

    let total = probe_duration(input)?;
    info!("Source duration: {:.1}s", total.as_secs_f64());

    let windows = plan_windows(total, config.clip_duration())?;
    info!(
        "Planned {} windows of up to {}s",
        windows.len(),
        config.clip_duration_secs
    );

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 1: Transcript Acquisition
    // ═══════════════════════════════════════════════════════════════════════
    // Transcription happens once, up front. Failure is not fatal: the
    // run degrades to subtitle-less clips with neutral prosody.
    let mut transcription_note = None;
    let transcript = match acquire_transcript(input, config, &options).await {
        Ok(t) => {
            info!("Transcript ready: {} utterances", t.len());
            t
        }
        Err(e) => {
            warn!("Transcription unavailable, continuing without captions: {e}");
            transcription_note = Some(e.to_string());
            Transcript::empty()
        }
    };

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 2: Music Catalog
    // ═══════════════════════════════════════════════════════════════════════
    let mut music_note = None;
    let catalog = if options.no_music {
        music_note = Some("music disabled".to_string());
        Vec::new()
    } else {
        let catalog = scan_catalog(&config.music_dir).unwrap_or_else(|e| {
            warn!("Failed to scan music catalog: {e}");
            Vec::new()
        });
        if catalog.is_empty() {
            let note = format!(
                "no music files in {}",
                config.music_dir.display()
            );
            warn!("{note}");
            music_note = Some(note);
        } else {
            info!("Music catalog: {} tracks", catalog.len());
        }
        catalog
    };

    let assembler = Assembler {
        source: input,
        output_dir: &output_dir,
        config,
        catalog: &catalog,
        scorer: &KeywordScorer,
        music_enabled: !catalog.is_empty(),
        subtitles_enabled: !options.no_subtitles,
    };

    let mut rng = match options.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut run_log = RunLog::create(&output_dir)?;

    let progress = if options.show_progress {
        let pb = ProgressBar::new(windows.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.green} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    // ═══════════════════════════════════════════════════════════════════════
    // Stage 3: Window Assembly
    // ═══════════════════════════════════════════════════════════════════════
    let mut reports = Vec::with_capacity(windows.len());

    for window in &windows {
        if cancelled.load(Ordering::Relaxed) {
            warn!("Run cancelled after {} windows", reports.len());
            break;
        }

        if let Some(pb) = &progress {
            pb.set_message(window.label());
        }

        let slice = slice_transcript(&transcript, window);
        let report = assembler.assemble_window(&slice, &mut rng);

        if let Err(e) = run_log.record(&report) {
            warn!("Failed to record run log event: {e}");
        }

        reports.push(report);

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let succeeded = count_status(&reports, WindowStatus::Success);
    let degraded = count_status(&reports, WindowStatus::Degraded);
    let failed = count_status(&reports, WindowStatus::Failed);

    Ok(RunReport {
        output_dir,
        attempted: reports.len(),
        succeeded,
        degraded,
        failed,
        reports,
        transcription_note,
        music_note,
        total_time: start_time.elapsed(),
    })
}

fn count_status(reports: &[WindowReport], status: WindowStatus) -> usize {
    reports.iter().filter(|r| r.status() == status).count()
}

/// Get the transcript, from a pre-supplied SRT file or the Whisper API.
async fn acquire_transcript(
    input: &Path,
    config: &Config,
    options: &RunOptions,
) -> Result<Transcript> {
    if let Some(ref srt_path) = options.subtitle_file {
        let source = SrtFileSource::new(srt_path.clone());
        info!("Loading transcript from {} ({})", srt_path.display(), source.name());
        return source.transcribe(input).await;
    }

    let api_key = config.openai_api_key.as_ref().ok_or_else(|| {
        ReelsmithError::TranscriptionUnavailable(
            "OPENAI_API_KEY not set and no subtitle file supplied".to_string(),
        )
    })?;

    // Workspace for the extracted narration audio; removed on drop
    let temp_dir = TempDir::new()?;
    let audio_path = temp_dir.path().join("narration.wav");
    extract_audio(input, &audio_path).map_err(|e| {
        ReelsmithError::TranscriptionUnavailable(format!("audio extraction failed: {e}"))
    })?;

    let source =
        WhisperApiSource::new(api_key.clone()).with_language(options.language.clone());
    info!("Transcribing with {}", source.name());
    source.transcribe(&audio_path).await
}

/// Print a human-readable summary of the run.
pub fn print_summary(report: &RunReport) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Clip Production Complete                  ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Output:     {}", report.output_dir.display());
    println!(
        "  Windows:    {} attempted, {} full, {} degraded, {} failed",
        report.attempted, report.succeeded, report.degraded, report.failed
    );
    println!("  Total:      {:.2}s", report.total_time.as_secs_f64());

    if let Some(ref note) = report.transcription_note {
        println!();
        println!("  Note: transcription unavailable ({note})");
    }
    if let Some(ref note) = report.music_note {
        println!("  Note: music unavailable ({note})");
    }

    let imperfect: Vec<_> = report
        .reports
        .iter()
        .filter(|r| r.status() != WindowStatus::Success)
        .collect();

    if !imperfect.is_empty() {
        println!();
        for r in imperfect {
            match &r.failure {
                Some(reason) => println!("  {} failed: {}", r.window.label(), reason),
                None => println!(
                    "  {} degraded: {}",
                    r.window.label(),
                    r.degradations.join("; ")
                ),
            }
        }
    }

    println!();
    println!("═══════════════════════════════════════════════════════════════");
}
