use anyhow::{Context, Result};
use clap::Parser;
use reelsmith::config::Config;
use reelsmith::pipeline::{print_summary, produce_clips_with_cancel, RunOptions};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "reelsmith")]
#[command(version, about = "Turn long recordings into short vertical clips")]
#[command(
    long_about = "Slice a long-form video into vertical, subtitled, music-scored clips ready for social feeds."
)]
struct Cli {
    /// Input video file
    input: PathBuf,

    /// Output directory (a per-source subdirectory is created inside)
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Length of each clip in seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Directory of background music files
    #[arg(short, long)]
    music_dir: Option<PathBuf>,

    /// Pre-supplied SRT transcript instead of live transcription
    #[arg(short, long)]
    subtitles: Option<PathBuf>,

    /// Source language code for live transcription (e.g. en, ja, es)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// Disable background music
    #[arg(long)]
    no_music: bool,

    /// Disable subtitle burn-in
    #[arg(long)]
    no_subtitles: bool,

    /// Seed for deterministic track selection
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(duration) = cli.duration {
        config.clip_duration_secs = duration;
    }
    if let Some(music_dir) = cli.music_dir {
        config.music_dir = music_dir;
    }
    config.validate().context("Configuration validation failed")?;

    let options = RunOptions {
        subtitle_file: cli.subtitles,
        language: cli.language,
        no_music: cli.no_music,
        no_subtitles: cli.no_subtitles,
        seed: cli.seed,
        show_progress: true,
    };

    info!("Input:         {}", cli.input.display());
    info!("Output:        {}", cli.output.display());
    info!("Clip duration: {}s", config.clip_duration_secs);
    info!("Music dir:     {}", config.music_dir.display());

    // Ctrl+C stops the run between windows
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancel_flag = cancelled.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nCancelling after the current window...");
        cancel_flag.store(true, Ordering::Relaxed);
    })
    .context("Failed to install Ctrl+C handler")?;

    let report = produce_clips_with_cancel(&cli.input, &cli.output, &config, options, cancelled)
        .await
        .context("Clip production failed")?;

    print_summary(&report);

    if report.attempted > 0 && report.failed == report.attempted {
        anyhow::bail!("All {} windows failed", report.attempted);
    }

    Ok(())
}
