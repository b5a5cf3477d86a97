//! CLI runner: waits for a frame directory to appear (bounded discovery,
//! like waiting for a capture device), streams it through the tracking or
//! census pipeline and prints a JSON run summary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use spot_track::io::{FileEventLog, ImageDirSource, IoError, NullRenderer, PngDirSink};
use spot_track::pipeline::{run_census, run_tracking, CensusParams, RunSummary, TrackerParams};
use spot_track::{discover, DiscoverError, DiscoveryPolicy, PipelineError, SystemClock};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Track the single largest bright spot and report its deflection.
    Single,
    /// Count hue-matched objects per frame.
    Census,
}

#[derive(Parser, Debug)]
#[command(name = "spot-track", about = "Light-spot detection and tracking over a frame sequence")]
struct Args {
    /// Directory containing the input frame sequence (png/jpg/bmp).
    #[arg(long)]
    frames: PathBuf,

    /// Operating mode.
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Event log file (appended).
    #[arg(long, default_value = "spot_detection.log")]
    log: PathBuf,

    /// Directory under which the timestamped recording is created.
    #[arg(long, default_value = ".")]
    out: PathBuf,

    /// Seconds to keep polling for the frame directory before giving up.
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Target frame rate recorded with the output.
    #[arg(long, default_value_t = 23.0)]
    fps: f32,

    /// Format identifier recorded with the output.
    #[arg(long, default_value = "mp4v")]
    format: String,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    NoDevice(#[from] DiscoverError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Io(#[from] IoError),

    #[error("failed to serialize run summary: {0}")]
    Summary(#[from] serde_json::Error),
}

fn main() {
    let _ = spot_track_core::init_with_level(log::LevelFilter::Info);
    let args = Args::parse();
    if let Err(err) = run(args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let policy = DiscoveryPolicy::with_timeout(Duration::from_secs(args.timeout));
    let frames_dir = discover(|| probe_frames_dir(&args.frames), policy, &SystemClock)?;

    let mut source = ImageDirSource::open(&frames_dir)?;
    let mut renderer = NullRenderer;
    let mut events = FileEventLog::open(&args.log)?;
    let mut sink = PngDirSink::create(&args.out, args.fps, &args.format)?;

    let summary: RunSummary = match args.mode {
        Mode::Single => run_tracking(
            TrackerParams::default(),
            &mut source,
            &mut renderer,
            &mut events,
            &mut sink,
        )?,
        Mode::Census => run_census(
            CensusParams::default(),
            &mut source,
            &mut renderer,
            &mut events,
            &mut sink,
        )?,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// The "device" here is a readable, non-empty frame directory.
fn probe_frames_dir(dir: &Path) -> Option<PathBuf> {
    let mut entries = std::fs::read_dir(dir).ok()?;
    entries.next().is_some().then(|| dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_rejects_missing_or_empty_directories() {
        assert!(probe_frames_dir(Path::new("/nonexistent/frames")).is_none());
        let dir = tempfile::tempdir().unwrap();
        assert!(probe_frames_dir(dir.path()).is_none());
        std::fs::write(dir.path().join("f0.png"), b"stub").unwrap();
        assert_eq!(probe_frames_dir(dir.path()), Some(dir.path().to_path_buf()));
    }
}
