//! Collaborator seams: frame acquisition, display, recording and the domain
//! event log.
//!
//! The pipeline only ever talks to these traits. Device enumeration policy,
//! container/codec handling and interactive rendering are out of scope; the
//! reference implementations here cover what a run still needs on disk —
//! a timestamped append-only event log and a frame sink that persists the
//! annotated frames of one run.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;

use spot_track_core::{FrameError, RgbFrame};

use crate::annotate::Overlay;
use crate::convert;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Ordered sequence of fixed-size frames; `None` signals end of stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RgbFrame>, IoError>;
}

/// Append-only timestamped free-text log of pipeline events. Distinct from
/// diagnostic logging: these records are run output and get persisted.
pub trait EventLog {
    fn log(&mut self, message: &str) -> Result<(), IoError>;
}

/// Flow decision returned by the display collaborator; `Stop` models an
/// external stop signal such as a key press, checked once per iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderFlow {
    Continue,
    Stop,
}

/// Interactive display; purely observational, no feedback into the pipeline
/// beyond the stop signal.
pub trait Renderer {
    fn show(&mut self, frame: &RgbFrame, overlays: &[Overlay]) -> Result<RenderFlow, IoError>;
}

/// Recording target for the annotated frames of one run. `finish` must be
/// called exactly once at finalization.
pub trait FrameSink {
    fn write(&mut self, frame: &RgbFrame) -> Result<(), IoError>;
    fn finish(&mut self) -> Result<(), IoError>;
}

/// File-backed event log: one `YYYY-MM-DD HH:MM:SS - message` line per
/// record. The path is explicit configuration; there is no baked-in default.
pub struct FileEventLog {
    file: File,
}

impl FileEventLog {
    pub fn open(path: &Path) -> Result<Self, IoError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { file })
    }
}

impl EventLog for FileEventLog {
    fn log(&mut self, message: &str) -> Result<(), IoError> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.file, "{timestamp} - {message}")?;
        Ok(())
    }
}

/// In-memory event log for tests and headless runs.
#[derive(Default)]
pub struct MemoryEventLog {
    pub records: Vec<String>,
}

impl EventLog for MemoryEventLog {
    fn log(&mut self, message: &str) -> Result<(), IoError> {
        self.records.push(message.to_owned());
        Ok(())
    }
}

/// Renderer that displays nothing and never requests a stop.
#[derive(Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn show(&mut self, _frame: &RgbFrame, _overlays: &[Overlay]) -> Result<RenderFlow, IoError> {
        Ok(RenderFlow::Continue)
    }
}

/// Frame source backed by the image files of a directory, consumed in
/// lexicographic order.
pub struct ImageDirSource {
    files: std::vec::IntoIter<PathBuf>,
}

impl ImageDirSource {
    pub fn open(dir: &Path) -> Result<Self, IoError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("png") | Some("jpg") | Some("jpeg") | Some("bmp")
                )
            })
            .collect();
        files.sort();
        Ok(Self {
            files: files.into_iter(),
        })
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<RgbFrame>, IoError> {
        let Some(path) = self.files.next() else {
            return Ok(None);
        };
        let img = image::open(&path)?.to_rgb8();
        Ok(Some(convert::frame_from_image(&img)?))
    }
}

/// Recording sink that writes one run into a timestamp-named directory as a
/// numbered PNG sequence plus a small manifest carrying the target frame
/// rate and format identifier. Container muxing is a non-goal; this
/// preserves the frames and the parameters a muxer would need.
pub struct PngDirSink {
    dir: PathBuf,
    fps: f32,
    format: String,
    frames_written: usize,
    finished: bool,
}

impl PngDirSink {
    /// Create `<parent>/output_<timestamp>/` for this run.
    pub fn create(parent: &Path, fps: f32, format: &str) -> Result<Self, IoError> {
        let stamp = Local::now().format("%y-%m-%d_%H-%M-%S");
        let dir = parent.join(format!("output_{stamp}"));
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            fps,
            format: format.to_owned(),
            frames_written: 0,
            finished: false,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for PngDirSink {
    fn write(&mut self, frame: &RgbFrame) -> Result<(), IoError> {
        let img = convert::image_from_frame(frame);
        let path = self.dir.join(format!("frame_{:06}.png", self.frames_written));
        img.save(&path)?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), IoError> {
        if self.finished {
            return Ok(());
        }
        let mut manifest = File::create(self.dir.join("manifest.txt"))?;
        writeln!(manifest, "fps={}", self.fps)?;
        writeln!(manifest, "format={}", self.format)?;
        writeln!(manifest, "frames={}", self.frames_written)?;
        self.finished = true;
        Ok(())
    }
}

impl Drop for PngDirSink {
    fn drop(&mut self) {
        // Release path for early exits; errors are already surfaced on the
        // explicit finish call.
        let _ = self.finish();
    }
}

/// Sink that drops frames; for runs where recording is disabled.
#[derive(Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn write(&mut self, _frame: &RgbFrame) -> Result<(), IoError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
