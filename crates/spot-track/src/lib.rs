//! Light-spot tracking pipeline.
//!
//! Builds the full per-frame pipeline on top of `spot-track-core`: frame
//! annotation, the single-target tracking state machine and the multi-target
//! object census, plus the narrow collaborator seams (frame source, display,
//! recording sink, event log) and the bounded device-discovery loop.
//!
//! ```no_run
//! use spot_track::io::{FileEventLog, ImageDirSource, NullRenderer, PngDirSink};
//! use spot_track::pipeline::{run_tracking, TrackerParams};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = ImageDirSource::open(Path::new("frames/"))?;
//! let mut renderer = NullRenderer;
//! let mut events = FileEventLog::open(Path::new("spot_detection.log"))?;
//! let mut sink = PngDirSink::create(Path::new("."), 23.0, "mp4v")?;
//! let summary = run_tracking(
//!     TrackerParams::default(),
//!     &mut source,
//!     &mut renderer,
//!     &mut events,
//!     &mut sink,
//! )?;
//! println!("deflection: {:?}", summary.deflection);
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod convert;
pub mod discover;
pub mod io;
pub mod pipeline;

pub use annotate::{AnnotationStyle, Overlay};
pub use discover::{discover, Clock, DiscoverError, DiscoveryPolicy, SystemClock};
pub use pipeline::{
    run_census, run_tracking, CensusParams, FrameCensus, ObjectCensus, PipelineError, RunSummary,
    SpotTracker, TrackedSpot, TrackerParams,
};

pub use spot_track_core as core;
