//! Per-frame pipeline: preprocess, segment, extract, select, then either
//! track a single spot across frames or take a per-frame object census.
//!
//! Per-frame anomalies (`NoDetection`, `DegenerateContour`) are contained at
//! the frame boundary: the frame is skipped, history stays unchanged and the
//! anomaly goes to the event log. Only device acquisition failure is fatal.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::instrument;

use spot_track_core::{
    above_threshold, centroid, find_external_contours, largest, preprocess, DetectError,
    DetectedObject, HueRange, IntensityThreshold, PositionHistory, RgbFrame,
};

use crate::annotate::{annotate_objects, annotate_tracked, AnnotationStyle, Overlay};
use crate::discover::DiscoverError;
use crate::io::{EventLog, FrameSink, FrameSource, IoError, RenderFlow, Renderer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    NoDevice(#[from] DiscoverError),

    #[error("frame source failed: {0}")]
    Source(#[source] IoError),

    #[error("renderer failed: {0}")]
    Render(#[source] IoError),

    #[error("frame sink failed: {0}")]
    Sink(#[source] IoError),

    #[error("event log failed: {0}")]
    Log(#[source] IoError),
}

/// Configuration of the single-target tracking pipeline. Thresholds are
/// explicit so runs are reproducible; nothing is baked into the stages.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct TrackerParams {
    pub threshold: IntensityThreshold,
    pub style: AnnotationStyle,
}

/// Configuration of the multi-target census pipeline.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CensusParams {
    pub hue_range: HueRange,
    /// Contours must have area strictly greater than this to qualify.
    pub min_area: f64,
    pub style: AnnotationStyle,
}

impl Default for CensusParams {
    fn default() -> Self {
        Self {
            hue_range: HueRange::red(),
            min_area: 50.0,
            style: AnnotationStyle::default(),
        }
    }
}

/// Successful single-target outcome for one frame.
#[derive(Clone, Debug)]
pub struct TrackedSpot {
    pub centroid: Point2<f64>,
    pub overlays: Vec<Overlay>,
}

/// Single-target tracker: isolates the brightest region per frame and
/// aggregates its centroid into a deflection signal.
#[derive(Debug, Default)]
pub struct SpotTracker {
    params: TrackerParams,
    history: PositionHistory,
}

impl SpotTracker {
    pub fn new(params: TrackerParams) -> Self {
        Self {
            params,
            history: PositionHistory::new(),
        }
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    /// Running net displacement; safe to call at any point in the stream.
    pub fn deflection(&self) -> Vector2<f64> {
        self.history.deflection()
    }

    /// Run one frame through the single-target path, annotating the frame in
    /// place on success. On a recoverable anomaly the frame and the history
    /// are left untouched.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn process_frame(&mut self, frame: &mut RgbFrame) -> Result<TrackedSpot, DetectError> {
        let gray = preprocess(frame);
        let mask = self.params.threshold.segment(&gray);
        let contours = find_external_contours(&mask);
        let target = largest(&contours)?;
        let center = centroid(target)?;
        self.history.observe(center);
        let overlays = annotate_tracked(frame, center, &self.params.style);
        Ok(TrackedSpot {
            centroid: center,
            overlays,
        })
    }
}

/// Per-frame census outcome. The count is recomputed every frame and never
/// carries over.
#[derive(Clone, Debug)]
pub struct FrameCensus {
    pub objects: Vec<DetectedObject>,
    pub overlays: Vec<Overlay>,
}

impl FrameCensus {
    pub fn count(&self) -> usize {
        self.objects.len()
    }
}

/// Multi-target census: every hue-matched contour above the noise threshold,
/// labeled sequentially. Stateless across frames.
#[derive(Clone, Debug, Default)]
pub struct ObjectCensus {
    params: CensusParams,
}

impl ObjectCensus {
    pub fn new(params: CensusParams) -> Self {
        Self { params }
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, frame), fields(width = frame.width(), height = frame.height()))
    )]
    pub fn process_frame(&self, frame: &mut RgbFrame) -> FrameCensus {
        let mask = self.params.hue_range.segment(frame);
        let contours = find_external_contours(&mask);
        let objects = above_threshold(&contours, self.params.min_area);
        let overlays = annotate_objects(frame, &objects, &self.params.style);
        FrameCensus { objects, overlays }
    }
}

/// Machine-readable summary of one completed run.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    /// Tracked centroids in single-target mode; qualifying objects summed
    /// over all frames in census mode.
    pub observations: u64,
    pub deflection: [f64; 2],
    pub stopped_early: bool,
}

/// Drive the single-target pipeline over a whole stream.
///
/// Per the state machine: each frame goes preprocess → segment → extract →
/// select; on success centroid → observe → annotate; on a per-frame anomaly
/// the frame is skipped and logged. Stream exhaustion (or a renderer stop
/// signal) triggers finalization: the final deflection is logged and the
/// accumulated annotated frames are handed to the sink.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all)
)]
pub fn run_tracking(
    params: TrackerParams,
    source: &mut dyn FrameSource,
    renderer: &mut dyn Renderer,
    events: &mut dyn EventLog,
    sink: &mut dyn FrameSink,
) -> Result<RunSummary, PipelineError> {
    let mut tracker = SpotTracker::new(params);
    let mut recorded: Vec<RgbFrame> = Vec::new();
    let mut frame_index = 0u64;
    let mut skipped = 0u64;
    let mut stopped_early = false;

    while let Some(mut frame) = source.next_frame().map_err(PipelineError::Source)? {
        frame_index += 1;
        events
            .log(&format!("Start processing frame {frame_index}"))
            .map_err(PipelineError::Log)?;

        let overlays = match tracker.process_frame(&mut frame) {
            Ok(spot) => {
                events
                    .log(&format!(
                        "Frame {frame_index}: spot position ({:.1}, {:.1})",
                        spot.centroid.x, spot.centroid.y
                    ))
                    .map_err(PipelineError::Log)?;
                spot.overlays
            }
            Err(anomaly) => {
                skipped += 1;
                log::warn!("frame {frame_index} skipped: {anomaly}");
                events
                    .log(&format!("Frame {frame_index}: skipped ({anomaly})"))
                    .map_err(PipelineError::Log)?;
                Vec::new()
            }
        };

        let flow = renderer
            .show(&frame, &overlays)
            .map_err(PipelineError::Render)?;
        recorded.push(frame);
        if flow == RenderFlow::Stop {
            stopped_early = true;
            break;
        }
    }

    let deflection = tracker.deflection();
    events
        .log(&format!(
            "Deflection: ({:.1}, {:.1})",
            deflection.x, deflection.y
        ))
        .map_err(PipelineError::Log)?;
    finalize(events, sink, &recorded)?;

    Ok(RunSummary {
        frames_processed: frame_index,
        frames_skipped: skipped,
        observations: frame_index - skipped,
        deflection: [deflection.x, deflection.y],
        stopped_early,
    })
}

/// Drive the census pipeline over a whole stream.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip_all)
)]
pub fn run_census(
    params: CensusParams,
    source: &mut dyn FrameSource,
    renderer: &mut dyn Renderer,
    events: &mut dyn EventLog,
    sink: &mut dyn FrameSink,
) -> Result<RunSummary, PipelineError> {
    let census = ObjectCensus::new(params);
    let mut recorded: Vec<RgbFrame> = Vec::new();
    let mut frame_index = 0u64;
    let mut objects_total = 0u64;
    let mut stopped_early = false;

    while let Some(mut frame) = source.next_frame().map_err(PipelineError::Source)? {
        frame_index += 1;
        events
            .log(&format!("Start processing frame {frame_index}"))
            .map_err(PipelineError::Log)?;

        let result = census.process_frame(&mut frame);
        for obj in &result.objects {
            let anchor = obj
                .contour
                .anchor()
                .map(|p| (p.x, p.y))
                .unwrap_or_default();
            events
                .log(&format!(
                    "Frame {frame_index}: Detected Object {} - Area: {}, Position: ({}, {})",
                    obj.label, obj.area, anchor.0, anchor.1
                ))
                .map_err(PipelineError::Log)?;
        }
        events
            .log(&format!(
                "Frame {frame_index}: Total detected objects: {}",
                result.count()
            ))
            .map_err(PipelineError::Log)?;
        objects_total += result.count() as u64;

        let flow = renderer
            .show(&frame, &result.overlays)
            .map_err(PipelineError::Render)?;
        recorded.push(frame);
        if flow == RenderFlow::Stop {
            stopped_early = true;
            break;
        }
    }

    finalize(events, sink, &recorded)?;

    Ok(RunSummary {
        frames_processed: frame_index,
        frames_skipped: 0,
        observations: objects_total,
        deflection: [0.0, 0.0],
        stopped_early,
    })
}

fn finalize(
    events: &mut dyn EventLog,
    sink: &mut dyn FrameSink,
    recorded: &[RgbFrame],
) -> Result<(), PipelineError> {
    events
        .log("------------------Finished processing all frames------------------")
        .map_err(PipelineError::Log)?;
    for frame in recorded {
        sink.write(frame).map_err(PipelineError::Sink)?;
    }
    sink.finish().map_err(PipelineError::Sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{MemoryEventLog, NullRenderer, NullSink};
    use approx::assert_relative_eq;

    /// Dark frame with one bright square whose top-left corner is at (x, y).
    fn bright_square(x: usize, y: usize, side: usize) -> RgbFrame {
        let mut frame = RgbFrame::filled(64, 48, [0, 0, 0]);
        for dy in 0..side {
            for dx in 0..side {
                frame.set_pixel(x + dx, y + dy, [255, 255, 255]);
            }
        }
        frame
    }

    struct VecSource {
        frames: std::vec::IntoIter<RgbFrame>,
    }

    impl VecSource {
        fn new(frames: Vec<RgbFrame>) -> Self {
            Self {
                frames: frames.into_iter(),
            }
        }
    }

    impl FrameSource for VecSource {
        fn next_frame(&mut self) -> Result<Option<RgbFrame>, IoError> {
            Ok(self.frames.next())
        }
    }

    /// Renderer that requests a stop after a fixed number of frames.
    struct StopAfter(usize);

    impl Renderer for StopAfter {
        fn show(&mut self, _: &RgbFrame, _: &[Overlay]) -> Result<RenderFlow, IoError> {
            if self.0 == 0 {
                return Ok(RenderFlow::Stop);
            }
            self.0 -= 1;
            Ok(RenderFlow::Continue)
        }
    }

    #[test]
    fn tracker_follows_a_moving_spot() {
        let mut tracker = SpotTracker::new(TrackerParams::default());
        let mut f1 = bright_square(10, 10, 9);
        let mut f2 = bright_square(22, 26, 9);
        let s1 = tracker.process_frame(&mut f1).unwrap();
        let s2 = tracker.process_frame(&mut f2).unwrap();

        assert_relative_eq!(s1.centroid.x, 14.0, epsilon = 1.0);
        assert_relative_eq!(s1.centroid.y, 14.0, epsilon = 1.0);
        assert_relative_eq!(s2.centroid.x, 26.0, epsilon = 1.0);

        let d = tracker.deflection();
        assert_relative_eq!(d.x, 12.0, epsilon = 1.5);
        assert_relative_eq!(d.y, 16.0, epsilon = 1.5);
    }

    #[test]
    fn tracker_picks_the_largest_of_several_spots() {
        let mut frame = bright_square(4, 4, 3);
        // Second, larger spot.
        for dy in 0..12 {
            for dx in 0..12 {
                frame.set_pixel(40 + dx, 20 + dy, [255, 255, 255]);
            }
        }
        let mut tracker = SpotTracker::new(TrackerParams::default());
        let spot = tracker.process_frame(&mut frame).unwrap();
        assert!(spot.centroid.x > 30.0);
    }

    #[test]
    fn dark_frame_is_skipped_and_history_is_unchanged() {
        let mut tracker = SpotTracker::new(TrackerParams::default());
        let mut dark = RgbFrame::filled(64, 48, [15, 15, 15]);
        assert_eq!(
            tracker.process_frame(&mut dark).unwrap_err(),
            DetectError::NoDetection
        );
        assert!(tracker.history().is_empty());

        // A usable frame afterwards is tracked normally.
        let mut bright = bright_square(10, 10, 9);
        tracker.process_frame(&mut bright).unwrap();
        assert_eq!(tracker.history().len(), 1);
    }

    #[test]
    fn run_tracking_contains_anomalies_and_reports_deflection() {
        let frames = vec![
            bright_square(10, 10, 9),
            RgbFrame::filled(64, 48, [0, 0, 0]), // skipped
            bright_square(13, 14, 9),
        ];
        let mut source = VecSource::new(frames);
        let mut renderer = NullRenderer;
        let mut events = MemoryEventLog::default();
        let mut sink = NullSink;

        let summary = run_tracking(
            TrackerParams::default(),
            &mut source,
            &mut renderer,
            &mut events,
            &mut sink,
        )
        .unwrap();

        assert_eq!(summary.frames_processed, 3);
        assert_eq!(summary.frames_skipped, 1);
        assert!(!summary.stopped_early);
        assert_relative_eq!(summary.deflection[0], 3.0, epsilon = 1.0);
        assert_relative_eq!(summary.deflection[1], 4.0, epsilon = 1.0);

        assert!(events
            .records
            .iter()
            .any(|r| r.contains("skipped (no contour detected in frame)")));
        assert!(events
            .records
            .iter()
            .any(|r| r.starts_with("Deflection: (")));
        assert!(events
            .records
            .last()
            .unwrap()
            .contains("Finished processing all frames"));
    }

    #[test]
    fn run_tracking_honors_the_stop_signal() {
        let frames = vec![
            bright_square(10, 10, 9),
            bright_square(12, 10, 9),
            bright_square(14, 10, 9),
        ];
        let mut source = VecSource::new(frames);
        let mut renderer = StopAfter(1);
        let mut events = MemoryEventLog::default();
        let mut sink = NullSink;

        let summary = run_tracking(
            TrackerParams::default(),
            &mut source,
            &mut renderer,
            &mut events,
            &mut sink,
        )
        .unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.frames_processed, 2);
    }

    fn red_square_frame(squares: &[(usize, usize, usize)]) -> RgbFrame {
        let mut frame = RgbFrame::filled(64, 48, [0, 0, 0]);
        for &(x, y, side) in squares {
            for dy in 0..side {
                for dx in 0..side {
                    // Hue ~176 in the 8-bit convention: inside the red preset.
                    frame.set_pixel(x + dx, y + dy, [255, 0, 30]);
                }
            }
        }
        frame
    }

    #[test]
    fn census_counts_do_not_carry_over_between_frames() {
        let census = ObjectCensus::new(CensusParams::default());

        // Two 10x10 red squares: polygon area 81 each, above the threshold.
        let mut two = red_square_frame(&[(4, 4, 10), (30, 20, 10)]);
        let first = census.process_frame(&mut two);
        assert_eq!(first.count(), 2);
        assert_eq!(first.objects[0].label, 1);
        assert_eq!(first.objects[1].label, 2);

        let mut none = RgbFrame::filled(64, 48, [0, 0, 0]);
        let second = census.process_frame(&mut none);
        assert_eq!(second.count(), 0);

        let mut one = red_square_frame(&[(10, 10, 10)]);
        let third = census.process_frame(&mut one);
        assert_eq!(third.count(), 1);
        assert_eq!(third.objects[0].label, 1);
    }

    #[test]
    fn census_filters_small_noise_blobs() {
        let census = ObjectCensus::new(CensusParams::default());
        // 5x5 square: polygon area 16, under the 50.0 noise threshold.
        let mut frame = red_square_frame(&[(4, 4, 5), (30, 20, 12)]);
        let result = census.process_frame(&mut frame);
        assert_eq!(result.count(), 1);
        assert!(result.objects[0].area > 50.0);
    }

    #[test]
    fn run_census_logs_objects_and_totals() {
        let frames = vec![
            red_square_frame(&[(4, 4, 10), (30, 20, 10)]),
            red_square_frame(&[(10, 10, 10)]),
        ];
        let mut source = VecSource::new(frames);
        let mut renderer = NullRenderer;
        let mut events = MemoryEventLog::default();
        let mut sink = NullSink;

        let summary = run_census(
            CensusParams::default(),
            &mut source,
            &mut renderer,
            &mut events,
            &mut sink,
        )
        .unwrap();

        assert_eq!(summary.frames_processed, 2);
        assert_eq!(summary.observations, 3);
        assert!(events
            .records
            .contains(&"Frame 1: Total detected objects: 2".to_owned()));
        assert!(events
            .records
            .contains(&"Frame 2: Total detected objects: 1".to_owned()));
        assert!(events
            .records
            .iter()
            .any(|r| r.starts_with("Frame 1: Detected Object 1 - Area: ")));
    }
}
