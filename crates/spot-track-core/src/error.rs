use thiserror::Error;

/// Per-frame, recoverable detection anomalies.
///
/// Both variants are contained at the frame boundary by the pipeline: the
/// frame is skipped, history stays unchanged, and the anomaly is logged.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum DetectError {
    /// Segmentation produced no contours, so there is no largest contour to
    /// pick. An empty detection set is a representable state, not a crash.
    #[error("no contour detected in frame")]
    NoDetection,

    /// The contour encloses no area (zeroth moment is zero), e.g. a single
    /// pixel or a one-pixel-wide line; a centroid is undefined for it.
    #[error("degenerate contour with zero enclosed area")]
    DegenerateContour,
}
