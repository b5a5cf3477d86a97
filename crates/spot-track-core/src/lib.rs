//! Core algorithms for light-spot detection and tracking.
//!
//! This crate is intentionally small and purely algorithmic: segmentation,
//! contour extraction, moment-based centroids and motion aggregation over
//! in-memory frame buffers. It does *not* open cameras, draw windows or
//! write files; those collaborators live behind the seams in `spot-track`.

mod contour;
mod error;
mod frame;
mod logger;
mod moments;
mod preprocess;
mod segment;
mod select;
mod track;

pub use contour::{find_external_contours, Contour};
pub use error::DetectError;
pub use frame::{FrameError, GrayFrame, Mask, RgbFrame, MASK_FG};
pub use moments::{centroid, contour_moments, Moments};
pub use preprocess::{
    auto_sigma, gaussian_kernel, preprocess, smooth, to_gray, SMOOTHING_KERNEL_SIZE,
};
pub use segment::{rgb_to_hsv, Hsv, HueRange, IntensityThreshold, SegmentError, HUE_MAX};
pub use select::{above_threshold, largest, DetectedObject};
pub use track::PositionHistory;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init, init_with_level};
