//! Target selection over the extracted contour set.

use nalgebra::Point2;

use crate::contour::Contour;
use crate::error::DetectError;
use crate::moments;

/// One qualifying detection in multi-target mode. Area and centroid are
/// derived from the contour, not independently settable.
#[derive(Clone, Debug)]
pub struct DetectedObject {
    pub contour: Contour,
    pub area: f64,
    /// `None` for contours with zero enclosed area.
    pub centroid: Option<Point2<f64>>,
    /// Sequential 1-based label in enumeration order.
    pub label: usize,
}

impl DetectedObject {
    pub fn from_contour(contour: Contour, label: usize) -> Self {
        let area = contour.area();
        let centroid = moments::centroid(&contour).ok();
        Self {
            contour,
            area,
            centroid,
            label,
        }
    }
}

/// Single-target policy: the contour with maximum area.
///
/// An empty contour set is a representable, recoverable state: this returns
/// [`DetectError::NoDetection`] instead of taking an unconditional maximum,
/// which would be undefined on an empty set.
pub fn largest(contours: &[Contour]) -> Result<&Contour, DetectError> {
    contours
        .iter()
        .map(|c| (c.area(), c))
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, c)| c)
        .ok_or(DetectError::NoDetection)
}

/// Multi-target policy: every contour whose area is strictly greater than
/// `min_area`, labeled 1..n in enumeration order. Always well-defined,
/// possibly empty.
pub fn above_threshold(contours: &[Contour], min_area: f64) -> Vec<DetectedObject> {
    contours
        .iter()
        .filter(|c| c.area() > min_area)
        .cloned()
        .enumerate()
        .map(|(i, c)| DetectedObject::from_contour(c, i + 1))
        .collect()
}
