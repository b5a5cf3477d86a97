//! Cross-frame aggregation of tracked centroids.

use nalgebra::{Point2, Vector2};

/// Append-only sequence of centroids, one per successfully processed frame,
/// in frame arrival order.
#[derive(Clone, Debug, Default)]
pub struct PositionHistory {
    positions: Vec<Point2<f64>>,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one observation. Total function; never fails.
    pub fn observe(&mut self, centroid: Point2<f64>) {
        self.positions.push(centroid);
    }

    /// Net displacement between the first and most recent observation.
    ///
    /// Zero vector while fewer than two observations exist, so this is a
    /// monotonic running value that is safe to call at any point in the
    /// stream.
    pub fn deflection(&self) -> Vector2<f64> {
        match (self.positions.first(), self.positions.last()) {
            (Some(first), Some(last)) if self.positions.len() >= 2 => last - first,
            _ => Vector2::zeros(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn last(&self) -> Option<Point2<f64>> {
        self.positions.last().copied()
    }

    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }
}
