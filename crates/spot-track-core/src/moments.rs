//! Spatial moments and the area-weighted centroid of a contour polygon.

use nalgebra::Point2;

use crate::contour::Contour;
use crate::error::DetectError;

/// Zeroth and first spatial moments of a contour polygon, computed with
/// Green's theorem over the closed vertex sequence. `m00` is the enclosed
/// area; `m10`/`m01` are the position sums whose ratio to `m00` gives the
/// centroid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
}

pub fn contour_moments(contour: &Contour) -> Moments {
    let pts = &contour.points;
    if pts.len() < 3 {
        return Moments {
            m00: 0.0,
            m10: 0.0,
            m01: 0.0,
        };
    }

    let mut a2 = 0.0; // twice the signed area
    let mut sx = 0.0;
    let mut sy = 0.0;
    for i in 0..pts.len() {
        let p: Point2<i32> = pts[i];
        let q: Point2<i32> = pts[(i + 1) % pts.len()];
        let cross = (p.x as f64) * (q.y as f64) - (q.x as f64) * (p.y as f64);
        a2 += cross;
        sx += (p.x + q.x) as f64 * cross;
        sy += (p.y + q.y) as f64 * cross;
    }

    // Vertex winding depends on the tracing direction; normalize so m00 is
    // the unsigned area and the first moments keep a consistent sign.
    let sign = if a2 < 0.0 { -1.0 } else { 1.0 };
    Moments {
        m00: sign * a2 / 2.0,
        m10: sign * sx / 6.0,
        m01: sign * sy / 6.0,
    }
}

/// Area-weighted centroid `(m10/m00, m01/m00)`.
///
/// The zero-area denominator is guarded explicitly: a degenerate contour is
/// a recoverable [`DetectError::DegenerateContour`], never a division by
/// zero.
pub fn centroid(contour: &Contour) -> Result<Point2<f64>, DetectError> {
    let m = contour_moments(contour);
    if m.m00 == 0.0 {
        return Err(DetectError::DegenerateContour);
    }
    Ok(Point2::new(m.m10 / m.m00, m.m01 / m.m00))
}
