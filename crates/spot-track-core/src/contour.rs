//! Outer-boundary extraction from a binary mask.
//!
//! Connected foreground regions (8-connectivity) are discovered in row-major
//! scan order; for each region the outer boundary is traced with
//! Moore-neighbour following starting at the region's topmost-leftmost pixel.
//! Interior holes are not reported. Collinear interior vertices are dropped,
//! so the stored polygon is a reduced vertex set rather than every boundary
//! pixel.

use nalgebra::Point2;

use crate::frame::Mask;

/// Ordered closed polygon approximating one connected foreground region's
/// outer boundary. Never self-intersecting by construction (the boundary may
/// pass through a pinch pixel twice, which keeps the traversal closed).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point2<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point2<i32>>) -> Self {
        Self { points }
    }

    /// Polygon area, the same quantity as the zeroth spatial moment.
    pub fn area(&self) -> f64 {
        crate::moments::contour_moments(self).m00
    }

    /// First boundary vertex; the representative point used for labels.
    pub fn anchor(&self) -> Option<Point2<i32>> {
        self.points.first().copied()
    }
}

// Clockwise 8-neighbourhood in screen coordinates (y grows downward).
const DX: [i32; 8] = [1, 1, 0, -1, -1, -1, 0, 1];
const DY: [i32; 8] = [0, 1, 1, 1, 0, -1, -1, -1];

/// Extract the outer boundaries of all 8-connected foreground components.
///
/// Components are emitted in discovery order of the row-major scan, i.e.
/// topmost-leftmost component first. This makes downstream label assignment
/// deterministic.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    let (w, h) = (mask.width(), mask.height());
    let mut labels = vec![0u32; w * h];
    let mut contours = Vec::new();
    let mut next_label = 0u32;

    for y in 0..h {
        for x in 0..w {
            if !mask.is_foreground(x, y) || labels[y * w + x] != 0 {
                continue;
            }
            next_label += 1;
            flood_fill(mask, &mut labels, next_label, x, y);
            let boundary = trace_outer_boundary(&labels, w, h, next_label, x, y);
            contours.push(Contour::new(simplify_collinear(boundary)));
        }
    }
    contours
}

/// 8-connected BFS labeling of one component.
fn flood_fill(mask: &Mask, labels: &mut [u32], label: u32, sx: usize, sy: usize) {
    let (w, h) = (mask.width(), mask.height());
    let mut queue = std::collections::VecDeque::new();
    labels[sy * w + sx] = label;
    queue.push_back((sx as i32, sy as i32));

    while let Some((x, y)) = queue.pop_front() {
        for d in 0..8 {
            let (nx, ny) = (x + DX[d], y + DY[d]);
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let idx = ny as usize * w + nx as usize;
            if labels[idx] == 0 && mask.is_foreground(nx as usize, ny as usize) {
                labels[idx] = label;
                queue.push_back((nx, ny));
            }
        }
    }
}

/// Moore-neighbour boundary following over one labeled component.
///
/// `(sx, sy)` must be the component's topmost-leftmost pixel, which
/// guarantees its west neighbour is background and gives a canonical start
/// state. Terminates when the initial move out of the start pixel repeats.
fn trace_outer_boundary(
    labels: &[u32],
    w: usize,
    h: usize,
    label: u32,
    sx: usize,
    sy: usize,
) -> Vec<Point2<i32>> {
    let hit = |x: i32, y: i32| -> bool {
        x >= 0
            && y >= 0
            && x < w as i32
            && y < h as i32
            && labels[y as usize * w + x as usize] == label
    };

    let start = Point2::new(sx as i32, sy as i32);
    let mut boundary = vec![start];
    let mut cur = start;
    // Direction from the current pixel to its backtrack (background) pixel;
    // the west neighbour of the start pixel is background by construction.
    let mut back = 4usize;
    let mut first_dir: Option<usize> = None;

    // Each boundary pixel is visited at most a handful of times.
    let max_steps = 4 * w * h + 8;
    for _ in 0..max_steps {
        let mut found = None;
        for i in 1..=8 {
            let d = (back + i) % 8;
            if hit(cur.x + DX[d], cur.y + DY[d]) {
                // The neighbour checked just before `d` is background and
                // becomes the next backtrack pixel.
                found = Some((d, (back + i - 1) % 8));
                break;
            }
        }
        let Some((d, last_bg)) = found else {
            break; // isolated single pixel
        };

        if cur == start {
            match first_dir {
                None => first_dir = Some(d),
                Some(d0) if d == d0 => break, // loop closed
                Some(_) => {}
            }
        }

        let next = Point2::new(cur.x + DX[d], cur.y + DY[d]);
        // The backtrack pixel is fixed in image space; recompute its
        // direction relative to the pixel we are moving onto.
        let bg_dx = cur.x + DX[last_bg] - next.x;
        let bg_dy = cur.y + DY[last_bg] - next.y;
        back = dir_index(bg_dx, bg_dy);
        boundary.push(next);
        cur = next;
    }

    // The final arrival duplicates the start vertex.
    if boundary.len() > 1 && boundary.last() == boundary.first() {
        boundary.pop();
    }
    boundary
}

fn dir_index(dx: i32, dy: i32) -> usize {
    for d in 0..8 {
        if DX[d] == dx && DY[d] == dy {
            return d;
        }
    }
    unreachable!("backtrack pixel is always king-adjacent");
}

/// Drop vertices that continue a straight run of boundary steps. Reversal
/// points (zero-area spikes) are kept so the traversal stays closed.
fn simplify_collinear(points: Vec<Point2<i32>>) -> Vec<Point2<i32>> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let cur = points[i];
        let next = points[(i + 1) % n];
        let (ax, ay) = (cur.x - prev.x, cur.y - prev.y);
        let (bx, by) = (next.x - cur.x, next.y - cur.y);
        let cross = ax * by - ay * bx;
        let dot = ax * bx + ay * by;
        if cross == 0 && dot > 0 {
            continue;
        }
        out.push(cur);
    }
    if out.is_empty() {
        // Fully collinear ring cannot happen for a traced boundary, but keep
        // the polygon non-empty for robustness.
        vec![points[0]]
    } else {
        out
    }
}
