//! Detection overlays: a marker plus position label in single-target mode,
//! contour outlines with sequential object labels in census mode.
//!
//! Geometric primitives (marker disk, polygon outline) are rasterized
//! directly into the frame so recorded output carries them. Text stays an
//! overlay primitive handed to the [`Renderer`](crate::io::Renderer); glyph
//! rendering is the display collaborator's concern.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use spot_track_core::{Contour, DetectedObject, RgbFrame};

/// Overlay primitives a renderer can draw on top of a frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    Marker { center: Point2<i32>, radius: i32 },
    Outline { points: Vec<Point2<i32>> },
    Text { anchor: Point2<i32>, text: String },
}

/// Annotation style shared by both modes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AnnotationStyle {
    pub color: [u8; 3],
    pub marker_radius: i32,
    /// Fixed screen anchor of the single-target position label.
    pub label_anchor: [i32; 2],
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            marker_radius: 5,
            label_anchor: [10, 30],
        }
    }
}

/// Single-target annotation: filled marker at the centroid plus a position
/// label at a fixed screen anchor.
pub fn annotate_tracked(
    frame: &mut RgbFrame,
    centroid: Point2<f64>,
    style: &AnnotationStyle,
) -> Vec<Overlay> {
    let center = Point2::new(centroid.x.round() as i32, centroid.y.round() as i32);
    draw_disk(frame, center, style.marker_radius, style.color);
    vec![
        Overlay::Marker {
            center,
            radius: style.marker_radius,
        },
        Overlay::Text {
            anchor: Point2::new(style.label_anchor[0], style.label_anchor[1]),
            text: format!("Position: ({:.1}, {:.1})", centroid.x, centroid.y),
        },
    ]
}

/// Census annotation: outline and `Object N` label per qualifying object.
/// The label is anchored just above the object's first boundary vertex.
pub fn annotate_objects(
    frame: &mut RgbFrame,
    objects: &[DetectedObject],
    style: &AnnotationStyle,
) -> Vec<Overlay> {
    let mut overlays = Vec::with_capacity(2 * objects.len());
    for obj in objects {
        draw_contour(frame, &obj.contour, style.color);
        overlays.push(Overlay::Outline {
            points: obj.contour.points.clone(),
        });
        if let Some(anchor) = obj.contour.anchor() {
            overlays.push(Overlay::Text {
                anchor: Point2::new(anchor.x, anchor.y - 10),
                text: format!("Object {}", obj.label),
            });
        }
    }
    overlays
}

/// Closed polygon outline via Bresenham segments, clipped to the frame.
pub fn draw_contour(frame: &mut RgbFrame, contour: &Contour, color: [u8; 3]) {
    let pts = &contour.points;
    match pts.len() {
        0 => {}
        1 => put_pixel(frame, pts[0].x, pts[0].y, color),
        _ => {
            for i in 0..pts.len() {
                let a = pts[i];
                let b = pts[(i + 1) % pts.len()];
                draw_line(frame, a, b, color);
            }
        }
    }
}

/// Filled disk, clipped to the frame.
pub fn draw_disk(frame: &mut RgbFrame, center: Point2<i32>, radius: i32, color: [u8; 3]) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put_pixel(frame, center.x + dx, center.y + dy, color);
            }
        }
    }
}

pub fn draw_line(frame: &mut RgbFrame, a: Point2<i32>, b: Point2<i32>, color: [u8; 3]) {
    let (mut x, mut y) = (a.x, a.y);
    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(frame, x, y, color);
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[inline]
fn put_pixel(frame: &mut RgbFrame, x: i32, y: i32, color: [u8; 3]) {
    if x >= 0 && y >= 0 && (x as usize) < frame.width() && (y as usize) < frame.height() {
        frame.set_pixel(x as usize, y as usize, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spot_track_core::Contour;

    #[test]
    fn tracked_annotation_draws_marker_and_position_label() {
        let mut frame = RgbFrame::filled(64, 64, [0, 0, 0]);
        let style = AnnotationStyle::default();
        let overlays = annotate_tracked(&mut frame, Point2::new(32.4, 20.6), &style);

        assert_eq!(frame.pixel(32, 21), [0, 255, 0]);
        assert_eq!(frame.pixel(32 + 5, 21), [0, 255, 0]); // disk edge
        assert_eq!(frame.pixel(32 + 6, 21), [0, 0, 0]);

        assert!(matches!(
            &overlays[0],
            Overlay::Marker { center, radius: 5 } if *center == Point2::new(32, 21)
        ));
        match &overlays[1] {
            Overlay::Text { anchor, text } => {
                assert_eq!(*anchor, Point2::new(10, 30));
                assert_eq!(text, "Position: (32.4, 20.6)");
            }
            other => panic!("expected text overlay, got {other:?}"),
        }
    }

    #[test]
    fn census_annotation_labels_objects_sequentially() {
        let mut frame = RgbFrame::filled(32, 32, [0, 0, 0]);
        let rect = |x0: i32| {
            Contour::new(vec![
                Point2::new(x0, 12),
                Point2::new(x0 + 8, 12),
                Point2::new(x0 + 8, 20),
                Point2::new(x0, 20),
            ])
        };
        let objects = vec![
            DetectedObject::from_contour(rect(2), 1),
            DetectedObject::from_contour(rect(16), 2),
        ];
        let overlays = annotate_objects(&mut frame, &objects, &AnnotationStyle::default());

        // Outline pixels are burned in.
        assert_eq!(frame.pixel(2, 12), [0, 255, 0]);
        assert_eq!(frame.pixel(6, 12), [0, 255, 0]);
        assert_eq!(frame.pixel(6, 16), [0, 0, 0]); // interior untouched

        let labels: Vec<&str> = overlays
            .iter()
            .filter_map(|o| match o {
                Overlay::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["Object 1", "Object 2"]);
        match &overlays[1] {
            Overlay::Text { anchor, .. } => assert_eq!(*anchor, Point2::new(2, 2)),
            other => panic!("expected text overlay, got {other:?}"),
        }
    }

    #[test]
    fn drawing_is_clipped_at_frame_borders() {
        let mut frame = RgbFrame::filled(8, 8, [0, 0, 0]);
        draw_disk(&mut frame, Point2::new(0, 0), 5, [255, 0, 0]);
        draw_line(
            &mut frame,
            Point2::new(-3, 4),
            Point2::new(12, 4),
            [255, 0, 0],
        );
        assert_eq!(frame.pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.pixel(7, 4), [255, 0, 0]);
    }
}
