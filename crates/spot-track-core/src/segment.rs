//! Foreground segmentation strategies.
//!
//! Two interchangeable segmenters produce a binary [`Mask`]: a fixed
//! intensity cutoff for a bright spot on a darker background, and an
//! inclusive HSV range test for a colored spot. Hue bounds are validated at
//! construction; an out-of-domain range is a configuration error, never a
//! silently empty mask.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::frame::{GrayFrame, Mask, RgbFrame};

/// Upper end of the hue domain in the 8-bit convention (degrees / 2).
pub const HUE_MAX: u8 = 179;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error(
        "invalid hue range {lower:?}..={upper:?}: hue must lie in 0..={HUE_MAX} \
         and lower bounds must not exceed upper bounds"
    )]
    InvalidHueRange { lower: Hsv, upper: Hsv },
}

/// Intensity-threshold segmentation of a single-channel frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct IntensityThreshold {
    /// Pixels at or above this value are foreground.
    pub cutoff: u8,
}

impl Default for IntensityThreshold {
    fn default() -> Self {
        Self { cutoff: 200 }
    }
}

impl IntensityThreshold {
    pub fn segment(&self, frame: &GrayFrame) -> Mask {
        let mut mask = Mask::new(frame.width(), frame.height());
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                mask.set_foreground(x, y, frame.at(x, y) >= self.cutoff);
            }
        }
        mask
    }
}

/// An HSV triple in the 8-bit convention: hue 0..=179, saturation and value
/// 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }
}

/// Hue-range segmentation of a color frame.
///
/// A pixel is foreground when every HSV channel falls inside the inclusive
/// per-channel range. Deserialization routes through [`HueRange::new`], so
/// an out-of-domain range in a config file is rejected up front instead of
/// silently masking nothing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(try_from = "HueRangeBounds")]
pub struct HueRange {
    lower: Hsv,
    upper: Hsv,
}

/// Unvalidated mirror of [`HueRange`] used on the deserialize path.
#[derive(Clone, Copy, Deserialize)]
struct HueRangeBounds {
    lower: Hsv,
    upper: Hsv,
}

impl TryFrom<HueRangeBounds> for HueRange {
    type Error = SegmentError;

    fn try_from(bounds: HueRangeBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.lower, bounds.upper)
    }
}

impl HueRange {
    pub fn new(lower: Hsv, upper: Hsv) -> Result<Self, SegmentError> {
        let hue_in_domain = lower.h <= HUE_MAX && upper.h <= HUE_MAX;
        let ordered = lower.h <= upper.h && lower.s <= upper.s && lower.v <= upper.v;
        if !hue_in_domain || !ordered {
            return Err(SegmentError::InvalidHueRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Preset for a saturated red spot near the top of the hue circle.
    pub fn red() -> Self {
        Self {
            lower: Hsv::new(160, 100, 100),
            upper: Hsv::new(HUE_MAX, 255, 255),
        }
    }

    pub fn lower(&self) -> Hsv {
        self.lower
    }

    pub fn upper(&self) -> Hsv {
        self.upper
    }

    pub fn segment(&self, frame: &RgbFrame) -> Mask {
        let mut mask = Mask::new(frame.width(), frame.height());
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let p = rgb_to_hsv(frame.pixel(x, y));
                let fg = (self.lower.h..=self.upper.h).contains(&p.h)
                    && (self.lower.s..=self.upper.s).contains(&p.s)
                    && (self.lower.v..=self.upper.v).contains(&p.v);
                mask.set_foreground(x, y, fg);
            }
        }
        mask
    }
}

/// RGB to HSV in the 8-bit convention (hue halved into 0..=179).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> Hsv {
    let r = rgb[0] as f32 / 255.0;
    let g = rgb[1] as f32 / 255.0;
    let b = rgb[2] as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }

    let s = if max > 0.0 { delta / max } else { 0.0 };

    Hsv {
        h: ((h_deg / 2.0).round() as u32).min(HUE_MAX as u32) as u8,
        s: (s * 255.0).round() as u8,
        v: (max * 255.0).round() as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_is_inclusive() {
        let mut f = GrayFrame::filled(3, 1, 0);
        f.set(0, 0, 199);
        f.set(1, 0, 200);
        f.set(2, 0, 201);
        let mask = IntensityThreshold::default().segment(&f);
        assert!(!mask.is_foreground(0, 0));
        assert!(mask.is_foreground(1, 0));
        assert!(mask.is_foreground(2, 0));
    }

    #[test]
    fn below_cutoff_frame_yields_empty_mask() {
        let f = GrayFrame::filled(16, 16, 120);
        let mask = IntensityThreshold::default().segment(&f);
        assert_eq!(mask.foreground_count(), 0);
    }

    #[test]
    fn hue_upper_bound_outside_domain_is_rejected() {
        // An upper hue past 179 would silently select nothing.
        let err = HueRange::new(Hsv::new(130, 100, 100), Hsv::new(255, 255, 255)).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidHueRange { .. }));
    }

    #[test]
    fn inverted_channel_bounds_are_rejected() {
        let err = HueRange::new(Hsv::new(100, 200, 0), Hsv::new(120, 100, 255)).unwrap_err();
        assert!(matches!(err, SegmentError::InvalidHueRange { .. }));
    }

    #[test]
    fn deserialization_validates_hue_bounds() {
        let json = r#"{"lower":{"h":130,"s":100,"v":100},"upper":{"h":255,"s":255,"v":255}}"#;
        let err = serde_json::from_str::<HueRange>(json).unwrap_err();
        assert!(err.to_string().contains("invalid hue range"));

        let json = r#"{"lower":{"h":160,"s":100,"v":100},"upper":{"h":179,"s":255,"v":255}}"#;
        let range: HueRange = serde_json::from_str(json).unwrap();
        assert_eq!(range.lower(), Hsv::new(160, 100, 100));
        assert_eq!(range.upper(), Hsv::new(179, 255, 255));
    }

    #[test]
    fn serialization_round_trips_through_validation() {
        let range = HueRange::red();
        let json = serde_json::to_string(&range).unwrap();
        let back: HueRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lower(), range.lower());
        assert_eq!(back.upper(), range.upper());
    }

    #[test]
    fn rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), Hsv::new(0, 255, 255));
        assert_eq!(rgb_to_hsv([0, 255, 0]), Hsv::new(60, 255, 255));
        assert_eq!(rgb_to_hsv([0, 0, 255]), Hsv::new(120, 255, 255));
        assert_eq!(rgb_to_hsv([0, 0, 0]), Hsv::new(0, 0, 0));
        assert_eq!(rgb_to_hsv([255, 255, 255]), Hsv::new(0, 0, 255));
    }

    #[test]
    fn red_preset_selects_red_pixels_only() {
        let mut f = RgbFrame::filled(2, 1, [0, 0, 255]); // blue
        f.set_pixel(0, 0, [255, 0, 30]); // slightly magenta red, hue ~176
        let mask = HueRange::red().segment(&f);
        assert!(mask.is_foreground(0, 0));
        assert!(!mask.is_foreground(1, 0));
    }
}
