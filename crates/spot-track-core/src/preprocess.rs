//! Frame normalization ahead of segmentation: grayscale conversion and a
//! fixed-size Gaussian smoothing pass to suppress single-pixel noise.

use crate::frame::{GrayFrame, RgbFrame};

/// Kernel size used by [`smooth`]. Chosen to knock out single-pixel noise
/// without washing out a small light spot.
pub const SMOOTHING_KERNEL_SIZE: usize = 5;

/// BT.601 luma conversion.
pub fn to_gray(frame: &RgbFrame) -> GrayFrame {
    let mut out = GrayFrame::filled(frame.width(), frame.height(), 0);
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let [r, g, b] = frame.pixel(x, y);
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            out.set(x, y, luma.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// Conventional auto-derived Gaussian spread for a given kernel size.
pub fn auto_sigma(ksize: usize) -> f64 {
    0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian kernel of odd length `ksize`.
pub fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f64> {
    debug_assert!(ksize % 2 == 1);
    let half = (ksize / 2) as i64;
    let mut kernel: Vec<f64> = (-half..=half)
        .map(|i| (-(i * i) as f64 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Separable Gaussian smoothing with border replication.
pub fn smooth(frame: &GrayFrame) -> GrayFrame {
    let ksize = SMOOTHING_KERNEL_SIZE;
    let kernel = gaussian_kernel(ksize, auto_sigma(ksize));
    let half = (ksize / 2) as i64;
    let (w, h) = (frame.width(), frame.height());

    // Horizontal pass into an f64 scratch buffer, vertical pass back to u8.
    let mut scratch = vec![0f64; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = x as i64 + k as i64 - half;
                acc += weight * frame.at_clamped(sx, y as i64) as f64;
            }
            scratch[y * w + x] = acc;
        }
    }

    let mut out = GrayFrame::filled(w, h, 0);
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as i64 + k as i64 - half).clamp(0, h as i64 - 1);
                acc += weight * scratch[sy as usize * w + x];
            }
            out.set(x, y, acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}

/// Full preprocessing stage: grayscale + smoothing. Total function of any
/// valid frame; no error conditions.
pub fn preprocess(frame: &RgbFrame) -> GrayFrame {
    smooth(&to_gray(frame))
}
