//! Conversions between `image` crate buffers and the core frame types.

use spot_track_core::{FrameError, GrayFrame, RgbFrame};

pub fn frame_from_image(img: &image::RgbImage) -> Result<RgbFrame, FrameError> {
    RgbFrame::from_raw(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}

pub fn gray_from_image(img: &image::GrayImage) -> Result<GrayFrame, FrameError> {
    GrayFrame::from_raw(
        img.width() as usize,
        img.height() as usize,
        img.as_raw().clone(),
    )
}

pub fn image_from_frame(frame: &RgbFrame) -> image::RgbImage {
    image::RgbImage::from_fn(frame.width() as u32, frame.height() as u32, |x, y| {
        image::Rgb(frame.pixel(x as usize, y as usize))
    })
}
