use crate::config::SegmentationConfig;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::erode;

/// Strip the thin fringe the rotation leaves around the card
///
/// Pixels with any zero channel count as padding; everything within
/// `fringe_radius` of padding is blackened as well.
pub fn apply(mut card: RgbImage, config: &SegmentationConfig) -> RgbImage {
    let content = content_mask(&card);
    let kept = erode(&content, Norm::LInf, config.fringe_radius());

    for (pixel, keep) in card.pixels_mut().zip(kept.pixels()) {
        if keep.0[0] == 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    card
}

/// 255 where every channel lies in [1, 255]
fn content_mask(card: &RgbImage) -> GrayImage {
    GrayImage::from_fn(card.width(), card.height(), |x, y| {
        if card.get_pixel(x, y).0.iter().all(|&c| c >= 1) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
