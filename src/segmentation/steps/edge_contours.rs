use crate::config::SegmentationConfig;
use crate::segmentation::geometry::Contour;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length};

/// Paint every background pixel of the scan black
pub fn suppress_background(mut scan: RgbImage, mask: &GrayImage) -> RgbImage {
    for (pixel, m) in scan.pixels_mut().zip(mask.pixels()) {
        if m.0[0] != 0 {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    scan
}

/// Edge map of the background mask; the scan itself is never blurred
pub fn edges(mask: &GrayImage, config: &SegmentationConfig) -> GrayImage {
    let blurred = gaussian_blur_f32(mask, config.blur_sigma());
    canny(&blurred, config.canny_low, config.canny_high)
}

/// Card boundary candidates found in the background mask, in scan order
pub fn apply(mask: &GrayImage, config: &SegmentationConfig) -> Vec<Contour> {
    let (width, height) = mask.dimensions();
    candidates(&edges(mask, config), width, height, config)
}

/// Outer contours of an edge map, simplified to polygons and filtered by size
pub fn candidates(
    edges: &GrayImage,
    width: u32,
    height: u32,
    config: &SegmentationConfig,
) -> Vec<Contour> {
    let min_width = width as f64 * config.min_candidate_ratio;
    let min_height = height as f64 * config.min_candidate_ratio;

    let outer: Vec<_> = find_contours::<i32>(edges)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .collect();

    let kept: Vec<Contour> = outer
        .into_iter()
        .filter_map(|c| {
            let epsilon = config.poly_epsilon * arc_length(&c.points, true);
            let points = if c.points.len() < 3 || epsilon <= 0.0 {
                c.points
            } else {
                approximate_polygon_dp(&c.points, epsilon, true)
            };

            let contour = Contour::new(points);
            let bbox = contour.bounding_box();
            if bbox.width as f64 > min_width && bbox.height as f64 > min_height {
                Some(contour)
            } else {
                tracing::trace!(?bbox, "Rejected undersized candidate");
                None
            }
        })
        .collect();

    tracing::debug!(candidates = kept.len(), "Extracted card candidates");
    kept
}
