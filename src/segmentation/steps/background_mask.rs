use crate::config::SegmentationConfig;
use crate::error::SegmentError;
use crate::segmentation::hsv::Hsv;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

const BACKGROUND: u8 = 255;

/// Build the background-sheet mask (255 = sheet, 0 = anything else)
///
/// Non-sheet regions touching the frame border are folded into the sheet,
/// then a morphological opening removes speckles.
pub fn apply(scan: &RgbImage, config: &SegmentationConfig) -> Result<GrayImage, SegmentError> {
    let (width, height) = scan.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentError::InvalidInput(format!(
            "scan has zero area ({}x{})",
            width, height
        )));
    }

    let (lower, upper) = hsv_bounds(config);
    let mut mask = threshold(scan, lower, upper);

    let merged = merge_border_regions(&mut mask);
    tracing::debug!(merged, "Folded border-touching regions into background");

    Ok(open(&mask, Norm::LInf, config.open_radius()))
}

/// Inclusive HSV box accepted as background
pub fn hsv_bounds(config: &SegmentationConfig) -> (Hsv, Hsv) {
    let reference = Hsv::from(config.background_color());
    let lower = Hsv {
        h: reference.h.saturating_sub(config.hue_tolerance),
        s: config.saturation_floor,
        v: config.value_floor,
    };
    let upper = Hsv {
        h: reference.h.saturating_add(config.hue_tolerance),
        s: u8::MAX,
        v: u8::MAX,
    };
    (lower, upper)
}

fn threshold(scan: &RgbImage, lower: Hsv, upper: Hsv) -> GrayImage {
    GrayImage::from_fn(scan.width(), scan.height(), |x, y| {
        if Hsv::from(*scan.get_pixel(x, y)).within(lower, upper) {
            Luma([BACKGROUND])
        } else {
            Luma([0])
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct RegionStats {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    area: u64,
}

impl RegionStats {
    fn touches_border(&self, width: u32, height: u32) -> bool {
        self.min_x == 0 || self.min_y == 0 || self.max_x + 1 == width || self.max_y + 1 == height
    }
}

/// Label the mask's complement and mark every border-touching region except
/// the largest one as background. Label 0 is the sheet itself and takes part
/// in the largest-area contest. Returns the number of regions merged.
fn merge_border_regions(mask: &mut GrayImage) -> usize {
    let (width, height) = mask.dimensions();

    let mut complement = mask.clone();
    image::imageops::invert(&mut complement);
    let labels = connected_components(&complement, Connectivity::Eight, Luma([0u8]));

    let mut regions: HashMap<u32, RegionStats> = HashMap::new();
    for (x, y, label) in labels.enumerate_pixels() {
        regions
            .entry(label[0])
            .and_modify(|r| {
                r.min_x = r.min_x.min(x);
                r.min_y = r.min_y.min(y);
                r.max_x = r.max_x.max(x);
                r.max_y = r.max_y.max(y);
                r.area += 1;
            })
            .or_insert(RegionStats {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                area: 1,
            });
    }

    // Ties go to the lowest label
    let largest = regions
        .iter()
        .max_by_key(|(label, stats)| (stats.area, Reverse(**label)))
        .map(|(label, _)| *label);

    let to_merge: HashSet<u32> = regions
        .iter()
        .filter(|(label, stats)| Some(**label) != largest && stats.touches_border(width, height))
        .map(|(label, _)| *label)
        .collect();

    if to_merge.is_empty() {
        return 0;
    }

    for (x, y, label) in labels.enumerate_pixels() {
        if to_merge.contains(&label[0]) {
            mask.put_pixel(x, y, Luma([BACKGROUND]));
        }
    }

    to_merge.len()
}
