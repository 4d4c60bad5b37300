use crate::config::SegmentationConfig;
use crate::segmentation::hsv::Hsv;
use image::{Rgb, RgbImage};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Paint near-black voids with the card's dominant color
///
/// The dominant color is taken over the non-void pixels only, so it can never
/// itself be a void. A card made entirely of voids is returned unchanged.
pub fn apply(mut card: RgbImage, config: &SegmentationConfig) -> RgbImage {
    let voids: Vec<bool> = card
        .pixels()
        .map(|p| Hsv::from(*p).all_below(config.void_threshold))
        .collect();

    let fill = dominant_color(
        card.pixels()
            .zip(&voids)
            .filter(|(_, void)| !**void)
            .map(|(p, _)| *p),
    );

    let Some(fill) = fill else {
        return card;
    };

    let mut filled = 0usize;
    for (pixel, void) in card.pixels_mut().zip(voids) {
        if void {
            *pixel = fill;
            filled += 1;
        }
    }
    tracing::trace!(filled, ?fill, "Filled card voids");
    card
}

/// Most frequent color; ties go to the smallest packed RGB value
pub fn dominant_color(pixels: impl IntoIterator<Item = Rgb<u8>>) -> Option<Rgb<u8>> {
    let mut counts: HashMap<u32, u64> = HashMap::new();
    for p in pixels {
        let [r, g, b] = p.0;
        let key = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        *counts.entry(key).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .max_by_key(|&(key, count)| (count, Reverse(key)))
        .map(|(key, _)| Rgb([(key >> 16) as u8, (key >> 8) as u8, key as u8]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_voids(card: &RgbImage) -> bool {
        card.pixels().any(|p| Hsv::from(*p).all_below(10))
    }

    #[test]
    fn test_voids_take_dominant_color() {
        let mut card = RgbImage::from_pixel(10, 10, Rgb([230, 220, 200]));
        for x in 0..4 {
            card.put_pixel(x, 0, Rgb([0, 0, 0]));
        }
        card.put_pixel(5, 5, Rgb([3, 3, 3]));
        card.put_pixel(6, 6, Rgb([10, 40, 90]));

        let result = apply(card, &SegmentationConfig::default());

        assert_eq!(result.get_pixel(0, 0), &Rgb([230, 220, 200]));
        assert_eq!(result.get_pixel(5, 5), &Rgb([230, 220, 200]));
        assert_eq!(result.get_pixel(6, 6), &Rgb([10, 40, 90]));
        assert!(!has_voids(&result));
    }

    #[test]
    fn test_mostly_black_card_still_loses_its_voids() {
        let mut card = RgbImage::new(20, 20);
        card.put_pixel(3, 3, Rgb([250, 250, 250]));

        let result = apply(card, &SegmentationConfig::default());

        assert!(!has_voids(&result));
        assert!(result.pixels().all(|p| p.0 == [250, 250, 250]));
    }

    #[test]
    fn test_all_void_card_is_unchanged() {
        let card = RgbImage::from_pixel(5, 5, Rgb([2, 2, 2]));
        let result = apply(card.clone(), &SegmentationConfig::default());
        assert_eq!(result, card);
    }

    #[test]
    fn test_dominant_color_breaks_ties_low() {
        let pixels = vec![Rgb([9, 9, 9]), Rgb([1, 2, 3]), Rgb([9, 9, 9]), Rgb([1, 2, 3])];
        assert_eq!(dominant_color(pixels), Some(Rgb([1, 2, 3])));
        assert_eq!(dominant_color(Vec::new()), None);
    }
}
