use crate::segmentation::geometry::{rect_tilt, Contour};
use image::imageops::{crop_imm, grayscale, rotate90};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::geometry::{contour_area, min_area_rect};
use imageproc::point::Point;

/// Tilts at or beyond this are read as the perpendicular edge tilting the
/// other way
const WRAP_ANGLE: f32 = 45.0;

/// Crop one candidate out of the background-suppressed scan and straighten it
///
/// Portrait crops are first turned a quarter clockwise, then the residual tilt
/// measured from the card's minimum-area rectangle is undone. When the crop
/// holds no foreground at all it is returned as cropped.
pub fn apply(scan: &RgbImage, contour: &Contour) -> RgbImage {
    let bbox = contour.bounding_box().clamp_to(scan.width(), scan.height());
    let mut card = crop_imm(scan, bbox.x, bbox.y, bbox.width, bbox.height).to_image();

    if card.height() > card.width() {
        card = rotate90(&card);
    }

    match skew_angle(&card) {
        Some(angle) => {
            tracing::debug!(angle, "Straightening card");
            // Positive theta turns the image clockwise, which undoes a
            // counter-clockwise tilt
            rotate_about_center(
                &card,
                (-angle).to_radians(),
                Interpolation::Bicubic,
                Rgb([0, 0, 0]),
            )
        }
        None => {
            tracing::debug!("No foreground inside crop, leaving it unrotated");
            card
        }
    }
}

/// Clockwise tilt of the largest foreground shape in degrees, in [-45, 45)
pub fn skew_angle(card: &RgbImage) -> Option<f32> {
    let gray = grayscale(card);
    let binary = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] > 1 {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    let mut largest: Option<(f64, Vec<Point<i32>>)> = None;
    for c in find_contours::<i32>(&binary) {
        if c.parent.is_some() || c.points.is_empty() {
            continue;
        }
        let area = contour_area(&c.points);
        if largest.as_ref().map_or(true, |(best, _)| area > *best) {
            largest = Some((area, c.points));
        }
    }

    let (_, points) = largest?;
    let tilt = rect_tilt(&min_area_rect(&points))?;

    Some(if tilt >= WRAP_ANGLE {
        tilt - 90.0
    } else {
        tilt
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    /// Corners of a `w` x `h` rectangle centred at (cx, cy), turned clockwise
    fn rotated_rect(cx: f32, cy: f32, w: f32, h: f32, degrees: f32) -> Vec<Point<i32>> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        [(-w / 2.0, -h / 2.0), (w / 2.0, -h / 2.0), (w / 2.0, h / 2.0), (-w / 2.0, h / 2.0)]
            .iter()
            .map(|&(dx, dy)| {
                Point::new(
                    (cx + dx * cos - dy * sin).round() as i32,
                    (cy + dx * sin + dy * cos).round() as i32,
                )
            })
            .collect()
    }

    fn scan_with_card(corners: &[Point<i32>]) -> RgbImage {
        let mut scan = RgbImage::new(600, 500);
        draw_polygon_mut(&mut scan, corners, WHITE);
        scan
    }

    /// Width and height of the bright region
    fn bright_extent(card: &RgbImage) -> (u32, u32) {
        let bright: Vec<(u32, u32)> = card
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0.iter().all(|&c| c > 200))
            .map(|(x, y, _)| (x, y))
            .collect();
        let min_x = bright.iter().map(|p| p.0).min().unwrap();
        let max_x = bright.iter().map(|p| p.0).max().unwrap();
        let min_y = bright.iter().map(|p| p.1).min().unwrap();
        let max_y = bright.iter().map(|p| p.1).max().unwrap();
        (max_x - min_x + 1, max_y - min_y + 1)
    }

    #[test]
    fn test_tilted_card_is_straightened() {
        let corners = rotated_rect(300.0, 250.0, 300.0, 200.0, 15.0);
        let scan = scan_with_card(&corners);

        let card = apply(&scan, &Contour::new(corners));
        let (w, h) = bright_extent(&card);

        assert!(card.width() > card.height());
        assert!((w as i64 - 300).abs() <= 12, "width {}", w);
        assert!((h as i64 - 200).abs() <= 12, "height {}", h);
    }

    #[test]
    fn test_counter_clockwise_tilt_is_straightened() {
        let corners = rotated_rect(300.0, 250.0, 300.0, 200.0, -20.0);
        let scan = scan_with_card(&corners);

        let card = apply(&scan, &Contour::new(corners));
        let (w, h) = bright_extent(&card);

        assert!((w as i64 - 300).abs() <= 12, "width {}", w);
        assert!((h as i64 - 200).abs() <= 12, "height {}", h);
    }

    #[test]
    fn test_portrait_crop_is_turned_landscape() {
        let corners = rotated_rect(300.0, 250.0, 200.0, 300.0, 8.0);
        let scan = scan_with_card(&corners);

        let card = apply(&scan, &Contour::new(corners));
        let (w, h) = bright_extent(&card);

        assert!(card.width() > card.height());
        assert!(w > h, "extent {}x{}", w, h);
    }

    #[test]
    fn test_skew_angle_reads_clockwise_tilt() {
        let corners = rotated_rect(150.0, 120.0, 180.0, 100.0, 10.0);
        let mut card = RgbImage::new(300, 240);
        draw_polygon_mut(&mut card, &corners, WHITE);

        let angle = skew_angle(&card).unwrap();
        assert!((angle - 10.0).abs() < 1.5, "angle {}", angle);
    }

    #[test]
    fn test_skew_angle_follows_largest_shape() {
        let mut card = RgbImage::new(400, 300);
        draw_polygon_mut(&mut card, &rotated_rect(60.0, 60.0, 60.0, 40.0, 30.0), WHITE);
        draw_polygon_mut(&mut card, &rotated_rect(250.0, 170.0, 200.0, 120.0, 12.0), WHITE);

        let angle = skew_angle(&card).unwrap();
        assert!((angle - 12.0).abs() < 1.5, "angle {}", angle);
    }

    #[test]
    fn test_skew_angle_wraps_steep_tilts() {
        // A card turned 80 degrees reads as its long edge tilted -10
        let corners = rotated_rect(150.0, 150.0, 100.0, 180.0, 80.0);
        let mut card = RgbImage::new(300, 300);
        draw_polygon_mut(&mut card, &corners, WHITE);

        let angle = skew_angle(&card).unwrap();
        assert!((angle + 10.0).abs() < 1.5, "angle {}", angle);
    }

    #[test]
    fn test_empty_crop_is_returned_unrotated() {
        let scan = RgbImage::new(400, 300);
        let contour = Contour::new(vec![
            Point::new(50, 40),
            Point::new(250, 40),
            Point::new(250, 140),
            Point::new(50, 140),
        ]);

        let card = apply(&scan, &contour);

        assert_eq!(card.dimensions(), (201, 101));
        assert!(card.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
