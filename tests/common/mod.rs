#![allow(dead_code)]

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use scan2card::segmentation::hsv::Hsv;
use scan2card::segmentation::steps::background_mask::hsv_bounds;
use scan2card::SegmentationConfig;

pub const SHEET: Rgb<u8> = Rgb([90, 195, 243]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

pub fn blank_scan(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, SHEET)
}

/// Corners of a `w` x `h` rectangle centred at (cx, cy), turned clockwise by
/// `degrees`
pub fn rotated_rect(cx: f32, cy: f32, w: f32, h: f32, degrees: f32) -> Vec<Point<i32>> {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        (-w / 2.0, -h / 2.0),
        (w / 2.0, -h / 2.0),
        (w / 2.0, h / 2.0),
        (-w / 2.0, h / 2.0),
    ]
    .iter()
    .map(|&(dx, dy)| {
        Point::new(
            (cx + dx * cos - dy * sin).round() as i32,
            (cy + dx * sin + dy * cos).round() as i32,
        )
    })
    .collect()
}

pub fn draw_card(scan: &mut RgbImage, cx: f32, cy: f32, w: f32, h: f32, degrees: f32) {
    draw_polygon_mut(scan, &rotated_rect(cx, cy, w, h, degrees), WHITE);
}

pub fn is_void(pixel: &Rgb<u8>) -> bool {
    Hsv::from(*pixel).all_below(10)
}

pub fn is_background(pixel: &Rgb<u8>) -> bool {
    let (lower, upper) = hsv_bounds(&SegmentationConfig::default());
    Hsv::from(*pixel).within(lower, upper)
}

/// Pixels on the outermost rows and columns
pub fn border_pixels(card: &RgbImage) -> Vec<Rgb<u8>> {
    let (w, h) = card.dimensions();
    card.enumerate_pixels()
        .filter(|(x, y, _)| *x == 0 || *y == 0 || *x == w - 1 || *y == h - 1)
        .map(|(_, _, p)| *p)
        .collect()
}
