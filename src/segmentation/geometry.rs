use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned box, inclusive of both extreme pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// Box enclosing `points`, `None` for an empty slice.
    /// Negative coordinates are clipped to zero.
    pub fn enclosing(points: &[Point<i32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let x = min_x.max(0);
        let y = min_y.max(0);
        Some(Self {
            x: x as u32,
            y: y as u32,
            width: (max_x - x + 1).max(0) as u32,
            height: (max_y - y + 1).max(0) as u32,
        })
    }

    /// Shrink the box so it lies inside a `width` x `height` frame
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Self {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Ordered polygon boundary, in the traversal order it was extracted with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::enclosing(&self.points).unwrap_or_default()
    }
}

/// Clockwise tilt in degrees, within [0, 90), of a rectangle given by its
/// corners. `None` when every corner coincides.
pub fn rect_tilt(corners: &[Point<i32>; 4]) -> Option<f32> {
    let (dx, dy) = (0..4)
        .map(|i| {
            let (a, b) = (corners[i], corners[(i + 1) % 4]);
            (b.x - a.x, b.y - a.y)
        })
        .find(|&(dx, dy)| dx != 0 || dy != 0)?;

    // Image y grows downwards, so a positive angle reads as clockwise
    let tilt = (dy as f32).atan2(dx as f32).to_degrees().rem_euclid(90.0);
    Some(if tilt >= 90.0 { 0.0 } else { tilt })
}
