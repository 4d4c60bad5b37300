use image::{Rgb, RgbImage};

/// Hue/saturation/value triplet in the common 8-bit layout:
/// hue in 0..180 (degrees halved), saturation and value in 0..=255
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    /// True when every channel lies inside the inclusive `[lower, upper]` box
    pub fn within(&self, lower: Hsv, upper: Hsv) -> bool {
        (lower.h..=upper.h).contains(&self.h)
            && (lower.s..=upper.s).contains(&self.s)
            && (lower.v..=upper.v).contains(&self.v)
    }

    /// True when every channel is strictly below `threshold`
    pub fn all_below(&self, threshold: u8) -> bool {
        self.h < threshold && self.s < threshold && self.v < threshold
    }
}

impl From<Rgb<u8>> for Hsv {
    fn from(pixel: Rgb<u8>) -> Self {
        let [r, g, b] = pixel.0.map(i32::from);
        let v = r.max(g).max(b);
        let diff = v - r.min(g).min(b);

        let s = if v == 0 {
            0
        } else {
            (diff as f32 * 255.0 / v as f32 + 0.5).floor() as i32
        };

        let h = if diff == 0 {
            0
        } else {
            // Hue sextant offset expressed in units of `diff`
            let raw = if v == r {
                g - b
            } else if v == g {
                b - r + 2 * diff
            } else {
                r - g + 4 * diff
            };
            let h = (raw as f32 * 30.0 / diff as f32 + 0.5).floor() as i32;
            if h < 0 {
                h + 180
            } else {
                h
            }
        };

        Hsv {
            h: h.clamp(0, 179) as u8,
            s: s.clamp(0, 255) as u8,
            v: v as u8,
        }
    }
}

/// Convert every pixel of an RGB image, row-major
pub fn convert(image: &RgbImage) -> Vec<Hsv> {
    image.pixels().map(|p| Hsv::from(*p)).collect()
}
