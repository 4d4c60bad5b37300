//! Segmentation policy parameters.
//!
//! Every field defaults to the fixed policy the pipeline was tuned with, so
//! `SegmentationConfig::default()` is the normal way to build one. A JSON file
//! may override any subset of fields.

use crate::error::{Result, SegmentError};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sky-blue background sheet the scans were photographed on
pub const DEFAULT_BACKGROUND: [u8; 3] = [90, 195, 243];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Reference background sheet color (RGB)
    pub background: [u8; 3],
    /// Accepted hue distance around the background hue (0..180 hue scale)
    pub hue_tolerance: u8,
    /// Lower bound of the accepted saturation band, upper bound is 255
    pub saturation_floor: u8,
    /// Lower bound of the accepted value band, upper bound is 255
    pub value_floor: u8,
    /// Side of the square structuring element used to open the mask
    pub morph_kernel: u32,
    /// Number of erode/dilate passes in the opening
    pub open_iterations: u32,
    /// Side of the Gaussian kernel applied to the mask before edge detection
    pub blur_kernel: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of contour perimeter
    pub poly_epsilon: f64,
    /// Candidates must exceed this fraction of the frame on both axes
    pub min_candidate_ratio: f64,
    /// Side of the square structuring element used to strip card fringes
    pub fringe_kernel: u32,
    /// Pixels with H, S and V all below this are treated as voids
    pub void_threshold: u8,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            hue_tolerance: 10,
            saturation_floor: 100,
            value_floor: 100,
            morph_kernel: 5,
            open_iterations: 2,
            blur_kernel: 5,
            canny_low: 100.0,
            canny_high: 150.0,
            poly_epsilon: 0.02,
            min_candidate_ratio: 0.2,
            fringe_kernel: 5,
            void_threshold: 10,
        }
    }
}

impl SegmentationConfig {
    /// Default policy with a different background sheet color
    pub fn with_background(background: [u8; 3]) -> Self {
        Self {
            background,
            ..Self::default()
        }
    }

    pub fn background_color(&self) -> Rgb<u8> {
        Rgb(self.background)
    }

    /// Chessboard radius of the opening, e.g. 5x5 applied twice covers 9x9
    pub fn open_radius(&self) -> u8 {
        (self.morph_kernel / 2)
            .saturating_mul(self.open_iterations)
            .min(u8::MAX as u32) as u8
    }

    pub fn fringe_radius(&self) -> u8 {
        (self.fringe_kernel / 2).min(u8::MAX as u32) as u8
    }

    /// Conventional sigma for a Gaussian kernel of `blur_kernel` taps
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn validate(&self) -> Result<()> {
        for (name, kernel) in [
            ("morph_kernel", self.morph_kernel),
            ("blur_kernel", self.blur_kernel),
            ("fringe_kernel", self.fringe_kernel),
        ] {
            if kernel == 0 || kernel % 2 == 0 {
                return Err(SegmentError::InvalidConfig(format!(
                    "{} must be a positive odd size, got {}",
                    name, kernel
                )));
            }
        }

        if !(self.min_candidate_ratio > 0.0 && self.min_candidate_ratio < 1.0) {
            return Err(SegmentError::InvalidConfig(format!(
                "min_candidate_ratio must be in (0, 1), got {}",
                self.min_candidate_ratio
            )));
        }

        if !(self.poly_epsilon >= 0.0 && self.poly_epsilon.is_finite()) {
            return Err(SegmentError::InvalidConfig(format!(
                "poly_epsilon must be a finite non-negative fraction, got {}",
                self.poly_epsilon
            )));
        }

        if self.canny_low > self.canny_high {
            return Err(SegmentError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }

        Ok(())
    }

    /// Load configuration from a JSON file, missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            SegmentError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SegmentError::InvalidConfig(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
