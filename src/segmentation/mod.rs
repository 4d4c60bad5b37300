//! Card segmentation module
//!
//! Splits one scan into its cards: background masking, outline extraction,
//! rectification, fringe removal and void filling.

pub mod geometry;
pub mod hsv;
pub mod pipeline;
pub mod steps;

pub use geometry::{BoundingBox, Contour};
pub use pipeline::{CardImage, ScanResult, Segmenter, StepTiming};
