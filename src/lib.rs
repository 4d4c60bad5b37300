//! # scan2card
//!
//! Splits a scanned photograph of cards lying on a uniformly colored sheet
//! into one cropped, straightened image per card.
//!
//! ```rust,no_run
//! use scan2card::{codec, Segmenter};
//! use std::path::Path;
//!
//! let scan = codec::open_scan(Path::new("scan.jpg"))?;
//! let result = Segmenter::default().process(scan)?;
//! for (i, card) in result.cards.iter().enumerate() {
//!     codec::write_card(Path::new(&format!("{}.jpg", i)), card, Default::default())?;
//! }
//! # Ok::<(), scan2card::SegmentError>(())
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod observer;
pub mod segmentation;

pub use config::SegmentationConfig;
pub use error::{Result, SegmentError};
pub use observer::{DebugDirectory, NoopObserver, Stage, StageObserver, StageView};
pub use segmentation::{BoundingBox, CardImage, Contour, ScanResult, Segmenter, StepTiming};

use image::{Rgb, RgbImage};

/// Segment one scan with the default policy and the given background color
pub fn segment_scan(scan: RgbImage, background: Rgb<u8>) -> Result<Vec<CardImage>> {
    let segmenter = Segmenter::new(SegmentationConfig::with_background(background.0))?;
    Ok(segmenter.process(scan)?.cards)
}
