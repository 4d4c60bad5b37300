//! Stage-boundary callbacks.
//!
//! The segmenter hands every intermediate mask or image to a
//! [`StageObserver`] as soon as the stage producing it finishes. Observers get
//! a borrowed view and can never alter what the next stage receives.

use crate::error::Result;
use image::{GrayImage, RgbImage};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Binary background-sheet mask
    BackgroundMask,
    /// Scan with every background pixel painted black
    SuppressedScan,
    /// Edge map the card outlines are traced from
    Edges,
    /// Cropped and straightened card
    Rectified,
    /// Card after fringe removal
    ArtifactsRemoved,
    /// Finished card
    VoidsFilled,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackgroundMask => "background_mask",
            Self::SuppressedScan => "suppressed_scan",
            Self::Edges => "edges",
            Self::Rectified => "rectified",
            Self::ArtifactsRemoved => "artifacts_removed",
            Self::VoidsFilled => "voids_filled",
        }
    }

    /// Position in the pipeline, starting at 1
    pub fn ordinal(&self) -> u8 {
        match self {
            Self::BackgroundMask => 1,
            Self::SuppressedScan => 2,
            Self::Edges => 3,
            Self::Rectified => 4,
            Self::ArtifactsRemoved => 5,
            Self::VoidsFilled => 6,
        }
    }
}

/// Borrowed output of a stage
#[derive(Debug, Clone, Copy)]
pub enum StageView<'a> {
    Mask(&'a GrayImage),
    Image(&'a RgbImage),
}

impl StageView<'_> {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            StageView::Mask(mask) => mask.dimensions(),
            StageView::Image(image) => image.dimensions(),
        }
    }
}

pub trait StageObserver {
    /// Called once per stage output. `card` is the card's index for per-card
    /// stages and `None` for whole-scan stages.
    fn on_stage(&mut self, stage: Stage, card: Option<usize>, view: StageView<'_>);
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl StageObserver for NoopObserver {
    fn on_stage(&mut self, _stage: Stage, _card: Option<usize>, _view: StageView<'_>) {}
}

impl<F> StageObserver for F
where
    F: FnMut(Stage, Option<usize>, StageView<'_>),
{
    fn on_stage(&mut self, stage: Stage, card: Option<usize>, view: StageView<'_>) {
        self(stage, card, view)
    }
}

/// Writes every stage output as a PNG under a debug directory
///
/// Layout: `<root>/<NN>_<stage>/scan.png` for whole-scan stages and
/// `<root>/<NN>_<stage>/card_<MM>.png` for per-card stages. Write failures
/// are logged and never abort segmentation.
#[derive(Debug, Clone)]
pub struct DebugDirectory {
    root: PathBuf,
    written: usize,
}

impl DebugDirectory {
    /// Creates `root` if needed. Previews from an earlier run are overwritten.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root, written: 0 })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of previews successfully written so far
    pub fn written(&self) -> usize {
        self.written
    }

    fn preview_path(&self, stage: Stage, card: Option<usize>) -> PathBuf {
        let dir = self
            .root
            .join(format!("{:02}_{}", stage.ordinal(), stage.as_str()));
        let file = match card {
            Some(index) => format!("card_{:02}.png", index + 1),
            None => "scan.png".to_string(),
        };
        dir.join(file)
    }
}

impl StageObserver for DebugDirectory {
    fn on_stage(&mut self, stage: Stage, card: Option<usize>, view: StageView<'_>) {
        let path = self.preview_path(stage, card);
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create debug directory {:?}: {}", parent, e);
                return;
            }
        }

        let saved = match view {
            StageView::Mask(mask) => mask.save(&path),
            StageView::Image(image) => image.save(&path),
        };
        match saved {
            Ok(()) => {
                self.written += 1;
                tracing::debug!("Debug: saved {:?}", path);
            }
            Err(e) => tracing::warn!("Failed to save debug image {:?}: {}", path, e),
        }
    }
}
