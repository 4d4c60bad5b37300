use crate::config::SegmentationConfig;
use crate::error::SegmentError;
use crate::observer::{NoopObserver, Stage, StageObserver, StageView};
use crate::segmentation::geometry::Contour;
use image::RgbImage;
use serde::Serialize;
use std::time::Instant;

use super::steps;

/// Finished card cut out of a scan
pub type CardImage = RgbImage;

/// Timing information for a single segmentation step, summed over cards for
/// per-card steps
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub name: String,
    pub time_ms: u64,
}

/// Result of segmenting one scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    /// Cards in the order their outlines were discovered (not serialized)
    #[serde(skip)]
    pub cards: Vec<CardImage>,
    /// Width and height of each card
    pub card_sizes: Vec<(u32, u32)>,
    /// Total segmentation time in milliseconds
    pub total_time_ms: u64,
    /// Individual step timings
    pub steps: Vec<StepTiming>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Splits a scan of cards on a colored sheet into straightened card images
///
/// Holds only immutable policy, so one segmenter can serve any number of
/// scans, from any number of threads.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    config: SegmentationConfig,
}

impl Segmenter {
    pub fn new(config: SegmentationConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Segment a scan into its cards
    pub fn process(&self, scan: RgbImage) -> Result<ScanResult, SegmentError> {
        self.process_observed(scan, &mut NoopObserver)
    }

    /// Segment a scan, reporting every intermediate result to `observer`
    #[tracing::instrument(skip_all, fields(width = scan.width(), height = scan.height()))]
    pub fn process_observed(
        &self,
        scan: RgbImage,
        observer: &mut dyn StageObserver,
    ) -> Result<ScanResult, SegmentError> {
        let start = Instant::now();
        let mut timings = Vec::new();
        let (width, height) = scan.dimensions();

        let mask = self.run_step("background_mask", &mut timings, || {
            steps::background_mask::apply(&scan, &self.config)
        })?;
        observer.on_stage(Stage::BackgroundMask, None, StageView::Mask(&mask));

        let scan = self.run_step("suppress_background", &mut timings, || {
            Ok(steps::edge_contours::suppress_background(scan, &mask))
        })?;
        observer.on_stage(Stage::SuppressedScan, None, StageView::Image(&scan));

        let edges = self.run_step("edges", &mut timings, || {
            Ok(steps::edge_contours::edges(&mask, &self.config))
        })?;
        observer.on_stage(Stage::Edges, None, StageView::Mask(&edges));

        let contours = self.run_step("contours", &mut timings, || {
            Ok(steps::edge_contours::candidates(
                &edges,
                width,
                height,
                &self.config,
            ))
        })?;
        drop(edges);
        drop(mask);

        let mut cards = Vec::with_capacity(contours.len());
        for (index, contour) in contours.iter().enumerate() {
            let card = self.finish_card(&scan, contour, index, &mut timings, observer)?;
            cards.push(card);
        }

        tracing::info!(cards = cards.len(), "Segmented scan");

        Ok(ScanResult {
            card_sizes: cards.iter().map(|c| c.dimensions()).collect(),
            cards,
            total_time_ms: start.elapsed().as_millis() as u64,
            steps: timings,
        })
    }

    /// Turn one candidate outline into a finished card
    ///
    /// `scan` must be the background-suppressed scan. Cards are independent of
    /// each other, so any card can be reprocessed on its own.
    pub fn process_card(&self, scan: &RgbImage, contour: &Contour) -> CardImage {
        let card = steps::rectify::apply(scan, contour);
        let card = steps::artifacts::apply(card, &self.config);
        steps::void_fill::apply(card, &self.config)
    }

    fn finish_card(
        &self,
        scan: &RgbImage,
        contour: &Contour,
        index: usize,
        timings: &mut Vec<StepTiming>,
        observer: &mut dyn StageObserver,
    ) -> Result<CardImage, SegmentError> {
        let card = self.run_step("rectify", timings, || {
            Ok(steps::rectify::apply(scan, contour))
        })?;
        observer.on_stage(Stage::Rectified, Some(index), StageView::Image(&card));

        let card = self.run_step("remove_artifacts", timings, || {
            Ok(steps::artifacts::apply(card, &self.config))
        })?;
        observer.on_stage(Stage::ArtifactsRemoved, Some(index), StageView::Image(&card));

        let card = self.run_step("fill_voids", timings, || {
            Ok(steps::void_fill::apply(card, &self.config))
        })?;
        observer.on_stage(Stage::VoidsFilled, Some(index), StageView::Image(&card));

        tracing::debug!(
            card = index,
            width = card.width(),
            height = card.height(),
            "Finished card"
        );
        Ok(card)
    }

    fn run_step<T, F>(
        &self,
        name: &str,
        timings: &mut Vec<StepTiming>,
        step_fn: F,
    ) -> Result<T, SegmentError>
    where
        F: FnOnce() -> Result<T, SegmentError>,
    {
        let step_start = Instant::now();
        let result = step_fn()?;
        let elapsed = step_start.elapsed().as_millis() as u64;

        match timings.iter_mut().find(|t| t.name == name) {
            Some(timing) => timing.time_ms += elapsed,
            None => timings.push(StepTiming {
                name: name.to_string(),
                time_ms: elapsed,
            }),
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_segmenter_rejects_invalid_config() {
        let config = SegmentationConfig {
            blur_kernel: 0,
            ..SegmentationConfig::default()
        };
        assert!(matches!(
            Segmenter::new(config),
            Err(SegmentError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_area_scan_stops_at_masking() {
        let mut stages = Vec::new();
        let mut observer = |stage: Stage, _: Option<usize>, _: StageView<'_>| stages.push(stage);

        let result = Segmenter::default().process_observed(RgbImage::new(0, 0), &mut observer);

        assert!(matches!(result, Err(SegmentError::InvalidInput(_))));
        assert!(stages.is_empty());
    }

    #[test]
    fn test_blank_sheet_yields_no_cards() {
        let scan = RgbImage::from_pixel(200, 150, Rgb([90, 195, 243]));
        let result = Segmenter::default().process(scan).unwrap();

        assert!(result.is_empty());
        let names: Vec<&str> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["background_mask", "suppress_background", "edges", "contours"]
        );
    }

    #[test]
    fn test_default_segmenter_uses_default_policy() {
        assert_eq!(Segmenter::default().config(), &SegmentationConfig::default());
    }

    #[test]
    fn test_segmenter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Segmenter>();
    }
}
