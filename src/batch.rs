//! Sequential batch driver for the command line.
//!
//! Walks the input the way scans are usually filed: loose files in the input
//! directory plus one level of subfolders. Cards are numbered per output
//! folder across all scans in it. A scan that fails is logged and skipped.

use crate::Args;
use anyhow::{anyhow, Context};
use scan2card::codec::{self, CardFormat};
use scan2card::{DebugDirectory, ScanResult, SegmentError, SegmentationConfig, Segmenter};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Batch run configuration
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub segmentation: SegmentationConfig,
    pub format: CardFormat,
    pub debug_dir: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

impl TryFrom<Args> for BatchConfig {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> anyhow::Result<Self> {
        let mut segmentation = match &args.config {
            Some(path) => SegmentationConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => SegmentationConfig::default(),
        };
        if let Some(background) = args.background {
            segmentation.background = background;
        }

        let format = CardFormat::from_name(&args.format, args.quality)
            .ok_or_else(|| anyhow!("unsupported card format '{}'", args.format))?;

        Ok(Self {
            input: args.input,
            output: args.output,
            segmentation,
            format,
            debug_dir: args.debug_dir,
            report: args.report,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub path: PathBuf,
    pub cards: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<ScanResult>,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub scans: Vec<ScanReport>,
}

impl BatchReport {
    pub fn cards_written(&self) -> usize {
        self.scans.iter().map(|s| s.cards.len()).sum()
    }

    pub fn failures(&self) -> usize {
        self.scans.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Scans whose cards share one numbered output directory
#[derive(Debug)]
struct Job {
    label: String,
    scans: Vec<PathBuf>,
    output: PathBuf,
}

pub fn run(config: &BatchConfig) -> anyhow::Result<BatchReport> {
    let segmenter = Segmenter::new(config.segmentation.clone())?;
    let mut report = BatchReport::default();

    for job in plan(config)? {
        if job.scans.is_empty() {
            continue;
        }
        std::fs::create_dir_all(&job.output)
            .with_context(|| format!("creating {}", job.output.display()))?;

        let mut next_index = 0usize;
        for scan_path in &job.scans {
            tracing::info!("Processing {:?}", scan_path);
            // Full file name, so a.png and a.jpg keep separate previews
            let debug_root = config.debug_dir.as_ref().map(|dir| {
                let name = scan_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                dir.join(&job.label).join(name)
            });

            match process_scan(
                &segmenter,
                scan_path,
                &job.output,
                config.format,
                debug_root.as_deref(),
                &mut next_index,
            ) {
                Ok((cards, result)) => {
                    tracing::info!("{:?}: {} cards", scan_path, cards.len());
                    report.scans.push(ScanReport {
                        path: scan_path.clone(),
                        cards,
                        error: None,
                        code: None,
                        timing: Some(result),
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping {:?}: {}", scan_path, e);
                    report.scans.push(ScanReport {
                        path: scan_path.clone(),
                        cards: Vec::new(),
                        error: Some(e.to_string()),
                        code: Some(e.code()),
                        timing: None,
                    });
                }
            }
        }
    }

    if let Some(path) = &config.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))?;
    }

    Ok(report)
}

fn process_scan(
    segmenter: &Segmenter,
    scan_path: &Path,
    output: &Path,
    format: CardFormat,
    debug_root: Option<&Path>,
    next_index: &mut usize,
) -> Result<(Vec<PathBuf>, ScanResult), SegmentError> {
    let scan = codec::open_scan(scan_path)?;

    let observer = debug_root.and_then(|root| match DebugDirectory::new(root) {
        Ok(observer) => Some(observer),
        Err(e) => {
            tracing::warn!("Debug previews disabled for {:?}: {}", scan_path, e);
            None
        }
    });
    let result = match observer {
        Some(mut observer) => segmenter.process_observed(scan, &mut observer)?,
        None => segmenter.process(scan)?,
    };

    let mut written = Vec::with_capacity(result.cards.len());
    for card in &result.cards {
        let path = output.join(format!("{}.{}", next_index, format.extension()));
        codec::write_card(&path, card, format)?;
        *next_index += 1;
        written.push(path);
    }

    Ok((written, result))
}

fn plan(config: &BatchConfig) -> anyhow::Result<Vec<Job>> {
    let input = &config.input;
    if input.is_file() {
        return Ok(vec![Job {
            label: String::new(),
            scans: vec![input.clone()],
            output: config.output.clone(),
        }]);
    }
    if !input.is_dir() {
        return Err(anyhow!("input {} does not exist", input.display()));
    }

    let mut jobs = vec![Job {
        label: String::new(),
        scans: list_entries(input, |p| p.is_file())?,
        output: config.output.clone(),
    }];

    for dir in list_entries(input, |p| p.is_dir())? {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        jobs.push(Job {
            scans: list_entries(&dir, |p| p.is_file())?,
            output: config.output.join(&name),
            label: name,
        });
    }

    Ok(jobs)
}

/// Sorted entries of `dir` accepted by `keep`
fn list_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if keep(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}
