use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod batch;

#[derive(Parser, Debug)]
#[command(name = "scan2card")]
#[command(about = "Cut scanned sheets of cards into one straightened image per card")]
#[command(version)]
pub struct Args {
    /// Scan file, or a directory whose files and immediate subfolders hold scans
    pub input: PathBuf,

    /// Directory the numbered card images are written to
    #[arg(short, long, env = "SCAN2CARD_OUTPUT", default_value = "output")]
    pub output: PathBuf,

    /// Background sheet color as R,G,B (overrides the config file)
    #[arg(long, env = "SCAN2CARD_BACKGROUND", value_parser = parse_rgb)]
    pub background: Option<[u8; 3]>,

    /// JSON file with segmentation parameters
    #[arg(long, env = "SCAN2CARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Card image format (jpeg or png)
    #[arg(long, default_value = "jpeg")]
    pub format: String,

    /// JPEG quality, 1-100
    #[arg(long, default_value = "90")]
    pub quality: u8,

    /// Write every intermediate stage as PNG under this directory
    #[arg(long, env = "SCAN2CARD_DEBUG_DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Write a JSON summary of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

fn parse_rgb(value: &str) -> Result<[u8; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected R,G,B but got '{}'", value));
    }
    let mut rgb = [0u8; 3];
    for (channel, part) in rgb.iter_mut().zip(&parts) {
        *channel = part
            .parse()
            .map_err(|_| format!("'{}' is not a channel value in 0..=255", part))?;
    }
    Ok(rgb)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting scan2card v{}", env!("CARGO_PKG_VERSION"));

    let config = batch::BatchConfig::try_from(args)?;
    let report = batch::run(&config)?;

    tracing::info!(
        "Processed {} scans: {} cards written, {} scans failed",
        report.scans.len(),
        report.cards_written(),
        report.failures()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("90,195,243"), Ok([90, 195, 243]));
        assert_eq!(parse_rgb(" 1, 2 ,3 "), Ok([1, 2, 3]));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,300").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["scan2card", "scans", "--background", "10,20,30"]);
        assert_eq!(args.input, PathBuf::from("scans"));
        assert_eq!(args.background, Some([10, 20, 30]));
        assert_eq!(args.format, "jpeg");
    }
}
