use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use pansharpen::{BandCount, PansharpenParams, Pansharpener, ScenePaths};
use std::path::PathBuf;

/// Pansharpen red, green, blue and NIR GeoTIFFs with a panchromatic GeoTIFF
///
/// The four spectral images are cubic-resampled to the panchromatic grid and
/// fused with the Brovey and FIHS transforms into two Float32 GeoTIFFs
/// (sharpened_FIHS.tif, sharpened_Brovey.tif).
#[derive(Parser, Debug)]
#[command(name = "pansharpen")]
#[command(version, about, long_about)]
struct Args {
    /// Panchromatic (high resolution) single-band GeoTIFF
    #[arg(short = 'p', long, value_name = "FILE")]
    pan: Option<PathBuf>,

    /// Near-infrared single-band GeoTIFF
    #[arg(short = 'n', long, value_name = "FILE")]
    nir: Option<PathBuf>,

    /// Red single-band GeoTIFF
    #[arg(short = 'r', long, value_name = "FILE")]
    red: Option<PathBuf>,

    /// Green single-band GeoTIFF
    #[arg(short = 'g', long, value_name = "FILE")]
    green: Option<PathBuf>,

    /// Blue single-band GeoTIFF
    #[arg(short = 'b', long, value_name = "FILE")]
    blue: Option<PathBuf>,

    /// Number of output bands: 3 (RGB) or 4 (RGB + NIR)
    #[arg(short = 'z', long = "bands", value_name = "N", default_value_t = 3)]
    bands: u8,

    /// Output directory (default: current directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Keep the resampled intermediate rasters
    #[arg(long)]
    keep_resampled: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn output_dir(requested: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    match requested {
        Some(dir) if dir.is_dir() => Ok(dir),
        Some(dir) => {
            warn!(
                "Output directory {} does not exist, using current directory",
                dir.display()
            );
            Ok(cwd)
        }
        None => Ok(cwd),
    }
}

fn main() -> Result<()> {
    // Usage errors exit with status 1 like every other failure; help and version exit 0
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let band_count = BandCount::try_from(args.bands)?;
    let params = PansharpenParams {
        band_count,
        output_dir: output_dir(args.output_dir)?,
        keep_resampled: args.keep_resampled,
        ..PansharpenParams::default()
    };
    let inputs = ScenePaths {
        pan: args.pan.unwrap_or_default(),
        red: args.red.unwrap_or_default(),
        green: args.green.unwrap_or_default(),
        blue: args.blue.unwrap_or_default(),
        nir: args.nir.unwrap_or_default(),
    };

    info!("=== Pansharpening ({} bands) ===", band_count.get());
    let outputs = Pansharpener::new(params)
        .run(&inputs)
        .context("pansharpening failed")?;

    info!("FIHS output: {}", outputs.fihs.display());
    info!("Brovey output: {}", outputs.brovey.display());
    if let Some(dir) = outputs.resampled_dir {
        info!("Resampled rasters: {}", dir.display());
    }
    info!("=== Done! ===");
    Ok(())
}
