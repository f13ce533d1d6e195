//! pansharpen: Brovey and FIHS pansharpening of GeoTIFF scenes
//!
//! Four low-resolution single-band rasters (red, green, blue, near-infrared) are
//! cubic-resampled onto the grid of a high-resolution panchromatic raster and
//! fused scanline by scanline into two multi-band Float32 GeoTIFFs, one per
//! algorithm, georeferenced like the panchromatic input.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    BandCount, GeoTransform, Method, PansharpenError, PansharpenResult, PixelType, Role,
};

pub use io::{FusionOutput, RasterHandle, Resampler};
pub use crate::core::{
    FusionEngine, FusionPolicy, PansharpenOutputs, PansharpenParams, Pansharpener, SceneSet,
    ScenePaths,
};
