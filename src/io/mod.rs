//! Raster I/O: metadata reading, cubic resampling and output writing

pub mod driver;
pub mod raster;
pub mod resample;
pub mod writer;

pub use raster::RasterHandle;
pub use resample::Resampler;
pub use writer::FusionOutput;
