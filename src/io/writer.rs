use crate::io::driver;
use crate::types::{BandCount, GeoTransform, Method, PansharpenError, PansharpenResult};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use std::path::{Path, PathBuf};

/// A multi-band Float32 GeoTIFF being filled scanline by scanline
///
/// The dataset is closed when the value is dropped, on success and error paths
/// alike; [`FusionOutput::finalize`] closes it explicitly and hands back the path.
pub struct FusionOutput {
    pub method: Method,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub band_count: BandCount,
    dataset: Dataset,
    row_buffer: Buffer<f32>,
}

impl FusionOutput {
    /// Create the file and set its georeferencing before any band data is written
    pub fn create<P: AsRef<Path>>(
        method: Method,
        path: P,
        width: usize,
        height: usize,
        band_count: BandCount,
        geo_transform: &GeoTransform,
        spatial_ref: &str,
    ) -> PansharpenResult<Self> {
        let path = path.as_ref();
        log::info!(
            "Creating {} output {} ({}x{}, {} bands)",
            method,
            path.display(),
            width,
            height,
            band_count.get()
        );
        if width == 0 || height == 0 {
            return Err(PansharpenError::Config(format!(
                "cannot create {}x{} output",
                width, height
            )));
        }

        driver::ensure_registered();
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let mut dataset = driver.create_with_band_type::<f32, _>(
            path,
            width as isize,
            height as isize,
            band_count.get() as isize,
        )?;

        dataset.set_geo_transform(&geo_transform.to_array())?;
        if !spatial_ref.is_empty() {
            dataset.set_projection(spatial_ref)?;
        }

        Ok(Self {
            method,
            path: path.to_path_buf(),
            width,
            height,
            band_count,
            dataset,
            row_buffer: Buffer::new((width, 1), vec![0.0; width]),
        })
    }

    /// Write one row of one band; `band` is 1-based
    pub fn write_scanline(&mut self, band: usize, row: usize, values: &[f32]) -> PansharpenResult<()> {
        if band == 0 || band > self.band_count.get() || row >= self.height || values.len() != self.width {
            return Err(PansharpenError::Config(format!(
                "scanline (band {}, row {}, {} values) outside {} output {}x{}x{}",
                band,
                row,
                values.len(),
                self.method,
                self.width,
                self.height,
                self.band_count.get()
            )));
        }

        self.row_buffer.data.copy_from_slice(values);
        let write_err = |source| PansharpenError::ScanlineWrite {
            method: self.method,
            band,
            row,
            source,
        };
        let mut rasterband = self.dataset.rasterband(band as isize).map_err(write_err)?;
        rasterband
            .write((0, row as isize), (self.width, 1), &self.row_buffer)
            .map_err(write_err)
    }

    /// Attach processing metadata and per-band names
    pub fn tag(&mut self, band_names: &[&str], timestamp: &str) -> PansharpenResult<()> {
        self.dataset
            .set_metadata_item("PANSHARPEN_METHOD", &self.method.to_string(), "")?;
        self.dataset
            .set_metadata_item("PANSHARPEN_BANDS", &band_names.join(","), "")?;
        self.dataset
            .set_metadata_item("PANSHARPEN_DATETIME", timestamp, "")?;
        for (i, name) in band_names.iter().enumerate() {
            let mut rasterband = self.dataset.rasterband(i as isize + 1)?;
            rasterband.set_description(name)?;
        }
        Ok(())
    }

    /// Flush and close the dataset
    pub fn finalize(self) -> PathBuf {
        let Self { path, dataset, .. } = self;
        drop(dataset);
        log::debug!("Closed output {}", path.display());
        path
    }
}
