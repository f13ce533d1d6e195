use crate::io::driver;
use crate::types::{GeoTransform, PansharpenError, PansharpenResult, PixelType, Role};
use gdal::Dataset;
use std::path::{Path, PathBuf};

/// Metadata of one opened single-band raster
///
/// The dataset itself is closed before [`RasterHandle::open`] returns; scanline
/// readers reopen the file for the duration of the fusion pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterHandle {
    pub role: Role,
    pub path: PathBuf,
    pub width: usize,
    pub height: usize,
    pub geo_transform: GeoTransform,
    /// Projection WKT, possibly empty
    pub spatial_ref: String,
    pub no_data: Option<f64>,
    pub pixel_type: PixelType,
}

impl RasterHandle {
    /// Read grid, georeferencing, NoData and band type from band 1 of `path`
    pub fn open<P: AsRef<Path>>(role: Role, path: P) -> PansharpenResult<Self> {
        let path = path.as_ref();
        log::debug!("Opening {} raster: {}", role, path.display());

        driver::ensure_registered();
        let dataset = open_dataset(role, path)?;

        let band_count = dataset.raster_count();
        if band_count < 1 {
            return Err(PansharpenError::Open {
                role,
                path: path.to_path_buf(),
                reason: "raster has no bands".to_string(),
            });
        }
        if band_count > 1 {
            log::warn!(
                "{} raster {} has {} bands, only band 1 is used",
                role,
                path.display(),
                band_count
            );
        }

        let (width, height) = dataset.raster_size();
        let geo_transform = match dataset.geo_transform() {
            Ok(gt) => GeoTransform::from_coefficients(&gt),
            Err(e) => {
                log::debug!("{} raster has no geotransform ({}), using identity", role, e);
                GeoTransform::default()
            }
        };
        let spatial_ref = dataset.projection();
        if spatial_ref.is_empty() {
            log::warn!("{} raster {} has no spatial reference", role, path.display());
        }

        let band = dataset.rasterband(1).map_err(|e| PansharpenError::Open {
            role,
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let no_data = band.no_data_value();
        let band_type = band.band_type();
        let pixel_type =
            PixelType::from_gdal(band_type).ok_or_else(|| PansharpenError::UnsupportedType {
                role,
                type_name: format!("{:?}", band_type),
            })?;

        let handle = Self {
            role,
            path: path.to_path_buf(),
            width,
            height,
            geo_transform,
            spatial_ref,
            no_data,
            pixel_type,
        };
        log::debug!("{}", handle.describe());
        Ok(handle)
    }

    /// Reopen the underlying file for reading scanlines
    pub fn dataset(&self) -> PansharpenResult<Dataset> {
        driver::ensure_registered();
        open_dataset(self.role, &self.path)
    }

    /// Whether `value` is this raster's NoData sentinel; a NaN sentinel matches NaN samples
    pub fn is_no_data(&self, value: f64) -> bool {
        matches_no_data(self.no_data, value)
    }

    pub fn same_grid(&self, other: &RasterHandle) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// One-line summary for logs
    pub fn describe(&self) -> String {
        let no_data = self
            .no_data
            .map(|v| v.to_string())
            .unwrap_or_else(|| "none".to_string());
        format!(
            "{} raster {}: {}x{} {}, nodata={}, srs={}",
            self.role,
            self.path.display(),
            self.width,
            self.height,
            self.pixel_type,
            no_data,
            if self.spatial_ref.is_empty() { "missing" } else { "set" }
        )
    }
}

/// Compare a sample against an optional NoData sentinel
pub fn matches_no_data(no_data: Option<f64>, value: f64) -> bool {
    match no_data {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd,
        None => false,
    }
}

fn open_dataset(role: Role, path: &Path) -> PansharpenResult<Dataset> {
    Dataset::open(path).map_err(|e| PansharpenError::Open {
        role,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle_with_no_data(no_data: Option<f64>) -> RasterHandle {
        RasterHandle {
            role: Role::Pan,
            path: PathBuf::from("pan.tif"),
            width: 4,
            height: 4,
            geo_transform: GeoTransform::default(),
            spatial_ref: String::new(),
            no_data,
            pixel_type: PixelType::UInt16,
        }
    }

    #[test]
    fn test_no_data_matching() {
        let handle = handle_with_no_data(Some(0.0));
        assert!(handle.is_no_data(0.0));
        assert!(!handle.is_no_data(1.0));

        let handle = handle_with_no_data(None);
        assert!(!handle.is_no_data(0.0));
        assert!(!handle.is_no_data(f64::NAN));

        let handle = handle_with_no_data(Some(f64::NAN));
        assert!(handle.is_no_data(f64::NAN));
        assert!(!handle.is_no_data(0.0));
    }

    #[test]
    fn test_open_missing_file() {
        let result = RasterHandle::open(Role::Red, "/nonexistent/red.tif");
        match result {
            Err(PansharpenError::Open { role, .. }) => assert_eq!(role, Role::Red),
            other => panic!("expected open error, got {:?}", other),
        }
    }
}
