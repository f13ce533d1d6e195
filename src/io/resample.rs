use crate::io::driver;
use crate::io::raster::RasterHandle;
use crate::types::{PansharpenError, PansharpenResult, PixelType};
use gdal::raster::GdalType;
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::{Dataset, DriverManager};
use std::ffi::CString;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::ptr;

/// Cubic resampler aligning a low-resolution raster onto a reference grid
pub struct Resampler {
    output_dir: PathBuf,
}

impl Resampler {
    /// Resampled rasters are written into `output_dir`
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Output path for the resampled copy of `source`
    pub fn output_path(&self, source: &RasterHandle) -> PathBuf {
        let stem = source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.role.to_string());
        self.output_dir
            .join(format!("{}_{}_resampled.tif", source.role, stem))
    }

    /// Resample `source` onto `reference`'s grid, geotransform and spatial reference
    ///
    /// The output keeps `source`'s pixel type and is a new GeoTIFF; the returned
    /// handle describes it.
    pub fn resample(
        &self,
        source: &RasterHandle,
        reference: &RasterHandle,
    ) -> PansharpenResult<RasterHandle> {
        log::info!(
            "Resampling {} raster {}x{} -> {}x{}",
            source.role,
            source.width,
            source.height,
            reference.width,
            reference.height
        );
        driver::ensure_registered();

        check_transform(source, reference)?;

        let src_dataset = source.dataset()?;
        let (cols, rows) = suggested_warp_output(&src_dataset, source, reference)?;
        log::debug!(
            "Suggested warp output for {} raster: {}x{}, using reference grid {}x{}",
            source.role,
            cols,
            rows,
            reference.width,
            reference.height
        );

        let out_path = self.output_path(source);
        if out_path.exists() {
            std::fs::remove_file(&out_path)?;
        }

        let dst_dataset = create_like(&out_path, source, reference)?;
        reproject_cubic(&src_dataset, source, &dst_dataset, reference)?;
        // Closing flushes the warped pixels before the file is reopened
        drop(dst_dataset);
        drop(src_dataset);

        let resampled = RasterHandle::open(source.role, &out_path)?;
        if !resampled.same_grid(reference) {
            return Err(PansharpenError::Resample {
                role: source.role,
                message: format!(
                    "resampled grid {}x{} does not match reference {}x{}",
                    resampled.width, resampled.height, reference.width, reference.height
                ),
            });
        }
        Ok(resampled)
    }
}

/// Fail early when the two spatial references admit no coordinate transform
fn check_transform(source: &RasterHandle, reference: &RasterHandle) -> PansharpenResult<()> {
    if source.spatial_ref.is_empty() || reference.spatial_ref.is_empty() {
        log::warn!(
            "{} raster or reference lacks a spatial reference, aligning by geotransform only",
            source.role
        );
        return Ok(());
    }

    let resample_err = |message: String| PansharpenError::Resample {
        role: source.role,
        message,
    };
    let src_srs = SpatialRef::from_wkt(&source.spatial_ref)
        .map_err(|e| resample_err(format!("invalid source spatial reference: {}", e)))?;
    let dst_srs = SpatialRef::from_wkt(&reference.spatial_ref)
        .map_err(|e| resample_err(format!("invalid reference spatial reference: {}", e)))?;
    CoordTransform::new(&src_srs, &dst_srs)
        .map_err(|e| resample_err(format!("no coordinate transform: {}", e)))?;
    Ok(())
}

fn wkt_or_null(wkt: &str) -> PansharpenResult<Option<CString>> {
    if wkt.is_empty() {
        return Ok(None);
    }
    CString::new(wkt)
        .map(Some)
        .map_err(|e| PansharpenError::Config(format!("spatial reference contains NUL: {}", e)))
}

fn as_ptr(s: &Option<CString>) -> *const std::os::raw::c_char {
    s.as_ref().map_or(ptr::null(), |c| c.as_ptr())
}

/// Grid size GDAL would choose for warping `src` into the reference projection
fn suggested_warp_output(
    src: &Dataset,
    source: &RasterHandle,
    reference: &RasterHandle,
) -> PansharpenResult<(usize, usize)> {
    let src_wkt = wkt_or_null(&source.spatial_ref)?;
    let dst_wkt = wkt_or_null(&reference.spatial_ref)?;

    let mut geo_transform = [0.0f64; 6];
    let mut cols: c_int = 0;
    let mut rows: c_int = 0;

    let err = unsafe {
        let transformer = gdal_sys::GDALCreateGenImgProjTransformer(
            src.c_dataset(),
            as_ptr(&src_wkt),
            ptr::null_mut(),
            as_ptr(&dst_wkt),
            0,
            0.0,
            1,
        );
        if transformer.is_null() {
            return Err(PansharpenError::Resample {
                role: source.role,
                message: "cannot create image projection transformer".to_string(),
            });
        }
        let err = gdal_sys::GDALSuggestedWarpOutput(
            src.c_dataset(),
            Some(gdal_sys::GDALGenImgProjTransform),
            transformer,
            geo_transform.as_mut_ptr(),
            &mut cols,
            &mut rows,
        );
        gdal_sys::GDALDestroyGenImgProjTransformer(transformer);
        err
    };

    if err != gdal_sys::CPLErr::CE_None || cols <= 0 || rows <= 0 {
        return Err(PansharpenError::Resample {
            role: source.role,
            message: "cannot compute output grid".to_string(),
        });
    }
    Ok((cols as usize, rows as usize))
}

/// Create a single-band GeoTIFF with `source`'s pixel type on `reference`'s grid
fn create_like(
    path: &Path,
    source: &RasterHandle,
    reference: &RasterHandle,
) -> PansharpenResult<Dataset> {
    fn create<T: GdalType + Copy>(
        path: &Path,
        reference: &RasterHandle,
    ) -> gdal::errors::Result<Dataset> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        driver.create_with_band_type::<T, _>(
            path,
            reference.width as isize,
            reference.height as isize,
            1,
        )
    }

    let mut dataset = match source.pixel_type {
        PixelType::Byte => create::<u8>(path, reference),
        PixelType::UInt16 => create::<u16>(path, reference),
        PixelType::Int16 => create::<i16>(path, reference),
        PixelType::UInt32 => create::<u32>(path, reference),
        PixelType::Int32 => create::<i32>(path, reference),
        PixelType::Float32 => create::<f32>(path, reference),
        PixelType::Float64 => create::<f64>(path, reference),
    }?;

    dataset.set_geo_transform(&reference.geo_transform.to_array())?;
    if !reference.spatial_ref.is_empty() {
        dataset.set_projection(&reference.spatial_ref)?;
    }
    if let Some(no_data) = source.no_data {
        dataset.rasterband(1)?.set_no_data_value(Some(no_data))?;
    }
    Ok(dataset)
}

fn reproject_cubic(
    src: &Dataset,
    source: &RasterHandle,
    dst: &Dataset,
    reference: &RasterHandle,
) -> PansharpenResult<()> {
    let src_wkt = wkt_or_null(&source.spatial_ref)?;
    let dst_wkt = wkt_or_null(&reference.spatial_ref)?;

    let err = unsafe {
        gdal_sys::GDALReprojectImage(
            src.c_dataset(),
            as_ptr(&src_wkt),
            dst.c_dataset(),
            as_ptr(&dst_wkt),
            gdal_sys::GDALResampleAlg::GRA_Cubic,
            0.0,
            0.0,
            None,
            ptr::null_mut(),
            ptr::null_mut(),
        )
    };

    if err != gdal_sys::CPLErr::CE_None {
        return Err(PansharpenError::Resample {
            role: source.role,
            message: format!("cubic reprojection failed: {}", last_gdal_message()),
        });
    }
    Ok(())
}

fn last_gdal_message() -> String {
    unsafe {
        let msg = gdal_sys::CPLGetLastErrorMsg();
        if msg.is_null() {
            return String::new();
        }
        std::ffi::CStr::from_ptr(msg).to_string_lossy().into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GeoTransform, Role};

    #[test]
    fn test_output_path_names_role_and_stem() {
        let resampler = Resampler::new("/tmp/work");
        let handle = RasterHandle {
            role: Role::Green,
            path: PathBuf::from("/data/LC08_B3.TIF"),
            width: 10,
            height: 10,
            geo_transform: GeoTransform::default(),
            spatial_ref: String::new(),
            no_data: None,
            pixel_type: PixelType::UInt16,
        };
        assert_eq!(
            resampler.output_path(&handle),
            PathBuf::from("/tmp/work/green_LC08_B3_resampled.tif")
        );
    }
}
