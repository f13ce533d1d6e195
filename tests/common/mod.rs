#![allow(dead_code)]

use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use std::path::{Path, PathBuf};

/// 10 m pixels anchored at a UTM origin
pub const PAN_GT: [f64; 6] = [500000.0, 10.0, 0.0, 4100000.0, 0.0, -10.0];
/// Same origin, 20 m pixels
pub const MS_GT: [f64; 6] = [500000.0, 20.0, 0.0, 4100000.0, 0.0, -20.0];

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn utm_wkt() -> String {
    SpatialRef::from_epsg(32633)
        .expect("EPSG:32633 should be known")
        .to_wkt()
        .expect("WKT export")
}

/// Write a single-band GeoTIFF from row-major `data`
pub fn write_raster<T: GdalType + Copy>(
    path: &Path,
    width: usize,
    height: usize,
    geo_transform: [f64; 6],
    wkt: &str,
    data: Vec<T>,
    no_data: Option<f64>,
) -> PathBuf {
    assert_eq!(data.len(), width * height);
    let driver = DriverManager::get_driver_by_name("GTiff").expect("GTiff driver");
    let mut dataset = driver
        .create_with_band_type::<T, _>(path, width as isize, height as isize, 1)
        .expect("Failed to create test raster");
    dataset.set_geo_transform(&geo_transform).expect("geotransform");
    if !wkt.is_empty() {
        dataset.set_projection(wkt).expect("projection");
    }
    let mut band = dataset.rasterband(1).expect("band 1");
    if let Some(nd) = no_data {
        band.set_no_data_value(Some(nd)).expect("nodata");
    }
    band.write((0, 0), (width, height), &Buffer::new((width, height), data))
        .expect("Failed to write test raster");
    path.to_path_buf()
}

pub fn write_constant<T: GdalType + Copy>(
    path: &Path,
    width: usize,
    height: usize,
    geo_transform: [f64; 6],
    wkt: &str,
    value: T,
) -> PathBuf {
    write_raster(path, width, height, geo_transform, wkt, vec![value; width * height], None)
}

/// All pixels of one band as f32
pub fn read_band(path: &Path, band: isize) -> Vec<f32> {
    let dataset = Dataset::open(path).expect("Failed to open output");
    let (width, height) = dataset.raster_size();
    dataset
        .rasterband(band)
        .expect("band")
        .read_as::<f32>((0, 0), (width, height), (width, height), None)
        .expect("Failed to read band")
        .data
}
