mod common;

use common::{init_logging, read_band, utm_wkt, write_constant, write_raster, PAN_GT};
use gdal::Dataset;
use pansharpen::{
    BandCount, FusionOutput, GeoTransform, Method, PansharpenError, PixelType, RasterHandle, Role,
};
use tempfile::TempDir;

#[test]
fn test_open_reads_metadata() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let wkt = utm_wkt();
    let path = write_raster(
        &dir.path().join("pan.tif"),
        6,
        3,
        PAN_GT,
        &wkt,
        vec![7u16; 18],
        Some(0.0),
    );

    let handle = RasterHandle::open(Role::Pan, &path).expect("Failed to open pan raster");
    assert_eq!(handle.role, Role::Pan);
    assert_eq!((handle.width, handle.height), (6, 3));
    assert_eq!(handle.geo_transform.to_array(), PAN_GT);
    assert_eq!(handle.pixel_type, PixelType::UInt16);
    assert_eq!(handle.no_data, Some(0.0));
    assert!(!handle.spatial_ref.is_empty());
    assert!(handle.describe().contains("6x3 UInt16"));
}

#[test]
fn test_open_without_nodata_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_constant(&dir.path().join("red.tif"), 2, 2, PAN_GT, "", 3.5f32);

    let handle = RasterHandle::open(Role::Red, &path).unwrap();
    assert_eq!(handle.no_data, None);
    assert_eq!(handle.pixel_type, PixelType::Float32);
    assert!(handle.spatial_ref.is_empty());
}

#[test]
fn test_open_each_supported_type() {
    let dir = TempDir::new().unwrap();
    let p = |name: &str| dir.path().join(name);

    let cases = [
        (write_constant(&p("a.tif"), 2, 2, PAN_GT, "", 1u8), PixelType::Byte),
        (write_constant(&p("b.tif"), 2, 2, PAN_GT, "", 1u16), PixelType::UInt16),
        (write_constant(&p("c.tif"), 2, 2, PAN_GT, "", 1i16), PixelType::Int16),
        (write_constant(&p("d.tif"), 2, 2, PAN_GT, "", 1u32), PixelType::UInt32),
        (write_constant(&p("e.tif"), 2, 2, PAN_GT, "", 1i32), PixelType::Int32),
        (write_constant(&p("f.tif"), 2, 2, PAN_GT, "", 1f32), PixelType::Float32),
        (write_constant(&p("g.tif"), 2, 2, PAN_GT, "", 1f64), PixelType::Float64),
    ];
    for (path, expected) in cases {
        let handle = RasterHandle::open(Role::Blue, &path).unwrap();
        assert_eq!(handle.pixel_type, expected, "{}", path.display());
    }
}

#[test]
fn test_open_errors_name_role() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.tif");
    match RasterHandle::open(Role::Green, &missing) {
        Err(PansharpenError::Open { role, path, .. }) => {
            assert_eq!(role, Role::Green);
            assert_eq!(path, missing);
        }
        other => panic!("expected open error, got {:?}", other),
    }

    let garbage = dir.path().join("garbage.tif");
    std::fs::write(&garbage, b"not a tiff").unwrap();
    let err = RasterHandle::open(Role::Nir, &garbage).unwrap_err();
    assert!(matches!(err, PansharpenError::Open { role: Role::Nir, .. }));
    assert!(err.to_string().contains("nir"));
}

#[test]
fn test_metadata_round_trip_through_output() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let wkt = utm_wkt();
    let pan_path = write_raster(
        &dir.path().join("pan.tif"),
        5,
        4,
        PAN_GT,
        &wkt,
        vec![1u16; 20],
        Some(65535.0),
    );
    let pan = RasterHandle::open(Role::Pan, &pan_path).unwrap();

    let out_path = dir.path().join("out.tif");
    let output = FusionOutput::create(
        Method::Fihs,
        &out_path,
        pan.width,
        pan.height,
        BandCount::Four,
        &pan.geo_transform,
        &pan.spatial_ref,
    )
    .expect("Failed to create output");
    output.finalize();

    let dataset = Dataset::open(&out_path).unwrap();
    assert_eq!(dataset.raster_size(), (5, 4));
    assert_eq!(dataset.raster_count(), 4);
    let gt = dataset.geo_transform().unwrap();
    for (written, read) in PAN_GT.iter().zip(gt.iter()) {
        assert_eq!(written.to_bits(), read.to_bits());
    }
    assert_eq!(dataset.projection(), pan.spatial_ref);

    let reopened = RasterHandle::open(Role::Pan, &out_path).unwrap();
    assert_eq!(reopened.pixel_type, PixelType::Float32);
    assert_eq!(reopened.geo_transform, GeoTransform::from(PAN_GT));
}

#[test]
fn test_write_scanline_per_band() {
    let dir = TempDir::new().unwrap();
    let out_path = dir.path().join("bands.tif");
    let mut output = FusionOutput::create(
        Method::Brovey,
        &out_path,
        3,
        2,
        BandCount::Three,
        &GeoTransform::from(PAN_GT),
        "",
    )
    .unwrap();

    for band in 1..=3 {
        for row in 0..2 {
            let value = (band * 10 + row) as f32;
            output.write_scanline(band, row, &[value; 3]).unwrap();
        }
    }
    output.tag(&["red", "green", "blue"], "2024-01-01T00:00:00+00:00").unwrap();
    let path = output.finalize();

    assert_eq!(read_band(&path, 1), vec![10.0, 10.0, 10.0, 11.0, 11.0, 11.0]);
    assert_eq!(read_band(&path, 3), vec![30.0, 30.0, 30.0, 31.0, 31.0, 31.0]);
}

#[test]
fn test_write_scanline_rejects_out_of_range() {
    let dir = TempDir::new().unwrap();
    let mut output = FusionOutput::create(
        Method::Fihs,
        dir.path().join("small.tif"),
        2,
        2,
        BandCount::Three,
        &GeoTransform::default(),
        "",
    )
    .unwrap();

    assert!(output.write_scanline(0, 0, &[1.0, 2.0]).is_err());
    assert!(output.write_scanline(4, 0, &[1.0, 2.0]).is_err());
    assert!(output.write_scanline(1, 2, &[1.0, 2.0]).is_err());
    assert!(output.write_scanline(1, 0, &[1.0]).is_err());
    assert!(output.write_scanline(1, 1, &[1.0, 2.0]).is_ok());
}
