use crate::core::scene::SceneSet;
use crate::io::raster::matches_no_data;
use crate::io::{FusionOutput, RasterHandle};
use crate::types::{BandCount, Method, PansharpenError, PansharpenResult, PixelType, Role};
use gdal::raster::GdalType;
use gdal::Dataset;
use num_traits::AsPrimitive;
use std::path::Path;

/// Decides which panchromatic samples are excluded from fusion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    /// Panchromatic NoData sentinel
    pub no_data: Option<f64>,
    /// Also exclude negative panchromatic samples
    pub zero_negative_pan: bool,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            no_data: None,
            zero_negative_pan: true,
        }
    }
}

impl FusionPolicy {
    pub fn for_pan(pan: &RasterHandle, zero_negative_pan: bool) -> Self {
        Self {
            no_data: pan.no_data,
            zero_negative_pan,
        }
    }

    /// Masked pixels get 0.0 in every band of both outputs
    pub fn is_masked(&self, pan: f64) -> bool {
        matches_no_data(self.no_data, pan) || (self.zero_negative_pan && pan < 0.0)
    }
}

/// FIHS: every band shifted by `pan - mean(bands)`
pub fn fihs_pixel(pan: f64, bands: &[f64], out: &mut [f64]) {
    let intensity = bands.iter().sum::<f64>() / bands.len() as f64;
    let delta = pan - intensity;
    for (o, b) in out.iter_mut().zip(bands) {
        *o = b + delta;
    }
}

/// Brovey: every band scaled by `pan / sum(bands)`; a zero sum yields zeros
pub fn brovey_pixel(pan: f64, bands: &[f64], out: &mut [f64]) {
    let sum: f64 = bands.iter().sum();
    if sum == 0.0 {
        out.fill(0.0);
        return;
    }
    for (o, b) in out.iter_mut().zip(bands) {
        *o = (b / sum) * pan;
    }
}

/// Counters gathered during one fusion pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FusionStats {
    pub rows: usize,
    pub pixels: usize,
    pub masked_pixels: usize,
    pub zero_sum_pixels: usize,
}

/// Fuse one scanline of every band into the FIHS and Brovey row buffers
///
/// `bands` and both output slices are in band order (red, green, blue[, nir]);
/// every row is as wide as `pan`.
pub(crate) fn fuse_row<T: AsPrimitive<f64>>(
    policy: &FusionPolicy,
    pan: &[T],
    bands: &[Vec<T>],
    fihs: &mut [Vec<f32>],
    brovey: &mut [Vec<f32>],
    stats: &mut FusionStats,
) {
    let n = bands.len();
    debug_assert!((3..=4).contains(&n), "fusion takes 3 or 4 bands, got {}", n);
    debug_assert!(fihs.len() == n && brovey.len() == n);
    debug_assert!(bands.iter().all(|row| row.len() == pan.len()));
    debug_assert!(fihs.iter().chain(brovey.iter()).all(|row| row.len() == pan.len()));
    let mut values = [0.0f64; 4];
    let mut fihs_px = [0.0f64; 4];
    let mut brovey_px = [0.0f64; 4];

    for (col, pan_raw) in pan.iter().enumerate() {
        let pan_value: f64 = pan_raw.as_();
        stats.pixels += 1;

        if policy.is_masked(pan_value) {
            stats.masked_pixels += 1;
            for b in 0..n {
                fihs[b][col] = 0.0;
                brovey[b][col] = 0.0;
            }
            continue;
        }

        for (v, band) in values[..n].iter_mut().zip(bands) {
            *v = band[col].as_();
        }
        let values = &values[..n];
        if values.iter().sum::<f64>() == 0.0 {
            stats.zero_sum_pixels += 1;
        }
        fihs_pixel(pan_value, values, &mut fihs_px[..n]);
        brovey_pixel(pan_value, values, &mut brovey_px[..n]);

        for b in 0..n {
            fihs[b][col] = fihs_px[b] as f32;
            brovey[b][col] = brovey_px[b] as f32;
        }
    }
}

/// One input raster opened for row-by-row reading
struct ScanlineReader {
    role: Role,
    dataset: Dataset,
}

impl ScanlineReader {
    fn open(handle: &RasterHandle) -> PansharpenResult<Self> {
        Ok(Self {
            role: handle.role,
            dataset: handle.dataset()?,
        })
    }

    fn read<T: GdalType + Copy>(&self, row: usize, buf: &mut [T]) -> PansharpenResult<()> {
        let read_err = |source| PansharpenError::ScanlineRead {
            role: self.role,
            row,
            source,
        };
        let band = self.dataset.rasterband(1).map_err(read_err)?;
        let width = buf.len();
        band.read_into_slice((0, row as isize), (width, 1), (width, 1), buf, None)
            .map_err(read_err)
    }
}

/// Streams aligned scanlines through the FIHS and Brovey transforms
pub struct FusionEngine<'a> {
    scene: &'a SceneSet,
    band_count: BandCount,
    policy: FusionPolicy,
}

impl<'a> FusionEngine<'a> {
    /// Engine for an aligned scene; negative pan samples are masked by default
    pub fn new(scene: &'a SceneSet, band_count: BandCount) -> Self {
        Self {
            scene,
            band_count,
            policy: FusionPolicy::for_pan(&scene.pan, true),
        }
    }

    pub fn zero_negative_pan(mut self, enabled: bool) -> Self {
        self.policy.zero_negative_pan = enabled;
        self
    }

    pub fn policy(&self) -> &FusionPolicy {
        &self.policy
    }

    /// Create both outputs with the pan geometry and fill them in one pass
    ///
    /// The returned outputs are still open; callers finalize them. On error
    /// they are dropped (closed) and their contents must not be trusted.
    pub fn fuse<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        fihs_path: P,
        brovey_path: Q,
    ) -> PansharpenResult<(FusionOutput, FusionOutput)> {
        let pan = &self.scene.pan;
        let create = |method, path: &Path| {
            FusionOutput::create(
                method,
                path,
                pan.width,
                pan.height,
                self.band_count,
                &pan.geo_transform,
                &pan.spatial_ref,
            )
        };
        let mut fihs = create(Method::Fihs, fihs_path.as_ref())?;
        let mut brovey = create(Method::Brovey, brovey_path.as_ref())?;

        let stats = self.fuse_into(&mut fihs, &mut brovey)?;
        log::info!(
            "Fused {} pixels over {} rows ({} masked, {} with zero band sum)",
            stats.pixels,
            stats.rows,
            stats.masked_pixels,
            stats.zero_sum_pixels
        );
        Ok((fihs, brovey))
    }

    /// Fill existing outputs, dispatching once on the scene's pixel type
    pub fn fuse_into(
        &self,
        fihs: &mut FusionOutput,
        brovey: &mut FusionOutput,
    ) -> PansharpenResult<FusionStats> {
        let pixel_type = self.scene.validate_aligned()?;
        for output in [&*fihs, &*brovey] {
            if output.width != self.scene.pan.width
                || output.height != self.scene.pan.height
                || output.band_count != self.band_count
            {
                return Err(PansharpenError::Config(format!(
                    "{} output is {}x{}x{}, expected {}x{}x{}",
                    output.method,
                    output.width,
                    output.height,
                    output.band_count.get(),
                    self.scene.pan.width,
                    self.scene.pan.height,
                    self.band_count.get()
                )));
            }
        }

        log::info!(
            "Pansharpening {} scene ({} bands, policy {:?})",
            pixel_type,
            self.band_count.get(),
            self.policy
        );
        match pixel_type {
            PixelType::Byte => self.stream::<u8>(fihs, brovey),
            PixelType::UInt16 => self.stream::<u16>(fihs, brovey),
            PixelType::Int16 => self.stream::<i16>(fihs, brovey),
            PixelType::UInt32 => self.stream::<u32>(fihs, brovey),
            PixelType::Int32 => self.stream::<i32>(fihs, brovey),
            PixelType::Float32 => self.stream::<f32>(fihs, brovey),
            PixelType::Float64 => self.stream::<f64>(fihs, brovey),
        }
    }

    fn stream<T>(&self, fihs: &mut FusionOutput, brovey: &mut FusionOutput) -> PansharpenResult<FusionStats>
    where
        T: GdalType + Copy + Default + AsPrimitive<f64>,
    {
        let (width, height) = (self.scene.pan.width, self.scene.pan.height);
        let roles = self.band_count.roles();

        let pan_reader = ScanlineReader::open(&self.scene.pan)?;
        let band_readers = roles
            .iter()
            .map(|role| ScanlineReader::open(self.scene.get(*role)))
            .collect::<PansharpenResult<Vec<_>>>()?;

        let mut pan_row = vec![T::default(); width];
        let mut band_rows = vec![vec![T::default(); width]; roles.len()];
        let mut fihs_rows = vec![vec![0.0f32; width]; roles.len()];
        let mut brovey_rows = vec![vec![0.0f32; width]; roles.len()];

        let mut stats = FusionStats::default();
        let report_every = (height / 10).max(1);

        for row in 0..height {
            pan_reader.read(row, &mut pan_row)?;
            for (reader, buf) in band_readers.iter().zip(band_rows.iter_mut()) {
                reader.read(row, buf)?;
            }

            fuse_row(
                &self.policy,
                &pan_row,
                &band_rows,
                &mut fihs_rows,
                &mut brovey_rows,
                &mut stats,
            );

            for (i, (fihs_row, brovey_row)) in fihs_rows.iter().zip(&brovey_rows).enumerate() {
                fihs.write_scanline(i + 1, row, fihs_row)?;
                brovey.write_scanline(i + 1, row, brovey_row)?;
            }
            stats.rows += 1;

            if (row + 1) % report_every == 0 {
                log::debug!("Fused {}/{} rows", row + 1, height);
            }
        }

        Ok(stats)
    }
}
