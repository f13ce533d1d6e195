use crate::core::compat;
use crate::core::fusion::FusionEngine;
use crate::core::scene::SceneSet;
use crate::io::{RasterHandle, Resampler};
use crate::types::{BandCount, PansharpenError, PansharpenResult, Role};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Default base name of the FIHS output
pub const FIHS_OUTPUT_NAME: &str = "sharpened_FIHS.tif";
/// Default base name of the Brovey output
pub const BROVEY_OUTPUT_NAME: &str = "sharpened_Brovey.tif";

/// Paths of the five input GeoTIFFs
#[derive(Debug, Clone)]
pub struct ScenePaths {
    pub pan: PathBuf,
    pub red: PathBuf,
    pub green: PathBuf,
    pub blue: PathBuf,
    pub nir: PathBuf,
}

impl ScenePaths {
    pub fn get(&self, role: Role) -> &Path {
        match role {
            Role::Pan => &self.pan,
            Role::Red => &self.red,
            Role::Green => &self.green,
            Role::Blue => &self.blue,
            Role::Nir => &self.nir,
        }
    }

    /// Every path must name a `.tif` file (any case)
    pub fn validate(&self) -> PansharpenResult<()> {
        for role in Role::ALL {
            let path = self.get(role);
            if path.as_os_str().is_empty() {
                return Err(PansharpenError::Config(format!(
                    "no {} image file given",
                    role
                )));
            }
            if !has_tif_extension(path) {
                return Err(PansharpenError::Config(format!(
                    "{} image file should be a GeoTIFF (.tif): {}",
                    role,
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// At least six characters ending in `.tif`, case-insensitive
pub fn has_tif_extension(path: &Path) -> bool {
    let name = path.to_string_lossy();
    name.len() >= 6 && name.to_lowercase().ends_with(".tif")
}

/// Pansharpening run configuration
#[derive(Debug, Clone)]
pub struct PansharpenParams {
    pub band_count: BandCount,
    /// Directory receiving the two outputs; must exist
    pub output_dir: PathBuf,
    pub fihs_name: String,
    pub brovey_name: String,
    /// Mask negative panchromatic samples in addition to NoData
    pub zero_negative_pan: bool,
    /// Keep the resampled intermediates instead of deleting them
    pub keep_resampled: bool,
}

impl Default for PansharpenParams {
    fn default() -> Self {
        Self {
            band_count: BandCount::Three,
            output_dir: PathBuf::from("."),
            fihs_name: FIHS_OUTPUT_NAME.to_string(),
            brovey_name: BROVEY_OUTPUT_NAME.to_string(),
            zero_negative_pan: true,
            keep_resampled: false,
        }
    }
}

/// Paths of the two finished outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PansharpenOutputs {
    pub fihs: PathBuf,
    pub brovey: PathBuf,
    /// Set when resampled intermediates were kept
    pub resampled_dir: Option<PathBuf>,
}

/// Runs open -> type check -> resample -> fuse -> write for one scene
pub struct Pansharpener {
    params: PansharpenParams,
}

impl Pansharpener {
    pub fn new(params: PansharpenParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PansharpenParams {
        &self.params
    }

    pub fn run(&self, inputs: &ScenePaths) -> PansharpenResult<PansharpenOutputs> {
        inputs.validate()?;
        if !self.params.output_dir.is_dir() {
            return Err(PansharpenError::Config(format!(
                "output directory {} does not exist",
                self.params.output_dir.display()
            )));
        }

        log::info!("Opening input rasters");
        let original = open_scene(inputs)?;
        let pixel_type = compat::require_uniform_type(&original.handles())?;
        log::info!("Inputs share pixel type {}", pixel_type);

        let work_dir = tempfile::Builder::new()
            .prefix("pansharpen-resampled-")
            .tempdir()?;
        let aligned = self.resample_scene(&original, work_dir.path())?;

        let outputs = self.fuse_and_publish(&aligned)?;

        let resampled_dir = if self.params.keep_resampled {
            let kept = work_dir.into_path();
            log::info!("Keeping resampled rasters in {}", kept.display());
            Some(kept)
        } else {
            if let Err(e) = work_dir.close() {
                log::warn!("Failed to remove resampled rasters: {}", e);
            }
            None
        };

        Ok(PansharpenOutputs {
            resampled_dir,
            ..outputs
        })
    }

    /// Align the four spectral rasters onto the panchromatic grid
    pub fn resample_scene(&self, scene: &SceneSet, work_dir: &Path) -> PansharpenResult<SceneSet> {
        let resampler = Resampler::new(work_dir);
        let pan = &scene.pan;
        Ok(SceneSet {
            pan: pan.clone(),
            red: resampler.resample(&scene.red, pan)?,
            green: resampler.resample(&scene.green, pan)?,
            blue: resampler.resample(&scene.blue, pan)?,
            nir: resampler.resample(&scene.nir, pan)?,
        })
    }

    /// Fuse into a staging directory, then move both outputs into place together
    fn fuse_and_publish(&self, scene: &SceneSet) -> PansharpenResult<PansharpenOutputs> {
        let output_dir = &self.params.output_dir;
        let staging = tempfile::Builder::new()
            .prefix(".pansharpen-staging-")
            .tempdir_in(output_dir)?;
        let staged_fihs = staging.path().join(&self.params.fihs_name);
        let staged_brovey = staging.path().join(&self.params.brovey_name);

        let engine = FusionEngine::new(scene, self.params.band_count)
            .zero_negative_pan(self.params.zero_negative_pan);
        let (mut fihs, mut brovey) = engine.fuse(&staged_fihs, &staged_brovey)?;

        let band_names: Vec<&str> = self
            .params
            .band_count
            .roles()
            .iter()
            .map(|r| r.as_str())
            .collect();
        let timestamp = Utc::now().to_rfc3339();
        fihs.tag(&band_names, &timestamp)?;
        brovey.tag(&band_names, &timestamp)?;
        let staged_fihs = fihs.finalize();
        let staged_brovey = brovey.finalize();

        let final_fihs = output_dir.join(&self.params.fihs_name);
        let final_brovey = output_dir.join(&self.params.brovey_name);
        publish_pair(
            staging.path(),
            [&staged_fihs, &staged_brovey],
            [&final_fihs, &final_brovey],
        )?;
        log::info!(
            "Wrote {} and {}",
            final_fihs.display(),
            final_brovey.display()
        );

        if let Err(e) = staging.close() {
            log::warn!("Failed to remove staging directory: {}", e);
        }

        Ok(PansharpenOutputs {
            fihs: final_fihs,
            brovey: final_brovey,
            resampled_dir: None,
        })
    }
}

/// Open all five inputs, naming the failing role on error
pub fn open_scene(inputs: &ScenePaths) -> PansharpenResult<SceneSet> {
    let scene = SceneSet {
        pan: RasterHandle::open(Role::Pan, &inputs.pan)?,
        red: RasterHandle::open(Role::Red, &inputs.red)?,
        green: RasterHandle::open(Role::Green, &inputs.green)?,
        blue: RasterHandle::open(Role::Blue, &inputs.blue)?,
        nir: RasterHandle::open(Role::Nir, &inputs.nir)?,
    };
    Ok(scene)
}

/// Move both staged outputs into place, or leave the targets as they were
///
/// Existing target files are parked in `staging` first so a failed second
/// rename can put them back.
fn publish_pair(staging: &Path, staged: [&Path; 2], targets: [&Path; 2]) -> std::io::Result<()> {
    let mut parked: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (i, target) in targets.iter().enumerate() {
        if target.is_file() {
            let backup = staging.join(format!(".previous-{}", i));
            if let Err(e) = std::fs::rename(target, &backup) {
                restore_parked(&parked);
                return Err(e);
            }
            parked.push((backup, target.to_path_buf()));
        }
    }

    let mut placed: Vec<&Path> = Vec::new();
    for (from, to) in staged.iter().zip(targets) {
        if let Err(e) = std::fs::rename(from, to) {
            log::error!("Failed to move {} into place: {}", to.display(), e);
            for path in &placed {
                if let Err(e) = std::fs::remove_file(path) {
                    log::warn!("Failed to withdraw {}: {}", path.display(), e);
                }
            }
            restore_parked(&parked);
            return Err(e);
        }
        placed.push(to);
    }
    Ok(())
}

fn restore_parked(parked: &[(PathBuf, PathBuf)]) {
    for (backup, target) in parked {
        if let Err(e) = std::fs::rename(backup, target) {
            log::warn!("Failed to restore {}: {}", target.display(), e);
        }
    }
}
