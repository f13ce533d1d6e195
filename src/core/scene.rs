use crate::core::compat;
use crate::io::RasterHandle;
use crate::types::{PansharpenError, PansharpenResult, PixelType, Role};

/// The five rasters of one fusion run
#[derive(Debug, Clone)]
pub struct SceneSet {
    pub pan: RasterHandle,
    pub red: RasterHandle,
    pub green: RasterHandle,
    pub blue: RasterHandle,
    pub nir: RasterHandle,
}

impl SceneSet {
    pub fn get(&self, role: Role) -> &RasterHandle {
        match role {
            Role::Pan => &self.pan,
            Role::Red => &self.red,
            Role::Green => &self.green,
            Role::Blue => &self.blue,
            Role::Nir => &self.nir,
        }
    }

    /// All five handles, panchromatic first
    pub fn handles(&self) -> [&RasterHandle; 5] {
        [&self.pan, &self.red, &self.green, &self.blue, &self.nir]
    }

    pub fn pixel_type(&self) -> PansharpenResult<PixelType> {
        compat::require_uniform_type(&self.handles())
    }

    /// Check the post-resampling invariants: one pixel type and the pan grid everywhere
    pub fn validate_aligned(&self) -> PansharpenResult<PixelType> {
        let pixel_type = self.pixel_type()?;
        for role in Role::SPECTRAL {
            let handle = self.get(role);
            if !handle.same_grid(&self.pan) {
                return Err(PansharpenError::Resample {
                    role,
                    message: format!(
                        "grid {}x{} differs from panchromatic {}x{}",
                        handle.width, handle.height, self.pan.width, self.pan.height
                    ),
                });
            }
        }
        Ok(pixel_type)
    }
}
