//! Core pansharpening modules

pub mod compat;
pub mod fusion;
pub mod pipeline;
pub mod scene;

// Re-export main types
pub use compat::{check_uniform_type, require_uniform_type};
pub use fusion::{brovey_pixel, fihs_pixel, FusionEngine, FusionPolicy, FusionStats};
pub use pipeline::{
    open_scene, PansharpenOutputs, PansharpenParams, Pansharpener, ScenePaths,
    BROVEY_OUTPUT_NAME, FIHS_OUTPUT_NAME,
};
pub use scene::SceneSet;
