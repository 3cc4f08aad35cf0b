#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod abstraction;
pub mod abstractor;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod types;

// Collaborators and building blocks; public for tools and tests.
pub mod compose;
pub mod config;
pub mod factor_graph;
pub mod mesh;
pub mod raster;

// --- High-level re-exports -------------------------------------------------

// Main entry points: orchestrator, parameters and results.
pub use crate::abstraction::{AbstractionParams, AbstractionResult, FrameBuffers};
pub use crate::abstractor::Abstractor;
pub use crate::error::{AbstractionError, Result};

// Diagnostics returned by every render.
pub use crate::diagnostics::{AbstractionReport, PipelineTrace};

// Model and rasterization seam.
pub use crate::mesh::{ModelData, TriMesh};
pub use crate::raster::{Rasterizer, SoftwareRasterizer};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use bw_abstraction::prelude::*;
/// use nalgebra::Matrix4;
///
/// # fn main() -> bw_abstraction::Result<()> {
/// let params = AbstractionParams {
///     render_width: 640,
///     render_height: 480,
///     ..Default::default()
/// };
/// let mut abstractor = Abstractor::new();
/// abstractor.load_model_from_obj(std::path::Path::new("model.obj"), &params)?;
/// let report = abstractor.render(&Matrix4::identity(), &params)?;
/// println!(
///     "patches={} boundaries={} total_ms={:.3}",
///     report.result.patches.len(),
///     report.result.boundaries.len(),
///     report.trace.timings.total_ms
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::Grid;
    pub use crate::{AbstractionParams, AbstractionReport, Abstractor, FrameBuffers, TriMesh};
}

// --- Stage-level API (for tools & advanced users) --------------------------

pub mod stages {
    // Stage runners.
    pub use crate::abstraction::boundaries::build_boundaries;
    pub use crate::abstraction::distance::euclidean_distance_transform;
    pub use crate::abstraction::features::{classify_feature_pixels, group_feature_lines};
    pub use crate::abstraction::inclusion::detect_inclusions;
    pub use crate::abstraction::optimize::{optimize_labels, Labeling};
    pub use crate::abstraction::segmentation::{segment_patches, SegmentationInput};
    pub use crate::abstraction::similarity::group_similar_patches;
    pub use crate::abstraction::surface::classify_surface_pixels;
    pub use crate::abstraction::terms::{compute_terms, BoundaryTerms, EnergyTerms, PatchTerms};
    pub use crate::compose::{compose_strokes, stroke_radius, StrokeInputs};

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        EntityCounts, InputDescriptor, OptimizationStage, SegmentationStage, StageTiming,
        TimingBreakdown,
    };
}
