//! Diagnostics data model returned alongside every render.
//!
//! [`AbstractionReport`] bundles the [`AbstractionResult`](crate::abstraction::AbstractionResult)
//! with a [`PipelineTrace`] of stage timings, segmentation passes, entity
//! counts and the optimizer outcome. [`debug_images`] draws colour-coded
//! views of the intermediate maps.

pub mod debug_images;
pub mod pipeline;
pub mod timing;

pub use debug_images::{distinct_color, rgb_to_gray, DebugImages, DebugSources, RgbGrid};
pub use pipeline::{
    AbstractionReport, EntityCounts, InputDescriptor, OptimizationStage, PipelineTrace,
    SegmentationStage,
};
pub use timing::{StageTiming, TimingBreakdown};
