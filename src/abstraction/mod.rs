//! Image-space abstraction core.
//!
//! Overview
//! - [`surface`] lists the pixels covered by the mesh.
//! - [`segmentation`] floods them into patches through four escalating
//!   strategies, flagging occlusion seams as depth-critical on the way.
//! - [`boundaries`] gathers per-patch statistics, builds one [`Boundary`]
//!   per touching patch pair with depth votes, and runs the distance
//!   transform in [`distance`].
//! - [`features`] groups sharp-edge and depth-critical pixels into
//!   per-patch feature lines.
//! - [`similarity`] and [`inclusion`] derive the soft constraints of the
//!   energy model; [`terms`] normalizes its inputs and [`optimize`] solves
//!   it with max-sum belief propagation.
//! - [`pipeline`] chains the stages over a [`FrameWorkspace`].
//!
//! [`Boundary`]: crate::types::Boundary

pub mod boundaries;
pub mod distance;
pub mod features;
pub mod inclusion;
pub mod optimize;
pub mod params;
pub mod pipeline;
pub mod segmentation;
pub mod similarity;
pub mod surface;
pub mod terms;
pub mod workspace;

pub use params::{AbstractionParams, BeliefPropagationOptions, ResultImages};
pub use pipeline::{abstract_frame, AbstractionResult, FrameBuffers};
pub use segmentation::{MergeStrategy, Segmentation, StrategyOutcome};
pub use workspace::FrameWorkspace;
