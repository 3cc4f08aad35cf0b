//! One render of the abstraction core over caller-supplied buffers.
//!
//! Stage order: surface classification, segmentation, boundaries and the
//! distance transform, feature lines, similarity sets, inclusion pairs,
//! energy terms, label optimization, stroke composition and (optionally)
//! debug images. Every stage accepts empty input, so an all-background
//! frame yields a background-only image and empty collections.
use super::boundaries::build_boundaries;
use super::features::{classify_feature_pixels, group_feature_lines};
use super::inclusion::detect_inclusions;
use super::optimize::optimize_labels;
use super::params::AbstractionParams;
use super::segmentation::{segment_patches, SegmentationInput};
use super::similarity::group_similar_patches;
use super::surface::classify_surface_pixels;
use super::terms::compute_terms;
use super::workspace::FrameWorkspace;
use crate::compose::{compose_strokes, StrokeInputs};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::{
    AbstractionReport, DebugImages, DebugSources, EntityCounts, InputDescriptor,
    OptimizationStage, PipelineTrace, SegmentationStage, TimingBreakdown,
};
use crate::error::{AbstractionError, Result};
use crate::image::Grid;
use crate::mesh::ModelData;
use crate::raster::SurfaceBuffers;
use crate::types::{Boundary, FeatureLine, InclusionPair, Patch, PixelCoord, SimilaritySet};
use log::debug;
use serde::Serialize;
use std::time::Instant;

/// Per-pixel inputs of one render.
#[derive(Clone, Debug, Default)]
pub struct FrameBuffers {
    /// Nearest triangle per pixel, -1 for background.
    pub triangle_ids: Grid<i32>,
    pub depth: Grid<f32>,
    /// 1 where a sharp mesh edge is visible.
    pub sharp_edge_lines: Grid<u8>,
}

impl FrameBuffers {
    pub fn from_surface(surface: SurfaceBuffers, sharp_edge_lines: Grid<u8>) -> Self {
        Self {
            triangle_ids: surface.triangle_ids,
            depth: surface.depth,
            sharp_edge_lines,
        }
    }

    fn check_dimensions(&self, width: usize, height: usize) -> Result<()> {
        let buffers = [
            ("triangle id", (self.triangle_ids.w, self.triangle_ids.h)),
            ("depth", (self.depth.w, self.depth.h)),
            (
                "sharp edge",
                (self.sharp_edge_lines.w, self.sharp_edge_lines.h),
            ),
        ];
        for (buffer, actual) in buffers {
            if actual != (width, height) {
                return Err(AbstractionError::DimensionMismatch {
                    buffer,
                    expected: (width, height),
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Entities and images produced by one render.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractionResult {
    pub width: usize,
    pub height: usize,
    /// Composited 8-bit image.
    #[serde(skip)]
    pub image: Grid<u8>,
    pub patches: Vec<Patch>,
    pub boundaries: Vec<Boundary>,
    pub feature_lines: Vec<FeatureLine>,
    pub similarity_sets: Vec<SimilaritySet>,
    pub inclusion_pairs: Vec<InclusionPair>,
    /// Surface pixels that belong to no patch.
    pub stranded: Vec<PixelCoord>,
    /// Patch id per pixel; negative where no patch.
    #[serde(skip)]
    pub patch_ids: Grid<i32>,
    #[serde(skip)]
    pub distance_transform: Grid<f32>,
    #[serde(skip)]
    pub debug_images: DebugImages,
}

/// 1-based mesh component per pixel (0 for background).
fn component_map(triangle_ids: &Grid<i32>, model: &ModelData) -> Grid<u32> {
    let data = triangle_ids
        .data
        .iter()
        .map(|&t| model.component_of(t).map_or(0, |c| c.0 + 1))
        .collect();
    Grid {
        w: triangle_ids.w,
        h: triangle_ids.h,
        data,
    }
}

/// Run the abstraction core on `frame`.
///
/// `frame` must match `params.render_width x params.render_height`.
pub fn abstract_frame(
    ws: &mut FrameWorkspace,
    frame: &FrameBuffers,
    model: &ModelData,
    params: &AbstractionParams,
    render_count: u64,
) -> Result<AbstractionReport> {
    params.validate()?;
    let (width, height) = (params.render_width, params.render_height);
    frame.check_dimensions(width, height)?;
    debug!(
        "abstract_frame start w={} h={} render={}",
        width, height, render_count
    );
    let total_start = Instant::now();
    let mut timings = TimingBreakdown::default();

    ws.reset(width, height);
    let surface_pixels = timings.time("surface", || classify_surface_pixels(&frame.triangle_ids));

    let seg_input = SegmentationInput {
        triangle_ids: &frame.triangle_ids,
        model,
        patch_size_threshold: params.patch_size_threshold,
    };
    let segmentation = timings.time("segmentation", || {
        segment_patches(ws, &seg_input, &surface_pixels)
    });
    let mut patches = segmentation.patches;

    let mut boundaries =
        timings.time("boundaries", || build_boundaries(ws, &frame.depth, &mut patches));

    let feature_lines = timings.time("feature_lines", || {
        classify_feature_pixels(ws, &frame.triangle_ids, &frame.sharp_edge_lines);
        group_feature_lines(ws)
    });

    let similarity_sets = timings.time("similarity", || {
        group_similar_patches(&patches, model.component_count, &model.congruent_pairs)
    });
    let inclusion_pairs = timings.time("inclusion", || detect_inclusions(&patches));
    debug!(
        "abstract_frame patches={} boundaries={} feature_lines={} similarity_sets={} inclusion_pairs={}",
        patches.len(),
        boundaries.len(),
        feature_lines.len(),
        similarity_sets.len(),
        inclusion_pairs.len()
    );

    let optimization = if patches.is_empty() {
        None
    } else {
        let start = Instant::now();
        let terms = compute_terms(&patches, &boundaries, width, height, params.scale);
        let labeling = optimize_labels(
            &mut patches,
            &mut boundaries,
            &similarity_sets,
            &inclusion_pairs,
            &terms,
            params,
        )?;
        timings.push("optimization", elapsed_ms(start));
        Some(OptimizationStage::new(
            labeling.variables,
            labeling.factors,
            &labeling.outcome,
        ))
    };

    let image = timings.time("compose", || {
        compose_strokes(&StrokeInputs {
            width,
            height,
            patches: &patches,
            boundaries: &boundaries,
            feature_lines: &feature_lines,
            scale: params.scale,
            feature_weight: params.feature_weight,
            background: params.background_gray(),
        })
    });

    let debug_images = if params.result_images.any() {
        timings.time("debug_images", || {
            let components = if params.result_images.component {
                component_map(&frame.triangle_ids, model)
            } else {
                Grid::default()
            };
            DebugImages::render(
                &params.result_images,
                &DebugSources {
                    width,
                    height,
                    background: params.background_rgb(),
                    patches: &patches,
                    boundaries: &boundaries,
                    feature_lines: &feature_lines,
                    similarity_sets: &similarity_sets,
                    inclusion_pairs: &inclusion_pairs,
                    depth_critical: ws.depth_critical(),
                    sharp_edges: &frame.sharp_edge_lines,
                    distance: ws.distance(),
                    components: &components,
                },
            )
        })
    } else {
        DebugImages::default()
    };

    timings.total_ms = elapsed_ms(total_start);
    let trace = PipelineTrace {
        input: InputDescriptor {
            width,
            height,
            render_count,
            faces: model.mesh.n_faces(),
            components: model.component_count,
            congruent_pairs: model.congruent_pairs.len(),
        },
        timings,
        segmentation: SegmentationStage {
            surface_pixels: surface_pixels.len(),
            depth_critical_pixels: ws.depth_critical().data.iter().filter(|&&v| v == 1).count(),
            passes: segmentation.passes,
            stranded: segmentation.stranded.len(),
        },
        counts: EntityCounts {
            patches: patches.len(),
            boundaries: boundaries.len(),
            feature_lines: feature_lines.len(),
            similarity_sets: similarity_sets.len(),
            inclusion_pairs: inclusion_pairs.len(),
        },
        optimization,
    };
    debug!(
        "abstract_frame done render={} total_ms={:.3}",
        render_count, trace.timings.total_ms
    );

    Ok(AbstractionReport {
        result: AbstractionResult {
            width,
            height,
            image,
            patches,
            boundaries,
            feature_lines,
            similarity_sets,
            inclusion_pairs,
            stranded: segmentation.stranded,
            patch_ids: ws.patch_ids().clone(),
            distance_transform: ws.distance().clone(),
            debug_images,
        },
        trace,
    })
}
