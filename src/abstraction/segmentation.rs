//! Patch segmentation as an escalating sequence of merge strategies.
//!
//! Each strategy consumes the pixels still unresolved after the previous
//! one and returns those it could not place:
//!
//! 1. [`MergeStrategy::SurfaceFlood`] 4-connected flood fill that only
//!    crosses between pixels whose triangles share a mesh vertex. A refused
//!    crossing marks the current pixel depth-critical (an occlusion seam).
//!    Fills reaching the size threshold become patches; smaller ones are
//!    relabelled [`STRANDED_PRIMARY`] and handed on.
//! 2. [`MergeStrategy::ComponentFlood`] refills stranded pixels, relaxing
//!    the join test to "same mesh component". Small fills become
//!    [`STRANDED_COMPONENT`].
//! 3. [`MergeStrategy::GreedyPixel`] sweeps the remaining pixels, attaching
//!    each to the largest committed patch among its 4-neighbours (first found
//!    wins on equal size), until a sweep makes no progress.
//! 4. [`MergeStrategy::GreedyPatch`] is a reserved patch-level merge that
//!    currently leaves the segmentation unchanged.
//!
//! Pixels left after the last strategy belong to no patch.
use super::workspace::{FrameWorkspace, STRANDED_COMPONENT, STRANDED_PRIMARY, UNLABELED};
use crate::image::Grid;
use crate::mesh::ModelData;
use crate::raster::BACKGROUND_TRIANGLE;
use crate::types::{ComponentId, Patch, PatchId, PixelCoord};
use log::{debug, warn};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    SurfaceFlood,
    ComponentFlood,
    GreedyPixel,
    GreedyPatch,
}

impl MergeStrategy {
    /// Strategies in the order they are applied.
    pub const ESCALATION: [MergeStrategy; 4] = [
        MergeStrategy::SurfaceFlood,
        MergeStrategy::ComponentFlood,
        MergeStrategy::GreedyPixel,
        MergeStrategy::GreedyPatch,
    ];
}

/// Book-keeping of one strategy run.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutcome {
    pub strategy: MergeStrategy,
    pub input_pixels: usize,
    pub patches_created: usize,
    pub unresolved: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Segmentation {
    pub patches: Vec<Patch>,
    /// Pixels no strategy could place.
    pub stranded: Vec<PixelCoord>,
    pub passes: Vec<StrategyOutcome>,
}

/// Read-only inputs of the segmentation.
pub struct SegmentationInput<'a> {
    pub triangle_ids: &'a Grid<i32>,
    pub model: &'a ModelData,
    pub patch_size_threshold: usize,
}

/// Run all strategies over `surface_pixels` (row-major covered pixels).
pub fn segment_patches(
    ws: &mut FrameWorkspace,
    input: &SegmentationInput<'_>,
    surface_pixels: &[PixelCoord],
) -> Segmentation {
    let mut patches: Vec<Patch> = Vec::new();
    let mut passes = Vec::with_capacity(MergeStrategy::ESCALATION.len());
    let mut unresolved = surface_pixels.to_vec();

    for strategy in MergeStrategy::ESCALATION {
        let input_pixels = unresolved.len();
        let before = patches.len();
        unresolved = match strategy {
            MergeStrategy::SurfaceFlood => surface_flood(ws, input, &unresolved, &mut patches),
            MergeStrategy::ComponentFlood => {
                component_flood(ws, input, &unresolved, &mut patches)
            }
            MergeStrategy::GreedyPixel => greedy_pixel_merge(ws, input, unresolved, &mut patches),
            MergeStrategy::GreedyPatch => greedy_patch_merge(unresolved, &mut patches),
        };
        let outcome = StrategyOutcome {
            strategy,
            input_pixels,
            patches_created: patches.len() - before,
            unresolved: unresolved.len(),
        };
        debug!(
            "segmentation {:?}: input={} created={} unresolved={}",
            strategy, outcome.input_pixels, outcome.patches_created, outcome.unresolved
        );
        passes.push(outcome);
    }

    if !unresolved.is_empty() {
        warn!(
            "segmentation left {} pixels without a patch",
            unresolved.len()
        );
    }
    Segmentation {
        patches,
        stranded: unresolved,
        passes,
    }
}

/// Flood from `seed` with `join(current, neighbour)`; returns the filled pixels.
///
/// `claimable` is the patch-id value a neighbour must carry to be considered.
/// `on_refused` is called with the current pixel whenever a claimable
/// neighbour fails `join`.
fn flood<J, R>(
    ws: &mut FrameWorkspace,
    triangle_ids: &Grid<i32>,
    seed: PixelCoord,
    label: i32,
    claimable: i32,
    mut join: J,
    mut on_refused: R,
) -> Vec<PixelCoord>
where
    J: FnMut(PixelCoord, PixelCoord) -> bool,
    R: FnMut(&mut FrameWorkspace, PixelCoord),
{
    let mut filled = Vec::new();
    ws.queue.clear();
    ws.queue.push_back(seed);
    ws.patch_ids.put(seed, label);
    while let Some(p) = ws.queue.pop_front() {
        filled.push(p);
        for n in triangle_ids.neighbors4(p) {
            if triangle_ids.at(n) == BACKGROUND_TRIANGLE || ws.patch_ids.at(n) != claimable {
                continue;
            }
            if join(p, n) {
                ws.patch_ids.put(n, label);
                ws.queue.push_back(n);
            } else {
                on_refused(ws, p);
            }
        }
    }
    filled
}

fn commit_or_strand(
    ws: &mut FrameWorkspace,
    filled: Vec<PixelCoord>,
    component: Option<ComponentId>,
    threshold: usize,
    stranded_label: i32,
    patches: &mut Vec<Patch>,
    stranded: &mut Vec<PixelCoord>,
) {
    if filled.len() >= threshold {
        let mut patch = Patch::new(PatchId(patches.len() as u32), component);
        patch.pixels = filled;
        patches.push(patch);
    } else {
        for &p in &filled {
            ws.patch_ids.put(p, stranded_label);
        }
        stranded.extend(filled);
    }
}

fn surface_flood(
    ws: &mut FrameWorkspace,
    input: &SegmentationInput<'_>,
    pixels: &[PixelCoord],
    patches: &mut Vec<Patch>,
) -> Vec<PixelCoord> {
    let ids = input.triangle_ids;
    let surface = &input.model.surface;
    let mut stranded = Vec::new();
    for &seed in pixels {
        if ws.patch_ids.at(seed) != UNLABELED {
            continue;
        }
        let label = patches.len() as i32;
        let filled = flood(
            ws,
            ids,
            seed,
            label,
            UNLABELED,
            |p, n| surface.connected(ids.at(p), ids.at(n)),
            |ws, p| ws.depth_critical.put(p, 1),
        );
        let component = input.model.component_of(ids.at(seed));
        commit_or_strand(
            ws,
            filled,
            component,
            input.patch_size_threshold,
            STRANDED_PRIMARY,
            patches,
            &mut stranded,
        );
    }
    stranded
}

fn component_flood(
    ws: &mut FrameWorkspace,
    input: &SegmentationInput<'_>,
    pixels: &[PixelCoord],
    patches: &mut Vec<Patch>,
) -> Vec<PixelCoord> {
    let ids = input.triangle_ids;
    let model = input.model;
    let mut stranded = Vec::new();
    for &seed in pixels {
        if ws.patch_ids.at(seed) != STRANDED_PRIMARY {
            continue;
        }
        let label = patches.len() as i32;
        let component = model.component_of(ids.at(seed));
        let filled = flood(
            ws,
            ids,
            seed,
            label,
            STRANDED_PRIMARY,
            |_, n| model.component_of(ids.at(n)) == component,
            |_, _| {},
        );
        commit_or_strand(
            ws,
            filled,
            component,
            input.patch_size_threshold,
            STRANDED_COMPONENT,
            patches,
            &mut stranded,
        );
    }
    stranded
}

fn greedy_pixel_merge(
    ws: &mut FrameWorkspace,
    input: &SegmentationInput<'_>,
    mut pixels: Vec<PixelCoord>,
    patches: &mut [Patch],
) -> Vec<PixelCoord> {
    let ids = input.triangle_ids;
    while !pixels.is_empty() {
        let before = pixels.len();
        let mut remaining = Vec::with_capacity(before);
        for &p in &pixels {
            let mut best: Option<(usize, usize)> = None;
            for n in ids.neighbors4(p) {
                if ids.at(n) == BACKGROUND_TRIANGLE {
                    continue;
                }
                let Ok(pid) = usize::try_from(ws.patch_ids.at(n)) else {
                    continue;
                };
                let size = patches[pid].pixels.len();
                if best.map_or(true, |(_, best_size)| size > best_size) {
                    best = Some((pid, size));
                }
            }
            match best {
                Some((pid, _)) => {
                    ws.patch_ids.put(p, pid as i32);
                    patches[pid].pixels.push(p);
                }
                None => remaining.push(p),
            }
        }
        pixels = remaining;
        if pixels.len() == before {
            break;
        }
    }
    pixels
}

/// Reserved patch-level merge; the segmentation passes through unchanged.
fn greedy_patch_merge(pixels: Vec<PixelCoord>, _patches: &mut [Patch]) -> Vec<PixelCoord> {
    pixels
}
