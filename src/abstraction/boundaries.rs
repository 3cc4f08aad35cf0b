//! Patch statistics and inter-patch boundaries.
//!
//! One scan over the patch pixels collects, per patch, the boundary and
//! background-contact lengths and the bounding box of its boundary pixels,
//! and registers every patch-patch contact with the [`Boundary`] of that
//! pair. Each contacting pixel casts a depth vote for the farther side. The
//! boundary pixels seed the distance transform, whose per-patch maximum
//! measures how thick a patch is.
use super::distance::euclidean_distance_transform;
use super::workspace::FrameWorkspace;
use crate::image::Grid;
use crate::types::{canonical_pair, Boundary, BoundaryId, Patch, PatchId, PixelCoord};
use std::collections::HashMap;

struct BoundaryBuilder {
    boundaries: Vec<Boundary>,
    index: HashMap<(PatchId, PatchId), BoundaryId>,
}

impl BoundaryBuilder {
    fn new() -> Self {
        Self {
            boundaries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Record that `pixel` of `own` touches a pixel of `other` at depth `other_depth`.
    fn add_contact(
        &mut self,
        pixel: PixelCoord,
        own: PatchId,
        own_depth: f32,
        other: PatchId,
        other_depth: f32,
    ) {
        let key = canonical_pair(own, other);
        let next = BoundaryId(self.boundaries.len() as u32);
        let id = *self.index.entry(key).or_insert(next);
        if id == next {
            self.boundaries.push(Boundary::new(id, key.0, key.1));
        }
        let boundary = &mut self.boundaries[id.index()];
        let (side, first_depth, second_depth) = if key.0 == own {
            (0, own_depth, other_depth)
        } else {
            (1, other_depth, own_depth)
        };
        boundary.pixels[side].push(pixel);
        if first_depth > second_depth {
            boundary.votes[0] += 1;
        } else {
            boundary.votes[1] += 1;
        }
        boundary.avg_depth_diff += (own_depth - other_depth).abs();
    }
}

/// Fill patch statistics, extract boundaries and compute the distance transform.
///
/// Expects `ws.patch_ids` to hold the final segmentation. Writes
/// `ws.boundary_mask`, `ws.distance_seeds` and `ws.distance`.
pub fn build_boundaries(
    ws: &mut FrameWorkspace,
    depth: &Grid<f32>,
    patches: &mut [Patch],
) -> Vec<Boundary> {
    let mut builder = BoundaryBuilder::new();
    let mut contacts: Vec<PatchId> = Vec::with_capacity(4);

    for patch in patches.iter_mut() {
        let own = patch.id;
        for &p in &patch.pixels {
            contacts.clear();
            let mut is_boundary = false;
            let mut touches_background = false;
            let own_depth = depth.at(p);
            for n in ws.patch_ids.neighbors4(p) {
                let other = ws.patch_ids.at(n);
                if other < 0 {
                    is_boundary = true;
                    touches_background = true;
                    continue;
                }
                let other = PatchId(other as u32);
                if other == own {
                    continue;
                }
                is_boundary = true;
                if !contacts.contains(&other) {
                    contacts.push(other);
                    builder.add_contact(p, own, own_depth, other, depth.at(n));
                    ws.boundary_mask.put(p, 1);
                    patch.neighbours.insert(other);
                }
            }
            if is_boundary {
                patch.boundary_length += 1;
                ws.distance_seeds.put(p, 1);
                patch.bounding_box.union_point(p);
            }
            if touches_background {
                patch.background_boundary_length += 1;
            }
        }
    }

    euclidean_distance_transform(&ws.distance_seeds, &mut ws.distance);
    for patch in patches.iter_mut() {
        patch.max_distance_transform = patch
            .pixels
            .iter()
            .map(|&p| ws.distance.at(p))
            .fold(0.0f32, f32::max);
    }

    // Make adjacency mutual.
    let pairs: Vec<(PatchId, PatchId)> = builder.index.keys().copied().collect();
    for (a, b) in pairs {
        patches[a.index()].neighbours.insert(b);
        patches[b.index()].neighbours.insert(a);
    }

    let mut boundaries = builder.boundaries;
    for boundary in &mut boundaries {
        let contacts = boundary.contact_pixels();
        if contacts > 0 {
            boundary.avg_depth_diff /= contacts as f32;
        }
    }
    boundaries
}
