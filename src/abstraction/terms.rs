//! Normalized quantities feeding the label optimizer.
//!
//! Lengths are divided by the render width and areas by the pixel count,
//! so the weights in [`AbstractionParams`](super::AbstractionParams) keep
//! their meaning across render sizes.
use crate::types::{Boundary, Patch};
use log::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PatchTerms {
    /// Pixel count over image area.
    pub area: f64,
    /// Background-boundary length (over width) times `area`.
    pub background: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundaryTerms {
    /// Half the contact pixel count (over width) times the smaller patch area.
    pub length_area: f64,
    /// Falloff of the contrast halo: `1 - scale / (2 * min_dt)`, clamped at 0.
    pub scale_contrast: f64,
    /// Falloff of the line halo: `1 - scale / min_dt`, clamped at 0.
    pub scale_line: f64,
    /// Average depth difference over the frame maximum.
    pub depth: f64,
}

#[derive(Clone, Debug, Default)]
pub struct EnergyTerms {
    pub patches: Vec<PatchTerms>,
    pub boundaries: Vec<BoundaryTerms>,
}

fn falloff(scale: f64, budget: f64) -> f64 {
    if budget <= 0.0 {
        0.0
    } else {
        (1.0 - scale / budget).max(0.0)
    }
}

pub fn compute_terms(
    patches: &[Patch],
    boundaries: &[Boundary],
    width: usize,
    height: usize,
    scale: f32,
) -> EnergyTerms {
    let w = width.max(1) as f64;
    let pixels = (width * height).max(1) as f64;
    let scale = f64::from(scale);

    let patch_terms: Vec<PatchTerms> = patches
        .iter()
        .map(|p| {
            let area = p.area() as f64 / pixels;
            PatchTerms {
                area,
                background: f64::from(p.background_boundary_length) / w * area,
            }
        })
        .collect();

    let max_depth_diff = boundaries
        .iter()
        .map(|b| f64::from(b.avg_depth_diff))
        .fold(0.0f64, f64::max);
    if !boundaries.is_empty() && max_depth_diff <= 0.0 {
        debug!("compute_terms: all boundaries have zero depth difference");
    }

    let boundary_terms = boundaries
        .iter()
        .map(|b| {
            let [p, q] = b.patches;
            let length = (b.contact_pixels() as f64 * 0.5).floor() / w;
            let min_area = patch_terms[p.index()].area.min(patch_terms[q.index()].area);
            let min_dt = f64::from(
                patches[p.index()]
                    .max_distance_transform
                    .min(patches[q.index()].max_distance_transform),
            );
            let depth = if max_depth_diff > 0.0 {
                f64::from(b.avg_depth_diff) / max_depth_diff
            } else {
                0.0
            };
            BoundaryTerms {
                length_area: length * min_area,
                scale_contrast: falloff(scale, 2.0 * min_dt),
                scale_line: falloff(scale, min_dt),
                depth,
            }
        })
        .collect();

    EnergyTerms {
        patches: patch_terms,
        boundaries: boundary_terms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundaryId, PatchId, PixelCoord};
    use approx::assert_relative_eq;

    fn patch(id: u32, area: usize, bg: u32, dt: f32) -> Patch {
        let mut p = Patch::new(PatchId(id), None);
        p.pixels = vec![PixelCoord::new(0, 0); area];
        p.background_boundary_length = bg;
        p.max_distance_transform = dt;
        p
    }

    #[test]
    fn normalizes_by_frame_size() {
        let patches = vec![patch(0, 50, 10, 4.0), patch(1, 25, 0, 2.0)];
        let mut b = Boundary::new(BoundaryId(0), PatchId(0), PatchId(1));
        b.pixels = [vec![PixelCoord::new(0, 0); 5], vec![PixelCoord::new(0, 0); 4]];
        b.avg_depth_diff = 0.5;
        let terms = compute_terms(&patches, &[b], 10, 10, 1.0);

        assert_relative_eq!(terms.patches[0].area, 0.5);
        assert_relative_eq!(terms.patches[0].background, 0.5);
        assert_relative_eq!(terms.patches[1].background, 0.0);
        let bt = terms.boundaries[0];
        // floor(9 / 2) / 10 * min(0.5, 0.25)
        assert_relative_eq!(bt.length_area, 0.1);
        assert_relative_eq!(bt.scale_contrast, 0.75);
        assert_relative_eq!(bt.scale_line, 0.5);
        assert_relative_eq!(bt.depth, 1.0);
    }

    #[test]
    fn zero_thickness_and_flat_depth_give_zero_terms() {
        let patches = vec![patch(0, 4, 0, 0.0), patch(1, 4, 0, 3.0)];
        let b = Boundary::new(BoundaryId(0), PatchId(0), PatchId(1));
        let terms = compute_terms(&patches, &[b], 4, 4, 1.0);
        let bt = terms.boundaries[0];
        assert_eq!(bt.scale_contrast, 0.0);
        assert_eq!(bt.scale_line, 0.0);
        assert_eq!(bt.depth, 0.0);
    }
}
