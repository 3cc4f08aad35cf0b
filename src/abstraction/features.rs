//! Feature-line extraction.
//!
//! A covered pixel is a feature pixel when it lies on a rasterized sharp
//! edge or was flagged depth-critical by segmentation, unless it already
//! sits on a patch-patch boundary (that contact is drawn by the boundary
//! itself). Feature pixels are grouped into 8-connected runs that never
//! leave their patch.
use super::workspace::FrameWorkspace;
use crate::image::Grid;
use crate::raster::BACKGROUND_TRIANGLE;
use crate::types::{FeatureLine, PatchId, PixelCoord};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn classify_row(ids: &[i32], sharp: &[u8], critical: &[u8], boundary: &[u8], out: &mut [u8]) {
    for (k, o) in out.iter_mut().enumerate() {
        let candidate = sharp[k] == 1 || critical[k] == 1;
        *o = u8::from(ids[k] != BACKGROUND_TRIANGLE && candidate && boundary[k] != 1);
    }
}

/// Fill `ws.feature_mask` from the sharp-edge mask and the segmentation flags.
pub fn classify_feature_pixels(
    ws: &mut FrameWorkspace,
    triangle_ids: &Grid<i32>,
    sharp_edges: &Grid<u8>,
) {
    let w = triangle_ids.w.max(1);
    let FrameWorkspace {
        feature_mask,
        depth_critical,
        boundary_mask,
        ..
    } = ws;
    let (critical, boundary) = (&depth_critical.data, &boundary_mask.data);

    #[cfg(feature = "parallel")]
    feature_mask
        .data
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(row, out)| {
            let span = row * w..(row + 1) * w;
            classify_row(
                &triangle_ids.data[span.clone()],
                &sharp_edges.data[span.clone()],
                &critical[span.clone()],
                &boundary[span],
                out,
            );
        });
    #[cfg(not(feature = "parallel"))]
    feature_mask
        .rows_mut()
        .enumerate()
        .for_each(|(row, out)| {
            let span = row * w..(row + 1) * w;
            classify_row(
                &triangle_ids.data[span.clone()],
                &sharp_edges.data[span.clone()],
                &critical[span.clone()],
                &boundary[span],
                out,
            );
        });
}

/// Group feature pixels into lines, seeding in scan order.
///
/// Feature pixels outside any patch are skipped.
pub fn group_feature_lines(ws: &mut FrameWorkspace) -> Vec<FeatureLine> {
    let (w, h) = ws.dimensions();
    let mut lines = Vec::new();
    for row in 0..h {
        for col in 0..w {
            let seed = PixelCoord::new(row, col);
            if ws.feature_mask.at(seed) != 1 || ws.marked.at(seed) != 0 {
                continue;
            }
            let patch = ws.patch_ids.at(seed);
            ws.marked.put(seed, 1);
            ws.queue.clear();
            ws.queue.push_back(seed);
            let mut pixels = Vec::new();
            while let Some(p) = ws.queue.pop_front() {
                pixels.push(p);
                for n in ws.patch_ids.neighbors8(p) {
                    if ws.feature_mask.at(n) == 1
                        && ws.marked.at(n) == 0
                        && ws.patch_ids.at(n) == patch
                    {
                        ws.marked.put(n, 1);
                        ws.queue.push_back(n);
                    }
                }
            }
            if let Ok(id) = u32::try_from(patch) {
                lines.push(FeatureLine {
                    patch: PatchId(id),
                    pixels,
                });
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace(labels: &Grid<i32>) -> FrameWorkspace {
        let mut ws = FrameWorkspace::new();
        ws.reset(labels.w, labels.h);
        ws.patch_ids = labels.clone();
        ws
    }

    #[test]
    fn boundary_pixels_are_excluded() {
        let ids = Grid::from_vec(3, 1, vec![0, 0, -1]).expect("sized");
        let sharp = Grid::from_vec(3, 1, vec![1, 1, 1]).expect("sized");
        let mut ws = workspace(&Grid::new_fill(3, 1, 0));
        ws.boundary_mask.set(0, 1, 1);
        classify_feature_pixels(&mut ws, &ids, &sharp);
        assert_eq!(ws.feature_mask.data, vec![1, 0, 0]);
    }

    #[test]
    fn runs_are_split_by_patch_and_joined_diagonally() {
        // (1, 1) and (1, 2) touch but belong to different patches.
        let labels = Grid::from_vec(
            4,
            3,
            vec![
                0, 0, 1, 1, //
                0, 0, 1, 1, //
                0, 0, 1, 1,
            ],
        )
        .expect("sized");
        let mut ws = workspace(&labels);
        for (r, c) in [(0, 0), (1, 1), (0, 3), (1, 2), (2, 1)] {
            ws.feature_mask.set(r, c, 1);
        }
        let lines = group_feature_lines(&mut ws);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].patch, PatchId(0));
        assert_eq!(
            lines[0].pixels,
            vec![
                PixelCoord::new(0, 0),
                PixelCoord::new(1, 1),
                PixelCoord::new(2, 1)
            ]
        );
        assert_eq!(lines[1].patch, PatchId(1));
        assert_eq!(
            lines[1].pixels,
            vec![PixelCoord::new(0, 3), PixelCoord::new(1, 2)]
        );
        assert!(ws.marked.data.iter().filter(|&&m| m == 1).count() == 5);
    }
}
