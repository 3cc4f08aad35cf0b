//! Stroke compositor: turns labelled patches, boundaries and feature lines
//! into the final black-and-white image.
//!
//! Each patch is filled with its label colour. A pixel is drawn inverted
//! when a line pixel of its own patch lies within the stroke radius
//! (boundary lines) or half of it (feature lines), so strokes never bleed
//! into the neighbouring patch.
use crate::image::Grid;
use crate::types::{Boundary, BoundaryStyle, FeatureLine, FillLabel, Patch, PixelCoord};
use log::debug;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

const NO_LINE: i32 = -1;

/// Stroke radius in pixels for a viewing scale.
///
/// The scale maps to a virtual image width `200 + 1400 * scale`; the stroke
/// width shrinks linearly from 20 px at width 200 to 4.5 px at width 1600.
pub fn stroke_radius(scale: f32) -> i64 {
    let width = 200.0 + 1400.0 * scale;
    let pixel_width = 20.0 - 15.5 * ((width - 200.0) / 1400.0);
    pixel_width.round().max(0.0) as i64
}

/// Inputs of one composition.
pub struct StrokeInputs<'a> {
    pub width: usize,
    pub height: usize,
    pub patches: &'a [Patch],
    pub boundaries: &'a [Boundary],
    pub feature_lines: &'a [FeatureLine],
    pub scale: f32,
    /// Minimum feature-line length in percent of the stroke radius.
    pub feature_weight: f32,
    pub background: u8,
}

/// Whether a feature line is long enough and sits in a thick enough patch.
pub fn keeps_feature_line(line: &FeatureLine, patches: &[Patch], radius: i64, weight: f32) -> bool {
    let min_len = radius as f32 * weight / 100.0;
    let thickness = patches[line.patch.index()].max_distance_transform;
    line.pixels.len() as f32 >= min_len && thickness >= radius as f32
}

fn any_within(map: &Grid<i32>, centre: PixelCoord, radius: i64, id: i32) -> bool {
    let r2 = radius * radius;
    let (row, col) = (centre.row as i64, centre.col as i64);
    for dr in -radius..=radius {
        let y = row + dr;
        if y < 0 || y >= map.h as i64 {
            continue;
        }
        for dc in -radius..=radius {
            let x = col + dc;
            if x < 0 || x >= map.w as i64 || dr * dr + dc * dc > r2 {
                continue;
            }
            if map.get(y as usize, x as usize) == id {
                return true;
            }
        }
    }
    false
}

struct LineMaps {
    boundary: Grid<i32>,
    feature: Grid<i32>,
    radius: i64,
}

fn shade_patch(patch: &Patch, maps: &LineMaps) -> Vec<(PixelCoord, u8)> {
    let fill = patch.label.unwrap_or(FillLabel::Black);
    let id = patch.id.0 as i32;
    let half = maps.radius / 2;
    patch
        .pixels
        .iter()
        .map(|&p| {
            let stroked = any_within(&maps.boundary, p, maps.radius, id)
                || any_within(&maps.feature, p, half, id);
            let label = if stroked { fill.inverted() } else { fill };
            (p, label.intensity())
        })
        .collect()
}

/// Composite the labelled frame into an 8-bit image.
pub fn compose_strokes(input: &StrokeInputs<'_>) -> Grid<u8> {
    let radius = stroke_radius(input.scale);
    let mut maps = LineMaps {
        boundary: Grid::new_fill(input.width, input.height, NO_LINE),
        feature: Grid::new_fill(input.width, input.height, NO_LINE),
        radius,
    };
    for b in input.boundaries {
        if b.label == Some(BoundaryStyle::LineHalo) {
            let id = b.winning_patch().0 as i32;
            for &p in b.winning_pixels() {
                maps.boundary.put(p, id);
            }
        }
    }
    let mut kept = 0usize;
    for line in input.feature_lines {
        if keeps_feature_line(line, input.patches, radius, input.feature_weight) {
            kept += 1;
            for &p in &line.pixels {
                maps.feature.put(p, line.patch.0 as i32);
            }
        }
    }
    debug!(
        "compose_strokes radius={} feature_lines_kept={}/{}",
        radius,
        kept,
        input.feature_lines.len()
    );

    #[cfg(feature = "parallel")]
    let shaded: Vec<Vec<(PixelCoord, u8)>> = input
        .patches
        .par_iter()
        .map(|patch| shade_patch(patch, &maps))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let shaded: Vec<Vec<(PixelCoord, u8)>> = input
        .patches
        .iter()
        .map(|patch| shade_patch(patch, &maps))
        .collect();

    let mut image = Grid::new_fill(input.width, input.height, input.background);
    for (p, v) in shaded.into_iter().flatten() {
        image.put(p, v);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundaryId, PatchId};

    #[test]
    fn radius_follows_scale() {
        assert_eq!(stroke_radius(1.0), 5);
        assert_eq!(stroke_radius(0.0), 20);
        assert_eq!(stroke_radius(0.5), 12);
    }

    fn half_patches() -> Vec<Patch> {
        // 20x10 frame: left half patch 0 (black), right half patch 1 (white).
        let mut left = Patch::new(PatchId(0), None);
        let mut right = Patch::new(PatchId(1), None);
        for row in 0..10 {
            for col in 0..20 {
                let p = PixelCoord::new(row, col);
                if col < 10 {
                    left.pixels.push(p);
                } else {
                    right.pixels.push(p);
                }
            }
        }
        left.label = Some(FillLabel::Black);
        right.label = Some(FillLabel::White);
        vec![left, right]
    }

    #[test]
    fn fills_follow_labels_without_lines() {
        let patches = half_patches();
        let image = compose_strokes(&StrokeInputs {
            width: 20,
            height: 10,
            patches: &patches,
            boundaries: &[],
            feature_lines: &[],
            scale: 1.0,
            feature_weight: 1000.0,
            background: 255,
        });
        assert_eq!(image.get(5, 2), 0);
        assert_eq!(image.get(5, 17), 255);
    }

    #[test]
    fn line_halo_inverts_the_winning_side_only() {
        let patches = half_patches();
        let mut b = Boundary::new(BoundaryId(0), PatchId(0), PatchId(1));
        b.pixels[0] = (0..10).map(|r| PixelCoord::new(r, 9)).collect();
        b.pixels[1] = (0..10).map(|r| PixelCoord::new(r, 10)).collect();
        b.votes = [10, 0];
        b.label = Some(BoundaryStyle::LineHalo);
        let image = compose_strokes(&StrokeInputs {
            width: 20,
            height: 10,
            patches: &patches,
            boundaries: &[b],
            feature_lines: &[],
            scale: 1.0,
            feature_weight: 1000.0,
            background: 255,
        });
        // Patch 0 is black and inverted within 5 px of column 9.
        assert_eq!(image.get(5, 9), 255);
        assert_eq!(image.get(5, 4), 255);
        assert_eq!(image.get(5, 3), 0);
        // Patch 1 is untouched.
        assert_eq!(image.get(5, 10), 255);
    }

    #[test]
    fn short_feature_lines_are_dropped() {
        let mut patches = half_patches();
        patches[0].max_distance_transform = 8.0;
        let line = FeatureLine {
            patch: PatchId(0),
            pixels: (0..10).map(|r| PixelCoord::new(r, 5)).collect(),
        };
        assert!(!keeps_feature_line(&line, &patches, 5, 1000.0));
        assert!(keeps_feature_line(&line, &patches, 5, 100.0));
        patches[0].max_distance_transform = 4.0;
        assert!(!keeps_feature_line(&line, &patches, 5, 100.0));
    }
}
