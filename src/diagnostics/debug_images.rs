//! Colour-coded views of the intermediate per-frame state.
//!
//! Every image starts from the background colour; entities are painted with
//! [`distinct_color`] keyed by their id.
use crate::abstraction::ResultImages;
use crate::error::Result;
use crate::image::io::save_rgb_u8;
use crate::image::Grid;
use crate::types::{Boundary, FeatureLine, InclusionPair, Patch, SimilaritySet};
use std::path::Path;

pub type RgbGrid = Grid<[u8; 3]>;

const BLACK: [u8; 3] = [0, 0, 0];

/// Palette colour for `id`: 36 hues 10 degrees apart, 6 brightness steps.
pub fn distinct_color(id: usize) -> [u8; 3] {
    let hue = (id % 36 * 10) as f32;
    let value = ((id % 6 * 20 + 155) as f32) / 255.0;
    let saturation = 1.0f32;
    let sector = hue / 60.0;
    let hi = (sector as usize) % 6;
    let f = sector - sector.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - f * saturation);
    let t = value * (1.0 - (1.0 - f) * saturation);
    let (r, g, b) = match hi {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}

/// Rec. 709 luma of an RGB colour.
pub fn rgb_to_gray([r, g, b]: [u8; 3]) -> u8 {
    (0.2126 * f32::from(r) + 0.7152 * f32::from(g) + 0.0722 * f32::from(b)) as u8
}

/// Frame state the debug images are drawn from.
pub struct DebugSources<'a> {
    pub width: usize,
    pub height: usize,
    pub background: [u8; 3],
    pub patches: &'a [Patch],
    pub boundaries: &'a [Boundary],
    pub feature_lines: &'a [FeatureLine],
    pub similarity_sets: &'a [SimilaritySet],
    pub inclusion_pairs: &'a [InclusionPair],
    pub depth_critical: &'a Grid<u8>,
    pub sharp_edges: &'a Grid<u8>,
    pub distance: &'a Grid<f32>,
    /// 1-based mesh component per pixel, 0 for background.
    pub components: &'a Grid<u32>,
}

#[derive(Clone, Debug, Default)]
pub struct DebugImages {
    pub patch: Option<RgbGrid>,
    pub depth_critical: Option<RgbGrid>,
    pub sharp_edge: Option<RgbGrid>,
    pub boundary: Option<RgbGrid>,
    pub feature_line: Option<RgbGrid>,
    pub distance_transform: Option<RgbGrid>,
    pub consistency: Option<RgbGrid>,
    pub component: Option<RgbGrid>,
    pub inclusion: Option<RgbGrid>,
}

impl DebugImages {
    /// Draw the images selected in `which`.
    pub fn render(which: &ResultImages, src: &DebugSources<'_>) -> Self {
        let blank = || Grid::new_fill(src.width, src.height, src.background);
        let mask_image = |mask: &Grid<u8>| {
            let mut img = blank();
            for (px, &m) in img.data.iter_mut().zip(&mask.data) {
                if m == 1 {
                    *px = BLACK;
                }
            }
            img
        };

        let patch = which.patch.then(|| {
            let mut img = blank();
            for p in src.patches {
                let color = distinct_color(p.id.index());
                for &px in &p.pixels {
                    img.put(px, color);
                }
            }
            img
        });

        let boundary = which.boundary.then(|| {
            let mut img = blank();
            for b in src.boundaries {
                let color = distinct_color(b.winning_patch().index());
                for &px in b.winning_pixels() {
                    img.put(px, color);
                }
            }
            img
        });

        let feature_line = which.feature_line.then(|| {
            let mut img = blank();
            for (fid, line) in src.feature_lines.iter().enumerate() {
                let color = distinct_color(fid);
                for &px in &line.pixels {
                    img.put(px, color);
                }
            }
            img
        });

        let distance_transform = which.distance_transform.then(|| {
            let data = src
                .distance
                .data
                .iter()
                .map(|&d| {
                    let g = ((d * 0.01).min(1.0) * 255.0) as u8;
                    [g, g, g]
                })
                .collect();
            Grid {
                w: src.distance.w,
                h: src.distance.h,
                data,
            }
        });

        let consistency = which.consistency.then(|| {
            let mut img = blank();
            for (sid, set) in src.similarity_sets.iter().enumerate() {
                let color = distinct_color(sid);
                for pid in &set.patches {
                    for &px in &src.patches[pid.index()].pixels {
                        img.put(px, color);
                    }
                }
            }
            img
        });

        let component = which.component.then(|| {
            let mut img = blank();
            for (px, &label) in img.data.iter_mut().zip(&src.components.data) {
                if label != 0 {
                    *px = distinct_color(label as usize);
                }
            }
            img
        });

        let inclusion = which.inclusion.then(|| {
            let mut img = blank();
            for p in src.patches {
                let g = rgb_to_gray(distinct_color(p.id.index()));
                for &px in &p.pixels {
                    img.put(px, [g, g, g]);
                }
            }
            for pair in src.inclusion_pairs {
                let color = distinct_color(pair.inner.index());
                for &px in &src.patches[pair.inner.index()].pixels {
                    img.put(px, color);
                }
            }
            img
        });

        Self {
            patch,
            depth_critical: which.depth_critical.then(|| mask_image(src.depth_critical)),
            sharp_edge: which.sharp_edge.then(|| mask_image(src.sharp_edges)),
            boundary,
            feature_line,
            distance_transform,
            consistency,
            component,
            inclusion,
        }
    }

    /// Produced images with their file stems.
    pub fn named(&self) -> Vec<(&'static str, &RgbGrid)> {
        [
            ("patch", &self.patch),
            ("depth_critical", &self.depth_critical),
            ("sharp_edge", &self.sharp_edge),
            ("boundary", &self.boundary),
            ("feature_line", &self.feature_line),
            ("distance_transform", &self.distance_transform),
            ("consistency", &self.consistency),
            ("component", &self.component),
            ("inclusion", &self.inclusion),
        ]
        .into_iter()
        .filter_map(|(name, img)| img.as_ref().map(|img| (name, img)))
        .collect()
    }

    /// Write every produced image as `<dir>/<name>.png`.
    pub fn save_all(&self, dir: &Path) -> Result<usize> {
        let named = self.named();
        for (name, img) in &named {
            save_rgb_u8(img, &dir.join(format!("{name}.png")))?;
        }
        Ok(named.len())
    }
}
