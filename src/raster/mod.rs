//! Rasterization seam between the mesh and the image-space core.
//!
//! The core only ever sees the dense buffers in [`SurfaceBuffers`] and the
//! line-presence masks returned by [`Rasterizer::render_lines`]; anything
//! able to fill them (a GPU pass, an offline renderer, the bundled
//! [`SoftwareRasterizer`]) can drive the pipeline.

mod software;

pub use software::SoftwareRasterizer;

use crate::error::{AbstractionError, Result};
use crate::image::Grid;
use crate::mesh::{LineSegment3, TriMesh};
use nalgebra::Matrix4;
use std::fs;
use std::path::Path;

/// Triangle id stored for uncovered pixels.
pub const BACKGROUND_TRIANGLE: i32 = -1;
/// Cleared depth value (far plane).
pub const FAR_DEPTH: f32 = 1.0;

/// Per-pixel output of the opaque surface pass.
#[derive(Clone, Debug, Default)]
pub struct SurfaceBuffers {
    /// Nearest triangle per pixel, [`BACKGROUND_TRIANGLE`] where uncovered.
    pub triangle_ids: Grid<i32>,
    /// Window-space depth in `[0, 1]`, [`FAR_DEPTH`] where uncovered.
    pub depth: Grid<f32>,
}

impl SurfaceBuffers {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            triangle_ids: Grid::new_fill(width, height, BACKGROUND_TRIANGLE),
            depth: Grid::new_fill(width, height, FAR_DEPTH),
        }
    }
}

/// Produces the buffers consumed by the abstraction core.
pub trait Rasterizer {
    /// Rasterize `mesh` under `mvp` into a `width x height` id/depth pair.
    fn render_surface(
        &self,
        mesh: &TriMesh,
        mvp: &Matrix4<f32>,
        width: usize,
        height: usize,
    ) -> SurfaceBuffers;

    /// Draw `lines` depth-tested against `depth`; 1 marks a visible line pixel.
    fn render_lines(&self, lines: &[LineSegment3], mvp: &Matrix4<f32>, depth: &Grid<f32>)
        -> Grid<u8>;
}

/// Read a model-view-projection matrix: 16 whitespace-separated floats, column-major.
pub fn load_camera_matrix(path: &Path) -> Result<Matrix4<f32>> {
    let text = fs::read_to_string(path)?;
    parse_camera_matrix(&text, path)
}

pub fn parse_camera_matrix(text: &str, origin: &Path) -> Result<Matrix4<f32>> {
    let mut values = Vec::with_capacity(16);
    for (idx, line) in text.lines().enumerate() {
        for tok in line.split_whitespace() {
            let v: f32 = tok.parse().map_err(|e| AbstractionError::Parse {
                path: origin.to_path_buf(),
                line: idx + 1,
                message: format!("bad matrix entry '{tok}': {e}"),
            })?;
            values.push(v);
        }
    }
    if values.len() < 16 {
        return Err(AbstractionError::Parse {
            path: origin.to_path_buf(),
            line: text.lines().count(),
            message: format!("expected 16 matrix entries, found {}", values.len()),
        });
    }
    Ok(Matrix4::from_column_slice(&values[..16]))
}
