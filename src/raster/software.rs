//! CPU rasterizer: edge-function triangle fill and DDA line drawing.
use super::{Rasterizer, SurfaceBuffers};
use crate::image::Grid;
use crate::mesh::{LineSegment3, TriMesh};
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Pulls line fragments towards the camera so that a line lying on a
/// surface passes the depth test against that surface.
const LINE_DEPTH_BIAS: f32 = 1e-3;

#[derive(Clone, Copy, Debug)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

/// Reference rasterizer used by the tools and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareRasterizer;

impl SoftwareRasterizer {
    pub fn new() -> Self {
        Self
    }
}

/// Clip -> NDC -> window coordinates; `None` behind the camera.
fn project(mvp: &Matrix4<f32>, p: &Point3<f32>, width: usize, height: usize) -> Option<ScreenVertex> {
    let clip: Vector4<f32> = mvp * p.to_homogeneous();
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = Vector3::new(clip.x, clip.y, clip.z) / clip.w;
    Some(ScreenVertex {
        x: (ndc.x * 0.5 + 0.5) * width as f32,
        y: (0.5 - ndc.y * 0.5) * height as f32,
        z: ndc.z * 0.5 + 0.5,
    })
}

#[inline]
fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

fn fill_triangle(out: &mut SurfaceBuffers, face: i32, v: [ScreenVertex; 3]) {
    let area = edge(&v[0], &v[1], v[2].x, v[2].y);
    if area.abs() <= f32::EPSILON {
        return;
    }
    let (w, h) = (out.depth.w, out.depth.h);
    let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
    let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0) as usize;
    let max_x = v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil();
    let max_y = v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil();
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }
    let max_x = (max_x as usize).min(w);
    let max_y = (max_y as usize).min(h);

    for row in min_y..max_y {
        let py = row as f32 + 0.5;
        for col in min_x..max_x {
            let px = col as f32 + 0.5;
            let b0 = edge(&v[1], &v[2], px, py) / area;
            let b1 = edge(&v[2], &v[0], px, py) / area;
            let b2 = edge(&v[0], &v[1], px, py) / area;
            if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                continue;
            }
            let z = b0 * v[0].z + b1 * v[1].z + b2 * v[2].z;
            if !(0.0..=1.0).contains(&z) {
                continue;
            }
            let i = out.depth.idx(row, col);
            if z < out.depth.data[i] {
                out.depth.data[i] = z;
                out.triangle_ids.data[i] = face;
            }
        }
    }
}

/// Liang-Barsky clip of `a -> b` against `[0, w] x [0, h]`; `None` when fully outside.
fn clip_to_viewport(
    a: ScreenVertex,
    b: ScreenVertex,
    w: f32,
    h: f32,
) -> Option<(ScreenVertex, ScreenVertex)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [(-dx, a.x), (dx, w - a.x), (-dy, a.y), (dy, h - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f32| ScreenVertex {
        x: a.x + dx * t,
        y: a.y + dy * t,
        z: a.z + (b.z - a.z) * t,
    };
    Some((at(t0), at(t1)))
}

fn draw_line(mask: &mut Grid<u8>, depth: &Grid<f32>, a: ScreenVertex, b: ScreenVertex) {
    let Some((a, b)) = clip_to_viewport(a, b, mask.w as f32, mask.h as f32) else {
        return;
    };
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = a.x + dx * t;
        let y = a.y + dy * t;
        if x < 0.0 || y < 0.0 {
            continue;
        }
        let (col, row) = (x as usize, y as usize);
        if col >= mask.w || row >= mask.h {
            continue;
        }
        let z = a.z + (b.z - a.z) * t - LINE_DEPTH_BIAS;
        if z <= depth.get(row, col) {
            mask.set(row, col, 1);
        }
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn render_surface(
        &self,
        mesh: &TriMesh,
        mvp: &Matrix4<f32>,
        width: usize,
        height: usize,
    ) -> SurfaceBuffers {
        let mut out = SurfaceBuffers::new(width, height);
        let projected: Vec<Option<ScreenVertex>> = mesh
            .positions()
            .iter()
            .map(|p| project(mvp, p, width, height))
            .collect();
        for (f, tri) in mesh.faces().iter().enumerate() {
            let corners = [
                projected[tri[0] as usize],
                projected[tri[1] as usize],
                projected[tri[2] as usize],
            ];
            if let [Some(a), Some(b), Some(c)] = corners {
                fill_triangle(&mut out, f as i32, [a, b, c]);
            }
        }
        out
    }

    fn render_lines(
        &self,
        lines: &[LineSegment3],
        mvp: &Matrix4<f32>,
        depth: &Grid<f32>,
    ) -> Grid<u8> {
        let mut mask = Grid::new_fill(depth.w, depth.h, 0u8);
        for seg in lines {
            let a = project(mvp, &seg.a, depth.w, depth.h);
            let b = project(mvp, &seg.b, depth.w, depth.h);
            if let (Some(a), Some(b)) = (a, b) {
                draw_line(&mut mask, depth, a, b);
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BACKGROUND_TRIANGLE, FAR_DEPTH};
    use approx::assert_abs_diff_eq;

    fn quad(z: f32, half: f32) -> TriMesh {
        TriMesh::new(
            vec![
                Point3::new(-half, -half, z),
                Point3::new(half, -half, z),
                Point3::new(half, half, z),
                Point3::new(-half, half, z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .expect("valid quad")
    }

    #[test]
    fn quad_covers_centre_and_leaves_corners_empty() {
        let raster = SoftwareRasterizer::new();
        let bufs = raster.render_surface(&quad(0.0, 0.5), &Matrix4::identity(), 40, 40);
        assert!(bufs.triangle_ids.get(20, 20) >= 0);
        assert_eq!(bufs.triangle_ids.get(0, 0), BACKGROUND_TRIANGLE);
        assert_eq!(bufs.depth.get(0, 0), FAR_DEPTH);
        let covered = bufs.triangle_ids.data.iter().filter(|&&t| t >= 0).count();
        assert_eq!(covered, 20 * 20);
    }

    #[test]
    fn nearer_surface_wins() {
        let mut mesh = quad(0.5, 0.5);
        mesh.append(&quad(-0.5, 0.25));
        let bufs = SoftwareRasterizer::new().render_surface(&mesh, &Matrix4::identity(), 40, 40);
        // Smaller quad is closer (ndc z = -0.5 -> depth 0.25).
        assert!(bufs.triangle_ids.get(20, 20) >= 2);
        assert!(bufs.triangle_ids.get(12, 12) <= 1);
    }

    #[test]
    fn occluded_lines_are_hidden() {
        let raster = SoftwareRasterizer::new();
        let front = quad(-0.5, 0.5);
        let bufs = raster.render_surface(&front, &Matrix4::identity(), 40, 40);
        let behind = LineSegment3 {
            a: Point3::new(-0.9, 0.0, 0.8),
            b: Point3::new(0.9, 0.0, 0.8),
        };
        let on_top = LineSegment3 {
            a: Point3::new(-0.9, 0.0, -0.5),
            b: Point3::new(0.9, 0.0, -0.5),
        };
        let hidden = raster.render_lines(&[behind], &Matrix4::identity(), &bufs.depth);
        assert_eq!(hidden.get(20, 20), 0);
        assert_eq!(hidden.get(20, 5), 1);
        let visible = raster.render_lines(&[on_top], &Matrix4::identity(), &bufs.depth);
        assert_eq!(visible.get(20, 20), 1);
    }

    fn sv(x: f32, y: f32) -> ScreenVertex {
        ScreenVertex { x, y, z: 0.5 }
    }

    #[test]
    fn far_off_screen_endpoints_are_clipped_to_the_viewport() {
        let (a, b) = clip_to_viewport(sv(-1000.0, 10.0), sv(1000.0, 10.0), 40.0, 30.0)
            .expect("crosses the viewport");
        assert_abs_diff_eq!(a.x, 0.0, epsilon = 1e-3);
        assert_abs_diff_eq!(b.x, 40.0, epsilon = 1e-3);
        assert_abs_diff_eq!(a.y, 10.0, epsilon = 1e-6);
        assert!(clip_to_viewport(sv(-5.0, -5.0), sv(-1.0, 50.0), 40.0, 30.0).is_none());
        assert!(clip_to_viewport(sv(10.0, -3.0), sv(20.0, -1.0), 40.0, 30.0).is_none());

        let depth = Grid::new_fill(40, 30, 1.0f32);
        let mut mask = Grid::new_fill(40, 30, 0u8);
        draw_line(&mut mask, &depth, sv(-1.0e6, 10.5), sv(1.0e6, 10.5));
        let marked: Vec<usize> = (0..mask.data.len()).filter(|&i| mask.data[i] == 1).collect();
        assert!(!marked.is_empty());
        assert!(marked.iter().all(|&i| i / 40 == 10));
    }
}
