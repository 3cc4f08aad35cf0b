//! Triangle mesh and the per-model data precomputed once per load.
//!
//! Overview
//! - [`TriMesh`] stores positions and index triples; it is validated on
//!   construction and can be normalized into the cube `[-1, 1]^3`.
//! - [`topology`] labels connected components (faces sharing an edge) and
//!   builds the surface-connectivity table (faces sharing a vertex).
//! - [`sharp_edges`] extracts 3D edges whose dihedral angle exceeds a
//!   threshold; they are rasterized per frame as feature-line candidates.
//! - [`congruency`] pairs components that have the same shape in a
//!   different pose (PCA box alignment + nearest-vertex RMSD).
//! - [`ModelData`] bundles all of the above; it survives renders of the
//!   same model at different camera poses and is rebuilt on reload.

pub mod congruency;
pub mod obj;
pub mod sharp_edges;
pub mod topology;

pub use congruency::{detect_congruencies, OrientedBox};
pub use sharp_edges::{extract_sharp_edges, LineSegment3};
pub use topology::{label_components, ComponentLabels, EdgeMap, SurfaceConnectivity};

use crate::abstraction::AbstractionParams;
use crate::error::{AbstractionError, Result};
use crate::types::ComponentId;
use log::debug;
use nalgebra::{Point3, Vector3};
use std::time::Instant;

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default)]
pub struct TriMesh {
    positions: Vec<Point3<f32>>,
    faces: Vec<[u32; 3]>,
}

impl TriMesh {
    /// Build a mesh, rejecting faces that reference missing vertices.
    pub fn new(positions: Vec<Point3<f32>>, faces: Vec<[u32; 3]>) -> Result<Self> {
        for (face, tri) in faces.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&v| v as usize >= positions.len()) {
                return Err(AbstractionError::InvalidMesh {
                    face,
                    vertex: bad as usize,
                });
            }
        }
        Ok(Self { positions, faces })
    }

    pub fn positions(&self) -> &[Point3<f32>] {
        &self.positions
    }

    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn n_vertices(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    #[inline]
    pub fn vertex(&self, v: u32) -> Point3<f32> {
        self.positions[v as usize]
    }

    pub fn triangle(&self, face: usize) -> [Point3<f32>; 3] {
        let [a, b, c] = self.faces[face];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Unit face normal; zero for degenerate triangles.
    pub fn face_normal(&self, face: usize) -> Vector3<f32> {
        let [a, b, c] = self.triangle(face);
        (b - a)
            .cross(&(c - a))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Uniformly scale and centre the mesh into `[-1, 1]^3` along its largest extent.
    pub fn normalize(&mut self) {
        if self.positions.is_empty() {
            return;
        }
        let mut lo = Vector3::repeat(f32::INFINITY);
        let mut hi = Vector3::repeat(f32::NEG_INFINITY);
        for p in &self.positions {
            lo = lo.inf(&p.coords);
            hi = hi.sup(&p.coords);
        }
        let extent = (hi - lo).max();
        if !(extent.is_finite() && extent > 0.0) {
            return;
        }
        let scale = 2.0 / extent;
        let centre = (hi + lo) * 0.5;
        for p in &mut self.positions {
            p.coords = (p.coords - centre) * scale;
        }
    }

    /// Append another mesh, offsetting its indices.
    pub fn append(&mut self, other: &TriMesh) {
        let base = self.positions.len() as u32;
        self.positions.extend_from_slice(&other.positions);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + base, f[1] + base, f[2] + base]));
    }
}

/// Precomputed per-model data consumed by every render.
#[derive(Clone, Debug)]
pub struct ModelData {
    pub mesh: TriMesh,
    /// 1-based component label per face (0 = unlabeled).
    pub face_components: Vec<u32>,
    pub component_count: usize,
    pub congruent_pairs: Vec<(ComponentId, ComponentId)>,
    pub surface: SurfaceConnectivity,
    pub sharp_edges: Vec<LineSegment3>,
}

impl ModelData {
    /// Run the per-model precomputation (components, congruencies, sharp edges, connectivity).
    pub fn build(mesh: TriMesh, params: &AbstractionParams) -> Self {
        let start = Instant::now();
        let edges = EdgeMap::build(&mesh);
        let ComponentLabels { labels, count } = label_components(&mesh, &edges);
        let congruent_pairs =
            detect_congruencies(&mesh, &labels, count, params.congruent_threshold);
        let sharp_edges = extract_sharp_edges(&mesh, &edges, params.sharp_edge_angle_deg);
        let surface = SurfaceConnectivity::build(&mesh);
        debug!(
            "ModelData::build faces={} components={} congruent_pairs={} sharp_edges={} elapsed_ms={:.3}",
            mesh.n_faces(),
            count,
            congruent_pairs.len(),
            sharp_edges.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        Self {
            mesh,
            face_components: labels,
            component_count: count,
            congruent_pairs,
            surface,
            sharp_edges,
        }
    }

    /// Component of a rasterized face, `None` for out-of-range or unlabeled faces.
    pub fn component_of(&self, face: i32) -> Option<ComponentId> {
        usize::try_from(face)
            .ok()
            .and_then(|f| self.face_components.get(f))
            .and_then(|&label| ComponentId::from_face_label(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_dangling_vertex_index() {
        let err = TriMesh::new(vec![Point3::origin(); 2], vec![[0, 1, 2]]).unwrap_err();
        assert!(matches!(
            err,
            AbstractionError::InvalidMesh { face: 0, vertex: 2 }
        ));
    }

    #[test]
    fn normalize_fits_largest_extent() {
        let mut mesh = TriMesh::new(
            vec![
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 1.0),
            ],
            vec![[0, 1, 2]],
        )
        .expect("valid mesh");
        mesh.normalize();
        assert_relative_eq!(mesh.vertex(0).x, -1.0);
        assert_relative_eq!(mesh.vertex(1).x, 1.0);
        assert_relative_eq!(mesh.vertex(2).y, 0.5);
    }

    #[test]
    fn face_normal_is_unit() {
        let mesh = TriMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(0.0, 3.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .expect("valid mesh");
        assert_relative_eq!(mesh.face_normal(0), Vector3::z());
    }
}
