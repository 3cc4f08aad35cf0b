//! Sharp (crease) edge extraction.
use super::topology::EdgeMap;
use super::TriMesh;
use nalgebra::Point3;
use serde::Serialize;

/// 3D line segment in model space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineSegment3 {
    pub a: Point3<f32>,
    pub b: Point3<f32>,
}

/// Edges shared by exactly two faces whose normals differ by at least `angle_deg`.
///
/// Boundary edges (one face) and non-manifold edges (three or more faces)
/// never qualify. Output follows face order, each edge emitted once.
pub fn extract_sharp_edges(mesh: &TriMesh, edges: &EdgeMap, angle_deg: f32) -> Vec<LineSegment3> {
    let cos_limit = angle_deg.to_radians().cos();
    let normals: Vec<_> = (0..mesh.n_faces()).map(|f| mesh.face_normal(f)).collect();
    let mut out = Vec::new();
    for (f, tri) in mesh.faces().iter().enumerate() {
        for (a, b) in EdgeMap::face_edges(tri) {
            let faces = edges.faces(a, b);
            if faces.len() != 2 || faces[0] as usize != f {
                continue;
            }
            let other = faces[1] as usize;
            if normals[f].dot(&normals[other]) <= cos_limit {
                out.push(LineSegment3 {
                    a: mesh.vertex(a),
                    b: mesh.vertex(b),
                });
            }
        }
    }
    out
}
