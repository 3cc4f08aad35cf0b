//! Face adjacency on a [`TriMesh`]: edge map, connected components and the
//! vertex-sharing surface-connectivity table.
use super::TriMesh;
use std::collections::{HashMap, VecDeque};

/// Undirected edge key with the smaller vertex first.
pub type EdgeKey = (u32, u32);

#[inline]
fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Faces incident to each edge, in face order.
#[derive(Clone, Debug, Default)]
pub struct EdgeMap {
    faces_of_edge: HashMap<EdgeKey, Vec<u32>>,
}

impl EdgeMap {
    pub fn build(mesh: &TriMesh) -> Self {
        let mut faces_of_edge: HashMap<EdgeKey, Vec<u32>> =
            HashMap::with_capacity(mesh.n_faces() * 3 / 2);
        for (f, tri) in mesh.faces().iter().enumerate() {
            for k in 0..3 {
                faces_of_edge
                    .entry(edge_key(tri[k], tri[(k + 1) % 3]))
                    .or_default()
                    .push(f as u32);
            }
        }
        Self { faces_of_edge }
    }

    /// Faces sharing the edge `a-b` (including the caller's own face).
    pub fn faces(&self, a: u32, b: u32) -> &[u32] {
        self.faces_of_edge
            .get(&edge_key(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges of `face` in winding order.
    pub fn face_edges(tri: &[u32; 3]) -> [EdgeKey; 3] {
        [
            edge_key(tri[0], tri[1]),
            edge_key(tri[1], tri[2]),
            edge_key(tri[2], tri[0]),
        ]
    }
}

/// Per-face component labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentLabels {
    /// 1-based component id per face.
    pub labels: Vec<u32>,
    pub count: usize,
}

/// Partition faces into connected components over shared edges.
///
/// Components are numbered from 1 in order of their lowest face index.
pub fn label_components(mesh: &TriMesh, edges: &EdgeMap) -> ComponentLabels {
    let n = mesh.n_faces();
    let mut labels = vec![0u32; n];
    let mut count = 0u32;
    let mut queue: VecDeque<usize> = VecDeque::new();

    for seed in 0..n {
        if labels[seed] != 0 {
            continue;
        }
        count += 1;
        labels[seed] = count;
        queue.push_back(seed);
        while let Some(f) = queue.pop_front() {
            let tri = mesh.faces()[f];
            for (a, b) in EdgeMap::face_edges(&tri) {
                for &g in edges.faces(a, b) {
                    let g = g as usize;
                    if labels[g] == 0 {
                        labels[g] = count;
                        queue.push_back(g);
                    }
                }
            }
        }
    }

    ComponentLabels {
        labels,
        count: count as usize,
    }
}

/// Compressed table of the faces sharing at least one vertex with each face.
///
/// Every row is sorted and contains the face itself.
#[derive(Clone, Debug, Default)]
pub struct SurfaceConnectivity {
    offsets: Vec<u32>,
    adjacent: Vec<u32>,
}

impl SurfaceConnectivity {
    pub fn build(mesh: &TriMesh) -> Self {
        let mut faces_of_vertex: Vec<Vec<u32>> = vec![Vec::new(); mesh.n_vertices()];
        for (f, tri) in mesh.faces().iter().enumerate() {
            for &v in tri {
                faces_of_vertex[v as usize].push(f as u32);
            }
        }

        let mut offsets = Vec::with_capacity(mesh.n_faces() + 1);
        let mut adjacent = Vec::new();
        let mut row: Vec<u32> = Vec::new();
        offsets.push(0);
        for tri in mesh.faces() {
            row.clear();
            for &v in tri {
                row.extend_from_slice(&faces_of_vertex[v as usize]);
            }
            row.sort_unstable();
            row.dedup();
            adjacent.extend_from_slice(&row);
            offsets.push(adjacent.len() as u32);
        }
        Self { offsets, adjacent }
    }

    pub fn n_faces(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Sorted faces sharing a vertex with `face`; empty for unknown faces.
    pub fn neighbours(&self, face: usize) -> &[u32] {
        if face >= self.n_faces() {
            return &[];
        }
        let lo = self.offsets[face] as usize;
        let hi = self.offsets[face + 1] as usize;
        &self.adjacent[lo..hi]
    }

    /// True when the two rasterized triangle ids are connected on the surface.
    pub fn connected(&self, face: i32, other: i32) -> bool {
        match (usize::try_from(face), u32::try_from(other)) {
            (Ok(f), Ok(g)) => self.neighbours(f).binary_search(&g).is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    /// Two triangles forming a quad, plus one detached triangle.
    fn quad_and_island() -> TriMesh {
        let p = |x: f32, y: f32| Point3::new(x, y, 0.0);
        TriMesh::new(
            vec![
                p(0.0, 0.0),
                p(1.0, 0.0),
                p(1.0, 1.0),
                p(0.0, 1.0),
                p(5.0, 5.0),
                p(6.0, 5.0),
                p(5.0, 6.0),
            ],
            vec![[0, 1, 2], [0, 2, 3], [4, 5, 6]],
        )
        .expect("valid mesh")
    }

    #[test]
    fn components_follow_shared_edges() {
        let mesh = quad_and_island();
        let edges = EdgeMap::build(&mesh);
        let comps = label_components(&mesh, &edges);
        assert_eq!(comps.count, 2);
        assert_eq!(comps.labels, vec![1, 1, 2]);
    }

    #[test]
    fn vertex_only_contact_is_not_a_component_edge() {
        let p = |x: f32, y: f32| Point3::new(x, y, 0.0);
        // Bow-tie: two triangles touching at vertex 0.
        let mesh = TriMesh::new(
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(-1.0, 0.0), p(-1.0, -1.0)],
            vec![[0, 1, 2], [0, 3, 4]],
        )
        .expect("valid mesh");
        let edges = EdgeMap::build(&mesh);
        assert_eq!(label_components(&mesh, &edges).count, 2);
        let conn = SurfaceConnectivity::build(&mesh);
        assert!(conn.connected(0, 1));
    }

    #[test]
    fn surface_rows_include_self_and_are_sorted() {
        let conn = SurfaceConnectivity::build(&quad_and_island());
        assert_eq!(conn.neighbours(0), &[0, 1]);
        assert_eq!(conn.neighbours(2), &[2]);
        assert!(!conn.connected(0, 2));
        assert!(!conn.connected(-1, 0));
        assert!(conn.neighbours(9).is_empty());
    }
}
