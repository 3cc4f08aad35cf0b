//! Small synthetic meshes and cameras for end-to-end tests.
use bw_abstraction::TriMesh;
use nalgebra::{Matrix4, Point3};

/// Axis-aligned box `[x0, x1] x [y0, y1] x [z0, z1]` as 12 triangles.
pub fn box_mesh(min: [f32; 3], max: [f32; 3]) -> TriMesh {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    let positions = vec![
        Point3::new(x0, y0, z0),
        Point3::new(x1, y0, z0),
        Point3::new(x1, y1, z0),
        Point3::new(x0, y1, z0),
        Point3::new(x0, y0, z1),
        Point3::new(x1, y0, z1),
        Point3::new(x1, y1, z1),
        Point3::new(x0, y1, z1),
    ];
    let faces = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [1, 2, 6],
        [1, 6, 5],
        [2, 3, 7],
        [2, 7, 6],
        [3, 0, 4],
        [3, 4, 7],
    ];
    TriMesh::new(positions, faces).expect("valid box")
}

/// Square in the `z = 0` plane spanning `[-half, half]^2`, two triangles.
pub fn square_mesh(half: f32) -> TriMesh {
    TriMesh::new(
        vec![
            Point3::new(-half, -half, 0.0),
            Point3::new(half, -half, 0.0),
            Point3::new(half, half, 0.0),
            Point3::new(-half, half, 0.0),
        ],
        vec![[0, 1, 2], [0, 2, 3]],
    )
    .expect("valid square")
}

/// Two identical boxes side by side along x.
pub fn two_boxes() -> TriMesh {
    let mut mesh = box_mesh([-2.0, -0.3, -0.15], [-1.0, 0.3, 0.15]);
    mesh.append(&box_mesh([1.0, -0.3, -0.15], [2.0, 0.3, 0.15]));
    mesh
}

/// A box standing on a larger plane, seen from above.
pub fn box_on_plane() -> TriMesh {
    let mut mesh = square_mesh(1.0);
    mesh.append(&box_mesh([-0.3, -0.3, 0.0], [0.3, 0.3, 0.4]));
    mesh
}

/// Orthographic view down the -z axis: `x, y` scaled by `scale`, nearer
/// (larger z) surfaces get smaller depth.
pub fn top_down_camera(scale: f32) -> Matrix4<f32> {
    Matrix4::new(
        scale, 0.0, 0.0, 0.0, //
        0.0, scale, 0.0, 0.0, //
        0.0, 0.0, -0.5, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}
