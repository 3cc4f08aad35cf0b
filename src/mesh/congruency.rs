//! Congruent-component detection.
//!
//! Each component gets a PCA oriented bounding box. Pairs whose box sizes
//! agree within `sqrt(12) * threshold` (the model is normalized to a cube of
//! side 2) are aligned box-to-box and tested in four orientations, the
//! identity and a half-turn about each reference axis, to absorb the sign
//! ambiguity of the principal axes. A pair is congruent when the root mean
//! squared nearest-vertex distance falls below 3% of the reference box
//! diagonal.
use super::TriMesh;
use crate::types::ComponentId;
use log::debug;
use nalgebra::{Matrix3, Point3, Rotation3, SymmetricEigen, Unit, Vector3};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashSet;

const SHAPE_TOLERANCE_RATIO: f64 = 0.03;

/// Oriented bounding box with axes ordered by decreasing variance.
#[derive(Clone, Debug, PartialEq)]
pub struct OrientedBox {
    /// Box centre.
    pub origin: Point3<f64>,
    /// `[max, mid, min]` axes; `min = max x mid`.
    pub axes: [Vector3<f64>; 3],
    /// Local-frame corner extents around `origin`.
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
}

impl OrientedBox {
    /// PCA box of a point cloud. `None` for an empty cloud.
    pub fn from_points(points: &[Point3<f64>]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let centre = points
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / n;
        let mut tensor = Matrix3::<f64>::zeros();
        for p in points {
            let d = p.coords - centre;
            tensor += d * d.transpose();
        }

        let eig = SymmetricEigen::new(tensor);
        let mut order = [0usize, 1, 2];
        order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
        let max_axis: Vector3<f64> = eig.eigenvectors.column(order[0]).into_owned();
        let mid_axis: Vector3<f64> = eig.eigenvectors.column(order[1]).into_owned();
        let min_axis = max_axis.cross(&mid_axis);
        let axes = [max_axis, mid_axis, min_axis];

        let mut lo = Vector3::repeat(f64::INFINITY);
        let mut hi = Vector3::repeat(f64::NEG_INFINITY);
        for p in points {
            let d = p.coords - centre;
            let local = Vector3::new(d.dot(&axes[0]), d.dot(&axes[1]), d.dot(&axes[2]));
            lo = lo.inf(&local);
            hi = hi.sup(&local);
        }

        let mid_local = (hi + lo) * 0.5;
        let origin = Point3::from(
            centre + axes[0] * mid_local.x + axes[1] * mid_local.y + axes[2] * mid_local.z,
        );
        Some(Self {
            origin,
            axes,
            min: lo - mid_local,
            max: hi - mid_local,
        })
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Axes as matrix columns.
    pub fn basis(&self) -> Matrix3<f64> {
        Matrix3::from_columns(&self.axes)
    }
}

/// Unique vertices of one component, in first-reference order.
fn component_points(mesh: &TriMesh, labels: &[u32], count: usize) -> Vec<Vec<Point3<f64>>> {
    let mut seen: HashSet<(usize, u32)> = HashSet::new();
    let mut clouds: Vec<Vec<Point3<f64>>> = vec![Vec::new(); count];
    for (tri, &label) in mesh.faces().iter().zip(labels) {
        let Some(comp) = ComponentId::from_face_label(label) else {
            continue;
        };
        for &v in tri {
            if seen.insert((comp.index(), v)) {
                clouds[comp.index()].push(mesh.vertex(v).cast::<f64>());
            }
        }
    }
    clouds
}

struct Candidate<'a> {
    pair: (ComponentId, ComponentId),
    reference: (&'a OrientedBox, &'a [Point3<f64>]),
    object: (&'a OrientedBox, &'a [Point3<f64>]),
}

fn rmsd_to(reference: &[Point3<f64>], trial: &[Point3<f64>]) -> f64 {
    let sum: f64 = trial
        .iter()
        .map(|v| {
            reference
                .iter()
                .map(|r| (v - r).norm_squared())
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    (sum / trial.len() as f64).sqrt()
}

fn is_congruent(task: &Candidate<'_>) -> bool {
    let (ref_box, ref_points) = task.reference;
    let (obj_box, obj_points) = task.object;
    let Some(obj_inv) = obj_box.basis().try_inverse() else {
        return false;
    };
    let rotation = ref_box.basis() * obj_inv;
    let aligned: Vec<Point3<f64>> = obj_points
        .iter()
        .map(|p| ref_box.origin + rotation * (p - obj_box.origin))
        .collect();
    let tolerance = ref_box.size().norm() * SHAPE_TOLERANCE_RATIO;

    let mut trial = aligned.clone();
    for orientation in 0..4 {
        if orientation > 0 {
            let axis = Unit::new_normalize(ref_box.axes[orientation - 1]);
            let flip = Rotation3::from_axis_angle(&axis, std::f64::consts::PI);
            for (dst, src) in trial.iter_mut().zip(&aligned) {
                *dst = ref_box.origin + flip * (src - ref_box.origin);
            }
        }
        if rmsd_to(ref_points, &trial) < tolerance {
            return true;
        }
    }
    false
}

#[cfg(feature = "parallel")]
fn evaluate(tasks: &[Candidate<'_>]) -> Vec<bool> {
    tasks.par_iter().map(is_congruent).collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate(tasks: &[Candidate<'_>]) -> Vec<bool> {
    tasks.iter().map(is_congruent).collect()
}

/// Congruent component pairs `(a, b)` with `a < b`, in task order.
pub fn detect_congruencies(
    mesh: &TriMesh,
    labels: &[u32],
    count: usize,
    threshold: f32,
) -> Vec<(ComponentId, ComponentId)> {
    let clouds = component_points(mesh, labels, count);
    let boxes: Vec<Option<OrientedBox>> = clouds
        .iter()
        .map(|c| OrientedBox::from_points(c))
        .collect();
    let size_tolerance = 12f64.sqrt() * threshold as f64;

    let mut tasks = Vec::new();
    for m in 0..count {
        let Some(ref_box) = boxes[m].as_ref() else {
            continue;
        };
        for n in (m + 1)..count {
            let Some(obj_box) = boxes[n].as_ref() else {
                continue;
            };
            if (ref_box.size() - obj_box.size()).norm() > size_tolerance {
                continue;
            }
            tasks.push(Candidate {
                pair: (ComponentId(m as u32), ComponentId(n as u32)),
                reference: (ref_box, &clouds[m]),
                object: (obj_box, &clouds[n]),
            });
        }
    }

    let verdicts = evaluate(&tasks);
    let pairs: Vec<_> = tasks
        .iter()
        .zip(verdicts)
        .filter_map(|(task, ok)| ok.then_some(task.pair))
        .collect();
    debug!(
        "detect_congruencies components={} candidates={} congruent={}",
        count,
        tasks.len(),
        pairs.len()
    );
    pairs
}
