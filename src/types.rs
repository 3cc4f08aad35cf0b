//! Entities produced by one abstraction pass.
//!
//! All of them are rebuilt from scratch on every render; ids are dense
//! indices into the per-frame vectors and are assigned in scan order, so two
//! renders of the same input produce identical ids.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `(row, col)` index into the render grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PixelCoord {
    pub row: usize,
    pub col: usize,
}

impl PixelCoord {
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Index of a committed patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchId(pub u32);

impl PatchId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a boundary between two patches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryId(pub u32);

impl BoundaryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// 0-based index of a connected mesh component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

impl ComponentId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Convert a 1-based per-face component label (0 = unlabeled).
    #[inline]
    pub fn from_face_label(label: u32) -> Option<Self> {
        label.checked_sub(1).map(ComponentId)
    }
}

/// Fill colour chosen for a patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FillLabel {
    Black,
    White,
}

impl FillLabel {
    pub fn from_state(state: usize) -> Self {
        if state == 1 {
            Self::White
        } else {
            Self::Black
        }
    }

    pub fn intensity(self) -> u8 {
        match self {
            Self::Black => 0,
            Self::White => 255,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Self::Black => Self::White,
            Self::White => Self::Black,
        }
    }
}

/// Rendering style chosen for a boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryStyle {
    /// Separation is carried by the fill contrast alone.
    ContrastHalo,
    /// A line is drawn along the boundary.
    LineHalo,
}

impl BoundaryStyle {
    pub fn from_state(state: usize) -> Self {
        if state == 1 {
            Self::LineHalo
        } else {
            Self::ContrastHalo
        }
    }
}

/// Inclusive axis-aligned box over pixel rows/cols. Empty until a point is added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_row: i64,
    pub min_col: i64,
    pub max_row: i64,
    pub max_col: i64,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min_row: i64::MAX,
            min_col: i64::MAX,
            max_row: i64::MIN,
            max_col: i64::MIN,
        }
    }
}

impl BoundingBox {
    pub fn union_point(&mut self, p: PixelCoord) {
        let (r, c) = (p.row as i64, p.col as i64);
        self.min_row = self.min_row.min(r);
        self.min_col = self.min_col.min(c);
        self.max_row = self.max_row.max(r);
        self.max_col = self.max_col.max(c);
    }

    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_row: self.min_row.max(other.min_row),
            min_col: self.min_col.max(other.min_col),
            max_row: self.max_row.min(other.max_row),
            max_col: self.max_col.min(other.max_col),
        }
    }

    /// Spanned area `(max - min)` per axis, clamped at zero.
    pub fn size(&self) -> i64 {
        (self.max_row - self.min_row).max(0) * (self.max_col - self.min_col).max(0)
    }

    /// True when `self` is larger than `inner` and fully covers it.
    pub fn strictly_contains(&self, inner: &BoundingBox) -> bool {
        self.size() > inner.size() && self.intersect(inner) == *inner
    }
}

/// Maximal same-surface image region.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
    pub id: PatchId,
    pub pixels: Vec<PixelCoord>,
    /// Mesh component the seed pixel was rasterized from.
    pub component: Option<ComponentId>,
    pub bounding_box: BoundingBox,
    /// Pixels touching another patch or the background.
    pub boundary_length: u32,
    /// Pixels touching the background (or unassigned pixels).
    pub background_boundary_length: u32,
    /// Largest distance-to-boundary over the patch pixels.
    pub max_distance_transform: f32,
    pub neighbours: BTreeSet<PatchId>,
    pub label: Option<FillLabel>,
}

impl Patch {
    pub fn new(id: PatchId, component: Option<ComponentId>) -> Self {
        Self {
            id,
            pixels: Vec::new(),
            component,
            bounding_box: BoundingBox::default(),
            boundary_length: 0,
            background_boundary_length: 0,
            max_distance_transform: 0.0,
            neighbours: BTreeSet::new(),
            label: None,
        }
    }

    pub fn area(&self) -> usize {
        self.pixels.len()
    }
}

/// Canonical key of an unordered patch pair: the smaller id first.
#[inline]
pub fn canonical_pair(a: PatchId, b: PatchId) -> (PatchId, PatchId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Contact between exactly two patches.
///
/// `patches` is canonical (smaller id first); `pixels[k]` and `votes[k]`
/// belong to `patches[k]`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    pub id: BoundaryId,
    pub patches: [PatchId; 2],
    /// Depth-majority votes: side k gains a vote when its pixel is the farther one.
    pub votes: [u32; 2],
    pub pixels: [Vec<PixelCoord>; 2],
    /// Mean absolute depth difference across the contact.
    pub avg_depth_diff: f32,
    pub label: Option<BoundaryStyle>,
}

impl Boundary {
    pub fn new(id: BoundaryId, a: PatchId, b: PatchId) -> Self {
        let (lo, hi) = canonical_pair(a, b);
        Self {
            id,
            patches: [lo, hi],
            votes: [0, 0],
            pixels: [Vec::new(), Vec::new()],
            avg_depth_diff: 0.0,
            label: None,
        }
    }

    /// Side that carries the drawn line: side 0 only on a strict vote majority.
    pub fn winning_side(&self) -> usize {
        if self.votes[0] > self.votes[1] {
            0
        } else {
            1
        }
    }

    pub fn winning_patch(&self) -> PatchId {
        self.patches[self.winning_side()]
    }

    pub fn winning_pixels(&self) -> &[PixelCoord] {
        &self.pixels[self.winning_side()]
    }

    pub fn contact_pixels(&self) -> usize {
        self.pixels[0].len() + self.pixels[1].len()
    }
}

/// 8-connected run of feature pixels inside one patch.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureLine {
    pub patch: PatchId,
    pub pixels: Vec<PixelCoord>,
}

/// Patches whose source components are mutually congruent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilaritySet {
    pub components: Vec<ComponentId>,
    pub patches: Vec<PatchId>,
}

/// `inner` is nested inside `outer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InclusionPair {
    pub outer: PatchId,
    pub inner: PatchId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(r0: usize, c0: usize, r1: usize, c1: usize) -> BoundingBox {
        let mut b = BoundingBox::default();
        b.union_point(PixelCoord::new(r0, c0));
        b.union_point(PixelCoord::new(r1, c1));
        b
    }

    #[test]
    fn strict_containment_requires_larger_box() {
        let outer = bbox(0, 0, 10, 10);
        let inner = bbox(2, 2, 5, 5);
        assert!(outer.strictly_contains(&inner));
        assert!(!inner.strictly_contains(&outer));
        assert!(!outer.strictly_contains(&outer));
        let lateral = bbox(8, 8, 14, 14);
        assert!(!outer.strictly_contains(&lateral));
    }

    #[test]
    fn canonical_pair_is_order_independent() {
        let (a, b) = (PatchId(7), PatchId(3));
        assert_eq!(canonical_pair(a, b), canonical_pair(b, a));
        assert_eq!(Boundary::new(BoundaryId(0), a, b).patches, [b, a]);
    }

    #[test]
    fn vote_tie_goes_to_second_side() {
        let mut boundary = Boundary::new(BoundaryId(0), PatchId(0), PatchId(1));
        boundary.votes = [2, 2];
        assert_eq!(boundary.winning_patch(), PatchId(1));
        boundary.votes = [3, 2];
        assert_eq!(boundary.winning_patch(), PatchId(0));
    }
}
