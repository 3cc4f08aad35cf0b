//! Per-frame pixel maps shared by the abstraction stages.
//!
//! The orchestrator owns one workspace and hands it to each stage in turn.
//! Maps are cleared in place between renders and only reallocated when the
//! render size changes.
use crate::image::Grid;
use crate::types::PixelCoord;
use std::collections::VecDeque;

/// Patch-id map value of a pixel no pass has claimed yet.
pub const UNLABELED: i32 = -1;
/// Pixel of a primary flood fill that fell below the size threshold.
pub const STRANDED_PRIMARY: i32 = -2;
/// Pixel of a component flood fill that fell below the size threshold.
pub const STRANDED_COMPONENT: i32 = -3;

/// Reusable per-pixel state for one render.
#[derive(Debug, Default)]
pub struct FrameWorkspace {
    /// Patch id per pixel; negative values are the sentinels above.
    pub(crate) patch_ids: Grid<i32>,
    /// 1 where a primary fill met a screen neighbour on an unconnected triangle.
    pub(crate) depth_critical: Grid<u8>,
    /// 1 where a pixel registered contact with another patch.
    pub(crate) boundary_mask: Grid<u8>,
    /// 1 for distance-transform seeds (any boundary pixel).
    pub(crate) distance_seeds: Grid<u8>,
    pub(crate) distance: Grid<f32>,
    pub(crate) feature_mask: Grid<u8>,
    /// Visited flags of the feature-line grouping.
    pub(crate) marked: Grid<u8>,
    pub(crate) queue: VecDeque<PixelCoord>,
}

impl FrameWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every map, reallocating when `(width, height)` differs from the last frame.
    pub fn reset(&mut self, width: usize, height: usize) {
        self.patch_ids.reset(width, height, UNLABELED);
        self.depth_critical.reset(width, height, 0);
        self.boundary_mask.reset(width, height, 0);
        self.distance_seeds.reset(width, height, 0);
        self.distance.reset(width, height, 0.0);
        self.feature_mask.reset(width, height, 0);
        self.marked.reset(width, height, 0);
        self.queue.clear();
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.patch_ids.w, self.patch_ids.h)
    }

    pub fn patch_ids(&self) -> &Grid<i32> {
        &self.patch_ids
    }

    pub fn depth_critical(&self) -> &Grid<u8> {
        &self.depth_critical
    }

    pub fn distance(&self) -> &Grid<f32> {
        &self.distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_previous_frame() {
        let mut ws = FrameWorkspace::new();
        ws.reset(4, 3);
        ws.patch_ids.set(1, 1, 7);
        ws.depth_critical.set(2, 3, 1);
        ws.queue.push_back(PixelCoord::new(0, 0));
        ws.reset(4, 3);
        assert!(ws.patch_ids.data.iter().all(|&v| v == UNLABELED));
        assert!(ws.depth_critical.data.iter().all(|&v| v == 0));
        assert!(ws.queue.is_empty());
        ws.reset(8, 2);
        assert_eq!(ws.dimensions(), (8, 2));
        assert_eq!(ws.marked.data.len(), 16);
    }
}
