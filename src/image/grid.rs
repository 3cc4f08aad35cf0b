//! Owned dense 2D map in row-major layout, addressed by `(row, col)`.
//!
//! Every per-pixel buffer of a frame (triangle ids, depth, patch ids,
//! masks, the distance field) is a `Grid`. All maps of one frame share the
//! same dimensions.
use crate::types::PixelCoord;

/// 4-neighbourhood offsets as `(d_row, d_col)`, in scan order up/down/left/right.
pub const NEIGHBORS_4: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// 8-neighbourhood offsets: the 4-neighbours followed by the diagonals.
pub const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    /// Width in pixels (number of columns)
    pub w: usize,
    /// Height in pixels (number of rows)
    pub h: usize,
    /// Backing storage in row-major order
    pub data: Vec<T>,
}

impl<T: Copy> Grid<T> {
    /// Construct a `w × h` grid filled with `value`.
    pub fn new_fill(w: usize, h: usize, value: T) -> Self {
        Self {
            w,
            h,
            data: vec![value; w * h],
        }
    }

    /// Wrap an existing row-major buffer. Returns `None` if the length is not `w * h`.
    pub fn from_vec(w: usize, h: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == w * h).then_some(Self { w, h, data })
    }

    #[inline]
    /// Convert (row, col) to a linear index into `data`.
    pub fn idx(&self, row: usize, col: usize) -> usize {
        row * self.w + col
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[self.idx(row, col)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, v: T) {
        let i = self.idx(row, col);
        self.data[i] = v;
    }

    #[inline]
    pub fn at(&self, p: PixelCoord) -> T {
        self.get(p.row, p.col)
    }

    #[inline]
    pub fn put(&mut self, p: PixelCoord, v: T) {
        self.set(p.row, p.col, v);
    }

    /// Overwrite every cell with `value` without reallocating.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Clear to `value`, reallocating only when the dimensions change.
    pub fn reset(&mut self, w: usize, h: usize, value: T) {
        if self.w != w || self.h != h {
            *self = Self::new_fill(w, h, value);
        } else {
            self.fill(value);
        }
    }

    /// Offset `p` by `(dr, dc)`, returning `None` when it leaves the grid.
    #[inline]
    pub fn offset(&self, p: PixelCoord, dr: isize, dc: isize) -> Option<PixelCoord> {
        let row = p.row as isize + dr;
        let col = p.col as isize + dc;
        if row < 0 || col < 0 || row >= self.h as isize || col >= self.w as isize {
            None
        } else {
            Some(PixelCoord::new(row as usize, col as usize))
        }
    }

    /// In-range 4-neighbours of `p` in scan order.
    pub fn neighbors4(&self, p: PixelCoord) -> impl Iterator<Item = PixelCoord> + '_ {
        NEIGHBORS_4
            .iter()
            .filter_map(move |&(dr, dc)| self.offset(p, dr, dc))
    }

    /// In-range 8-neighbours of `p`.
    pub fn neighbors8(&self, p: PixelCoord) -> impl Iterator<Item = PixelCoord> + '_ {
        NEIGHBORS_8
            .iter()
            .filter_map(move |&(dr, dc)| self.offset(p, dr, dc))
    }

    pub fn same_size<U>(&self, other: &Grid<U>) -> bool {
        self.w == other.w && self.h == other.h
    }

    /// Rows top to bottom, each `w` cells long.
    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.data.chunks(self.w.max(1))
    }

    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, T> {
        let w = self.w.max(1);
        self.data.chunks_mut(w)
    }
}

impl<T: Copy + Default> Default for Grid<T> {
    fn default() -> Self {
        Self {
            w: 0,
            h: 0,
            data: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_rejects_out_of_range() {
        let g = Grid::new_fill(3, 2, 0u8);
        let corner = PixelCoord::new(0, 0);
        assert_eq!(g.offset(corner, -1, 0), None);
        assert_eq!(g.offset(corner, 1, 2), Some(PixelCoord::new(1, 2)));
        assert_eq!(g.offset(corner, 2, 0), None);
        assert_eq!(g.neighbors4(corner).count(), 2);
        assert_eq!(g.neighbors8(PixelCoord::new(1, 1)).count(), 5);
    }

    #[test]
    fn reset_keeps_allocation_for_same_size() {
        let mut g = Grid::new_fill(4, 4, 1i32);
        g.set(2, 3, 7);
        g.reset(4, 4, -1);
        assert!(g.data.iter().all(|&v| v == -1));
        g.reset(2, 5, 0);
        assert_eq!((g.w, g.h), (2, 5));
        assert_eq!(g.data.len(), 10);
    }

    #[test]
    fn rows_iterate_in_order() {
        let g = Grid::from_vec(2, 2, vec![1, 2, 3, 4]).expect("sized");
        let rows: Vec<&[i32]> = g.rows().collect();
        assert_eq!(rows, vec![&[1, 2][..], &[3, 4][..]]);
        let mut m = g.clone();
        for (r, row) in m.rows_mut().enumerate() {
            row[0] = r as i32 * 10;
        }
        assert_eq!(m.data, vec![0, 2, 10, 4]);
        assert!(Grid::from_vec(2, 2, vec![0u8; 3]).is_none());
    }
}
