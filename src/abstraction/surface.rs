//! Surface pixel classification.
use crate::image::Grid;
use crate::raster::BACKGROUND_TRIANGLE;
use crate::types::PixelCoord;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

fn covered_in_row(row: usize, ids: &[i32]) -> Vec<PixelCoord> {
    ids.iter()
        .enumerate()
        .filter(|(_, &t)| t != BACKGROUND_TRIANGLE)
        .map(|(col, _)| PixelCoord::new(row, col))
        .collect()
}

/// All pixels covered by the mesh, in row-major order.
pub fn classify_surface_pixels(triangle_ids: &Grid<i32>) -> Vec<PixelCoord> {
    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<PixelCoord>> = triangle_ids
        .data
        .par_chunks(triangle_ids.w.max(1))
        .enumerate()
        .map(|(row, ids)| covered_in_row(row, ids))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<PixelCoord>> = triangle_ids
        .rows()
        .enumerate()
        .map(|(row, ids)| covered_in_row(row, ids))
        .collect();
    rows.concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_covered_pixels_in_scan_order() {
        let ids = Grid::from_vec(3, 2, vec![-1, 4, -1, 0, -1, 2]).expect("sized");
        assert_eq!(
            classify_surface_pixels(&ids),
            vec![
                PixelCoord::new(0, 1),
                PixelCoord::new(1, 0),
                PixelCoord::new(1, 2)
            ]
        );
    }

    #[test]
    fn all_background_is_empty() {
        let ids = Grid::new_fill(5, 5, BACKGROUND_TRIANGLE);
        assert!(classify_surface_pixels(&ids).is_empty());
        assert!(classify_surface_pixels(&Grid::<i32>::default()).is_empty());
    }
}
