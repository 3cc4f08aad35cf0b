//! Exact Euclidean distance transform (Felzenszwalb & Huttenlocher).
//!
//! Two separable passes of the 1D lower-envelope transform over squared
//! distances: columns first, then rows. Seeds are at distance zero.
use crate::image::Grid;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

const INF: f32 = 1.0e20;

/// 1D squared-distance transform of `f` into `out`, using `v`/`z` as scratch.
fn transform_1d(f: &[f32], out: &mut [f32], v: &mut [usize], z: &mut [f32]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut k = 0usize;
    v[0] = 0;
    z[0] = f32::NEG_INFINITY;
    z[1] = f32::INFINITY;
    for q in 1..n {
        let fq = f[q] + (q * q) as f32;
        let intersect = |p: usize| (fq - (f[p] + (p * p) as f32)) / (2.0 * (q - p) as f32);
        let mut s = intersect(v[k]);
        while s <= z[k] {
            k -= 1;
            s = intersect(v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f32::INFINITY;
    }
    k = 0;
    for (q, o) in out.iter_mut().enumerate() {
        while z[k + 1] < q as f32 {
            k += 1;
        }
        let p = v[k];
        let d = q as f32 - p as f32;
        *o = d * d + f[p];
    }
}

fn transform_row(row: &mut [f32]) {
    let n = row.len();
    let f = row.to_vec();
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f32; n + 1];
    transform_1d(&f, row, &mut v, &mut z);
    for d in row.iter_mut() {
        *d = d.sqrt();
    }
}

/// Distance of every pixel to the nearest pixel with `seeds != 0`.
///
/// Without any seed every pixel gets the image diagonal length.
pub fn euclidean_distance_transform(seeds: &Grid<u8>, out: &mut Grid<f32>) {
    let (w, h) = (seeds.w, seeds.h);
    out.reset(w, h, 0.0);
    if w == 0 || h == 0 {
        return;
    }
    if seeds.data.iter().all(|&s| s == 0) {
        out.fill(((w * w + h * h) as f32).sqrt());
        return;
    }

    let mut column = vec![0.0f32; h];
    let mut transformed = vec![0.0f32; h];
    let mut v = vec![0usize; h];
    let mut z = vec![0.0f32; h + 1];
    for col in 0..w {
        for (row, c) in column.iter_mut().enumerate() {
            *c = if seeds.get(row, col) != 0 { 0.0 } else { INF };
        }
        transform_1d(&column, &mut transformed, &mut v, &mut z);
        for (row, &d) in transformed.iter().enumerate() {
            out.set(row, col, d);
        }
    }

    #[cfg(feature = "parallel")]
    out.data.par_chunks_mut(w).for_each(transform_row);
    #[cfg(not(feature = "parallel"))]
    out.rows_mut().for_each(transform_row);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn brute_force(seeds: &Grid<u8>) -> Grid<f32> {
        let mut out = Grid::new_fill(seeds.w, seeds.h, f32::INFINITY);
        for r in 0..seeds.h {
            for c in 0..seeds.w {
                for sr in 0..seeds.h {
                    for sc in 0..seeds.w {
                        if seeds.get(sr, sc) != 0 {
                            let dr = r as f32 - sr as f32;
                            let dc = c as f32 - sc as f32;
                            let d = (dr * dr + dc * dc).sqrt();
                            if d < out.get(r, c) {
                                out.set(r, c, d);
                            }
                        }
                    }
                }
            }
        }
        out
    }

    #[test]
    fn matches_brute_force() {
        let mut seeds = Grid::new_fill(9, 7, 0u8);
        seeds.set(0, 0, 1);
        seeds.set(3, 5, 1);
        seeds.set(6, 8, 1);
        seeds.set(6, 1, 1);
        let mut dt = Grid::default();
        euclidean_distance_transform(&seeds, &mut dt);
        let expected = brute_force(&seeds);
        for (a, b) in dt.data.iter().zip(&expected.data) {
            assert_relative_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn seeds_are_zero_and_empty_seed_set_is_diagonal() {
        let mut seeds = Grid::new_fill(4, 3, 0u8);
        let mut dt = Grid::default();
        euclidean_distance_transform(&seeds, &mut dt);
        assert_relative_eq!(dt.get(1, 1), 5.0);
        seeds.set(1, 2, 1);
        euclidean_distance_transform(&seeds, &mut dt);
        assert_eq!(dt.get(1, 2), 0.0);
        assert_relative_eq!(dt.get(1, 0), 2.0);
    }
}
