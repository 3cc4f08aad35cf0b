//! Nested-patch detection.
use crate::types::{InclusionPair, Patch};
use std::collections::BTreeSet;

/// Find patches enclosed by exactly one neighbour.
///
/// Only patches that never touch the background are candidates. A
/// candidate is included in a neighbour whose boundary box is strictly
/// larger and covers the candidate's box; the pair is kept when exactly one
/// neighbour includes it and every other neighbour is itself included in
/// the candidate.
pub fn detect_inclusions(patches: &[Patch]) -> Vec<InclusionPair> {
    let mut pairs = BTreeSet::new();
    for patch in patches {
        if patch.background_boundary_length != 0 || patch.neighbours.is_empty() {
            continue;
        }
        let inner_box = &patch.bounding_box;
        let mut outer = None;
        let mut included_in = 0usize;
        let mut includes = 0usize;
        for &nb in &patch.neighbours {
            let nb_box = &patches[nb.index()].bounding_box;
            if nb_box.strictly_contains(inner_box) {
                outer = Some(nb);
                included_in += 1;
            } else if inner_box.strictly_contains(nb_box) {
                includes += 1;
            }
        }
        if included_in == 1 && included_in + includes == patch.neighbours.len() {
            if let Some(outer) = outer {
                pairs.insert(InclusionPair {
                    outer,
                    inner: patch.id,
                });
            }
        }
    }
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PatchId, PixelCoord};

    fn patch(id: u32, (r0, c0): (usize, usize), (r1, c1): (usize, usize), bg: u32) -> Patch {
        let mut p = Patch::new(PatchId(id), None);
        p.bounding_box.union_point(PixelCoord::new(r0, c0));
        p.bounding_box.union_point(PixelCoord::new(r1, c1));
        p.background_boundary_length = bg;
        p
    }

    fn link(patches: &mut [Patch], a: u32, b: u32) {
        patches[a as usize].neighbours.insert(PatchId(b));
        patches[b as usize].neighbours.insert(PatchId(a));
    }

    #[test]
    fn nested_chain_yields_two_pairs() {
        let mut patches = vec![
            patch(0, (0, 0), (20, 20), 10),
            patch(1, (4, 4), (16, 16), 0),
            patch(2, (8, 8), (12, 12), 0),
        ];
        link(&mut patches, 0, 1);
        link(&mut patches, 1, 2);
        let pairs = detect_inclusions(&patches);
        assert_eq!(
            pairs,
            vec![
                InclusionPair {
                    outer: PatchId(0),
                    inner: PatchId(1)
                },
                InclusionPair {
                    outer: PatchId(1),
                    inner: PatchId(2)
                },
            ]
        );
    }

    #[test]
    fn side_by_side_patches_are_not_nested() {
        let mut patches = vec![
            patch(0, (0, 0), (20, 20), 10),
            patch(1, (4, 4), (10, 10), 0),
            patch(2, (4, 8), (10, 16), 0),
        ];
        link(&mut patches, 0, 1);
        link(&mut patches, 0, 2);
        link(&mut patches, 1, 2);
        assert!(detect_inclusions(&patches).is_empty());
    }

    #[test]
    fn equal_sized_lateral_neighbours_block_inclusion() {
        let mut patches = vec![
            patch(0, (0, 0), (30, 30), 12),
            patch(1, (10, 10), (16, 16), 0),
            patch(2, (10, 17), (16, 23), 0),
            patch(3, (17, 10), (23, 16), 0),
        ];
        link(&mut patches, 1, 2);
        link(&mut patches, 1, 3);
        let pairs = detect_inclusions(&patches);
        assert!(pairs.iter().all(|pair| pair.inner != PatchId(1)));
        assert!(pairs.is_empty());

        // An enclosing neighbour does not help while the lateral ones remain.
        link(&mut patches, 0, 1);
        let pairs = detect_inclusions(&patches);
        assert!(pairs.iter().all(|pair| pair.inner != PatchId(1)));
    }
}
