//! Similarity sets: patches whose source components are congruent.
use crate::types::{ComponentId, Patch, PatchId, SimilaritySet};
use std::collections::VecDeque;

/// Group patches by the connected components of the congruency graph.
///
/// Components are visited from the lowest id; within a set, patches follow
/// component discovery order and then patch id. Sets without any visible
/// patch are dropped.
pub fn group_similar_patches(
    patches: &[Patch],
    component_count: usize,
    congruent_pairs: &[(ComponentId, ComponentId)],
) -> Vec<SimilaritySet> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); component_count];
    for &(a, b) in congruent_pairs {
        if a.index() < component_count && b.index() < component_count && a != b {
            adjacency[a.index()].push(b.index());
            adjacency[b.index()].push(a.index());
        }
    }
    let mut patches_of: Vec<Vec<PatchId>> = vec![Vec::new(); component_count];
    for patch in patches {
        if let Some(c) = patch.component.filter(|c| c.index() < component_count) {
            patches_of[c.index()].push(patch.id);
        }
    }

    let mut visited = vec![false; component_count];
    let mut queue = VecDeque::new();
    let mut sets = Vec::new();
    for seed in 0..component_count {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        queue.push_back(seed);
        let mut set = SimilaritySet {
            components: Vec::new(),
            patches: Vec::new(),
        };
        while let Some(c) = queue.pop_front() {
            set.components.push(ComponentId(c as u32));
            set.patches.extend_from_slice(&patches_of[c]);
            for &next in &adjacency[c] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        if !set.patches.is_empty() {
            sets.push(set);
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(id: u32, component: u32) -> Patch {
        Patch::new(PatchId(id), Some(ComponentId(component)))
    }

    #[test]
    fn congruent_components_share_a_set() {
        let patches = vec![patch(0, 2), patch(1, 0), patch(2, 1), patch(3, 2)];
        let sets = group_similar_patches(&patches, 4, &[(ComponentId(0), ComponentId(2))]);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].components, vec![ComponentId(0), ComponentId(2)]);
        assert_eq!(sets[0].patches, vec![PatchId(1), PatchId(0), PatchId(3)]);
        assert_eq!(sets[1].patches, vec![PatchId(2)]);
    }

    #[test]
    fn invisible_components_form_no_set() {
        let sets = group_similar_patches(&[], 3, &[(ComponentId(0), ComponentId(1))]);
        assert!(sets.is_empty());
    }
}
