//! Binary labelling of patches and boundaries by max-sum belief propagation.
//!
//! Variables: one per patch (fill: 0 black, 1 white) followed by one per
//! boundary (0 contrast halo, 1 line halo). Factors, all scores to be
//! maximised:
//! - similarity: every unordered pair inside a similarity set, `+m` for
//!   equal fills and `-m` otherwise, `m = consistency_weight * min(area)`;
//! - background: unary per patch, `background_weight * background_term`
//!   on label 0;
//! - boundary: ternary over (patch, patch, boundary), see [`boundary_score`].
use super::params::AbstractionParams;
use super::terms::{BoundaryTerms, EnergyTerms};
use crate::error::Result;
use crate::factor_graph::{max_sum_bp, BpOutcome, FactorGraph};
use crate::types::{
    canonical_pair, Boundary, BoundaryStyle, FillLabel, InclusionPair, Patch, PatchId,
    SimilaritySet,
};
use log::debug;
use std::collections::HashSet;

/// Score of both fills equal, whatever the boundary style.
const EQUAL_FILL_SCORE: f64 = 1e-8;

/// Result of one optimization run.
#[derive(Clone, Debug)]
pub struct Labeling {
    pub variables: usize,
    pub factors: usize,
    pub outcome: BpOutcome,
}

/// Weights applied to the ternary boundary factor.
#[derive(Clone, Copy, Debug)]
struct BoundaryWeights {
    neighbour: f64,
    contrast: f64,
    inclusion: f64,
}

/// Score of `(fill_a, fill_b, style)` for one boundary.
fn boundary_score(
    labels: &[usize],
    terms: &BoundaryTerms,
    weights: BoundaryWeights,
    nested: bool,
) -> f64 {
    let equal = labels[0] == labels[1];
    let include = if nested { weights.inclusion } else { 1.0 };
    match (equal, labels[2]) {
        (true, 0) => EQUAL_FILL_SCORE * weights.neighbour,
        (false, 0) => {
            terms.scale_contrast
                * terms.length_area
                * (1.0 - terms.depth)
                * include
                * weights.neighbour
        }
        (true, _) => {
            terms.scale_line
                * terms.length_area
                * (terms.depth + weights.contrast).max(0.01)
                * weights.neighbour
        }
        (false, _) => 0.0,
    }
}

/// Build the factor graph, run inference and write the labels back.
pub fn optimize_labels(
    patches: &mut [Patch],
    boundaries: &mut [Boundary],
    similarity_sets: &[SimilaritySet],
    inclusions: &[InclusionPair],
    terms: &EnergyTerms,
    params: &AbstractionParams,
) -> Result<Labeling> {
    let mut graph = FactorGraph::new();
    let first_patch = graph.add_variables(patches.len(), 2);
    let first_boundary = graph.add_variables(boundaries.len(), 2);
    let var_of = |p: PatchId| first_patch + p.index();

    let consistency = f64::from(params.consistency_weight);
    for set in similarity_sets {
        for (k, &a) in set.patches.iter().enumerate() {
            for &b in &set.patches[k + 1..] {
                let (lo, hi) = canonical_pair(a, b);
                let m = terms.patches[lo.index()]
                    .area
                    .min(terms.patches[hi.index()].area)
                    * consistency;
                graph.add_factor(&[var_of(lo), var_of(hi)], |x| {
                    if x[0] == x[1] {
                        m
                    } else {
                        -m
                    }
                })?;
            }
        }
    }

    let background = f64::from(params.background_weight);
    for patch in patches.iter() {
        let score = terms.patches[patch.id.index()].background * background;
        graph.add_factor(&[var_of(patch.id)], |x| if x[0] == 0 { score } else { 0.0 })?;
    }

    let nested: HashSet<(PatchId, PatchId)> = inclusions
        .iter()
        .map(|pair| canonical_pair(pair.outer, pair.inner))
        .collect();
    let weights = BoundaryWeights {
        neighbour: f64::from(params.neighbour_weight),
        contrast: f64::from(params.contrast_weight),
        inclusion: f64::from(params.inclusion_weight),
    };
    for (c, boundary) in boundaries.iter().enumerate() {
        let [a, b] = boundary.patches;
        let bt = terms.boundaries[c];
        let is_nested = nested.contains(&canonical_pair(a, b));
        graph.add_factor(&[var_of(a), var_of(b), first_boundary + c], |x| {
            boundary_score(x, &bt, weights, is_nested)
        })?;
    }

    let outcome = max_sum_bp(&graph, &params.belief_propagation);
    for patch in patches.iter_mut() {
        patch.label = Some(FillLabel::from_state(outcome.labels[var_of(patch.id)]));
    }
    for (c, boundary) in boundaries.iter_mut().enumerate() {
        boundary.label = Some(BoundaryStyle::from_state(outcome.labels[first_boundary + c]));
    }
    debug!(
        "optimize_labels variables={} factors={} iterations={} converged={} score={:.6}",
        graph.n_variables(),
        graph.factors().len(),
        outcome.iterations,
        outcome.converged,
        outcome.score
    );
    Ok(Labeling {
        variables: graph.n_variables(),
        factors: graph.factors().len(),
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::terms::PatchTerms;
    use crate::types::{BoundaryId, ComponentId};

    const WEIGHTS: BoundaryWeights = BoundaryWeights {
        neighbour: 50.0,
        contrast: 0.0,
        inclusion: 1.5,
    };

    fn terms(length_area: f64, depth: f64) -> BoundaryTerms {
        BoundaryTerms {
            length_area,
            scale_contrast: 0.5,
            scale_line: 0.25,
            depth,
        }
    }

    #[test]
    fn ternary_table_layout() {
        let bt = terms(0.2, 0.4);
        let score = |a, b, c| boundary_score(&[a, b, c], &bt, WEIGHTS, false);
        assert_eq!(score(0, 0, 0), 1e-8 * 50.0);
        assert_eq!(score(1, 1, 0), 1e-8 * 50.0);
        approx::assert_relative_eq!(score(1, 0, 0), 0.5 * 0.2 * 0.6 * 50.0);
        approx::assert_relative_eq!(score(0, 0, 1), 0.25 * 0.2 * 0.4 * 50.0);
        assert_eq!(score(0, 1, 1), 0.0);
        assert_eq!(score(1, 0, 1), 0.0);
        let nested = boundary_score(&[0, 1, 0], &bt, WEIGHTS, true);
        approx::assert_relative_eq!(nested, score(0, 1, 0) * 1.5);
    }

    #[test]
    fn strong_contrast_boundary_splits_fills() {
        let mut patches = vec![
            Patch::new(PatchId(0), Some(ComponentId(0))),
            Patch::new(PatchId(1), Some(ComponentId(1))),
        ];
        let mut boundaries = vec![Boundary::new(BoundaryId(0), PatchId(0), PatchId(1))];
        let energy = EnergyTerms {
            patches: vec![
                PatchTerms {
                    area: 0.5,
                    background: 0.1,
                },
                PatchTerms {
                    area: 0.3,
                    background: 0.0,
                },
            ],
            boundaries: vec![terms(0.2, 0.0)],
        };
        let params = AbstractionParams::default();
        let labeling =
            optimize_labels(&mut patches, &mut boundaries, &[], &[], &energy, &params)
                .expect("valid graph");
        assert_eq!(labeling.variables, 3);
        assert_eq!(labeling.factors, 3);
        assert_eq!(patches[0].label, Some(FillLabel::Black));
        assert_eq!(patches[1].label, Some(FillLabel::White));
        assert_eq!(boundaries[0].label, Some(BoundaryStyle::ContrastHalo));
    }

    #[test]
    fn similarity_pulls_fills_together() {
        let mut patches = vec![
            Patch::new(PatchId(0), Some(ComponentId(0))),
            Patch::new(PatchId(1), Some(ComponentId(1))),
        ];
        let energy = EnergyTerms {
            patches: vec![
                PatchTerms {
                    area: 0.2,
                    background: 0.0,
                },
                PatchTerms {
                    area: 0.2,
                    background: 0.0,
                },
            ],
            boundaries: Vec::new(),
        };
        let sets = vec![SimilaritySet {
            components: vec![ComponentId(0), ComponentId(1)],
            patches: vec![PatchId(1), PatchId(0)],
        }];
        let labeling = optimize_labels(
            &mut patches,
            &mut [],
            &sets,
            &[],
            &energy,
            &AbstractionParams::default(),
        )
        .expect("valid graph");
        assert!(labeling.outcome.converged);
        assert_eq!(patches[0].label, patches[1].label);
    }
}
