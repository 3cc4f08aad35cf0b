use crate::abstraction::segmentation::StrategyOutcome;
use crate::abstraction::AbstractionResult;
use crate::diagnostics::TimingBreakdown;
use crate::factor_graph::BpOutcome;
use serde::Serialize;

/// Result produced by [`Abstractor::render`](crate::Abstractor::render).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbstractionReport {
    pub result: AbstractionResult,
    pub trace: PipelineTrace,
}

/// Execution trace of one render.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub segmentation: SegmentationStage,
    pub counts: EntityCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationStage>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub width: usize,
    pub height: usize,
    /// 1-based index of this render since the model was loaded.
    pub render_count: u64,
    pub faces: usize,
    pub components: usize,
    pub congruent_pairs: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationStage {
    pub surface_pixels: usize,
    pub depth_critical_pixels: usize,
    pub passes: Vec<StrategyOutcome>,
    /// Pixels left without a patch after every strategy.
    pub stranded: usize,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityCounts {
    pub patches: usize,
    pub boundaries: usize,
    pub feature_lines: usize,
    pub similarity_sets: usize,
    pub inclusion_pairs: usize,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationStage {
    pub variables: usize,
    pub factors: usize,
    pub iterations: usize,
    pub converged: bool,
    pub final_delta: f64,
    pub score: f64,
}

impl OptimizationStage {
    pub fn new(variables: usize, factors: usize, outcome: &BpOutcome) -> Self {
        Self {
            variables,
            factors,
            iterations: outcome.iterations,
            converged: outcome.converged,
            final_delta: outcome.final_delta,
            score: outcome.score,
        }
    }
}

impl PipelineTrace {
    /// Multi-line summary for verbose tool output.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("Model Render Count #{}", self.input.render_count),
            format!("Frame time: {:.3} ms", self.timings.total_ms),
            format!("Patches: {}", self.counts.patches),
            format!("Boundaries: {}", self.counts.boundaries),
            format!("Components: {}", self.input.components),
            format!("Similarity Sets: {}", self.counts.similarity_sets),
            format!("Inclusion Pairs: {}", self.counts.inclusion_pairs),
        ];
        if let Some(opt) = &self.optimization {
            lines.push(format!(
                "Optimization: {} iterations, converged={}",
                opt.iterations, opt.converged
            ));
        }
        lines.join("\n")
    }
}
