//! Caller-supplied knobs for one render.
//!
//! Weights multiply the energy terms of the label optimizer; the remaining
//! fields size the frame and tune segmentation and model precomputation.
//! Every field has a default, so a JSON config only needs to name the values
//! it overrides.

use crate::error::{AbstractionError, Result};
pub use crate::factor_graph::BeliefPropagationOptions;
use serde::{Deserialize, Serialize};

/// Parameters for the abstraction pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbstractionParams {
    /// Viewing scale in `[0, 1]`; drives stroke radius and the scale falloff terms.
    pub scale: f32,
    /// Bias added to the normalized depth difference of line-halo boundaries.
    pub contrast_weight: f32,
    /// Multiplier on the contrast score of boundaries between nested patches.
    pub inclusion_weight: f32,
    pub background_weight: f32,
    pub neighbour_weight: f32,
    pub consistency_weight: f32,
    /// Minimum feature-line length, in percent of the stroke radius.
    pub feature_weight: f32,
    /// Box-size tolerance of the congruency test (model units / 2).
    pub congruent_threshold: f32,
    /// Minimum pixel count of a flood-filled region to become a patch.
    pub patch_size_threshold: usize,
    pub render_width: usize,
    pub render_height: usize,
    /// RGB in `[0, 1]`.
    pub background_color: [f32; 3],
    /// Dihedral angle (degrees) at which a mesh edge counts as sharp.
    pub sharp_edge_angle_deg: f32,
    pub belief_propagation: BeliefPropagationOptions,
    pub result_images: ResultImages,
    pub verbose: bool,
}

impl Default for AbstractionParams {
    fn default() -> Self {
        Self {
            scale: 1.0,
            contrast_weight: 0.0,
            inclusion_weight: 1.5,
            background_weight: 250.0,
            neighbour_weight: 50.0,
            consistency_weight: 50.0,
            feature_weight: 1000.0,
            congruent_threshold: 0.005,
            patch_size_threshold: 30,
            render_width: 1600,
            render_height: 1200,
            background_color: [1.0, 1.0, 1.0],
            sharp_edge_angle_deg: 80.0,
            belief_propagation: BeliefPropagationOptions::default(),
            result_images: ResultImages::default(),
            verbose: false,
        }
    }
}

impl AbstractionParams {
    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.render_width == 0 {
            return Err(AbstractionError::invalid_param(
                "render_width",
                self.render_width,
                "must be positive",
            ));
        }
        if self.render_height == 0 {
            return Err(AbstractionError::invalid_param(
                "render_height",
                self.render_height,
                "must be positive",
            ));
        }
        let weights = [
            ("scale", self.scale),
            ("contrast_weight", self.contrast_weight),
            ("inclusion_weight", self.inclusion_weight),
            ("background_weight", self.background_weight),
            ("neighbour_weight", self.neighbour_weight),
            ("consistency_weight", self.consistency_weight),
            ("feature_weight", self.feature_weight),
            ("congruent_threshold", self.congruent_threshold),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(AbstractionError::invalid_param(name, value, "must be finite"));
            }
        }
        if self.scale < 0.0 {
            return Err(AbstractionError::invalid_param(
                "scale",
                self.scale,
                "must be non-negative",
            ));
        }
        if !(self.sharp_edge_angle_deg > 0.0 && self.sharp_edge_angle_deg <= 180.0) {
            return Err(AbstractionError::invalid_param(
                "sharp_edge_angle_deg",
                self.sharp_edge_angle_deg,
                "must lie in (0, 180]",
            ));
        }
        if self
            .background_color
            .iter()
            .any(|c| !(0.0..=1.0).contains(c))
        {
            return Err(AbstractionError::invalid_param(
                "background_color",
                format!("{:?}", self.background_color),
                "channels must lie in [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.belief_propagation.damping) {
            return Err(AbstractionError::invalid_param(
                "belief_propagation.damping",
                self.belief_propagation.damping,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Background intensity of the composited image (Rec. 709 luma of `background_color`).
    pub fn background_gray(&self) -> u8 {
        let [r, g, b] = self.background_color;
        ((0.2126 * r + 0.7152 * g + 0.0722 * b) * 255.0).round().clamp(0.0, 255.0) as u8
    }

    pub fn background_rgb(&self) -> [u8; 3] {
        self.background_color
            .map(|c| (c * 255.0).round().clamp(0.0, 255.0) as u8)
    }
}

/// Debug images to produce alongside the composited result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultImages {
    pub patch: bool,
    pub depth_critical: bool,
    pub sharp_edge: bool,
    pub boundary: bool,
    pub feature_line: bool,
    pub distance_transform: bool,
    pub consistency: bool,
    pub component: bool,
    pub inclusion: bool,
}

impl ResultImages {
    pub fn all() -> Self {
        Self {
            patch: true,
            depth_critical: true,
            sharp_edge: true,
            boundary: true,
            feature_line: true,
            distance_transform: true,
            consistency: true,
            component: true,
            inclusion: true,
        }
    }

    pub fn any(&self) -> bool {
        *self != Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: AbstractionParams =
            serde_json::from_str(r#"{ "scale": 0.5, "belief_propagation": { "max_iterations": 10 } }"#)
                .expect("parse");
        assert_eq!(params.scale, 0.5);
        assert_eq!(params.patch_size_threshold, 30);
        assert_eq!(params.belief_propagation.max_iterations, 10);
        assert_eq!(params.belief_propagation.convergence_bound, 1e-20);
        assert!(!params.result_images.any());
    }

    #[test]
    fn validate_rejects_zero_size_and_bad_colour() {
        let mut params = AbstractionParams::default();
        assert!(params.validate().is_ok());
        params.render_width = 0;
        assert!(params.validate().is_err());
        params.render_width = 10;
        params.background_color = [1.5, 0.0, 0.0];
        assert!(params.validate().is_err());
    }

    #[test]
    fn white_background_is_full_intensity() {
        assert_eq!(AbstractionParams::default().background_gray(), 255);
    }
}
