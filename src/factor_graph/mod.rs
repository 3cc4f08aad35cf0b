//! Discrete factor graph with dense tables over small variable scopes.
//!
//! Variables carry a fixed label cardinality. A factor references one or
//! more distinct variables and stores one score per joint assignment, laid
//! out with the first variable varying fastest. Scores are added across
//! factors and the inference in [`bp`] maximises the total.

pub mod bp;

pub use bp::{max_sum_bp, BeliefPropagationOptions, BpOutcome};

use crate::error::{AbstractionError, Result};

/// Dense table over the joint labels of `variables`.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    variables: Vec<usize>,
    cardinalities: Vec<usize>,
    table: Vec<f64>,
}

impl Factor {
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn arity(&self) -> usize {
        self.variables.len()
    }

    pub fn table(&self) -> &[f64] {
        &self.table
    }

    /// Decode a table index into per-variable labels (first variable fastest).
    pub fn labels_of(&self, mut index: usize, out: &mut [usize]) {
        for (slot, &card) in out.iter_mut().zip(&self.cardinalities) {
            *slot = index % card;
            index /= card;
        }
    }

    /// Table index of a joint assignment.
    pub fn index_of(&self, labels: &[usize]) -> usize {
        let mut index = 0;
        let mut stride = 1;
        for (&label, &card) in labels.iter().zip(&self.cardinalities) {
            index += label * stride;
            stride *= card;
        }
        index
    }

    pub fn value(&self, labels: &[usize]) -> f64 {
        self.table[self.index_of(labels)]
    }
}

#[derive(Clone, Debug, Default)]
pub struct FactorGraph {
    cardinalities: Vec<usize>,
    factors: Vec<Factor>,
}

impl FactorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable with `cardinality` labels, returning its index.
    pub fn add_variable(&mut self, cardinality: usize) -> usize {
        self.cardinalities.push(cardinality.max(1));
        self.cardinalities.len() - 1
    }

    /// Add `count` variables of the same cardinality; returns the first index.
    pub fn add_variables(&mut self, count: usize, cardinality: usize) -> usize {
        let first = self.cardinalities.len();
        self.cardinalities
            .extend(std::iter::repeat(cardinality.max(1)).take(count));
        first
    }

    /// Add a factor whose table is filled by evaluating `score` on every joint labelling.
    pub fn add_factor<F>(&mut self, variables: &[usize], mut score: F) -> Result<usize>
    where
        F: FnMut(&[usize]) -> f64,
    {
        if variables.is_empty() {
            return Err(AbstractionError::invalid_param(
                "factor.variables",
                0,
                "a factor needs at least one variable",
            ));
        }
        for (k, &v) in variables.iter().enumerate() {
            if v >= self.cardinalities.len() {
                return Err(AbstractionError::invalid_param(
                    "factor.variables",
                    v,
                    "unknown variable",
                ));
            }
            if variables[..k].contains(&v) {
                return Err(AbstractionError::invalid_param(
                    "factor.variables",
                    v,
                    "variable repeated in one factor",
                ));
            }
        }
        let cardinalities: Vec<usize> = variables.iter().map(|&v| self.cardinalities[v]).collect();
        let size: usize = cardinalities.iter().product();
        let mut factor = Factor {
            variables: variables.to_vec(),
            cardinalities,
            table: Vec::with_capacity(size),
        };
        let mut labels = vec![0usize; variables.len()];
        for index in 0..size {
            factor.labels_of(index, &mut labels);
            factor.table.push(score(&labels));
        }
        self.factors.push(factor);
        Ok(self.factors.len() - 1)
    }

    pub fn n_variables(&self) -> usize {
        self.cardinalities.len()
    }

    pub fn cardinality(&self, variable: usize) -> usize {
        self.cardinalities[variable]
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Total score of a full labelling.
    pub fn evaluate(&self, labels: &[usize]) -> f64 {
        let mut scratch = Vec::with_capacity(3);
        self.factors
            .iter()
            .map(|f| {
                scratch.clear();
                scratch.extend(f.variables.iter().map(|&v| labels[v]));
                f.value(&scratch)
            })
            .sum()
    }
}
