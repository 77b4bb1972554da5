//! Partition functions: split a participant's total response across all of
//! its simultaneous trade opportunities.
//!
//! Every partition returns non-negative shares summing to one (or an empty
//! vector for no opportunities). When the weights degenerate (overflow,
//! underflow to zero, NaN rates) the split falls back to uniform.

use serde::{Deserialize, Serialize};

pub trait PartitionFunction {
    fn partition(&self, rates: &[f64]) -> Vec<f64>;
}

fn uniform(len: usize) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    vec![1.0 / len as f64; len]
}

/// Softmax of `exponents`, shifted by the largest exponent for stability.
fn softmax(exponents: Vec<f64>) -> Vec<f64> {
    let len = exponents.len();
    let peak = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return uniform(len);
    }
    let weights: Vec<f64> = exponents.iter().map(|e| (e - peak).exp()).collect();
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) {
        return uniform(len);
    }
    weights.into_iter().map(|w| w / total).collect()
}

/// Exponential intensity of choice: higher rates attract larger shares.
/// Suited to suppliers, who prefer the best-paying opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpIocPartition {
    pub intensity: f64,
}

impl Default for ExpIocPartition {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl PartitionFunction for ExpIocPartition {
    fn partition(&self, rates: &[f64]) -> Vec<f64> {
        softmax(rates.iter().map(|r| self.intensity * r).collect())
    }
}

/// Inverse exponential intensity of choice: lower rates attract larger
/// shares. Suited to borrowers and buyers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InverseExpIocPartition {
    pub intensity: f64,
}

impl Default for InverseExpIocPartition {
    fn default() -> Self {
        Self { intensity: 1.0 }
    }
}

impl PartitionFunction for InverseExpIocPartition {
    fn partition(&self, rates: &[f64]) -> Vec<f64> {
        softmax(rates.iter().map(|r| -self.intensity * r).collect())
    }
}

/// Equal shares regardless of rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrivialUnbiasedPartition;

impl PartitionFunction for TrivialUnbiasedPartition {
    fn partition(&self, rates: &[f64]) -> Vec<f64> {
        uniform(rates.len())
    }
}
