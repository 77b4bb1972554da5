//! Caller-supplied parameters for clearing algorithms.
//!
//! Every struct here deserializes from JSON and has a `Default`. Values are
//! checked by `validate` when an algorithm is constructed; an invalid value
//! is rejected rather than replaced by a default.

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Parameters shared by every marching algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarchingConfig {
    /// Bisection refinements allowed per edge advance.
    pub max_iterations_per_edge: usize,
    /// An edge whose merit function is smaller than this in magnitude is
    /// left where it is.
    pub accuracy_goal_per_edge: f64,
}

impl MarchingConfig {
    pub fn new(max_iterations_per_edge: usize, accuracy_goal_per_edge: f64) -> Result<Self, ConfigError> {
        let config = Self {
            max_iterations_per_edge,
            accuracy_goal_per_edge,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_tolerance("accuracy_goal_per_edge", self.accuracy_goal_per_edge)
    }
}

impl Default for MarchingConfig {
    fn default() -> Self {
        Self {
            max_iterations_per_edge: 30,
            accuracy_goal_per_edge: 1.0e-10,
        }
    }
}

/// Budgets and tolerances for the Levenberg–Marquardt and Nelder–Mead
/// solvers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub max_iterations: usize,
    /// Maximum number of full network cost evaluations.
    pub max_evaluations: usize,
    pub abs_error_target: f64,
    pub rel_error_target: f64,
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_budget("max_iterations", self.max_iterations)?;
        ConfigError::check_budget("max_evaluations", self.max_evaluations)?;
        ConfigError::check_tolerance("abs_error_target", self.abs_error_target)?;
        ConfigError::check_tolerance("rel_error_target", self.rel_error_target)?;
        if self.abs_error_target == 0.0 && self.rel_error_target == 0.0 {
            return Err(ConfigError::NoErrorTarget);
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            max_evaluations: 10_000,
            abs_error_target: 1.0e-12,
            rel_error_target: 1.0e-10,
        }
    }
}

/// Parameters for the quadratic-model trust region solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustRegionConfig {
    pub max_iterations: usize,
    pub initial_radius: f64,
    pub max_radius: f64,
    /// The solver gives up once the radius shrinks below this.
    pub min_radius: f64,
    /// The solver stops once the network residual is at or below this.
    pub residual_target: f64,
}

impl TrustRegionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::check_budget("max_iterations", self.max_iterations)?;
        ConfigError::check_positive("initial_radius", self.initial_radius)?;
        ConfigError::check_positive("max_radius", self.max_radius)?;
        ConfigError::check_positive("min_radius", self.min_radius)?;
        ConfigError::check_tolerance("residual_target", self.residual_target)?;
        if self.initial_radius > self.max_radius {
            return Err(ConfigError::InvalidPositive {
                name: "max_radius",
                value: self.max_radius,
            });
        }
        Ok(())
    }
}

impl Default for TrustRegionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            initial_radius: 1.0,
            max_radius: 1.0e3,
            min_radius: 1.0e-14,
            residual_target: 1.0e-20,
        }
    }
}

/// Which stopping condition a marching algorithm evaluates after each sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoppingConfig {
    /// Stop once the residual reaches `target`, or after `max_iterations`
    /// sweeps.
    TargetResidual { target: f64, max_iterations: usize },
    /// Stop once the residual has fallen `orders` orders of magnitude below
    /// its value after the first sweep, or after `max_iterations` sweeps.
    OrderOfMagnitude { orders: f64, max_iterations: usize },
}

impl Default for StoppingConfig {
    fn default() -> Self {
        StoppingConfig::TargetResidual {
            target: 1.0e-4,
            max_iterations: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marching_config_rejects_negative_accuracy() {
        assert!(MarchingConfig::new(10, 1e-10).is_ok());
        assert!(MarchingConfig::new(10, 0.0).is_ok());
        assert_eq!(
            MarchingConfig::new(10, -1e-10),
            Err(ConfigError::InvalidTolerance {
                name: "accuracy_goal_per_edge",
                value: -1e-10
            })
        );
    }

    #[test]
    fn test_optimizer_config_validation() {
        assert!(OptimizerConfig::default().validate().is_ok());
        let zero_iterations = OptimizerConfig {
            max_iterations: 0,
            ..Default::default()
        };
        assert!(zero_iterations.validate().is_err());
        let no_target = OptimizerConfig {
            abs_error_target: 0.0,
            rel_error_target: 0.0,
            ..Default::default()
        };
        assert_eq!(no_target.validate(), Err(ConfigError::NoErrorTarget));
    }

    #[test]
    fn test_trust_region_config_validation() {
        assert!(TrustRegionConfig::default().validate().is_ok());
        let inverted = TrustRegionConfig {
            initial_radius: 10.0,
            max_radius: 1.0,
            ..Default::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: MarchingConfig = serde_json::from_str(r#"{"max_iterations_per_edge": 50}"#).unwrap();
        assert_eq!(config.max_iterations_per_edge, 50);
        assert_eq!(config.accuracy_goal_per_edge, 1.0e-10);
    }

    #[test]
    fn test_stopping_config_json() {
        let config: StoppingConfig =
            serde_json::from_str(r#"{"kind": "order_of_magnitude", "orders": 6, "max_iterations": 40}"#)
                .unwrap();
        assert_eq!(
            config,
            StoppingConfig::OrderOfMagnitude {
                orders: 6.0,
                max_iterations: 40
            }
        );
    }
}
