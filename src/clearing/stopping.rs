use crate::core::config::StoppingConfig;
use crate::core::error::ConfigError;

/// Decides, once per marching sweep, whether iteration should end.
///
/// Conditions are stateful: they count sweeps and may capture early
/// residuals. `reset` is called before every clearing run.
pub trait StoppingCondition {
    /// Called exactly once per sweep with the up-to-date network residual.
    fn is_satisfied(&mut self, residual: f64) -> bool;

    fn reset(&mut self);
}

/// Stop once the residual is at or below a target, or after a fixed number
/// of sweeps.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetResidualOrMaximumIterations {
    target: f64,
    max_iterations: usize,
    iterations: usize,
}

impl TargetResidualOrMaximumIterations {
    pub fn new(target: f64, max_iterations: usize) -> Result<Self, ConfigError> {
        ConfigError::check_tolerance("target", target)?;
        ConfigError::check_budget("max_iterations", max_iterations)?;
        Ok(Self {
            target,
            max_iterations,
            iterations: 0,
        })
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

impl StoppingCondition for TargetResidualOrMaximumIterations {
    fn is_satisfied(&mut self, residual: f64) -> bool {
        self.iterations += 1;
        residual <= self.target || self.iterations >= self.max_iterations
    }

    fn reset(&mut self) {
        self.iterations = 0;
    }
}

/// Stop once the residual has fallen a number of orders of magnitude below
/// the residual seen on the first sweep, or after a fixed number of sweeps.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderOfMagnitudeReductionOrMaximumIterations {
    orders: f64,
    max_iterations: usize,
    delegate: Option<TargetResidualOrMaximumIterations>,
}

impl OrderOfMagnitudeReductionOrMaximumIterations {
    pub fn new(orders: f64, max_iterations: usize) -> Result<Self, ConfigError> {
        ConfigError::check_tolerance("orders", orders)?;
        ConfigError::check_budget("max_iterations", max_iterations)?;
        Ok(Self {
            orders,
            max_iterations,
            delegate: None,
        })
    }

    /// The residual target, once the first sweep has been seen.
    pub fn target(&self) -> Option<f64> {
        self.delegate.as_ref().map(TargetResidualOrMaximumIterations::target)
    }
}

impl StoppingCondition for OrderOfMagnitudeReductionOrMaximumIterations {
    fn is_satisfied(&mut self, residual: f64) -> bool {
        let orders = self.orders;
        let max_iterations = self.max_iterations;
        let delegate = self.delegate.get_or_insert_with(|| TargetResidualOrMaximumIterations {
            target: (residual * 10f64.powf(-orders)).max(0.0),
            max_iterations,
            iterations: 0,
        });
        delegate.is_satisfied(residual)
    }

    fn reset(&mut self) {
        self.delegate = None;
    }
}

impl StoppingConfig {
    pub fn build(&self) -> Result<Box<dyn StoppingCondition>, ConfigError> {
        Ok(match *self {
            StoppingConfig::TargetResidual { target, max_iterations } => {
                Box::new(TargetResidualOrMaximumIterations::new(target, max_iterations)?)
            }
            StoppingConfig::OrderOfMagnitude { orders, max_iterations } => {
                Box::new(OrderOfMagnitudeReductionOrMaximumIterations::new(orders, max_iterations)?)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_target_residual_stops_on_target() {
        let mut condition = TargetResidualOrMaximumIterations::new(1e-4, 100).unwrap();
        assert!(!condition.is_satisfied(1.0));
        assert!(!condition.is_satisfied(1e-3));
        assert!(condition.is_satisfied(1e-4));
        assert_eq!(condition.iterations(), 3);
    }

    #[test]
    fn test_target_residual_stops_on_iteration_limit() {
        let mut condition = TargetResidualOrMaximumIterations::new(0.0, 3).unwrap();
        assert!(!condition.is_satisfied(1.0));
        assert!(!condition.is_satisfied(1.0));
        assert!(condition.is_satisfied(1.0));
        condition.reset();
        assert!(!condition.is_satisfied(1.0));
    }

    #[test]
    fn test_order_of_magnitude_captures_first_residual() {
        let mut condition = OrderOfMagnitudeReductionOrMaximumIterations::new(2.0, 50).unwrap();
        assert_eq!(condition.target(), None);
        assert!(!condition.is_satisfied(10.0));
        assert_relative_eq!(condition.target().unwrap(), 0.1, max_relative = 1e-12);
        assert!(!condition.is_satisfied(0.5));
        assert!(condition.is_satisfied(0.05));

        condition.reset();
        assert!(!condition.is_satisfied(1.0));
        assert_relative_eq!(condition.target().unwrap(), 0.01, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_conditions_are_rejected() {
        assert!(TargetResidualOrMaximumIterations::new(-1e-4, 10).is_err());
        assert!(TargetResidualOrMaximumIterations::new(1e-4, 0).is_err());
        assert!(OrderOfMagnitudeReductionOrMaximumIterations::new(f64::NAN, 10).is_err());
        assert!(StoppingConfig::TargetResidual {
            target: -1.0,
            max_iterations: 5
        }
        .build()
        .is_err());
    }
}
