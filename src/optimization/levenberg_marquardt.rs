use crate::clearing::ClearingAlgorithm;
use crate::core::config::OptimizerConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use crate::optimization::linalg::{dot, normal_matrix, solve, transpose_multiply};
use crate::optimization::objective::{values_converged, NetworkObjective};
use log::{debug, info, warn};

const INITIAL_DAMPING: f64 = 1.0e-3;
const MAXIMUM_DAMPING: f64 = 1.0e16;

/// Least-squares fit of every edge cost against zero.
///
/// Damped Gauss-Newton steps with Marquardt's diagonal scaling over the
/// sparse finite-difference Jacobian. Trial points are projected into the
/// admissible box, so the fit may stop on a bound when the root lies
/// outside it.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    config: OptimizerConfig,
    iterations: usize,
}

impl LevenbergMarquardt {
    pub fn new(config: OptimizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, iterations: 0 })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Outer iterations made by the most recent run.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn costs_converged(&self, previous: &[f64], current: &[f64]) -> bool {
        previous.iter().zip(current).all(|(&p, &c)| {
            values_converged(p, c, self.config.rel_error_target, self.config.abs_error_target)
        })
    }
}

impl<P> ClearingAlgorithm<P> for LevenbergMarquardt {
    fn name(&self) -> &str {
        "levenberg-marquardt"
    }

    fn apply_to_network(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<f64, ClearingError> {
        if network.number_of_edges() == 0 {
            return Err(ClearingError::EmptyNetwork);
        }
        let mut objective = NetworkObjective::new(network);
        let n = objective.dimension();
        let mut x = objective.start_point();
        let mut costs = objective.costs(&x);
        let mut sum_of_squares = dot(&costs, &costs);
        let mut damping = INITIAL_DAMPING;
        self.iterations = 0;

        'outer: while self.iterations < self.config.max_iterations && sum_of_squares > 0.0 {
            self.iterations += 1;
            let jacobian = objective.jacobian(&x);
            let gradient = transpose_multiply(&jacobian, &costs);
            let normal = normal_matrix(&jacobian);

            loop {
                if objective.evaluations() >= self.config.max_evaluations {
                    debug!("levenberg-marquardt: evaluation budget exhausted");
                    break 'outer;
                }
                let mut damped = normal.clone();
                for (i, row) in damped.iter_mut().enumerate() {
                    row[i] += damping * normal[i][i].max(f64::MIN_POSITIVE);
                }
                let rhs: Vec<f64> = gradient.iter().map(|g| -g).collect();
                let Some(step) = solve(damped, rhs) else {
                    damping *= 10.0;
                    if damping > MAXIMUM_DAMPING {
                        warn!("levenberg-marquardt: damped normal equations are singular");
                        break 'outer;
                    }
                    continue;
                };

                let trial: Vec<f64> = (0..n).map(|i| x[i] + step[i]).collect();
                let trial = objective.project(&trial);
                let trial_costs = objective.costs(&trial);
                let trial_sum = dot(&trial_costs, &trial_costs);
                if trial_sum < sum_of_squares {
                    damping = (damping / 10.0).max(f64::EPSILON);
                    let converged = self.costs_converged(&costs, &trial_costs);
                    x = trial;
                    costs = trial_costs;
                    sum_of_squares = trial_sum;
                    if converged {
                        break 'outer;
                    }
                    break;
                }
                damping *= 10.0;
                if damping > MAXIMUM_DAMPING {
                    debug!("levenberg-marquardt: no improving step at damping {:.1e}", damping);
                    break 'outer;
                }
            }
        }

        let residual = objective.residual(&x);
        info!(
            "levenberg-marquardt: {} iterations, {} evaluations, residual {:.6e}",
            self.iterations,
            objective.evaluations(),
            residual
        );
        Ok(residual)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::test_support::{bipartite_network, linear, linear_scenario, parallel_network};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_scenario_converges() {
        let mut network = linear_scenario(2);
        let mut solver = LevenbergMarquardt::new(OptimizerConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(residual < 1e-12);
        for rate in network.edge_rates() {
            assert_abs_diff_eq!(rate, 100.0 / 15.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bipartite_network_converges() {
        let mut network = bipartite_network();
        let mut solver = LevenbergMarquardt::new(OptimizerConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(residual < 1e-12);
        assert_abs_diff_eq!(network.edge_rate(0), 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(network.edge_rate(1), 4.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_root_beyond_domain_stops_on_bound() {
        // Merit 50 - r on [0, 10] never reaches zero.
        let mut network = parallel_network(linear(50.0, -0.5, 10.0), linear(0.0, -0.5, 10.0), 1);
        let mut solver = LevenbergMarquardt::new(OptimizerConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert_abs_diff_eq!(network.edge_rate(0), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(residual, 1600.0, epsilon = 1e-6);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OptimizerConfig {
            max_evaluations: 0,
            ..Default::default()
        };
        assert!(LevenbergMarquardt::new(config).is_err());
    }
}
