use crate::clearing::ClearingAlgorithm;
use crate::core::config::TrustRegionConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use crate::optimization::linalg::{dot, multiply, norm, normal_matrix, solve, transpose_multiply, Matrix};
use crate::optimization::objective::NetworkObjective;
use log::{debug, info};

/// Minimum ratio of actual to predicted reduction for a step to be taken.
const ACCEPTANCE_RATIO: f64 = 1.0e-4;

/// Quadratic-model trust region minimisation of the summed squared costs.
///
/// The model is the Gauss-Newton approximation `½‖c + J·s‖²`; each step is
/// the dogleg between the Cauchy point and the Gauss-Newton point.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    config: TrustRegionConfig,
    iterations: usize,
}

impl TrustRegion {
    pub fn new(config: TrustRegionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, iterations: 0 })
    }

    pub fn config(&self) -> &TrustRegionConfig {
        &self.config
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

fn scale(v: &[f64], s: f64) -> Vec<f64> {
    v.iter().map(|x| x * s).collect()
}

/// Dogleg step inside a ball of `radius`.
fn dogleg(gradient: &[f64], hessian: &Matrix, radius: f64) -> Vec<f64> {
    let gradient_norm = norm(gradient);
    let curvature = dot(gradient, &multiply(hessian, gradient));
    let cauchy = if curvature > 0.0 {
        scale(gradient, -dot(gradient, gradient) / curvature)
    } else {
        scale(gradient, -radius / gradient_norm)
    };
    let cauchy_norm = norm(&cauchy);
    if cauchy_norm >= radius {
        return scale(&cauchy, radius / cauchy_norm);
    }

    let rhs: Vec<f64> = gradient.iter().map(|g| -g).collect();
    let Some(newton) = solve(hessian.clone(), rhs) else {
        return cauchy;
    };
    if norm(&newton) <= radius {
        return newton;
    }

    let d: Vec<f64> = newton.iter().zip(&cauchy).map(|(n, c)| n - c).collect();
    let a = dot(&d, &d);
    let b = 2.0 * dot(&cauchy, &d);
    let c = cauchy_norm * cauchy_norm - radius * radius;
    let tau = (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a);
    cauchy.iter().zip(&d).map(|(c, d)| c + tau * d).collect()
}

impl<P> ClearingAlgorithm<P> for TrustRegion {
    fn name(&self) -> &str {
        "trust region"
    }

    fn apply_to_network(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<f64, ClearingError> {
        let edges = network.number_of_edges();
        if edges == 0 {
            return Err(ClearingError::EmptyNetwork);
        }
        let mut objective = NetworkObjective::new(network);
        let mut x = objective.start_point();
        let mut costs = objective.costs(&x);
        let mut half_sum = 0.5 * dot(&costs, &costs);
        let mut radius = self.config.initial_radius;
        self.iterations = 0;

        while self.iterations < self.config.max_iterations {
            if 2.0 * half_sum / edges as f64 <= self.config.residual_target {
                break;
            }
            self.iterations += 1;
            let jacobian = objective.jacobian(&x);
            let gradient = transpose_multiply(&jacobian, &costs);
            if norm(&gradient) == 0.0 {
                debug!("trust region: zero gradient");
                break;
            }
            let hessian = normal_matrix(&jacobian);

            let step = dogleg(&gradient, &hessian, radius);
            let trial: Vec<f64> = x.iter().zip(&step).map(|(x, s)| x + s).collect();
            let trial = objective.project(&trial);
            let taken: Vec<f64> = trial.iter().zip(&x).map(|(t, x)| t - x).collect();
            let taken_norm = norm(&taken);

            let predicted = -(dot(&gradient, &taken) + 0.5 * dot(&taken, &multiply(&hessian, &taken)));
            let trial_costs = objective.costs(&trial);
            let trial_half_sum = 0.5 * dot(&trial_costs, &trial_costs);
            let ratio = if predicted > 0.0 {
                (half_sum - trial_half_sum) / predicted
            } else {
                -1.0
            };

            if ratio < 0.25 {
                radius = 0.25 * taken_norm.min(radius);
            } else if ratio > 0.75 && taken_norm >= 0.99 * radius {
                radius = (2.0 * radius).min(self.config.max_radius);
            }
            if ratio > ACCEPTANCE_RATIO {
                x = trial;
                costs = trial_costs;
                half_sum = trial_half_sum;
            }
            if radius < self.config.min_radius {
                debug!("trust region: radius collapsed to {:.1e}", radius);
                break;
            }
        }

        let residual = objective.residual(&x);
        info!(
            "trust region: {} iterations, {} evaluations, residual {:.6e}",
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
    fn test_dogleg_regimes() {
        let hessian = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let gradient = [-3.0, -4.0];
        // Newton point (3, 4) inside the region.
        let step = dogleg(&gradient, &hessian, 10.0);
        assert_abs_diff_eq!(step[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(step[1], 4.0, epsilon = 1e-12);
        // Truncated to the boundary.
        let step = dogleg(&gradient, &hessian, 1.0);
        assert_abs_diff_eq!(norm(&step), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_dogleg_between_cauchy_and_newton() {
        let hessian = vec![vec![1.0, 0.0], vec![0.0, 10.0]];
        let gradient = [-1.0, -10.0];
        // Cauchy point has norm ~1.01, Newton point (1, 1) has norm ~1.41.
        let step = dogleg(&gradient, &hessian, 1.2);
        assert_abs_diff_eq!(norm(&step), 1.2, epsilon = 1e-12);
        assert!(step[0] > 0.0 && step[1] > 0.0);
    }

    #[test]
    fn test_linear_scenario_converges() {
        let mut network = linear_scenario(2);
        let mut solver = TrustRegion::new(TrustRegionConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(residual < 1e-12);
        for rate in network.edge_rates() {
            assert_abs_diff_eq!(rate, 100.0 / 15.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_bipartite_network_converges() {
        let mut network = bipartite_network();
        let mut solver = TrustRegion::new(TrustRegionConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(residual < 1e-12);
        assert_abs_diff_eq!(network.edge_rate(3), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_root_beyond_domain_stops_on_bound() {
        let mut network = parallel_network(linear(50.0, -0.5, 10.0), linear(0.0, -0.5, 10.0), 1);
        let mut solver = TrustRegion::new(TrustRegionConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert_abs_diff_eq!(network.edge_rate(0), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(residual, 1600.0, epsilon = 1e-6);
    }
}
