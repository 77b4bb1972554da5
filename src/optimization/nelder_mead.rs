use crate::clearing::ClearingAlgorithm;
use crate::core::config::OptimizerConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use crate::optimization::objective::{values_converged, NetworkObjective};
use log::info;

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINKAGE: f64 = 0.5;

struct Vertex {
    point: Vec<f64>,
    value: f64,
}

/// Derivative-free simplex minimisation of the network residual.
///
/// The initial simplex spans one unit along each edge rate from the start
/// point. Every vertex is projected into the admissible box.
#[derive(Debug, Clone)]
pub struct NelderMead {
    config: OptimizerConfig,
    iterations: usize,
}

impl NelderMead {
    pub fn new(config: OptimizerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, iterations: 0 })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}

fn affine(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(&a, &b)| a + t * (b - a)).collect()
}

fn evaluate<P>(objective: &mut NetworkObjective<'_, P>, point: &[f64]) -> Vertex {
    let point = objective.project(point);
    let value = objective.residual(&point);
    Vertex { point, value }
}

impl<P> ClearingAlgorithm<P> for NelderMead {
    fn name(&self) -> &str {
        "nelder-mead"
    }

    fn apply_to_network(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<f64, ClearingError> {
        if network.number_of_edges() == 0 {
            return Err(ClearingError::EmptyNetwork);
        }
        let mut objective = NetworkObjective::new(network);
        let n = objective.dimension();
        let start = objective.start_point();
        let maxima = objective.maxima().to_vec();

        let mut simplex = Vec::with_capacity(n + 1);
        simplex.push(evaluate(&mut objective, &start));
        for i in 0..n {
            let mut point = start.clone();
            point[i] += if start[i] + 1.0 <= maxima[i] { 1.0 } else { -1.0 };
            simplex.push(evaluate(&mut objective, &point));
        }
        simplex.sort_by(|a, b| a.value.total_cmp(&b.value));
        self.iterations = 0;

        while self.iterations < self.config.max_iterations
            && objective.evaluations() < self.config.max_evaluations
        {
            self.iterations += 1;
            let previous: Vec<f64> = simplex.iter().map(|v| v.value).collect();

            let mut centroid = vec![0.0; n];
            for vertex in &simplex[..n] {
                for (c, x) in centroid.iter_mut().zip(&vertex.point) {
                    *c += x / n as f64;
                }
            }
            let best = simplex[0].value;
            let second_worst = simplex[n - 1].value;
            let worst = simplex[n].value;

            let reflected = evaluate(&mut objective, &affine(&centroid, &simplex[n].point, -REFLECTION));
            let replacement = if reflected.value < best {
                let expanded = evaluate(
                    &mut objective,
                    &affine(&centroid, &reflected.point, EXPANSION),
                );
                Some(if expanded.value < reflected.value { expanded } else { reflected })
            } else if reflected.value < second_worst {
                Some(reflected)
            } else if reflected.value < worst {
                let contracted = evaluate(
                    &mut objective,
                    &affine(&centroid, &reflected.point, CONTRACTION),
                );
                (contracted.value <= reflected.value).then_some(contracted)
            } else {
                let contracted = evaluate(
                    &mut objective,
                    &affine(&centroid, &simplex[n].point, CONTRACTION),
                );
                (contracted.value < worst).then_some(contracted)
            };

            match replacement {
                Some(vertex) => simplex[n] = vertex,
                None => {
                    let anchor = simplex[0].point.clone();
                    for i in 1..=n {
                        let shrunk = affine(&anchor, &simplex[i].point, SHRINKAGE);
                        simplex[i] = evaluate(&mut objective, &shrunk);
                    }
                }
            }
            simplex.sort_by(|a, b| a.value.total_cmp(&b.value));

            let converged = previous.iter().zip(&simplex).all(|(&p, v)| {
                values_converged(p, v.value, self.config.rel_error_target, self.config.abs_error_target)
            });
            if converged {
                break;
            }
        }

        let residual = objective.residual(&simplex[0].point);
        info!(
            "nelder-mead: {} iterations, {} evaluations, residual {:.6e}",
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
    use crate::clearing::test_support::{bipartite_network, linear_scenario};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_linear_scenario_converges() {
        let mut network = linear_scenario(2);
        let mut solver = NelderMead::new(OptimizerConfig::default()).unwrap();
        let residual = network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(residual < 1e-6);
        for rate in network.edge_rates() {
            assert_abs_diff_eq!(rate, 100.0 / 15.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_rates_stay_in_domain() {
        let mut network = bipartite_network();
        let mut solver = NelderMead::new(OptimizerConfig::default()).unwrap();
        network.apply_clearing_algorithm(&mut solver).unwrap();
        for (rate, max) in network.edge_rates().into_iter().zip(network.maximum_admissible_rates()) {
            assert!(rate >= 0.0 && rate <= max);
        }
    }

    #[test]
    fn test_evaluation_budget_is_respected() {
        let config = OptimizerConfig {
            max_evaluations: 10,
            ..Default::default()
        };
        let mut network = bipartite_network();
        let mut solver = NelderMead::new(config).unwrap();
        network.apply_clearing_algorithm(&mut solver).unwrap();
        assert!(solver.iterations() <= 10);
    }
}
