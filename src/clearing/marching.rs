//! The shared marching skeleton: seed, sweep every edge in order, stop.
//!
//! A sweep visits edges in list order and each edge's advance observes the
//! rates committed by earlier edges in the same sweep (Gauss-Seidel). What
//! differs between marching variants (seeding, the per-edge direction
//! choice, pre- and post-sweep hooks) lives behind [`MarchingStrategy`].

use crate::clearing::bisection::ValueBisector;
use crate::clearing::stopping::StoppingCondition;
use crate::clearing::ClearingAlgorithm;
use crate::core::config::MarchingConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::core::response::is_unbounded;
use crate::graph::network::MixedClearingNetwork;
use log::{debug, info, warn};

/// Attempts allowed when searching an unbounded domain for a sign change.
pub const MAX_BRACKET_EXPANSIONS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchDirection {
    /// Bisect over `[current, max]` and commit the lower bracket bound.
    Upward,
    /// Bisect over `[0, current]` and commit the upper bracket bound.
    Downward,
}

/// How one edge should be advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orientation {
    /// Whether the merit function falls as the rate rises.
    pub descending: bool,
    pub direction: MarchDirection,
}

/// Variant-specific behaviour plugged into [`MarchingClearingAlgorithm`].
pub trait MarchingStrategy<P> {
    fn name(&self) -> &'static str;

    /// Runs once per clearing, before seeding.
    fn pre_march(&mut self, _network: &mut MixedClearingNetwork<P>) {}

    fn seed_rates(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError>;

    /// Classify edge `edge`, given its merit at the current rate and at
    /// both ends of its admissible range.
    fn orient(&self, edge: usize, current: f64, at_minimum: f64, at_maximum: f64) -> Orientation;

    /// Distance edge `edge` moved during the sweep just made.
    fn record_step(&mut self, _edge: usize, _distance: f64) {}

    /// Runs after every sweep, once all responses are fresh and before the
    /// residual is taken.
    fn post_march(&mut self, _network: &mut MixedClearingNetwork<P>) {}
}

/// Marching clearing algorithm parameterized by its variant.
pub struct MarchingClearingAlgorithm<S> {
    strategy: S,
    config: MarchingConfig,
    stopping: Box<dyn StoppingCondition>,
    sweeps: usize,
}

impl<S> MarchingClearingAlgorithm<S> {
    pub fn new(
        strategy: S,
        config: MarchingConfig,
        stopping: Box<dyn StoppingCondition>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            strategy,
            config,
            stopping,
            sweeps: 0,
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn config(&self) -> &MarchingConfig {
        &self.config
    }

    /// Sweeps made by the most recent clearing run.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
}

impl<P, S: MarchingStrategy<P>> ClearingAlgorithm<P> for MarchingClearingAlgorithm<S> {
    fn name(&self) -> &str {
        self.strategy.name()
    }

    fn apply_to_network(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<f64, ClearingError> {
        if network.number_of_edges() == 0 {
            return Err(ClearingError::EmptyNetwork);
        }
        self.stopping.reset();
        self.sweeps = 0;

        self.strategy.pre_march(network);
        let seeds = self.strategy.seed_rates(network)?;
        for (edge, &rate) in seeds.iter().enumerate() {
            network.set_edge_rate(edge, rate);
        }
        network.update_all_vertex_responses();
        debug!(
            "{}: seeded {} edges, residual {:.6e}",
            self.strategy.name(),
            seeds.len(),
            network.residual_cost()
        );

        loop {
            for edge in 0..network.number_of_edges() {
                let distance = advance_over_edge(network, edge, &self.config, &self.strategy);
                self.strategy.record_step(edge, distance);
            }
            network.flag_and_update_all_edges();
            self.strategy.post_march(network);
            let residual = network.residual_cost();
            self.sweeps += 1;
            debug!("{}: sweep {} residual {:.10e}", self.strategy.name(), self.sweeps, residual);
            if self.stopping.is_satisfied(residual) {
                info!(
                    "{}: stopped after {} sweeps with residual {:.6e}",
                    self.strategy.name(),
                    self.sweeps,
                    residual
                );
                return Ok(residual);
            }
        }
    }
}

/// Advance one edge toward its local root and return the distance moved.
///
/// An edge whose merit is already within the accuracy goal is left alone.
/// Otherwise the edge snaps to an end of its admissible range when the
/// merit signs there say the root lies beyond it, and bisects toward the
/// root otherwise. A failed search restores the pre-advance rate.
pub fn advance_over_edge<P, S: MarchingStrategy<P> + ?Sized>(
    network: &mut MixedClearingNetwork<P>,
    edge: usize,
    config: &MarchingConfig,
    strategy: &S,
) -> f64 {
    let existing = network.edge_rate(edge);
    let current = network.evaluate_edge_at(edge, existing);
    if current == 0.0 || current.abs() < config.accuracy_goal_per_edge {
        return 0.0;
    }

    let mut maximum = network.maximum_rate_admissible_by_both_parties(edge);
    let at_minimum = network.evaluate_edge_at(edge, 0.0);
    let at_maximum = network.evaluate_edge_at(edge, maximum);
    let orientation = strategy.orient(edge, current, at_minimum, at_maximum);

    let snapped = if orientation.descending {
        if at_maximum >= 0.0 {
            Some(maximum)
        } else if at_minimum <= 0.0 {
            Some(0.0)
        } else {
            None
        }
    } else if at_maximum <= 0.0 {
        Some(maximum)
    } else if at_minimum >= 0.0 {
        Some(0.0)
    } else {
        None
    };

    let result = match snapped {
        Some(rate) => rate,
        None => {
            let bisector = ValueBisector::new(config.max_iterations_per_edge);
            match orientation.direction {
                MarchDirection::Upward => {
                    if is_unbounded(maximum) {
                        match expand_bracket(network, edge, existing) {
                            Some(upper) => maximum = upper,
                            None => {
                                warn!(
                                    "edge {}: no sign change found above rate {}; reverting",
                                    edge, existing
                                );
                                network.evaluate_edge_at(edge, existing);
                                return 0.0;
                            }
                        }
                    }
                    match bisector.bisect(|r| network.evaluate_edge_at(edge, r), existing, maximum, 0.0) {
                        Ok(bracket) => bracket.lower,
                        Err(err) => {
                            debug!("edge {}: upward bisection abandoned: {}", edge, err);
                            network.evaluate_edge_at(edge, existing);
                            return 0.0;
                        }
                    }
                }
                MarchDirection::Downward => {
                    match bisector.bisect(|r| network.evaluate_edge_at(edge, r), 0.0, existing, 0.0) {
                        Ok(bracket) => bracket.upper,
                        Err(err) => {
                            debug!("edge {}: downward bisection abandoned: {}", edge, err);
                            network.evaluate_edge_at(edge, existing);
                            return 0.0;
                        }
                    }
                }
            }
        }
    };

    network.set_edge_rate(edge, result);
    network.flag_edge(edge);
    result - existing
}

/// Search upward from `existing` by decuple steps for a rate whose merit
/// differs in sign from the merit at `existing`.
fn expand_bracket<P>(network: &mut MixedClearingNetwork<P>, edge: usize, existing: f64) -> Option<f64> {
    let lower = network.evaluate_edge_at(edge, existing);
    let mut upper = (existing * 10.0).max(1.0);
    for _ in 0..MAX_BRACKET_EXPANSIONS {
        if !(network.evaluate_edge_at(edge, upper) * lower > 0.0) {
            return Some(upper);
        }
        upper *= 10.0;
    }
    None
}

/// Classification used by the Ascent and Descent variants: descending when
/// the merit at the maximum rate is strictly below the merit at zero.
pub(crate) fn strictly_descending(at_minimum: f64, at_maximum: f64) -> bool {
    at_maximum < at_minimum
}

/// Direction rule of the Adaptive and Shotgun variants: march toward the
/// maximum rate when the current merit sign says the root lies above.
pub(crate) fn direction_toward_root(current: f64, descending: bool) -> MarchDirection {
    if (current < 0.0 && !descending) || (current > 0.0 && descending) {
        MarchDirection::Upward
    } else {
        MarchDirection::Downward
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::ascent::AscentMarch;
    use crate::clearing::test_support::{linear, linear_scenario, parallel_network};
    use crate::core::response::UNBOUNDED_RATE;
    use crate::response::partitioned::UnivariateResponseFunction;
    use crate::response::shapes::LinearResponse;
    use approx::assert_abs_diff_eq;

    fn config() -> MarchingConfig {
        MarchingConfig::new(30, 1e-10).unwrap()
    }

    #[test]
    fn test_cleared_edge_is_left_unchanged() {
        let mut network = linear_scenario(1);
        let root = 100.0 / 15.0;
        network.set_edge_rate(0, root);
        network.update_all_vertex_responses();
        let loose = MarchingConfig::new(30, 1e-6).unwrap();
        let moved = advance_over_edge(&mut network, 0, &loose, &AscentMarch);
        assert_eq!(moved, 0.0);
        assert_eq!(network.edge_rate(0), root);
    }

    #[test]
    fn test_upward_advance_commits_lower_bound() {
        let mut network = linear_scenario(1);
        network.update_all_vertex_responses();
        let moved = advance_over_edge(&mut network, 0, &config(), &AscentMarch);
        let root = 100.0 / 15.0;
        assert!(moved > 0.0);
        assert!(network.edge_rate(0) <= root);
        assert_abs_diff_eq!(network.edge_rate(0), root, epsilon = 1e-7);
    }

    #[test]
    fn test_snaps_to_maximum_when_root_lies_beyond() {
        // Merit 100 - r on [0, 10]: positive over the whole range.
        let mut network = parallel_network(linear(100.0, -0.5, 10.0), linear(0.0, -0.5, 10.0), 1);
        network.update_all_vertex_responses();
        advance_over_edge(&mut network, 0, &config(), &AscentMarch);
        assert_eq!(network.edge_rate(0), 10.0);
    }

    #[test]
    fn test_unbounded_domain_expands_bracket() {
        let unbounded = |i: f64, s: f64| -> Box<dyn crate::core::response::MarketResponseFunction> {
            Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::unbounded(i, s))))
        };
        // Merit 1000 - r, root at 1000, domain unbounded.
        let mut network = parallel_network(unbounded(1000.0, -0.5), unbounded(0.0, -0.5), 1);
        network.update_all_vertex_responses();
        assert_eq!(network.maximum_rate_admissible_by_both_parties(0), UNBOUNDED_RATE);
        advance_over_edge(&mut network, 0, &MarchingConfig::new(200, 1e-10).unwrap(), &AscentMarch);
        assert_abs_diff_eq!(network.edge_rate(0), 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_direction_rule() {
        assert_eq!(direction_toward_root(-1.0, false), MarchDirection::Upward);
        assert_eq!(direction_toward_root(1.0, true), MarchDirection::Upward);
        assert_eq!(direction_toward_root(1.0, false), MarchDirection::Downward);
        assert_eq!(direction_toward_root(-1.0, true), MarchDirection::Downward);
        assert!(strictly_descending(1.0, 0.0));
        assert!(!strictly_descending(1.0, 1.0));
    }
}
