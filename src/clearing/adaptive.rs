use crate::clearing::line_search::BrentLineSearch;
use crate::clearing::marching::{direction_toward_root, MarchingClearingAlgorithm, MarchingStrategy, Orientation};
use crate::clearing::seed::{SeedSelection, ZeroSeed};
use crate::clearing::stopping::StoppingCondition;
use crate::core::config::MarchingConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use log::debug;

/// Marches each edge toward its root in whichever direction the merit sign
/// indicates, then polishes every sweep with a line search along the
/// sweep's combined step.
///
/// Edges are classified once per clearing, before seeding, as descending
/// when the merit at the maximum admissible rate is no greater than the
/// merit at zero.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveMarch {
    descending: Vec<bool>,
    last_step: Vec<f64>,
    line_search: BrentLineSearch,
}

impl AdaptiveMarch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn algorithm(
        config: MarchingConfig,
        stopping: Box<dyn StoppingCondition>,
    ) -> Result<MarchingClearingAlgorithm<Self>, ConfigError> {
        MarchingClearingAlgorithm::new(Self::new(), config, stopping)
    }

    /// Per-edge classification from the most recent clearing.
    pub fn descending(&self) -> &[bool] {
        &self.descending
    }
}

impl<P> MarchingStrategy<P> for AdaptiveMarch {
    fn name(&self) -> &'static str {
        "adaptive march"
    }

    fn pre_march(&mut self, network: &mut MixedClearingNetwork<P>) {
        let edges = network.number_of_edges();
        self.descending = (0..edges)
            .map(|edge| {
                let maximum = network.maximum_rate_admissible_by_both_parties(edge);
                let at_minimum = network.evaluate_edge_at(edge, 0.0);
                let at_maximum = network.evaluate_edge_at(edge, maximum);
                at_maximum <= at_minimum
            })
            .collect();
        self.last_step = vec![0.0; edges];
    }

    fn seed_rates(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        // Zero seed without the ascent sign check, relaxed on purpose: the
        // recorded orientation and the current merit sign pick each edge's
        // direction, so a negative merit at zero needs no rejection.
        ZeroSeed.find_seed_rates(network)
    }

    fn orient(&self, edge: usize, current: f64, _at_minimum: f64, _at_maximum: f64) -> Orientation {
        let descending = self.descending[edge];
        Orientation {
            descending,
            direction: direction_toward_root(current, descending),
        }
    }

    fn record_step(&mut self, edge: usize, distance: f64) {
        self.last_step[edge] = distance;
    }

    fn post_march(&mut self, network: &mut MixedClearingNetwork<P>) {
        let start = network.edge_rates();
        let minima = vec![0.0; start.len()];
        let maxima = network.maximum_admissible_rates();
        let result = self.line_search.search(
            |rates: &[f64]| {
                network.set_edge_rates(rates);
                network.residual_cost()
            },
            &start,
            &self.last_step,
            &minima,
            &maxima,
        );
        debug!(
            "adaptive march: line search travelled {:.6e}, residual {:.6e}",
            result.distance, result.value
        );
        network.set_edge_rates(&result.point);
    }
}
