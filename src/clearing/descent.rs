use crate::clearing::marching::{strictly_descending, MarchDirection, MarchingClearingAlgorithm, MarchingStrategy, Orientation};
use crate::clearing::seed::{DescentSeed, SeedSelection};
use crate::clearing::stopping::StoppingCondition;
use crate::core::config::MarchingConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;

/// Marches every edge downward from a seed just below its maximum rate.
///
/// Requires a bounded admissible domain on every edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescentMarch;

impl DescentMarch {
    pub fn algorithm(
        config: MarchingConfig,
        stopping: Box<dyn StoppingCondition>,
    ) -> Result<MarchingClearingAlgorithm<Self>, ConfigError> {
        MarchingClearingAlgorithm::new(DescentMarch, config, stopping)
    }
}

impl<P> MarchingStrategy<P> for DescentMarch {
    fn name(&self) -> &'static str {
        "descent march"
    }

    fn seed_rates(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        DescentSeed.find_seed_rates(network)
    }

    fn orient(&self, _edge: usize, _current: f64, at_minimum: f64, at_maximum: f64) -> Orientation {
        Orientation {
            descending: strictly_descending(at_minimum, at_maximum),
            direction: MarchDirection::Downward,
        }
    }
}
