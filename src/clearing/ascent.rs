use crate::clearing::marching::{strictly_descending, MarchDirection, MarchingClearingAlgorithm, MarchingStrategy, Orientation};
use crate::clearing::seed::{AscentSeed, SeedSelection};
use crate::clearing::stopping::StoppingCondition;
use crate::core::config::MarchingConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;

/// Marches every edge upward from a zero seed.
///
/// Requires a non-negative merit at zero rate on every edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct AscentMarch;

impl AscentMarch {
    pub fn algorithm(
        config: MarchingConfig,
        stopping: Box<dyn StoppingCondition>,
    ) -> Result<MarchingClearingAlgorithm<Self>, ConfigError> {
        MarchingClearingAlgorithm::new(AscentMarch, config, stopping)
    }
}

impl<P> MarchingStrategy<P> for AscentMarch {
    fn name(&self) -> &'static str {
        "ascent march"
    }

    fn seed_rates(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        AscentSeed.find_seed_rates(network)
    }

    fn orient(&self, _edge: usize, _current: f64, at_minimum: f64, at_maximum: f64) -> Orientation {
        Orientation {
            descending: strictly_descending(at_minimum, at_maximum),
            direction: MarchDirection::Upward,
        }
    }
}
