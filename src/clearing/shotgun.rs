use crate::clearing::marching::{direction_toward_root, MarchingClearingAlgorithm, MarchingStrategy, Orientation};
use crate::clearing::seed::{SeedSelection, ShotgunSeed};
use crate::clearing::stopping::StoppingCondition;
use crate::core::config::MarchingConfig;
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Marches from a random seed near the middle of each edge's admissible
/// range, in whichever direction the merit sign indicates.
///
/// Edges are classified on every advance from the merit at both ends of
/// the range. Requires a bounded admissible domain on every edge.
#[derive(Debug, Clone)]
pub struct ShotgunMarch<R = StdRng> {
    seed: ShotgunSeed<R>,
}

impl<R: Rng> ShotgunMarch<R> {
    pub fn new(rng: R) -> Self {
        Self {
            seed: ShotgunSeed::new(rng),
        }
    }

    pub fn algorithm(
        rng: R,
        config: MarchingConfig,
        stopping: Box<dyn StoppingCondition>,
    ) -> Result<MarchingClearingAlgorithm<Self>, ConfigError> {
        MarchingClearingAlgorithm::new(Self::new(rng), config, stopping)
    }
}

impl ShotgunMarch<StdRng> {
    /// A reproducible shotgun march driven by a seeded `StdRng`.
    pub fn seeded(rng_seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(rng_seed))
    }
}

impl<P, R: Rng> MarchingStrategy<P> for ShotgunMarch<R> {
    fn name(&self) -> &'static str {
        "shotgun march"
    }

    fn seed_rates(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        self.seed.find_seed_rates(network)
    }

    fn orient(&self, _edge: usize, current: f64, at_minimum: f64, at_maximum: f64) -> Orientation {
        let descending = at_maximum <= at_minimum;
        Orientation {
            descending,
            direction: direction_toward_root(current, descending),
        }
    }
}
