//! Clearing algorithms.
//!
//! Every algorithm moves the rates of a [`MixedClearingNetwork`] toward a
//! point where each edge's demand and supply responses cancel, and reports
//! the network residual it reached. Marching variants live here; the
//! Jacobian-based fallbacks live in [`crate::optimization`].

pub mod adaptive;
pub mod ascent;
pub mod bisection;
pub mod descent;
pub mod line_search;
pub mod marching;
pub mod seed;
pub mod shotgun;
pub mod stopping;

#[cfg(test)]
pub(crate) mod test_support;

use crate::core::config::{MarchingConfig, OptimizerConfig, StoppingConfig, TrustRegionConfig};
use crate::core::error::{ClearingError, ConfigError};
use crate::graph::network::MixedClearingNetwork;
use crate::optimization::levenberg_marquardt::LevenbergMarquardt;
use crate::optimization::nelder_mead::NelderMead;
use crate::optimization::trust_region::TrustRegion;
use adaptive::AdaptiveMarch;
use ascent::AscentMarch;
use descent::DescentMarch;
use marching::MarchingClearingAlgorithm;
use serde::{Deserialize, Serialize};
use shotgun::ShotgunMarch;

/// Finds clearing rates for a network.
pub trait ClearingAlgorithm<P> {
    fn name(&self) -> &str;

    /// Move the network's edge rates toward clearing and return the final
    /// residual. [`ClearingError::SeedingFailed`] means no trade should
    /// take place this session.
    fn apply_to_network(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<f64, ClearingError>;
}

/// Serializable choice of clearing algorithm and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlgorithmConfig {
    AscentMarch {
        #[serde(default)]
        marching: MarchingConfig,
        #[serde(default)]
        stopping: StoppingConfig,
    },
    AdaptiveMarch {
        #[serde(default)]
        marching: MarchingConfig,
        #[serde(default)]
        stopping: StoppingConfig,
    },
    DescentMarch {
        #[serde(default)]
        marching: MarchingConfig,
        #[serde(default)]
        stopping: StoppingConfig,
    },
    ShotgunMarch {
        #[serde(default)]
        marching: MarchingConfig,
        #[serde(default)]
        stopping: StoppingConfig,
        #[serde(default)]
        rng_seed: u64,
    },
    LevenbergMarquardt {
        #[serde(default)]
        optimizer: OptimizerConfig,
    },
    NelderMead {
        #[serde(default)]
        optimizer: OptimizerConfig,
    },
    TrustRegion {
        #[serde(default)]
        trust_region: TrustRegionConfig,
    },
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        AlgorithmConfig::AscentMarch {
            marching: MarchingConfig::default(),
            stopping: StoppingConfig::default(),
        }
    }
}

impl AlgorithmConfig {
    /// Validate the parameters and construct the algorithm.
    pub fn build<P>(&self) -> Result<Box<dyn ClearingAlgorithm<P>>, ConfigError> {
        Ok(match self {
            AlgorithmConfig::AscentMarch { marching, stopping } => Box::new(MarchingClearingAlgorithm::new(
                AscentMarch,
                *marching,
                stopping.build()?,
            )?),
            AlgorithmConfig::AdaptiveMarch { marching, stopping } => Box::new(MarchingClearingAlgorithm::new(
                AdaptiveMarch::new(),
                *marching,
                stopping.build()?,
            )?),
            AlgorithmConfig::DescentMarch { marching, stopping } => Box::new(MarchingClearingAlgorithm::new(
                DescentMarch,
                *marching,
                stopping.build()?,
            )?),
            AlgorithmConfig::ShotgunMarch {
                marching,
                stopping,
                rng_seed,
            } => Box::new(MarchingClearingAlgorithm::new(
                ShotgunMarch::seeded(*rng_seed),
                *marching,
                stopping.build()?,
            )?),
            AlgorithmConfig::LevenbergMarquardt { optimizer } => Box::new(LevenbergMarquardt::new(*optimizer)?),
            AlgorithmConfig::NelderMead { optimizer } => Box::new(NelderMead::new(*optimizer)?),
            AlgorithmConfig::TrustRegion { trust_region } => Box::new(TrustRegion::new(*trust_region)?),
        })
    }
}
