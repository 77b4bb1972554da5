//! # mixed-clearing
//!
//! Heterogeneous mixed-clearing network solver for agent-based market
//! simulation.
//!
//! Once per simulation step, a market session registers its participants
//! (each with a bounded response function), connects eligible buyer/seller
//! pairs with edges, and asks a clearing algorithm for the set of edge
//! rates at which every participant's demand and supply responses cancel.
//!
//! ## Architecture
//!
//! - **core**: Instruments, trade opportunities, response-function traits, results, errors, config
//! - **response**: Partition functions and concrete response shapes
//! - **graph**: Network nodes, singleton edges, hyperedges and the clearing network
//! - **clearing**: Marching root-finders, seed selection, stopping conditions
//! - **optimization**: Jacobian-based fallbacks: Levenberg–Marquardt, Nelder–Mead, trust region
//! - **market**: Session glue and the resource exchange aggregator
//! - **simulation**: Scenario descriptions and random scenario generation

pub mod clearing;
pub mod core;
pub mod graph;
pub mod market;
pub mod optimization;
pub mod response;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::clearing::adaptive::AdaptiveMarch;
    pub use crate::clearing::ascent::AscentMarch;
    pub use crate::clearing::descent::DescentMarch;
    pub use crate::clearing::marching::MarchingClearingAlgorithm;
    pub use crate::clearing::shotgun::ShotgunMarch;
    pub use crate::clearing::stopping::{
        OrderOfMagnitudeReductionOrMaximumIterations, StoppingCondition,
        TargetResidualOrMaximumIterations,
    };
    pub use crate::clearing::{AlgorithmConfig, ClearingAlgorithm};
    pub use crate::core::config::{MarchingConfig, OptimizerConfig, StoppingConfig, TrustRegionConfig};
    pub use crate::core::error::{ClearingError, ConfigError, NetworkError};
    pub use crate::core::instrument::ClearingInstrument;
    pub use crate::core::opportunity::TradeOpportunity;
    pub use crate::core::response::{BoundedDomain, BoundedUnivariateFunction, MarketResponseFunction};
    pub use crate::core::result::{MixedClearingNetworkResult, ResourceExchangeDelegate, SharedDelegate};
    pub use crate::graph::network::{MixedClearingNetwork, MixedClearingNetworkBuilder};
    pub use crate::market::aggregator::{ResourceExchangeAggregator, TradeVolumePolicy};
    pub use crate::market::session::{MixedNetworkMarket, SessionOutcome, SessionReport, SubnetworkClearingMode};
}
