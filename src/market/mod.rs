//! Session-level glue around the clearing core.
//!
//! [`session::MixedNetworkMarket`] turns registered buy and sell orders into
//! a fresh clearing network each session; [`aggregator::ResourceExchangeAggregator`]
//! collects the committed outcomes for contract creation.

pub mod aggregator;
pub mod session;
