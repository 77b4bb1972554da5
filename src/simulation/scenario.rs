//! Serializable market scenarios.
//!
//! A [`Scenario`] names the clearing algorithm, the resources traded and
//! every buyer and seller with its response function. Running it clears one
//! market session and summarises the committed exchanges per resource.

use crate::clearing::AlgorithmConfig;
use crate::core::error::ScenarioError;
use crate::core::instrument::ClearingInstrument;
use crate::market::aggregator::{ResourceExchangeAggregator, TradeVolumePolicy};
use crate::market::session::{MixedNetworkMarket, SessionReport, SubnetworkClearingMode};
use crate::response::ResponseConfig;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetworkSpec {
    pub market: String,
    pub resource: String,
    #[serde(default)]
    pub mode: SubnetworkClearingMode,
    #[serde(default)]
    pub policy: TradeVolumePolicy,
}

impl SubnetworkSpec {
    pub fn instrument(&self) -> ClearingInstrument {
        ClearingInstrument::new(self.market.as_str(), self.resource.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantSpec {
    pub id: String,
    pub response: ResponseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub algorithm: AlgorithmConfig,
    pub subnetworks: Vec<SubnetworkSpec>,
    #[serde(default)]
    pub buyers: Vec<ParticipantSpec>,
    #[serde(default)]
    pub sellers: Vec<ParticipantSpec>,
}

/// A market built from a scenario, with one aggregator per resource.
pub struct ScenarioMarket {
    pub market: MixedNetworkMarket<String>,
    pub aggregators: Vec<(ClearingInstrument, Rc<RefCell<ResourceExchangeAggregator<String>>>)>,
}

/// One consumer/supplier exchange in a resource summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeSummary {
    pub consumer: String,
    pub supplier: String,
    pub trade: f64,
    pub rate: f64,
}

/// Aggregate outcome for one traded resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub instrument: String,
    pub total_consumer_demand: f64,
    pub total_supplier_supply: f64,
    pub total_desired_trade: f64,
    pub weighted_rate: f64,
    pub exchanges: Vec<ExchangeSummary>,
}

impl ResourceSummary {
    fn from_aggregator(instrument: &ClearingInstrument, aggregator: &ResourceExchangeAggregator<String>) -> Self {
        let mut exchanges: Vec<ExchangeSummary> = aggregator
            .exchanges()
            .map(|e| ExchangeSummary {
                consumer: e.consumer.clone(),
                supplier: e.supplier.clone(),
                trade: e.exchange.trade,
                rate: e.exchange.rate,
            })
            .collect();
        exchanges.sort_by(|a, b| (&a.consumer, &a.supplier).cmp(&(&b.consumer, &b.supplier)));
        Self {
            instrument: instrument.to_string(),
            total_consumer_demand: aggregator.total_consumer_demand(),
            total_supplier_supply: aggregator.total_supplier_supply(),
            total_desired_trade: aggregator.total_desired_trade(),
            weighted_rate: aggregator.desired_trade_weighted_rate(),
            exchanges,
        }
    }
}

/// Session report plus per-resource summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub session: SessionReport,
    pub resources: Vec<ResourceSummary>,
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scenario.is_empty() {
            writeln!(f, "Scenario:   {}", self.scenario)?;
        }
        writeln!(f, "{}", self.session)?;
        for resource in &self.resources {
            writeln!(f)?;
            writeln!(f, "--- {} ---", resource.instrument)?;
            writeln!(f, "Total demand:        {:.6}", resource.total_consumer_demand)?;
            writeln!(f, "Total supply:        {:.6}", resource.total_supplier_supply)?;
            writeln!(f, "Total desired trade: {:.6}", resource.total_desired_trade)?;
            writeln!(f, "Weighted rate:       {:.6}", resource.weighted_rate)?;
            for exchange in &resource.exchanges {
                writeln!(
                    f,
                    "  {} <- {}: trade {:.6} at {:.6}",
                    exchange.consumer, exchange.supplier, exchange.trade, exchange.rate
                )?;
            }
        }
        Ok(())
    }
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ScenarioError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Register every participant and subnetwork in a fresh market.
    /// Participant objects are their ids.
    pub fn into_market(&self) -> Result<ScenarioMarket, ScenarioError> {
        let mut market = MixedNetworkMarket::<String>::new();
        let mut aggregators = Vec::with_capacity(self.subnetworks.len());
        for spec in &self.subnetworks {
            let instrument = spec.instrument();
            let aggregator = ResourceExchangeAggregator::<String>::shared(spec.policy);
            market.add_subnetwork(instrument.clone(), aggregator.clone(), spec.mode);
            aggregators.push((instrument, aggregator));
        }
        for buyer in &self.buyers {
            market.add_buy_order(buyer.id.clone(), buyer.id.as_str(), buyer.response.build()?)?;
        }
        for seller in &self.sellers {
            market.add_sell_order(seller.id.clone(), seller.id.as_str(), seller.response.build()?)?;
        }
        Ok(ScenarioMarket { market, aggregators })
    }

    /// Clear one session with the scenario's algorithm.
    pub fn run(&self) -> Result<ScenarioOutcome, ScenarioError> {
        let mut algorithm = self.algorithm.build::<String>()?;
        let ScenarioMarket { mut market, aggregators } = self.into_market()?;
        let session = market.clear(algorithm.as_mut())?;
        let resources = aggregators
            .iter()
            .map(|(instrument, aggregator)| ResourceSummary::from_aggregator(instrument, &aggregator.borrow()))
            .collect();
        Ok(ScenarioOutcome {
            scenario: self.name.clone(),
            session,
            resources,
        })
    }
}
