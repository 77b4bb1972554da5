use crate::core::result::{MixedClearingNetworkResult, ResourceExchangeDelegate};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Which volume of a cleared edge counts as the trade both parties want.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeVolumePolicy {
    DemandVolume,
    SupplyVolume,
    /// The smaller of the demand and supply volumes.
    #[default]
    Smaller,
}

impl TradeVolumePolicy {
    pub fn desired_trade<P>(&self, result: &MixedClearingNetworkResult<P>) -> f64 {
        match self {
            TradeVolumePolicy::DemandVolume => result.demand_volume(),
            TradeVolumePolicy::SupplyVolume => result.supply_volume(),
            TradeVolumePolicy::Smaller => result.demand_volume().min(result.supply_volume()),
        }
    }
}

/// The trade one consumer/supplier pair settled on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesiredExchange {
    pub trade: f64,
    pub rate: f64,
}

/// One desired exchange with both parties resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedExchange<'a, P> {
    pub consumer: &'a P,
    pub supplier: &'a P,
    pub exchange: DesiredExchange,
}

/// Collects the committed results of a clearing session and summarises
/// them for contract creation.
///
/// Exchanges are keyed by `(demand id, supply id)`; a later result for the
/// same pair replaces the earlier exchange, while the totals count every
/// committed result.
#[derive(Debug, Clone)]
pub struct ResourceExchangeAggregator<P> {
    policy: TradeVolumePolicy,
    results: Vec<MixedClearingNetworkResult<P>>,
    exchanges: HashMap<(String, String), DesiredExchange>,
    consumers: HashMap<String, P>,
    suppliers: HashMap<String, P>,
}

impl<P: Clone> ResourceExchangeAggregator<P> {
    pub fn new(policy: TradeVolumePolicy) -> Self {
        Self {
            policy,
            results: Vec::new(),
            exchanges: HashMap::new(),
            consumers: HashMap::new(),
            suppliers: HashMap::new(),
        }
    }

    /// A new aggregator behind shared ownership, ready to be handed to a
    /// network builder as a delegate.
    pub fn shared(policy: TradeVolumePolicy) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new(policy)))
    }
}

impl<P> ResourceExchangeAggregator<P> {
    pub fn policy(&self) -> TradeVolumePolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[MixedClearingNetworkResult<P>] {
        &self.results
    }

    pub fn keyed_exchanges(&self) -> &HashMap<(String, String), DesiredExchange> {
        &self.exchanges
    }

    pub fn exchange(&self, demand_id: &str, supply_id: &str) -> Option<DesiredExchange> {
        self.exchanges
            .get(&(demand_id.to_string(), supply_id.to_string()))
            .copied()
    }

    /// Every keyed exchange with its consumer and supplier objects.
    pub fn exchanges(&self) -> impl Iterator<Item = ResolvedExchange<'_, P>> {
        self.exchanges.iter().filter_map(|((demand_id, supply_id), exchange)| {
            Some(ResolvedExchange {
                consumer: self.consumers.get(demand_id)?,
                supplier: self.suppliers.get(supply_id)?,
                exchange: *exchange,
            })
        })
    }

    pub fn consumers(&self) -> &HashMap<String, P> {
        &self.consumers
    }

    pub fn suppliers(&self) -> &HashMap<String, P> {
        &self.suppliers
    }

    pub fn total_consumer_demand(&self) -> f64 {
        self.results.iter().map(|r| r.demand_volume()).sum()
    }

    pub fn total_supplier_supply(&self) -> f64 {
        self.results.iter().map(|r| r.supply_volume()).sum()
    }

    pub fn total_desired_trade(&self) -> f64 {
        self.results.iter().map(|r| self.policy.desired_trade(r)).sum()
    }

    /// Clearing rate averaged over results, weighted by desired trade.
    /// Zero when nothing is traded.
    pub fn desired_trade_weighted_rate(&self) -> f64 {
        let (trade, weighted) = self.results.iter().fold((0.0, 0.0), |(trade, weighted), r| {
            let t = self.policy.desired_trade(r);
            (trade + t, weighted + t * r.clearing_rate())
        });
        if trade == 0.0 {
            0.0
        } else {
            weighted / trade
        }
    }
}

impl<P: Clone> ResourceExchangeDelegate<P> for ResourceExchangeAggregator<P> {
    fn commit(&mut self, result: MixedClearingNetworkResult<P>) {
        let key = (result.demand_id().to_string(), result.supply_id().to_string());
        self.exchanges.insert(
            key,
            DesiredExchange {
                trade: self.policy.desired_trade(&result),
                rate: result.clearing_rate(),
            },
        );
        self.consumers
            .entry(result.demand_id().to_string())
            .or_insert_with(|| result.demand_object().clone());
        self.suppliers
            .entry(result.supply_id().to_string())
            .or_insert_with(|| result.supply_object().clone());
        self.results.push(result);
    }
}
