use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Immutable snapshot of one singleton edge after clearing.
///
/// Holds both parties (their represented objects and ids), the final edge
/// rate, and the traded volumes. The supply volume is stored negated, so
/// that under the usual sign convention (demand positive, supply negative)
/// both volumes of a cleared edge are positive and equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixedClearingNetworkResult<P> {
    demand_object: P,
    demand_id: String,
    supply_object: P,
    supply_id: String,
    clearing_rate: f64,
    demand_volume: f64,
    supply_volume: f64,
}

impl<P> MixedClearingNetworkResult<P> {
    /// `supply_response` is the raw response of the supply node; it is
    /// negated on storage.
    pub fn new(
        demand_object: P,
        demand_id: impl Into<String>,
        supply_object: P,
        supply_id: impl Into<String>,
        clearing_rate: f64,
        demand_response: f64,
        supply_response: f64,
    ) -> Self {
        Self {
            demand_object,
            demand_id: demand_id.into(),
            supply_object,
            supply_id: supply_id.into(),
            clearing_rate,
            demand_volume: demand_response,
            supply_volume: -supply_response,
        }
    }

    pub fn demand_object(&self) -> &P {
        &self.demand_object
    }

    pub fn demand_id(&self) -> &str {
        &self.demand_id
    }

    pub fn supply_object(&self) -> &P {
        &self.supply_object
    }

    pub fn supply_id(&self) -> &str {
        &self.supply_id
    }

    pub fn clearing_rate(&self) -> f64 {
        self.clearing_rate
    }

    pub fn demand_volume(&self) -> f64 {
        self.demand_volume
    }

    pub fn supply_volume(&self) -> f64 {
        self.supply_volume
    }

    /// Demand volume in excess of supply volume.
    pub fn excess_demand(&self) -> f64 {
        self.demand_volume - self.supply_volume
    }
}

/// Receives the outcome of each singleton edge once clearing is complete.
pub trait ResourceExchangeDelegate<P> {
    fn commit(&mut self, result: MixedClearingNetworkResult<P>);
}

/// A delegate shared between every edge of one subnetwork.
///
/// Clearing sessions are single-threaded, so shared ownership with
/// interior mutability is sufficient.
pub type SharedDelegate<P> = Rc<RefCell<dyn ResourceExchangeDelegate<P>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_volume_is_negated() {
        let result = MixedClearingNetworkResult::new("bank", "B1", "fund", "F1", 0.05, 10.0, -10.0);
        assert_eq!(result.demand_volume(), 10.0);
        assert_eq!(result.supply_volume(), 10.0);
        assert_eq!(result.excess_demand(), 0.0);
    }

    #[test]
    fn test_result_accessors() {
        let result = MixedClearingNetworkResult::new(1u32, "D", 2u32, "S", 1.25, 3.0, -2.0);
        assert_eq!(*result.demand_object(), 1);
        assert_eq!(*result.supply_object(), 2);
        assert_eq!(result.demand_id(), "D");
        assert_eq!(result.supply_id(), "S");
        assert_eq!(result.clearing_rate(), 1.25);
        assert_eq!(result.excess_demand(), 1.0);
    }
}
