use crate::core::instrument::ClearingInstrument;
use serde::{Deserialize, Serialize};

/// One trade opportunity as seen by a participant: the instrument being
/// traded, the candidate rate, and the unique id of the counterparty.
///
/// Nodes keep one opportunity per connected edge and rewrite the rate in
/// place between evaluations, so a response function always receives the
/// full, up-to-date set of opportunities for its participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOpportunity {
    instrument: ClearingInstrument,
    rate: f64,
    counterparty: String,
}

impl TradeOpportunity {
    pub fn new(instrument: ClearingInstrument, rate: f64, counterparty: impl Into<String>) -> Self {
        Self {
            instrument,
            rate,
            counterparty: counterparty.into(),
        }
    }

    pub fn instrument(&self) -> &ClearingInstrument {
        &self.instrument
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Unique id of the trade partner over this opportunity.
    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub(crate) fn set_rate(&mut self, rate: f64) {
        self.rate = rate;
    }
}

/// Collect the rates of a slice of opportunities, preserving order.
pub fn rates_of(opportunities: &[TradeOpportunity]) -> Vec<f64> {
    opportunities.iter().map(TradeOpportunity::rate).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_of_preserves_order() {
        let bond = ClearingInstrument::new("Mock Market", "Bond");
        let opportunities = vec![
            TradeOpportunity::new(bond.clone(), 0.25, "A"),
            TradeOpportunity::new(bond.clone(), 0.75, "B"),
            TradeOpportunity::new(bond, 0.5, "C"),
        ];
        assert_eq!(rates_of(&opportunities), vec![0.25, 0.75, 0.5]);
    }

    #[test]
    fn test_set_rate_in_place() {
        let mut opportunity =
            TradeOpportunity::new(ClearingInstrument::new("Mock Market", "Bond"), 0.0, "A");
        opportunity.set_rate(1.5);
        assert_eq!(opportunity.rate(), 1.5);
        assert_eq!(opportunity.counterparty(), "A");
    }
}
