//! The contract through which the clearing core observes participants.
//!
//! A response function answers one question: given every trade opportunity
//! currently open to a participant, how much does the participant want to
//! trade over each of a requested subset of them? By convention demand
//! responses are positive and supply responses negative, so that an edge
//! clears when the two responses attached to it sum to zero.

use crate::core::opportunity::TradeOpportunity;

/// Sentinel upper domain bound for a response function that accepts any
/// non-negative rate. `f64::INFINITY` is treated identically.
pub const UNBOUNDED_RATE: f64 = f64::MAX;

/// Whether a domain bound denotes an unbounded rate domain.
pub fn is_unbounded(rate: f64) -> bool {
    rate >= UNBOUNDED_RATE
}

/// A rate domain `[minimum, maximum]`.
pub trait BoundedDomain {
    fn minimum_in_domain(&self) -> f64 {
        0.0
    }

    fn maximum_in_domain(&self) -> f64 {
        UNBOUNDED_RATE
    }
}

/// A participant's response to its open trade opportunities.
pub trait MarketResponseFunction: BoundedDomain {
    /// Evaluate the response for each index in `queries`.
    ///
    /// `opportunities` always holds the complete, current set of
    /// opportunities for the participant; `queries` selects the entries
    /// to evaluate and must be in bounds. The result has one value per
    /// query, in query order.
    fn value(&self, queries: &[usize], opportunities: &[TradeOpportunity]) -> Vec<f64>;
}

/// A bounded scalar function of one rate.
pub trait BoundedUnivariateFunction: BoundedDomain {
    fn value(&self, rate: f64) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_sentinel() {
        assert!(is_unbounded(UNBOUNDED_RATE));
        assert!(is_unbounded(f64::INFINITY));
        assert!(!is_unbounded(1.0e300));
    }
}
