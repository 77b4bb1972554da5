use crate::core::opportunity::{rates_of, TradeOpportunity};
use crate::core::response::{BoundedDomain, BoundedUnivariateFunction, MarketResponseFunction};
use crate::response::partition::PartitionFunction;

/// A response composed of a partition across opportunities and a total
/// response at the share-weighted aggregate rate.
///
/// For shares `w` over current rates `r`, the aggregate rate is `Σ wᵢ·rᵢ`,
/// the total is `inner(aggregate)`, and the response to opportunity `i` is
/// `wᵢ · total`.
pub struct PartitionedResponseFunction {
    partition: Box<dyn PartitionFunction>,
    inner: Box<dyn BoundedUnivariateFunction>,
}

impl PartitionedResponseFunction {
    pub fn new(partition: Box<dyn PartitionFunction>, inner: Box<dyn BoundedUnivariateFunction>) -> Self {
        Self { partition, inner }
    }
}

impl BoundedDomain for PartitionedResponseFunction {
    fn minimum_in_domain(&self) -> f64 {
        self.inner.minimum_in_domain()
    }

    fn maximum_in_domain(&self) -> f64 {
        self.inner.maximum_in_domain()
    }
}

impl MarketResponseFunction for PartitionedResponseFunction {
    fn value(&self, queries: &[usize], opportunities: &[TradeOpportunity]) -> Vec<f64> {
        if queries.is_empty() {
            return Vec::new();
        }
        let rates = rates_of(opportunities);
        let shares = self.partition.partition(&rates);
        let aggregate: f64 = shares.iter().zip(&rates).map(|(w, r)| w * r).sum();
        let total = self.inner.value(aggregate);
        queries.iter().map(|&q| shares[q] * total).collect()
    }
}

/// A response that evaluates a univariate curve independently at the rate
/// of each queried opportunity.
pub struct UnivariateResponseFunction {
    inner: Box<dyn BoundedUnivariateFunction>,
}

impl UnivariateResponseFunction {
    pub fn new(inner: Box<dyn BoundedUnivariateFunction>) -> Self {
        Self { inner }
    }
}

impl BoundedDomain for UnivariateResponseFunction {
    fn minimum_in_domain(&self) -> f64 {
        self.inner.minimum_in_domain()
    }

    fn maximum_in_domain(&self) -> f64 {
        self.inner.maximum_in_domain()
    }
}

impl MarketResponseFunction for UnivariateResponseFunction {
    fn value(&self, queries: &[usize], opportunities: &[TradeOpportunity]) -> Vec<f64> {
        queries
            .iter()
            .map(|&q| self.inner.value(opportunities[q].rate()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instrument::ClearingInstrument;
    use crate::response::partition::{ExpIocPartition, TrivialUnbiasedPartition};
    use crate::response::shapes::LinearResponse;
    use approx::assert_relative_eq;

    fn opportunities(rates: &[f64]) -> Vec<TradeOpportunity> {
        let bond = ClearingInstrument::new("Mock Market", "Bond");
        rates
            .iter()
            .enumerate()
            .map(|(i, r)| TradeOpportunity::new(bond.clone(), *r, format!("P{}", i)))
            .collect()
    }

    #[test]
    fn test_uniform_partition_splits_total() {
        let response = PartitionedResponseFunction::new(
            Box::new(TrivialUnbiasedPartition),
            Box::new(LinearResponse::bounded(100.0, -10.0, 10.0)),
        );
        let opps = opportunities(&[2.0, 4.0]);
        // Aggregate rate 3, total 70, split evenly.
        let values = response.value(&[0, 1], &opps);
        assert_relative_eq!(values[0], 35.0);
        assert_relative_eq!(values[1], 35.0);
        assert_eq!(response.maximum_in_domain(), 10.0);
    }

    #[test]
    fn test_partitioned_queries_subset() {
        let response = PartitionedResponseFunction::new(
            Box::new(ExpIocPartition::default()),
            Box::new(LinearResponse::unbounded(0.0, -1.0)),
        );
        let opps = opportunities(&[1.0, 2.0, 3.0]);
        let all = response.value(&[0, 1, 2], &opps);
        let subset = response.value(&[2, 0], &opps);
        assert_eq!(subset, vec![all[2], all[0]]);
    }

    #[test]
    fn test_univariate_response_is_per_opportunity() {
        let response = UnivariateResponseFunction::new(Box::new(LinearResponse::bounded(100.0, -10.0, 10.0)));
        let opps = opportunities(&[1.0, 5.0]);
        assert_eq!(response.value(&[1, 0], &opps), vec![50.0, 90.0]);
    }
}
