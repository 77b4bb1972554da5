use crate::clearing::ClearingAlgorithm;
use crate::core::error::{ClearingError, NetworkError};
use crate::core::instrument::ClearingInstrument;
use crate::core::response::MarketResponseFunction;
use crate::core::result::SharedDelegate;
use crate::graph::network::{MixedClearingNetwork, MixedClearingNetworkBuilder};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How the trades of one resource are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubnetworkClearingMode {
    /// One singleton edge, with its own rate, per buyer and seller pair.
    #[default]
    Heterogeneous,
    /// Every buyer and seller pair pooled into one hyperedge sharing a
    /// single rate.
    Homogeneous,
}

struct Participant<P> {
    object: P,
    id: String,
    response: Box<dyn MarketResponseFunction>,
}

struct Subnetwork<P> {
    instrument: ClearingInstrument,
    delegate: SharedDelegate<P>,
    mode: SubnetworkClearingMode,
}

/// How a clearing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Rates were found and contracts created.
    Cleared { residual: f64 },
    /// No admissible seed for `edge`; nothing was traded.
    SeedingFailed { edge: usize },
    /// No buyers or no sellers were registered; nothing was cleared.
    NoParticipants,
}

/// Summary of one clearing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub algorithm: String,
    pub outcome: SessionOutcome,
    pub buyers: usize,
    pub sellers: usize,
    pub nodes: usize,
    pub edges: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    pub fn traded(&self) -> bool {
        matches!(self.outcome, SessionOutcome::Cleared { .. })
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Clearing Session ===")?;
        writeln!(f, "Algorithm:  {}", self.algorithm)?;
        writeln!(f, "Buyers:     {}", self.buyers)?;
        writeln!(f, "Sellers:    {}", self.sellers)?;
        writeln!(f, "Network:    {} nodes, {} edges", self.nodes, self.edges)?;
        match self.outcome {
            SessionOutcome::Cleared { residual } => writeln!(f, "Outcome:    cleared, residual {:.6e}", residual)?,
            SessionOutcome::SeedingFailed { edge } => {
                writeln!(f, "Outcome:    no trade, seeding failed on edge {}", edge)?
            }
            SessionOutcome::NoParticipants => writeln!(f, "Outcome:    no trade, no participants")?,
        }
        let elapsed = self.finished_at - self.started_at;
        write!(f, "Duration:   {} ms", elapsed.num_milliseconds())
    }
}

/// A complete buyer-to-seller market over one or more resources.
///
/// Participants register with a response function before each session;
/// [`MixedNetworkMarket::clear`] builds a fresh network connecting every
/// buyer to every seller in every subnetwork, clears it, creates contracts
/// and forgets the participants. Subnetworks persist across sessions.
pub struct MixedNetworkMarket<P> {
    buyers: Vec<Participant<P>>,
    sellers: Vec<Participant<P>>,
    ids: HashSet<String>,
    subnetworks: Vec<Subnetwork<P>>,
}

impl<P> MixedNetworkMarket<P> {
    pub fn new() -> Self {
        Self {
            buyers: Vec::new(),
            sellers: Vec::new(),
            ids: HashSet::new(),
            subnetworks: Vec::new(),
        }
    }

    /// Trade `instrument` in this market, committing outcomes to `delegate`.
    /// A subnetwork already registered for the instrument is replaced.
    pub fn add_subnetwork(
        &mut self,
        instrument: ClearingInstrument,
        delegate: SharedDelegate<P>,
        mode: SubnetworkClearingMode,
    ) -> &mut Self {
        let subnetwork = Subnetwork {
            instrument,
            delegate,
            mode,
        };
        match self
            .subnetworks
            .iter()
            .position(|s| s.instrument == subnetwork.instrument)
        {
            Some(index) => self.subnetworks[index] = subnetwork,
            None => self.subnetworks.push(subnetwork),
        }
        self
    }

    pub fn number_of_resources(&self) -> usize {
        self.subnetworks.len()
    }

    pub fn number_of_buyers(&self) -> usize {
        self.buyers.len()
    }

    pub fn number_of_sellers(&self) -> usize {
        self.sellers.len()
    }

    fn register(&mut self, id: String) -> Result<String, NetworkError> {
        if id.is_empty() {
            return Err(NetworkError::EmptyNodeId);
        }
        if !self.ids.insert(id.clone()) {
            return Err(NetworkError::DuplicateNode(id));
        }
        Ok(id)
    }

    pub fn add_buy_order(
        &mut self,
        object: P,
        id: impl Into<String>,
        response: Box<dyn MarketResponseFunction>,
    ) -> Result<(), NetworkError> {
        let id = self.register(id.into())?;
        self.buyers.push(Participant { object, id, response });
        Ok(())
    }

    pub fn add_sell_order(
        &mut self,
        object: P,
        id: impl Into<String>,
        response: Box<dyn MarketResponseFunction>,
    ) -> Result<(), NetworkError> {
        let id = self.register(id.into())?;
        self.sellers.push(Participant { object, id, response });
        Ok(())
    }

    fn clear_participants(&mut self) {
        self.buyers.clear();
        self.sellers.clear();
        self.ids.clear();
    }

    /// Build this session's network, consuming the registered participants.
    fn build_network(&mut self) -> Result<MixedClearingNetwork<P>, NetworkError> {
        let buyers = std::mem::take(&mut self.buyers);
        let sellers = std::mem::take(&mut self.sellers);
        let buyer_ids: Vec<String> = buyers.iter().map(|p| p.id.clone()).collect();
        let seller_ids: Vec<String> = sellers.iter().map(|p| p.id.clone()).collect();

        let mut builder = MixedClearingNetworkBuilder::new();
        for participant in buyers.into_iter().chain(sellers) {
            builder.add_node(participant.object, participant.id, participant.response)?;
        }
        for subnetwork in &self.subnetworks {
            match subnetwork.mode {
                SubnetworkClearingMode::Heterogeneous => {
                    for buyer in &buyer_ids {
                        for seller in &seller_ids {
                            builder.add_edge(
                                buyer,
                                seller,
                                subnetwork.instrument.clone(),
                                subnetwork.delegate.clone(),
                            )?;
                        }
                    }
                }
                SubnetworkClearingMode::Homogeneous => {
                    let name = subnetwork.instrument.uuid().to_string();
                    builder.add_hyper_edge(name.as_str())?;
                    for buyer in &buyer_ids {
                        for seller in &seller_ids {
                            builder.add_to_hyper_edge(
                                &name,
                                buyer,
                                seller,
                                subnetwork.instrument.clone(),
                                subnetwork.delegate.clone(),
                            )?;
                        }
                    }
                }
            }
        }
        builder.build()
    }
}

impl<P: Clone> MixedNetworkMarket<P> {
    /// Run one clearing session with `algorithm`.
    ///
    /// Contracts are created only when the algorithm returns a residual.
    /// A seeding failure ends the session without trade. The registered
    /// participants are dropped in every case.
    pub fn clear(&mut self, algorithm: &mut dyn ClearingAlgorithm<P>) -> Result<SessionReport, NetworkError> {
        let started_at = Utc::now();
        let name = algorithm.name().to_string();
        let buyers = self.buyers.len();
        let sellers = self.sellers.len();
        let report = |outcome: SessionOutcome, nodes: usize, edges: usize| SessionReport {
            algorithm: name.clone(),
            outcome,
            buyers,
            sellers,
            nodes,
            edges,
            started_at,
            finished_at: Utc::now(),
        };

        if self.subnetworks.is_empty() {
            self.clear_participants();
            return Err(NetworkError::NoSubnetworks);
        }
        if buyers == 0 || sellers == 0 {
            self.clear_participants();
            info!("market session skipped: {} buyers, {} sellers", buyers, sellers);
            return Ok(report(SessionOutcome::NoParticipants, 0, 0));
        }

        let built = self.build_network();
        self.clear_participants();
        let mut network = built?;
        let nodes = network.number_of_nodes();
        let edges = network.number_of_edges();

        let outcome = match network.apply_clearing_algorithm(&mut *algorithm) {
            Ok(residual) => {
                network.create_contracts();
                SessionOutcome::Cleared { residual }
            }
            Err(ClearingError::SeedingFailed { edge }) => {
                warn!("market session: no trade, seeding failed on edge {}", edge);
                SessionOutcome::SeedingFailed { edge }
            }
            Err(ClearingError::EmptyNetwork) => SessionOutcome::NoParticipants,
        };
        let report = report(outcome, nodes, edges);
        info!(
            "market session: {} over {} nodes and {} edges: {:?}",
            report.algorithm, nodes, edges, report.outcome
        );
        Ok(report)
    }
}

impl<P> Default for MixedNetworkMarket<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Display for MixedNetworkMarket<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MixedNetworkMarket with {} resources", self.subnetworks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::ascent::AscentMarch;
    use crate::clearing::stopping::TargetResidualOrMaximumIterations;
    use crate::core::config::MarchingConfig;
    use crate::market::aggregator::{ResourceExchangeAggregator, TradeVolumePolicy};
    use crate::response::partitioned::UnivariateResponseFunction;
    use crate::response::shapes::LinearResponse;
    use approx::assert_abs_diff_eq;

    fn linear(intercept: f64, slope: f64, max: f64) -> Box<dyn MarketResponseFunction> {
        Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::bounded(
            intercept, slope, max,
        ))))
    }

    fn ascent() -> impl ClearingAlgorithm<&'static str> {
        AscentMarch::algorithm(
            MarchingConfig::default(),
            Box::new(TargetResidualOrMaximumIterations::new(1e-12, 50).unwrap()),
        )
        .unwrap()
    }

    fn loans() -> ClearingInstrument {
        ClearingInstrument::new("Loan Market", "Commercial Loan")
    }

    #[test]
    fn test_heterogeneous_session_creates_contracts() {
        let aggregator = ResourceExchangeAggregator::<&str>::shared(TradeVolumePolicy::Smaller);
        let mut market = MixedNetworkMarket::new();
        market.add_subnetwork(loans(), aggregator.clone(), SubnetworkClearingMode::Heterogeneous);
        market.add_buy_order("firm", "F", linear(100.0, -10.0, 10.0)).unwrap();
        market.add_sell_order("bank", "B", linear(0.0, -5.0, 20.0)).unwrap();

        let report = market.clear(&mut ascent()).unwrap();
        assert!(report.traded());
        assert_eq!((report.nodes, report.edges), (2, 1));
        assert_eq!(market.number_of_buyers(), 0);
        assert_eq!(market.number_of_sellers(), 0);

        let aggregator = aggregator.borrow();
        assert_eq!(aggregator.results().len(), 1);
        let exchange = aggregator.exchange("F", "B").unwrap();
        assert_abs_diff_eq!(exchange.rate, 100.0 / 15.0, epsilon = 1e-6);
        assert_abs_diff_eq!(exchange.trade, 100.0 / 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_homogeneous_session_pools_edges() {
        let aggregator = ResourceExchangeAggregator::<&str>::shared(TradeVolumePolicy::Smaller);
        let mut market = MixedNetworkMarket::new();
        market.add_subnetwork(loans(), aggregator.clone(), SubnetworkClearingMode::Homogeneous);
        market.add_buy_order("f1", "F1", linear(100.0, -10.0, 10.0)).unwrap();
        market.add_buy_order("f2", "F2", linear(100.0, -10.0, 10.0)).unwrap();
        market.add_sell_order("bank", "B", linear(0.0, -5.0, 20.0)).unwrap();

        let report = market.clear(&mut ascent()).unwrap();
        assert_eq!((report.nodes, report.edges), (3, 1));
        let aggregator = aggregator.borrow();
        assert_eq!(aggregator.results().len(), 2);
        let rates: Vec<f64> = aggregator.results().iter().map(|r| r.clearing_rate()).collect();
        assert_eq!(rates[0], rates[1]);
    }

    #[test]
    fn test_missing_side_skips_clearing() {
        let aggregator = ResourceExchangeAggregator::<&str>::shared(TradeVolumePolicy::Smaller);
        let mut market = MixedNetworkMarket::new();
        market.add_subnetwork(loans(), aggregator.clone(), SubnetworkClearingMode::Heterogeneous);
        market.add_buy_order("firm", "F", linear(100.0, -10.0, 10.0)).unwrap();
        let report = market.clear(&mut ascent()).unwrap();
        assert_eq!(report.outcome, SessionOutcome::NoParticipants);
        assert!(aggregator.borrow().is_empty());
        assert_eq!(market.number_of_buyers(), 0);
    }

    #[test]
    fn test_seeding_failure_is_a_no_trade_session() {
        let aggregator = ResourceExchangeAggregator::<&str>::shared(TradeVolumePolicy::Smaller);
        let mut market = MixedNetworkMarket::new();
        market.add_subnetwork(loans(), aggregator.clone(), SubnetworkClearingMode::Heterogeneous);
        // Merit is negative at zero, so an ascent seed is impossible.
        market.add_buy_order("firm", "F", linear(-5.0, -1.0, 10.0)).unwrap();
        market.add_sell_order("bank", "B", linear(0.0, -1.0, 10.0)).unwrap();
        let report = market.clear(&mut ascent()).unwrap();
        assert_eq!(report.outcome, SessionOutcome::SeedingFailed { edge: 0 });
        assert!(!report.traded());
        assert!(aggregator.borrow().is_empty());
    }

    #[test]
    fn test_duplicate_participant_is_rejected() {
        let mut market = MixedNetworkMarket::<&str>::new();
        market.add_buy_order("a", "X", linear(1.0, -1.0, 1.0)).unwrap();
        assert_eq!(
            market.add_sell_order("b", "X", linear(0.0, -1.0, 1.0)),
            Err(NetworkError::DuplicateNode("X".to_string()))
        );
    }

    #[test]
    fn test_market_without_subnetworks() {
        let mut market = MixedNetworkMarket::<&str>::new();
        market.add_buy_order("a", "X", linear(1.0, -1.0, 1.0)).unwrap();
        assert_eq!(market.clear(&mut ascent()).unwrap_err(), NetworkError::NoSubnetworks);
    }
}
