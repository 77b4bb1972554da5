use crate::clearing::ClearingAlgorithm;
use crate::core::error::{ClearingError, NetworkError};
use crate::core::instrument::ClearingInstrument;
use crate::core::response::MarketResponseFunction;
use crate::core::result::SharedDelegate;
use crate::graph::edge::{Edge, Endpoint, HyperEdge, SingletonEdge};
use crate::graph::node::Node;
use log::debug;
use std::collections::HashMap;
use std::fmt;

/// A heterogeneous clearing network: participants, the edges between them,
/// and one rate per edge.
///
/// The network is assembled once by [`MixedClearingNetworkBuilder`] and is
/// structurally frozen afterwards; only edge rates change. Clearing
/// algorithms move the rates, and [`MixedClearingNetwork::create_contracts`]
/// hands every singleton outcome to its delegate exactly once.
///
/// # Examples
///
/// ```
/// use mixed_clearing::prelude::*;
/// use mixed_clearing::response::partitioned::UnivariateResponseFunction;
/// use mixed_clearing::response::shapes::LinearResponse;
///
/// let mut builder = MixedClearingNetworkBuilder::new();
/// builder
///     .add_node("bank", "B", Box::new(UnivariateResponseFunction::new(
///         Box::new(LinearResponse::bounded(100.0, -10.0, 10.0)))))
///     .unwrap();
/// builder
///     .add_node("fund", "F", Box::new(UnivariateResponseFunction::new(
///         Box::new(LinearResponse::bounded(0.0, -5.0, 20.0)))))
///     .unwrap();
/// let aggregator = ResourceExchangeAggregator::<&str>::shared(TradeVolumePolicy::Smaller);
/// builder
///     .add_edge("B", "F", ClearingInstrument::new("Loans", "Loan"), aggregator.clone())
///     .unwrap();
/// let network = builder.build().unwrap();
///
/// assert_eq!(network.number_of_edges(), 1);
/// assert_eq!(network.maximum_rate_admissible_by_both_parties(0), 10.0);
/// ```
pub struct MixedClearingNetwork<P> {
    nodes: Vec<Node<P>>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge<P>>,
    hyper_edge_index: HashMap<String, usize>,
    contracts_created: bool,
}

impl<P> MixedClearingNetwork<P> {
    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn edges(&self) -> &[Edge<P>] {
        &self.edges
    }

    pub fn edge(&self, index: usize) -> &Edge<P> {
        &self.edges[index]
    }

    pub fn nodes(&self) -> &[Node<P>] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node<P>> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Position of the named hyperedge in the edge list.
    pub fn hyper_edge_index(&self, name: &str) -> Option<usize> {
        self.hyper_edge_index.get(name).copied()
    }

    pub fn contracts_created(&self) -> bool {
        self.contracts_created
    }

    pub fn edge_rate(&self, index: usize) -> f64 {
        self.edges[index].rate()
    }

    pub fn edge_rates(&self) -> Vec<f64> {
        self.edges.iter().map(Edge::rate).collect()
    }

    /// Current cost of edge `index`, from the node caches.
    pub fn edge_cost(&self, index: usize) -> f64 {
        self.edges[index].cost(&self.nodes)
    }

    pub fn edge_costs(&self) -> Vec<f64> {
        self.edges.iter().map(|e| e.cost(&self.nodes)).collect()
    }

    pub fn maximum_rate_in_demand_domain(&self, index: usize) -> f64 {
        self.edges[index].maximum_rate_in_demand_domain(&self.nodes)
    }

    pub fn maximum_rate_in_supply_domain(&self, index: usize) -> f64 {
        self.edges[index].maximum_rate_in_supply_domain(&self.nodes)
    }

    pub fn maximum_rate_admissible_by_both_parties(&self, index: usize) -> f64 {
        self.edges[index].maximum_rate_admissible_by_both_parties(&self.nodes)
    }

    pub fn maximum_admissible_rates(&self) -> Vec<f64> {
        (0..self.edges.len())
            .map(|i| self.maximum_rate_admissible_by_both_parties(i))
            .collect()
    }

    /// Whether edges `a` and `b` share a participant.
    pub fn touches(&self, a: usize, b: usize) -> bool {
        self.edges[a].touches(&self.edges[b])
    }

    /// Indices of every other edge sharing a participant with edge `index`.
    pub fn touching_edges(&self, index: usize) -> Vec<usize> {
        (0..self.edges.len())
            .filter(|&j| j != index && self.touches(index, j))
            .collect()
    }

    /// Move edge `index` to `rate`. Affected node slots are left pending.
    pub fn set_edge_rate(&mut self, index: usize, rate: f64) {
        self.edges[index].set_rate(&mut self.nodes, rate);
    }

    /// Mark the node slots of edge `index` stale.
    pub fn flag_edge(&mut self, index: usize) {
        self.edges[index].flag(&mut self.nodes);
    }

    /// Recompute pending responses on the nodes attached to edge `index`.
    pub fn update_edge_responses(&mut self, index: usize) {
        self.edges[index].update_responses(&mut self.nodes);
    }

    /// Set edge `index` to `rate`, refresh its nodes and return its cost.
    ///
    /// The rate is not reverted.
    pub fn evaluate_edge_at(&mut self, index: usize, rate: f64) -> f64 {
        self.set_edge_rate(index, rate);
        self.update_edge_responses(index);
        self.edge_cost(index)
    }

    /// Recompute pending responses on every node.
    pub fn update_all_vertex_responses(&mut self) {
        for node in &mut self.nodes {
            node.recompute_pending();
        }
    }

    /// Mark every edge stale, then recompute every node once.
    pub fn flag_and_update_all_edges(&mut self) {
        for edge in &self.edges {
            edge.flag(&mut self.nodes);
        }
        self.update_all_vertex_responses();
    }

    /// Set every edge rate and refresh all responses.
    pub fn set_edge_rates(&mut self, rates: &[f64]) {
        assert_eq!(
            rates.len(),
            self.edges.len(),
            "set_edge_rates: expected {} rates, got {}",
            self.edges.len(),
            rates.len()
        );
        for (index, &rate) in rates.iter().enumerate() {
            self.set_edge_rate(index, rate);
        }
        self.flag_and_update_all_edges();
    }

    /// Mean squared edge cost. Zero for a network without edges.
    pub fn residual_cost(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .edges
            .iter()
            .map(|e| {
                let cost = e.cost(&self.nodes);
                cost * cost
            })
            .sum();
        total / self.edges.len() as f64
    }

    /// Run `algorithm` over this network and return the final residual.
    ///
    /// # Panics
    ///
    /// If contracts have already been created.
    pub fn apply_clearing_algorithm(
        &mut self,
        algorithm: &mut dyn ClearingAlgorithm<P>,
    ) -> Result<f64, ClearingError> {
        assert!(
            !self.contracts_created,
            "clearing applied to a network whose contracts were already created"
        );
        algorithm.apply_to_network(self)
    }
}

impl<P: Clone> MixedClearingNetwork<P> {
    /// Commit every singleton outcome (hyperedge components included) to
    /// its delegate.
    ///
    /// # Panics
    ///
    /// If called more than once.
    pub fn create_contracts(&mut self) {
        assert!(
            !self.contracts_created,
            "create_contracts called twice on the same network"
        );
        self.contracts_created = true;
        self.update_all_vertex_responses();
        let mut committed = 0;
        for edge in &self.edges {
            for component in edge.singletons() {
                component.commit(&self.nodes);
                committed += 1;
            }
        }
        debug!("committed {} clearing results", committed);
    }
}

impl<P> fmt::Display for MixedClearingNetwork<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mixed clearing network: {} nodes, {} edges",
            self.nodes.len(),
            self.edges.len()
        )?;
        for (index, edge) in self.edges.iter().enumerate() {
            writeln!(
                f,
                "  edge {:>4}  {:<40} rate: {:>14.8}  cost: {:>14.6e}",
                index,
                edge.label(&self.nodes),
                edge.rate(),
                edge.cost(&self.nodes)
            )?;
        }
        write!(f, "  residual: {:.6e}", self.residual_cost())
    }
}

/// Assembles a [`MixedClearingNetwork`].
///
/// Nodes must be added before the edges referring to them. Hyperedges are
/// created empty and filled with [`add_to_hyper_edge`]; a hyperedge still
/// empty at [`build`] is an error.
///
/// [`add_to_hyper_edge`]: MixedClearingNetworkBuilder::add_to_hyper_edge
/// [`build`]: MixedClearingNetworkBuilder::build
pub struct MixedClearingNetworkBuilder<P> {
    nodes: Vec<Node<P>>,
    node_index: HashMap<String, usize>,
    edges: Vec<Edge<P>>,
    hyper_edge_index: HashMap<String, usize>,
}

impl<P> MixedClearingNetworkBuilder<P> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_index: HashMap::new(),
            edges: Vec::new(),
            hyper_edge_index: HashMap::new(),
        }
    }

    pub fn add_node(
        &mut self,
        object: P,
        id: impl Into<String>,
        response: Box<dyn MarketResponseFunction>,
    ) -> Result<&mut Self, NetworkError> {
        let id = id.into();
        if id.is_empty() {
            return Err(NetworkError::EmptyNodeId);
        }
        if self.node_index.contains_key(&id) {
            return Err(NetworkError::DuplicateNode(id));
        }
        self.node_index.insert(id.clone(), self.nodes.len());
        self.nodes.push(Node::new(id, object, response));
        Ok(self)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    fn singleton(
        &mut self,
        demand_id: &str,
        supply_id: &str,
        instrument: ClearingInstrument,
        delegate: SharedDelegate<P>,
    ) -> Result<SingletonEdge<P>, NetworkError> {
        let demand_node = *self
            .node_index
            .get(demand_id)
            .ok_or_else(|| NetworkError::UnknownDemandNode(demand_id.to_string()))?;
        let supply_node = *self
            .node_index
            .get(supply_id)
            .ok_or_else(|| NetworkError::UnknownSupplyNode(supply_id.to_string()))?;
        let demand = Endpoint {
            node: demand_node,
            slot: self.nodes[demand_node].connect(instrument.clone(), supply_id),
        };
        let supply = Endpoint {
            node: supply_node,
            slot: self.nodes[supply_node].connect(instrument.clone(), demand_id),
        };
        Ok(SingletonEdge::new(demand, supply, instrument, delegate))
    }

    /// Add a singleton edge and return its edge index.
    pub fn add_edge(
        &mut self,
        demand_id: &str,
        supply_id: &str,
        instrument: ClearingInstrument,
        delegate: SharedDelegate<P>,
    ) -> Result<usize, NetworkError> {
        let edge = self.singleton(demand_id, supply_id, instrument, delegate)?;
        self.edges.push(Edge::Singleton(edge));
        Ok(self.edges.len() - 1)
    }

    /// Add an empty hyperedge and return its edge index.
    pub fn add_hyper_edge(&mut self, name: impl Into<String>) -> Result<usize, NetworkError> {
        let name = name.into();
        if name.is_empty() {
            return Err(NetworkError::EmptyHyperEdgeName);
        }
        if self.hyper_edge_index.contains_key(&name) {
            return Err(NetworkError::DuplicateHyperEdge(name));
        }
        let index = self.edges.len();
        self.hyper_edge_index.insert(name.clone(), index);
        self.edges.push(Edge::Hyper(HyperEdge::new(name)));
        Ok(index)
    }

    /// Add a singleton component to the named hyperedge.
    pub fn add_to_hyper_edge(
        &mut self,
        name: &str,
        demand_id: &str,
        supply_id: &str,
        instrument: ClearingInstrument,
        delegate: SharedDelegate<P>,
    ) -> Result<(), NetworkError> {
        let index = *self
            .hyper_edge_index
            .get(name)
            .ok_or_else(|| NetworkError::UnknownHyperEdge(name.to_string()))?;
        let component = self.singleton(demand_id, supply_id, instrument, delegate)?;
        if let Edge::Hyper(hyper) = &mut self.edges[index] {
            hyper.push(component);
        }
        Ok(())
    }

    /// Freeze the network. Every edge starts at rate zero with all node
    /// responses computed.
    pub fn build(self) -> Result<MixedClearingNetwork<P>, NetworkError> {
        for edge in &self.edges {
            if let Edge::Hyper(hyper) = edge {
                if hyper.components().is_empty() {
                    return Err(NetworkError::EmptyHyperEdge(hyper.name().to_string()));
                }
            }
        }
        let mut network = MixedClearingNetwork {
            nodes: self.nodes,
            node_index: self.node_index,
            edges: self.edges,
            hyper_edge_index: self.hyper_edge_index,
            contracts_created: false,
        };
        for node in &mut network.nodes {
            node.update_all();
        }
        debug!(
            "built clearing network with {} nodes and {} edges",
            network.nodes.len(),
            network.edges.len()
        );
        Ok(network)
    }
}

impl<P> Default for MixedClearingNetworkBuilder<P> {
    fn default() -> Self {
        Self::new()
    }
}
