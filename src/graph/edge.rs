//! Edges own the optimization variables of a clearing network.
//!
//! A [`SingletonEdge`] connects one demand node to one supply node over one
//! instrument. A [`HyperEdge`] pools several singleton edges under a single
//! shared rate. Edges refer to nodes by their index in the network's node
//! arena, and to each node's cache by connection index.

use crate::core::instrument::ClearingInstrument;
use crate::core::result::{MixedClearingNetworkResult, SharedDelegate};
use crate::graph::node::Node;

/// Position of one end of a singleton edge: the node and its connection
/// index on that node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub node: usize,
    pub slot: usize,
}

pub struct SingletonEdge<P> {
    demand: Endpoint,
    supply: Endpoint,
    instrument: ClearingInstrument,
    rate: f64,
    delegate: SharedDelegate<P>,
}

impl<P> SingletonEdge<P> {
    pub(crate) fn new(
        demand: Endpoint,
        supply: Endpoint,
        instrument: ClearingInstrument,
        delegate: SharedDelegate<P>,
    ) -> Self {
        Self {
            demand,
            supply,
            instrument,
            rate: 0.0,
            delegate,
        }
    }

    pub fn demand(&self) -> Endpoint {
        self.demand
    }

    pub fn supply(&self) -> Endpoint {
        self.supply
    }

    pub fn instrument(&self) -> &ClearingInstrument {
        &self.instrument
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Demand response plus supply response, from the node caches.
    pub fn cost(&self, nodes: &[Node<P>]) -> f64 {
        nodes[self.demand.node].response_to(self.demand.slot) + nodes[self.supply.node].response_to(self.supply.slot)
    }

    pub fn maximum_rate_in_demand_domain(&self, nodes: &[Node<P>]) -> f64 {
        nodes[self.demand.node].maximum_in_domain()
    }

    pub fn maximum_rate_in_supply_domain(&self, nodes: &[Node<P>]) -> f64 {
        nodes[self.supply.node].maximum_in_domain()
    }

    pub fn maximum_rate_admissible_by_both_parties(&self, nodes: &[Node<P>]) -> f64 {
        self.maximum_rate_in_demand_domain(nodes)
            .min(self.maximum_rate_in_supply_domain(nodes))
    }

    /// Move this edge, and the matching opportunity on both nodes, to
    /// `rate`. Both node slots are left pending.
    pub(crate) fn set_rate(&mut self, nodes: &mut [Node<P>], rate: f64) {
        self.rate = rate;
        nodes[self.demand.node].set_rate(self.demand.slot, rate);
        nodes[self.supply.node].set_rate(self.supply.slot, rate);
    }

    pub(crate) fn flag(&self, nodes: &mut [Node<P>]) {
        nodes[self.demand.node].flag(self.demand.slot);
        nodes[self.supply.node].flag(self.supply.slot);
    }

    pub(crate) fn update_responses(&self, nodes: &mut [Node<P>]) {
        nodes[self.demand.node].recompute_pending();
        nodes[self.supply.node].recompute_pending();
    }

    fn participants(&self) -> [usize; 2] {
        [self.demand.node, self.supply.node]
    }

    /// Whether this edge and `other` share a participant.
    pub fn touches(&self, other: &SingletonEdge<P>) -> bool {
        let theirs = other.participants();
        self.participants().iter().any(|p| theirs.contains(p))
    }
}

impl<P: Clone> SingletonEdge<P> {
    /// Hand the outcome of this edge to its delegate.
    pub(crate) fn commit(&self, nodes: &[Node<P>]) {
        let demand = &nodes[self.demand.node];
        let supply = &nodes[self.supply.node];
        let result = MixedClearingNetworkResult::new(
            demand.object().clone(),
            demand.id(),
            supply.object().clone(),
            supply.id(),
            self.rate,
            demand.response_to(self.demand.slot),
            supply.response_to(self.supply.slot),
        );
        self.delegate.borrow_mut().commit(result);
    }
}

/// A pool of singleton edges forced to share one rate.
pub struct HyperEdge<P> {
    name: String,
    components: Vec<SingletonEdge<P>>,
    rate: f64,
}

impl<P> HyperEdge<P> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            rate: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn components(&self) -> &[SingletonEdge<P>] {
        &self.components
    }

    pub(crate) fn push(&mut self, component: SingletonEdge<P>) {
        self.components.push(component);
    }

    /// Largest component bound, or `-1` for a pool without components.
    fn component_maximum(&self, bound: impl Fn(&SingletonEdge<P>) -> f64) -> f64 {
        self.components.iter().map(bound).fold(-1.0, f64::max)
    }
}

/// One optimization variable of the network.
pub enum Edge<P> {
    Singleton(SingletonEdge<P>),
    Hyper(HyperEdge<P>),
}

impl<P> Edge<P> {
    pub fn rate(&self) -> f64 {
        match self {
            Edge::Singleton(edge) => edge.rate,
            Edge::Hyper(edge) => edge.rate,
        }
    }

    /// Singleton cost, or the sum of component costs.
    pub fn cost(&self, nodes: &[Node<P>]) -> f64 {
        match self {
            Edge::Singleton(edge) => edge.cost(nodes),
            Edge::Hyper(edge) => edge.components.iter().map(|c| c.cost(nodes)).sum(),
        }
    }

    /// For a hyperedge, the most permissive component bound.
    pub fn maximum_rate_in_demand_domain(&self, nodes: &[Node<P>]) -> f64 {
        match self {
            Edge::Singleton(edge) => edge.maximum_rate_in_demand_domain(nodes),
            Edge::Hyper(edge) => edge.component_maximum(|c| c.maximum_rate_in_demand_domain(nodes)),
        }
    }

    /// For a hyperedge, the most permissive component bound.
    pub fn maximum_rate_in_supply_domain(&self, nodes: &[Node<P>]) -> f64 {
        match self {
            Edge::Singleton(edge) => edge.maximum_rate_in_supply_domain(nodes),
            Edge::Hyper(edge) => edge.component_maximum(|c| c.maximum_rate_in_supply_domain(nodes)),
        }
    }

    pub fn maximum_rate_admissible_by_both_parties(&self, nodes: &[Node<P>]) -> f64 {
        self.maximum_rate_in_demand_domain(nodes)
            .min(self.maximum_rate_in_supply_domain(nodes))
    }

    pub(crate) fn set_rate(&mut self, nodes: &mut [Node<P>], rate: f64) {
        match self {
            Edge::Singleton(edge) => edge.set_rate(nodes, rate),
            Edge::Hyper(edge) => {
                edge.rate = rate;
                for component in &mut edge.components {
                    component.set_rate(nodes, rate);
                }
            }
        }
    }

    pub(crate) fn flag(&self, nodes: &mut [Node<P>]) {
        for component in self.singletons() {
            component.flag(nodes);
        }
    }

    pub(crate) fn update_responses(&self, nodes: &mut [Node<P>]) {
        for component in self.singletons() {
            component.update_responses(nodes);
        }
    }

    /// The singleton edges this edge stands for: itself, or its components.
    pub fn singletons(&self) -> &[SingletonEdge<P>] {
        match self {
            Edge::Singleton(edge) => std::slice::from_ref(edge),
            Edge::Hyper(edge) => &edge.components,
        }
    }

    pub fn touches(&self, other: &Edge<P>) -> bool {
        self.singletons()
            .iter()
            .any(|a| other.singletons().iter().any(|b| a.touches(b)))
    }

    /// Short human-readable label.
    pub fn label(&self, nodes: &[Node<P>]) -> String {
        match self {
            Edge::Singleton(edge) => format!(
                "{} <- {}",
                nodes[edge.demand.node].id(),
                nodes[edge.supply.node].id()
            ),
            Edge::Hyper(edge) => format!("{} [{} edges]", edge.name, edge.components.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::result::ResourceExchangeDelegate;
    use crate::response::partitioned::UnivariateResponseFunction;
    use crate::response::shapes::LinearResponse;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder(Vec<MixedClearingNetworkResult<&'static str>>);

    impl ResourceExchangeDelegate<&'static str> for Recorder {
        fn commit(&mut self, result: MixedClearingNetworkResult<&'static str>) {
            self.0.push(result);
        }
    }

    fn linear_node(id: &'static str, intercept: f64, slope: f64, max: f64) -> Node<&'static str> {
        Node::new(
            id,
            id,
            Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::bounded(
                intercept, slope, max,
            )))),
        )
    }

    fn connect(nodes: &mut [Node<&'static str>], d: usize, s: usize, delegate: SharedDelegate<&'static str>) -> SingletonEdge<&'static str> {
        let bond = ClearingInstrument::new("M", "Bond");
        let supply_id = nodes[s].id().to_string();
        let demand_id = nodes[d].id().to_string();
        let demand = Endpoint {
            node: d,
            slot: nodes[d].connect(bond.clone(), supply_id),
        };
        let supply = Endpoint {
            node: s,
            slot: nodes[s].connect(bond.clone(), demand_id),
        };
        SingletonEdge::new(demand, supply, bond, delegate)
    }

    #[test]
    fn test_singleton_cost_and_domain() {
        let recorder = Rc::new(RefCell::new(Recorder(Vec::new())));
        let mut nodes = vec![
            linear_node("D", 100.0, -10.0, 10.0),
            linear_node("S", 0.0, -5.0, 20.0),
        ];
        let mut edge = connect(&mut nodes, 0, 1, recorder.clone());
        edge.set_rate(&mut nodes, 2.0);
        edge.update_responses(&mut nodes);
        assert_eq!(edge.cost(&nodes), 70.0);
        assert_eq!(edge.maximum_rate_admissible_by_both_parties(&nodes), 10.0);

        edge.commit(&nodes);
        let committed = &recorder.borrow().0;
        assert_eq!(committed.len(), 1);
        assert_eq!(committed[0].demand_volume(), 80.0);
        assert_eq!(committed[0].supply_volume(), 10.0);
        assert_eq!(*committed[0].supply_object(), "S");
    }

    #[test]
    fn test_hyperedge_fans_out_rate() {
        let recorder = Rc::new(RefCell::new(Recorder(Vec::new())));
        let mut nodes = vec![
            linear_node("D1", 10.0, -1.0, 5.0),
            linear_node("D2", 10.0, -1.0, 8.0),
            linear_node("S", 0.0, -1.0, 3.0),
        ];
        let mut pool = HyperEdge::new("pool");
        pool.push(connect(&mut nodes, 0, 2, recorder.clone()));
        pool.push(connect(&mut nodes, 1, 2, recorder.clone()));
        let mut edge = Edge::Hyper(pool);

        edge.set_rate(&mut nodes, 1.25);
        assert_eq!(edge.rate(), 1.25);
        assert!(edge.singletons().iter().all(|c| c.rate() == 1.25));
        assert_eq!(nodes[2].rate(0), 1.25);
        assert_eq!(nodes[2].rate(1), 1.25);

        edge.update_responses(&mut nodes);
        assert_eq!(edge.cost(&nodes), 2.0 * (8.75 - 1.25));
        assert_eq!(edge.maximum_rate_in_demand_domain(&nodes), 8.0);
        assert_eq!(edge.maximum_rate_in_supply_domain(&nodes), 3.0);
        assert_eq!(edge.maximum_rate_admissible_by_both_parties(&nodes), 3.0);
    }

    #[test]
    fn test_empty_hyperedge_domain_is_negative() {
        let edge: Edge<()> = Edge::Hyper(HyperEdge::new("empty"));
        assert_eq!(edge.maximum_rate_in_demand_domain(&[]), -1.0);
    }

    #[test]
    fn test_touches_is_symmetric() {
        let recorder = Rc::new(RefCell::new(Recorder(Vec::new())));
        let mut nodes = vec![
            linear_node("D1", 1.0, -1.0, 1.0),
            linear_node("D2", 1.0, -1.0, 1.0),
            linear_node("S1", 0.0, -1.0, 1.0),
            linear_node("S2", 0.0, -1.0, 1.0),
        ];
        let a = Edge::Singleton(connect(&mut nodes, 0, 2, recorder.clone()));
        let b = Edge::Singleton(connect(&mut nodes, 1, 2, recorder.clone()));
        let c = Edge::Singleton(connect(&mut nodes, 1, 3, recorder.clone()));
        let d = Edge::Singleton(connect(&mut nodes, 0, 3, recorder));
        assert!(a.touches(&b) && b.touches(&a));
        assert!(b.touches(&c) && c.touches(&b));
        assert!(!a.touches(&c) && !c.touches(&a));
        assert!(!b.touches(&d) && !d.touches(&b));
    }
}
