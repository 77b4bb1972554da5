//! Small networks shared by the clearing and optimization unit tests.

use crate::clearing::stopping::StoppingCondition;
use crate::core::instrument::ClearingInstrument;
use crate::core::opportunity::TradeOpportunity;
use crate::core::response::{BoundedDomain, MarketResponseFunction};
use crate::core::result::{MixedClearingNetworkResult, ResourceExchangeDelegate};
use crate::graph::network::{MixedClearingNetwork, MixedClearingNetworkBuilder};
use crate::response::partition::{ExpIocPartition, InverseExpIocPartition};
use crate::response::partitioned::{PartitionedResponseFunction, UnivariateResponseFunction};
use crate::response::shapes::LinearResponse;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub(crate) struct Recorder(pub Vec<MixedClearingNetworkResult<u32>>);

impl ResourceExchangeDelegate<u32> for Recorder {
    fn commit(&mut self, result: MixedClearingNetworkResult<u32>) {
        self.0.push(result);
    }
}

pub(crate) fn linear(intercept: f64, slope: f64, max: f64) -> Box<dyn MarketResponseFunction> {
    Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::bounded(
        intercept, slope, max,
    ))))
}

/// Records every residual it is shown and stops after `max_iterations`.
pub(crate) struct RecordingCondition {
    pub residuals: Rc<RefCell<Vec<f64>>>,
    pub max_iterations: usize,
}

impl StoppingCondition for RecordingCondition {
    fn is_satisfied(&mut self, residual: f64) -> bool {
        let mut residuals = self.residuals.borrow_mut();
        residuals.push(residual);
        residuals.len() >= self.max_iterations
    }

    fn reset(&mut self) {
        self.residuals.borrow_mut().clear();
    }
}

fn bond() -> ClearingInstrument {
    ClearingInstrument::new("Mock Market", "Bond")
}

/// One demand node, one supply node, `edges` parallel singleton edges.
pub(crate) fn parallel_network(
    demand: Box<dyn MarketResponseFunction>,
    supply: Box<dyn MarketResponseFunction>,
    edges: usize,
) -> MixedClearingNetwork<u32> {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut builder = MixedClearingNetworkBuilder::new();
    builder.add_node(1, "D", demand).unwrap();
    builder.add_node(2, "S", supply).unwrap();
    for _ in 0..edges {
        builder.add_edge("D", "S", bond(), recorder.clone()).unwrap();
    }
    builder.build().unwrap()
}

/// Demand `100 − 10r` on `[0, 10]`, supply `−5r` on `[0, 20]`, joined by
/// `edges` parallel edges. Every edge clears at `r = 100/15`.
pub(crate) fn linear_scenario(edges: usize) -> MixedClearingNetwork<u32> {
    parallel_network(linear(100.0, -10.0, 10.0), linear(0.0, -5.0, 20.0), edges)
}

pub(crate) fn single_edge_network(
    demand_intercept: f64,
    demand_slope: f64,
    demand_max: f64,
    supply_intercept: f64,
    supply_slope: f64,
    supply_max: f64,
) -> MixedClearingNetwork<u32> {
    parallel_network(
        linear(demand_intercept, demand_slope, demand_max),
        linear(supply_intercept, supply_slope, supply_max),
        1,
    )
}

/// Responds `below` at every rate under `max`, and `at` at `max` itself.
struct StepAtMaximum {
    max: f64,
    below: f64,
    at: f64,
}

impl BoundedDomain for StepAtMaximum {
    fn maximum_in_domain(&self) -> f64 {
        self.max
    }
}

impl MarketResponseFunction for StepAtMaximum {
    fn value(&self, queries: &[usize], opportunities: &[TradeOpportunity]) -> Vec<f64> {
        queries
            .iter()
            .map(|&q| if opportunities[q].rate() >= self.max { self.at } else { self.below })
            .collect()
    }
}

/// A single edge whose merit is `below` on `[0, max)` and `at` at `max`.
pub(crate) fn step_network(max: f64, below: f64, at: f64) -> MixedClearingNetwork<u32> {
    parallel_network(
        Box::new(StepAtMaximum { max, below, at }),
        Box::new(UnivariateResponseFunction::new(Box::new(LinearResponse::unbounded(0.0, 0.0)))),
        1,
    )
}

/// Two demand nodes and two supply nodes in a complete bipartite network.
/// Demand `aᵢ − r` on `[0, 10]`, supply `−r` on `[0, 10]`.
pub(crate) fn bipartite_network() -> MixedClearingNetwork<u32> {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut builder = MixedClearingNetworkBuilder::new();
    builder.add_node(1, "D1", linear(4.0, -1.0, 10.0)).unwrap();
    builder.add_node(2, "D2", linear(6.0, -1.0, 10.0)).unwrap();
    builder.add_node(3, "S1", linear(0.0, -1.0, 10.0)).unwrap();
    builder.add_node(4, "S2", linear(0.0, -2.0, 10.0)).unwrap();
    for d in ["D1", "D2"] {
        for s in ["S1", "S2"] {
            builder.add_edge(d, s, bond(), recorder.clone()).unwrap();
        }
    }
    builder.build().unwrap()
}

/// The bipartite network with every node splitting its response across its
/// edges: buyers favour the cheaper edge, sellers the dearer one. Moving one
/// edge shifts the merit of every edge sharing a node with it.
pub(crate) fn partitioned_bipartite_network() -> MixedClearingNetwork<u32> {
    let buyer = |intercept: f64| -> Box<dyn MarketResponseFunction> {
        Box::new(PartitionedResponseFunction::new(
            Box::new(InverseExpIocPartition::default()),
            Box::new(LinearResponse::bounded(intercept, -1.0, 10.0)),
        ))
    };
    let seller = |slope: f64| -> Box<dyn MarketResponseFunction> {
        Box::new(PartitionedResponseFunction::new(
            Box::new(ExpIocPartition::default()),
            Box::new(LinearResponse::bounded(0.0, slope, 10.0)),
        ))
    };
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let mut builder = MixedClearingNetworkBuilder::new();
    builder.add_node(1, "D1", buyer(4.0)).unwrap();
    builder.add_node(2, "D2", buyer(6.0)).unwrap();
    builder.add_node(3, "S1", seller(-1.0)).unwrap();
    builder.add_node(4, "S2", seller(-2.0)).unwrap();
    for d in ["D1", "D2"] {
        for s in ["S1", "S2"] {
            builder.add_edge(d, s, bond(), recorder.clone()).unwrap();
        }
    }
    builder.build().unwrap()
}
