//! The clearing network: participants as nodes, trade connections as edges.

pub mod edge;
pub mod network;
pub mod node;
