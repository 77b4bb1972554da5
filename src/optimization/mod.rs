//! Derivative-based fallback solvers.
//!
//! Each one treats the edge-rate vector as a point in a box and drives it
//! through a [`objective::NetworkObjective`], behind the same
//! [`ClearingAlgorithm`](crate::clearing::ClearingAlgorithm) contract as the
//! marching algorithms.

pub mod levenberg_marquardt;
pub mod linalg;
pub mod nelder_mead;
pub mod objective;
pub mod trust_region;
