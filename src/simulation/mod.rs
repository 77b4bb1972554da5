//! Scenario descriptions and random market generation.

pub mod scenario;
