use thiserror::Error;

/// Structural misuse of a network builder or market session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("node identifier must not be empty")]
    EmptyNodeId,
    #[error("a node with identifier {0} already exists")]
    DuplicateNode(String),
    #[error("no demand node with identifier {0} exists")]
    UnknownDemandNode(String),
    #[error("no supply node with identifier {0} exists")]
    UnknownSupplyNode(String),
    #[error("hyperedge name must not be empty")]
    EmptyHyperEdgeName,
    #[error("a hyperedge named {0} already exists")]
    DuplicateHyperEdge(String),
    #[error("no hyperedge named {0} exists")]
    UnknownHyperEdge(String),
    #[error("hyperedge {0} has no component edges")]
    EmptyHyperEdge(String),
    #[error("a market needs at least one subnetwork")]
    NoSubnetworks,
}

/// Outcome of a clearing algorithm that did not produce a residual.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClearingError {
    /// No sign-consistent seed rate exists for this edge. The session
    /// should be treated as a no-trade session.
    #[error("no admissible seed rate found for edge {edge}")]
    SeedingFailed { edge: usize },
    #[error("clearing network has no edges")]
    EmptyNetwork,
}

/// Invalid algorithm or stopping-condition configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidTolerance { name: &'static str, value: f64 },
    #[error("{name} must be finite and positive, got {value}")]
    InvalidPositive { name: &'static str, value: f64 },
    #[error("{name} must be at least 1")]
    ZeroBudget { name: &'static str },
    #[error("at least one of the absolute and relative error targets must be positive")]
    NoErrorTarget,
}

/// A scenario file that could not be turned into a market session.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl ConfigError {
    pub(crate) fn check_tolerance(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value >= 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidTolerance { name, value })
        }
    }

    pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(ConfigError::InvalidPositive { name, value })
        }
    }

    pub(crate) fn check_budget(name: &'static str, value: usize) -> Result<(), ConfigError> {
        if value >= 1 {
            Ok(())
        } else {
            Err(ConfigError::ZeroBudget { name })
        }
    }
}
