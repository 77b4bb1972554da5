//! Response functions used by simulated participants.
//!
//! The clearing core only sees [`MarketResponseFunction`]; this module
//! provides the shapes simulations build participants from, and a
//! serializable [`ResponseConfig`] describing them.

pub mod partition;
pub mod partitioned;
pub mod shapes;

use crate::core::error::ConfigError;
use crate::core::response::{BoundedUnivariateFunction, MarketResponseFunction};
use partition::{ExpIocPartition, InverseExpIocPartition, PartitionFunction, TrivialUnbiasedPartition};
use partitioned::{PartitionedResponseFunction, UnivariateResponseFunction};
use serde::{Deserialize, Serialize};
use shapes::{LinearResponse, PolynomialDemandResponse, PolynomialSupplyResponse, StepResponse};

/// The univariate curve at the heart of a response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CurveConfig {
    Linear {
        intercept: f64,
        slope: f64,
        /// Absent means unbounded.
        #[serde(default)]
        max_rate: Option<f64>,
    },
    PolynomialDemand {
        power: f64,
        maximum_rate: f64,
        max_demand: f64,
    },
    PolynomialSupply {
        power: f64,
        normalization: f64,
        max_supply: f64,
    },
}

impl CurveConfig {
    fn build(&self) -> Result<Box<dyn BoundedUnivariateFunction>, ConfigError> {
        Ok(match *self {
            CurveConfig::Linear {
                intercept,
                slope,
                max_rate,
            } => match max_rate {
                Some(max_rate) => {
                    ConfigError::check_tolerance("max_rate", max_rate)?;
                    Box::new(LinearResponse::bounded(intercept, slope, max_rate))
                }
                None => Box::new(LinearResponse::unbounded(intercept, slope)),
            },
            CurveConfig::PolynomialDemand {
                power,
                maximum_rate,
                max_demand,
            } => {
                ConfigError::check_positive("power", power)?;
                ConfigError::check_positive("maximum_rate", maximum_rate)?;
                Box::new(PolynomialDemandResponse::new(power, maximum_rate, max_demand))
            }
            CurveConfig::PolynomialSupply {
                power,
                normalization,
                max_supply,
            } => {
                ConfigError::check_positive("power", power)?;
                ConfigError::check_positive("normalization", normalization)?;
                Box::new(PolynomialSupplyResponse::new(power, normalization, max_supply))
            }
        })
    }
}

/// How a participant's total response is divided across its opportunities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PartitionConfig {
    /// No partition: the curve is evaluated at each opportunity's own rate.
    #[default]
    Independent,
    ExpIoc { intensity: f64 },
    InverseExpIoc { intensity: f64 },
    TrivialUnbiased,
}

/// Complete description of one participant's response function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub curve: CurveConfig,
    #[serde(default)]
    pub partition: PartitionConfig,
    /// Quantise rates to this step before evaluating the curve.
    #[serde(default)]
    pub step: Option<f64>,
}

impl ResponseConfig {
    pub fn new(curve: CurveConfig, partition: PartitionConfig) -> Self {
        Self {
            curve,
            partition,
            step: None,
        }
    }

    pub fn build(&self) -> Result<Box<dyn MarketResponseFunction>, ConfigError> {
        let mut inner = self.curve.build()?;
        if let Some(step) = self.step {
            ConfigError::check_positive("step", step)?;
            inner = Box::new(StepResponse::new(inner, step));
        }
        let partition: Box<dyn PartitionFunction> = match self.partition {
            PartitionConfig::Independent => return Ok(Box::new(UnivariateResponseFunction::new(inner))),
            PartitionConfig::ExpIoc { intensity } => {
                ConfigError::check_tolerance("intensity", intensity)?;
                Box::new(ExpIocPartition { intensity })
            }
            PartitionConfig::InverseExpIoc { intensity } => {
                ConfigError::check_tolerance("intensity", intensity)?;
                Box::new(InverseExpIocPartition { intensity })
            }
            PartitionConfig::TrivialUnbiased => Box::new(TrivialUnbiasedPartition),
        };
        Ok(Box::new(PartitionedResponseFunction::new(partition, inner)))
    }
}
