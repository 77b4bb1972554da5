//! Concrete univariate response curves.
//!
//! Demand curves are positive and decreasing in rate; supply curves are
//! negative and decreasing (supply grows in magnitude as the rate rises).

use crate::core::response::{BoundedDomain, BoundedUnivariateFunction, UNBOUNDED_RATE};

/// `intercept + slope · r` on `[0, max_rate]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearResponse {
    intercept: f64,
    slope: f64,
    max_rate: f64,
}

impl LinearResponse {
    pub fn bounded(intercept: f64, slope: f64, max_rate: f64) -> Self {
        assert!(max_rate >= 0.0, "LinearResponse: maximum rate must be non-negative");
        Self {
            intercept,
            slope,
            max_rate,
        }
    }

    pub fn unbounded(intercept: f64, slope: f64) -> Self {
        Self::bounded(intercept, slope, UNBOUNDED_RATE)
    }
}

impl BoundedDomain for LinearResponse {
    fn maximum_in_domain(&self) -> f64 {
        self.max_rate
    }
}

impl BoundedUnivariateFunction for LinearResponse {
    fn value(&self, rate: f64) -> f64 {
        self.intercept + self.slope * rate
    }
}

/// `D · (1 − (r/R)^p)` on `[0, R]`: full demand `D` at zero rate, none at
/// the maximum rate `R`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialDemandResponse {
    power: f64,
    maximum_rate: f64,
    max_demand: f64,
}

impl PolynomialDemandResponse {
    pub fn new(power: f64, maximum_rate: f64, max_demand: f64) -> Self {
        assert!(power > 0.0, "PolynomialDemandResponse: power must be positive");
        assert!(maximum_rate > 0.0, "PolynomialDemandResponse: maximum rate must be positive");
        Self {
            power,
            maximum_rate,
            max_demand,
        }
    }
}

impl BoundedDomain for PolynomialDemandResponse {
    fn maximum_in_domain(&self) -> f64 {
        self.maximum_rate
    }
}

impl BoundedUnivariateFunction for PolynomialDemandResponse {
    fn value(&self, rate: f64) -> f64 {
        let x = (rate / self.maximum_rate).max(0.0);
        self.max_demand * (1.0 - x.powf(self.power))
    }
}

/// `−S · (r/N)^p` on an unbounded domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialSupplyResponse {
    power: f64,
    normalization: f64,
    max_supply: f64,
}

impl PolynomialSupplyResponse {
    pub fn new(power: f64, normalization: f64, max_supply: f64) -> Self {
        assert!(power > 0.0, "PolynomialSupplyResponse: power must be positive");
        assert!(normalization > 0.0, "PolynomialSupplyResponse: normalization must be positive");
        Self {
            power,
            normalization,
            max_supply,
        }
    }
}

impl BoundedDomain for PolynomialSupplyResponse {}

impl BoundedUnivariateFunction for PolynomialSupplyResponse {
    fn value(&self, rate: f64) -> f64 {
        let x = (rate / self.normalization).max(0.0);
        -self.max_supply * x.powf(self.power)
    }
}

/// Quantises the rate to multiples of `step` before evaluating `inner`,
/// producing a piecewise-constant response.
pub struct StepResponse {
    inner: Box<dyn BoundedUnivariateFunction>,
    step: f64,
}

impl StepResponse {
    pub fn new(inner: Box<dyn BoundedUnivariateFunction>, step: f64) -> Self {
        assert!(step > 0.0 && step.is_finite(), "StepResponse: step must be positive");
        Self { inner, step }
    }
}

impl BoundedDomain for StepResponse {
    fn minimum_in_domain(&self) -> f64 {
        self.inner.minimum_in_domain()
    }

    fn maximum_in_domain(&self) -> f64 {
        self.inner.maximum_in_domain()
    }
}

impl BoundedUnivariateFunction for StepResponse {
    fn value(&self, rate: f64) -> f64 {
        self.inner.value((rate / self.step).floor() * self.step)
    }
}
