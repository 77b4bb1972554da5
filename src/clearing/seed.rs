//! Seed selection: starting rates with a known merit-function sign.
//!
//! Each selector probes edges through [`MixedClearingNetwork::evaluate_edge_at`],
//! which moves the probed edge; the marching skeleton overwrites every rate
//! with the returned seeds afterwards.

use crate::core::error::ClearingError;
use crate::core::response::is_unbounded;
use crate::graph::network::MixedClearingNetwork;
use log::{debug, warn};
use rand::Rng;

/// Largest exponent of the Descent back-off schedule.
pub const DESCENT_PROBES: u32 = 22;

pub trait SeedSelection {
    fn find_seed_rates<P>(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError>;
}

fn seeding_failed(edge: usize, reason: &str) -> ClearingError {
    warn!("seeding failed on edge {}: {}", edge, reason);
    ClearingError::SeedingFailed { edge }
}

/// Seed every edge at rate zero, provided the merit function there is
/// non-negative.
#[derive(Debug, Clone, Copy, Default)]
pub struct AscentSeed;

impl SeedSelection for AscentSeed {
    fn find_seed_rates<P>(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        for edge in 0..network.number_of_edges() {
            let cost = network.evaluate_edge_at(edge, 0.0);
            if !(cost >= 0.0) {
                return Err(seeding_failed(edge, &format!("merit {} at zero rate", cost)));
            }
        }
        Ok(vec![0.0; network.number_of_edges()])
    }
}

/// Seed every edge at rate zero, with no sign requirement beyond the merit
/// function being defined there.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroSeed;

impl SeedSelection for ZeroSeed {
    fn find_seed_rates<P>(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        for edge in 0..network.number_of_edges() {
            if network.evaluate_edge_at(edge, 0.0).is_nan() {
                return Err(seeding_failed(edge, "merit undefined at zero rate"));
            }
        }
        Ok(vec![0.0; network.number_of_edges()])
    }
}

/// Seed each edge just below its maximum admissible rate, backing off
/// geometrically until the merit function is negative.
///
/// Probe `j` sits at `max · (1 − 10^(−j/2))`; probes run from
/// `j = DESCENT_PROBES` (closest to the maximum) down to `j = 1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescentSeed;

impl DescentSeed {
    pub fn probe_rate(maximum: f64, j: u32) -> f64 {
        maximum * (1.0 - 10f64.powf(-(j as f64) / 2.0))
    }
}

impl SeedSelection for DescentSeed {
    fn find_seed_rates<P>(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        let mut seeds = Vec::with_capacity(network.number_of_edges());
        for edge in 0..network.number_of_edges() {
            let maximum = network.maximum_rate_admissible_by_both_parties(edge);
            if is_unbounded(maximum) {
                return Err(seeding_failed(edge, "unbounded rate domain"));
            }
            let seed = (1..=DESCENT_PROBES)
                .rev()
                .map(|j| Self::probe_rate(maximum, j))
                .find(|&rate| network.evaluate_edge_at(edge, rate) < 0.0);
            match seed {
                Some(rate) => seeds.push(rate),
                None => return Err(seeding_failed(edge, "no probe with negative merit")),
            }
        }
        debug!("descent seeds: {:?}", seeds);
        Ok(seeds)
    }
}

/// Seed each edge uniformly at random within ±10% of half its maximum
/// admissible rate.
#[derive(Debug, Clone)]
pub struct ShotgunSeed<R> {
    rng: R,
}

impl<R: Rng> ShotgunSeed<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> SeedSelection for ShotgunSeed<R> {
    fn find_seed_rates<P>(&mut self, network: &mut MixedClearingNetwork<P>) -> Result<Vec<f64>, ClearingError> {
        let mut seeds = Vec::with_capacity(network.number_of_edges());
        for edge in 0..network.number_of_edges() {
            let maximum = network.maximum_rate_admissible_by_both_parties(edge);
            if is_unbounded(maximum) {
                return Err(seeding_failed(edge, "unbounded rate domain"));
            }
            let jitter: f64 = self.rng.gen_range(-0.1..=0.1);
            seeds.push(0.5 * maximum * (1.0 + jitter));
        }
        Ok(seeds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clearing::test_support::{single_edge_network, step_network};
    use approx::assert_abs_diff_eq;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ascent_seed_requires_non_negative_merit() {
        let mut network = single_edge_network(100.0, -10.0, 10.0, 0.0, -5.0, 20.0);
        assert_eq!(AscentSeed.find_seed_rates(&mut network), Ok(vec![0.0]));

        let mut negative = single_edge_network(-1.0, -10.0, 10.0, 0.0, -5.0, 20.0);
        assert_eq!(
            AscentSeed.find_seed_rates(&mut negative),
            Err(ClearingError::SeedingFailed { edge: 0 })
        );
    }

    #[test]
    fn test_descent_seed_lands_on_closest_probe() {
        // Merit is negative everywhere below the maximum rate of 10.
        let mut network = step_network(10.0, -1.0, 0.0);
        let seeds = DescentSeed.find_seed_rates(&mut network).unwrap();
        assert_eq!(seeds, vec![DescentSeed::probe_rate(10.0, DESCENT_PROBES)]);
        assert!(seeds[0] < 10.0 && seeds[0] > 10.0 * (1.0 - 1.0e-10));
    }

    #[test]
    fn test_descent_seed_fails_when_merit_never_negative() {
        let mut network = step_network(10.0, 1.0, 0.0);
        assert_eq!(
            DescentSeed.find_seed_rates(&mut network),
            Err(ClearingError::SeedingFailed { edge: 0 })
        );
    }

    #[test]
    fn test_descent_seed_stays_below_maximum() {
        // Merit 50 - 10r on [0, 10]: negative only above 5.
        let mut network = single_edge_network(50.0, -5.0, 10.0, 0.0, -5.0, 10.0);
        let seeds = DescentSeed.find_seed_rates(&mut network).unwrap();
        assert!(seeds[0] > 5.0 && seeds[0] < 10.0);
    }

    #[test]
    fn test_descent_seed_rejects_unbounded_domain() {
        let mut network = single_edge_network(
            1.0,
            -1.0,
            crate::core::response::UNBOUNDED_RATE,
            0.0,
            -1.0,
            crate::core::response::UNBOUNDED_RATE,
        );
        assert!(DescentSeed.find_seed_rates(&mut network).is_err());
    }

    #[test]
    fn test_shotgun_seed_is_reproducible_and_near_half() {
        let mut network = single_edge_network(100.0, -10.0, 10.0, 0.0, -5.0, 20.0);
        let a = ShotgunSeed::new(StdRng::seed_from_u64(7))
            .find_seed_rates(&mut network)
            .unwrap();
        let b = ShotgunSeed::new(StdRng::seed_from_u64(7))
            .find_seed_rates(&mut network)
            .unwrap();
        assert_eq!(a, b);
        assert!(a[0] >= 4.5 && a[0] <= 5.5);
    }

    #[test]
    fn test_shotgun_seed_reaches_both_ends_of_jitter() {
        let mut network = single_edge_network(100.0, -10.0, 10.0, 0.0, -5.0, 20.0);
        let lowest = ShotgunSeed::new(StepRng::new(0, 0))
            .find_seed_rates(&mut network)
            .unwrap();
        assert_abs_diff_eq!(lowest[0], 4.5, epsilon = 1e-12);

        let highest = ShotgunSeed::new(StepRng::new(u64::MAX, 0))
            .find_seed_rates(&mut network)
            .unwrap();
        assert_abs_diff_eq!(highest[0], 5.5, epsilon = 1e-12);
    }
}
