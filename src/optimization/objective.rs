use crate::graph::network::MixedClearingNetwork;
use crate::optimization::linalg::Matrix;

/// Step scale for central differences: `sqrt(5·ε)`.
fn difference_step() -> f64 {
    (5.0 * f64::EPSILON).sqrt()
}

/// A clearing network seen as a multivariate problem over its edge rates.
///
/// Every trial point is first projected into the box `[0, max admissible]`
/// per edge; evaluation moves the network to that point and refreshes
/// every node response.
pub struct NetworkObjective<'a, P> {
    network: &'a mut MixedClearingNetwork<P>,
    maxima: Vec<f64>,
    /// For each edge, itself followed by every edge sharing a participant.
    neighbourhoods: Vec<Vec<usize>>,
    evaluations: usize,
}

impl<'a, P> NetworkObjective<'a, P> {
    pub fn new(network: &'a mut MixedClearingNetwork<P>) -> Self {
        let maxima = network.maximum_admissible_rates();
        let neighbourhoods = (0..network.number_of_edges())
            .map(|edge| {
                let mut rows = vec![edge];
                rows.extend(network.touching_edges(edge));
                rows
            })
            .collect();
        Self {
            network,
            maxima,
            neighbourhoods,
            evaluations: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.maxima.len()
    }

    pub fn maxima(&self) -> &[f64] {
        &self.maxima
    }

    /// Number of full network evaluations made so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// `min(1, max admissible)` on every edge.
    pub fn start_point(&self) -> Vec<f64> {
        self.maxima.iter().map(|&m| m.min(1.0).max(0.0)).collect()
    }

    pub fn project(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.maxima)
            .map(|(&v, &m)| v.max(0.0).min(m))
            .collect()
    }

    fn move_to(&mut self, x: &[f64]) {
        let projected = self.project(x);
        self.network.set_edge_rates(&projected);
        self.evaluations += 1;
    }

    /// Edge costs at `x`.
    pub fn costs(&mut self, x: &[f64]) -> Vec<f64> {
        self.move_to(x);
        self.network.edge_costs()
    }

    /// Network residual (mean squared cost) at `x`.
    pub fn residual(&mut self, x: &[f64]) -> f64 {
        self.move_to(x);
        self.network.residual_cost()
    }

    /// Costs of `rows` with edge `edge` moved to `rate`, all else unchanged.
    fn perturbed_costs(&mut self, edge: usize, rate: f64, rows: &[usize]) -> Vec<f64> {
        self.network.set_edge_rate(edge, rate);
        for &row in rows {
            self.network.flag_edge(row);
        }
        self.network.update_all_vertex_responses();
        rows.iter().map(|&row| self.network.edge_cost(row)).collect()
    }

    /// Central-difference Jacobian `J[i][j] = ∂cost_i / ∂rate_j` at `x`.
    ///
    /// Only entries where edge `i` is `j` or touches `j` are estimated; all
    /// others are zero. Steps are clipped into the edge's domain, giving a
    /// one-sided difference at a bound. The network is left at `x`.
    pub fn jacobian(&mut self, x: &[f64]) -> Matrix {
        let n = self.dimension();
        let x = self.project(x);
        self.move_to(&x);
        let mut jacobian = vec![vec![0.0; n]; n];
        let step = difference_step();
        for column in 0..n {
            let rows = self.neighbourhoods[column].clone();
            let rate = x[column];
            let h = step * rate.abs().max(1.0);
            let upper = (rate + h).min(self.maxima[column]);
            let lower = (rate - h).max(0.0);
            if !(upper > lower) {
                continue;
            }
            let above = self.perturbed_costs(column, upper, &rows);
            let below = self.perturbed_costs(column, lower, &rows);
            for (k, &row) in rows.iter().enumerate() {
                jacobian[row][column] = (above[k] - below[k]) / (upper - lower);
            }
            self.perturbed_costs(column, rate, &rows);
        }
        jacobian
    }
}

/// Whether two successive values agree to within the given tolerances.
pub(crate) fn values_converged(previous: f64, current: f64, relative: f64, absolute: f64) -> bool {
    let difference = (previous - current).abs();
    let size = previous.abs().max(current.abs());
    difference <= size * relative || difference <= absolute
}
