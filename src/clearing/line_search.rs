//! Brent line search inside a box.

use crate::core::response::is_unbounded;

/// (3 − √5) / 2
const GOLDEN_SECTION: f64 = 0.381_966_011_250_105_1;

#[derive(Debug, Clone, PartialEq)]
pub struct LineSearchResult {
    pub point: Vec<f64>,
    pub value: f64,
    /// Distance travelled along the normalized search direction.
    pub distance: f64,
}

/// Minimizes a multivariate function along one direction with Brent's
/// method, never leaving the box `[minima, maxima]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrentLineSearch {
    relative_tolerance: f64,
    absolute_tolerance: f64,
    max_evaluations: usize,
}

impl Default for BrentLineSearch {
    fn default() -> Self {
        Self {
            relative_tolerance: 1.0e-10,
            absolute_tolerance: 1.0e-14,
            max_evaluations: 100,
        }
    }
}

impl BrentLineSearch {
    pub fn new(relative_tolerance: f64, absolute_tolerance: f64, max_evaluations: usize) -> Self {
        assert!(
            relative_tolerance > 0.0 || absolute_tolerance > 0.0,
            "BrentLineSearch: at least one tolerance must be positive"
        );
        assert!(max_evaluations > 0, "BrentLineSearch: evaluation budget must be positive");
        Self {
            relative_tolerance,
            absolute_tolerance,
            max_evaluations,
        }
    }

    /// Minimize `f` over `[lower, upper]`. Returns the best abscissa and its
    /// value.
    pub fn minimize<F>(&self, f: &mut F, lower: f64, upper: f64) -> (f64, f64)
    where
        F: FnMut(f64) -> f64,
    {
        let (mut a, mut b) = (lower, upper);
        let mut x = a + GOLDEN_SECTION * (b - a);
        let (mut w, mut v) = (x, x);
        let mut fx = f(x);
        let (mut fw, mut fv) = (fx, fx);
        let mut evaluations = 1;
        let mut d: f64 = 0.0;
        let mut e: f64 = 0.0;

        while evaluations < self.max_evaluations {
            let midpoint = 0.5 * (a + b);
            let tol1 = self.relative_tolerance * x.abs() + self.absolute_tolerance;
            let tol2 = 2.0 * tol1;
            if (x - midpoint).abs() <= tol2 - 0.5 * (b - a) {
                break;
            }

            let mut golden = true;
            if e.abs() > tol1 {
                // Try a parabola through x, w and v.
                let r = (x - w) * (fx - fv);
                let mut q = (x - v) * (fx - fw);
                let mut p = (x - v) * q - (x - w) * r;
                q = 2.0 * (q - r);
                if q > 0.0 {
                    p = -p;
                } else {
                    q = -q;
                }
                let previous = e;
                e = d;
                if p.abs() < (0.5 * q * previous).abs() && p > q * (a - x) && p < q * (b - x) {
                    d = p / q;
                    let u = x + d;
                    if u - a < tol2 || b - u < tol2 {
                        d = if x <= midpoint { tol1 } else { -tol1 };
                    }
                    golden = false;
                }
            }
            if golden {
                e = if x < midpoint { b - x } else { a - x };
                d = GOLDEN_SECTION * e;
            }

            let u = if d.abs() >= tol1 {
                x + d
            } else if d > 0.0 {
                x + tol1
            } else {
                x - tol1
            };
            let fu = f(u);
            evaluations += 1;

            if fu <= fx {
                if u < x {
                    b = x;
                } else {
                    a = x;
                }
                v = w;
                fv = fw;
                w = x;
                fw = fx;
                x = u;
                fx = fu;
            } else {
                if u < x {
                    a = u;
                } else {
                    b = u;
                }
                if fu <= fw || w == x {
                    v = w;
                    fv = fw;
                    w = u;
                    fw = fu;
                } else if fu <= fv || v == x || v == w {
                    v = u;
                    fv = fu;
                }
            }
        }
        (x, fx)
    }

    /// Minimize `f` from `start` along `direction`, clipped to the box.
    ///
    /// An unbounded coordinate (any maximum of `f64::MAX` or above) does not
    /// limit the search; if no coordinate does, the search travels at most
    /// the length of `direction`. The result is never worse than `start`.
    pub fn search<F>(
        &self,
        mut f: F,
        start: &[f64],
        direction: &[f64],
        minima: &[f64],
        maxima: &[f64],
    ) -> LineSearchResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        assert_eq!(start.len(), direction.len(), "line search: dimension mismatch");
        assert_eq!(start.len(), minima.len(), "line search: dimension mismatch");
        assert_eq!(start.len(), maxima.len(), "line search: dimension mismatch");

        let start_value = f(start);
        let unmoved = LineSearchResult {
            point: start.to_vec(),
            value: start_value,
            distance: 0.0,
        };

        let norm = direction.iter().map(|d| d * d).sum::<f64>().sqrt();
        if !(norm > 0.0 && norm.is_finite()) {
            return unmoved;
        }
        let unit: Vec<f64> = direction.iter().map(|d| d / norm).collect();

        let mut reach = f64::INFINITY;
        for i in 0..start.len() {
            let limit = if unit[i] > 0.0 {
                if is_unbounded(maxima[i]) {
                    continue;
                }
                (maxima[i] - start[i]) / unit[i]
            } else if unit[i] < 0.0 {
                (minima[i] - start[i]) / unit[i]
            } else {
                continue;
            };
            reach = reach.min(limit);
        }
        if reach.is_infinite() {
            reach = norm;
        }
        if !(reach > 0.0) {
            return unmoved;
        }

        let point_at = |t: f64| -> Vec<f64> {
            (0..start.len())
                .map(|i| (start[i] + t * unit[i]).max(minima[i]).min(maxima[i]))
                .collect()
        };
        let mut along = |t: f64| f(&point_at(t));
        let (distance, value) = self.minimize(&mut along, 0.0, reach);

        if value <= start_value {
            LineSearchResult {
                point: point_at(distance),
                value,
                distance,
            }
        } else {
            unmoved
        }
    }
}
