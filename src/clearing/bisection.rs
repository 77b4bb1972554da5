use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BisectionError {
    #[error("bisection range is inverted: [{min}, {max}]")]
    InvertedRange { min: f64, max: f64 },
    #[error("target value is not bracketed by the range endpoints")]
    NotBracketed,
}

/// A bracket `[lower, upper]` around a root, with the predicted root
/// location at its midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub lower: f64,
    pub predicted: f64,
    pub upper: f64,
}

impl Bracket {
    fn degenerate(at: f64) -> Self {
        Self {
            lower: at,
            predicted: at,
            upper: at,
        }
    }
}

/// Distance from `|x|` to the next representable double.
pub(crate) fn ulp(x: f64) -> f64 {
    let x = x.abs();
    if !x.is_finite() {
        return f64::NAN;
    }
    f64::from_bits(x.to_bits() + 1) - x
}

/// Bracketed bisection for the point where a function crosses a target
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueBisector {
    max_iterations: usize,
}

impl ValueBisector {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Narrow `[min, max]` around the crossing of `target`.
    ///
    /// Each halving keeps the half on which the function changes side of
    /// the target. Iteration ends when the bracket is no wider than ten
    /// ulps of its low end, or after `max_iterations` halvings. If an
    /// endpoint hits the target exactly, the result is a degenerate
    /// bracket at that endpoint.
    pub fn bisect<F>(&self, mut f: F, min: f64, max: f64, target: f64) -> Result<Bracket, BisectionError>
    where
        F: FnMut(f64) -> f64,
    {
        if max < min {
            return Err(BisectionError::InvertedRange { min, max });
        }
        let lower_eval = f(min);
        let upper_eval = f(max);
        if lower_eval == target {
            return Ok(Bracket::degenerate(min));
        }
        if upper_eval == target {
            return Ok(Bracket::degenerate(max));
        }
        let product = (lower_eval - target) * (upper_eval - target);
        if product > 0.0 || product.is_nan() {
            return Err(BisectionError::NotBracketed);
        }

        // Walk from the side below the target to the side above it.
        let inverted = lower_eval > upper_eval;
        let (mut below, mut above) = if inverted { (max, min) } else { (min, max) };
        let mut iterations = 0;
        while (above - below).abs() > 10.0 * ulp(below) && iterations < self.max_iterations {
            let query = 0.5 * (below + above);
            if f(query) >= target {
                above = query;
            } else {
                below = query;
            }
            iterations += 1;
        }

        let predicted = 0.5 * (below + above);
        Ok(if inverted {
            Bracket {
                lower: above,
                predicted,
                upper: below,
            }
        } else {
            Bracket {
                lower: below,
                predicted,
                upper: above,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_increasing_function() {
        let bracket = ValueBisector::new(200).bisect(|x| x * x, 0.0, 1.0, 0.5).unwrap();
        assert_abs_diff_eq!(bracket.predicted, 0.5f64.sqrt(), epsilon = 1e-12);
        assert!(bracket.lower <= bracket.predicted && bracket.predicted <= bracket.upper);
    }

    #[test]
    fn test_decreasing_function() {
        let bracket = ValueBisector::new(200)
            .bisect(|x| 1.0 - x * x, 0.0, 1.0, 0.7)
            .unwrap();
        assert_abs_diff_eq!(bracket.predicted, 0.3f64.sqrt(), epsilon = 1e-12);
        assert!(bracket.lower <= bracket.upper);
    }

    #[test]
    fn test_iteration_limit_bounds_width() {
        let bracket = ValueBisector::new(10).bisect(|x| x - 0.3, 0.0, 1.0, 0.0).unwrap();
        assert_abs_diff_eq!(bracket.upper - bracket.lower, 1.0 / 1024.0, epsilon = 1e-15);
        assert!(bracket.lower <= 0.3 && 0.3 <= bracket.upper);
    }

    #[test]
    fn test_exact_endpoint_is_degenerate() {
        let bracket = ValueBisector::new(30).bisect(|x| x, 0.0, 1.0, 0.0).unwrap();
        assert_eq!(bracket, Bracket::degenerate(0.0));
    }

    #[test]
    fn test_unbracketed_and_inverted() {
        let bisector = ValueBisector::new(30);
        assert_eq!(
            bisector.bisect(|x| x + 1.0, 0.0, 1.0, 0.0),
            Err(BisectionError::NotBracketed)
        );
        assert_eq!(
            bisector.bisect(|_| f64::NAN, 0.0, 1.0, 0.0),
            Err(BisectionError::NotBracketed)
        );
        assert!(matches!(
            bisector.bisect(|x| x, 1.0, 0.0, 0.5),
            Err(BisectionError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_ulp() {
        assert_eq!(ulp(1.0), f64::EPSILON);
        assert_eq!(ulp(-1.0), f64::EPSILON);
        assert!(ulp(0.0) > 0.0);
    }
}
