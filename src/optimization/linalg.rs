//! Dense linear algebra for the small systems the fallback solvers build.
//!
//! Matrices are row-major `Vec<Vec<f64>>`.

pub type Matrix = Vec<Vec<f64>>;

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// `A · v`
pub fn multiply(a: &Matrix, v: &[f64]) -> Vec<f64> {
    a.iter().map(|row| dot(row, v)).collect()
}

/// `Aᵀ · v`
pub fn transpose_multiply(a: &Matrix, v: &[f64]) -> Vec<f64> {
    let columns = a.first().map_or(0, Vec::len);
    let mut out = vec![0.0; columns];
    for (row, &scale) in a.iter().zip(v) {
        for (o, &x) in out.iter_mut().zip(row) {
            *o += x * scale;
        }
    }
    out
}

/// `Aᵀ · A`
pub fn normal_matrix(a: &Matrix) -> Matrix {
    let columns = a.first().map_or(0, Vec::len);
    let mut out = vec![vec![0.0; columns]; columns];
    for row in a {
        for i in 0..columns {
            if row[i] == 0.0 {
                continue;
            }
            for j in 0..columns {
                out[i][j] += row[i] * row[j];
            }
        }
    }
    out
}

/// Solve `A · x = b` by Gaussian elimination with partial pivoting.
///
/// Returns `None` when `A` is singular to working precision.
pub fn solve(mut a: Matrix, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    debug_assert_eq!(a.len(), n);
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, x| m.max(x.abs()));
    if !(scale > 0.0 && scale.is_finite()) {
        return None;
    }
    let tiny = scale * f64::EPSILON * n as f64;

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if !(a[pivot][col].abs() > tiny) {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
