use ndarray::{Array1, Array2};

/// Solves the ridge-regularized least-squares problem
/// `(XᵀX + λI) w = Xᵀy` by Gaussian elimination with partial pivoting.
/// Returns `None` when the system is singular or produces non-finite
/// coefficients; the regularization makes that rare in practice.
pub fn ridge_least_squares(x: &Array2<f64>, y: &Array1<f64>, lambda: f64) -> Option<Array1<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }

    let mut gram = x.t().dot(x);
    for i in 0..gram.nrows() {
        gram[[i, i]] += lambda;
    }
    let rhs = x.t().dot(y);

    let w = solve(gram, rhs)?;
    if w.iter().all(|v| v.is_finite()) {
        Some(w)
    } else {
        None
    }
}

fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n == 0 || a.ncols() != n || b.len() != n {
        return None;
    }

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        if a[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }

        if pivot_row != col {
            for k in 0..n {
                let tmp = a[[col, k]];
                a[[col, k]] = a[[pivot_row, k]];
                a[[pivot_row, k]] = tmp;
            }
            b.swap(col, pivot_row);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let mut sum = b[row];
        for k in (row + 1)..n {
            sum -= a[[row, k]] * x[k];
        }
        x[row] = sum / a[[row, row]];
    }

    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn recovers_exact_linear_coefficients() {
        // y = 2 + 3x over a handful of points.
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![2.0, 5.0, 8.0, 11.0];
        let w = ridge_least_squares(&x, &y, 0.0).unwrap();
        assert!((w[0] - 2.0).abs() < 1e-9);
        assert!((w[1] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn regularization_rescues_a_rank_deficient_system() {
        // Two identical columns: singular without the ridge term.
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![2.0, 4.0, 6.0];
        assert!(ridge_least_squares(&x, &y, 0.0).is_none());
        let w = ridge_least_squares(&x, &y, 1e-3).unwrap();
        assert!(w.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn empty_input_is_none() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert!(ridge_least_squares(&x, &y, 0.1).is_none());
    }
}
