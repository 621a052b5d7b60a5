//! Matrix entry kernels and point-set helpers
//!
//! A kernel fills one dense block of the global operator: it receives the
//! block's buffer with its stride, the point set, and the block's position
//! on the global index line. All out-of-the-box kernels share this
//! signature so the constructors and the task layer can treat them
//! uniformly.

use rand::distributions::Distribution;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

/// `(data, rows, cols, stride, x, row_start, col_start)`
pub type Kernel = fn(&mut [f64], usize, usize, usize, &[Vec<f64>], usize, usize);

pub fn zeros(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    _x: &[Vec<f64>],
    _row_start: usize,
    _col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            a[i * stride + j] = 0.0;
        }
    }
}

pub fn identity(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    _x: &[Vec<f64>],
    row_start: usize,
    col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            a[i * stride + j] = if row_start + i == col_start + j { 1.0 } else { 0.0 };
        }
    }
}

pub fn arange(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    _x: &[Vec<f64>],
    _row_start: usize,
    _col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            a[i * stride + j] = (i * cols + j) as f64;
        }
    }
}

pub fn random_normal(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    _x: &[Vec<f64>],
    _row_start: usize,
    _col_start: usize,
) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let dist = Normal::new(0.0, 1.0).unwrap();
    for i in 0..rows {
        for j in 0..cols {
            a[i * stride + j] = dist.sample(&mut rng);
        }
    }
}

pub fn random_uniform(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    _x: &[Vec<f64>],
    _row_start: usize,
    _col_start: usize,
) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    for i in 0..rows {
        for j in 0..cols {
            a[i * stride + j] = rng.gen::<f64>();
        }
    }
}

/// 1-D Laplace kernel `1 / (|x_i - x_j| + 1e-3)` over `x[0]`.
pub fn laplace1d(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    x: &[Vec<f64>],
    row_start: usize,
    col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            let r = (x[0][i + row_start] - x[0][j + col_start]).abs();
            a[i * stride + j] = 1.0 / (r + 1e-3);
        }
    }
}

/// Cauchy kernel `1 / (x_i - y_j + 1e-2)` over two coordinate vectors.
pub fn cauchy2d(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    x: &[Vec<f64>],
    row_start: usize,
    col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            let rij = (x[0][i + row_start] - x[1][j + col_start]) + 1e-2;
            a[i * stride + j] = 1.0 / rij;
        }
    }
}

/// n-D Laplace kernel `1 / (‖p_i - p_j‖ + 1e-3)` over coordinate vectors.
pub fn laplacend(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    x: &[Vec<f64>],
    row_start: usize,
    col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            let mut rij = 0.0;
            for xk in x {
                let d = xk[i + row_start] - xk[j + col_start];
                rij += d * d;
            }
            a[i * stride + j] = 1.0 / (rij.sqrt() + 1e-3);
        }
    }
}

/// n-D Helmholtz kernel `exp(-r²) / (r + 1e-3)`.
pub fn helmholtznd(
    a: &mut [f64],
    rows: usize,
    cols: usize,
    stride: usize,
    x: &[Vec<f64>],
    row_start: usize,
    col_start: usize,
) {
    for i in 0..rows {
        for j in 0..cols {
            let mut rij = 0.0;
            for xk in x {
                let d = xk[i + row_start] - xk[j + col_start];
                rij += d * d;
            }
            a[i * stride + j] = (-rij).exp() / (rij.sqrt() + 1e-3);
        }
    }
}

/// `n` points spaced evenly over `[lo, hi]`.
pub fn equally_spaced_vector(n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let step = (hi - lo) / n as f64;
    (0..n).map(|i| lo + i as f64 * step).collect()
}

/// `n` uniform-random points in `[0, 1)`, sorted ascending.
pub fn get_sorted_random_vector(n: usize) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let mut x: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
    x.sort_by(|a, b| a.partial_cmp(b).unwrap());
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_tracks_global_position() {
        let mut a = vec![0.0; 4];
        identity(&mut a, 2, 2, 2, &[], 2, 0);
        assert_eq!(a, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn sorted_random_vector_is_sorted() {
        let x = get_sorted_random_vector(100);
        assert!(x.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn laplace_diagonal_is_capped() {
        let x = vec![equally_spaced_vector(4, 0.0, 1.0)];
        let mut a = vec![0.0; 16];
        laplace1d(&mut a, 4, 4, 4, &x, 0, 0);
        assert_eq!(a[0], 1e3);
        assert!(a[1] < a[0]);
    }
}
