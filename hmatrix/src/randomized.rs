//! Randomized low-rank factorizations
//!
//! The compression workhorses of the engine: randomized SVD with a
//! Gaussian range finder, and one-/two-sided interpolative decompositions
//! built on column-pivoted QR.

use crate::dense::{dense_gemm, dense_trsm, Dense};
use crate::error::Result;
use crate::functions::random_normal;
use crate::ops::qr::dense_qr;
use crate::ops::{Side, Uplo};

/// Thin SVD of a dense block; returns `(u, s, vt)` with `u` m×k, `s`
/// descending, `vt` k×n, k = min(m, n).
pub(crate) fn dense_svd(a: &Dense) -> Result<(Dense, Vec<f64>, Dense)> {
    let (m, n) = (a.n_rows(), a.n_cols());
    let k = m.min(n);
    let mut buf = a.pack();
    let out = hlax::svd::svd(a.layout(), &mut buf)?;
    let mut u = Dense::new(m, k);
    u.unpack(&out.u);
    let mut vt = Dense::new(k, n);
    vt.unpack(&out.vt);
    Ok((u, out.s, vt))
}

/// Randomized SVD: `a ≈ u · s · v` with `u` m×`sample_size`, `s`
/// `sample_size`² diagonal, `v` `sample_size`×n. The caller truncates the
/// factors to the target rank.
///
/// Range finder: Gaussian sampling matrix Ω, Y = A·Ω, Q from QR(Y), then
/// the SVD of the small matrix QᵀA is lifted back through Q.
pub fn rsvd(a: &Dense, sample_size: usize) -> Result<(Dense, Dense, Dense)> {
    let (m, n) = (a.n_rows(), a.n_cols());
    assert!(
        sample_size >= 1 && sample_size <= m.min(n),
        "rsvd sample size {} out of range for {}x{}",
        sample_size,
        m,
        n
    );
    let omega = Dense::from_kernel(random_normal, &[], n, sample_size, 0, 0);
    let mut y = Dense::new(m, sample_size);
    dense_gemm(a, &omega, &mut y, false, false, 1.0, 0.0);

    let mut q = Dense::new(m, sample_size);
    let mut r = Dense::new(sample_size, sample_size);
    dense_qr(&y, &mut q, &mut r)?;

    let mut qta = Dense::new(sample_size, n);
    dense_gemm(&q, a, &mut qta, true, false, 1.0, 0.0);
    let (u_small, sigma, vt) = dense_svd(&qta)?;

    let mut u = Dense::new(m, sample_size);
    dense_gemm(&q, &u_small, &mut u, false, false, 1.0, 0.0);
    let mut s = Dense::new(sample_size, sample_size);
    for (i, val) in sigma.iter().enumerate() {
        s.set(i, i, *val);
    }
    Ok((u, s, vt))
}

/// One-sided interpolative decomposition: `a ≈ a[:, pivots] · v` with `v`
/// k×n. `v` is the pivot-permuted `[I_k | R11⁻¹·R12]` of the
/// column-pivoted QR of `a`.
pub fn one_sided_id(a: &Dense, k: usize) -> Result<(Dense, Vec<usize>)> {
    let (m, n) = (a.n_rows(), a.n_cols());
    assert!(
        k >= 1 && k <= m.min(n),
        "one_sided_id rank {} out of range for {}x{}",
        k,
        m,
        n
    );
    let mut buf = a.pack();
    let jpvt = hlax::geqp3::geqp3(a.layout(), &mut buf)?;

    let mut r11 = Dense::new(k, k);
    for i in 0..k {
        for j in i..k {
            r11.set(i, j, buf[i * n + j]);
        }
    }
    let mut t = Dense::new(k, n - k);
    for i in 0..k {
        for j in k..n {
            t.set(i, j - k, buf[i * n + j]);
        }
    }
    // T := R11⁻¹ · R12
    dense_trsm(&r11, &mut t, Side::Left, Uplo::Upper);

    // Undo the column permutation: column j of [I | T] is column jpvt[j]
    // of V.
    let mut v = Dense::new(k, n);
    for j in 0..n {
        let pj = jpvt[j] as usize;
        for i in 0..k {
            let val = if j < k {
                if i == j {
                    1.0
                } else {
                    0.0
                }
            } else {
                t.at(i, j - k)
            };
            v.set(i, pj, val);
        }
    }
    let pivots = jpvt[..k].iter().map(|&p| p as usize).collect();
    Ok((v, pivots))
}

/// Two-sided interpolative decomposition: `a ≈ u · s · v` with
/// `s = a[row_pivots, col_pivots]` an actual k×k submatrix of `a`.
pub fn two_sided_id(a: &Dense, k: usize) -> Result<(Dense, Dense, Dense)> {
    let (v, col_pivots) = one_sided_id(a, k)?;
    let at = a.transposed();
    let (ut, row_pivots) = one_sided_id(&at, k)?;
    let u = ut.transposed();
    let mut s = Dense::new(k, k);
    for i in 0..k {
        for j in 0..k {
            s.set(i, j, a.at(row_pivots[i], col_pivots[j]));
        }
    }
    Ok((u, s, v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{get_sorted_random_vector, laplace1d};

    #[test]
    fn rsvd_factors_are_orthonormal() {
        let x = vec![get_sorted_random_vector(64)];
        let a = Dense::from_kernel(laplace1d, &x, 64, 64, 0, 0);
        let (u, _s, v) = rsvd(&a, 16).unwrap();
        let mut utu = Dense::new(16, 16);
        dense_gemm(&u, &u, &mut utu, true, false, 1.0, 0.0);
        let mut vvt = Dense::new(16, 16);
        dense_gemm(&v, &v, &mut vvt, false, true, 1.0, 0.0);
        for i in 0..16 {
            for j in 0..16 {
                let id = if i == j { 1.0 } else { 0.0 };
                assert!((utu.at(i, j) - id).abs() < 1e-10);
                assert!((vvt.at(i, j) - id).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn one_sided_id_pivots_are_column_indices() {
        let x = vec![get_sorted_random_vector(32)];
        let a = Dense::from_kernel(laplace1d, &x, 32, 32, 0, 0);
        let (v, pivots) = one_sided_id(&a, 8).unwrap();
        assert_eq!(v.n_rows(), 8);
        assert_eq!(v.n_cols(), 32);
        assert_eq!(pivots.len(), 8);
        assert!(pivots.iter().all(|&p| p < 32));
    }
}
