//! Block LU factorization, no pivoting across blocks
//!
//! The Dense leaf calls `dgetrf` and discards the pivot vector: the
//! contract of the hierarchical driver is that the caller has arranged
//! the block layout so diagonal dense leaves are nonsingular without row
//! permutation. Callers that need pivoting must re-block accordingly.

use crate::dense::Dense;
use crate::error::Result;
use crate::hierarchical::Hierarchical;
use crate::matrix::Matrix;
use crate::ops::gemm::gemm;
use crate::ops::trsm::trsm;
use crate::ops::{Side, Uplo};

/// In-place LU: consumes A, returns `(L, U)`.
///
/// For a Dense block, L is unit-lower and U upper. For a Hierarchical
/// block the driver is left-looking over the block grid; blocks of L
/// above the diagonal and of U below it are left empty.
pub fn getrf(a: Matrix) -> Result<(Matrix, Matrix)> {
    match a {
        Matrix::Dense(mut ad) => {
            let mut buf = ad.pack();
            // pivots deliberately discarded, see module docs
            let _ipiv = hlax::solve::lu(ad.layout(), &mut buf)?;
            ad.unpack(&buf);
            let (m, n) = (ad.n_rows(), ad.n_cols());
            let mut l = Dense::new(m, n);
            for i in 0..m {
                for j in 0..i.min(n) {
                    l.set(i, j, ad.at(i, j));
                    ad.set(i, j, 0.0);
                }
                if i < n {
                    l.set(i, i, 1.0);
                }
            }
            Ok((Matrix::Dense(l), Matrix::Dense(ad)))
        }
        Matrix::Hierarchical(mut ah) => {
            assert_eq!(
                ah.block_rows(),
                ah.block_cols(),
                "getrf needs a square block grid"
            );
            let d = ah.block_rows();
            let mut l = Hierarchical::new(d, d);
            for k in 0..d {
                let (lkk, ukk) = getrf(ah.at_mut(k, k).take())?;
                *l.at_mut(k, k) = lkk;
                *ah.at_mut(k, k) = ukk;
                for ic in k + 1..d {
                    *l.at_mut(ic, k) = ah.at_mut(ic, k).take();
                    trsm(ah.at(k, k), l.at_mut(ic, k), Side::Right, Uplo::Upper)?;
                }
                for j in k + 1..d {
                    let mut x = ah.at_mut(k, j).take();
                    trsm(l.at(k, k), &mut x, Side::Left, Uplo::Lower)?;
                    *ah.at_mut(k, j) = x;
                }
                for ic in k + 1..d {
                    for kc in k + 1..d {
                        let mut x = ah.at_mut(ic, kc).take();
                        gemm(l.at(ic, k), ah.at(k, kc), &mut x, -1.0, 1.0)?;
                        *ah.at_mut(ic, kc) = x;
                    }
                }
            }
            Ok((Matrix::Hierarchical(l), Matrix::Hierarchical(ah)))
        }
        Matrix::LowRank(_) => panic!("getrf(LowRank) undefined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::dense_gemm;
    use crate::functions::{get_sorted_random_vector, laplace1d};

    #[test]
    fn dense_factors_recombine() {
        let x = vec![get_sorted_random_vector(16)];
        let a = Dense::from_kernel(laplace1d, &x, 16, 16, 0, 0);
        let (l, u) = getrf(Matrix::Dense(a.clone())).unwrap();
        let (l, u) = (l.to_dense(), u.to_dense());
        for i in 0..16 {
            assert_eq!(l.at(i, i), 1.0);
            for j in i + 1..16 {
                assert_eq!(l.at(i, j), 0.0);
                assert_eq!(u.at(j, i), 0.0);
            }
        }
        let mut lu = Dense::new(16, 16);
        dense_gemm(&l, &u, &mut lu, false, false, 1.0, 0.0);
        let mut err: f64 = 0.0;
        for i in 0..16 {
            for j in 0..16 {
                err = err.max((lu.at(i, j) - a.at(i, j)).abs());
            }
        }
        assert!(err < 1e-8 * a.norm().sqrt());
    }
}
