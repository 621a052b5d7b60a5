//! Triangular solve dispatch: `A·X = B` or `X·A = B` with the factored
//! triangle of A
//!
//! Lower triangles are unit-diagonal, upper non-unit (the LU convention).
//! A LowRank right-hand side is solved on its column basis for lower
//! solves and its row basis for upper solves, decoupling the basis first
//! when it is shared. A Hierarchical system with a Dense right-hand side
//! re-blocks the right-hand side into a matching grid of views.

use crate::basis_tracker::decouple_basis;
use crate::dense::{dense_trmm, dense_trsm};
use crate::error::Result;
use crate::hierarchical::Hierarchical;
use crate::matrix::Matrix;
use crate::ops::gemm::gemm;
use crate::ops::{Side, Uplo};

pub fn trsm(a: &Matrix, b: &mut Matrix, side: Side, uplo: Uplo) -> Result<()> {
    let (a_name, b_name) = (a.type_name(), b.type_name());
    match (a, &mut *b) {
        (Matrix::Dense(ad), Matrix::Dense(bd)) => {
            dense_trsm(ad, bd, side, uplo);
            Ok(())
        }
        (Matrix::Dense(_), Matrix::LowRank(bl)) | (Matrix::Hierarchical(_), Matrix::LowRank(bl)) => {
            match uplo {
                Uplo::Lower => {
                    decouple_basis(&mut bl.u);
                    let mut u = Matrix::Dense(bl.u.share());
                    trsm(a, &mut u, side, uplo)
                }
                Uplo::Upper => {
                    decouple_basis(&mut bl.v);
                    let mut v = Matrix::Dense(bl.v.share());
                    trsm(a, &mut v, side, uplo)
                }
            }
        }
        (Matrix::Hierarchical(ah), Matrix::Hierarchical(bh)) => {
            block_substitution(ah, bh, side, uplo)
        }
        (Matrix::Hierarchical(ah), Matrix::Dense(bd)) => {
            let (d0, d1) = match side {
                Side::Left => (ah.block_cols(), 1),
                Side::Right => (1, ah.block_rows()),
            };
            let bm = Matrix::Dense(bd.share());
            let mut bh = Matrix::Hierarchical(Hierarchical::from_matrix(&bm, d0, d1, false));
            trsm(a, &mut bh, side, uplo)
        }
        _ => panic!("trsm({}, {}) undefined", a_name, b_name),
    }
}

/// Triangular multiply `B := op(A)·B` or `B·op(A)` with the named
/// triangle of A, non-unit diagonal. Defined on Dense operands.
pub fn trmm(a: &Matrix, b: &mut Matrix, side: Side, uplo: Uplo, transa: bool) {
    let ad = a.expect_dense("trmm");
    let bd = b.expect_dense_mut("trmm");
    dense_trmm(ad, bd, side, uplo, transa);
}

/// Forward/backward substitution over the block grid, accumulating the
/// already-solved blocks with rank-preserving GEMM updates.
fn block_substitution(
    a: &Hierarchical,
    b: &mut Hierarchical,
    side: Side,
    uplo: Uplo,
) -> Result<()> {
    assert_eq!(
        a.block_rows(),
        a.block_cols(),
        "trsm needs a square block grid"
    );
    match (side, uplo) {
        (Side::Left, Uplo::Lower) => {
            for j in 0..b.block_cols() {
                for i in 0..b.block_rows() {
                    let mut x = b.at_mut(i, j).take();
                    for i_old in 0..i {
                        gemm(a.at(i, i_old), b.at(i_old, j), &mut x, -1.0, 1.0)?;
                    }
                    trsm(a.at(i, i), &mut x, side, uplo)?;
                    *b.at_mut(i, j) = x;
                }
            }
        }
        (Side::Left, Uplo::Upper) => {
            for j in 0..b.block_cols() {
                for i in (0..b.block_rows()).rev() {
                    let mut x = b.at_mut(i, j).take();
                    for i_old in i + 1..b.block_rows() {
                        gemm(a.at(i, i_old), b.at(i_old, j), &mut x, -1.0, 1.0)?;
                    }
                    trsm(a.at(i, i), &mut x, side, uplo)?;
                    *b.at_mut(i, j) = x;
                }
            }
        }
        (Side::Right, Uplo::Upper) => {
            for i in 0..b.block_rows() {
                for j in 0..b.block_cols() {
                    let mut x = b.at_mut(i, j).take();
                    for j_old in 0..j {
                        gemm(b.at(i, j_old), a.at(j_old, j), &mut x, -1.0, 1.0)?;
                    }
                    trsm(a.at(j, j), &mut x, side, uplo)?;
                    *b.at_mut(i, j) = x;
                }
            }
        }
        (Side::Right, Uplo::Lower) => {
            for i in 0..b.block_rows() {
                for j in (0..b.block_cols()).rev() {
                    let mut x = b.at_mut(i, j).take();
                    for j_old in j + 1..b.block_cols() {
                        gemm(b.at(i, j_old), a.at(j_old, j), &mut x, -1.0, 1.0)?;
                    }
                    trsm(a.at(j, j), &mut x, side, uplo)?;
                    *b.at_mut(i, j) = x;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::{dense_gemm, Dense};
    use crate::functions::{get_sorted_random_vector, laplace1d};
    use crate::ops::getrf::getrf;
    use crate::ops::l2_error;

    #[test]
    fn dense_lu_solve_roundtrips() {
        let x = vec![get_sorted_random_vector(24)];
        let a = Dense::from_kernel(laplace1d, &x, 24, 24, 0, 0);
        let mut sol = Dense::new(24, 1);
        for i in 0..24 {
            sol.set(i, 0, (i as f64).sin() + 2.0);
        }
        let mut rhs = Dense::new(24, 1);
        dense_gemm(&a, &sol, &mut rhs, false, false, 1.0, 0.0);

        let (l, u) = getrf(Matrix::Dense(a)).unwrap();
        let mut b = Matrix::Dense(rhs);
        trsm(&l, &mut b, Side::Left, Uplo::Lower).unwrap();
        trsm(&u, &mut b, Side::Left, Uplo::Upper).unwrap();
        assert!(l2_error(&Matrix::Dense(sol), &b) < 1e-10);
    }
}
