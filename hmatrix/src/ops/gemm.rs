//! GEMM dispatch: `C = alpha·A·B + beta·C` for every defined
//! operand-variant triple
//!
//! Dense leaves go straight to BLAS. Low-rank operands multiply through
//! their factors so the large dimension is touched once. Hierarchical
//! operands recurse blockwise; a Dense or LowRank operand meeting a
//! Hierarchical one is first re-blocked into a matching grid of views.

use crate::dense::{dense_gemm, Dense};
use crate::error::Result;
use crate::hierarchical::Hierarchical;
use crate::low_rank::LowRank;
use crate::matrix::Matrix;

/// GEMM with transpose flags. Defined on Dense operands; the variant
/// dispatch of [gemm] always uses the non-transposed entry points.
pub fn gemm_transposed(
    a: &Matrix,
    b: &Matrix,
    c: &mut Matrix,
    transa: bool,
    transb: bool,
    alpha: f64,
    beta: f64,
) {
    let ad = a.expect_dense("gemm_transposed");
    let bd = b.expect_dense("gemm_transposed");
    let cd = c.expect_dense_mut("gemm_transposed");
    dense_gemm(ad, bd, cd, transa, transb, alpha, beta);
}

pub fn gemm(a: &Matrix, b: &Matrix, c: &mut Matrix, alpha: f64, beta: f64) -> Result<()> {
    if !has_direct_rule(a, b, c) {
        return gemm_reblock(a, b, c, alpha, beta);
    }
    match (a, b, &mut *c) {
        (Matrix::Dense(ad), Matrix::Dense(bd), Matrix::Dense(cd)) => {
            dense_gemm(ad, bd, cd, false, false, alpha, beta);
            Ok(())
        }
        (Matrix::LowRank(al), Matrix::Dense(bd), Matrix::Dense(cd)) => {
            // C += alpha·U·(S·(V·B))
            let mut vxb = Dense::new(al.rank(), bd.n_cols());
            dense_gemm(&al.v, bd, &mut vxb, false, false, 1.0, 0.0);
            let mut sxvxb = Dense::new(al.rank(), bd.n_cols());
            dense_gemm(&al.s, &vxb, &mut sxvxb, false, false, 1.0, 0.0);
            dense_gemm(&al.u, &sxvxb, cd, false, false, alpha, beta);
            Ok(())
        }
        (Matrix::Dense(ad), Matrix::LowRank(bl), Matrix::Dense(cd)) => {
            // C += alpha·((A·U)·S)·V
            let mut axu = Dense::new(ad.n_rows(), bl.rank());
            dense_gemm(ad, &bl.u, &mut axu, false, false, 1.0, 0.0);
            let mut axus = Dense::new(ad.n_rows(), bl.rank());
            dense_gemm(&axu, &bl.s, &mut axus, false, false, 1.0, 0.0);
            dense_gemm(&axus, &bl.v, cd, false, false, alpha, beta);
            Ok(())
        }
        (Matrix::LowRank(al), Matrix::LowRank(bl), Matrix::Dense(cd)) => {
            // C += alpha·Ua·(Sa·(Va·Ub)·Sb)·Vb
            let mut vxu = Dense::new(al.rank(), bl.rank());
            dense_gemm(&al.v, &bl.u, &mut vxu, false, false, 1.0, 0.0);
            let mut sxvxu = Dense::new(al.rank(), bl.rank());
            dense_gemm(&al.s, &vxu, &mut sxvxu, false, false, 1.0, 0.0);
            let mut sxvxus = Dense::new(al.rank(), bl.rank());
            dense_gemm(&sxvxu, &bl.s, &mut sxvxus, false, false, 1.0, 0.0);
            let mut uxsxvxus = Dense::new(al.n_rows(), bl.rank());
            dense_gemm(&al.u, &sxvxus, &mut uxsxvxus, false, false, 1.0, 0.0);
            dense_gemm(&uxsxvxus, &bl.v, cd, false, false, alpha, beta);
            Ok(())
        }
        (Matrix::Dense(ad), Matrix::Dense(bd), Matrix::LowRank(cl)) => {
            assert_eq!(cl.n_rows(), ad.n_rows(), "gemm(Dense,Dense,LowRank) row mismatch");
            assert_eq!(ad.n_cols(), bd.n_rows(), "gemm(Dense,Dense,LowRank) inner mismatch");
            assert_eq!(cl.n_cols(), bd.n_cols(), "gemm(Dense,Dense,LowRank) col mismatch");
            let mut ab = Dense::new(cl.n_rows(), cl.n_cols());
            dense_gemm(ad, bd, &mut ab, false, false, alpha, 0.0);
            cl.scale(beta);
            cl.add_assign(&LowRank::from_dense(&ab, cl.rank())?)
        }
        (Matrix::LowRank(al), Matrix::Dense(bd), Matrix::LowRank(cl)) => {
            // fold alpha and B into the row basis, then merge-add
            let mut v_new = Dense::new(al.rank(), bd.n_cols());
            dense_gemm(&al.v, bd, &mut v_new, false, false, alpha, 0.0);
            let avb = LowRank::from_factors(al.u.share(), al.s.clone(), v_new);
            cl.scale(beta);
            cl.add_assign(&avb)
        }
        (Matrix::Dense(ad), Matrix::LowRank(bl), Matrix::LowRank(cl)) => {
            // fold alpha and A into the column basis, then merge-add
            let mut u_new = Dense::new(ad.n_rows(), bl.rank());
            dense_gemm(ad, &bl.u, &mut u_new, false, false, alpha, 0.0);
            let abu = LowRank::from_factors(u_new, bl.s.clone(), bl.v.share());
            cl.scale(beta);
            cl.add_assign(&abu)
        }
        (Matrix::LowRank(al), Matrix::LowRank(bl), Matrix::LowRank(cl)) => {
            assert_eq!(
                al.rank(),
                bl.rank(),
                "gemm(LowRank,LowRank,LowRank) needs matching ranks"
            );
            let mut vxu = Dense::new(al.rank(), bl.rank());
            dense_gemm(&al.v, &bl.u, &mut vxu, false, false, 1.0, 0.0);
            let mut sxvxu = Dense::new(al.rank(), bl.rank());
            dense_gemm(&al.s, &vxu, &mut sxvxu, false, false, 1.0, 0.0);
            let mut s_new = Dense::new(al.rank(), bl.rank());
            dense_gemm(&sxvxu, &bl.s, &mut s_new, false, false, alpha, 0.0);
            let axb = LowRank::from_factors(al.u.share(), s_new, bl.v.share());
            cl.scale(beta);
            cl.add_assign(&axb)
        }
        (Matrix::Hierarchical(ah), Matrix::Hierarchical(bh), Matrix::Hierarchical(ch)) => {
            assert_eq!(ch.block_rows(), ah.block_rows(), "gemm(H,H,H) row grids differ");
            assert_eq!(ch.block_cols(), bh.block_cols(), "gemm(H,H,H) col grids differ");
            assert_eq!(ah.block_cols(), bh.block_rows(), "gemm(H,H,H) inner grids differ");
            for i in 0..ch.block_rows() {
                for j in 0..ch.block_cols() {
                    gemm(ah.at(i, 0), bh.at(0, j), ch.at_mut(i, j), alpha, beta)?;
                    for k in 1..ah.block_cols() {
                        gemm(ah.at(i, k), bh.at(k, j), ch.at_mut(i, j), alpha, 1.0)?;
                    }
                }
            }
            Ok(())
        }
        (Matrix::Hierarchical(_), Matrix::Hierarchical(_), Matrix::LowRank(cl)) => {
            // compute densely, then recompress to the target rank
            let mut cd = Matrix::Dense(cl.to_dense());
            gemm(a, b, &mut cd, alpha, beta)?;
            let cd = match cd {
                Matrix::Dense(d) => d,
                _ => unreachable!(),
            };
            *cl = LowRank::from_dense(&cd, cl.rank())?;
            Ok(())
        }
        (Matrix::Hierarchical(_), Matrix::LowRank(bl), Matrix::LowRank(cl)) => {
            // multiply through the shared column basis: only U changes
            let mut u_new = Matrix::Dense(Dense::new(a.n_rows(), bl.rank()));
            let bu = Matrix::Dense(bl.u.share());
            gemm(a, &bu, &mut u_new, 1.0, 0.0)?;
            let u_new = match u_new {
                Matrix::Dense(d) => d,
                _ => unreachable!(),
            };
            let mut b_copy = LowRank::from_factors(u_new, bl.s.clone(), bl.v.share());
            b_copy.scale(alpha);
            cl.scale(beta);
            cl.add_assign(&b_copy)
        }
        (Matrix::LowRank(al), Matrix::Hierarchical(_), Matrix::LowRank(cl)) => {
            // multiply through the shared row basis: only V changes
            let mut v_new = Matrix::Dense(Dense::new(al.rank(), b.n_cols()));
            let av = Matrix::Dense(al.v.share());
            gemm(&av, b, &mut v_new, 1.0, 0.0)?;
            let v_new = match v_new {
                Matrix::Dense(d) => d,
                _ => unreachable!(),
            };
            let mut a_copy = LowRank::from_factors(al.u.share(), al.s.clone(), v_new);
            a_copy.scale(alpha);
            cl.scale(beta);
            cl.add_assign(&a_copy)
        }
        _ => unreachable!(),
    }
}

/// True when the main dispatch table has an arm for this exact variant
/// triple; everything else goes through [gemm_reblock] first.
fn has_direct_rule(a: &Matrix, b: &Matrix, c: &Matrix) -> bool {
    match (a, b, c) {
        (
            Matrix::Hierarchical(_),
            Matrix::Hierarchical(_),
            Matrix::Hierarchical(_) | Matrix::LowRank(_),
        ) => true,
        (Matrix::Hierarchical(_), Matrix::LowRank(_), Matrix::LowRank(_)) => true,
        (Matrix::LowRank(_), Matrix::Hierarchical(_), Matrix::LowRank(_)) => true,
        (Matrix::Hierarchical(_), _, _)
        | (_, Matrix::Hierarchical(_), _)
        | (_, _, Matrix::Hierarchical(_)) => false,
        // every Dense/LowRank combination is covered
        _ => true,
    }
}

/// Promotion rules: wrap the non-Hierarchical operand(s) in a grid of
/// views matching the Hierarchical one, then dispatch again.
fn gemm_reblock(a: &Matrix, b: &Matrix, c: &mut Matrix, alpha: f64, beta: f64) -> Result<()> {
    match c {
        Matrix::Hierarchical(ch) => {
            let (d0, d1) = (ch.block_rows(), ch.block_cols());
            match (a, b) {
                (Matrix::Hierarchical(ah), _) => {
                    let bh = Matrix::Hierarchical(Hierarchical::from_matrix(
                        b,
                        ah.block_cols(),
                        d1,
                        false,
                    ));
                    gemm(a, &bh, c, alpha, beta)
                }
                (_, Matrix::Hierarchical(bh)) => {
                    let ah = Matrix::Hierarchical(Hierarchical::from_matrix(
                        a,
                        d0,
                        bh.block_rows(),
                        false,
                    ));
                    gemm(&ah, b, c, alpha, beta)
                }
                _ => {
                    let ah = Matrix::Hierarchical(Hierarchical::from_matrix(a, d0, 1, false));
                    let bh = Matrix::Hierarchical(Hierarchical::from_matrix(b, 1, d1, false));
                    gemm(&ah, &bh, c, alpha, beta)
                }
            }
        }
        Matrix::Dense(_) => {
            let (d0, d1) = match (a, b) {
                (Matrix::Hierarchical(ah), Matrix::Hierarchical(bh)) => {
                    assert_eq!(ah.block_cols(), bh.block_rows(), "gemm(H,H,Dense) inner grids differ");
                    (ah.block_rows(), bh.block_cols())
                }
                (Matrix::Hierarchical(ah), _) => (ah.block_rows(), 1),
                (_, Matrix::Hierarchical(bh)) => (1, bh.block_cols()),
                _ => panic!(
                    "gemm({}, {}, {}) undefined",
                    a.type_name(),
                    b.type_name(),
                    c.type_name()
                ),
            };
            let mut ch = Matrix::Hierarchical(Hierarchical::from_matrix(c, d0, d1, false));
            gemm(a, b, &mut ch, alpha, beta)
        }
        Matrix::LowRank(_) => panic!(
            "gemm({}, {}, {}) undefined",
            a.type_name(),
            b.type_name(),
            c.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{get_sorted_random_vector, laplace1d};
    use crate::ops::l2_error;

    fn laplace_block(x: &[Vec<f64>], m: usize, n: usize, i: usize, j: usize) -> Dense {
        Dense::from_kernel(laplace1d, x, m, n, i, j)
    }

    #[test]
    fn low_rank_operands_agree_with_dense_gemm() {
        let x = vec![get_sorted_random_vector(128)];
        let a = laplace_block(&x, 32, 32, 0, 96);
        let b = laplace_block(&x, 32, 32, 96, 0);
        let al = Matrix::LowRank(LowRank::from_dense(&a, 16).unwrap());
        let bl = Matrix::LowRank(LowRank::from_dense(&b, 16).unwrap());
        let am = Matrix::Dense(a);
        let bm = Matrix::Dense(b);

        let mut reference = Matrix::Dense(Dense::new(32, 32));
        gemm(&am, &bm, &mut reference, 1.0, 0.0).unwrap();
        for (lhs, rhs) in [(&al, &bm), (&am, &bl), (&al, &bl)] {
            let mut out = Matrix::Dense(Dense::new(32, 32));
            gemm(lhs, rhs, &mut out, 1.0, 0.0).unwrap();
            assert!(l2_error(&reference, &out) < 1e-8);
        }
    }

    #[test]
    fn hierarchical_times_dense_reblocks() {
        let x = vec![get_sorted_random_vector(32)];
        let d = laplace_block(&x, 32, 32, 0, 0);
        let dm = Matrix::Dense(d.clone());
        let h = Matrix::Hierarchical(Hierarchical::from_matrix(&dm, 2, 2, true));

        let ones = {
            let mut v = Dense::new(32, 1);
            v.fill(1.0);
            Matrix::Dense(v)
        };
        let mut hx = Matrix::Dense(Dense::new(32, 1));
        gemm(&h, &ones, &mut hx, 1.0, 0.0).unwrap();
        let mut dx = Matrix::Dense(Dense::new(32, 1));
        gemm(&dm, &ones, &mut dx, 1.0, 0.0).unwrap();
        assert!(l2_error(&dx, &hx) < 1e-12);
    }

    #[test]
    #[should_panic(expected = "undefined")]
    fn low_rank_output_with_one_hierarchical_dense_pair_is_undefined() {
        let x = vec![get_sorted_random_vector(16)];
        let d = laplace_block(&x, 16, 16, 0, 0);
        let dm = Matrix::Dense(d.clone());
        let h = Matrix::Hierarchical(Hierarchical::from_matrix(&dm, 2, 2, true));
        let mut c = Matrix::LowRank(LowRank::from_dense(&d, 2).unwrap());
        let _ = gemm(&h, &dm, &mut c, 1.0, 0.0);
    }
}
