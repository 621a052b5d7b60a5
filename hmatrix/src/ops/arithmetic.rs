//! Addition, subtraction and scalar multiplication dispatch

use crate::error::Result;
use crate::low_rank::LowRank;
use crate::matrix::Matrix;

/// `a += b`. Hierarchical operands add blockwise over matching grids; a
/// Hierarchical mixed with a non-Hierarchical operand is rejected, the
/// caller re-blocks first.
pub fn add_assign(a: &mut Matrix, b: &Matrix) -> Result<()> {
    let (a_name, b_name) = (a.type_name(), b.type_name());
    match (&mut *a, b) {
        (Matrix::Dense(ad), Matrix::Dense(bd)) => {
            ad.add_assign_dense(bd);
            Ok(())
        }
        (Matrix::Dense(ad), Matrix::LowRank(bl)) => {
            ad.add_assign_dense(&bl.to_dense());
            Ok(())
        }
        (Matrix::LowRank(al), Matrix::LowRank(bl)) => al.add_assign(bl),
        (Matrix::Hierarchical(ah), Matrix::Hierarchical(bh)) => {
            assert_eq!(
                (ah.block_rows(), ah.block_cols()),
                (bh.block_rows(), bh.block_cols()),
                "Hierarchical += Hierarchical grid mismatch"
            );
            for i in 0..ah.block_rows() {
                for j in 0..ah.block_cols() {
                    add_assign(ah.at_mut(i, j), bh.at(i, j))?;
                }
            }
            Ok(())
        }
        _ => panic!("{} += {} undefined", a_name, b_name),
    }
}

/// `a -= b`, with the same dispatch shape as [add_assign].
pub fn sub_assign(a: &mut Matrix, b: &Matrix) -> Result<()> {
    let (a_name, b_name) = (a.type_name(), b.type_name());
    match (&mut *a, b) {
        (Matrix::Dense(ad), Matrix::Dense(bd)) => {
            ad.sub_assign_dense(bd);
            Ok(())
        }
        (Matrix::Dense(ad), Matrix::LowRank(bl)) => {
            ad.sub_assign_dense(&bl.to_dense());
            Ok(())
        }
        (Matrix::LowRank(al), Matrix::LowRank(bl)) => {
            let mut neg = LowRank::from_factors(bl.u.share(), bl.s.clone(), bl.v.share());
            neg.scale(-1.0);
            al.add_assign(&neg)
        }
        (Matrix::Hierarchical(ah), Matrix::Hierarchical(bh)) => {
            assert_eq!(
                (ah.block_rows(), ah.block_cols()),
                (bh.block_rows(), bh.block_cols()),
                "Hierarchical -= Hierarchical grid mismatch"
            );
            for i in 0..ah.block_rows() {
                for j in 0..ah.block_cols() {
                    sub_assign(ah.at_mut(i, j), bh.at(i, j))?;
                }
            }
            Ok(())
        }
        _ => panic!("{} -= {} undefined", a_name, b_name),
    }
}

/// `a *= alpha`. Scales only S on a LowRank block.
pub fn scale(a: &mut Matrix, alpha: f64) {
    match a {
        Matrix::Dense(ad) => ad.scale(alpha),
        Matrix::LowRank(al) => al.scale(alpha),
        Matrix::Hierarchical(ah) => {
            for i in 0..ah.block_rows() {
                for j in 0..ah.block_cols() {
                    scale(ah.at_mut(i, j), alpha);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::Dense;
    use crate::functions::{get_sorted_random_vector, laplace1d};
    use crate::ops::l2_error;

    #[test]
    fn a_minus_a_vanishes() {
        let x = vec![get_sorted_random_vector(16)];
        let a = Dense::from_kernel(laplace1d, &x, 16, 16, 0, 0);
        let mut m = Matrix::Dense(a.clone());
        let other = Matrix::Dense(a);
        sub_assign(&mut m, &other).unwrap();
        assert_eq!(m.norm(), 0.0);
    }

    #[test]
    fn adding_zero_is_identity() {
        let x = vec![get_sorted_random_vector(16)];
        let a = Dense::from_kernel(laplace1d, &x, 16, 16, 0, 0);
        let reference = Matrix::Dense(a.clone());
        let mut m = Matrix::Dense(a);
        let zero = Matrix::Dense(Dense::new(16, 16));
        add_assign(&mut m, &zero).unwrap();
        assert!(l2_error(&reference, &m) == 0.0);
    }

    #[test]
    fn scaling_low_rank_touches_only_s() {
        let x = vec![get_sorted_random_vector(32)];
        let d = Dense::from_kernel(laplace1d, &x, 32, 16, 0, 16);
        let lr = LowRank::from_dense(&d, 4).unwrap();
        let u_before = lr.u.clone();
        let mut m = Matrix::LowRank(lr);
        scale(&mut m, 3.0);
        match &m {
            Matrix::LowRank(l) => {
                for i in 0..32 {
                    for j in 0..4 {
                        assert_eq!(l.u.at(i, j), u_before.at(i, j));
                    }
                }
            }
            _ => unreachable!(),
        }
    }
}
