//! In-place transposition for every variant

use crate::hierarchical::Hierarchical;
use crate::matrix::Matrix;

/// Transpose `a` in place. Dense blocks swap elements, LowRank blocks
/// transpose and swap their bases, Hierarchical blocks transpose the
/// grid and every child.
pub fn transpose(a: &mut Matrix) {
    match a {
        Matrix::Dense(ad) => {
            *ad = ad.transposed();
        }
        Matrix::LowRank(al) => {
            *al = al.transposed();
        }
        Matrix::Hierarchical(ah) => {
            let mut out = Hierarchical::new(ah.block_cols(), ah.block_rows());
            for i in 0..ah.block_rows() {
                for j in 0..ah.block_cols() {
                    let mut block = ah.at_mut(i, j).take();
                    transpose(&mut block);
                    *out.at_mut(j, i) = block;
                }
            }
            *ah = out;
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
    fn double_transpose_is_identity() {
        let x = vec![get_sorted_random_vector(32)];
        let d = Dense::from_kernel(laplace1d, &x, 32, 32, 0, 0);
        let reference = Matrix::Dense(d.clone());
        let mut h = Matrix::Hierarchical(Hierarchical::from_matrix(
            &Matrix::Dense(d),
            2,
            2,
            true,
        ));
        transpose(&mut h);
        transpose(&mut h);
        assert!(l2_error(&reference, &h) < 1e-14);
    }

    #[test]
    fn hierarchical_transpose_moves_blocks() {
        let x = vec![get_sorted_random_vector(32)];
        let d = Dense::from_kernel(laplace1d, &x, 32, 32, 0, 0);
        let dm = Matrix::Dense(d.clone());
        let mut h = Matrix::Hierarchical(Hierarchical::from_matrix(&dm, 2, 2, true));
        transpose(&mut h);
        let ht = h.to_dense();
        for i in 0..32 {
            for j in 0..32 {
                assert_eq!(ht.at(i, j), d.at(j, i));
            }
        }
    }
}
