//! Interpolative decomposition accuracy on a tall Laplace block.

use hmatrix::prelude::*;
use hmatrix::ops::get_cols;

#[test]
fn one_sided_id_reconstructs() {
    let m = 4096;
    let n = 512;
    let k = 32;
    let x = vec![get_sorted_random_vector(m + n)];
    let a = Dense::from_kernel(laplace1d, &x, m, n, 0, m);

    let (v, pivots) = one_sided_id(&a, k).unwrap();
    assert_eq!(pivots.len(), k);
    let acols = get_cols(&a, &pivots);
    let atest = gemm_dense(&Matrix::Dense(acols), &Matrix::Dense(v)).unwrap();

    assert!(l2_error(&Matrix::Dense(a), &Matrix::Dense(atest)) <= 1e-4);
}

#[test]
fn two_sided_id_reconstructs() {
    let m = 512;
    let n = 256;
    let k = 32;
    let x = vec![get_sorted_random_vector(m + n)];
    let a = Dense::from_kernel(laplace1d, &x, m, n, 0, m);

    let (u, s, v) = two_sided_id(&a, k).unwrap();
    let us = gemm_dense(&Matrix::Dense(u), &Matrix::Dense(s)).unwrap();
    let atest = gemm_dense(&Matrix::Dense(us), &Matrix::Dense(v)).unwrap();

    assert!(l2_error(&Matrix::Dense(a), &Matrix::Dense(atest)) <= 1e-4);
}
