//! HODLR LU solve: binary partition with rank-8 off-diagonal blocks.
//! Accuracy is limited by the compression, not by the factorization.

use hmatrix::prelude::*;

#[test]
fn hodlr_lu_solve() {
    let n = 64;
    let nleaf = 16;
    let rank = 8;
    let x = vec![get_sorted_random_vector(n)];

    let a = Hierarchical::from_kernel(
        laplace1d,
        &x,
        n,
        n,
        rank,
        nleaf,
        0.0, // weak admissibility: every off-diagonal block compresses
        2,
        2,
        BasisType::Normal,
        AdmisType::PositionBased,
    )
    .unwrap();
    assert!(a.at(0, 1).is_low_rank());
    assert!(a.at(0, 0).is_hierarchical());
    let a = Matrix::Hierarchical(a);

    let sol = Matrix::Dense(Dense::from_kernel(random_uniform, &[], n, 1, 0, 0));
    let rhs = gemm_dense(&a, &sol).unwrap();

    let (l, u) = getrf(a).unwrap();
    let mut y = Matrix::Dense(rhs);
    trsm(&l, &mut y, Side::Left, Uplo::Lower).unwrap();
    trsm(&u, &mut y, Side::Left, Uplo::Upper).unwrap();

    assert!(l2_error(&sol, &y) <= 1e-5);
}

#[test]
fn hodlr_reconstruction_error_is_compression_limited() {
    let n = 64;
    let x = vec![get_sorted_random_vector(n)];
    let a = Hierarchical::from_kernel(
        laplace1d,
        &x,
        n,
        n,
        8,
        16,
        0.0,
        2,
        2,
        BasisType::Normal,
        AdmisType::PositionBased,
    )
    .unwrap();
    let dense = Matrix::Dense(Dense::from_kernel(laplace1d, &x, n, n, 0, 0));
    assert!(l2_error(&dense, &Matrix::Hierarchical(a)) <= 1e-5);
}
