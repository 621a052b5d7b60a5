//! Block LU solve with dense blocks only: a 4x4 grid of 16x16 leaves,
//! admissibility chosen so nothing is compressed.

use hmatrix::prelude::*;

#[test]
fn block_lu_solve_dense_only() {
    let n = 64;
    let nleaf = 16;
    let nc = n / nleaf;
    let x = vec![get_sorted_random_vector(n)];

    // dist_to_diag never exceeds nc - 1, so nothing is admissible
    let a = Hierarchical::from_kernel(
        laplace1d,
        &x,
        n,
        n,
        8,
        nleaf,
        (n / nleaf) as f64,
        nc,
        nc,
        BasisType::Normal,
        AdmisType::PositionBased,
    )
    .unwrap();
    for i in 0..nc {
        for j in 0..nc {
            assert!(a.at(i, j).is_dense());
        }
    }
    let a = Matrix::Hierarchical(a);

    let sol = Matrix::Dense(Dense::from_kernel(random_uniform, &[], n, 1, 0, 0));
    let rhs = gemm_dense(&a, &sol).unwrap();

    let (l, u) = getrf(a).unwrap();
    let mut y = Matrix::Dense(rhs);
    trsm(&l, &mut y, Side::Left, Uplo::Lower).unwrap();
    trsm(&u, &mut y, Side::Left, Uplo::Upper).unwrap();

    assert!(l2_error(&sol, &y) <= 1e-10);
}
