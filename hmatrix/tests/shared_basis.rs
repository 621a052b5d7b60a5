//! Shared-basis construction: all admissible blocks of a block row hold
//! the same column-basis buffer, all admissible blocks of a block column
//! the same row-basis buffer.

use hmatrix::prelude::*;

fn build_shared(n: usize, nleaf: usize, admis: f64) -> Hierarchical {
    let x = vec![get_sorted_random_vector(n)];
    Hierarchical::from_kernel(
        laplace1d,
        &x,
        n,
        n,
        8,
        nleaf,
        admis,
        n / nleaf,
        n / nleaf,
        BasisType::Shared,
        AdmisType::GeometryBased,
    )
    .unwrap()
}

#[test]
fn admissible_blocks_share_row_and_column_bases() {
    let a = build_shared(256, 32, 0.5);
    let nc = 8;

    for i in 0..nc {
        let low_rank: Vec<&LowRank> = (0..nc)
            .filter_map(|j| match a.at(i, j) {
                Matrix::LowRank(lr) => Some(lr),
                _ => None,
            })
            .collect();
        // geometry-based admis 0.5 compresses the well-separated blocks
        // of every row; even the middle rows keep at least two
        assert!(low_rank.len() >= 2, "block row {} has too few compressed blocks", i);
        for lr in &low_rank[1..] {
            assert!(
                lr.u.is_shared_with(&low_rank[0].u),
                "block row {} does not share its column basis",
                i
            );
        }
    }

    for j in 0..nc {
        let low_rank: Vec<&LowRank> = (0..nc)
            .filter_map(|i| match a.at(i, j) {
                Matrix::LowRank(lr) => Some(lr),
                _ => None,
            })
            .collect();
        for lr in &low_rank[1..] {
            assert!(
                lr.v.is_shared_with(&low_rank[0].v),
                "block column {} does not share its row basis",
                j
            );
        }
    }
}

#[test]
fn shared_basis_still_approximates_the_operator() {
    let n = 256;
    let x = vec![get_sorted_random_vector(n)];
    let a = Hierarchical::from_kernel(
        laplace1d,
        &x,
        n,
        n,
        8,
        32,
        0.5,
        8,
        8,
        BasisType::Shared,
        AdmisType::GeometryBased,
    )
    .unwrap();
    let dense = Matrix::Dense(Dense::from_kernel(laplace1d, &x, n, n, 0, 0));
    assert!(l2_error(&dense, &Matrix::Hierarchical(a)) <= 1e-2);
}

#[test]
fn unshare_gives_private_bases() {
    let mut a = build_shared(256, 32, 0.5);
    a.unshare();
    let mut seen: Option<&LowRank> = None;
    for j in 0..8 {
        if let Matrix::LowRank(lr) = a.at(0, j) {
            if let Some(prev) = seen {
                assert!(!lr.u.is_shared_with(&prev.u));
            }
            seen = Some(lr);
        }
    }
}
