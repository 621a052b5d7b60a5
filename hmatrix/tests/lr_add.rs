//! Low-rank addition strategies: default merge, naive dense
//! recompression, and orthogonal recompression must all reproduce
//! 2·D for a rank-128 compression of a separated Laplace block.
//!
//! The three strategies run inside one test function because the `LRA`
//! flag is process-wide.

use hmatrix::prelude::*;
use hmatrix::settings;

#[test]
fn lr_addition_strategies_agree() {
    let n = 2048;
    let rank = 128;
    let x = vec![get_sorted_random_vector(2 * n)];
    let d = Dense::from_kernel(laplacend, &x, n, n, 0, n);
    let a = LowRank::from_dense(&d, rank).unwrap();
    let b = LowRank::from_dense(&d, rank).unwrap();

    let mut two_d = d.clone();
    two_d.add_assign_dense(&d);
    let reference = Matrix::Dense(two_d);

    settings::set_flag(settings::LR_ADDITION_COUNTER, 1);

    // default: merge-add, rank doubles
    settings::set_flag(settings::LRA, 2);
    let mut work = a.clone();
    work.add_assign(&b).unwrap();
    assert_eq!(work.rank(), 2 * rank);
    assert!(l2_error(&reference, &Matrix::LowRank(work)) <= 1e-10);

    // naive: densify and recompress, rank stays
    settings::set_flag(settings::LRA, 0);
    settings::reset_counter(settings::LR_ADDITION);
    let mut work = a.clone();
    work.add_assign(&b).unwrap();
    assert_eq!(work.rank(), rank);
    assert_eq!(settings::counter(settings::LR_ADDITION), 1);
    assert!(l2_error(&reference, &Matrix::LowRank(work)) <= 1e-10);

    // orthogonal: QR/RQ the merged bases, truncate the inner SVD
    settings::set_flag(settings::LRA, 1);
    settings::reset_counter(settings::LR_ADDITION);
    let mut work = a.clone();
    work.add_assign(&b).unwrap();
    assert_eq!(work.rank(), rank);
    assert_eq!(settings::counter(settings::LR_ADDITION), 1);
    assert!(l2_error(&reference, &Matrix::LowRank(work)) <= 1e-10);

    settings::set_flag(settings::LRA, 2);
    settings::set_flag(settings::LR_ADDITION_COUNTER, 0);
}
