use criterion::{criterion_group, criterion_main, Criterion};
use hmatrix::prelude::*;

fn gemm_hodlr(c: &mut Criterion) {
    let n = 256;
    let x = vec![get_sorted_random_vector(n)];
    let a = Matrix::Hierarchical(
        Hierarchical::from_kernel(
            laplace1d,
            &x,
            n,
            n,
            8,
            32,
            0.0,
            2,
            2,
            BasisType::Normal,
            AdmisType::PositionBased,
        )
        .unwrap(),
    );
    let v = Matrix::Dense(Dense::from_kernel(random_uniform, &[], n, 1, 0, 0));
    c.bench_function("gemm_hodlr_256_vec", |b| {
        b.iter(|| gemm_dense(&a, &v).unwrap())
    });

    let d = Matrix::Dense(Dense::from_kernel(laplace1d, &x, n, n, 0, 0));
    c.bench_function("gemm_dense_256_vec", |b| {
        b.iter(|| gemm_dense(&d, &v).unwrap())
    });
}

criterion_group!(benches, gemm_hodlr);
criterion_main!(benches);
