//! QR factorizations: explicit dense QR/RQ and the blocked Householder
//! TSQR drivers
//!
//! The tile kernels ([geqrt], [larfb], [tpqrt], [tpmqrt]) factor and
//! update square tiles down a block column; [blocked_qr] strings them
//! into the block-QR sweep, [blocked_qr_apply_q] accumulates Q by
//! applying the stored reflectors to an identity grid in reverse, and
//! [blocked_qr_extract_r] zeroes what the sweep left below the diagonal.
//!
//! Reflector tiles must be Dense; a LowRank tile in an update position is
//! densified for the kernel and recompressed to its rank afterwards.

use crate::dense::Dense;
use crate::error::Result;
use crate::hierarchical::Hierarchical;
use crate::low_rank::LowRank;
use crate::matrix::Matrix;
use crate::ops::misc::{zero_lowtri, zero_whole};

/// Explicit-factor QR of a dense block: `q` m×k orthonormal, `r` k×n
/// upper trapezoidal, k = min(m, n).
pub(crate) fn dense_qr(a: &Dense, q: &mut Dense, r: &mut Dense) -> Result<()> {
    let buf = a.pack();
    let mut qbuf = vec![0.0; q.n_rows() * q.n_cols()];
    let mut rbuf = vec![0.0; r.n_rows() * r.n_cols()];
    hlax::qr::qr(a.layout(), &buf, &mut qbuf, &mut rbuf)?;
    q.unpack(&qbuf);
    r.unpack(&rbuf);
    Ok(())
}

/// Explicit-factor RQ of a wide dense block (m ≤ n): `r` m×m upper
/// triangular, `q` m×n with orthonormal rows.
pub(crate) fn dense_rq(a: &Dense, r: &mut Dense, q: &mut Dense) -> Result<()> {
    let buf = a.pack();
    let mut rbuf = vec![0.0; r.n_rows() * r.n_cols()];
    let mut qbuf = vec![0.0; q.n_rows() * q.n_cols()];
    hlax::qr::rq(a.layout(), &buf, &mut rbuf, &mut qbuf)?;
    r.unpack(&rbuf);
    q.unpack(&qbuf);
    Ok(())
}

/// QR with explicit factors. Defined on Dense operands.
pub fn qr(a: &Matrix, q: &mut Matrix, r: &mut Matrix) -> Result<()> {
    let ad = a.expect_dense("qr");
    let qd = q.expect_dense_mut("qr");
    let rd = r.expect_dense_mut("qr");
    dense_qr(ad, qd, rd)
}

/// RQ with explicit factors. Defined on Dense operands.
pub fn rq(a: &Matrix, r: &mut Matrix, q: &mut Matrix) -> Result<()> {
    let ad = a.expect_dense("rq");
    let rd = r.expect_dense_mut("rq");
    let qd = q.expect_dense_mut("rq");
    dense_rq(ad, rd, qd)
}

/// Tile QR (`dgeqrt`): reflectors and R overwrite `a`, the block
/// reflector triangle lands in `t` (k×k, k = min of `a`'s dims).
pub fn geqrt(a: &mut Matrix, t: &mut Matrix) -> Result<()> {
    let ad = a.expect_dense_mut("geqrt");
    let td = t.expect_dense_mut("geqrt");
    let (m, n) = (ad.n_rows(), ad.n_cols());
    let k = m.min(n);
    assert_eq!(
        (td.n_rows(), td.n_cols()),
        (k, k),
        "geqrt reflector tile must be {}x{}",
        k,
        k
    );
    let mut abuf = ad.pack();
    let mut tbuf = td.pack();
    hlax::tsqr::geqrt(m as i32, n as i32, &mut abuf, &mut tbuf)?;
    ad.unpack(&abuf);
    td.unpack(&tbuf);
    Ok(())
}

/// Apply a [geqrt] block reflector to `c` from the left (`dlarfb`);
/// `trans` applies Qᵀ.
pub fn larfb(v: &Matrix, t: &Matrix, c: &mut Matrix, trans: bool) -> Result<()> {
    let vd = v.expect_dense("larfb");
    let td = t.expect_dense("larfb");
    let k = vd.n_cols();
    let mut cd = densified(c, "larfb");
    let (m, n) = (cd.n_rows(), cd.n_cols());
    let vbuf = vd.pack();
    let tbuf = td.pack();
    let mut cbuf = cd.pack();
    hlax::tsqr::larfb(m as i32, n as i32, k as i32, &vbuf, &tbuf, &mut cbuf, trans)?;
    cd.unpack(&cbuf);
    restore(c, cd)
}

/// Tile-pair QR (`dtpqrt`): `a` is the upper-triangular tile from a
/// previous [geqrt] (updated in place), `b` the square tile below it
/// (overwritten with reflectors), `t` the block reflector triangle.
pub fn tpqrt(a: &mut Matrix, b: &mut Matrix, t: &mut Matrix) -> Result<()> {
    let ad = a.expect_dense_mut("tpqrt");
    let bd = b.expect_dense_mut("tpqrt");
    let td = t.expect_dense_mut("tpqrt");
    let n = ad.n_cols();
    assert_eq!(ad.n_rows(), n, "tpqrt triangular tile must be square");
    assert_eq!(bd.n_cols(), n, "tpqrt tile widths must match");
    assert_eq!((td.n_rows(), td.n_cols()), (n, n));
    let m = bd.n_rows();
    let mut abuf = ad.pack();
    let mut bbuf = bd.pack();
    let mut tbuf = td.pack();
    hlax::tsqr::tpqrt(m as i32, n as i32, &mut abuf, &mut bbuf, &mut tbuf)?;
    ad.unpack(&abuf);
    bd.unpack(&bbuf);
    td.unpack(&tbuf);
    Ok(())
}

/// Apply a [tpqrt] reflector pair from the left (`dtpmqrt`): jointly
/// updates the tile `a` in the pivot row and the tile `b` in the
/// reflector row.
pub fn tpmqrt(v: &Matrix, t: &Matrix, a: &mut Matrix, b: &mut Matrix, trans: bool) -> Result<()> {
    let vd = v.expect_dense("tpmqrt");
    let td = t.expect_dense("tpmqrt");
    let k = vd.n_cols();
    let mut ad = densified(a, "tpmqrt");
    let mut bd = densified(b, "tpmqrt");
    let (m, n) = (bd.n_rows(), bd.n_cols());
    assert_eq!(ad.n_rows(), k, "tpmqrt pivot tile must have {} rows", k);
    assert_eq!(ad.n_cols(), n, "tpmqrt tile widths must match");
    let vbuf = vd.pack();
    let tbuf = td.pack();
    let mut abuf = ad.pack();
    let mut bbuf = bd.pack();
    hlax::tsqr::tpmqrt(
        m as i32, n as i32, k as i32, &vbuf, &tbuf, &mut abuf, &mut bbuf, trans,
    )?;
    ad.unpack(&abuf);
    bd.unpack(&bbuf);
    restore(a, ad)?;
    restore(b, bd)
}

fn densified(m: &Matrix, what: &str) -> Dense {
    match m {
        Matrix::Dense(d) => d.clone(),
        Matrix::LowRank(l) => l.to_dense(),
        Matrix::Hierarchical(_) => panic!("{}({}) undefined", what, m.type_name()),
    }
}

fn restore(m: &mut Matrix, d: Dense) -> Result<()> {
    match m {
        Matrix::Dense(orig) => orig.unpack(&d.pack()),
        Matrix::LowRank(l) => *l = LowRank::from_dense(&d, l.rank())?,
        Matrix::Hierarchical(_) => unreachable!(),
    }
    Ok(())
}

/// Blocked QR sweep over a square block grid: factor the diagonal tile,
/// apply its reflectors along the block row, then fold every tile below
/// the diagonal in with tile-pair factorizations. On return `a` holds R
/// in its upper triangle and the reflectors below; `t` (an empty grid on
/// entry) holds the block reflector triangles.
pub fn blocked_qr(a: &mut Hierarchical, t: &mut Hierarchical) -> Result<()> {
    assert_eq!(
        a.block_rows(),
        a.block_cols(),
        "blocked_qr needs a square block grid"
    );
    let d = a.block_rows();
    for k in 0..d {
        let nb = a.at(k, k).n_rows().min(a.at(k, k).n_cols());
        *t.at_mut(k, k) = Matrix::Dense(Dense::new(nb, nb));
        {
            let mut akk = a.at_mut(k, k).take();
            geqrt(&mut akk, t.at_mut(k, k))?;
            *a.at_mut(k, k) = akk;
        }
        for j in k + 1..d {
            let mut akj = a.at_mut(k, j).take();
            larfb(a.at(k, k), t.at(k, k), &mut akj, true)?;
            *a.at_mut(k, j) = akj;
        }
        for i in k + 1..d {
            let nb = a.at(i, k).n_cols();
            *t.at_mut(i, k) = Matrix::Dense(Dense::new(nb, nb));
            let mut akk = a.at_mut(k, k).take();
            let mut aik = a.at_mut(i, k).take();
            tpqrt(&mut akk, &mut aik, t.at_mut(i, k))?;
            *a.at_mut(k, k) = akk;
            for j in k + 1..d {
                let mut akj = a.at_mut(k, j).take();
                let mut aij = a.at_mut(i, j).take();
                tpmqrt(&aik, t.at(i, k), &mut akj, &mut aij, true)?;
                *a.at_mut(k, j) = akj;
                *a.at_mut(i, j) = aij;
            }
            *a.at_mut(i, k) = aik;
        }
    }
    Ok(())
}

/// Accumulate the explicit Q of a [blocked_qr] factorization by applying
/// the stored reflectors, in reverse, to `q` (identity blocks on entry).
pub fn blocked_qr_apply_q(
    a: &Hierarchical,
    t: &Hierarchical,
    q: &mut Hierarchical,
) -> Result<()> {
    let d = a.block_rows();
    for k in (0..d).rev() {
        for i in (k + 1..d).rev() {
            for j in k..d {
                let mut qkj = q.at_mut(k, j).take();
                let mut qij = q.at_mut(i, j).take();
                tpmqrt(a.at(i, k), t.at(i, k), &mut qkj, &mut qij, false)?;
                *q.at_mut(k, j) = qkj;
                *q.at_mut(i, j) = qij;
            }
        }
        for j in k..d {
            let mut qkj = q.at_mut(k, j).take();
            larfb(a.at(k, k), t.at(k, k), &mut qkj, false)?;
            *q.at_mut(k, j) = qkj;
        }
    }
    Ok(())
}

/// Keep R: zero the strict lower triangle of the diagonal blocks and
/// wipe everything below the block diagonal.
pub fn blocked_qr_extract_r(a: &mut Hierarchical) {
    for i in 0..a.block_rows() {
        for j in 0..=i.min(a.block_cols() - 1) {
            if i == j {
                zero_lowtri(a.at_mut(i, j));
            } else {
                zero_whole(a.at_mut(i, j));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::dense_gemm;
    use crate::functions::{get_sorted_random_vector, laplace1d};

    #[test]
    fn dense_qr_reconstructs_and_is_orthogonal() {
        let x = vec![get_sorted_random_vector(20)];
        let a = Dense::from_kernel(laplace1d, &x, 20, 12, 0, 0);
        let mut q = Dense::new(20, 12);
        let mut r = Dense::new(12, 12);
        dense_qr(&a, &mut q, &mut r).unwrap();

        let mut qr_prod = Dense::new(20, 12);
        dense_gemm(&q, &r, &mut qr_prod, false, false, 1.0, 0.0);
        let mut qtq = Dense::new(12, 12);
        dense_gemm(&q, &q, &mut qtq, true, false, 1.0, 0.0);
        for i in 0..20 {
            for j in 0..12 {
                assert!((qr_prod.at(i, j) - a.at(i, j)).abs() < 1e-10);
            }
        }
        for i in 0..12 {
            for j in 0..12 {
                let id = if i == j { 1.0 } else { 0.0 };
                assert!((qtq.at(i, j) - id).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn dense_rq_reconstructs() {
        let x = vec![get_sorted_random_vector(20)];
        let a = Dense::from_kernel(laplace1d, &x, 8, 20, 0, 0);
        let mut r = Dense::new(8, 8);
        let mut q = Dense::new(8, 20);
        dense_rq(&a, &mut r, &mut q).unwrap();
        let mut rq_prod = Dense::new(8, 20);
        dense_gemm(&r, &q, &mut rq_prod, false, false, 1.0, 0.0);
        for i in 0..8 {
            for j in 0..20 {
                assert!((rq_prod.at(i, j) - a.at(i, j)).abs() < 1e-10);
            }
            for j in 0..i {
                assert_eq!(r.at(i, j), 0.0);
            }
        }
    }
}
