//! Householder TSQR building blocks (`dgeqrt`, `dlarfb`, `dtpqrt`,
//! `dtpmqrt`)
//!
//! These four routines are the tile kernels of the blocked QR driver: QR
//! of a diagonal tile, application of its reflectors along the block row,
//! QR of a triangular-on-top-of-square tile pair, and application of the
//! pair's reflectors. All buffers are row-major and packed to Fortran
//! order around each call; the pentagonal parameter `l` is always zero
//! because the engine's tiles are full rectangles.

use crate::{error::*, layout::*, vec_uninit, AsPtr};
use std::os::raw::c_char;

/// QR of an m×n tile with the compact-WY representation (`dgeqrt`).
///
/// Reflectors and R overwrite `a`; the k×k block reflector triangle is
/// written to `t`, k = min(m, n).
pub fn geqrt(m: i32, n: i32, a: &mut [f64], t: &mut [f64]) -> Result<()> {
    let k = m.min(n);
    if a.len() != (m * n) as usize || t.len() != (k * k) as usize {
        return Err(Error::InvalidShape);
    }
    let la = MatrixLayout::C { row: m, lda: n };
    let (la_t, mut a_t) = transpose(la, a);
    let mut t_t = vec![0.0; (k * k) as usize];
    let mut work = unsafe { vec_uninit::<f64>((k * n) as usize) };
    let mut info = 0;
    unsafe {
        lapack_sys::dgeqrt_(
            &m,
            &n,
            &k,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            t_t.as_mut_ptr(),
            &k,
            AsPtr::as_mut_ptr(&mut work),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(la_t, &a_t, a);
    transpose_over(MatrixLayout::F { col: k, lda: k }, &t_t, t);
    Ok(())
}

/// Apply the block reflector of [geqrt] to an m×n tile from the left
/// (`dlarfb`, `side = 'L'`, `direct = 'F'`, `storev = 'C'`).
///
/// `v` is the m×k reflector tile, `t` its k×k triangle; `trans` selects
/// Qᵀ·C instead of Q·C.
pub fn larfb(m: i32, n: i32, k: i32, v: &[f64], t: &[f64], c: &mut [f64], trans: bool) -> Result<()> {
    if v.len() != (m * k) as usize || t.len() != (k * k) as usize || c.len() != (m * n) as usize {
        return Err(Error::InvalidShape);
    }
    let side = b'L' as c_char;
    let transa = if trans { b'T' } else { b'N' } as c_char;
    let direct = b'F' as c_char;
    let storev = b'C' as c_char;
    let (_, v_t) = transpose(MatrixLayout::C { row: m, lda: k }, v);
    let (_, t_t) = transpose(MatrixLayout::C { row: k, lda: k }, t);
    let (lc_t, mut c_t) = transpose(MatrixLayout::C { row: m, lda: n }, c);
    let mut work = unsafe { vec_uninit::<f64>((n * k) as usize) };
    unsafe {
        lapack_sys::dlarfb_(
            &side,
            &transa,
            &direct,
            &storev,
            &m,
            &n,
            &k,
            v_t.as_ptr(),
            &m,
            t_t.as_ptr(),
            &k,
            AsPtr::as_mut_ptr(&mut c_t),
            &m,
            AsPtr::as_mut_ptr(&mut work),
            &n,
        );
    }
    transpose_over(lc_t, &c_t, c);
    Ok(())
}

/// QR of an upper-triangular n×n tile stacked on a full m×n tile
/// (`dtpqrt` with `l = 0`).
///
/// `a` is the triangular tile (updated to the new R), `b` the square one
/// (overwritten by reflectors); `t` receives the n×n block reflector.
pub fn tpqrt(m: i32, n: i32, a: &mut [f64], b: &mut [f64], t: &mut [f64]) -> Result<()> {
    if a.len() != (n * n) as usize || b.len() != (m * n) as usize || t.len() != (n * n) as usize {
        return Err(Error::InvalidShape);
    }
    let l = 0;
    let (la_t, mut a_t) = transpose(MatrixLayout::C { row: n, lda: n }, a);
    let (lb_t, mut b_t) = transpose(MatrixLayout::C { row: m, lda: n }, b);
    let mut t_t = vec![0.0; (n * n) as usize];
    let mut work = unsafe { vec_uninit::<f64>((n * n) as usize) };
    let mut info = 0;
    unsafe {
        lapack_sys::dtpqrt_(
            &m,
            &n,
            &l,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &n,
            AsPtr::as_mut_ptr(&mut b_t),
            &m,
            t_t.as_mut_ptr(),
            &n,
            AsPtr::as_mut_ptr(&mut work),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(la_t, &a_t, a);
    transpose_over(lb_t, &b_t, b);
    transpose_over(MatrixLayout::F { col: n, lda: n }, &t_t, t);
    Ok(())
}

/// Apply the reflector pair of [tpqrt] from the left (`dtpmqrt` with
/// `l = 0`): updates the k×n tile `a` and the m×n tile `b` jointly.
///
/// `v` is the m×k reflector tile from [tpqrt], `t` its k×k triangle.
pub fn tpmqrt(
    m: i32,
    n: i32,
    k: i32,
    v: &[f64],
    t: &[f64],
    a: &mut [f64],
    b: &mut [f64],
    trans: bool,
) -> Result<()> {
    if v.len() != (m * k) as usize
        || t.len() != (k * k) as usize
        || a.len() != (k * n) as usize
        || b.len() != (m * n) as usize
    {
        return Err(Error::InvalidShape);
    }
    let side = b'L' as c_char;
    let transa = if trans { b'T' } else { b'N' } as c_char;
    let l = 0;
    let (_, v_t) = transpose(MatrixLayout::C { row: m, lda: k }, v);
    let (_, t_t) = transpose(MatrixLayout::C { row: k, lda: k }, t);
    let (la_t, mut a_t) = transpose(MatrixLayout::C { row: k, lda: n }, a);
    let (lb_t, mut b_t) = transpose(MatrixLayout::C { row: m, lda: n }, b);
    let mut work = unsafe { vec_uninit::<f64>((k * n) as usize) };
    let mut info = 0;
    unsafe {
        lapack_sys::dtpmqrt_(
            &side,
            &transa,
            &m,
            &n,
            &k,
            &l,
            &k,
            v_t.as_ptr(),
            &m,
            t_t.as_ptr(),
            &k,
            AsPtr::as_mut_ptr(&mut a_t),
            &k,
            AsPtr::as_mut_ptr(&mut b_t),
            &m,
            AsPtr::as_mut_ptr(&mut work),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(la_t, &a_t, a);
    transpose_over(lb_t, &b_t, b);
    Ok(())
}
