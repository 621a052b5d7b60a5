//! Singular value decomposition

use crate::{error::*, layout::*, vec_uninit, AsPtr, VecAssumeInit};
use num_traits::ToPrimitive;
use std::os::raw::c_char;

/// Result of a thin SVD: `a ≈ u · diag(s) · vt`.
pub struct SvdOwned {
    /// m×k left singular vectors, row-major
    pub u: Vec<f64>,
    /// k singular values, descending
    pub s: Vec<f64>,
    /// k×n right singular vectors, row-major
    pub vt: Vec<f64>,
}

/// Thin SVD via `dgesvd` with `jobu = jobvt = 'S'`, k = min(m, n).
/// `a` is destroyed.
pub fn svd(l: MatrixLayout, a: &mut [f64]) -> Result<SvdOwned> {
    l.check(a)?;
    let (m, n) = l.size();
    let k = m.min(n);
    let (mu, nu, ku) = (m as usize, n as usize, k as usize);
    let (_, mut a_t) = transpose(l, a);

    let job = b'S' as c_char;
    let mut s = unsafe { vec_uninit(ku) };
    let mut u_t = unsafe { vec_uninit(mu * ku) };
    let mut vt_t = unsafe { vec_uninit(ku * nu) };

    // workspace query
    let mut info = 0;
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dgesvd_(
            &job,
            &job,
            &m,
            &n,
            std::ptr::null_mut(),
            &m,
            AsPtr::as_mut_ptr(&mut s),
            AsPtr::as_mut_ptr(&mut u_t),
            &m,
            AsPtr::as_mut_ptr(&mut vt_t),
            &k,
            work_size.as_mut_ptr(),
            &(-1),
            &mut info,
        );
    }
    info.as_lapack_result()?;

    let lwork = work_size[0].to_usize().unwrap();
    let mut work = unsafe { vec_uninit::<f64>(lwork) };
    let lwork = lwork as i32;
    unsafe {
        lapack_sys::dgesvd_(
            &job,
            &job,
            &m,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_mut_ptr(&mut s),
            AsPtr::as_mut_ptr(&mut u_t),
            &m,
            AsPtr::as_mut_ptr(&mut vt_t),
            &k,
            AsPtr::as_mut_ptr(&mut work),
            &lwork,
            &mut info,
        );
    }
    info.as_lapack_result()?;

    let u_t = unsafe { u_t.assume_init() };
    let vt_t = unsafe { vt_t.assume_init() };
    let s = unsafe { s.assume_init() };

    let mut u = vec![0.0; mu * ku];
    transpose_over(MatrixLayout::F { col: k, lda: m }, &u_t, &mut u);
    let mut vt = vec![0.0; ku * nu];
    transpose_over(MatrixLayout::F { col: n, lda: k }, &vt_t, &mut vt);

    Ok(SvdOwned { u, s, vt })
}
