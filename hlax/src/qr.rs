//! QR and RQ decompositions with explicit orthogonal factors

use crate::{error::*, layout::*, vec_uninit, AsPtr, VecAssumeInit};
use num_traits::ToPrimitive;

/// Householder reflection as the first step of QR decomposition
/// (`dgeqrf` on the transposed buffer). Returns the scalar reflector
/// coefficients `tau`.
pub fn householder(l: MatrixLayout, a: &mut [f64]) -> Result<Vec<f64>> {
    l.check(a)?;
    let (m, n) = l.size();
    let k = m.min(n);
    let (lt, mut a_t) = transpose(l, a);
    let mut tau = unsafe { vec_uninit::<f64>(k as usize) };

    // workspace query
    let mut info = 0;
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dgeqrf_(
            &m,
            &n,
            std::ptr::null_mut(),
            &m,
            AsPtr::as_mut_ptr(&mut tau),
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
        lapack_sys::dgeqrf_(
            &m,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_mut_ptr(&mut tau),
            AsPtr::as_mut_ptr(&mut work),
            &lwork,
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(lt, &a_t, a);
    Ok(unsafe { tau.assume_init() })
}

/// QR decomposition with explicit factors.
///
/// `a` is m×n row-major and is left untouched; `q` receives the m×k
/// orthonormal factor and `r` the k×n upper-trapezoidal factor, k =
/// min(m, n). Both outputs are row-major.
pub fn qr(l: MatrixLayout, a: &[f64], q: &mut [f64], r: &mut [f64]) -> Result<()> {
    l.check(a)?;
    let (m, n) = l.size();
    let k = m.min(n);
    let (mu, nu, ku) = (m as usize, n as usize, k as usize);
    if q.len() != mu * ku || r.len() != ku * nu {
        return Err(Error::InvalidShape);
    }

    let mut a_qr = a.to_vec();
    let tau = householder(l, &mut a_qr)?;

    // R is the upper trapezoid of the reflector-packed factor
    for i in 0..ku {
        for j in 0..nu {
            r[i * nu + j] = if j >= i { a_qr[i * nu + j] } else { 0.0 };
        }
    }

    // regenerate Q from the reflectors (dorgqr, column-major)
    let (_, mut a_t) = transpose(l, &a_qr);
    let mut info = 0;
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dorgqr_(
            &m,
            &k,
            &k,
            std::ptr::null_mut(),
            &m,
            AsPtr::as_ptr(&tau),
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
        lapack_sys::dorgqr_(
            &m,
            &k,
            &k,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_ptr(&tau),
            AsPtr::as_mut_ptr(&mut work),
            &lwork,
            &mut info,
        );
    }
    info.as_lapack_result()?;
    for i in 0..mu {
        for j in 0..ku {
            q[i * ku + j] = a_t[j * mu + i];
        }
    }
    Ok(())
}

/// RQ decomposition with explicit factors.
///
/// For an m×n input with m ≤ n, `r` receives the m×m upper-triangular
/// factor and `q` the m×n factor with orthonormal rows such that
/// `a = r · q`. Both outputs are row-major.
pub fn rq(l: MatrixLayout, a: &[f64], r: &mut [f64], q: &mut [f64]) -> Result<()> {
    l.check(a)?;
    let (m, n) = l.size();
    if m > n {
        return Err(Error::InvalidShape);
    }
    let (mu, nu) = (m as usize, n as usize);
    if r.len() != mu * mu || q.len() != mu * nu {
        return Err(Error::InvalidShape);
    }

    let (_, mut a_t) = transpose(l, a);
    let mut tau = unsafe { vec_uninit::<f64>(mu) };

    let mut info = 0;
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dgerqf_(
            &m,
            &n,
            std::ptr::null_mut(),
            &m,
            AsPtr::as_mut_ptr(&mut tau),
            work_size.as_mut_ptr(),
            &(-1),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    let lwork = work_size[0].to_usize().unwrap();
    let mut work = unsafe { vec_uninit::<f64>(lwork) };
    let lwork_i = lwork as i32;
    unsafe {
        lapack_sys::dgerqf_(
            &m,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_mut_ptr(&mut tau),
            AsPtr::as_mut_ptr(&mut work),
            &lwork_i,
            &mut info,
        );
    }
    info.as_lapack_result()?;

    // R sits in the last m columns of the reflector-packed factor
    for i in 0..mu {
        for j in 0..mu {
            r[i * mu + j] = if j >= i {
                a_t[i + (nu - mu + j) * mu]
            } else {
                0.0
            };
        }
    }

    // regenerate the m×n row-orthonormal Q (dorgrq)
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dorgrq_(
            &m,
            &n,
            &m,
            std::ptr::null_mut(),
            &m,
            AsPtr::as_ptr(&tau),
            work_size.as_mut_ptr(),
            &(-1),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    let lwork = work_size[0].to_usize().unwrap();
    let mut work = unsafe { vec_uninit::<f64>(lwork) };
    let lwork_i = lwork as i32;
    unsafe {
        lapack_sys::dorgrq_(
            &m,
            &n,
            &m,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_mut_ptr(&mut tau),
            AsPtr::as_mut_ptr(&mut work),
            &lwork_i,
            &mut info,
        );
    }
    info.as_lapack_result()?;
    for i in 0..mu {
        for j in 0..nu {
            q[i * nu + j] = a_t[i + j * mu];
        }
    }
    Ok(())
}
