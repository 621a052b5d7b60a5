//! Column-pivoted QR decomposition

use crate::{error::*, layout::*, vec_uninit, AsPtr, VecAssumeInit};
use num_traits::ToPrimitive;

/// Column-pivoted QR (`dgeqp3`). Reflectors and R overwrite `a`
/// (row-major); the column pivots are returned converted to 0-based
/// indices.
///
/// Every entry of `jpvt` is passed in as zero so that all columns are free
/// pivots; fixing columns by pre-setting entries gives wrong results for
/// this use.
pub fn geqp3(l: MatrixLayout, a: &mut [f64]) -> Result<Vec<i32>> {
    l.check(a)?;
    let (m, n) = l.size();
    let k = m.min(n);
    let (lt, mut a_t) = transpose(l, a);
    let mut jpvt = vec![0i32; n as usize];
    let mut tau = unsafe { vec_uninit::<f64>(k as usize) };

    // workspace query
    let mut info = 0;
    let mut work_size = [0.0];
    unsafe {
        lapack_sys::dgeqp3_(
            &m,
            &n,
            std::ptr::null_mut(),
            &m,
            jpvt.as_mut_ptr(),
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
        lapack_sys::dgeqp3_(
            &m,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            jpvt.as_mut_ptr(),
            AsPtr::as_mut_ptr(&mut tau),
            AsPtr::as_mut_ptr(&mut work),
            &lwork,
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(lt, &a_t, a);
    let _ = unsafe { tau.assume_init() };

    // LAPACK pivots are 1-based
    for p in jpvt.iter_mut() {
        *p -= 1;
    }
    Ok(jpvt)
}
