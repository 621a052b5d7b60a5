//! LU decomposition of general dense blocks

use crate::{error::*, layout::*, vec_uninit, AsPtr, VecAssumeInit};

pub type Pivot = Vec<i32>;

/// LU decomposition with partial pivoting (`dgetrf`).
///
/// On success the unit-lower factor L and the upper factor U overwrite `a`
/// (row-major); the row pivots are returned 1-based as LAPACK produced
/// them. The block-tree drivers above this crate discard the pivots: their
/// contract is that the block layout keeps diagonal dense leaves
/// nonsingular without permutation.
///
/// A positive `return_code` means an exactly-zero pivot was met.
pub fn lu(l: MatrixLayout, a: &mut [f64]) -> Result<Pivot> {
    l.check(a)?;
    let (m, n) = l.size();
    let k = m.min(n);
    let (lt, mut a_t) = transpose(l, a);
    let mut ipiv = unsafe { vec_uninit(k as usize) };
    let mut info = 0;
    unsafe {
        lapack_sys::dgetrf_(
            &m,
            &n,
            AsPtr::as_mut_ptr(&mut a_t),
            &m,
            AsPtr::as_mut_ptr(&mut ipiv),
            &mut info,
        );
    }
    info.as_lapack_result()?;
    transpose_over(lt, &a_t, a);
    let ipiv = unsafe { ipiv.assume_init() };
    Ok(ipiv)
}
