//! Safe Rust wrapper for the LAPACK routines driving dense matrix blocks
//!
//! Every function in this crate operates on a contiguous **row-major**
//! `f64` buffer described by a [MatrixLayout]. LAPACK itself is
//! column-major, so the wrappers transpose the buffer into Fortran order,
//! call the raw `lapack-sys` routine, and transpose the results back; the
//! packing helpers live in [layout].
//!
//! The caller-visible contract is uniform:
//!
//! - workspace sizes are queried with `lwork = -1` and allocated as
//!   uninitialized memory (see `alloc`),
//! - a non-zero `info` from LAPACK surfaces as [error::Error] through
//!   `info.as_lapack_result()?`,
//! - shape mismatches between the layout and the buffer are
//!   [error::Error::InvalidShape].
//!
//! Routine families, one module each:
//!
//! - [solve] — LU decomposition (`dgetrf`)
//! - [qr] — Householder QR and RQ with explicit orthogonal factors
//!   (`dgeqrf`/`dorgqr`, `dgerqf`/`dorgrq`)
//! - [svd] — singular value decomposition (`dgesvd`)
//! - [geqp3] — column-pivoted QR (`dgeqp3`)
//! - [tsqr] — Householder TSQR building blocks for blocked QR
//!   (`dgeqrt`, `dlarfb`, `dtpqrt`, `dtpmqrt`)

#![deny(rustdoc::broken_intra_doc_links, rustdoc::private_intra_doc_links)]

#[cfg(any(feature = "intel-mkl-system", feature = "intel-mkl-static"))]
extern crate intel_mkl_src as _src;

#[cfg(any(feature = "openblas-system", feature = "openblas-static"))]
extern crate openblas_src as _src;

#[cfg(any(feature = "netlib-system", feature = "netlib-static"))]
extern crate netlib_src as _src;

pub mod error;
pub mod layout;

pub mod geqp3;
pub mod qr;
pub mod solve;
pub mod svd;
pub mod tsqr;

mod alloc;

pub use self::error::{Error, Result};
pub use self::layout::MatrixLayout;
pub use self::solve::Pivot;

pub(crate) use self::alloc::*;
