//! Hierarchical low-rank matrix algebra using LAPACK
//!
//! This crate represents a dense operator whose off-diagonal blocks admit
//! low-rank approximation — kernel matrices from Laplace, Helmholtz or
//! Cauchy kernels over point clouds — as a block tree, and runs LU and QR
//! factorizations and triangular solves directly on that representation.
//!
//! Block representations
//! ----------------------
//!
//! A [Matrix] is exactly one of three variants:
//!
//! - [Dense]: a row-major block, possibly a view into a shared buffer,
//!   carried straight to BLAS/LAPACK (through [hlax]);
//! - [LowRank]: a factor triple `U·S·V` whose bases may be shared across
//!   sibling blocks;
//! - [Hierarchical]: a 2-D grid of [Matrix] values, recursively.
//!
//! Construction
//! -------------
//!
//! [Hierarchical::from_kernel] partitions the index range into a cluster
//! tree ([cluster]), asks the admissibility predicate per block whether
//! it may be compressed, and builds Dense leaves or rank-k blocks via the
//! randomized SVD ([randomized]); in shared-basis mode one column basis
//! per block row is sampled from the whole block row and reused
//! ([initializer], [basis_tracker]).
//!
//! ```no_run
//! use hmatrix::prelude::*;
//!
//! let x = vec![get_sorted_random_vector(64)];
//! let a = Hierarchical::from_kernel(
//!     laplace1d, &x, 64, 64,
//!     8,   // rank
//!     16,  // leaf size
//!     1.0, // admissibility
//!     2, 2,
//!     BasisType::Normal,
//!     AdmisType::PositionBased,
//! )?;
//! let (_l, _u) = getrf(Matrix::Hierarchical(a))?;
//! # Ok::<(), hmatrix::Error>(())
//! ```
//!
//! Operations
//! -----------
//!
//! Everything else is [ops]: GEMM, triangular solves, block LU, the
//! Householder TSQR drivers, addition, transposition, norms. Each
//! operation has one rule per operand-variant combination; undefined
//! combinations panic and the caller re-blocks first. Numerical failures
//! from LAPACK surface as [Error] values through every driver.

pub mod basis_tracker;
pub mod cluster;
pub mod error;
pub mod functions;
pub mod initializer;
pub mod ops;
pub mod randomized;
pub mod schedule;
pub mod settings;

mod dense;
mod hierarchical;
mod low_rank;
mod matrix;

pub use crate::dense::Dense;
pub use crate::error::{Error, Result};
pub use crate::hierarchical::Hierarchical;
pub use crate::low_rank::LowRank;
pub use crate::matrix::{gemm_dense, Matrix};

/// The names a typical driver needs.
pub mod prelude {
    pub use crate::cluster::{ClusterTree, IndexRange};
    pub use crate::functions::{
        arange, cauchy2d, equally_spaced_vector, get_sorted_random_vector, helmholtznd,
        identity, laplace1d, laplacend, random_normal, random_uniform, zeros,
    };
    pub use crate::initializer::{AdmisType, BasisType};
    pub use crate::matrix::{gemm_dense, Matrix};
    pub use crate::ops::{
        add_assign, blocked_qr, blocked_qr_apply_q, blocked_qr_extract_r, gemm, gemm_transposed,
        geqrt, getrf,
        l2_error, larfb, norm, qr, resize, rq, scale, sub_assign, tpmqrt, tpqrt, transpose,
        trmm, trsm, Side, Uplo,
    };
    pub use crate::randomized::{one_sided_id, rsvd, two_sided_id};
    pub use crate::{Dense, Error, Hierarchical, LowRank, Result};
}
