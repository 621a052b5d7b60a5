//! The universal matrix value
//!
//! [Matrix] is the closed variant over the three block representations.
//! Every operation in [crate::ops] dispatches on the runtime variants of
//! all of its operands; a missing rule is a contract violation that
//! panics with the variant names, and the caller is expected to re-block
//! an operand first.

use crate::dense::Dense;
use crate::hierarchical::Hierarchical;
use crate::low_rank::LowRank;

pub enum Matrix {
    Dense(Dense),
    LowRank(LowRank),
    Hierarchical(Hierarchical),
}

impl Matrix {
    pub fn n_rows(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.n_rows(),
            Matrix::LowRank(a) => a.n_rows(),
            Matrix::Hierarchical(a) => a.n_rows(),
        }
    }

    pub fn n_cols(&self) -> usize {
        match self {
            Matrix::Dense(a) => a.n_cols(),
            Matrix::LowRank(a) => a.n_cols(),
            Matrix::Hierarchical(a) => a.n_cols(),
        }
    }

    /// Variant name for dispatch diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Matrix::Dense(_) => "Dense",
            Matrix::LowRank(_) => "LowRank",
            Matrix::Hierarchical(_) => "Hierarchical",
        }
    }

    pub fn is_dense(&self) -> bool {
        matches!(self, Matrix::Dense(_))
    }

    pub fn is_low_rank(&self) -> bool {
        matches!(self, Matrix::LowRank(_))
    }

    pub fn is_hierarchical(&self) -> bool {
        matches!(self, Matrix::Hierarchical(_))
    }

    /// Squared Frobenius sum over the dense leaves.
    pub fn norm(&self) -> f64 {
        match self {
            Matrix::Dense(a) => a.norm(),
            Matrix::LowRank(a) => a.norm(),
            Matrix::Hierarchical(a) => a.norm(),
        }
    }

    /// Materialize the represented operator as one dense block.
    pub fn to_dense(&self) -> Dense {
        match self {
            Matrix::Dense(a) => a.clone(),
            Matrix::LowRank(a) => a.to_dense(),
            Matrix::Hierarchical(a) => {
                let mut out = Dense::new(a.n_rows(), a.n_cols());
                let mut row = 0;
                for i in 0..a.block_rows() {
                    let mut col = 0;
                    let mut block_height = 0;
                    for j in 0..a.block_cols() {
                        let child = a.at(i, j).to_dense();
                        let mut part = out.view(row, col, child.n_rows(), child.n_cols());
                        crate::schedule::copy_task(&child, &mut part, 0, 0);
                        col += child.n_cols();
                        block_height = child.n_rows();
                    }
                    row += block_height;
                }
                out
            }
        }
    }

    pub(crate) fn expect_dense(&self, what: &str) -> &Dense {
        match self {
            Matrix::Dense(a) => a,
            _ => panic!("{}({}) undefined", what, self.type_name()),
        }
    }

    pub(crate) fn expect_dense_mut(&mut self, what: &str) -> &mut Dense {
        match self {
            Matrix::Dense(a) => a,
            _ => panic!("{}({}) undefined", what, self.type_name()),
        }
    }

    /// Take the value out, leaving an empty Dense behind.
    pub fn take(&mut self) -> Matrix {
        std::mem::take(self)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::Dense(Dense::new(0, 0))
    }
}

impl Clone for Matrix {
    /// Deep copy. A Hierarchical clone threads the copy tracker so that
    /// bases shared inside the source stay shared inside the copy.
    fn clone(&self) -> Self {
        match self {
            Matrix::Dense(a) => Matrix::Dense(a.clone()),
            Matrix::LowRank(a) => Matrix::LowRank(a.clone()),
            Matrix::Hierarchical(a) => Matrix::Hierarchical(a.clone()),
        }
    }
}

impl From<Dense> for Matrix {
    fn from(a: Dense) -> Self {
        Matrix::Dense(a)
    }
}

impl From<LowRank> for Matrix {
    fn from(a: LowRank) -> Self {
        Matrix::LowRank(a)
    }
}

impl From<Hierarchical> for Matrix {
    fn from(a: Hierarchical) -> Self {
        Matrix::Hierarchical(a)
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matrix::Dense(a) => a.fmt(f),
            Matrix::LowRank(a) => a.fmt(f),
            Matrix::Hierarchical(a) => a.fmt(f),
        }
    }
}

/// `a · b` densified, the out-of-place convenience used by drivers and
/// verification code.
pub fn gemm_dense(a: &Matrix, b: &Matrix) -> crate::error::Result<Dense> {
    let mut c = Matrix::Dense(Dense::new(a.n_rows(), b.n_cols()));
    crate::ops::gemm(a, b, &mut c, 1.0, 0.0)?;
    match c {
        Matrix::Dense(d) => Ok(d),
        _ => unreachable!(),
    }
}
