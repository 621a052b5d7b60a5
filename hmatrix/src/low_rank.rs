//! Low-rank blocks
//!
//! A [LowRank] stores the factor triple `U·S·V` of an m×n block: `U` is
//! m×r, `S` r×r, `V` r×n. `U` and `V` may be shared with sibling blocks
//! (see [crate::basis_tracker]); `S` is always private to the block.

use crate::basis_tracker::decouple_basis;
use crate::dense::{dense_gemm, dense_trmm, Dense};
use crate::error::Result;
use crate::ops::qr::{dense_qr, dense_rq};
use crate::ops::{Side, Uplo};
use crate::randomized::{dense_svd, rsvd};
use crate::settings;

pub struct LowRank {
    dim: [usize; 2],
    rank: usize,
    pub u: Dense,
    pub s: Dense,
    pub v: Dense,
}

impl LowRank {
    /// Zero-initialized m×n block of rank k.
    pub fn new(n_rows: usize, n_cols: usize, k: usize) -> Self {
        LowRank {
            dim: [n_rows, n_cols],
            rank: k,
            u: Dense::new(n_rows, k),
            s: Dense::new(k, k),
            v: Dense::new(k, n_cols),
        }
    }

    /// Compress a dense block to rank `k` with the randomized SVD,
    /// oversampling by 5 columns where the dimensions allow it.
    /// Truncation is hard: `k` is the caller's choice, not error-driven.
    pub fn from_dense(a: &Dense, k: usize) -> Result<Self> {
        let (m, n) = (a.n_rows(), a.n_cols());
        assert!(
            k >= 1 && k <= m.min(n),
            "LowRank rank {} out of range for {}x{} block",
            k,
            m,
            n
        );
        let sample_size = (k + 5).min(m).min(n);
        let (u_full, s_full, v_full) = rsvd(a, sample_size)?;
        Ok(LowRank {
            dim: [m, n],
            rank: k,
            u: u_full.copy_part(0, 0, m, k),
            s: s_full.copy_part(0, 0, k, k),
            v: v_full.copy_part(0, 0, k, n),
        })
    }

    /// Assemble from existing factors, taking them as given (pass
    /// `Dense::share` handles to keep bases shared).
    pub fn from_factors(u: Dense, s: Dense, v: Dense) -> Self {
        assert_eq!(u.n_cols(), s.n_rows(), "LowRank factor rank mismatch");
        assert_eq!(s.n_rows(), s.n_cols(), "LowRank S must be square");
        assert_eq!(s.n_cols(), v.n_rows(), "LowRank factor rank mismatch");
        LowRank {
            dim: [u.n_rows(), v.n_cols()],
            rank: s.n_rows(),
            u,
            s,
            v,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.dim[0]
    }

    pub fn n_cols(&self) -> usize {
        self.dim[1]
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Sub-block over the given ranges, sharing all three factor buffers.
    pub fn part(
        &self,
        row_start: usize,
        col_start: usize,
        n_rows: usize,
        n_cols: usize,
    ) -> LowRank {
        LowRank::from_factors(
            self.u.view(row_start, 0, n_rows, self.rank),
            self.s.share(),
            self.v.view(0, col_start, self.rank, n_cols),
        )
    }

    pub fn to_dense(&self) -> Dense {
        let mut us = Dense::new(self.dim[0], self.rank);
        dense_gemm(&self.u, &self.s, &mut us, false, false, 1.0, 0.0);
        let mut out = Dense::new(self.dim[0], self.dim[1]);
        dense_gemm(&us, &self.v, &mut out, false, false, 1.0, 0.0);
        out
    }

    pub fn norm(&self) -> f64 {
        self.to_dense().norm()
    }

    pub fn scale(&mut self, alpha: f64) {
        decouple_basis(&mut self.s);
        self.s.scale(alpha);
    }

    pub fn transposed(&self) -> LowRank {
        LowRank {
            dim: [self.dim[1], self.dim[0]],
            rank: self.rank,
            u: self.v.transposed(),
            s: self.s.transposed(),
            v: self.u.transposed(),
        }
    }

    pub fn merge_u(&mut self, a: &LowRank, b: &LowRank) {
        assert_eq!(self.rank, a.rank + b.rank);
        for i in 0..self.dim[0] {
            for j in 0..a.rank {
                self.u.set(i, j, a.u.at(i, j));
            }
            for j in 0..b.rank {
                self.u.set(i, j + a.rank, b.u.at(i, j));
            }
        }
    }

    pub fn merge_s(&mut self, a: &LowRank, b: &LowRank) {
        assert_eq!(self.rank, a.rank + b.rank);
        for i in 0..a.rank {
            for j in 0..a.rank {
                self.s.set(i, j, a.s.at(i, j));
            }
            for j in 0..b.rank {
                self.s.set(i, j + a.rank, 0.0);
            }
        }
        for i in 0..b.rank {
            for j in 0..a.rank {
                self.s.set(i + a.rank, j, 0.0);
            }
            for j in 0..b.rank {
                self.s.set(i + a.rank, j + a.rank, b.s.at(i, j));
            }
        }
    }

    pub fn merge_v(&mut self, a: &LowRank, b: &LowRank) {
        assert_eq!(self.rank, a.rank + b.rank);
        for i in 0..a.rank {
            for j in 0..self.dim[1] {
                self.v.set(i, j, a.v.at(i, j));
            }
        }
        for i in 0..b.rank {
            for j in 0..self.dim[1] {
                self.v.set(i + a.rank, j, b.v.at(i, j));
            }
        }
    }

    /// Low-rank addition, strategy selected by the `LRA` flag (see
    /// [settings::LraStrategy]).
    pub fn add_assign(&mut self, other: &LowRank) -> Result<()> {
        assert_eq!(
            self.dim, other.dim,
            "LowRank += LowRank shape mismatch"
        );
        match settings::lra_strategy() {
            settings::LraStrategy::Naive => self.recompress_dense(other),
            settings::LraStrategy::Orthogonal => {
                if self.rank + other.rank >= self.dim[0].min(self.dim[1]) {
                    self.recompress_dense(other)
                } else {
                    self.recompress_orthogonal(other)
                }
            }
            settings::LraStrategy::Default => {
                if self.rank + other.rank >= self.dim[0].min(self.dim[1]) {
                    self.recompress_dense(other)
                } else {
                    self.merge(other);
                    Ok(())
                }
            }
        }
    }

    /// Merge-add: block-diagonal S, side-by-side U, stacked V. The rank
    /// grows to the sum of the addend ranks.
    fn merge(&mut self, other: &LowRank) {
        let mut merged = LowRank::new(self.dim[0], self.dim[1], self.rank + other.rank);
        merged.merge_u(self, other);
        merged.merge_s(self, other);
        merged.merge_v(self, other);
        *self = merged;
    }

    /// Densify both addends and recompress to the left rank.
    fn recompress_dense(&mut self, other: &LowRank) -> Result<()> {
        let mut sum = self.to_dense();
        sum.add_assign_dense(&other.to_dense());
        *self = LowRank::from_dense(&sum, self.rank)?;
        count_recompression();
        Ok(())
    }

    /// Orthogonal recompression: QR the merged column basis, RQ the
    /// merged row basis, and truncate the SVD of the small inner factor.
    /// Up to rsvd accuracy this is the rank-r truncated SVD of the sum.
    fn recompress_orthogonal(&mut self, other: &LowRank) -> Result<()> {
        let rank = self.rank;
        let mut merged = LowRank::new(self.dim[0], self.dim[1], self.rank + other.rank);
        merged.merge_u(self, other);
        merged.merge_s(self, other);
        merged.merge_v(self, other);
        let r2 = merged.rank;

        let mut qu = Dense::new(self.dim[0], r2);
        let mut ru = Dense::new(r2, r2);
        dense_qr(&merged.u, &mut qu, &mut ru)?;

        let mut rv = Dense::new(r2, r2);
        let mut qv = Dense::new(r2, self.dim[1]);
        dense_rq(&merged.v, &mut rv, &mut qv)?;

        // inner = Ru · S · Rv, both triangular factors applied in place
        let mut inner = merged.s.clone();
        dense_trmm(&ru, &mut inner, Side::Left, Uplo::Upper, false);
        dense_trmm(&rv, &mut inner, Side::Right, Uplo::Upper, false);

        let (ui, sigma, vti) = dense_svd(&inner)?;

        let mut u = Dense::new(self.dim[0], rank);
        dense_gemm(&qu, &ui.copy_part(0, 0, r2, rank), &mut u, false, false, 1.0, 0.0);
        let mut v = Dense::new(rank, self.dim[1]);
        dense_gemm(&vti.copy_part(0, 0, rank, r2), &qv, &mut v, false, false, 1.0, 0.0);
        let mut s = Dense::new(rank, rank);
        for (i, val) in sigma.iter().take(rank).enumerate() {
            s.set(i, i, *val);
        }

        self.u = u;
        self.s = s;
        self.v = v;
        count_recompression();
        Ok(())
    }
}

fn count_recompression() {
    if settings::flag(settings::LR_ADDITION_COUNTER) != 0 {
        settings::increment_counter(settings::LR_ADDITION);
    }
}

impl Clone for LowRank {
    /// Deep copy of all three factors. Sharing-preserving copies go
    /// through the Hierarchical copy tracker instead.
    fn clone(&self) -> Self {
        LowRank {
            dim: self.dim,
            rank: self.rank,
            u: self.u.clone(),
            s: self.s.clone(),
            v: self.v.clone(),
        }
    }
}

impl std::fmt::Debug for LowRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LowRank")
            .field("dim", &self.dim)
            .field("rank", &self.rank)
            .finish()
    }
}
