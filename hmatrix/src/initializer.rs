//! Kernel-driven construction of hierarchical matrices
//!
//! The [KernelInitializer] owns everything the recursive constructor
//! needs per block: the entry kernel, the point set, the admissibility
//! predicate, the target rank, and — in shared-basis mode — the trackers
//! caching one column basis per block row and one row basis per block
//! column.

use crate::basis_tracker::RangeTracker;
use crate::cluster::ClusterTree;
use crate::dense::{dense_gemm, Dense};
use crate::error::Result;
use crate::functions::{random_uniform, Kernel};
use crate::low_rank::LowRank;
use crate::ops::qr::dense_qr;
use crate::randomized::dense_svd;
use crate::schedule;

/// How admissible blocks obtain their bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisType {
    /// Each block is compressed independently with the randomized SVD.
    Normal,
    /// All admissible blocks of a block row share one column basis, all
    /// admissible blocks of a block column share one row basis.
    Shared,
}

/// Which admissibility predicate decides dense vs. compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmisType {
    /// `|i_abs - j_abs| > admis` on the level's block grid.
    PositionBased,
    /// `max(diam(rows), diam(cols)) <= admis · dist(centers)` over the
    /// point set.
    GeometryBased,
}

pub struct KernelInitializer<'a> {
    kernel: Kernel,
    x: &'a [Vec<f64>],
    admis: f64,
    rank: usize,
    basis_type: BasisType,
    admis_type: AdmisType,
    col_basis: RangeTracker,
    row_basis: RangeTracker,
}

impl<'a> KernelInitializer<'a> {
    pub fn new(
        kernel: Kernel,
        x: &'a [Vec<f64>],
        admis: f64,
        rank: usize,
        basis_type: BasisType,
        admis_type: AdmisType,
    ) -> Self {
        KernelInitializer {
            kernel,
            x,
            admis,
            rank,
            basis_type,
            admis_type,
            col_basis: RangeTracker::new(),
            row_basis: RangeTracker::new(),
        }
    }

    /// Vectors are never admissible; beyond that the configured predicate
    /// decides.
    pub fn is_admissible(&self, node: &ClusterTree) -> bool {
        if node.rows.n <= 1 || node.cols.n <= 1 {
            return false;
        }
        match self.admis_type {
            AdmisType::PositionBased => node.dist_to_diag() as f64 > self.admis,
            AdmisType::GeometryBased => self.is_admissible_nd(node),
        }
    }

    fn is_admissible_nd(&self, node: &ClusterTree) -> bool {
        let mut diam_rows: f64 = 0.0;
        let mut diam_cols: f64 = 0.0;
        let mut dist = 0.0;
        for xk in self.x {
            diam_rows = diam_rows.max(diam(xk, node.rows.n, node.rows.start));
            diam_cols = diam_cols.max(diam(xk, node.cols.n, node.cols.start));
            let c = mean(xk, node.rows.n, node.rows.start) - mean(xk, node.cols.n, node.cols.start);
            dist += c * c;
        }
        diam_rows.max(diam_cols) <= self.admis * dist.sqrt()
    }

    /// Dense representation of a block, filled by the kernel.
    pub fn dense(&self, node: &ClusterTree) -> Dense {
        Dense::from_kernel(
            self.kernel,
            self.x,
            node.rows.n,
            node.cols.n,
            node.rows.start,
            node.cols.start,
        )
    }

    /// Compressed representation of an admissible block. `siblings` is
    /// the full child list of the block's parent (row-major), needed to
    /// assemble block rows and columns in shared-basis mode.
    pub fn compressed(
        &mut self,
        node: &ClusterTree,
        siblings: &[ClusterTree],
    ) -> Result<LowRank> {
        match self.basis_type {
            BasisType::Normal => LowRank::from_dense(&self.dense(node), self.rank),
            BasisType::Shared => self.compressed_shared(node, siblings),
        }
    }

    fn compressed_shared(
        &mut self,
        node: &ClusterTree,
        siblings: &[ClusterTree],
    ) -> Result<LowRank> {
        let sample_size = (self.rank + 5).min(node.rows.n).min(node.cols.n);
        if !self.col_basis.has_basis(&node.rows) {
            let block_row = self.make_block_row(node, siblings);
            let u = range_finder_cols(&block_row, sample_size, self.rank)?;
            self.col_basis.insert(node.rows, u);
        }
        if !self.row_basis.has_basis(&node.cols) {
            let block_col = self.make_block_col(node, siblings);
            let v = range_finder_rows(&block_col, sample_size, self.rank)?;
            self.row_basis.insert(node.cols, v);
        }
        let d = self.dense(node);
        let u = self.col_basis.get(&node.rows).share();
        let v = self.row_basis.get(&node.cols).share();
        // S = Uᵀ · A · Vᵀ
        let mut utd = Dense::new(self.rank, node.cols.n);
        dense_gemm(&u, &d, &mut utd, true, false, 1.0, 0.0);
        let mut s = Dense::new(self.rank, self.rank);
        dense_gemm(&utd, &v, &mut s, false, true, 1.0, 0.0);
        Ok(LowRank::from_factors(u, s, v))
    }

    /// Concatenation of this block row's admissible blocks.
    fn make_block_row(&self, node: &ClusterTree, siblings: &[ClusterTree]) -> Dense {
        let admissible: Vec<&ClusterTree> = siblings
            .iter()
            .filter(|s| s.rel_pos[0] == node.rel_pos[0] && self.is_admissible(s))
            .collect();
        let n_cols: usize = admissible.iter().map(|s| s.cols.n).sum();
        let block_row = Dense::new(node.rows.n, n_cols);
        let mut col_start = 0;
        for block in admissible {
            let mut part = block_row.view(0, col_start, block.rows.n, block.cols.n);
            schedule::kernel_task(
                self.kernel,
                &mut part,
                self.x,
                block.rows.start,
                block.cols.start,
            );
            col_start += block.cols.n;
        }
        block_row
    }

    /// Concatenation of this block column's admissible blocks.
    fn make_block_col(&self, node: &ClusterTree, siblings: &[ClusterTree]) -> Dense {
        let admissible: Vec<&ClusterTree> = siblings
            .iter()
            .filter(|s| s.rel_pos[1] == node.rel_pos[1] && self.is_admissible(s))
            .collect();
        let n_rows: usize = admissible.iter().map(|s| s.rows.n).sum();
        let block_col = Dense::new(n_rows, node.cols.n);
        let mut row_start = 0;
        for block in admissible {
            let mut part = block_col.view(row_start, 0, block.rows.n, block.cols.n);
            schedule::kernel_task(
                self.kernel,
                &mut part,
                self.x,
                block.rows.start,
                block.cols.start,
            );
            row_start += block.rows.n;
        }
        block_col
    }

    /// End-of-phase boundary: forget all cached bases.
    pub fn clear_trackers(&mut self) {
        self.col_basis.clear();
        self.row_basis.clear();
    }
}

/// Orthonormal column basis of `a`, truncated to `rank` columns.
fn range_finder_cols(a: &Dense, sample_size: usize, rank: usize) -> Result<Dense> {
    let rn = Dense::from_kernel(random_uniform, &[], a.n_cols(), sample_size, 0, 0);
    let mut y = Dense::new(a.n_rows(), sample_size);
    dense_gemm(a, &rn, &mut y, false, false, 1.0, 0.0);
    let mut q = Dense::new(a.n_rows(), sample_size);
    let mut r = Dense::new(sample_size, sample_size);
    dense_qr(&y, &mut q, &mut r)?;
    let mut qta = Dense::new(sample_size, a.n_cols());
    dense_gemm(&q, a, &mut qta, true, false, 1.0, 0.0);
    let (ub, _sigma, _vt) = dense_svd(&qta)?;
    let mut u = Dense::new(a.n_rows(), sample_size);
    dense_gemm(&q, &ub, &mut u, false, false, 1.0, 0.0);
    Ok(u.copy_part(0, 0, a.n_rows(), rank))
}

/// Orthonormal row basis of `a`, truncated to `rank` rows.
fn range_finder_rows(a: &Dense, sample_size: usize, rank: usize) -> Result<Dense> {
    let rn = Dense::from_kernel(random_uniform, &[], a.n_cols(), sample_size, 0, 0);
    let mut y = Dense::new(a.n_rows(), sample_size);
    dense_gemm(a, &rn, &mut y, false, false, 1.0, 0.0);
    let mut q = Dense::new(a.n_rows(), sample_size);
    let mut r = Dense::new(sample_size, sample_size);
    dense_qr(&y, &mut q, &mut r)?;
    let mut qta = Dense::new(sample_size, a.n_cols());
    dense_gemm(&q, a, &mut qta, true, false, 1.0, 0.0);
    let (_ub, _sigma, vt) = dense_svd(&qta)?;
    Ok(vt.copy_part(0, 0, rank, a.n_cols()))
}

fn diam(xk: &[f64], n: usize, start: usize) -> f64 {
    let slice = &xk[start..start + n];
    let max = slice.iter().cloned().fold(f64::MIN, f64::max);
    let min = slice.iter().cloned().fold(f64::MAX, f64::min);
    max - min
}

fn mean(xk: &[f64], n: usize, start: usize) -> f64 {
    xk[start..start + n].iter().sum::<f64>() / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::IndexRange;
    use crate::functions::{equally_spaced_vector, laplace1d};

    fn level_children(n: usize, blocks: usize) -> Vec<ClusterTree> {
        ClusterTree::new(
            IndexRange::new(0, n),
            IndexRange::new(0, n),
            blocks,
            blocks,
            n / blocks,
        )
        .children()
    }

    #[test]
    fn position_admissibility_is_symmetric() {
        let x = vec![equally_spaced_vector(64, 0.0, 1.0)];
        let initer = KernelInitializer::new(
            laplace1d,
            &x,
            1.0,
            4,
            BasisType::Normal,
            AdmisType::PositionBased,
        );
        let children = level_children(64, 4);
        for a in &children {
            let mirrored = children
                .iter()
                .find(|b| {
                    b.rel_pos[0] == a.rel_pos[1] && b.rel_pos[1] == a.rel_pos[0]
                })
                .unwrap();
            assert_eq!(initer.is_admissible(a), initer.is_admissible(mirrored));
        }
    }

    #[test]
    fn vectors_are_never_admissible() {
        let x = vec![equally_spaced_vector(16, 0.0, 1.0)];
        let initer = KernelInitializer::new(
            laplace1d,
            &x,
            0.0,
            2,
            BasisType::Normal,
            AdmisType::GeometryBased,
        );
        let node = ClusterTree::new(IndexRange::new(0, 8), IndexRange::new(8, 1), 1, 1, 8);
        assert!(!initer.is_admissible(&node));
    }

    #[test]
    fn geometry_admissibility_accepts_separated_clusters() {
        let x = vec![equally_spaced_vector(64, 0.0, 1.0)];
        let initer = KernelInitializer::new(
            laplace1d,
            &x,
            2.0,
            4,
            BasisType::Normal,
            AdmisType::GeometryBased,
        );
        let children = level_children(64, 4);
        // far off-diagonal block: small diameters, large distance
        let far = children
            .iter()
            .find(|c| c.rel_pos == [0, 3])
            .unwrap();
        let diag = children
            .iter()
            .find(|c| c.rel_pos == [1, 1])
            .unwrap();
        assert!(initer.is_admissible(far));
        assert!(!initer.is_admissible(diag));
    }
}
