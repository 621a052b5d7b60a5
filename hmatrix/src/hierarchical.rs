//! Hierarchical blocks
//!
//! A [Hierarchical] is a 2-D grid of [Matrix] values, each of which is
//! again Dense, LowRank or Hierarchical. All blocks in a grid row share
//! their row count and all blocks in a grid column share their column
//! count.

use crate::basis_tracker::{tracked_dense_copy, CopyTracker};
use crate::cluster::{ClusterTree, IndexRange};
use crate::error::Result;
use crate::functions::Kernel;
use crate::initializer::{AdmisType, BasisType, KernelInitializer};
use crate::low_rank::LowRank;
use crate::matrix::Matrix;

pub struct Hierarchical {
    block_dim: [usize; 2],
    data: Vec<Matrix>,
}

impl Hierarchical {
    /// Empty grid to be filled blockwise.
    pub fn new(n_row_blocks: usize, n_col_blocks: usize) -> Self {
        assert!(n_row_blocks > 0 && n_col_blocks > 0);
        let mut data = Vec::with_capacity(n_row_blocks * n_col_blocks);
        data.resize_with(n_row_blocks * n_col_blocks, Matrix::default);
        Hierarchical {
            block_dim: [n_row_blocks, n_col_blocks],
            data,
        }
    }

    /// Construct from a kernel over a (sorted) point set. The block tree
    /// follows the cluster partition; each block becomes LowRank when the
    /// admissibility predicate accepts it, Dense when it is a leaf, and a
    /// sub-grid otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn from_kernel(
        kernel: Kernel,
        x: &[Vec<f64>],
        n_rows: usize,
        n_cols: usize,
        rank: usize,
        nleaf: usize,
        admis: f64,
        n_row_blocks: usize,
        n_col_blocks: usize,
        basis_type: BasisType,
        admis_type: AdmisType,
    ) -> Result<Self> {
        let root = ClusterTree::new(
            IndexRange::new(0, n_rows),
            IndexRange::new(0, n_cols),
            n_row_blocks,
            n_col_blocks,
            nleaf,
        );
        let mut initer =
            KernelInitializer::new(kernel, x, admis, rank, basis_type, admis_type);
        let out = build(&root, &mut initer);
        // end-of-construction phase boundary, even on error
        initer.clear_trackers();
        out
    }

    /// Split an existing matrix under a block layout. With `copy = false`
    /// the blocks are views into the operand's buffers; this is the
    /// re-blocking used by the dispatch rules.
    pub fn from_matrix(
        a: &Matrix,
        n_row_blocks: usize,
        n_col_blocks: usize,
        copy: bool,
    ) -> Self {
        let root = ClusterTree::new(
            IndexRange::new(0, a.n_rows()),
            IndexRange::new(0, a.n_cols()),
            n_row_blocks,
            n_col_blocks,
            0,
        );
        let mut out = Hierarchical::new(root.block_dim[0], root.block_dim[1]);
        for child in root.children() {
            out[(child.rel_pos[0], child.rel_pos[1])] = get_part(a, &child, copy);
        }
        out
    }

    pub fn block_rows(&self) -> usize {
        self.block_dim[0]
    }

    pub fn block_cols(&self) -> usize {
        self.block_dim[1]
    }

    pub fn at(&self, i: usize, j: usize) -> &Matrix {
        assert!(i < self.block_dim[0] && j < self.block_dim[1]);
        &self.data[i * self.block_dim[1] + j]
    }

    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut Matrix {
        assert!(i < self.block_dim[0] && j < self.block_dim[1]);
        &mut self.data[i * self.block_dim[1] + j]
    }

    /// Linear indexing for grids that are a single block row or column.
    pub fn vec_at(&self, k: usize) -> &Matrix {
        assert!(
            self.block_dim[0] == 1 || self.block_dim[1] == 1,
            "linear indexing requires a block vector"
        );
        &self.data[k]
    }

    pub fn vec_at_mut(&mut self, k: usize) -> &mut Matrix {
        assert!(
            self.block_dim[0] == 1 || self.block_dim[1] == 1,
            "linear indexing requires a block vector"
        );
        &mut self.data[k]
    }

    pub fn n_rows(&self) -> usize {
        (0..self.block_dim[0]).map(|i| self.at(i, 0).n_rows()).sum()
    }

    pub fn n_cols(&self) -> usize {
        (0..self.block_dim[1]).map(|j| self.at(0, j).n_cols()).sum()
    }

    pub fn norm(&self) -> f64 {
        self.data.iter().map(|m| m.norm()).sum()
    }

    /// Replace every shared basis in the grid with a private copy.
    pub fn unshare(&mut self) {
        for block in self.data.iter_mut() {
            match block {
                Matrix::LowRank(lr) => {
                    lr.u = lr.u.clone();
                    lr.v = lr.v.clone();
                }
                Matrix::Hierarchical(h) => h.unshare(),
                Matrix::Dense(_) => {}
            }
        }
    }
}

impl std::ops::Index<(usize, usize)> for Hierarchical {
    type Output = Matrix;

    fn index(&self, (i, j): (usize, usize)) -> &Matrix {
        self.at(i, j)
    }
}

impl std::ops::IndexMut<(usize, usize)> for Hierarchical {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut Matrix {
        self.at_mut(i, j)
    }
}

impl Clone for Hierarchical {
    /// Deep copy that preserves basis sharing: two blocks sharing a basis
    /// buffer in the source share one (new) buffer in the copy. The
    /// tracker lives exactly for the duration of the copy.
    fn clone(&self) -> Self {
        let mut tracker = CopyTracker::new();
        tracked_copy(self, &mut tracker)
    }
}

fn tracked_copy(h: &Hierarchical, tracker: &mut CopyTracker) -> Hierarchical {
    let mut out = Hierarchical::new(h.block_dim[0], h.block_dim[1]);
    for i in 0..h.block_dim[0] {
        for j in 0..h.block_dim[1] {
            out[(i, j)] = match h.at(i, j) {
                Matrix::Dense(a) => Matrix::Dense(tracked_dense_copy(a, tracker)),
                Matrix::LowRank(a) => Matrix::LowRank(LowRank::from_factors(
                    tracked_dense_copy(&a.u, tracker),
                    a.s.clone(),
                    tracked_dense_copy(&a.v, tracker),
                )),
                Matrix::Hierarchical(a) => Matrix::Hierarchical(tracked_copy(a, tracker)),
            };
        }
    }
    out
}

impl std::fmt::Debug for Hierarchical {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hierarchical {}x{} [", self.block_dim[0], self.block_dim[1])?;
        for i in 0..self.block_dim[0] {
            write!(f, "  ")?;
            for j in 0..self.block_dim[1] {
                write!(f, "{} ", self.at(i, j).type_name())?;
            }
            writeln!(f)?;
        }
        write!(f, "]")
    }
}

fn build(node: &ClusterTree, initer: &mut KernelInitializer) -> Result<Hierarchical> {
    let children = node.children();
    let mut h = Hierarchical::new(node.block_dim[0], node.block_dim[1]);
    for child in &children {
        let block = if initer.is_admissible(child) {
            Matrix::LowRank(initer.compressed(child, &children)?)
        } else if child.is_leaf() {
            Matrix::Dense(initer.dense(child))
        } else {
            Matrix::Hierarchical(build(child, initer)?)
        };
        h[(child.rel_pos[0], child.rel_pos[1])] = block;
    }
    Ok(h)
}

fn get_part(a: &Matrix, node: &ClusterTree, copy: bool) -> Matrix {
    let (i, j) = (node.rows.start, node.cols.start);
    let (m, n) = (node.rows.n, node.cols.n);
    match a {
        Matrix::Dense(d) => {
            if copy {
                Matrix::Dense(d.copy_part(i, j, m, n))
            } else {
                Matrix::Dense(d.view(i, j, m, n))
            }
        }
        Matrix::LowRank(lr) => {
            let part = lr.part(i, j, m, n);
            if copy {
                Matrix::LowRank(part.clone())
            } else {
                Matrix::LowRank(part)
            }
        }
        Matrix::Hierarchical(_) => {
            panic!("split(Hierarchical) undefined; re-block the other operand")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dense::Dense;
    use crate::functions::{get_sorted_random_vector, laplace1d};

    fn sample_tree(n: usize, nleaf: usize, admis: f64) -> Hierarchical {
        let x = vec![get_sorted_random_vector(n)];
        Hierarchical::from_kernel(
            laplace1d,
            &x,
            n,
            n,
            4,
            nleaf,
            admis,
            2,
            2,
            BasisType::Normal,
            AdmisType::PositionBased,
        )
        .unwrap()
    }

    #[test]
    fn weak_admissibility_yields_hodlr() {
        let a = sample_tree(64, 16, 0.0);
        assert!(a.at(0, 1).is_low_rank());
        assert!(a.at(1, 0).is_low_rank());
        assert!(a.at(0, 0).is_hierarchical());
        match a.at(0, 0) {
            Matrix::Hierarchical(h) => {
                assert!(h.at(0, 0).is_dense());
                assert!(h.at(0, 1).is_low_rank());
            }
            _ => unreachable!(),
        }
        assert_eq!(a.n_rows(), 64);
        assert_eq!(a.n_cols(), 64);
    }

    #[test]
    fn full_admis_keeps_everything_dense() {
        let a = sample_tree(32, 16, 8.0);
        for i in 0..2 {
            for j in 0..2 {
                assert!(a.at(i, j).is_dense());
            }
        }
    }

    #[test]
    fn split_views_share_buffers() {
        let x = vec![get_sorted_random_vector(16)];
        let d = Dense::from_kernel(laplace1d, &x, 16, 16, 0, 0);
        let m = Matrix::Dense(d);
        let h = Hierarchical::from_matrix(&m, 2, 2, false);
        assert_eq!(h.at(1, 1).n_rows(), 8);
        let hd = Matrix::Hierarchical(h).to_dense();
        let src = m.to_dense();
        for i in 0..16 {
            for j in 0..16 {
                assert_eq!(hd.at(i, j), src.at(i, j));
            }
        }
    }

    #[test]
    fn clone_preserves_sharing_inside_the_copy() {
        let x = vec![get_sorted_random_vector(16)];
        let d = Dense::from_kernel(laplace1d, &x, 16, 8, 0, 8);
        let lr = LowRank::from_dense(&d, 2).unwrap();
        let mut h = Hierarchical::new(1, 2);
        let shared = LowRank::from_factors(lr.u.share(), lr.s.clone(), lr.v.share());
        h[(0, 0)] = Matrix::LowRank(lr);
        h[(0, 1)] = Matrix::LowRank(shared);
        let copy = h.clone();
        match (copy.at(0, 0), copy.at(0, 1)) {
            (Matrix::LowRank(a), Matrix::LowRank(b)) => {
                assert!(a.u.is_shared_with(&b.u));
                match h.at(0, 0) {
                    Matrix::LowRank(orig) => assert!(!a.u.is_shared_with(&orig.u)),
                    _ => unreachable!(),
                }
            }
            _ => unreachable!(),
        }
    }
}
