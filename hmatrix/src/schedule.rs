//! Elementary tasks over dense blocks
//!
//! Every elementary mutation of a [Dense] buffer — filling from a kernel,
//! copying, assigning a constant, elementwise addition, transposition —
//! goes through a task value that names its read-set (`constant`) and
//! write-set (`modified`) as shallow buffer handles. An external
//! task-graph scheduler can key dataflow dependencies on those buffer
//! identities; the engine itself executes each task synchronously at
//! submission, in caller order.
//!
//! While tracking is on ([start_tracking]), repeated copy and addition
//! tasks with identical operand identities are dropped, coalescing the
//! idempotent updates that shared-basis phases generate.

use crate::dense::Dense;
use crate::functions::Kernel;
use std::cell::RefCell;
use std::collections::HashSet;

/// An elementary operation with declared read and write sets.
pub trait Task {
    /// Buffers this task only reads.
    fn constant(&self) -> &[Dense];
    /// Buffers this task mutates.
    fn modified(&self) -> &[Dense];
    /// Execute synchronously.
    fn submit(&mut self);
}

type OperandKey = (usize, usize, usize);

thread_local! {
    static TRACKED: RefCell<Option<HashSet<(&'static str, OperandKey, OperandKey)>>> =
        RefCell::new(None);
}

/// Begin deduplicating repeated copy/addition tasks.
pub fn start_tracking() {
    TRACKED.with(|t| *t.borrow_mut() = Some(HashSet::new()));
}

/// Stop deduplicating and forget the seen set.
pub fn stop_tracking() {
    TRACKED.with(|t| *t.borrow_mut() = None);
}

/// Returns true when tracking is on and this (tag, operands) combination
/// has been submitted before.
fn seen_before(tag: &'static str, a: &Dense, b: &Dense) -> bool {
    TRACKED.with(|t| match &mut *t.borrow_mut() {
        Some(seen) => !seen.insert((tag, a.buffer_key(), b.buffer_key())),
        None => false,
    })
}

fn region_len(a: &Dense) -> usize {
    if a.n_rows() == 0 || a.n_cols() == 0 {
        0
    } else {
        (a.n_rows() - 1) * a.stride() + a.n_cols()
    }
}

pub struct KernelTask<'a> {
    kernel: Kernel,
    x: &'a [Vec<f64>],
    row_start: usize,
    col_start: usize,
    modified: Vec<Dense>,
}

impl Task for KernelTask<'_> {
    fn constant(&self) -> &[Dense] {
        &[]
    }

    fn modified(&self) -> &[Dense] {
        &self.modified
    }

    fn submit(&mut self) {
        let a = &mut self.modified[0];
        let (rows, cols, stride) = (a.n_rows(), a.n_cols(), a.stride());
        let len = region_len(a);
        if len == 0 {
            return;
        }
        let data = unsafe { std::slice::from_raw_parts_mut(a.as_mut_ptr(), len) };
        (self.kernel)(data, rows, cols, stride, self.x, self.row_start, self.col_start);
    }
}

pub fn kernel_task(kernel: Kernel, a: &mut Dense, x: &[Vec<f64>], row_start: usize, col_start: usize) {
    let mut task = KernelTask {
        kernel,
        x,
        row_start,
        col_start,
        modified: vec![a.share()],
    };
    task.submit();
}

pub struct CopyTask {
    row_start: usize,
    col_start: usize,
    constant: Vec<Dense>,
    modified: Vec<Dense>,
}

impl Task for CopyTask {
    fn constant(&self) -> &[Dense] {
        &self.constant
    }

    fn modified(&self) -> &[Dense] {
        &self.modified
    }

    fn submit(&mut self) {
        let a = self.constant[0].share();
        let b = &mut self.modified[0];
        for i in 0..b.n_rows() {
            for j in 0..b.n_cols() {
                b.set(i, j, a.at(self.row_start + i, self.col_start + j));
            }
        }
    }
}

/// Copy the `b`-shaped rectangle of `a` starting at
/// `(row_start, col_start)` into `b`.
pub fn copy_task(a: &Dense, b: &mut Dense, row_start: usize, col_start: usize) {
    if seen_before("copy", a, b) {
        return;
    }
    let mut task = CopyTask {
        row_start,
        col_start,
        constant: vec![a.share()],
        modified: vec![b.share()],
    };
    task.submit();
}

pub struct AssignTask {
    value: f64,
    modified: Vec<Dense>,
}

impl Task for AssignTask {
    fn constant(&self) -> &[Dense] {
        &[]
    }

    fn modified(&self) -> &[Dense] {
        &self.modified
    }

    fn submit(&mut self) {
        let a = &mut self.modified[0];
        for i in 0..a.n_rows() {
            for j in 0..a.n_cols() {
                a.set(i, j, self.value);
            }
        }
    }
}

pub fn assign_task(a: &mut Dense, value: f64) {
    let mut task = AssignTask {
        value,
        modified: vec![a.share()],
    };
    task.submit();
}

pub struct AdditionTask {
    constant: Vec<Dense>,
    modified: Vec<Dense>,
}

impl Task for AdditionTask {
    fn constant(&self) -> &[Dense] {
        &self.constant
    }

    fn modified(&self) -> &[Dense] {
        &self.modified
    }

    fn submit(&mut self) {
        let b = self.constant[0].share();
        let a = &mut self.modified[0];
        for i in 0..a.n_rows() {
            for j in 0..a.n_cols() {
                let v = a.at(i, j) + b.at(i, j);
                a.set(i, j, v);
            }
        }
    }
}

/// Elementwise `a += b`.
pub fn addition_task(a: &mut Dense, b: &Dense) {
    if seen_before("addition", a, b) {
        return;
    }
    let mut task = AdditionTask {
        constant: vec![b.share()],
        modified: vec![a.share()],
    };
    task.submit();
}

pub struct TransposeTask {
    constant: Vec<Dense>,
    modified: Vec<Dense>,
}

impl Task for TransposeTask {
    fn constant(&self) -> &[Dense] {
        &self.constant
    }

    fn modified(&self) -> &[Dense] {
        &self.modified
    }

    fn submit(&mut self) {
        let a = self.constant[0].share();
        let b = &mut self.modified[0];
        for i in 0..a.n_rows() {
            for j in 0..a.n_cols() {
                b.set(j, i, a.at(i, j));
            }
        }
    }
}

pub fn transpose_task(a: &Dense, b: &mut Dense) {
    let mut task = TransposeTask {
        constant: vec![a.share()],
        modified: vec![b.share()],
    };
    task.submit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_deduplicates_additions() {
        let mut a = Dense::new(2, 2);
        let mut b = Dense::new(2, 2);
        b.fill(1.0);
        start_tracking();
        addition_task(&mut a, &b);
        addition_task(&mut a, &b);
        stop_tracking();
        assert_eq!(a.at(0, 0), 1.0);
        addition_task(&mut a, &b);
        assert_eq!(a.at(0, 0), 2.0);
    }

    #[test]
    fn copy_task_offsets() {
        let mut a = Dense::new(3, 3);
        a.set(1, 2, 5.0);
        let mut b = Dense::new(2, 2);
        copy_task(&a, &mut b, 1, 1);
        assert_eq!(b.at(0, 1), 5.0);
    }
}
