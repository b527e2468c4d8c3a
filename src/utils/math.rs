//! Small dense linear-algebra helpers for the implicit solve.

use glam::Mat2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Square row-major matrix sized `dim × dim`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DenseMatrix {
    dim: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Resets to `dim × dim` zeros, reusing the existing allocation when it is large enough.
    pub fn resize(&mut self, dim: usize) {
        self.dim = dim;
        self.data.clear();
        self.data.resize(dim * dim, 0.0);
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.dim + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.dim + col] = value;
    }

    pub fn add(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.dim + col] += value;
    }

    /// Adds a 2×2 block whose top-left entry lands at `(row, col)`.
    pub fn add_block(&mut self, row: usize, col: usize, block: Mat2) {
        for c in 0..2 {
            let column = block.col(c);
            self.add(row, col + c, column.x);
            self.add(row + 1, col + c, column.y);
        }
    }

    /// Replaces row and column `dof` with the identity so the solve leaves it alone.
    pub fn neutralize_dof(&mut self, dof: usize) {
        for k in 0..self.dim {
            self.set(dof, k, 0.0);
            self.set(k, dof, 0.0);
        }
        self.set(dof, dof, 1.0);
    }

    /// `self = alpha · x + beta · y`, all three of equal size.
    pub fn assign_combination(&mut self, alpha: f32, x: &DenseMatrix, beta: f32, y: &DenseMatrix) {
        debug_assert_eq!(x.dim, self.dim);
        debug_assert_eq!(y.dim, self.dim);
        for ((out, xi), yi) in self.data.iter_mut().zip(&x.data).zip(&y.data) {
            *out = alpha * xi + beta * yi;
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// `out = self · x`
    pub fn mul_vec(&self, x: &[f32], out: &mut [f32]) {
        debug_assert_eq!(x.len(), self.dim);
        debug_assert_eq!(out.len(), self.dim);
        if self.dim == 0 {
            return;
        }

        #[cfg(feature = "parallel")]
        {
            out.par_iter_mut()
                .zip(self.data.par_chunks(self.dim))
                .for_each(|(value, row)| *value = dot(row, x));
        }

        #[cfg(not(feature = "parallel"))]
        {
            for (value, row) in out.iter_mut().zip(self.data.chunks(self.dim)) {
                *value = dot(row, x);
            }
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(a: &[f32]) -> f32 {
    dot(a, a).sqrt()
}

/// `y += alpha · x`
pub fn axpy(alpha: f32, x: &[f32], y: &mut [f32]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Resizes a work vector to `len` zeros; returns true when the length changed.
pub fn resize_zeroed(buffer: &mut Vec<f32>, len: usize) -> bool {
    let changed = buffer.len() != len;
    buffer.clear();
    buffer.resize(len, 0.0);
    changed
}
