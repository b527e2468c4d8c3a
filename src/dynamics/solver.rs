use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_SOLVER_ITERATIONS, DEFAULT_SOLVER_TOLERANCE},
    utils::math::{axpy, dot, norm, resize_zeroed, DenseMatrix},
};

/// Projection that removes disallowed components from a candidate vector.
pub trait Filter {
    fn filter(&self, v: &mut [f32]);
}

/// Filter that allows every component.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilter;

impl Filter for NoFilter {
    fn filter(&self, _v: &mut [f32]) {}
}

/// Outcome of one linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SolveStats {
    pub iterations: u32,
    /// Norm of the filtered residual of the returned iterate.
    pub residual: f32,
    pub converged: bool,
}

/// Work vectors for [`ConjugateGradient`], resized only when the dimension changes.
#[derive(Debug, Clone, Default)]
pub struct CgBuffers {
    r: Vec<f32>,
    d: Vec<f32>,
    q: Vec<f32>,
}

impl CgBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the buffers had to be resized.
    pub fn ensure_dim(&mut self, dim: usize) -> bool {
        if self.r.len() == dim {
            return false;
        }
        resize_zeroed(&mut self.r, dim);
        resize_zeroed(&mut self.d, dim);
        resize_zeroed(&mut self.q, dim);
        true
    }
}

/// Filtered conjugate gradients for symmetric systems `A x = b`.
///
/// The filter runs on the iterate, the residual and the search direction
/// after every update, so filtered components of `x` stay exactly zero no
/// matter where the iteration stops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConjugateGradient {
    pub max_iterations: u32,
    /// Stop once `|r| <= tolerance · |b|`.
    pub tolerance: f32,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self::new(DEFAULT_SOLVER_ITERATIONS, DEFAULT_SOLVER_TOLERANCE)
    }
}

impl ConjugateGradient {
    pub fn new(max_iterations: u32, tolerance: f32) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }

    /// Solves from the zero vector. Hitting the iteration cap is not an error;
    /// `x` then holds the last iterate.
    pub fn solve<F>(
        &self,
        a: &DenseMatrix,
        b: &[f32],
        x: &mut [f32],
        filter: &F,
        buffers: &mut CgBuffers,
    ) -> SolveStats
    where
        F: Filter + ?Sized,
    {
        let dim = b.len();
        debug_assert_eq!(a.dim(), dim);
        debug_assert_eq!(x.len(), dim);
        buffers.ensure_dim(dim);
        let CgBuffers { r, d, q } = buffers;

        x.fill(0.0);
        r.copy_from_slice(b);
        filter.filter(r);
        d.copy_from_slice(r);

        let threshold = self.tolerance * norm(b);
        let mut delta = dot(r, r);
        let mut stats = SolveStats {
            iterations: 0,
            residual: delta.sqrt(),
            converged: false,
        };

        while stats.residual > threshold {
            if stats.iterations >= self.max_iterations {
                debug!(
                    "conjugate gradient stopped at cap {} with residual {:.3e}",
                    self.max_iterations, stats.residual
                );
                return stats;
            }

            a.mul_vec(d, q);
            filter.filter(q);
            let curvature = dot(d, q);
            if curvature.abs() <= f32::MIN_POSITIVE {
                // direction carries no energy; keep the current iterate
                return stats;
            }

            let alpha = delta / curvature;
            axpy(alpha, d, x);
            axpy(-alpha, q, r);
            filter.filter(x);
            filter.filter(r);

            let next_delta = dot(r, r);
            let beta = next_delta / delta;
            for (di, ri) in d.iter_mut().zip(r.iter()) {
                *di = ri + beta * *di;
            }
            filter.filter(d);

            delta = next_delta;
            stats.iterations += 1;
            stats.residual = delta.sqrt();
        }

        stats.converged = true;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ZeroFirst;

    impl Filter for ZeroFirst {
        fn filter(&self, v: &mut [f32]) {
            v[0] = 0.0;
        }
    }

    fn spd() -> DenseMatrix {
        let mut a = DenseMatrix::zeros(3);
        let entries = [[4.0, 1.0, 0.0], [1.0, 3.0, -1.0], [0.0, -1.0, 2.0]];
        for (row, values) in entries.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                a.set(row, col, *value);
            }
        }
        a
    }

    #[test]
    fn solves_small_spd_system() {
        let a = spd();
        let b = [1.0, 2.0, 3.0];
        let mut x = [0.0; 3];
        let stats = ConjugateGradient::new(50, 1e-6).solve(
            &a,
            &b,
            &mut x,
            &NoFilter,
            &mut CgBuffers::new(),
        );

        assert!(stats.converged);
        let mut ax = [0.0; 3];
        a.mul_vec(&x, &mut ax);
        for (lhs, rhs) in ax.iter().zip(b.iter()) {
            assert!((lhs - rhs).abs() < 1e-4);
        }
    }

    #[test]
    fn filtered_component_stays_zero_even_when_capped() {
        let a = spd();
        let b = [5.0, 2.0, 3.0];
        let mut x = [0.0; 3];
        let stats = ConjugateGradient::new(1, 1e-9).solve(
            &a,
            &b,
            &mut x,
            &ZeroFirst,
            &mut CgBuffers::new(),
        );

        assert_eq!(stats.iterations, 1);
        assert!(!stats.converged);
        assert_eq!(x[0], 0.0);
        assert!(x[1] != 0.0 || x[2] != 0.0);
    }

    #[test]
    fn zero_rhs_converges_immediately() {
        let mut x = [1.0; 3];
        let stats = ConjugateGradient::default().solve(
            &spd(),
            &[0.0; 3],
            &mut x,
            &NoFilter,
            &mut CgBuffers::new(),
        );
        assert!(stats.converged);
        assert_eq!(stats.iterations, 0);
        assert_eq!(x, [0.0; 3]);
    }

    #[test]
    fn buffers_resize_only_on_dimension_change() {
        let mut buffers = CgBuffers::new();
        assert!(buffers.ensure_dim(6));
        assert!(!buffers.ensure_dim(6));
        assert!(buffers.ensure_dim(2));
    }
}
