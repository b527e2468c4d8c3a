use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    dynamics::function::{DerivativeFunction, PHASE_STRIDE},
    utils::math::resize_zeroed,
};

/// Explicit single-step integration schemes.
///
/// Each variant advances a phase-space state by `h` through repeated calls to
/// a [`DerivativeFunction`]. None of them can fail; a blown-up state simply
/// propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Integrator {
    #[default]
    ForwardEuler,
    Midpoint,
    /// Two-stage Runge-Kutta sampling at `t + 2h/3`, weighted 1/4 and 3/4.
    ModifiedMidpoint,
    SymplecticEuler,
    Rk4,
}

impl Integrator {
    pub const ALL: [Integrator; 5] = [
        Integrator::ForwardEuler,
        Integrator::Midpoint,
        Integrator::ModifiedMidpoint,
        Integrator::SymplecticEuler,
        Integrator::Rk4,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Integrator::ForwardEuler => "Forward Euler",
            Integrator::Midpoint => "midpoint",
            Integrator::ModifiedMidpoint => "modified midpoint",
            Integrator::SymplecticEuler => "symplectic Euler",
            Integrator::Rk4 => "RK4",
        }
    }

    /// Derivative evaluations per step.
    pub fn stages(&self) -> usize {
        match self {
            Integrator::ForwardEuler | Integrator::SymplecticEuler => 1,
            Integrator::Midpoint | Integrator::ModifiedMidpoint => 2,
            Integrator::Rk4 => 4,
        }
    }

    /// Advances `state` at time `t` by `h`, writing the result to `out`.
    pub fn step<F>(
        &self,
        state: &[f32],
        t: f32,
        h: f32,
        out: &mut [f32],
        function: &mut F,
        scratch: &mut IntegratorScratch,
    ) where
        F: DerivativeFunction + ?Sized,
    {
        debug_assert_eq!(state.len(), out.len());
        scratch.ensure_dim(state.len());
        let k1 = &mut scratch.k1[..];
        let k2 = &mut scratch.k2[..];
        let k3 = &mut scratch.k3[..];
        let k4 = &mut scratch.k4[..];
        let tmp = &mut scratch.tmp[..];

        match self {
            Integrator::ForwardEuler => {
                function.derivs(t, state, k1);
                combine(out, state, &[(h, &*k1)]);
            }
            Integrator::Midpoint => {
                function.derivs(t, state, k1);
                combine(tmp, state, &[(0.5 * h, &*k1)]);
                function.derivs(t + 0.5 * h, &*tmp, k2);
                combine(out, state, &[(h, &*k2)]);
            }
            Integrator::ModifiedMidpoint => {
                let partial = 2.0 * h / 3.0;
                function.derivs(t, state, k1);
                combine(tmp, state, &[(partial, &*k1)]);
                function.derivs(t + partial, &*tmp, k2);
                combine(out, state, &[(0.25 * h, &*k1), (0.75 * h, &*k2)]);
            }
            Integrator::SymplecticEuler => {
                function.derivs(t, state, k1);
                for ((slot, rate), next) in state
                    .chunks_exact(PHASE_STRIDE)
                    .zip(k1.chunks_exact(PHASE_STRIDE))
                    .zip(out.chunks_exact_mut(PHASE_STRIDE))
                {
                    // velocity first, then position from the new velocity
                    next[2] = slot[2] + h * rate[2];
                    next[3] = slot[3] + h * rate[3];
                    next[0] = slot[0] + h * next[2];
                    next[1] = slot[1] + h * next[3];
                }
            }
            Integrator::Rk4 => {
                let half = 0.5 * h;
                function.derivs(t, state, k1);
                combine(tmp, state, &[(half, &*k1)]);
                function.derivs(t + half, &*tmp, k2);
                combine(tmp, state, &[(half, &*k2)]);
                function.derivs(t + half, &*tmp, k3);
                combine(tmp, state, &[(h, &*k3)]);
                function.derivs(t + h, &*tmp, k4);
                combine(
                    out,
                    state,
                    &[
                        (h / 6.0, &*k1),
                        (h / 3.0, &*k2),
                        (h / 3.0, &*k3),
                        (h / 6.0, &*k4),
                    ],
                );
            }
        }
    }
}

impl fmt::Display for Integrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `out = base + Σ weight · rate`
fn combine(out: &mut [f32], base: &[f32], terms: &[(f32, &[f32])]) {
    out.copy_from_slice(base);
    for (weight, rate) in terms {
        for (value, r) in out.iter_mut().zip(rate.iter()) {
            *value += weight * r;
        }
    }
}

/// Stage buffers shared by every explicit scheme, sized to the phase space.
///
/// Buffers are only reallocated when the phase-space dimension changes.
#[derive(Debug, Clone, Default)]
pub struct IntegratorScratch {
    k1: Vec<f32>,
    k2: Vec<f32>,
    k3: Vec<f32>,
    k4: Vec<f32>,
    tmp: Vec<f32>,
    dim: usize,
    reallocations: usize,
}

impl IntegratorScratch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// How many times the buffers have been resized.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    pub fn ensure_dim(&mut self, dim: usize) {
        if dim == self.dim && self.k1.len() == dim {
            return;
        }
        debug!("resizing integrator scratch {} -> {}", self.dim, dim);
        for buffer in [
            &mut self.k1,
            &mut self.k2,
            &mut self.k3,
            &mut self.k4,
            &mut self.tmp,
        ] {
            resize_zeroed(buffer, dim);
        }
        self.dim = dim;
        self.reallocations += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uncoupled oscillators `x'' = -x`, packed as `[x, y, vx, vy]`.
    fn harmonic(_t: f32, state: &[f32], dpdt: &mut [f32]) {
        for (slot, rate) in state.chunks_exact(4).zip(dpdt.chunks_exact_mut(4)) {
            rate[0] = slot[2];
            rate[1] = slot[3];
            rate[2] = -slot[0];
            rate[3] = -slot[1];
        }
    }

    fn run(integrator: Integrator, steps: usize, h: f32) -> Vec<f32> {
        let mut state = vec![1.0, 0.0, 0.0, 0.0];
        let mut out = vec![0.0; 4];
        let mut scratch = IntegratorScratch::new();
        let mut function = harmonic;
        for i in 0..steps {
            integrator.step(&state, i as f32 * h, h, &mut out, &mut function, &mut scratch);
            std::mem::swap(&mut state, &mut out);
        }
        state
    }

    #[test]
    fn forward_euler_single_step() {
        let out = run(Integrator::ForwardEuler, 1, 0.1);
        assert_eq!(out, vec![1.0, 0.0, -0.1, 0.0]);
    }

    #[test]
    fn symplectic_euler_uses_updated_velocity() {
        let out = run(Integrator::SymplecticEuler, 1, 0.1);
        assert!((out[2] + 0.1).abs() < 1e-6);
        assert!((out[0] - 0.99).abs() < 1e-6);
    }

    #[test]
    fn midpoint_single_step() {
        // k1 = (0, -1); midpoint state (1, -0.05); k2 = (-0.05, -1)
        let out = run(Integrator::Midpoint, 1, 0.1);
        assert!((out[0] - 0.995).abs() < 1e-6);
        assert!((out[2] + 0.1).abs() < 1e-6);
    }

    #[test]
    fn higher_order_methods_track_the_exact_solution() {
        let h = 0.01;
        let steps = 100;
        let exact = (steps as f32 * h).cos();
        let errors: Vec<f32> = [
            Integrator::ForwardEuler,
            Integrator::ModifiedMidpoint,
            Integrator::Rk4,
        ]
        .iter()
        .map(|integrator| (run(*integrator, steps, h)[0] - exact).abs())
        .collect();

        assert!(errors[1] < errors[0]);
        assert!(errors[2] < 5e-5);
    }

    #[test]
    fn scratch_only_reallocates_on_dimension_change() {
        let mut scratch = IntegratorScratch::new();
        scratch.ensure_dim(8);
        scratch.ensure_dim(8);
        assert_eq!(scratch.reallocations(), 1);
        scratch.ensure_dim(12);
        assert_eq!(scratch.reallocations(), 2);
        assert_eq!(scratch.dim(), 12);
    }

    #[test]
    fn stage_counts() {
        let total: usize = Integrator::ALL.iter().map(Integrator::stages).sum();
        assert_eq!(total, 10);
    }
}
