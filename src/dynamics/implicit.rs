//! Linearised backward Euler step for the whole particle set.
//!
//! Solves `(M - h·∂f/∂v - h²·∂f/∂x) Δv = h·(f + h·∂f/∂x·v)` for the velocity
//! increment, then sets `v ← v + Δv` and `x ← x + h·v`. Pinned particles are
//! removed from the system twice: their rows and columns are replaced by the
//! identity, and the solver filter zeroes their components every iteration.

use log::debug;

use crate::{
    core::{particle::Particle, spring::Spring},
    dynamics::{
        forces::ExternalForces,
        solver::{CgBuffers, ConjugateGradient, Filter, SolveStats},
    },
    utils::{
        allocator::Arena,
        math::{resize_zeroed, DenseMatrix},
    },
};

/// Zeroes the velocity components of pinned particles.
#[derive(Debug, Clone, Copy)]
pub struct PinnedFilter<'a> {
    pinned: &'a [usize],
}

impl<'a> PinnedFilter<'a> {
    /// `pinned` holds particle indices; each owns two consecutive dofs.
    pub fn new(pinned: &'a [usize]) -> Self {
        Self { pinned }
    }
}

impl Filter for PinnedFilter<'_> {
    fn filter(&self, v: &mut [f32]) {
        for &index in self.pinned {
            v[2 * index] = 0.0;
            v[2 * index + 1] = 0.0;
        }
    }
}

/// Matrices and vectors of the implicit step, kept between steps.
#[derive(Debug, Clone, Default)]
pub struct ImplicitWorkspace {
    a: DenseMatrix,
    dfdx: DenseMatrix,
    dfdv: DenseMatrix,
    f: Vec<f32>,
    b: Vec<f32>,
    xdot: Vec<f32>,
    delta_v: Vec<f32>,
    tmp: Vec<f32>,
    pinned: Vec<usize>,
    cg: CgBuffers,
    dim: usize,
    reallocations: usize,
}

impl ImplicitWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of velocity dofs (`2N`) the buffers are sized for.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    fn ensure_dim(&mut self, dim: usize) {
        if dim == self.dim && self.f.len() == dim {
            return;
        }
        debug!("resizing implicit workspace {} -> {}", self.dim, dim);
        self.a.resize(dim);
        self.dfdx.resize(dim);
        self.dfdv.resize(dim);
        for buffer in [
            &mut self.f,
            &mut self.b,
            &mut self.xdot,
            &mut self.delta_v,
            &mut self.tmp,
        ] {
            resize_zeroed(buffer, dim);
        }
        self.cg.ensure_dim(dim);
        self.dim = dim;
        self.reallocations += 1;
    }
}

/// Backward Euler integrator with a filtered conjugate gradient solve.
#[derive(Debug, Clone, Default)]
pub struct BackwardEuler {
    pub solver: ConjugateGradient,
    workspace: ImplicitWorkspace,
}

impl BackwardEuler {
    pub fn new(solver: ConjugateGradient) -> Self {
        Self {
            solver,
            workspace: ImplicitWorkspace::new(),
        }
    }

    pub fn workspace(&self) -> &ImplicitWorkspace {
        &self.workspace
    }

    /// Advances every free particle by `h`, leaving pinned particles in place.
    pub fn step(
        &mut self,
        particles: &mut [Particle],
        springs: &Arena<Spring>,
        external: &ExternalForces,
        h: f32,
    ) -> SolveStats {
        let dim = particles.len() * 2;
        let ws = &mut self.workspace;
        ws.ensure_dim(dim);
        if dim == 0 {
            return SolveStats {
                converged: true,
                ..SolveStats::default()
            };
        }

        ws.f.fill(0.0);
        ws.dfdx.fill(0.0);
        ws.dfdv.fill(0.0);
        ws.pinned.clear();

        for spring in springs.values() {
            spring.add_force(particles, &mut ws.f);
            spring.add_dfdx(particles, &mut ws.dfdx);
            spring.add_dfdv(particles, &mut ws.dfdv);
        }

        for (i, particle) in particles.iter().enumerate() {
            let (x, y) = (2 * i, 2 * i + 1);
            if particle.pinned {
                ws.pinned.push(i);
                ws.xdot[x] = 0.0;
                ws.xdot[y] = 0.0;
                continue;
            }
            let force = external.force(particle);
            ws.f[x] += force.x;
            ws.f[y] += force.y;
            ws.dfdv.add(x, x, -external.drag.coefficient);
            ws.dfdv.add(y, y, -external.drag.coefficient);
            ws.xdot[x] = particle.v.x;
            ws.xdot[y] = particle.v.y;
        }

        // A = M - h·dfdv - h²·dfdx
        ws.a.assign_combination(-h, &ws.dfdv, -h * h, &ws.dfdx);
        for (i, particle) in particles.iter().enumerate() {
            ws.a.add(2 * i, 2 * i, particle.mass);
            ws.a.add(2 * i + 1, 2 * i + 1, particle.mass);
        }

        // b = h·(f + h·dfdx·v)
        ws.dfdx.mul_vec(&ws.xdot, &mut ws.tmp);
        for ((b, f), k) in ws.b.iter_mut().zip(&ws.f).zip(&ws.tmp) {
            *b = h * (f + h * k);
        }

        for &index in &ws.pinned {
            ws.a.neutralize_dof(2 * index);
            ws.a.neutralize_dof(2 * index + 1);
        }
        let filter = PinnedFilter::new(&ws.pinned);
        filter.filter(&mut ws.b);

        let stats = self
            .solver
            .solve(&ws.a, &ws.b, &mut ws.delta_v, &filter, &mut ws.cg);

        for (i, particle) in particles.iter_mut().enumerate() {
            let (x, y) = (2 * i, 2 * i + 1);
            particle.f.x = ws.f[x];
            particle.f.y = ws.f[y];
            if particle.pinned {
                particle.v = glam::Vec2::ZERO;
                continue;
            }
            particle.v.x = ws.xdot[x] + ws.delta_v[x];
            particle.v.y = ws.xdot[y] + ws.delta_v[y];
            particle.p += h * particle.v;
        }

        stats
    }
}
