use glam::{Mat2, Vec2};

use crate::{
    config::{DEFAULT_SPRING_DAMPING, DEFAULT_SPRING_STIFFNESS, LENGTH_EPSILON},
    core::{particle::Particle, types::ParticleId},
    utils::math::DenseMatrix,
};

/// Damped Hookean spring between two particles of the same system.
///
/// Coincident endpoints have no defined direction, so a spring whose current
/// length is below [`LENGTH_EPSILON`] contributes no force and no Jacobian.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    pub a: ParticleId,
    pub b: ParticleId,
    /// Stiffness, refreshed from the system parameters every step.
    pub k: f32,
    /// Damping along the spring axis, refreshed every step.
    pub c: f32,
    /// Rest length taken from the endpoints' rest positions.
    pub l0: f32,
}

impl Spring {
    pub fn new(a: ParticleId, b: ParticleId, particles: &[Particle]) -> Self {
        let mut spring = Self {
            a,
            b,
            k: DEFAULT_SPRING_STIFFNESS,
            c: DEFAULT_SPRING_DAMPING,
            l0: 0.0,
        };
        spring.recompute_rest_length(particles);
        spring
    }

    pub fn recompute_rest_length(&mut self, particles: &[Particle]) {
        let (p1, p2) = self.endpoints(particles);
        self.l0 = p1.p0.distance(p2.p0);
    }

    /// True when this spring joins `a` and `b` in either order.
    pub fn connects(&self, a: ParticleId, b: ParticleId) -> bool {
        (self.a == a && self.b == b) || (self.a == b && self.b == a)
    }

    pub fn touches(&self, particle: ParticleId) -> bool {
        self.a == particle || self.b == particle
    }

    pub fn other(&self, particle: ParticleId) -> ParticleId {
        if self.a == particle {
            self.b
        } else {
            self.a
        }
    }

    pub fn endpoints<'a>(&self, particles: &'a [Particle]) -> (&'a Particle, &'a Particle) {
        (&particles[self.a.index()], &particles[self.b.index()])
    }

    /// Current length and unit direction from `b` to `a`.
    fn axis(&self, particles: &[Particle]) -> Option<(f32, Vec2)> {
        let (p1, p2) = self.endpoints(particles);
        let delta = p1.p - p2.p;
        let length = delta.length();
        if length < LENGTH_EPSILON {
            return None;
        }
        Some((length, delta / length))
    }

    /// Elastic plus axial damping force acting on endpoint `a`.
    pub fn force(&self, particles: &[Particle]) -> Vec2 {
        let Some((length, u)) = self.axis(particles) else {
            return Vec2::ZERO;
        };
        let (p1, p2) = self.endpoints(particles);
        let stretch = length - self.l0;
        let closing_speed = (p1.v - p2.v).dot(u);
        -self.k * stretch * u - self.c * closing_speed * u
    }

    /// Adds the spring force to both endpoints' accumulators.
    pub fn apply(&self, particles: &mut [Particle]) {
        let force = self.force(particles);
        particles[self.a.index()].add_force(force);
        particles[self.b.index()].add_force(-force);
    }

    /// Adds the spring force into a `2N` force vector.
    pub fn add_force(&self, particles: &[Particle], f: &mut [f32]) {
        let force = self.force(particles);
        let (i, j) = (self.a.index() * 2, self.b.index() * 2);
        f[i] += force.x;
        f[i + 1] += force.y;
        f[j] -= force.x;
        f[j + 1] -= force.y;
    }

    /// Adds `∂f/∂x` of this spring into the `2N × 2N` stiffness matrix.
    pub fn add_dfdx(&self, particles: &[Particle], dfdx: &mut DenseMatrix) {
        let Some((length, u)) = self.axis(particles) else {
            return;
        };
        let ratio = self.l0 / length;
        let block = (Mat2::IDENTITY * (1.0 - ratio) + outer(u) * ratio) * -self.k;
        self.scatter(block, dfdx);
    }

    /// Adds `∂f/∂v` of this spring into the `2N × 2N` damping matrix.
    pub fn add_dfdv(&self, particles: &[Particle], dfdv: &mut DenseMatrix) {
        let Some((_, u)) = self.axis(particles) else {
            return;
        };
        self.scatter(outer(u) * -self.c, dfdv);
    }

    fn scatter(&self, block: Mat2, matrix: &mut DenseMatrix) {
        let (i, j) = (self.a.index() * 2, self.b.index() * 2);
        let coupling = block * -1.0;
        matrix.add_block(i, i, block);
        matrix.add_block(j, j, block);
        matrix.add_block(i, j, coupling);
        matrix.add_block(j, i, coupling);
    }

    pub fn potential_energy(&self, particles: &[Particle]) -> f32 {
        let (p1, p2) = self.endpoints(particles);
        let stretch = p1.p.distance(p2.p) - self.l0;
        0.5 * self.k * stretch * stretch
    }
}

fn outer(u: Vec2) -> Mat2 {
    Mat2::from_cols(u * u.x, u * u.y)
}
