use glam::Vec2;

use crate::{
    config::SimulationParams,
    core::{particle::Particle, spring::Spring},
    utils::allocator::Arena,
};

/// Per-particle force that does not depend on other particles.
pub trait ForceGenerator {
    fn force(&self, particle: &Particle) -> Vec2;

    /// Adds the force to a free particle; pinned particles are skipped.
    fn apply(&self, particle: &mut Particle) {
        if particle.pinned {
            return;
        }
        let force = self.force(particle);
        particle.add_force(force);
    }
}

/// Uniform gravity pulling down the screen (+y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityForce {
    pub magnitude: f32,
}

impl GravityForce {
    pub fn new(magnitude: f32) -> Self {
        Self { magnitude }
    }
}

impl ForceGenerator for GravityForce {
    fn force(&self, particle: &Particle) -> Vec2 {
        Vec2::new(0.0, particle.mass * self.magnitude)
    }
}

/// Linear drag `-coefficient · v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViscousDrag {
    pub coefficient: f32,
}

impl ViscousDrag {
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }
}

impl ForceGenerator for ViscousDrag {
    fn force(&self, particle: &Particle) -> Vec2 {
        -self.coefficient * particle.v
    }
}

/// Gravity and drag as configured for the current step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalForces {
    pub gravity: Option<GravityForce>,
    pub drag: ViscousDrag,
}

impl Default for ExternalForces {
    fn default() -> Self {
        Self::from_params(&SimulationParams::default())
    }
}

impl ExternalForces {
    pub fn from_params(params: &SimulationParams) -> Self {
        Self {
            gravity: params
                .use_gravity
                .then(|| GravityForce::new(params.gravity)),
            drag: ViscousDrag::new(params.viscous_damping),
        }
    }

    /// Combined external force on a free particle.
    pub fn force(&self, particle: &Particle) -> Vec2 {
        let gravity = self
            .gravity
            .map(|gravity| gravity.force(particle))
            .unwrap_or(Vec2::ZERO);
        gravity + self.drag.force(particle)
    }

    pub fn apply_all(&self, particles: &mut [Particle]) {
        for particle in particles.iter_mut() {
            if let Some(gravity) = &self.gravity {
                gravity.apply(particle);
            }
            self.drag.apply(particle);
        }
    }
}

/// Clears every accumulator, then adds spring forces and external forces.
pub fn accumulate_forces(
    particles: &mut [Particle],
    springs: &Arena<Spring>,
    external: &ExternalForces,
) {
    for particle in particles.iter_mut() {
        particle.clear_force();
    }
    for spring in springs.values() {
        spring.apply(particles);
    }
    external.apply_all(particles);
}
