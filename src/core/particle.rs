use glam::Vec2;

use crate::{
    config::{DEFAULT_PARTICLE_COLOR, DEFAULT_PARTICLE_MASS, DEFAULT_PARTICLE_SIZE},
    core::types::{Color, ParticleId, SpringId},
};

/// Point mass with a rest state, a current state and a force accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Slot in the owning system's particle sequence.
    pub index: usize,
    pub pinned: bool,
    pub mass: f32,
    pub color: Color,
    pub size: f32,
    pub p: Vec2,
    pub v: Vec2,
    /// Rest position, restored on reset and used for rest lengths.
    pub p0: Vec2,
    pub v0: Vec2,
    /// Cleared and refilled on every derivative evaluation.
    pub f: Vec2,
    /// Springs attached to this particle.
    pub(crate) springs: Vec<SpringId>,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            index: 0,
            pinned: false,
            mass: DEFAULT_PARTICLE_MASS,
            color: Color::from_array(DEFAULT_PARTICLE_COLOR),
            size: DEFAULT_PARTICLE_SIZE,
            p: position,
            v: velocity,
            p0: position,
            v0: velocity,
            f: Vec2::ZERO,
            springs: Vec::new(),
        }
    }

    pub fn id(&self) -> ParticleId {
        ParticleId(self.index)
    }

    /// Restores the rest state and clears the force accumulator.
    pub fn reset(&mut self) {
        self.p = self.p0;
        self.v = self.v0;
        self.f = Vec2::ZERO;
    }

    pub fn clear_force(&mut self) {
        self.f = Vec2::ZERO;
    }

    pub fn add_force(&mut self, force: Vec2) {
        self.f += force;
    }

    /// Makes the current position and velocity the rest state.
    pub fn capture_rest_state(&mut self) {
        self.p0 = self.p;
        self.v0 = self.v;
    }

    pub fn distance(&self, point: Vec2) -> f32 {
        self.p.distance(point)
    }

    pub fn springs(&self) -> &[SpringId] {
        &self.springs
    }

    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.v.length_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_rest_state_and_clears_force() {
        let mut particle = Particle::new(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0));
        particle.p = Vec2::new(10.0, 10.0);
        particle.v = Vec2::ZERO;
        particle.add_force(Vec2::new(5.0, -5.0));

        particle.reset();

        assert_eq!(particle.p, Vec2::new(1.0, 2.0));
        assert_eq!(particle.v, Vec2::new(3.0, 4.0));
        assert_eq!(particle.f, Vec2::ZERO);
    }

    #[test]
    fn distance_is_euclidean() {
        let particle = Particle::new(Vec2::new(3.0, 0.0), Vec2::ZERO);
        assert!((particle.distance(Vec2::new(0.0, 4.0)) - 5.0).abs() < 1e-6);
    }
}
