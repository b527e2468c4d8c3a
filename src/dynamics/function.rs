//! Phase-space layout and the derivative-evaluation contract shared by all
//! explicit integrators.
//!
//! A phase-space vector stores four values per particle, in particle-index
//! order: `[p.x, p.y, v.x, v.y]`. Integrators, the wall correction and the
//! pinned-particle handling all address slots through this layout.

use crate::core::particle::Particle;

/// Values stored per particle in a phase-space vector.
pub const PHASE_STRIDE: usize = 4;

/// Dimension of the phase space of `particle_count` particles.
pub fn phase_space_dim(particle_count: usize) -> usize {
    particle_count * PHASE_STRIDE
}

/// Maps a phase-space state to its time derivative.
///
/// Evaluation is not pure: implementors load `state` into their particles and
/// refill every force accumulator as a side effect. Callers that need the
/// particles to hold a particular state afterwards must write it back
/// themselves.
pub trait DerivativeFunction {
    fn derivs(&mut self, t: f32, state: &[f32], dpdt: &mut [f32]);
}

impl<F> DerivativeFunction for F
where
    F: FnMut(f32, &[f32], &mut [f32]),
{
    fn derivs(&mut self, t: f32, state: &[f32], dpdt: &mut [f32]) {
        self(t, state, dpdt)
    }
}

/// Packs positions and velocities into `state`.
pub fn read_phase_space(particles: &[Particle], state: &mut [f32]) {
    debug_assert_eq!(state.len(), phase_space_dim(particles.len()));
    for (particle, slot) in particles.iter().zip(state.chunks_exact_mut(PHASE_STRIDE)) {
        slot[0] = particle.p.x;
        slot[1] = particle.p.y;
        slot[2] = particle.v.x;
        slot[3] = particle.v.y;
    }
}

/// Unpacks `state` into the particles, leaving pinned particles untouched.
pub fn write_phase_space(state: &[f32], particles: &mut [Particle]) {
    debug_assert_eq!(state.len(), phase_space_dim(particles.len()));
    for (particle, slot) in particles.iter_mut().zip(state.chunks_exact(PHASE_STRIDE)) {
        if particle.pinned {
            continue;
        }
        particle.p.x = slot[0];
        particle.p.y = slot[1];
        particle.v.x = slot[2];
        particle.v.y = slot[3];
    }
}

/// Fills `dpdt` from the particles' current velocities and accumulated forces.
pub fn write_derivative(particles: &[Particle], dpdt: &mut [f32]) {
    for (particle, slot) in particles.iter().zip(dpdt.chunks_exact_mut(PHASE_STRIDE)) {
        slot[0] = particle.v.x;
        slot[1] = particle.v.y;
        if particle.pinned {
            slot[2] = 0.0;
            slot[3] = 0.0;
        } else {
            let acceleration = particle.f / particle.mass;
            slot[2] = acceleration.x;
            slot[3] = acceleration.y;
        }
    }
}
