use glam::Vec2;
use log::debug;

use crate::{
    core::{
        particle::Particle,
        spring::Spring,
        types::{ParticleId, SpringId},
    },
    dynamics::{
        forces::{accumulate_forces, ExternalForces},
        function::{write_derivative, write_phase_space, DerivativeFunction},
    },
    error::{SimulationError, SimulationResult},
    utils::allocator::Arena,
};

/// A particle found by a proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proximity {
    pub id: ParticleId,
    pub distance: f32,
}

/// Particles, the springs between them and the external forces acting on
/// them. This is the derivative function the explicit integrators drive.
///
/// Particles live in a contiguous `Vec` whose positions are their indices;
/// springs live in an [`Arena`] and are addressed by generational handles.
#[derive(Debug, Clone, Default)]
pub struct SpringNetwork {
    pub(crate) particles: Vec<Particle>,
    pub(crate) springs: Arena<Spring>,
    pub(crate) external: ExternalForces,
}

impl SpringNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn springs(&self) -> &Arena<Spring> {
        &self.springs
    }

    pub fn particle(&self, id: ParticleId) -> SimulationResult<&Particle> {
        self.particles
            .get(id.index())
            .ok_or(SimulationError::UnknownParticle(id))
    }

    pub fn particle_mut(&mut self, id: ParticleId) -> SimulationResult<&mut Particle> {
        self.particles
            .get_mut(id.index())
            .ok_or(SimulationError::UnknownParticle(id))
    }

    pub fn add_particle(&mut self, mut particle: Particle) -> ParticleId {
        particle.index = self.particles.len();
        particle.springs.clear();
        let id = particle.id();
        self.particles.push(particle);
        id
    }

    /// Joins two distinct particles. The rest length comes from their rest
    /// positions. Parallel springs between the same pair are allowed.
    pub fn add_spring(&mut self, a: ParticleId, b: ParticleId) -> SimulationResult<SpringId> {
        self.particle(a)?;
        self.particle(b)?;
        if a == b {
            return Err(SimulationError::SelfSpring(a));
        }
        let spring = Spring::new(a, b, &self.particles);
        debug!("spring {a} - {b} added, l0 = {:.3}", spring.l0);
        let handle = self.springs.insert(spring);
        self.particles[a.index()].springs.push(handle);
        self.particles[b.index()].springs.push(handle);
        Ok(handle)
    }

    /// First spring joining `a` and `b`, in either order.
    pub fn find_spring(&self, a: ParticleId, b: ParticleId) -> Option<SpringId> {
        let particle = self.particles.get(a.index())?;
        particle
            .springs
            .iter()
            .copied()
            .find(|handle| self.springs.get(*handle).is_some_and(|s| s.connects(a, b)))
    }

    /// Removes one spring joining `a` and `b`. Returns false, changing
    /// nothing, when there is none.
    pub fn remove_spring(&mut self, a: ParticleId, b: ParticleId) -> bool {
        let Some(handle) = self.find_spring(a, b) else {
            return false;
        };
        self.detach_spring(handle);
        debug!("spring {a} - {b} removed");
        true
    }

    fn detach_spring(&mut self, handle: SpringId) -> Option<Spring> {
        let spring = self.springs.remove(handle)?;
        for end in [spring.a, spring.b] {
            if let Some(particle) = self.particles.get_mut(end.index()) {
                particle.springs.retain(|s| *s != handle);
            }
        }
        Some(spring)
    }

    /// Removes a particle and every spring touching it, then renumbers the
    /// remaining particles so indices stay contiguous.
    pub fn remove_particle(&mut self, id: ParticleId) -> SimulationResult<Particle> {
        let incident = self.particle(id)?.springs.clone();
        for handle in incident {
            self.detach_spring(handle);
        }

        let mut removed = self.particles.remove(id.index());
        for (index, particle) in self.particles.iter_mut().enumerate().skip(id.index()) {
            particle.index = index;
        }
        for spring in self.springs.values_mut() {
            if spring.a.index() > id.index() {
                spring.a = ParticleId(spring.a.index() - 1);
            }
            if spring.b.index() > id.index() {
                spring.b = ParticleId(spring.b.index() - 1);
            }
        }
        removed.springs.clear();
        debug!("particle {id} removed, {} remain", self.particles.len());
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.springs.clear();
    }

    /// Copies the global stiffness and damping into every spring.
    pub fn refresh_springs(&mut self, stiffness: f32, damping: f32) {
        for spring in self.springs.values_mut() {
            spring.k = stiffness;
            spring.c = damping;
        }
    }

    /// Recomputes the rest length of every spring attached to `id`.
    pub fn recompute_rest_lengths(&mut self, id: ParticleId) -> SimulationResult<()> {
        let incident = self.particle(id)?.springs.clone();
        for handle in incident {
            if let Some(spring) = self.springs.get_mut(handle) {
                spring.recompute_rest_length(&self.particles);
            }
        }
        Ok(())
    }

    /// Particles sorted by distance to `point`, closest first.
    pub fn nearest(&self, point: Vec2, count: usize) -> Vec<Proximity> {
        let mut found: Vec<Proximity> = self
            .particles
            .iter()
            .map(|particle| Proximity {
                id: particle.id(),
                distance: particle.distance(point),
            })
            .collect();
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        found.truncate(count);
        found
    }

    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    pub fn spring_energy(&self) -> f32 {
        self.springs
            .values()
            .map(|spring| spring.potential_energy(&self.particles))
            .sum()
    }
}

impl DerivativeFunction for SpringNetwork {
    fn derivs(&mut self, _t: f32, state: &[f32], dpdt: &mut [f32]) {
        write_phase_space(state, &mut self.particles);
        accumulate_forces(&mut self.particles, &self.springs, &self.external);
        write_derivative(&self.particles, dpdt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(count: usize) -> SpringNetwork {
        let mut network = SpringNetwork::new();
        for i in 0..count {
            network.add_particle(Particle::new(Vec2::new(i as f32 * 10.0, 0.0), Vec2::ZERO));
        }
        for i in 1..count {
            network
                .add_spring(ParticleId(i - 1), ParticleId(i))
                .expect("valid endpoints");
        }
        network
    }

    #[test]
    fn removing_a_particle_renumbers_and_retargets_springs() {
        let mut network = chain(4);
        network.remove_particle(ParticleId(1)).expect("particle exists");

        let indices: Vec<usize> = network.particles().iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(network.springs().len(), 1);
        let spring = network.springs().values().next().expect("one spring left");
        assert!(spring.connects(ParticleId(1), ParticleId(2)));
        assert!(network.particles()[0].springs().is_empty());
        assert_eq!(network.particles()[1].springs().len(), 1);
    }

    #[test]
    fn remove_spring_is_symmetric() {
        let mut network = chain(3);
        assert!(network.remove_spring(ParticleId(2), ParticleId(1)));
        assert!(!network.remove_spring(ParticleId(1), ParticleId(2)));
        assert!(!network.remove_spring(ParticleId(0), ParticleId(2)));
        assert_eq!(network.springs().len(), 1);
        assert!(network.particles()[2].springs().is_empty());
    }

    #[test]
    fn self_and_dangling_springs_are_rejected() {
        let mut network = chain(2);
        assert_eq!(
            network.add_spring(ParticleId(1), ParticleId(1)),
            Err(SimulationError::SelfSpring(ParticleId(1)))
        );
        assert_eq!(
            network.add_spring(ParticleId(0), ParticleId(9)),
            Err(SimulationError::UnknownParticle(ParticleId(9)))
        );
    }

    #[test]
    fn nearest_is_sorted_by_distance() {
        let network = chain(4);
        let found = network.nearest(Vec2::new(21.0, 0.0), 2);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, ParticleId(2));
        assert_eq!(found[1].id, ParticleId(3));
    }

    #[test]
    fn derivative_evaluation_loads_state_and_forces() {
        let mut network = chain(2);
        network.external = ExternalForces {
            gravity: None,
            drag: crate::dynamics::forces::ViscousDrag::new(0.0),
        };
        network.refresh_springs(10.0, 0.0);
        // second particle stretched by 2 along +x
        let state = [0.0, 0.0, 0.0, 0.0, 12.0, 0.0, 1.0, 0.0];
        let mut dpdt = [0.0; 8];

        network.derivs(0.0, &state, &mut dpdt);

        assert_eq!(network.particles()[1].p, Vec2::new(12.0, 0.0));
        assert!((dpdt[2] - 20.0).abs() < 1e-4);
        assert!((dpdt[6] + 20.0).abs() < 1e-4);
        assert_eq!(dpdt[4], 1.0);
    }
}
