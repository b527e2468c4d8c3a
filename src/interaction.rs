//! Headless editing commands: grabbing, pinning, and adding or removing
//! particles and springs near a point.
//!
//! An [`EditSession`] keeps the state a pointer-driven editor needs between
//! calls (the grabbed particle, a pending particle creation, whether topology
//! edits are still allowed) and turns points into [`ParticleSystem`]
//! commands. It owns no input handling of its own.

use glam::Vec2;
use log::debug;

use crate::{
    config::{DEFAULT_GRAB_THRESHOLD, DEFAULT_MAX_SPRING_DISTANCE, LENGTH_EPSILON},
    core::{
        particle::Particle,
        types::{ParticleId, SpringId},
    },
    error::SimulationResult,
    system::ParticleSystem,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Grab {
    id: ParticleId,
    was_pinned: bool,
}

/// Result of a secondary press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EditAction {
    PinToggled { id: ParticleId, pinned: bool },
    SpringRemoved(ParticleId, ParticleId),
    SpringCreated(SpringId),
    /// A particle will be created where the press is released.
    CreationStarted,
    None,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    /// Maximum distance at which a point selects a particle or a spring line.
    pub grab_threshold: f32,
    /// New particles are only tied to neighbours closer than this.
    pub max_spring_distance: f32,
    grabbed: Option<Grab>,
    creating: bool,
    can_edit: bool,
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self {
            grab_threshold: DEFAULT_GRAB_THRESHOLD,
            max_spring_distance: DEFAULT_MAX_SPRING_DISTANCE,
            grabbed: None,
            creating: false,
            can_edit: true,
        }
    }

    /// Topology edits and rest-state drags are allowed until the simulation
    /// is stepped; a reset while paused allows them again.
    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    pub fn set_can_edit(&mut self, can_edit: bool) {
        self.can_edit = can_edit;
    }

    pub fn grabbed(&self) -> Option<ParticleId> {
        self.grabbed.map(|grab| grab.id)
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    /// Forgets every held particle and pending creation, e.g. after the system
    /// was cleared.
    pub fn cancel(&mut self) {
        self.grabbed = None;
        self.creating = false;
    }

    fn selectable(&self, system: &ParticleSystem, point: Vec2) -> Option<ParticleId> {
        system
            .nearest_particle(point)
            .filter(|hit| hit.distance < self.grab_threshold)
            .map(|hit| hit.id)
    }

    /// Grabs the particle under `point`. It stays pinned until released.
    pub fn grab(&mut self, system: &mut ParticleSystem, point: Vec2) -> Option<ParticleId> {
        if self.creating || self.grabbed.is_some() {
            return None;
        }
        let id = self.selectable(system, point)?;
        let was_pinned = system.particle(id)?.pinned;
        system.set_pinned(id, true).ok()?;
        system.set_position(id, point).ok()?;
        self.grabbed = Some(Grab { id, was_pinned });
        debug!("grabbed particle {id}");
        Some(id)
    }

    /// Moves the grabbed particle to `point` with zero velocity. While editing
    /// is allowed the new position also becomes its rest state.
    pub fn drag(&mut self, system: &mut ParticleSystem, point: Vec2) -> SimulationResult<bool> {
        let Some(grab) = self.grabbed else {
            return Ok(false);
        };
        system.set_position(grab.id, point)?;
        system.set_velocity(grab.id, Vec2::ZERO)?;
        if self.can_edit {
            system.set_rest_state(grab.id)?;
        }
        Ok(true)
    }

    /// Lets go of the grabbed particle, restoring its pinned flag.
    pub fn release(&mut self, system: &mut ParticleSystem) -> SimulationResult<Option<ParticleId>> {
        let Some(grab) = self.grabbed.take() else {
            return Ok(None);
        };
        system.set_pinned(grab.id, grab.was_pinned)?;
        Ok(Some(grab.id))
    }

    /// The two nearest particles, when `point` lies within the grab threshold
    /// of the line through them.
    pub fn pair_near_line(
        &self,
        system: &ParticleSystem,
        point: Vec2,
    ) -> Option<(ParticleId, ParticleId)> {
        let (Some(first), Some(second)) = system.nearest_two(point) else {
            return None;
        };
        let a = system.particle(first.id)?.p;
        let b = system.particle(second.id)?.p;
        let axis = a - b;
        let length = axis.length();
        if length < LENGTH_EPSILON {
            return None;
        }
        let distance = axis.perp_dot(a - point).abs() / length;
        (distance < self.grab_threshold).then_some((first.id, second.id))
    }

    /// Secondary press: toggles the pin of the particle under `point`,
    /// otherwise toggles the spring between the two nearest particles when
    /// `point` is on their line, otherwise starts creating a particle.
    /// Removing a spring is always allowed; creating one needs editing.
    pub fn press(&mut self, system: &mut ParticleSystem, point: Vec2) -> SimulationResult<EditAction> {
        if self.grabbed.is_some() {
            return Ok(EditAction::None);
        }
        if let Some(id) = self.selectable(system, point) {
            let pinned = system.toggle_pinned(id)?;
            return Ok(EditAction::PinToggled { id, pinned });
        }
        if let Some((a, b)) = self.pair_near_line(system, point) {
            if system.remove_spring(a, b) {
                return Ok(EditAction::SpringRemoved(a, b));
            }
            if self.can_edit {
                return Ok(EditAction::SpringCreated(system.create_spring(a, b)?));
            }
            return Ok(EditAction::None);
        }
        if self.can_edit {
            self.creating = true;
            return Ok(EditAction::CreationStarted);
        }
        Ok(EditAction::None)
    }

    /// Secondary release: finishes a pending creation by adding a particle at
    /// `point`, tied to each of the two nearest particles within
    /// `max_spring_distance`.
    pub fn release_press(
        &mut self,
        system: &mut ParticleSystem,
        point: Vec2,
    ) -> SimulationResult<Option<ParticleId>> {
        if !std::mem::take(&mut self.creating) || !self.can_edit {
            return Ok(None);
        }
        let (first, second) = system.nearest_two(point);
        let id = system.create_particle(point, Vec2::ZERO);
        for neighbour in [first, second].into_iter().flatten() {
            if neighbour.distance < self.max_spring_distance {
                system.create_spring(id, neighbour.id)?;
            }
        }
        Ok(Some(id))
    }

    /// Deletes the particle under `point`.
    pub fn delete_near(
        &mut self,
        system: &mut ParticleSystem,
        point: Vec2,
    ) -> SimulationResult<Option<Particle>> {
        let Some(id) = self.selectable(system, point) else {
            return Ok(None);
        };
        let removed = system.remove_particle(id)?;
        // keep the grab pointing at the same particle after renumbering
        self.grabbed = match self.grabbed {
            Some(grab) if grab.id == id => None,
            Some(grab) if grab.id > id => Some(Grab {
                id: ParticleId(grab.id.index() - 1),
                ..grab
            }),
            other => other,
        };
        Ok(Some(removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationParams;

    fn system_with_pair() -> ParticleSystem {
        let mut system = ParticleSystem::new(SimulationParams::default()).expect("valid params");
        system.create_particle(Vec2::new(100.0, 100.0), Vec2::ZERO);
        system.create_particle(Vec2::new(200.0, 100.0), Vec2::ZERO);
        system
    }

    #[test]
    fn grab_pins_until_release() {
        let mut system = system_with_pair();
        let mut session = EditSession::new();

        let id = session
            .grab(&mut system, Vec2::new(103.0, 98.0))
            .expect("particle in reach");
        assert_eq!(id, ParticleId(0));
        assert!(system.particles()[0].pinned);
        assert_eq!(system.particles()[0].p, Vec2::new(103.0, 98.0));

        session.release(&mut system).expect("grab is valid");
        assert!(!system.particles()[0].pinned);
        assert_eq!(session.grabbed(), None);
    }

    #[test]
    fn drag_updates_rest_state_only_while_editing() {
        let mut system = system_with_pair();
        let mut session = EditSession::new();
        session.grab(&mut system, Vec2::new(100.0, 100.0));

        session.drag(&mut system, Vec2::new(110.0, 100.0)).expect("grabbed");
        assert_eq!(system.particles()[0].p0, Vec2::new(110.0, 100.0));

        session.set_can_edit(false);
        session.drag(&mut system, Vec2::new(120.0, 100.0)).expect("grabbed");
        assert_eq!(system.particles()[0].p, Vec2::new(120.0, 100.0));
        assert_eq!(system.particles()[0].p0, Vec2::new(110.0, 100.0));
    }

    #[test]
    fn press_on_line_toggles_the_spring() {
        let mut system = system_with_pair();
        let mut session = EditSession::new();
        let on_line = Vec2::new(150.0, 104.0);

        let created = session.press(&mut system, on_line).expect("valid ids");
        assert!(matches!(created, EditAction::SpringCreated(_)));
        assert_eq!(system.spring_count(), 1);

        let removed = session.press(&mut system, on_line).expect("valid ids");
        assert_eq!(removed, EditAction::SpringRemoved(ParticleId(0), ParticleId(1)));
        assert_eq!(system.spring_count(), 0);
    }

    #[test]
    fn locked_session_can_remove_but_not_create_springs() {
        let mut system = system_with_pair();
        system
            .create_spring(ParticleId(0), ParticleId(1))
            .expect("valid ids");
        let mut session = EditSession::new();
        session.set_can_edit(false);
        let on_line = Vec2::new(150.0, 100.0);

        assert!(matches!(
            session.press(&mut system, on_line),
            Ok(EditAction::SpringRemoved(..))
        ));
        assert_eq!(session.press(&mut system, on_line), Ok(EditAction::None));
        assert_eq!(system.spring_count(), 0);
    }

    #[test]
    fn press_on_particle_toggles_pin() {
        let mut system = system_with_pair();
        let mut session = EditSession::new();
        let action = session
            .press(&mut system, Vec2::new(199.0, 101.0))
            .expect("valid ids");
        assert_eq!(
            action,
            EditAction::PinToggled {
                id: ParticleId(1),
                pinned: true
            }
        );
    }

    #[test]
    fn created_particle_ties_to_close_neighbours_only() {
        let mut system = system_with_pair();
        let mut session = EditSession::new();
        let point = Vec2::new(100.0, 200.0);

        assert_eq!(
            session.press(&mut system, point),
            Ok(EditAction::CreationStarted)
        );
        let id = session
            .release_press(&mut system, point)
            .expect("valid ids")
            .expect("editing allowed");

        assert_eq!(id, ParticleId(2));
        // (100,100) is 100 away, (200,100) is about 141 away; both within 150
        assert_eq!(system.spring_count(), 2);
        assert!(!session.is_creating());
    }

    #[test]
    fn delete_keeps_grab_on_the_same_particle() {
        let mut system = system_with_pair();
        system.create_particle(Vec2::new(300.0, 100.0), Vec2::ZERO);
        let mut session = EditSession::new();
        session.grab(&mut system, Vec2::new(300.0, 100.0));

        let removed = session
            .delete_near(&mut system, Vec2::new(100.0, 100.0))
            .expect("valid ids");
        assert!(removed.is_some());
        assert_eq!(session.grabbed(), Some(ParticleId(1)));
        assert_eq!(system.particles()[1].p, Vec2::new(300.0, 100.0));
    }
}
