//! Particle Springs – 2-D mass-spring simulation for Rust.
//!
//! A [`ParticleSystem`] owns point masses joined by damped springs and steps
//! them under gravity, viscous drag and wall collisions with a choice of
//! explicit integrators (forward Euler, midpoint, modified midpoint,
//! symplectic Euler, RK4) or a backward Euler solve filtered for pinned
//! particles. Rendering and input are left to the caller: the system exposes
//! drawing data through [`ParticleView`] and [`SpringSegment`], and
//! [`EditSession`] turns pointer positions into editing commands.

pub mod collision;
pub mod config;
pub mod core;
pub mod dynamics;
pub mod error;
pub mod interaction;
pub mod system;
pub mod utils;

pub use glam::Vec2;

pub use crate::config::SimulationParams;
pub use crate::core::{
    Color, Particle, ParticleId, ParticleView, Spring, SpringId, SpringSegment, Viewport,
};
pub use crate::dynamics::{ConjugateGradient, Integrator, SolveStats};
pub use crate::error::{SimulationError, SimulationResult};
pub use crate::interaction::{EditAction, EditSession};
pub use crate::system::{
    IntegrationMode, Parameter, ParticleSystem, Preset, Proximity, SystemStatus,
};
pub use crate::utils::StepProfile;

/// Run/pause driver that owns a [`ParticleSystem`] and an [`EditSession`].
///
/// Editing stays allowed until the simulation is run or stepped; resetting
/// while paused allows it again.
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    system: ParticleSystem,
    session: EditSession,
    running: bool,
}

impl Simulation {
    /// Creates a paused simulation with no particles.
    pub fn new(params: SimulationParams) -> SimulationResult<Self> {
        Ok(Self {
            system: ParticleSystem::new(params)?,
            session: EditSession::new(),
            running: false,
        })
    }

    /// Creates a paused simulation holding one preset.
    pub fn with_preset(params: SimulationParams, preset: Preset) -> SimulationResult<Self> {
        let mut simulation = Self::new(params)?;
        simulation.system.create_system(preset)?;
        Ok(simulation)
    }

    pub fn system(&self) -> &ParticleSystem {
        &self.system
    }

    pub fn system_mut(&mut self) -> &mut ParticleSystem {
        &mut self.system
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances one frame if running. Returns whether anything moved.
    pub fn frame(&mut self) -> bool {
        if self.running {
            self.system.step_frame();
        }
        self.running
    }

    /// Advances exactly one frame regardless of the run flag.
    pub fn single_step(&mut self) {
        self.system.step_frame();
        self.session.set_can_edit(false);
    }

    /// Flips between running and paused.
    pub fn toggle_run(&mut self) -> bool {
        self.running = !self.running;
        self.session.set_can_edit(false);
        self.running
    }

    /// Restores the rest state; editing is allowed again when paused.
    pub fn reset(&mut self) {
        self.system.reset_particles();
        if !self.running {
            self.session.set_can_edit(true);
        }
    }

    /// Removes every particle and forgets any grab in progress.
    pub fn clear(&mut self) {
        self.system.clear_particles();
        self.session.cancel();
    }

    /// Appends a preset to the current contents.
    pub fn create_system(&mut self, preset: Preset) -> SimulationResult<()> {
        self.system.create_system(preset)
    }

    pub fn grab(&mut self, point: Vec2) -> Option<ParticleId> {
        self.session.grab(&mut self.system, point)
    }

    pub fn drag(&mut self, point: Vec2) -> SimulationResult<bool> {
        self.session.drag(&mut self.system, point)
    }

    pub fn release(&mut self) -> SimulationResult<Option<ParticleId>> {
        self.session.release(&mut self.system)
    }

    pub fn press(&mut self, point: Vec2) -> SimulationResult<EditAction> {
        self.session.press(&mut self.system, point)
    }

    pub fn release_press(&mut self, point: Vec2) -> SimulationResult<Option<ParticleId>> {
        self.session.release_press(&mut self.system, point)
    }

    pub fn delete_near(&mut self, point: Vec2) -> SimulationResult<Option<Particle>> {
        self.session.delete_near(&mut self.system, point)
    }
}
