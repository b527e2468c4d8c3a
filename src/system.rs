//! The particle system: owns the spring network, the integrators and every
//! working buffer, and runs the per-step pipeline.

pub mod network;
pub mod presets;

use std::{fmt, time::Duration};

use glam::Vec2;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::{
    collision::walls::{post_step_fix, Walls},
    config::{
        check_non_negative, check_positive, check_unit_interval, SimulationParams,
        PINNED_PARTICLE_COLOR,
    },
    core::{
        particle::Particle,
        spring::Spring,
        types::{Color, ParticleId, ParticleView, SpringId, SpringSegment, Viewport},
    },
    dynamics::{
        forces::ExternalForces,
        function::{phase_space_dim, read_phase_space, write_phase_space},
        implicit::BackwardEuler,
        integrator::{Integrator, IntegratorScratch},
        solver::ConjugateGradient,
    },
    error::{SimulationError, SimulationResult},
    utils::{
        allocator::Arena,
        logging::{warn_if_non_finite, ScopedTimer},
        math::resize_zeroed,
        profiling::StepProfile,
    },
};

pub use network::{Proximity, SpringNetwork};
pub use presets::Preset;

/// Whether steps go through an explicit [`Integrator`] or the backward Euler
/// solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegrationMode {
    #[default]
    Explicit,
    Implicit,
}

/// Numeric parameters addressable by [`ParticleSystem::set_scaled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Gravity,
    SpringStiffness,
    SpringDamping,
    ViscousDamping,
    Restitution,
    StepSize,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Parameter::Gravity,
        Parameter::SpringStiffness,
        Parameter::SpringDamping,
        Parameter::ViscousDamping,
        Parameter::Restitution,
        Parameter::StepSize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Gravity => "gravity",
            Parameter::SpringStiffness => "spring_stiffness",
            Parameter::SpringDamping => "spring_damping",
            Parameter::ViscousDamping => "viscous_damping",
            Parameter::Restitution => "restitution",
            Parameter::StepSize => "step_size",
        }
    }
}

/// Snapshot of the system state for status displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub mode: IntegrationMode,
    pub integrator: String,
    pub time: f32,
    pub particle_count: usize,
    pub spring_count: usize,
    pub compute_ms: f32,
    pub params: SimulationParams,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        writeln!(f, "particles = {}", self.particle_count)?;
        writeln!(f, "springs = {}", self.spring_count)?;
        writeln!(f, "time = {:.3}", self.time)?;
        writeln!(f, "compute time = {:.3} ms", self.compute_ms)?;
        writeln!(f, "integrator = {}", self.integrator)?;
        writeln!(f, "h = {} with {} substeps", p.step_size, p.substeps)?;
        writeln!(f, "spring stiffness = {}", p.spring_stiffness)?;
        writeln!(f, "spring damping = {}", p.spring_damping)?;
        writeln!(f, "viscous damping = {}", p.viscous_damping)?;
        writeln!(f, "restitution = {}", p.restitution)?;
        write!(
            f,
            "gravity = {} ({})",
            p.gravity,
            if p.use_gravity { "on" } else { "off" }
        )
    }
}

/// Mass-spring particle system.
///
/// Every step refreshes spring coefficients from the parameters, integrates
/// with the active scheme, then pushes particles back inside the viewport.
/// All working memory is owned here and only resized when the particle count
/// changes.
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    network: SpringNetwork,
    params: SimulationParams,
    integrator: Integrator,
    mode: IntegrationMode,
    scratch: IntegratorScratch,
    implicit: BackwardEuler,
    phase: Vec<f32>,
    phase_out: Vec<f32>,
    time: f32,
    profile: StepProfile,
}

impl ParticleSystem {
    pub fn new(params: SimulationParams) -> SimulationResult<Self> {
        params.validate()?;
        let mut system = Self {
            params,
            ..Self::default()
        };
        system.implicit.solver =
            ConjugateGradient::new(params.solver_iterations, params.solver_tolerance);
        Ok(system)
    }

    // ---- stepping -------------------------------------------------------

    /// Advances the simulation by `dt`.
    pub fn advance_time(&mut self, dt: f32) {
        let mut compute_time = Duration::ZERO;
        let mut profile = StepProfile {
            implicit: self.mode == IntegrationMode::Implicit,
            ..StepProfile::default()
        };
        {
            let _timer = ScopedTimer::recording("advance_time", &mut compute_time);
            self.network
                .refresh_springs(self.params.spring_stiffness, self.params.spring_damping);
            self.network.external = ExternalForces::from_params(&self.params);

            if !self.network.particles.is_empty() {
                match self.mode {
                    IntegrationMode::Explicit => self.explicit_step(dt),
                    IntegrationMode::Implicit => {
                        let stats = self.implicit.step(
                            &mut self.network.particles,
                            &self.network.springs,
                            &self.network.external,
                            dt,
                        );
                        profile.solver_iterations = stats.iterations;
                        profile.solver_residual = stats.residual;
                        profile.solver_converged = stats.converged;
                    }
                }
                let walls = Walls::new(self.params.viewport, self.params.restitution);
                profile.wall_contacts = post_step_fix(&mut self.network.particles, &walls);
                warn_if_non_finite(
                    self.network.particles.iter().map(|p| (p.index, p.p, p.v)),
                    self.time,
                );
            }
            self.time += dt;
        }

        profile.compute_time = compute_time;
        profile.particle_count = self.network.particles.len();
        profile.spring_count = self.network.springs.len();
        self.profile = profile;
        trace!(
            "advanced {dt} to t={:.4} with {}",
            self.time,
            self.integrator_name()
        );
    }

    fn explicit_step(&mut self, dt: f32) {
        let dim = phase_space_dim(self.network.particles.len());
        if resize_zeroed(&mut self.phase, dim) | resize_zeroed(&mut self.phase_out, dim) {
            debug!("resizing phase space buffers to {dim}");
        }
        read_phase_space(&self.network.particles, &mut self.phase);
        self.integrator.step(
            &self.phase,
            self.time,
            dt,
            &mut self.phase_out,
            &mut self.network,
            &mut self.scratch,
        );
        write_phase_space(&self.phase_out, &mut self.network.particles);
    }

    /// Advances one frame: `step_size` split into `substeps` equal steps.
    pub fn step_frame(&mut self) {
        let h = self.params.substep_size();
        for _ in 0..self.params.substeps.max(1) {
            self.advance_time(h);
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn last_profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Logs the profile of the last step at debug level.
    pub fn report(&self) {
        self.profile.report();
    }

    /// Times the explicit stage buffers have been resized.
    pub fn explicit_reallocations(&self) -> usize {
        self.scratch.reallocations()
    }

    /// Times the implicit matrices and vectors have been resized.
    pub fn implicit_reallocations(&self) -> usize {
        self.implicit.workspace().reallocations()
    }

    // ---- integrator selection -------------------------------------------

    pub fn integrator(&self) -> Integrator {
        self.integrator
    }

    /// Selects an explicit scheme and switches to explicit mode.
    pub fn set_integrator(&mut self, integrator: Integrator) {
        self.integrator = integrator;
        self.mode = IntegrationMode::Explicit;
        info!("integrator set to {integrator}");
    }

    pub fn mode(&self) -> IntegrationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: IntegrationMode) {
        if self.mode != mode {
            info!("integration mode set to {mode:?}");
        }
        self.mode = mode;
    }

    pub fn set_implicit(&mut self, implicit: bool) {
        self.set_mode(if implicit {
            IntegrationMode::Implicit
        } else {
            IntegrationMode::Explicit
        });
    }

    /// Display name of whatever scheme the next step will use.
    pub fn integrator_name(&self) -> &'static str {
        match self.mode {
            IntegrationMode::Explicit => self.integrator.name(),
            IntegrationMode::Implicit => "Backward Euler",
        }
    }

    // ---- topology -------------------------------------------------------

    pub fn create_particle(&mut self, position: Vec2, velocity: Vec2) -> ParticleId {
        let id = self.network.add_particle(Particle::new(position, velocity));
        debug!("particle {id} created at {position}");
        id
    }

    pub fn create_spring(&mut self, a: ParticleId, b: ParticleId) -> SimulationResult<SpringId> {
        let handle = self.network.add_spring(a, b)?;
        if let Some(spring) = self.network.springs.get_mut(handle) {
            spring.k = self.params.spring_stiffness;
            spring.c = self.params.spring_damping;
        }
        Ok(handle)
    }

    /// Removes a spring joining `a` and `b` in either order.
    pub fn remove_spring(&mut self, a: ParticleId, b: ParticleId) -> bool {
        self.network.remove_spring(a, b)
    }

    /// Removes a particle with its springs. Later particles shift down one
    /// index, so previously held ids past `id` are invalidated.
    pub fn remove_particle(&mut self, id: ParticleId) -> SimulationResult<Particle> {
        self.network.remove_particle(id)
    }

    /// Restores every particle's rest state and rewinds the clock.
    pub fn reset_particles(&mut self) {
        for particle in self.network.particles.iter_mut() {
            particle.reset();
        }
        self.time = 0.0;
        debug!("reset {} particles", self.network.particles.len());
    }

    pub fn clear_particles(&mut self) {
        self.network.clear();
        self.time = 0.0;
        debug!("cleared all particles");
    }

    /// Appends a preset topology to the current contents.
    pub fn create_system(&mut self, preset: Preset) -> SimulationResult<()> {
        preset.build(&mut self.network)?;
        self.network
            .refresh_springs(self.params.spring_stiffness, self.params.spring_damping);
        info!(
            "created {preset}: {} particles, {} springs",
            self.network.particles.len(),
            self.network.springs.len()
        );
        Ok(())
    }

    pub fn create_system_by_id(&mut self, id: u8) -> SimulationResult<()> {
        self.create_system(Preset::from_id(id)?)
    }

    // ---- particle edits -------------------------------------------------

    pub fn zero_velocities(&mut self) {
        for particle in self.network.particles.iter_mut() {
            particle.v = Vec2::ZERO;
        }
    }

    pub fn set_pinned(&mut self, id: ParticleId, pinned: bool) -> SimulationResult<()> {
        let particle = self.network.particle_mut(id)?;
        particle.pinned = pinned;
        if pinned {
            particle.v = Vec2::ZERO;
        }
        Ok(())
    }

    /// Flips the pinned flag and returns the new value.
    pub fn toggle_pinned(&mut self, id: ParticleId) -> SimulationResult<bool> {
        let pinned = !self.network.particle(id)?.pinned;
        self.set_pinned(id, pinned)?;
        Ok(pinned)
    }

    pub fn set_position(&mut self, id: ParticleId, position: Vec2) -> SimulationResult<()> {
        self.network.particle_mut(id)?.p = position;
        Ok(())
    }

    pub fn set_velocity(&mut self, id: ParticleId, velocity: Vec2) -> SimulationResult<()> {
        self.network.particle_mut(id)?.v = velocity;
        Ok(())
    }

    pub fn set_mass(&mut self, id: ParticleId, mass: f32) -> SimulationResult<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimulationError::InvalidMass(mass));
        }
        self.network.particle_mut(id)?.mass = mass;
        Ok(())
    }

    pub fn recompute_rest_lengths(&mut self, id: ParticleId) -> SimulationResult<()> {
        self.network.recompute_rest_lengths(id)
    }

    /// Makes the particle's current state its rest state and recomputes the
    /// rest lengths of its springs.
    pub fn set_rest_state(&mut self, id: ParticleId) -> SimulationResult<()> {
        self.network.particle_mut(id)?.capture_rest_state();
        self.network.recompute_rest_lengths(id)
    }

    // ---- queries --------------------------------------------------------

    pub fn particles(&self) -> &[Particle] {
        self.network.particles()
    }

    pub fn particle(&self, id: ParticleId) -> Option<&Particle> {
        self.network.particle(id).ok()
    }

    pub fn springs(&self) -> &Arena<Spring> {
        self.network.springs()
    }

    pub fn spring(&self, id: SpringId) -> Option<&Spring> {
        self.network.springs.get(id)
    }

    pub fn particle_count(&self) -> usize {
        self.network.particles.len()
    }

    pub fn spring_count(&self) -> usize {
        self.network.springs.len()
    }

    /// Drawing data for every particle, in index order.
    pub fn particle_views(&self) -> impl Iterator<Item = ParticleView> + '_ {
        self.network.particles.iter().map(|particle| ParticleView {
            id: particle.id(),
            position: particle.p,
            pinned: particle.pinned,
            color: if particle.pinned {
                Color::from_array(PINNED_PARTICLE_COLOR)
            } else {
                particle.color
            },
            size: particle.size,
        })
    }

    pub fn spring_segments(&self) -> impl Iterator<Item = SpringSegment> + '_ {
        self.network.springs.iter().map(|(id, spring)| {
            let (a, b) = spring.endpoints(&self.network.particles);
            SpringSegment {
                id,
                start: a.p,
                end: b.p,
            }
        })
    }

    pub fn nearest_particle(&self, point: Vec2) -> Option<Proximity> {
        self.network.nearest(point, 1).into_iter().next()
    }

    /// The two particles closest to `point`, closest first.
    pub fn nearest_two(&self, point: Vec2) -> (Option<Proximity>, Option<Proximity>) {
        let mut found = self.network.nearest(point, 2).into_iter();
        (found.next(), found.next())
    }

    /// Kinetic plus spring energy, plus gravitational energy when gravity is on.
    pub fn total_energy(&self) -> f32 {
        let gravity = if self.params.use_gravity {
            // +y points down the screen
            self.network
                .particles
                .iter()
                .map(|p| -p.mass * self.params.gravity * p.p.y)
                .sum()
        } else {
            0.0
        };
        self.network.kinetic_energy() + self.network.spring_energy() + gravity
    }

    pub fn describe(&self) -> SystemStatus {
        SystemStatus {
            mode: self.mode,
            integrator: self.integrator_name().to_string(),
            time: self.time,
            particle_count: self.particle_count(),
            spring_count: self.spring_count(),
            compute_ms: self.profile.compute_ms(),
            params: self.params,
        }
    }

    // ---- parameters -----------------------------------------------------

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Replaces every parameter at once after validating the new set.
    pub fn set_params(&mut self, params: SimulationParams) -> SimulationResult<()> {
        params.validate()?;
        self.params = params;
        self.implicit.solver =
            ConjugateGradient::new(params.solver_iterations, params.solver_tolerance);
        Ok(())
    }

    pub fn gravity(&self) -> f32 {
        self.params.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) -> SimulationResult<()> {
        check_non_negative("gravity", gravity)?;
        self.params.gravity = gravity;
        Ok(())
    }

    pub fn use_gravity(&self) -> bool {
        self.params.use_gravity
    }

    pub fn set_use_gravity(&mut self, enabled: bool) {
        self.params.use_gravity = enabled;
    }

    pub fn spring_stiffness(&self) -> f32 {
        self.params.spring_stiffness
    }

    pub fn set_spring_stiffness(&mut self, stiffness: f32) -> SimulationResult<()> {
        check_non_negative("spring_stiffness", stiffness)?;
        self.params.spring_stiffness = stiffness;
        Ok(())
    }

    pub fn spring_damping(&self) -> f32 {
        self.params.spring_damping
    }

    pub fn set_spring_damping(&mut self, damping: f32) -> SimulationResult<()> {
        check_non_negative("spring_damping", damping)?;
        self.params.spring_damping = damping;
        Ok(())
    }

    pub fn viscous_damping(&self) -> f32 {
        self.params.viscous_damping
    }

    pub fn set_viscous_damping(&mut self, damping: f32) -> SimulationResult<()> {
        check_non_negative("viscous_damping", damping)?;
        self.params.viscous_damping = damping;
        Ok(())
    }

    pub fn restitution(&self) -> f32 {
        self.params.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) -> SimulationResult<()> {
        check_unit_interval("restitution", restitution)?;
        self.params.restitution = restitution;
        Ok(())
    }

    pub fn step_size(&self) -> f32 {
        self.params.step_size
    }

    pub fn set_step_size(&mut self, step_size: f32) -> SimulationResult<()> {
        check_positive("step_size", step_size)?;
        self.params.step_size = step_size;
        Ok(())
    }

    pub fn substeps(&self) -> u32 {
        self.params.substeps
    }

    /// Values below one are raised to one.
    pub fn set_substeps(&mut self, substeps: u32) {
        self.params.substeps = substeps.max(1);
    }

    pub fn solver(&self) -> ConjugateGradient {
        self.implicit.solver
    }

    pub fn set_solver(&mut self, iterations: u32, tolerance: f32) -> SimulationResult<()> {
        check_positive("solver_tolerance", tolerance)?;
        self.params.solver_iterations = iterations;
        self.params.solver_tolerance = tolerance;
        self.implicit.solver = ConjugateGradient::new(iterations, tolerance);
        Ok(())
    }

    pub fn viewport(&self) -> Viewport {
        self.params.viewport
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) -> SimulationResult<()> {
        check_positive("viewport.width", width)?;
        check_positive("viewport.height", height)?;
        self.params.viewport = Viewport::new(width, height);
        Ok(())
    }

    pub fn get(&self, parameter: Parameter) -> f32 {
        match parameter {
            Parameter::Gravity => self.gravity(),
            Parameter::SpringStiffness => self.spring_stiffness(),
            Parameter::SpringDamping => self.spring_damping(),
            Parameter::ViscousDamping => self.viscous_damping(),
            Parameter::Restitution => self.restitution(),
            Parameter::StepSize => self.step_size(),
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: f32) -> SimulationResult<()> {
        match parameter {
            Parameter::Gravity => self.set_gravity(value),
            Parameter::SpringStiffness => self.set_spring_stiffness(value),
            Parameter::SpringDamping => self.set_spring_damping(value),
            Parameter::ViscousDamping => self.set_viscous_damping(value),
            Parameter::Restitution => self.set_restitution(value),
            Parameter::StepSize => self.set_step_size(value),
        }
    }

    /// Multiplies a parameter by `factor` and returns the new value.
    pub fn set_scaled(&mut self, parameter: Parameter, factor: f32) -> SimulationResult<f32> {
        let value = self.get(parameter) * factor;
        self.set(parameter, value)?;
        debug!("{} scaled to {value}", parameter.name());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> ParticleSystem {
        let params = SimulationParams::default()
            .with_gravity(9.8, false)
            .with_viewport(10_000.0, 10_000.0);
        ParticleSystem::new(params).expect("valid params")
    }

    #[test]
    fn rejects_invalid_params() {
        let params = SimulationParams::default().with_restitution(1.5);
        assert!(matches!(
            ParticleSystem::new(params),
            Err(SimulationError::InvalidParameter {
                name: "restitution",
                ..
            })
        ));
    }

    #[test]
    fn failed_setter_leaves_value_unchanged() {
        let mut system = quiet();
        assert!(system.set_spring_stiffness(-1.0).is_err());
        assert!(system.set_step_size(f32::NAN).is_err());
        assert_eq!(system.spring_stiffness(), 100.0);
        assert_eq!(system.step_size(), 0.05);
    }

    #[test]
    fn scaling_nudges_a_parameter() {
        let mut system = quiet();
        let value = system
            .set_scaled(Parameter::SpringStiffness, 1.01)
            .expect("stays valid");
        assert!((value - 101.0).abs() < 1e-3);
        assert!(system.set_scaled(Parameter::Restitution, 2.0).is_ok());
        system.set_restitution(0.8).expect("in range");
        assert!(system.set_scaled(Parameter::Restitution, 2.0).is_err());
        assert_eq!(system.restitution(), 0.8);
    }

    #[test]
    fn substeps_never_drop_below_one() {
        let mut system = quiet();
        system.set_substeps(0);
        assert_eq!(system.substeps(), 1);
    }

    #[test]
    fn new_springs_take_current_coefficients() {
        let mut system = quiet();
        system.set_spring_stiffness(42.0).expect("valid");
        let a = system.create_particle(Vec2::ZERO, Vec2::ZERO);
        let b = system.create_particle(Vec2::new(3.0, 4.0), Vec2::ZERO);
        let id = system.create_spring(a, b).expect("valid");
        let spring = system.spring(id).expect("spring exists");
        assert_eq!(spring.k, 42.0);
        assert!((spring.l0 - 5.0).abs() < 1e-6);
    }

    #[test]
    fn mode_switch_changes_reported_name() {
        let mut system = quiet();
        system.set_integrator(Integrator::Rk4);
        assert_eq!(system.integrator_name(), "RK4");
        system.set_implicit(true);
        assert_eq!(system.integrator_name(), "Backward Euler");
        assert_eq!(system.describe().mode, IntegrationMode::Implicit);
        system.set_integrator(Integrator::Midpoint);
        assert_eq!(system.mode(), IntegrationMode::Explicit);
    }

    #[test]
    fn empty_system_still_advances_the_clock() {
        let mut system = quiet();
        system.advance_time(0.25);
        assert_eq!(system.time(), 0.25);
        assert_eq!(system.last_profile().particle_count, 0);
    }

    #[test]
    fn pinned_views_use_the_pinned_colour() {
        let mut system = quiet();
        let id = system.create_particle(Vec2::ONE, Vec2::ZERO);
        system.toggle_pinned(id).expect("particle exists");
        let view = system.particle_views().next().expect("one particle");
        assert!(view.pinned);
        assert_eq!(view.color, Color::from_array(PINNED_PARTICLE_COLOR));
    }
}
