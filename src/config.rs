//! Default constants and the tunable parameter block for a particle system.

use serde::{Deserialize, Serialize};

use crate::{
    core::types::Viewport,
    error::{SimulationError, SimulationResult},
};

/// Gravitational acceleration magnitude (pixels/s², pointing down the screen).
pub const DEFAULT_GRAVITY: f32 = 9.8;

/// Stiffness copied into every spring before each step.
pub const DEFAULT_SPRING_STIFFNESS: f32 = 100.0;

/// Damping along the spring axis copied into every spring before each step.
pub const DEFAULT_SPRING_DAMPING: f32 = 0.0;

/// Linear drag coefficient applied to every free particle.
pub const DEFAULT_VISCOUS_DAMPING: f32 = 0.0;

/// Fraction of normal velocity kept when bouncing off a wall.
pub const DEFAULT_RESTITUTION: f32 = 0.0;

/// Frame step size (in seconds).
pub const DEFAULT_STEP_SIZE: f32 = 0.05;

/// Number of equal substeps a frame is split into.
pub const DEFAULT_SUBSTEPS: u32 = 1;

/// Iteration cap of the conjugate gradient solve in implicit mode.
pub const DEFAULT_SOLVER_ITERATIONS: u32 = 100;

/// Relative residual at which the conjugate gradient solve stops early.
pub const DEFAULT_SOLVER_TOLERANCE: f32 = 1e-5;

/// Default viewport size in pixels.
pub const DEFAULT_VIEWPORT: [f32; 2] = [1280.0, 720.0];

/// Mass given to newly created particles.
pub const DEFAULT_PARTICLE_MASS: f32 = 1.0;

/// Draw size reported for particles.
pub const DEFAULT_PARTICLE_SIZE: f32 = 10.0;

/// Colour reported for free particles.
pub const DEFAULT_PARTICLE_COLOR: [f32; 3] = [0.0, 0.95, 0.0];

/// Colour reported for pinned particles.
pub const PINNED_PARTICLE_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

/// Pick radius for grabbing, pinning and deleting particles.
pub const DEFAULT_GRAB_THRESHOLD: f32 = 10.0;

/// Furthest neighbour a new particle is automatically connected to.
pub const DEFAULT_MAX_SPRING_DISTANCE: f32 = 150.0;

/// Lengths below this are treated as coincident endpoints.
pub const LENGTH_EPSILON: f32 = 1e-6;

/// Every tunable of the simulation in one serializable block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    pub gravity: f32,
    pub use_gravity: bool,
    pub spring_stiffness: f32,
    pub spring_damping: f32,
    pub viscous_damping: f32,
    /// Kept in `[0, 1]`.
    pub restitution: f32,
    pub step_size: f32,
    pub substeps: u32,
    pub solver_iterations: u32,
    pub solver_tolerance: f32,
    pub viewport: Viewport,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            use_gravity: true,
            spring_stiffness: DEFAULT_SPRING_STIFFNESS,
            spring_damping: DEFAULT_SPRING_DAMPING,
            viscous_damping: DEFAULT_VISCOUS_DAMPING,
            restitution: DEFAULT_RESTITUTION,
            step_size: DEFAULT_STEP_SIZE,
            substeps: DEFAULT_SUBSTEPS,
            solver_iterations: DEFAULT_SOLVER_ITERATIONS,
            solver_tolerance: DEFAULT_SOLVER_TOLERANCE,
            viewport: Viewport::new(DEFAULT_VIEWPORT[0], DEFAULT_VIEWPORT[1]),
        }
    }
}

impl SimulationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(mut self, gravity: f32, enabled: bool) -> Self {
        self.gravity = gravity;
        self.use_gravity = enabled;
        self
    }

    pub fn with_spring(mut self, stiffness: f32, damping: f32) -> Self {
        self.spring_stiffness = stiffness;
        self.spring_damping = damping;
        self
    }

    pub fn with_viscous_damping(mut self, viscous_damping: f32) -> Self {
        self.viscous_damping = viscous_damping;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Sets the frame step size and the number of substeps it is split into.
    pub fn with_step(mut self, step_size: f32, substeps: u32) -> Self {
        self.step_size = step_size;
        self.substeps = substeps.max(1);
        self
    }

    pub fn with_solver(mut self, iterations: u32, tolerance: f32) -> Self {
        self.solver_iterations = iterations;
        self.solver_tolerance = tolerance;
        self
    }

    pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Checks every field against its valid range.
    pub fn validate(&self) -> SimulationResult<()> {
        check_non_negative("gravity", self.gravity)?;
        check_non_negative("spring_stiffness", self.spring_stiffness)?;
        check_non_negative("spring_damping", self.spring_damping)?;
        check_non_negative("viscous_damping", self.viscous_damping)?;
        check_unit_interval("restitution", self.restitution)?;
        check_positive("step_size", self.step_size)?;
        check_positive("solver_tolerance", self.solver_tolerance)?;
        check_positive("viewport.width", self.viewport.width)?;
        check_positive("viewport.height", self.viewport.height)?;
        if self.substeps == 0 {
            return Err(SimulationError::InvalidParameter {
                name: "substeps",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Length of one substep.
    pub fn substep_size(&self) -> f32 {
        self.step_size / self.substeps.max(1) as f32
    }
}

pub(crate) fn check_non_negative(name: &'static str, value: f32) -> SimulationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { name, value })
    }
}

pub(crate) fn check_positive(name: &'static str, value: f32) -> SimulationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { name, value })
    }
}

pub(crate) fn check_unit_interval(name: &'static str, value: f32) -> SimulationResult<()> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter { name, value })
    }
}
