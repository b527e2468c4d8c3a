use std::time::Duration;

use log::debug;

/// Timing and solver data of the most recent `advance_time` call.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StepProfile {
    pub compute_time: Duration,
    pub particle_count: usize,
    pub spring_count: usize,
    pub implicit: bool,
    /// Conjugate gradient iterations; zero for explicit steps.
    pub solver_iterations: u32,
    pub solver_residual: f32,
    pub solver_converged: bool,
    /// Particles pushed back by a wall during the post-step correction.
    pub wall_contacts: usize,
}

impl StepProfile {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn compute_ms(&self) -> f32 {
        self.compute_time.as_secs_f32() * 1000.0
    }

    pub fn report(&self) {
        debug!(
            "step: {:.3} ms, {} particles, {} springs, {} wall contacts",
            self.compute_ms(),
            self.particle_count,
            self.spring_count,
            self.wall_contacts
        );
        if self.implicit {
            debug!(
                "  cg: {} iterations, residual {:.3e}, converged {}",
                self.solver_iterations, self.solver_residual, self.solver_converged
            );
        }
    }
}
