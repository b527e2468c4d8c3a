//! Error types for commands issued to a particle system.
//!
//! Stepping never fails; only commands given bad input return an error.

use thiserror::Error;

use crate::core::types::ParticleId;

/// Errors raised by particle system commands.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// A numeric parameter was non-finite or outside its valid range.
    #[error("invalid value {value} for parameter `{name}`")]
    InvalidParameter { name: &'static str, value: f32 },

    /// The particle handle does not refer to a live particle.
    #[error("no particle with index {}", .0.index())]
    UnknownParticle(ParticleId),

    /// A spring needs two distinct endpoints.
    #[error("cannot attach a spring from particle {} to itself", .0.index())]
    SelfSpring(ParticleId),

    /// Preset ids run from 1 to 3.
    #[error("unknown preset id {0}")]
    UnknownPreset(u8),

    /// Particle mass must be positive and finite.
    #[error("particle mass must be positive and finite, got {0}")]
    InvalidMass(f32),
}

/// Convenience alias for `Result<T, SimulationError>`.
pub type SimulationResult<T> = Result<T, SimulationError>;
