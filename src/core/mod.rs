//! Core data types: particles, springs and the identifiers tying them together.

pub mod particle;
pub mod spring;
pub mod types;

pub use particle::Particle;
pub use spring::Spring;
pub use types::{Color, ParticleId, ParticleView, SpringId, SpringSegment, Viewport};
