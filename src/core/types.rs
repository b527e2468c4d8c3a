use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use crate::utils::allocator::Handle as SpringId;

/// Position of a particle in its system's particle sequence.
///
/// The index doubles as the particle's phase-space slot, so it is only
/// meaningful until the next particle removal renumbers the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

impl ParticleId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<usize> for ParticleId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Rectangle `[0, width] × [0, height]` the particles bounce inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// Linear RGB colour in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const fn from_array(rgb: [f32; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

/// What a renderer needs to draw one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleView {
    pub id: ParticleId,
    pub position: Vec2,
    pub pinned: bool,
    pub color: Color,
    pub size: f32,
}

/// Current endpoint positions of one spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringSegment {
    pub id: SpringId,
    pub start: Vec2,
    pub end: Vec2,
}
