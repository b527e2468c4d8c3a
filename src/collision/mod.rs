//! Post-step collision correction against the viewport walls.

pub mod walls;

pub use walls::{post_step_fix, Wall, Walls};
