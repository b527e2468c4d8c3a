//! Utility modules: handle arena, dense linear algebra, logging, profiling.

pub mod allocator;
pub mod logging;
pub mod math;
pub mod profiling;

pub use allocator::{Arena, Handle};
pub use math::DenseMatrix;
pub use profiling::StepProfile;
