//! Force evaluation, explicit integrators and the implicit solve.

pub mod forces;
pub mod function;
pub mod implicit;
pub mod integrator;
pub mod solver;

pub use forces::{accumulate_forces, ExternalForces, ForceGenerator, GravityForce, ViscousDrag};
pub use function::{phase_space_dim, DerivativeFunction, PHASE_STRIDE};
pub use implicit::{BackwardEuler, ImplicitWorkspace, PinnedFilter};
pub use integrator::{Integrator, IntegratorScratch};
pub use solver::{CgBuffers, ConjugateGradient, Filter, NoFilter, SolveStats};
