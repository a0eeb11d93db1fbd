pub mod errors;
pub mod quantum;

pub use errors::{ErrorCategory, RadialError, RadialResult};
pub use quantum::{j2_from_kappa, kappa_from_jl, l2_from_kappa, l_from_kappa};
