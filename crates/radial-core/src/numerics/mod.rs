pub mod grid;
pub mod newton_cotes;
pub mod special;
pub mod spline;

pub use grid::{GridError, RadialGrid};
pub use newton_cotes::{NewtonCotesError, newton_cotes_running, newton_cotes_total};
pub use spline::{SplineError, natural_spline};
