pub mod bessel;
pub mod wigner;

pub use bessel::{spherical_j, spherical_j_sequence};
pub use wigner::{triangle, wigner_3j, wigner_6j};
