//! Radial-equation solver seam.
//!
//! The calculation context only needs an orbital filled in on the current
//! potential; how that happens is up to the implementation. `NumerovSolver`
//! is the reference one shipped with the crate.

pub mod numerov;

pub use numerov::NumerovSolver;

use super::orbital::Orbital;
use super::potential::Potential;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("energy search did not converge after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("energy bracket [{lower:.6e}, {upper:.6e}] collapsed without a matching node count")]
    EnergyBracket { lower: f64, upper: f64 },
    #[error("no bound state with n={n} and kappa={kappa}")]
    InvalidQuantumNumbers { n: i32, kappa: i32 },
    #[error("continuum energy must be positive, got {energy}")]
    NonPositiveContinuumEnergy { energy: f64 },
    #[error("continuum is classically forbidden at the grid edge (index {index})")]
    ForbiddenTail { index: usize },
    #[error("wavefunction lost finite values at grid index {index}")]
    NonFinite { index: usize },
}

/// Fills `orbital` (energy, `ilast`, wavefunction, `qr_norm`) for the
/// potential `U + Vc`, plus `Vtail` when `tail` is set.
///
/// Bound orbitals (`n > 0`) are eigen-solved with `orbital.energy` as an
/// optional starting guess; continua (`n <= 0`) are solved at the given
/// positive energy and must use the asymptotic pair layout beyond `ilast`.
pub trait RadialSolver {
    fn solve(
        &mut self,
        orbital: &mut Orbital,
        potential: &Potential,
        tail: bool,
        tolerance: f64,
    ) -> Result<(), SolverError>;
}
