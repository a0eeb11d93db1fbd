pub mod angular;
pub mod cache;
pub mod calculation;
pub mod configuration;
pub mod integrals;
pub mod orbital;
pub mod oscillatory;
pub mod potential;
pub mod quadrature;
pub mod scf;
pub mod solver;
pub mod workspace;
pub mod yk;

pub use angular::{AngularCoefficients, RacahAlgebra};
pub use cache::{IntegralCaches, MultipoleKey, MultipoleKind, SlaterKey};
pub use calculation::Calculation;
pub use configuration::{
    AverageConfig, AverageShell, Configuration, ConfigurationAverager, ConfigurationGroups, Shell,
};
pub use orbital::{Orbital, OrbitalHandle, OrbitalRegistry, OrbitalTable, Wavefunction};
pub use potential::Potential;
pub use quadrature::IntegralKind;
pub use scf::{ScfOutcome, ScfStatus, orbital_change};
pub use solver::{NumerovSolver, RadialSolver, SolverError};
pub use workspace::Workspace;
