//! Radial-orbital engine for relativistic atomic structure: a logarithmic
//! radial grid, bound and continuum orbitals, oscillation-aware radial
//! quadrature, cached Slater/multipole integrals and an average-configuration
//! self-consistent field.

pub mod atom;
pub mod common;
pub mod domain;
pub mod numerics;

pub use atom::{
    AngularCoefficients, AverageConfig, Calculation, Configuration, ConfigurationAverager,
    ConfigurationGroups, IntegralKind, NumerovSolver, Orbital, OrbitalHandle, RacahAlgebra,
    RadialSolver, ScfOutcome, ScfStatus, Shell,
};
pub use common::{CalculationOptions, load_calculation_options};
pub use domain::{ErrorCategory, RadialError, RadialResult};
