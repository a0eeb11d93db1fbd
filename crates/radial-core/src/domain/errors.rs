use crate::atom::solver::SolverError;
use crate::common::config::OptionsError;
use crate::numerics::{GridError, NewtonCotesError, SplineError};

pub type RadialResult<T> = Result<T, RadialError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    InputValidation,
    Computation,
    Internal,
}

impl ErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::InputValidation => 2,
            Self::Computation => 4,
            Self::Internal => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InputValidation => "InputValidationError",
            Self::Computation => "ComputationError",
            Self::Internal => "InternalError",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RadialError {
    #[error("radial solve failed for n={n}, kappa={kappa}, energy={energy:.10e}: {source}")]
    Solver {
        n: i32,
        kappa: i32,
        energy: f64,
        #[source]
        source: SolverError,
    },
    #[error("orbital handle {handle} does not exist")]
    MissingOrbital { handle: usize },
    #[error("orbital {handle} has no resident wavefunction")]
    OrbitalUnloaded { handle: usize },
    #[error("unsupported integral type {0}")]
    UnsupportedIntegralType(i32),
    #[error("unsupported Slater integral mode {0}")]
    UnsupportedSlaterMode(i32),
    #[error("unsupported multipole rank {0}")]
    UnsupportedMultipoleRank(i32),
    #[error("configuration group {group} does not exist")]
    MissingGroup { group: usize },
    #[error("radial grid is already established and cannot be reconfigured")]
    GridLocked,
    #[error("radial grid has not been established")]
    GridNotEstablished,
    #[error(
        "continuum orbital with ilast={ilast} on a {points}-point grid does not leave whole asymptotic pairs"
    )]
    InvalidAsymptoticLayout { ilast: usize, points: usize },
    #[error("{name} length mismatch: need {need}, got {got}")]
    LengthMismatch {
        name: &'static str,
        need: usize,
        got: usize,
    },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Quadrature(#[from] NewtonCotesError),
    #[error(transparent)]
    Spline(#[from] SplineError),
    #[error(transparent)]
    Options(#[from] OptionsError),
}

impl RadialError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Solver { .. } => ErrorCategory::Computation,
            Self::Spline(_) => ErrorCategory::Computation,
            Self::Grid(_) | Self::Options(_) | Self::GridLocked | Self::MissingGroup { .. } => {
                ErrorCategory::InputValidation
            }
            Self::UnsupportedIntegralType(_)
            | Self::UnsupportedSlaterMode(_)
            | Self::UnsupportedMultipoleRank(_) => ErrorCategory::InputValidation,
            Self::MissingOrbital { .. }
            | Self::OrbitalUnloaded { .. }
            | Self::GridNotEstablished
            | Self::InvalidAsymptoticLayout { .. }
            | Self::LengthMismatch { .. }
            | Self::Quadrature(_) => ErrorCategory::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}
