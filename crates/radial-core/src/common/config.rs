//! Calculation controls: SCF tolerance and iteration cap, screening threshold,
//! radial grid extents, transition gauge and the largest exchange rank.
//!
//! Options deserialize from camelCase JSON; every field has a default so a
//! partial document (or `{}`) is valid.

use super::constants::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_POINTS, DEFAULT_MAX_RANK, DEFAULT_RGRID_MAX,
    DEFAULT_RGRID_MIN, DEFAULT_SCREENING, DEFAULT_TOLERANCE,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gauge {
    Coulomb,
    #[default]
    Babushkin,
}

/// How the per-orbital SCF change is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConvergenceMetric {
    /// `max(|1 - E_old/E_new|, max|ΔP| / max|P|)`.
    #[default]
    Combined,
    /// `|1 - E_old/E_new|` only.
    EnergyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    pub r_min: f64,
    pub r_max: f64,
    pub point_count: usize,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            r_min: DEFAULT_RGRID_MIN,
            r_max: DEFAULT_RGRID_MAX,
            point_count: DEFAULT_MAX_POINTS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculationOptions {
    pub tolerance: f64,
    pub max_iterations: usize,
    /// Orbitals with `n` at or above this value (and all continua) feel the
    /// extra one-electron tail screening. `0` disables it.
    pub screening: i32,
    pub grid: GridOptions,
    pub gauge: Gauge,
    /// Largest exchange rank in `slater_total`, in doubled units.
    pub max_rank: i32,
    pub convergence_metric: ConvergenceMetric,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            screening: DEFAULT_SCREENING,
            grid: GridOptions::default(),
            gauge: Gauge::default(),
            max_rank: DEFAULT_MAX_RANK,
            convergence_metric: ConvergenceMetric::default(),
        }
    }
}

impl CalculationOptions {
    pub fn validate(&self) -> Result<(), OptionsError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(OptionsError::InvalidValue {
                field: "tolerance",
                value: self.tolerance,
            });
        }
        if !self.grid.r_min.is_finite() || self.grid.r_min <= 0.0 {
            return Err(OptionsError::InvalidValue {
                field: "grid.rMin",
                value: self.grid.r_min,
            });
        }
        if !self.grid.r_max.is_finite() || self.grid.r_max <= self.grid.r_min {
            return Err(OptionsError::InvalidValue {
                field: "grid.rMax",
                value: self.grid.r_max,
            });
        }
        if self.grid.point_count < 8 {
            return Err(OptionsError::InvalidValue {
                field: "grid.pointCount",
                value: self.grid.point_count as f64,
            });
        }
        if self.screening < 0 {
            return Err(OptionsError::InvalidValue {
                field: "screening",
                value: f64::from(self.screening),
            });
        }
        if self.max_rank < 0 {
            return Err(OptionsError::InvalidValue {
                field: "maxRank",
                value: f64::from(self.max_rank),
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to read calculation options '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse calculation options '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("calculation option '{field}' has invalid value {value}")]
    InvalidValue { field: &'static str, value: f64 },
}

pub fn load_calculation_options(
    options_path: impl AsRef<Path>,
) -> Result<CalculationOptions, OptionsError> {
    let options_path = options_path.as_ref();
    let source = fs::read_to_string(options_path).map_err(|source| OptionsError::Read {
        path: options_path.to_path_buf(),
        source,
    })?;
    let options: CalculationOptions =
        serde_json::from_str(&source).map_err(|source| OptionsError::Parse {
            path: options_path.to_path_buf(),
            source,
        })?;
    options.validate()?;
    Ok(options)
}
