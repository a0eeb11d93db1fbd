//! Physical constants and numeric thresholds shared by the radial kernels.
//!
//! Energies are in Hartree and lengths in bohr throughout the crate.

pub const PI: f64 = std::f64::consts::PI;
pub const TWO_PI: f64 = 2.0 * PI;
pub const FINE_STRUCTURE_CONST: f64 = 7.297_352_569_3e-3;
pub const FINE_STRUCTURE_CONST2: f64 = FINE_STRUCTURE_CONST * FINE_STRUCTURE_CONST;
pub const HARTREE_EV: f64 = 27.211_386_245_988;

pub const EPS3: f64 = 1.0e-3;
pub const EPS6: f64 = 1.0e-6;
pub const EPS10: f64 = 1.0e-10;

pub const DEFAULT_MAX_POINTS: usize = 1250;
pub const DEFAULT_RGRID_MIN: f64 = 1.0e-5;
pub const DEFAULT_RGRID_MAX: f64 = 0.5e4;

pub const DEFAULT_TOLERANCE: f64 = EPS6;
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_SCREENING: i32 = 8;
pub const DEFAULT_MAX_RANK: i32 = 8;

/// Largest rank (in doubled units) used when building the average-configuration potential.
pub const POTENTIAL_MAX_RANK2: i32 = 8;

/// Multipole ranks at or beyond this offset request a plain `<r^m>` moment.
pub const MOMENT_RANK_OFFSET: i32 = 256;
