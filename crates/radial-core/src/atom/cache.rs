//! Memo tables for Slater, residual-potential and multipole integrals.
//!
//! Presence of a key marks the value as computed, so an integral that is
//! legitimately zero is cached like any other.

use crate::domain::{RadialError, RadialResult};
use std::collections::HashMap;

/// `[k0, k1, k2, k3, rank, mode index]`; `(k0, k2)` and `(k1, k3)` are the
/// two electron densities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlaterKey(pub [i32; 6]);

impl SlaterKey {
    pub fn new(orbitals: [usize; 4], rank: i32, mode: i32) -> RadialResult<Self> {
        let slot = |handle: usize| {
            i32::try_from(handle).map_err(|_| RadialError::MissingOrbital { handle })
        };
        let mut key = [
            slot(orbitals[0])?,
            slot(orbitals[1])?,
            slot(orbitals[2])?,
            slot(orbitals[3])?,
            rank,
            slater_mode_index(mode)?,
        ];
        sort_slater_key(&mut key);
        Ok(Self(key))
    }
}

/// Cache slot for a Slater mode: `0|1 → 0`, `2 → 1`, `-1 → 2`, `-2 → 3`.
pub fn slater_mode_index(mode: i32) -> RadialResult<i32> {
    match mode {
        0 | 1 => Ok(0),
        2 => Ok(1),
        -1 => Ok(2),
        -2 => Ok(3),
        _ => Err(RadialError::UnsupportedSlaterMode(mode)),
    }
}

/// Reorders the orbital indices so that `a <= c`, `b <= d`, `a <= b`, and
/// `c <= d` when `a == b`. Swapping the two densities also exchanges the
/// inner and outer roles of the separable modes, so their slots swap too.
pub fn sort_slater_key(key: &mut [i32; 6]) {
    if key[0] > key[2] {
        key.swap(0, 2);
    }
    if key[1] > key[3] {
        key.swap(1, 3);
    }
    if key[0] > key[1] {
        key.swap(0, 1);
        key.swap(2, 3);
        key[5] = match key[5] {
            1 => 3,
            3 => 1,
            other => other,
        };
    } else if key[0] == key[1] && key[2] > key[3] {
        key.swap(2, 3);
    }
}

/// Operator family of a cached one-body multipole integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MultipoleKind {
    /// `<r^m>`
    Moment,
    /// `<r^-m>`
    InverseMoment,
    MagneticNr { babushkin: bool },
    ElectricNr { babushkin: bool },
    Magnetic { babushkin: bool },
    Electric { babushkin: bool },
}

impl MultipoleKind {
    /// Stable slot number of the kind, `0..=9`.
    pub fn index(self) -> i32 {
        match self {
            Self::Moment => 0,
            Self::InverseMoment => 1,
            Self::MagneticNr { babushkin } => 2 + i32::from(!babushkin),
            Self::ElectricNr { babushkin } => 4 + i32::from(!babushkin),
            Self::Magnetic { babushkin } => 6 + i32::from(!babushkin),
            Self::Electric { babushkin } => 8 + i32::from(!babushkin),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MultipoleKey {
    pub kind: MultipoleKind,
    pub rank: i32,
    pub k1: usize,
    pub k2: usize,
}

#[derive(Debug, Clone, Default)]
pub struct IntegralCaches {
    slater: HashMap<SlaterKey, f64>,
    residual: HashMap<[usize; 2], f64>,
    multipole: HashMap<MultipoleKey, f64>,
}

impl IntegralCaches {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slater(&self, key: &SlaterKey) -> Option<f64> {
        self.slater.get(key).copied()
    }

    pub fn insert_slater(&mut self, key: SlaterKey, value: f64) {
        self.slater.insert(key, value);
    }

    pub fn residual(&self, k0: usize, k1: usize) -> Option<f64> {
        self.residual.get(&residual_key(k0, k1)).copied()
    }

    pub fn insert_residual(&mut self, k0: usize, k1: usize, value: f64) {
        self.residual.insert(residual_key(k0, k1), value);
    }

    pub fn multipole(&self, key: &MultipoleKey) -> Option<f64> {
        self.multipole.get(key).copied()
    }

    pub fn insert_multipole(&mut self, key: MultipoleKey, value: f64) {
        self.multipole.insert(key, value);
    }

    pub fn clear_slater(&mut self) {
        self.slater.clear();
    }

    pub fn clear_residual(&mut self) {
        self.residual.clear();
    }

    pub fn clear_multipole(&mut self) {
        self.multipole.clear();
    }

    pub fn clear(&mut self) {
        self.clear_slater();
        self.clear_residual();
        self.clear_multipole();
    }

    /// `(slater, residual, multipole)` entry counts.
    pub fn len(&self) -> (usize, usize, usize) {
        (self.slater.len(), self.residual.len(), self.multipole.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == (0, 0, 0)
    }
}

fn residual_key(k0: usize, k1: usize) -> [usize; 2] {
    if k0 > k1 { [k1, k0] } else { [k0, k1] }
}
