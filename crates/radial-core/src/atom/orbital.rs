//! Orbital records and the append-only registry that hands out stable
//! handles. A handle stays valid for the life of the calculation even when
//! its wavefunction is released; the record then reports `OrbitalUnloaded`
//! until it is solved again.

use crate::common::constants::{EPS3, EPS6};
use crate::domain::{RadialError, RadialResult};

pub type OrbitalHandle = usize;

/// Radial amplitudes on the full grid. For a continuum orbital the entries
/// beyond `ilast` hold the asymptotic pairs `(A, φ)` in `large` and `(c, s)`
/// in `small`, starting at `ilast + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Wavefunction {
    pub large: Vec<f64>,
    pub small: Vec<f64>,
}

impl Wavefunction {
    pub fn zeros(points: usize) -> Self {
        Self {
            large: vec![0.0; points],
            small: vec![0.0; points],
        }
    }

    pub fn len(&self) -> usize {
        self.large.len()
    }

    pub fn is_empty(&self) -> bool {
        self.large.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Orbital {
    /// Principal number for bound states; `0` for a continuum request and
    /// `-k` for the `k`-th registered continuum.
    pub n: i32,
    pub kappa: i32,
    pub energy: f64,
    pub ilast: usize,
    pub phase: Option<f64>,
    pub qr_norm: f64,
    pub wavefunction: Option<Wavefunction>,
}

impl Orbital {
    pub fn new(n: i32, kappa: i32, energy: f64) -> Self {
        Self {
            n,
            kappa,
            energy,
            ilast: 0,
            phase: None,
            qr_norm: 1.0,
            wavefunction: None,
        }
    }

    pub fn is_continuum(&self) -> bool {
        self.n <= 0
    }

    pub fn is_resident(&self) -> bool {
        self.wavefunction.is_some()
    }

    /// Read-only view used by the quadrature engine.
    pub fn table(&self, handle: OrbitalHandle) -> RadialResult<OrbitalTable<'_>> {
        let wavefunction = self
            .wavefunction
            .as_ref()
            .ok_or(RadialError::OrbitalUnloaded { handle })?;
        let points = wavefunction.len();
        if wavefunction.small.len() != points {
            return Err(RadialError::LengthMismatch {
                name: "orbital small component",
                need: points,
                got: wavefunction.small.len(),
            });
        }
        let ilast = self.ilast.min(points.saturating_sub(1));
        let continuum = self.is_continuum();
        if continuum && (points == 0 || (points - 1 - ilast) % 2 != 0) {
            return Err(RadialError::InvalidAsymptoticLayout { ilast, points });
        }
        Ok(OrbitalTable {
            large: &wavefunction.large,
            small: &wavefunction.small,
            ilast,
            continuum,
        })
    }
}

/// Asymptotic sample `P = A sin φ`, `Q = c cos φ + s sin φ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AsymptoticSample {
    pub amplitude: f64,
    pub phase: f64,
    pub cos_coeff: f64,
    pub sin_coeff: f64,
}

impl AsymptoticSample {
    pub fn large(&self) -> f64 {
        self.amplitude * self.phase.sin()
    }

    pub fn small(&self) -> f64 {
        self.cos_coeff * self.phase.cos() + self.sin_coeff * self.phase.sin()
    }

    /// `dφ/dr`.
    pub fn phase_derivative(&self) -> f64 {
        1.0 / (self.amplitude * self.amplitude)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitalTable<'a> {
    pub large: &'a [f64],
    pub small: &'a [f64],
    pub ilast: usize,
    pub continuum: bool,
}

impl OrbitalTable<'_> {
    pub fn len(&self) -> usize {
        self.large.len()
    }

    pub fn is_empty(&self) -> bool {
        self.large.is_empty()
    }

    /// Asymptotic pair starting at `index`; `index - ilast` must be odd.
    pub fn asymptotic(&self, index: usize) -> AsymptoticSample {
        AsymptoticSample {
            amplitude: self.large[index],
            phase: self.large[index + 1],
            cos_coeff: self.small[index],
            sin_coeff: self.small[index + 1],
        }
    }

    /// `(P, Q)` at a tabulated index or at an asymptotic pair start; zero
    /// beyond the end of a bound orbital.
    pub fn components(&self, index: usize) -> (f64, f64) {
        if index <= self.ilast {
            (self.large[index], self.small[index])
        } else if self.continuum && index + 1 < self.len() {
            let sample = self.asymptotic(index);
            (sample.large(), sample.small())
        } else {
            (0.0, 0.0)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrbitalRegistry {
    orbitals: Vec<Orbital>,
    continua: i32,
}

impl OrbitalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record; a continuum request (`n == 0`) gets the next
    /// negative counter as its `n`.
    pub fn push(&mut self, mut orbital: Orbital) -> OrbitalHandle {
        if orbital.n == 0 {
            orbital.n = self.next_continuum_n();
        }
        self.orbitals.push(orbital);
        self.orbitals.len() - 1
    }

    /// Appends without renumbering; used when the caller assigns `n` after
    /// a successful solve.
    pub(crate) fn push_raw(&mut self, orbital: Orbital) -> OrbitalHandle {
        self.orbitals.push(orbital);
        self.orbitals.len() - 1
    }

    pub(crate) fn next_continuum_n(&mut self) -> i32 {
        self.continua += 1;
        -self.continua
    }

    pub fn get(&self, handle: OrbitalHandle) -> RadialResult<&Orbital> {
        self.orbitals
            .get(handle)
            .ok_or(RadialError::MissingOrbital { handle })
    }

    pub fn get_mut(&mut self, handle: OrbitalHandle) -> RadialResult<&mut Orbital> {
        self.orbitals
            .get_mut(handle)
            .ok_or(RadialError::MissingOrbital { handle })
    }

    pub fn table(&self, handle: OrbitalHandle) -> RadialResult<OrbitalTable<'_>> {
        self.get(handle)?.table(handle)
    }

    /// Lookup without solving: bound orbitals match on `(n, kappa)`,
    /// continuum requests (`n == 0`) on `kappa` and energy.
    pub fn find(&self, n: i32, kappa: i32, energy: f64) -> Option<OrbitalHandle> {
        self.orbitals.iter().position(|orbital| {
            if n == 0 {
                orbital.kappa == kappa && (orbital.energy - energy).abs() < EPS6
            } else {
                orbital.n == n && orbital.kappa == kappa
            }
        })
    }

    /// Lookup used before solving; a continuum match must also have positive
    /// energy so an unsolved bound record is never taken for a continuum.
    pub fn find_solvable(&self, n: i32, kappa: i32, energy: f64) -> Option<OrbitalHandle> {
        self.orbitals.iter().position(|orbital| {
            if n == 0 {
                orbital.kappa == kappa
                    && orbital.energy > 0.0
                    && (orbital.energy - energy).abs() < EPS6
            } else {
                orbital.n == n && orbital.kappa == kappa
            }
        })
    }

    pub fn release(&mut self, handle: OrbitalHandle) -> RadialResult<()> {
        self.get_mut(handle)?.wavefunction = None;
        Ok(())
    }

    /// Releases resident continua, all of them or only those within `EPS3`
    /// of `energy`. Returns how many were released.
    pub fn release_continua(&mut self, energy: Option<f64>) -> usize {
        let mut released = 0;
        for orbital in &mut self.orbitals {
            if !orbital.is_continuum() || orbital.wavefunction.is_none() {
                continue;
            }
            if let Some(energy) = energy {
                if (orbital.energy - energy).abs() >= EPS3 {
                    continue;
                }
            }
            orbital.wavefunction = None;
            released += 1;
        }
        released
    }

    pub fn len(&self) -> usize {
        self.orbitals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbitals.is_empty()
    }

    pub fn num_continua(&self) -> usize {
        self.continua as usize
    }

    pub fn num_bounds(&self) -> usize {
        self.len().saturating_sub(self.num_continua())
    }

    pub fn iter(&self) -> impl Iterator<Item = (OrbitalHandle, &Orbital)> {
        self.orbitals.iter().enumerate()
    }
}
