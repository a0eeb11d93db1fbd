//! Mean-field potential on the radial grid.
//!
//! The potential handed to the solver is `U + Vc`, plus `Vtail` for
//! continua and screened shells. `U` carries the nuclear term, so the
//! electronic part at each point is `(U + Vc) r + Z`.

use crate::numerics::RadialGrid;

#[derive(Debug, Clone, PartialEq)]
pub struct Potential {
    grid: RadialGrid,
    nuclear_charge: f64,
    pub z: Vec<f64>,
    pub u: Vec<f64>,
    pub vc: Vec<f64>,
    pub vtail: Vec<f64>,
    /// Relaxed `r V` from the previous update, averaged into the next one.
    pub(crate) screening_history: Option<Vec<f64>>,
    pub lambda: f64,
    pub a: f64,
    pub lambda_tail: f64,
    pub a_tail: f64,
    pub electron_count: f64,
}

impl Potential {
    /// Bare nucleus: `Z[i] = Z`, `U = -Z/r`, no screening.
    pub fn new(grid: RadialGrid, nuclear_charge: f64) -> Self {
        let points = grid.len();
        let mut potential = Self {
            grid,
            nuclear_charge,
            z: vec![nuclear_charge; points],
            u: vec![0.0; points],
            vc: vec![0.0; points],
            vtail: vec![0.0; points],
            screening_history: None,
            lambda: 0.0,
            a: 0.0,
            lambda_tail: 0.0,
            a_tail: 0.0,
            electron_count: 0.0,
        };
        potential.set_initial_u();
        potential
    }

    pub fn grid(&self) -> &RadialGrid {
        &self.grid
    }

    pub fn nuclear_charge(&self) -> f64 {
        self.nuclear_charge
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// `Z[i] = (1 + c) Z_nuc`; `c > 0` over-screens during annealing.
    pub fn set_z(&mut self, c: f64) {
        let charge = (1.0 + c) * self.nuclear_charge;
        self.z.fill(charge);
    }

    /// `Vc = (N - 1)(1 - e^{-λr}(1 + a r))/r`.
    pub fn set_vc(&mut self) {
        let screened = self.electron_count - 1.0;
        for (slot, r) in self.vc.iter_mut().zip(self.grid.radii()) {
            *slot = if screened > 0.0 {
                screened * (1.0 - (-self.lambda * r).exp() * (1.0 + self.a * r)) / r
            } else {
                0.0
            };
        }
    }

    pub fn set_initial_u(&mut self) {
        for ((slot, z), r) in self.u.iter_mut().zip(&self.z).zip(self.grid.radii()) {
            *slot = -z / r;
        }
    }

    /// One extra electron screened with `(λp, ap)`; zero while the tail
    /// parameters are off.
    pub fn set_vtail(&mut self) {
        let active = self.lambda_tail > 0.0;
        for (slot, r) in self.vtail.iter_mut().zip(self.grid.radii()) {
            *slot = if active {
                (1.0 - (-self.lambda_tail * r).exp() * (1.0 + self.a_tail * r)) / r
            } else {
                0.0
            };
        }
    }

    pub fn central(&self, index: usize, tail: bool) -> f64 {
        let value = self.u[index] + self.vc[index];
        if tail {
            value + self.vtail[index]
        } else {
            value
        }
    }

    /// `-Z/r - (U + Vc [+ Vtail])`.
    pub fn residual(&self, index: usize, tail: bool) -> f64 {
        -self.z[index] / self.grid.radii()[index] - self.central(index, tail)
    }

    /// `r (U + Vc) + Z` at the last grid point: the electronic charge seen
    /// far from the atom.
    pub fn asymptotic_charge(&self) -> f64 {
        let last = self.len() - 1;
        (self.u[last] + self.vc[last]) * self.grid.radii()[last] + self.z[last]
    }

    /// `Z[last] - N + 1`, one less with `extra_screening`.
    pub fn residual_z(&self, extra_screening: bool) -> f64 {
        let z = self.z[self.len() - 1] - self.electron_count + 1.0;
        if extra_screening { z - 1.0 } else { z }
    }

    /// Averages `rV` with the previous update and sets `λ = ln 2 / r_half`,
    /// `r_half` being the first radius where the average exceeds half its
    /// asymptotic value.
    pub fn adjust_screening_params(&mut self, r_potential: &mut [f64]) {
        let history = self
            .screening_history
            .get_or_insert_with(|| r_potential.to_vec());
        for (value, previous) in r_potential.iter_mut().zip(history.iter_mut()) {
            *value = 0.5 * (*value + *previous);
            *previous = *value;
        }
        let last = r_potential.len() - 1;
        let half = 0.5 * r_potential[last];
        let index = r_potential
            .iter()
            .position(|value| *value > half)
            .unwrap_or(last);
        self.lambda = std::f64::consts::LN_2 / self.grid.radii()[index];
    }

    pub(crate) fn record_history(&mut self, r_potential: Vec<f64>) {
        self.screening_history = Some(r_potential);
    }
}
