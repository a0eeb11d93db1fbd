//! Reference radial solver: Numerov shooting on the uniform `rho` mesh.
//!
//! With `J = dr/dρ` and `P = J^{1/2} y` the radial equation becomes
//! `y'' = G y`, `G = J² [2(V - E) + l(l+1)/r²] + (1/4 + αr)/(1 + αr)⁴`,
//! which has no first-derivative term and so integrates with plain Numerov.
//! Only the large component is solved; the small one follows from the Pauli
//! relation `Q = (α/2)(P' + κP/r)`.

use super::{RadialSolver, SolverError};
use crate::atom::orbital::{Orbital, Wavefunction};
use crate::atom::potential::Potential;
use crate::common::constants::FINE_STRUCTURE_CONST;
use crate::domain::l_from_kappa;
use crate::numerics::{RadialGrid, newton_cotes_total};
use tracing::trace;

const MAX_ENERGY_ITERATIONS: usize = 200;
/// `∫ sqrt(G) dρ` past the outer turning point where a bound orbital is cut.
const DECAY_EXPONENT: f64 = 40.0;
/// Smallest phase advance per grid step at which a continuum switches to
/// its asymptotic form.
const MATCH_PHASE_STEP: f64 = 0.3;
/// Largest `|k'|/k²` accepted at the continuum matching point.
const WKB_TOLERANCE: f64 = 1.0e-2;
const BRACKET_FLOOR: f64 = 1.0e-13;

#[derive(Debug, Clone, Default)]
pub struct NumerovSolver {
    g: Vec<f64>,
    f: Vec<f64>,
    y: Vec<f64>,
    momentum2: Vec<f64>,
    large: Vec<f64>,
}

impl NumerovSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn prepare(&mut self, potential: &Potential, tail: bool, l: i32, energy: f64) {
        let grid = potential.grid();
        let points = grid.len();
        let h2 = grid.rho_step() * grid.rho_step();
        let alpha = grid.alpha();
        let centrifugal = f64::from(l * (l + 1));
        self.g.resize(points, 0.0);
        self.f.resize(points, 0.0);
        self.y.resize(points, 0.0);
        self.momentum2.resize(points, 0.0);
        self.large.resize(points, 0.0);
        for (index, radius) in grid.radii().iter().enumerate() {
            let ar = alpha * radius;
            let jacobian = radius / (1.0 + ar);
            let momentum2 =
                2.0 * (energy - potential.central(index, tail)) - centrifugal / (radius * radius);
            let g = -jacobian * jacobian * momentum2 + (0.25 + ar) / (1.0 + ar).powi(4);
            self.momentum2[index] = momentum2;
            self.g[index] = g;
            self.f[index] = 1.0 - h2 * g / 12.0;
        }
    }

    /// `P ≈ r^{l+1} (1 - Z r/(l+1))` on the first two points.
    fn start_outward(&mut self, grid: &RadialGrid, l: i32, charge: f64) {
        for index in 0..2 {
            let radius = grid.radii()[index];
            let jacobian = radius / (1.0 + grid.alpha() * radius);
            let large = radius.powi(l + 1) * (1.0 - charge * radius / f64::from(l + 1));
            self.y[index] = large / jacobian.sqrt();
        }
    }

    /// Integrates up to and including `end`; returns the number of sign
    /// changes met on the way.
    fn integrate_outward(&mut self, end: usize) -> usize {
        let mut nodes = 0;
        for index in 1..end {
            let next = ((12.0 - 10.0 * self.f[index]) * self.y[index]
                - self.f[index - 1] * self.y[index - 1])
                / self.f[index + 1];
            self.y[index + 1] = next;
            if next * self.y[index] < 0.0 {
                nodes += 1;
            }
        }
        nodes
    }

    fn integrate_inward(&mut self, end: usize, start: usize, h: f64) {
        self.y[start] = h;
        self.y[start - 1] = (12.0 - 10.0 * self.f[start]) * self.y[start] / self.f[start - 1];
        for index in (end + 1..start).rev() {
            self.y[index - 1] = ((12.0 - 10.0 * self.f[index]) * self.y[index]
                - self.f[index + 1] * self.y[index + 1])
                / self.f[index - 1];
        }
    }

    /// Last point kept for a bound orbital: where the decay exponent past
    /// the turning point reaches `DECAY_EXPONENT`, or before Numerov would
    /// lose stability.
    fn decay_end(&self, turning: usize, h: f64) -> usize {
        let points = self.g.len();
        let mut index = turning;
        let mut decay = 0.0;
        while index + 1 < points && decay < DECAY_EXPONENT && self.f[index + 1] > 0.5 {
            index += 1;
            decay += h * self.g[index].max(0.0).sqrt();
        }
        index.max(turning + 2).min(points - 1)
    }

    fn solve_bound(
        &mut self,
        orbital: &mut Orbital,
        potential: &Potential,
        tail: bool,
        tolerance: f64,
    ) -> Result<(), SolverError> {
        let grid = potential.grid();
        let points = grid.len();
        let radii = grid.radii();
        let h = grid.rho_step();
        let l = l_from_kappa(orbital.kappa);
        let invalid = SolverError::InvalidQuantumNumbers {
            n: orbital.n,
            kappa: orbital.kappa,
        };
        if orbital.kappa == 0 || orbital.n - l - 1 < 0 {
            return Err(invalid);
        }
        let wanted = (orbital.n - l - 1) as usize;

        let centrifugal = 0.5 * f64::from(l * (l + 1));
        let effective =
            |index: usize| potential.central(index, tail) + centrifugal / (radii[index] * radii[index]);
        let mut lower = (0..points).map(effective).fold(f64::INFINITY, f64::min);
        let mut upper = effective(points - 1);
        if !(lower < upper) {
            return Err(SolverError::EnergyBracket { lower, upper });
        }
        let mut energy = if orbital.energy > lower && orbital.energy < upper {
            orbital.energy
        } else {
            0.5 * (lower + upper)
        };
        let charge = -potential.central(0, tail) * radii[0];

        for iteration in 0..MAX_ENERGY_ITERATIONS {
            if upper - lower < BRACKET_FLOOR * energy.abs().max(1.0) {
                return Err(SolverError::EnergyBracket { lower, upper });
            }
            self.prepare(potential, tail, l, energy);
            let Some(turning) = self.g.iter().rposition(|g| *g < 0.0).filter(|&i| i > 0) else {
                lower = energy;
                energy = 0.5 * (lower + upper);
                continue;
            };
            if turning + 3 >= points {
                upper = energy;
                energy = 0.5 * (lower + upper);
                continue;
            }

            self.start_outward(grid, l, charge);
            let nodes = self.integrate_outward(turning);
            if nodes != wanted {
                if nodes > wanted {
                    upper = energy;
                } else {
                    lower = energy;
                }
                energy = 0.5 * (lower + upper);
                continue;
            }

            let outer = self.decay_end(turning, h);
            let matched = self.y[turning];
            self.integrate_inward(turning, outer, h);
            let inner = self.y[turning];
            if inner == 0.0 || !inner.is_finite() {
                return Err(SolverError::NonFinite { index: turning });
            }
            let scale = matched / inner;
            for value in &mut self.y[turning..=outer] {
                *value *= scale;
            }
            self.y[outer + 1..].fill(0.0);

            for index in 0..=outer {
                let jacobian = radii[index] / (1.0 + grid.alpha() * radii[index]);
                self.large[index] = self.y[index] * self.y[index] * jacobian * grid.dr_drho()[index];
            }
            let norm = newton_cotes_total(&self.large[..=outer]);
            if !(norm > 0.0 && norm.is_finite()) {
                return Err(SolverError::NonFinite { index: outer });
            }
            let inverse = norm.sqrt().recip();
            for value in &mut self.y[..=outer] {
                *value *= inverse;
            }

            // first-order correction from the derivative kink at the turning point
            let (y, f) = (&self.y, &self.f);
            let cusp = (y[turning - 1] * f[turning - 1]
                + y[turning + 1] * f[turning + 1]
                + 10.0 * f[turning] * y[turning])
                / 12.0;
            let kink = f[turning] * (y[turning] / cusp - 1.0);
            let delta = kink / (h * h / 12.0) * cusp * cusp * h;
            if !delta.is_finite() {
                return Err(SolverError::NonFinite { index: turning });
            }
            trace!(iteration, energy, delta, n = orbital.n, kappa = orbital.kappa, "numerov step");

            if delta > 0.0 {
                lower = energy;
            } else if delta < 0.0 {
                upper = energy;
            }
            let next = (energy + delta).clamp(lower, upper);
            if delta.abs() < tolerance {
                self.store_large(grid, outer);
                let mut wavefunction = self.wavefunction(points, outer);
                pauli_small(grid, orbital.kappa, &self.large, outer, &mut wavefunction.small);
                orbital.energy = next;
                orbital.ilast = outer;
                orbital.phase = None;
                orbital.qr_norm = normalize_bound(grid, outer, &mut wavefunction);
                orbital.wavefunction = Some(wavefunction);
                return Ok(());
            }
            energy = next;
        }

        Err(SolverError::NoConvergence {
            iterations: MAX_ENERGY_ITERATIONS,
        })
    }

    fn solve_continuum(
        &mut self,
        orbital: &mut Orbital,
        potential: &Potential,
        tail: bool,
    ) -> Result<(), SolverError> {
        let energy = orbital.energy;
        if !(energy > 0.0) {
            return Err(SolverError::NonPositiveContinuumEnergy { energy });
        }
        let grid = potential.grid();
        let points = grid.len();
        let radii = grid.radii();
        let dr_drho = grid.dr_drho();
        let h = grid.rho_step();
        let l = l_from_kappa(orbital.kappa);
        if orbital.kappa == 0 {
            return Err(SolverError::InvalidQuantumNumbers {
                n: orbital.n,
                kappa: orbital.kappa,
            });
        }

        self.prepare(potential, tail, l, energy);

        let jacobian = |index: usize| radii[index] / (1.0 + grid.alpha() * radii[index]);
        let allowed = self
            .momentum2
            .iter()
            .rposition(|w| *w <= 0.0)
            .map_or(0, |index| index + 1);
        let smooth = |index: usize| {
            let w = self.momentum2[index];
            let k = w.sqrt();
            let slope = rho_derivative(&self.momentum2, index, h) / jacobian(index);
            k * dr_drho[index] >= MATCH_PHASE_STEP && slope.abs() / (2.0 * w * k) <= WKB_TOLERANCE
        };
        let ilast = (allowed.max(2)..points.saturating_sub(2))
            .find(|&index| smooth(index))
            .map(|index| {
                if (points - 1 - index) % 2 == 0 {
                    index
                } else {
                    index + 1
                }
            })
            .filter(|&index| index + 2 < points)
            .unwrap_or(points - 1);
        let anchor = ilast.min(points - 3);
        if self.momentum2[anchor] <= 0.0 {
            return Err(SolverError::ForbiddenTail { index: anchor });
        }

        // past the matching point Numerov steps would outrun the oscillation
        let end = (ilast + 2).min(points - 1);
        let charge = -potential.central(0, tail) * radii[0];
        self.start_outward(grid, l, charge);
        self.integrate_outward(end);
        if let Some(index) = self.y[..=end].iter().position(|value| !value.is_finite()) {
            return Err(SolverError::NonFinite { index });
        }
        for index in 0..=end {
            self.large[index] = self.y[index] * jacobian(index).sqrt();
        }
        self.large[end + 1..].fill(0.0);
        let w = self.momentum2[anchor];
        let k = w.sqrt();
        let amplitude = k.sqrt().recip();
        let amplitude_slope = -rho_derivative(&self.momentum2, anchor, h) / jacobian(anchor) / (4.0 * w);
        let large = self.large[anchor];
        let slope = rho_derivative(&self.large[..=end], anchor, h) / jacobian(anchor);
        let reduced = slope - amplitude_slope * large;
        let phase = (large * k).atan2(reduced);
        let scale = (large * large + (reduced / k).powi(2)).sqrt() / amplitude;
        if !(scale > 0.0 && scale.is_finite()) {
            return Err(SolverError::NonFinite { index: anchor });
        }
        for value in &mut self.large {
            *value /= scale;
        }

        let mut wavefunction = self.wavefunction(points, ilast);
        pauli_small(grid, orbital.kappa, &self.large, ilast, &mut wavefunction.small);
        if ilast + 1 < points {
            let momentum = |index: usize| self.momentum2[index].sqrt() * dr_drho[index];
            let half = 0.5 * FINE_STRUCTURE_CONST;
            let mut phase = phase
                + (5.0 * momentum(ilast) + 8.0 * momentum(ilast + 1) - momentum(ilast + 2)) / 12.0;
            for start in (ilast + 1..points - 1).step_by(2) {
                if start > ilast + 1 {
                    phase += (momentum(start - 2) + 4.0 * momentum(start - 1) + momentum(start)) / 3.0;
                }
                let k = self.momentum2[start].sqrt();
                let amplitude = k.sqrt().recip();
                wavefunction.large[start] = amplitude;
                wavefunction.large[start + 1] = phase;
                wavefunction.small[start] = half * amplitude * k;
                wavefunction.small[start + 1] = half * f64::from(orbital.kappa) / radii[start] * amplitude;
            }
        }

        orbital.ilast = ilast;
        orbital.phase = None;
        orbital.qr_norm = 1.0;
        orbital.wavefunction = Some(wavefunction);
        Ok(())
    }

    /// `P = J^{1/2} y` on `0..=end`, zero beyond.
    fn store_large(&mut self, grid: &RadialGrid, end: usize) {
        let radii = grid.radii();
        for index in 0..=end {
            let jacobian = radii[index] / (1.0 + grid.alpha() * radii[index]);
            self.large[index] = self.y[index] * jacobian.sqrt();
        }
        self.large[end + 1..].fill(0.0);
    }

    fn wavefunction(&self, points: usize, end: usize) -> Wavefunction {
        let mut wavefunction = Wavefunction::zeros(points);
        wavefunction.large[..=end].copy_from_slice(&self.large[..=end]);
        wavefunction
    }
}

/// Normalizes `∫(P² + Q²) dr = 1` and returns `(∫P² dr)^{-1/2}` for the
/// quasi-relativistic integrals.
fn normalize_bound(grid: &RadialGrid, end: usize, wavefunction: &mut Wavefunction) -> f64 {
    let dr_drho = grid.dr_drho();
    let density: Vec<f64> = (0..=end)
        .map(|index| {
            let (p, q) = (wavefunction.large[index], wavefunction.small[index]);
            (p * p + q * q) * dr_drho[index]
        })
        .collect();
    let inverse = newton_cotes_total(&density).sqrt().recip();
    for value in wavefunction.large[..=end]
        .iter_mut()
        .chain(wavefunction.small[..=end].iter_mut())
    {
        *value *= inverse;
    }
    let large: Vec<f64> = (0..=end)
        .map(|index| wavefunction.large[index].powi(2) * dr_drho[index])
        .collect();
    newton_cotes_total(&large).sqrt().recip()
}

/// `Q = (α/2)(P' + κP/r)` on `0..=end`; `large` must hold `P` a couple of
/// points past `end` when the grid has them.
fn pauli_small(grid: &RadialGrid, kappa: i32, large: &[f64], end: usize, small: &mut [f64]) {
    let radii = grid.radii();
    let h = grid.rho_step();
    let half = 0.5 * FINE_STRUCTURE_CONST;
    let limit = (end + 2).min(radii.len() - 1);
    for index in 0..=end {
        let jacobian = radii[index] / (1.0 + grid.alpha() * radii[index]);
        let slope = rho_derivative(&large[..=limit], index, h) / jacobian;
        small[index] = half * (slope + f64::from(kappa) * large[index] / radii[index]);
    }
}

/// `d/dρ` on the uniform mesh: five-point centred where possible, three
/// points near the ends.
fn rho_derivative(values: &[f64], index: usize, h: f64) -> f64 {
    let last = values.len() - 1;
    if index >= 2 && index + 2 <= last {
        (values[index - 2] - 8.0 * values[index - 1] + 8.0 * values[index + 1] - values[index + 2])
            / (12.0 * h)
    } else if index >= 1 && index + 1 <= last {
        (values[index + 1] - values[index - 1]) / (2.0 * h)
    } else if index == 0 {
        (-3.0 * values[0] + 4.0 * values[1] - values[2]) / (2.0 * h)
    } else {
        (3.0 * values[last] - 4.0 * values[last - 1] + values[last - 2]) / (2.0 * h)
    }
}

impl RadialSolver for NumerovSolver {
    fn solve(
        &mut self,
        orbital: &mut Orbital,
        potential: &Potential,
        tail: bool,
        tolerance: f64,
    ) -> Result<(), SolverError> {
        if orbital.is_continuum() {
            self.solve_continuum(orbital, potential, tail)
        } else {
            self.solve_bound(orbital, potential, tail, tolerance)
        }
    }
}
