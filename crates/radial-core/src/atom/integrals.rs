//! Two-body and one-body radial integrals with memoization: Slater
//! integrals, their angular-weighted totals, the residual potential, the
//! non-relativistic and full multipole matrix elements, and the average
//! configuration energy built from them.

use super::angular::AngularCoefficients;
use super::cache::{MultipoleKey, MultipoleKind, SlaterKey};
use super::calculation::Calculation;
use super::configuration::Configuration;
use super::orbital::{OrbitalHandle, OrbitalRegistry};
use super::potential::Potential;
use super::quadrature::{self, IntegralKind, accumulate};
use super::solver::RadialSolver;
use super::workspace::Workspace;
use super::yk::{build_yk, fill_yk};
use crate::common::config::Gauge;
use crate::common::constants::{EPS10, FINE_STRUCTURE_CONST, MOMENT_RANK_OFFSET};
use crate::domain::{RadialError, RadialResult, j2_from_kappa, l2_from_kappa};
use crate::numerics::RadialGrid;
use crate::numerics::special::{spherical_j, triangle};
use tracing::trace;

impl<S: RadialSolver, A: AngularCoefficients> Calculation<S, A> {
    /// `∫ f (pair product) dr` for two resident orbitals.
    pub fn integrate(
        &mut self,
        f: &[f64],
        k1: OrbitalHandle,
        k2: OrbitalHandle,
        kind: IntegralKind,
    ) -> RadialResult<f64> {
        let grid = grid_of(self.potential.as_ref())?;
        let first = self.registry.table(k1)?;
        let second = self.registry.table(k2)?;
        quadrature::integrate(grid, f, &first, &second, kind, &mut self.workspace)
    }

    pub fn integrate_running(
        &mut self,
        f: &[f64],
        k1: OrbitalHandle,
        k2: OrbitalHandle,
        kind: IntegralKind,
        out: &mut [f64],
    ) -> RadialResult<()> {
        let grid = grid_of(self.potential.as_ref())?;
        let first = self.registry.table(k1)?;
        let second = self.registry.table(k2)?;
        quadrature::integrate_running(grid, f, &first, &second, kind, out, &mut self.workspace)
    }

    /// `r Y_k` of the `(k1, k2)` pair density, written into `out`.
    pub fn yk(
        &mut self,
        k: i32,
        k1: OrbitalHandle,
        k2: OrbitalHandle,
        kind: IntegralKind,
        out: &mut [f64],
    ) -> RadialResult<()> {
        let grid = grid_of(self.potential.as_ref())?;
        let first = self.registry.table(k1)?;
        let second = self.registry.table(k2)?;
        build_yk(grid, k, &first, &second, kind, out, &mut self.workspace)
    }

    /// Slater integral `R^k(k0 k1; k2 k3)` with `(k0, k2)` and `(k1, k3)` the
    /// two densities.
    ///
    /// Modes `0` and `1` are relativistic, `-1` uses large components with
    /// the quasi-relativistic normalization, `2` and `-2` the separable
    /// `<r^k> <r^-(k+1)>` approximation with the outer density on `(k0, k2)`
    /// or `(k1, k3)` respectively.
    pub fn slater(&mut self, ks: [OrbitalHandle; 4], k: i32, mode: i32) -> RadialResult<f64> {
        let key = SlaterKey::new(ks, k, mode)?;
        if let Some(value) = self.caches.slater(&key) {
            return Ok(value);
        }
        trace!(?ks, k, mode, "slater cache miss");

        let [k0, k1, k2, k3] = ks;
        let value = match mode {
            0 | 1 | -1 => {
                let kind = if mode == -1 { IntegralKind::Large } else { IntegralKind::Sum };
                let grid = grid_of(self.potential.as_ref())?;
                let registry = &self.registry;
                let density = (registry.table(k0)?, registry.table(k2)?);
                let outer = (registry.table(k1)?, registry.table(k3)?);
                fill_yk(grid, k, &density.0, &density.1, kind, &mut self.workspace)?;

                let Workspace {
                    quadrature,
                    running,
                    yk,
                    ..
                } = &mut self.workspace;
                for (value, r) in yk.iter_mut().zip(grid.radii()) {
                    *value /= r;
                }
                accumulate(grid, yk, &outer.0, &outer.1, kind, running, quadrature)?;
                let mut value = running[running.len() - 1];
                if mode == -1 {
                    for handle in ks {
                        value *= registry.get(handle)?.qr_norm;
                    }
                }
                value
            }
            2 | -2 => {
                let (inner, outer) = if mode == 2 {
                    ((k0, k2), (k1, k3))
                } else {
                    ((k1, k3), (k0, k2))
                };
                let mut value = if k == 0 {
                    if inner.0 == inner.1 { 1.0 } else { 0.0 }
                } else {
                    self.multipole_radial_nr(k + MOMENT_RANK_OFFSET, inner.0, inner.1)?
                };
                if value != 0.0 {
                    value *= self.multipole_radial_nr(-k - 1 - MOMENT_RANK_OFFSET, outer.0, outer.1)?;
                }
                value
            }
            _ => return Err(RadialError::UnsupportedSlaterMode(mode)),
        };

        self.caches.insert_slater(key, value);
        Ok(value)
    }

    /// Direct and exchange two-electron integrals of rank `k` (doubled)
    /// with their reduced-matrix-element factors. Entries of `js` that are
    /// not positive are taken from the orbitals' `kappa`.
    pub fn slater_total(
        &mut self,
        js: [i32; 4],
        ks: [OrbitalHandle; 4],
        k: i32,
        mode: i32,
    ) -> RadialResult<(f64, f64)> {
        let mut j = js;
        let mut kl = [0; 4];
        let mut bound = [false; 4];
        for index in 0..4 {
            let orbital = self.registry.get(ks[index])?;
            if j[index] <= 0 {
                j[index] = j2_from_kappa(orbital.kappa);
            }
            kl[index] = l2_from_kappa(orbital.kappa);
            bound[index] = orbital.n > 0;
        }
        let [k0, k1, k2, k3] = ks;
        let rank = k / 2;
        let even = |value: i32| value % 2 == 0;

        let mut direct = 0.0;
        if even((kl[0] + kl[2]) / 2 + rank)
            && even((kl[1] + kl[3]) / 2 + rank)
            && triangle(j[0], j[2], k)
            && triangle(j[1], j[3], k)
        {
            direct = self.slater(ks, rank, mode)?;
            direct *= self.angular.reduced_cl(j[0], k, j[2]) * self.angular.reduced_cl(j[1], k, j[3]);
            if k0 == k1 && k2 == k3 {
                direct *= 0.5;
            }
        }

        if mode.abs() == 2
            || (k0 == k1 && (bound[0] || bound[1]))
            || (k2 == k3 && (bound[2] || bound[3]))
        {
            return Ok((direct, 0.0));
        }

        let mut tmin = (j[0] - j[3]).abs().max((j[1] - j[2]).abs());
        if tmin % 2 != 0 {
            tmin += 1;
        }
        let tmax = (j[0] + j[3]).min(j[1] + j[2]).min(self.options.max_rank);
        let mut exchange = 0.0;
        let mut t = tmin;
        while t <= tmax {
            let recoupling = self.angular.w6j(j[0], j[2], k, j[1], j[3], t);
            if recoupling.abs() > EPS10
                && even((kl[0] + kl[3] + t) / 2)
                && even((kl[1] + kl[2] + t) / 2)
            {
                let mut term = self.slater([k0, k1, k3, k2], t / 2, mode)?;
                term *= self.angular.reduced_cl(j[0], t, j[3])
                    * self.angular.reduced_cl(j[1], t, j[2])
                    * recoupling
                    * f64::from(k + 1);
                if !even(t / 2 + rank) {
                    term = -term;
                }
                exchange += term;
            }
            t += 2;
        }
        Ok((direct, exchange))
    }

    /// `<k0| -Z/r - (U + Vc) |k1>`, with `Vtail` included when either
    /// orbital is a continuum or lies at or above the screening shell.
    pub fn residual_potential(&mut self, k0: OrbitalHandle, k1: OrbitalHandle) -> RadialResult<f64> {
        if let Some(value) = self.caches.residual(k0, k1) {
            return Ok(value);
        }
        trace!(k0, k1, "residual potential cache miss");
        let tail = {
            let n0 = self.registry.get(k0)?.n;
            let n1 = self.registry.get(k1)?.n;
            self.uses_tail(n0) || self.uses_tail(n1)
        };
        let potential = self.potential.as_ref().ok_or(RadialError::GridNotEstablished)?;
        let value = weighted_integral(
            potential.grid(),
            &self.registry,
            &mut self.workspace,
            (k0, k1),
            IntegralKind::Sum,
            |index, _| potential.residual(index, tail),
        )?;
        self.caches.insert_residual(k0, k1, value);
        Ok(value)
    }

    /// Non-relativistic multipole element between `k1` and `k2`.
    ///
    /// `m > 0` is magnetic and `m < 0` electric of rank `|m|`. Ranks offset
    /// by `±256` request the plain moments `<r^(m-256)>` and
    /// `<r^(m+256)>`, which are gauge independent.
    pub fn multipole_radial_nr(&mut self, m: i32, k1: OrbitalHandle, k2: OrbitalHandle) -> RadialResult<f64> {
        if m == 0 {
            return Ok(0.0);
        }
        let babushkin = self.options.gauge == Gauge::Babushkin;
        let (kind, rank) = if m >= MOMENT_RANK_OFFSET {
            (MultipoleKind::Moment, m - MOMENT_RANK_OFFSET)
        } else if m <= -MOMENT_RANK_OFFSET {
            (MultipoleKind::InverseMoment, -m - MOMENT_RANK_OFFSET)
        } else if m > 0 {
            (MultipoleKind::MagneticNr { babushkin }, m)
        } else {
            (MultipoleKind::ElectricNr { babushkin }, -m)
        };
        let key = MultipoleKey { kind, rank, k1, k2 };
        if let Some(value) = self.caches.multipole(&key) {
            return Ok(value);
        }
        trace!(m, k1, k2, "multipole cache miss");

        let kappa1 = self.registry.get(k1)?.kappa;
        let kappa2 = self.registry.get(k2)?.kappa;
        let grid = grid_of(self.potential.as_ref())?;
        let pair = (k1, k2);
        let value = match kind {
            MultipoleKind::Moment => weighted_integral(
                grid,
                &self.registry,
                &mut self.workspace,
                pair,
                IntegralKind::Sum,
                |_, r| r.powi(rank),
            )?,
            MultipoleKind::InverseMoment => weighted_integral(
                grid,
                &self.registry,
                &mut self.workspace,
                pair,
                IntegralKind::Sum,
                |_, r| r.powi(-rank),
            )?,
            MultipoleKind::MagneticNr { .. } => {
                let t = kappa1 + kappa2;
                let p = m - t;
                let mut value = 0.0;
                if p != 0 && t != 0 {
                    value = weighted_integral(
                        grid,
                        &self.registry,
                        &mut self.workspace,
                        pair,
                        IntegralKind::Sum,
                        |_, r| r.powi(m - 1),
                    )?;
                    value *= f64::from(p) * f64::from(t) / f64::from(m * (m + 1)).sqrt();
                    value *= -0.5 * FINE_STRUCTURE_CONST / double_factorial(2 * m - 1);
                }
                value * self.angular.reduced_cl(j2_from_kappa(kappa1), 2 * m, j2_from_kappa(kappa2))
            }
            MultipoleKind::ElectricNr { .. } => {
                let value = weighted_integral(
                    grid,
                    &self.registry,
                    &mut self.workspace,
                    pair,
                    IntegralKind::Sum,
                    |_, r| r.powi(rank),
                )? * (f64::from(rank + 1) / f64::from(rank)).sqrt()
                    / double_factorial(2 * rank - 1);
                value * self.angular.reduced_cl(j2_from_kappa(kappa1), 2 * rank, j2_from_kappa(kappa2))
            }
            MultipoleKind::Magnetic { .. } | MultipoleKind::Electric { .. } => {
                return Err(RadialError::UnsupportedMultipoleRank(m));
            }
        };
        self.caches.insert_multipole(key, value);
        Ok(value)
    }

    /// Fully relativistic multipole element at photon wave number `aw`.
    ///
    /// The cache key does not include `aw`: for a given orbital pair the
    /// transition energy, and with it `aw`, is fixed.
    pub fn multipole_radial(
        &mut self,
        aw: f64,
        m: i32,
        k1: OrbitalHandle,
        k2: OrbitalHandle,
    ) -> RadialResult<f64> {
        if m == 0 {
            return Ok(0.0);
        }
        let babushkin = self.options.gauge == Gauge::Babushkin;
        let rank = m.abs();
        let kind = if m > 0 {
            MultipoleKind::Magnetic { babushkin }
        } else {
            MultipoleKind::Electric { babushkin }
        };
        let key = MultipoleKey { kind, rank, k1, k2 };
        if let Some(value) = self.caches.multipole(&key) {
            return Ok(value);
        }
        trace!(m, k1, k2, aw, "multipole cache miss");

        let kappa1 = self.registry.get(k1)?.kappa;
        let kappa2 = self.registry.get(k2)?.kappa;
        let scale = aw.powi(rank);
        let rank_f = f64::from(rank);
        let mut value = 0.0;
        if m > 0 {
            let t = kappa1 + kappa2;
            if t != 0 {
                value = f64::from(t) * self.multipole_ij(aw, rank, k1, k2, IntegralKind::CrossSum)?;
                value *= (2.0 * rank_f + 1.0) / (rank_f * (rank_f + 1.0)).sqrt() / scale;
            }
        } else if babushkin {
            let t = f64::from(kappa1 - kappa2);
            if t != 0.0 {
                value = t * self.multipole_ij(aw, rank + 1, k1, k2, IntegralKind::CrossSum)?;
            }
            let same = self.multipole_ij(aw, rank, k1, k2, IntegralKind::Sum)?;
            let cross = self.multipole_ij(aw, rank + 1, k1, k2, IntegralKind::CrossDifference)?;
            value += (rank_f + 1.0) * (same + cross);
            value *= (2.0 * rank_f + 1.0) / (rank_f * (rank_f + 1.0)).sqrt() / scale;
        } else {
            let t = f64::from(kappa1 - kappa2);
            let q = (rank_f / (rank_f + 1.0)).sqrt();
            if t != 0.0 {
                let upper = self.multipole_ij(aw, rank + 1, k1, k2, IntegralKind::CrossSum)?;
                let lower = self.multipole_ij(aw, rank - 1, k1, k2, IntegralKind::CrossSum)?;
                value = t * upper * q - t * lower / q;
            }
            let upper = self.multipole_ij(aw, rank + 1, k1, k2, IntegralKind::CrossDifference)?;
            let lower = self.multipole_ij(aw, rank - 1, k1, k2, IntegralKind::CrossDifference)?;
            value += (rank_f + 1.0) * upper * q + rank_f * lower / q;
            value /= scale;
        }
        value *= self
            .angular
            .reduced_cl(j2_from_kappa(kappa1), 2 * rank, j2_from_kappa(kappa2));
        self.caches.insert_multipole(key, value);
        Ok(value)
    }

    /// `∫ j_m(aw r) (pair product) dr`.
    pub fn multipole_ij(
        &mut self,
        aw: f64,
        m: i32,
        k1: OrbitalHandle,
        k2: OrbitalHandle,
        kind: IntegralKind,
    ) -> RadialResult<f64> {
        let order = usize::try_from(m).map_err(|_| RadialError::UnsupportedMultipoleRank(m))?;
        let grid = grid_of(self.potential.as_ref())?;
        weighted_integral(grid, &self.registry, &mut self.workspace, (k1, k2), kind, |_, r| {
            spherical_j(order, aw * r)
        })
    }

    pub fn free_slater_array(&mut self) {
        self.caches.clear_slater();
    }

    pub fn free_residual_array(&mut self) {
        self.caches.clear_residual();
    }

    pub fn free_multipole_array(&mut self) {
        self.caches.clear_multipole();
    }

    pub fn clear_caches(&mut self) {
        self.caches.clear();
    }

    /// Entries in the Slater, residual and multipole caches.
    pub fn cache_sizes(&self) -> (usize, usize, usize) {
        self.caches.len()
    }

    /// Average energy of a configuration: one-body energies and residual
    /// potential plus the direct and exchange interactions averaged over
    /// all states of the configuration.
    pub fn average_energy_config(&mut self, configuration: &Configuration) -> RadialResult<f64> {
        let mut handles = Vec::with_capacity(configuration.shells.len());
        for shell in &configuration.shells {
            handles.push(self.orbital_index(shell.n, shell.kappa, 0.0)?);
        }

        let mut energy = 0.0;
        for (i, shell) in configuration.shells.iter().enumerate() {
            let k = handles[i];
            let nq = f64::from(shell.nq);
            let j2 = j2_from_kappa(shell.kappa);
            let kl = l2_from_kappa(shell.kappa);

            let mut same_shell = 0.0;
            if shell.nq > 1 {
                let mut exchange = 0.0;
                let mut rank = 2;
                while rank <= j2 {
                    let coefficient = self.angular.w3j(j2, 2 * rank, j2, -1, 0, 1);
                    exchange += self.slater([k, k, k, k], rank, 0)? * coefficient * coefficient;
                    rank += 2;
                }
                let direct = self.slater([k, k, k, k], 0, 0)?;
                same_shell =
                    0.5 * (nq - 1.0) * (direct - (1.0 + 1.0 / f64::from(j2)) * exchange);
            }

            let mut pairs = 0.0;
            for (other, pair_shell) in configuration.shells.iter().enumerate().take(i) {
                let kp = handles[other];
                let nqp = f64::from(pair_shell.nq);
                let j2p = j2_from_kappa(pair_shell.kappa);
                let klp = l2_from_kappa(pair_shell.kappa);

                let mut rank2 = (j2 - j2p).abs();
                if ((rank2 + kl + klp) / 2) % 2 != 0 {
                    rank2 += 2;
                }
                let mut exchange = 0.0;
                while rank2 <= j2 + j2p {
                    let coefficient = self.angular.w3j(j2, rank2, j2p, -1, 0, 1);
                    exchange +=
                        self.slater([k, kp, kp, k], rank2 / 2, 0)? * coefficient * coefficient;
                    rank2 += 4;
                }
                let direct = self.slater([k, kp, k, kp], 0, 0)?;
                pairs += nqp * (direct - exchange);
            }

            let one_body = self.registry.get(k)?.energy + self.residual_potential(k, k)?;
            energy += nq * (same_shell + pairs + one_body);
        }
        Ok(energy)
    }

    /// Sum of the average energies of every configuration in a group.
    pub fn total_energy_group(&mut self, configurations: &[Configuration]) -> RadialResult<f64> {
        let mut total = 0.0;
        for configuration in configurations {
            total += self.average_energy_config(configuration)?;
        }
        Ok(total)
    }
}

fn grid_of(potential: Option<&Potential>) -> RadialResult<&RadialGrid> {
    potential
        .map(Potential::grid)
        .ok_or(RadialError::GridNotEstablished)
}

/// Fills the weight buffer with `weight(index, r)` and integrates it
/// against the orbital pair.
fn weighted_integral(
    grid: &RadialGrid,
    registry: &OrbitalRegistry,
    workspace: &mut Workspace,
    (k1, k2): (OrbitalHandle, OrbitalHandle),
    kind: IntegralKind,
    weight: impl Fn(usize, f64) -> f64,
) -> RadialResult<f64> {
    let first = registry.table(k1)?;
    let second = registry.table(k2)?;
    let Workspace {
        quadrature,
        running,
        weight: buffer,
        ..
    } = workspace;
    for (index, (slot, r)) in buffer.iter_mut().zip(grid.radii()).enumerate() {
        *slot = weight(index, *r);
    }
    accumulate(grid, buffer, &first, &second, kind, running, quadrature)?;
    Ok(running[running.len() - 1])
}

/// `n!!` for odd `n`; `1` for `n <= 0`.
fn double_factorial(n: i32) -> f64 {
    (1..=n).step_by(2).map(f64::from).product()
}

#[cfg(test)]
mod tests {
    use super::double_factorial;
    use crate::atom::angular::AngularCoefficients;
    use crate::atom::calculation::Calculation;
    use crate::atom::configuration::{Configuration, Shell};
    use crate::atom::quadrature::IntegralKind;
    use crate::common::config::{CalculationOptions, Gauge, GridOptions};
    use crate::common::constants::MOMENT_RANK_OFFSET;
    use crate::domain::RadialError;

    fn hydrogen() -> Calculation {
        let options = CalculationOptions {
            grid: GridOptions {
                r_min: 1.0e-5,
                r_max: 60.0,
                point_count: 1001,
            },
            ..CalculationOptions::default()
        };
        Calculation::new(1.0, options).expect("calculation")
    }

    fn assert_scalar_close(label: &str, expected: f64, actual: f64, abs_tol: f64) {
        assert!(
            (expected - actual).abs() <= abs_tol,
            "{label}: expected {expected}, got {actual}"
        );
    }

    #[test]
    fn double_factorial_of_odd_numbers() {
        assert_eq!(double_factorial(-1), 1.0);
        assert_eq!(double_factorial(1), 1.0);
        assert_eq!(double_factorial(5), 15.0);
        assert_eq!(double_factorial(7), 105.0);
    }

    #[test]
    fn hydrogen_1s_moments_and_f0() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");

        let norm = calculation
            .multipole_radial_nr(MOMENT_RANK_OFFSET, s, s)
            .expect("norm");
        assert_scalar_close("norm", 1.0, norm, 1.0e-6);
        let radius = calculation
            .multipole_radial_nr(MOMENT_RANK_OFFSET + 1, s, s)
            .expect("<r>");
        assert_scalar_close("<r>", 1.5, radius, 1.0e-3);
        let inverse = calculation
            .multipole_radial_nr(-MOMENT_RANK_OFFSET - 1, s, s)
            .expect("<1/r>");
        assert_scalar_close("<1/r>", 1.0, inverse, 1.0e-3);

        // F0(1s,1s) = 5/8 Z
        let f0 = calculation.slater([s, s, s, s], 0, 0).expect("F0");
        assert_scalar_close("F0", 0.625, f0, 2.0e-3);
        assert_eq!(calculation.cache_sizes().0, 1);
        assert_eq!(calculation.slater([s, s, s, s], 0, 1).expect("cached"), f0);
        assert_eq!(calculation.cache_sizes().0, 1);

        let separable = calculation.slater([s, s, s, s], 0, 2).expect("separable");
        assert_scalar_close("separable F0", inverse, separable, 1.0e-12);
    }

    #[test]
    fn unsupported_modes_and_ranks_are_rejected() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
        assert!(matches!(
            calculation.slater([s, s, s, s], 0, 3),
            Err(RadialError::UnsupportedSlaterMode(3))
        ));
        assert!(matches!(
            calculation.multipole_ij(1.0, -1, s, s, IntegralKind::Sum),
            Err(RadialError::UnsupportedMultipoleRank(-1))
        ));
        assert_eq!(calculation.multipole_radial_nr(0, s, s).expect("zero"), 0.0);
        assert_eq!(calculation.multipole_radial(0.1, 0, s, s).expect("zero"), 0.0);
    }

    #[test]
    fn direct_total_of_closed_shell_is_halved_and_exchange_vanishes() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
        let f0 = calculation.slater([s, s, s, s], 0, 0).expect("F0");
        let (direct, exchange) = calculation
            .slater_total([0; 4], [s, s, s, s], 0, 0)
            .expect("total");
        // reduced <1/2||C0||1/2>^2 = 2
        assert_scalar_close("direct", f0, direct, 1.0e-10);
        assert_eq!(exchange, 0.0);
    }

    #[test]
    fn residual_potential_vanishes_for_the_bare_nucleus() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
        let residual = calculation.residual_potential(s, s).expect("residual");
        assert!(residual.abs() < 1.0e-12, "{residual}");
        assert_eq!(calculation.cache_sizes().1, 1);
        calculation.free_residual_array();
        assert_eq!(calculation.cache_sizes().1, 0);
    }

    #[test]
    fn electric_dipole_between_1s_and_2p() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
        let p = calculation.orbital_index(2, 1, 0.0).expect("2p1/2");
        let radial = calculation
            .multipole_radial_nr(MOMENT_RANK_OFFSET + 1, s, p)
            .expect("<1s|r|2p>");
        // |<1s|r|2p>| = 2^7 sqrt(6) / 3^5 for hydrogen
        assert_scalar_close("dipole", 1.290_266, radial.abs(), 2.0e-3);

        let electric = calculation.multipole_radial_nr(-1, s, p).expect("E1");
        let expected = radial.abs() * 2.0_f64.sqrt() * calculation.angular().reduced_cl(1, 2, 1).abs();
        assert_scalar_close("E1", expected, electric.abs(), 1.0e-10);
        assert_eq!(calculation.cache_sizes().2, 2);

        // the relativistic element approaches the length form for small aw
        let aw = 1.0e-3;
        let length = calculation.multipole_radial(aw, -1, s, p).expect("relativistic E1");
        assert!(length.is_finite());
        calculation.free_multipole_array();
        assert_eq!(calculation.cache_sizes().2, 0);
    }

    #[test]
    fn coulomb_gauge_is_cached_separately() {
        let mut calculation = hydrogen();
        let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
        let p = calculation.orbital_index(2, 1, 0.0).expect("2p1/2");
        let babushkin = calculation.multipole_radial(1.0e-2, -1, s, p).expect("babushkin");
        calculation.options.gauge = Gauge::Coulomb;
        let coulomb = calculation.multipole_radial(1.0e-2, -1, s, p).expect("coulomb");
        assert_eq!(calculation.cache_sizes().2, 2);
        assert!(babushkin.is_finite() && coulomb.is_finite());
    }

    #[test]
    fn average_energy_of_hydrogen_is_the_orbital_energy() {
        let mut calculation = hydrogen();
        let configuration = Configuration::new(vec![Shell::new(1, -1, 1)]);
        let energy = calculation.average_energy_config(&configuration).expect("energy");
        assert_scalar_close("E(1s)", -0.5, energy, 1.0e-4);
        let group = calculation
            .total_energy_group(&[configuration.clone(), configuration])
            .expect("group");
        assert_scalar_close("group", 2.0 * energy, group, 1.0e-12);
    }
}
