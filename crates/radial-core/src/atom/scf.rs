//! Self-consistent optimization of the average-configuration potential.
//!
//! Each iteration rebuilds `U` from the current orbitals (Hartree term plus
//! a local exchange correction averaged over the configuration), relaxes it
//! against the previous one, and re-solves every shell. The first
//! iterations over-screen the nucleus by a factor that is halved each time
//! until it drops out.

use super::angular::AngularCoefficients;
use super::calculation::Calculation;
use super::configuration::{AverageConfig, AverageShell, ConfigurationAverager};
use super::orbital::{Orbital, OrbitalHandle, OrbitalTable};
use super::solver::RadialSolver;
use super::yk::fill_yk;
use super::quadrature::IntegralKind;
use crate::common::config::ConvergenceMetric;
use crate::common::constants::POTENTIAL_MAX_RANK2;
use crate::domain::{RadialError, RadialResult, j2_from_kappa, l2_from_kappa};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Annealing charge below which over-screening is switched off.
const ANNEAL_FLOOR: f64 = 1.0e-3;
/// Smallest tail-screening scale, in shells squared.
const TAIL_SCALE_FLOOR: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ScfStatus {
    Converged,
    MaxIterExceeded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScfOutcome {
    pub status: ScfStatus,
    pub iterations: usize,
    /// Largest per-shell change of the last iteration.
    pub tolerance: f64,
    /// Electronic charge seen at the grid edge, `r (U + Vc) + Z`.
    pub residual_charge: f64,
    pub lambda: f64,
}

impl ScfOutcome {
    pub fn converged(&self) -> bool {
        self.status == ScfStatus::Converged
    }
}

/// Change of one shell between two iterations.
pub fn orbital_change(
    metric: ConvergenceMetric,
    old_energy: f64,
    old_ilast: usize,
    old_large: &[f64],
    orbital: &Orbital,
) -> f64 {
    let energy_change = if orbital.energy != 0.0 {
        (1.0 - old_energy / orbital.energy).abs()
    } else {
        old_energy.abs()
    };
    if metric == ConvergenceMetric::EnergyOnly {
        return energy_change;
    }
    let Some(wavefunction) = orbital.wavefunction.as_ref() else {
        return energy_change;
    };
    let end = old_ilast
        .min(orbital.ilast)
        .min(old_large.len().saturating_sub(1))
        .min(wavefunction.len().saturating_sub(1));
    let (peak, difference) = wavefunction.large[..=end]
        .iter()
        .zip(&old_large[..=end])
        .fold((0.0_f64, 0.0_f64), |(peak, difference), (new, old)| {
            (peak.max(new.abs()), difference.max((new - old).abs()))
        });
    let wave_change = if peak > 0.0 { difference / peak } else { 0.0 };
    energy_change.max(wave_change)
}

struct ResidentShell<'a> {
    shell: AverageShell,
    table: OrbitalTable<'a>,
}

impl<S: RadialSolver, A: AngularCoefficients> Calculation<S, A> {
    /// Rebuilds the potential from the resident shells of `config`. With no
    /// resident shell, or at most one electron, it falls back to the
    /// parametric screening potential.
    pub fn set_potential(&mut self, config: &AverageConfig) -> RadialResult<()> {
        self.ensure_grid()?;
        let electrons = config.electron_count();
        let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
        potential.electron_count = electrons;
        let potential = &*potential;
        let grid = potential.grid();
        let points = grid.len();

        let mut resident = Vec::new();
        let mut density = vec![0.0; points];
        let mut jmax = 0;
        for shell in config.shells() {
            let Some(handle) = self.registry.find(shell.n, shell.kappa, 0.0) else {
                continue;
            };
            let Ok(table) = self.registry.table(handle) else {
                continue;
            };
            let end = table.ilast.min(points - 1);
            for m in 0..=end {
                density[m] += shell.nq * (table.large[m].powi(2) + table.small[m].powi(2));
            }
            jmax = jmax.max(end);
            resident.push(ResidentShell { shell: *shell, table });
        }

        if resident.is_empty() || electrons <= 1.0 {
            let radii = grid.radii();
            let last = points - 1;
            let history = (0..points)
                .map(|j| (potential.u[j] + potential.vc[j]) * radii[j] + potential.z[last])
                .collect();
            let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
            potential.record_history(history);
            potential.set_vc();
            potential.set_initial_u();
            return Ok(());
        }

        let mut r_potential = vec![0.0; points];
        for (i, one) in resident.iter().enumerate() {
            let nq1 = one.shell.nq;
            let j1 = j2_from_kappa(one.shell.kappa);
            let kl1 = l2_from_kappa(one.shell.kappa);

            let kmax = (2 * j1).min(POTENTIAL_MAX_RANK2);
            for k in (0..=kmax).step_by(2) {
                let t = k / 2;
                if t % 2 != 0 {
                    continue;
                }
                fill_yk(grid, t, &one.table, &one.table, IntegralKind::Sum, &mut self.workspace)?;
                let coefficient = if t > 0 {
                    let w3j = self.angular.w3j(j1, k, j1, -1, 0, 1);
                    w3j * w3j * f64::from(j1 + 1) / f64::from(j1)
                } else {
                    0.0
                };
                let yk = &self.workspace.yk;
                for m in 1..=jmax {
                    if density[m] == 0.0 {
                        continue;
                    }
                    let b = one.table.large[m].powi(2) + one.table.small[m].powi(2);
                    if t == 0 {
                        r_potential[m] += nq1 * yk[m] - nq1 * yk[m] * b / density[m];
                    } else {
                        r_potential[m] -= nq1 * (nq1 - 1.0) * coefficient * yk[m] * b / density[m];
                    }
                }
            }

            for two in &resident[..i] {
                let nq2 = two.shell.nq;
                let j2 = j2_from_kappa(two.shell.kappa);
                let kl2 = l2_from_kappa(two.shell.kappa);
                let mut kmin = (j1 - j2).abs();
                if kmin % 2 != 0 {
                    kmin += 1;
                }
                let kmax = (j1 + j2).min(POTENTIAL_MAX_RANK2);
                for k in (kmin..=kmax).step_by(2) {
                    if ((k + kl1 + kl2) / 2) % 2 != 0 {
                        continue;
                    }
                    fill_yk(grid, k / 2, &one.table, &two.table, IntegralKind::Sum, &mut self.workspace)?;
                    let w3j = self.angular.w3j(j1, k, j2, -1, 0, 1);
                    let coefficient = nq1 * nq2 * w3j * w3j;
                    let yk = &self.workspace.yk;
                    for m in 1..=jmax {
                        if density[m] == 0.0 {
                            continue;
                        }
                        let b = one.table.large[m] * two.table.large[m]
                            + one.table.small[m] * two.table.small[m];
                        r_potential[m] -= coefficient * yk[m] * b / density[m];
                    }
                }
            }
        }

        r_potential[0] = r_potential[1];
        let outer = r_potential[jmax];
        r_potential[jmax + 1..].fill(outer);

        let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
        potential.adjust_screening_params(&mut r_potential);
        potential.set_vc();
        let radii = potential.grid().radii().to_vec();
        for (j, r) in radii.iter().enumerate() {
            potential.u[j] = (r_potential[j] - potential.z[j] - potential.vc[j] * r) / r;
        }
        Ok(())
    }

    /// Iterates the potential to self-consistency for `config`. Missing
    /// shells are created on the fly; reaching the iteration cap is reported
    /// in the outcome rather than as an error.
    pub fn optimize_radial(&mut self, config: &AverageConfig) -> RadialResult<ScfOutcome> {
        self.caches.clear();
        self.ensure_grid()?;
        let electrons = config.electron_count();
        let target = self.options.tolerance;
        let max_iterations = self.options.max_iterations;
        let metric = self.options.convergence_metric;

        let mut anneal = {
            let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
            potential.electron_count = electrons;
            potential.set_z(0.0);
            let last = potential.len() - 1;
            let nuclear = potential.z[last];
            let mut z = nuclear;
            if electrons > 0.0 {
                z -= electrons - 1.0;
            }
            potential.a = 0.0;
            potential.lambda = 0.5 * z;
            if electrons > 2.0 * z { electrons / nuclear } else { 0.0 }
        };

        let mut tolerance = 1.0;
        let mut iterations = 0;
        while tolerance > target || anneal > 0.0 {
            if iterations >= max_iterations {
                break;
            }
            {
                let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
                if anneal > 0.0 && anneal < ANNEAL_FLOOR {
                    anneal = 0.0;
                    potential.set_z(0.0);
                } else {
                    potential.set_z(anneal);
                    anneal *= 0.5;
                }
            }
            self.set_potential(config)?;

            tolerance = 0.0;
            for shell in config.shells() {
                let (handle, previous) = self.solve_shell(shell.n, shell.kappa)?;
                let Some((old_energy, old_ilast, old_large)) = previous else {
                    tolerance = 1.0;
                    continue;
                };
                let orbital = self.registry.get(handle)?;
                tolerance = tolerance.max(orbital_change(
                    metric, old_energy, old_ilast, &old_large, orbital,
                ));
            }
            iterations += 1;
            debug!(iteration = iterations, tolerance, anneal, "scf iteration");
        }

        let screening = f64::from(self.options.screening);
        let potential = self.potential.as_mut().ok_or(RadialError::GridNotEstablished)?;
        if iterations == 0 {
            potential.set_vc();
            potential.set_initial_u();
        }
        if screening > 0.0 {
            let scale = (screening * screening).max(TAIL_SCALE_FLOOR);
            potential.lambda_tail = potential.lambda / scale;
            potential.a_tail = potential.a / scale;
        } else {
            potential.lambda_tail = 0.0;
            potential.a_tail = 0.0;
        }
        potential.set_vtail();

        let status = if tolerance > target || anneal > 0.0 {
            ScfStatus::MaxIterExceeded
        } else {
            ScfStatus::Converged
        };
        let outcome = ScfOutcome {
            status,
            iterations,
            tolerance,
            residual_charge: potential.asymptotic_charge(),
            lambda: potential.lambda,
        };
        match status {
            ScfStatus::Converged => info!(
                iterations,
                tolerance,
                residual_charge = outcome.residual_charge,
                "radial optimization converged"
            ),
            ScfStatus::MaxIterExceeded => warn!(
                iterations,
                tolerance,
                "maximum iteration reached in radial optimization"
            ),
        }
        self.caches.clear();
        Ok(outcome)
    }

    /// Averages the weighted groups and optimizes on the result.
    pub fn optimize_radial_groups(
        &mut self,
        averager: &impl ConfigurationAverager,
        groups: &[usize],
        weights: &[f64],
    ) -> RadialResult<ScfOutcome> {
        let config = averager.average_config(groups, weights)?;
        self.optimize_radial(&config)
    }

    /// Solves the shell on the current potential, creating it when missing.
    /// Returns the handle with the previous energy, `ilast` and large
    /// component when the shell was resident. A failed solve leaves the
    /// previous iterate in place.
    fn solve_shell(
        &mut self,
        n: i32,
        kappa: i32,
    ) -> RadialResult<(OrbitalHandle, Option<(f64, usize, Vec<f64>)>)> {
        let Some(handle) = self.registry.find(n, kappa, 0.0) else {
            return Ok((self.orbital_index(n, kappa, 0.0)?, None));
        };
        let orbital = self.registry.get(handle)?;
        let previous = orbital
            .wavefunction
            .as_ref()
            .map(|wavefunction| (orbital.energy, orbital.ilast, wavefunction.large.clone()));
        self.solve_dirac(handle)?;
        Ok((handle, previous))
    }
}
