//! The calculation context. Grid, potential, orbitals, integral caches and
//! the solver/angular collaborators live together here, and every radial
//! operation is a method on it. The grid is established lazily by the
//! first operation that needs it and is immutable afterwards.

use super::angular::{AngularCoefficients, RacahAlgebra};
use super::cache::IntegralCaches;
use super::orbital::{Orbital, OrbitalHandle, OrbitalRegistry};
use super::potential::Potential;
use super::solver::{NumerovSolver, RadialSolver};
use super::workspace::Workspace;
use crate::common::config::{CalculationOptions, OptionsError};
use crate::common::constants::{FINE_STRUCTURE_CONST2, TWO_PI};
use crate::domain::{RadialError, RadialResult};
use crate::numerics::RadialGrid;
use tracing::{debug, trace};

#[derive(Debug)]
pub struct Calculation<S = NumerovSolver, A = RacahAlgebra> {
    pub(crate) options: CalculationOptions,
    pub(crate) nuclear_charge: f64,
    pub(crate) potential: Option<Potential>,
    pub(crate) registry: OrbitalRegistry,
    pub(crate) caches: IntegralCaches,
    pub(crate) workspace: Workspace,
    pub(crate) solver: S,
    pub(crate) angular: A,
}

impl Calculation {
    /// Context with the reference Numerov solver and Racah-formula angular
    /// coefficients.
    pub fn new(nuclear_charge: f64, options: CalculationOptions) -> RadialResult<Self> {
        Self::with_collaborators(nuclear_charge, options, NumerovSolver::new(), RacahAlgebra)
    }
}

impl<S: RadialSolver, A: AngularCoefficients> Calculation<S, A> {
    pub fn with_collaborators(
        nuclear_charge: f64,
        options: CalculationOptions,
        solver: S,
        angular: A,
    ) -> RadialResult<Self> {
        options.validate()?;
        if !nuclear_charge.is_finite() || nuclear_charge <= 0.0 {
            return Err(OptionsError::InvalidValue {
                field: "nuclearCharge",
                value: nuclear_charge,
            }
            .into());
        }
        Ok(Self {
            options,
            nuclear_charge,
            potential: None,
            registry: OrbitalRegistry::new(),
            caches: IntegralCaches::new(),
            workspace: Workspace::new(0),
            solver,
            angular,
        })
    }

    pub fn options(&self) -> &CalculationOptions {
        &self.options
    }

    pub fn nuclear_charge(&self) -> f64 {
        self.nuclear_charge
    }

    pub fn angular(&self) -> &A {
        &self.angular
    }

    pub fn set_optimize_control(&mut self, tolerance: f64, max_iterations: usize) -> RadialResult<()> {
        let mut options = self.options;
        options.tolerance = tolerance;
        options.max_iterations = max_iterations;
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// `0` turns the extra tail screening off.
    pub fn set_screening(&mut self, screening: i32) -> RadialResult<()> {
        let mut options = self.options;
        options.screening = screening;
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Largest exchange rank, doubled.
    pub fn set_max_rank(&mut self, max_rank: i32) -> RadialResult<()> {
        let mut options = self.options;
        options.max_rank = max_rank;
        options.validate()?;
        self.options = options;
        Ok(())
    }

    pub fn set_radial_grid(&mut self, r_min: f64, r_max: f64) -> RadialResult<()> {
        if self.potential.is_some() {
            return Err(RadialError::GridLocked);
        }
        let mut options = self.options;
        options.grid.r_min = r_min;
        options.grid.r_max = r_max;
        options.validate()?;
        self.options = options;
        Ok(())
    }

    /// Phase advance per sample pair above which asymptotic products are
    /// integrated by the spline-in-phase rule.
    pub fn set_phase_threshold(&mut self, threshold: f64) {
        self.workspace.set_phase_threshold(threshold);
    }

    pub fn is_grid_established(&self) -> bool {
        self.potential.is_some()
    }

    /// Builds the grid, the bare-nucleus potential and the scratch arena on
    /// first use.
    pub fn ensure_grid(&mut self) -> RadialResult<()> {
        if self.potential.is_some() {
            return Ok(());
        }
        let grid_options = self.options.grid;
        let grid = RadialGrid::new(grid_options.r_min, grid_options.r_max, grid_options.point_count)?;
        debug!(
            r_min = grid.r_min(),
            r_max = grid.r_max(),
            points = grid.len(),
            "radial grid established"
        );
        let threshold = self.workspace.phase_threshold();
        self.workspace = Workspace::new(grid.len());
        self.workspace.set_phase_threshold(threshold);
        self.potential = Some(Potential::new(grid, self.nuclear_charge));
        Ok(())
    }

    pub fn potential(&self) -> RadialResult<&Potential> {
        self.potential.as_ref().ok_or(RadialError::GridNotEstablished)
    }

    pub fn grid(&self) -> RadialResult<&RadialGrid> {
        Ok(self.potential()?.grid())
    }

    /// Outer edge of the grid, or of the configured grid before it exists.
    pub fn r_max(&self) -> f64 {
        self.potential
            .as_ref()
            .map_or(self.options.grid.r_max, |potential| potential.grid().r_max())
    }

    pub fn residual_z(&self, extra_screening: bool) -> RadialResult<f64> {
        Ok(self.potential()?.residual_z(extra_screening))
    }

    /// Continua and shells at or above the screening threshold see `Vtail`.
    pub(crate) fn uses_tail(&self, n: i32) -> bool {
        let screening = self.options.screening;
        screening > 0 && (n <= 0 || n >= screening)
    }

    /// Solves `handle` on the current potential and drops every cached
    /// integral, since the orbital's data changed. A failed solve leaves the
    /// record untouched.
    pub fn solve_dirac(&mut self, handle: OrbitalHandle) -> RadialResult<()> {
        self.ensure_grid()?;
        let mut orbital = self.registry.get(handle)?.clone();
        self.solve_detached(&mut orbital)?;
        *self.registry.get_mut(handle)? = orbital;
        self.caches.clear();
        Ok(())
    }

    /// Finds or solves the orbital. A record whose wavefunction was released
    /// is solved again in place; a new continuum gets the next negative `n`.
    /// Nothing is registered when the solve fails.
    pub fn orbital_index(&mut self, n: i32, kappa: i32, energy: f64) -> RadialResult<OrbitalHandle> {
        self.ensure_grid()?;
        if let Some(handle) = self.registry.find_solvable(n, kappa, energy) {
            if !self.registry.get(handle)?.is_resident() {
                self.solve_dirac(handle)?;
            }
            return Ok(handle);
        }
        let mut orbital = Orbital::new(n, kappa, energy);
        self.solve_detached(&mut orbital)?;
        if n == 0 {
            orbital.n = self.registry.next_continuum_n();
        }
        let handle = self.registry.push_raw(orbital);
        self.caches.clear();
        Ok(handle)
    }

    /// Runs the solver on an orbital that is not borrowed from the registry.
    fn solve_detached(&mut self, orbital: &mut Orbital) -> RadialResult<()> {
        let tolerance = 0.1 * self.options.tolerance;
        let tail = self.uses_tail(orbital.n);
        let potential = self.potential.as_ref().ok_or(RadialError::GridNotEstablished)?;
        self.solver
            .solve(orbital, potential, tail, tolerance)
            .map_err(|source| RadialError::Solver {
                n: orbital.n,
                kappa: orbital.kappa,
                energy: orbital.energy,
                source,
            })?;
        trace!(
            n = orbital.n,
            kappa = orbital.kappa,
            energy = orbital.energy,
            ilast = orbital.ilast,
            "orbital solved"
        );
        Ok(())
    }

    pub fn orbital_exists(&self, n: i32, kappa: i32, energy: f64) -> Option<OrbitalHandle> {
        self.registry.find(n, kappa, energy)
    }

    /// Registers an orbital built outside the solver. A resident
    /// wavefunction must span the grid, which gets established here, and a
    /// continuum one must end on whole asymptotic pairs.
    pub fn add_orbital(&mut self, orbital: Orbital) -> RadialResult<OrbitalHandle> {
        if let Some(wavefunction) = &orbital.wavefunction {
            self.ensure_grid()?;
            let points = self.grid()?.len();
            for (name, got) in [
                ("orbital large component", wavefunction.large.len()),
                ("orbital small component", wavefunction.small.len()),
            ] {
                if got != points {
                    return Err(RadialError::LengthMismatch {
                        name,
                        need: points,
                        got,
                    });
                }
            }
            orbital.table(self.registry.len())?;
        }
        Ok(self.registry.push(orbital))
    }

    pub fn orbital(&self, handle: OrbitalHandle) -> RadialResult<&Orbital> {
        self.registry.get(handle)
    }

    pub fn orbitals(&self) -> &OrbitalRegistry {
        &self.registry
    }

    pub fn free_orbital(&mut self, handle: OrbitalHandle) -> RadialResult<()> {
        self.registry.release(handle)
    }

    pub fn free_all_continua(&mut self) -> usize {
        self.free_released(None)
    }

    /// Releases the continua within `1e-3` of `energy`.
    pub fn free_continua(&mut self, energy: f64) -> usize {
        self.free_released(Some(energy))
    }

    fn free_released(&mut self, energy: Option<f64>) -> usize {
        let released = self.registry.release_continua(energy);
        if released > 0 {
            self.caches.clear();
        }
        released
    }

    pub fn num_orbitals(&self) -> usize {
        self.registry.len()
    }

    pub fn num_bounds(&self) -> usize {
        self.registry.num_bounds()
    }

    pub fn num_continua(&self) -> usize {
        self.registry.num_continua()
    }

    /// Phase of a continuum relative to the Coulomb-distorted plane wave
    /// `ke r + (z/ke) ln(2 ke r)` at the last asymptotic sample, in
    /// `[0, 2π)`. Bound orbitals have none and return `0`.
    pub fn phase_shift(&mut self, handle: OrbitalHandle) -> RadialResult<f64> {
        let potential = self.potential.as_ref().ok_or(RadialError::GridNotEstablished)?;
        let z = potential.residual_z(true);
        let radii = potential.grid().radii();
        let orbital = self.registry.get_mut(handle)?;
        if !orbital.is_continuum() {
            return Ok(0.0);
        }
        if let Some(phase) = orbital.phase {
            return Ok(phase);
        }
        let wavefunction = orbital
            .wavefunction
            .as_ref()
            .ok_or(RadialError::OrbitalUnloaded { handle })?;
        let points = wavefunction.len();
        if orbital.ilast + 2 >= points {
            return Err(RadialError::InvalidAsymptoticLayout {
                ilast: orbital.ilast,
                points,
            });
        }

        let energy = orbital.energy;
        let relativistic = FINE_STRUCTURE_CONST2 * energy;
        let ke = (2.0 * energy * (1.0 + 0.5 * relativistic)).sqrt();
        let coulomb = (1.0 + relativistic) * z / ke;
        let radius = radii[points - 2];
        let argument = ke * radius;
        let phase = (wavefunction.large[points - 1] - argument - coulomb * (2.0 * argument).ln())
            .rem_euclid(TWO_PI);
        orbital.phase = Some(phase);
        Ok(phase)
    }
}
