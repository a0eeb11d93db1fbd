//! Multipole potential of an orbital-pair density, stored as
//! `r Y_k(r) = r^{-k} ∫_0^r t^k ρ dt + r^{k+1} ∫_r^∞ t^{-(k+1)} ρ dt`.
//!
//! The inward term is weighted by `(r_cut/r)^{k+1}` rather than raw powers.
//! For `k > 2` the cutoff is where the density first reaches `1e-3` of its
//! peak; inside it the inward term is carried as `(r/r_cut)^{k+1}` times
//! the tail integral beyond the cutoff.

use super::orbital::OrbitalTable;
use super::quadrature::{IntegralKind, accumulate};
use super::workspace::Workspace;
use crate::domain::{RadialError, RadialResult};
use crate::numerics::RadialGrid;

const CUTOFF_FRACTION: f64 = 1.0e-3;

/// Fills `workspace.yk` with `r Y_k`.
pub fn fill_yk(
    grid: &RadialGrid,
    k: i32,
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    workspace: &mut Workspace,
) -> RadialResult<()> {
    if k < 0 {
        return Err(RadialError::UnsupportedMultipoleRank(k));
    }
    let Workspace {
        quadrature,
        weight,
        inward,
        yk,
        ..
    } = workspace;
    let radii = grid.radii();
    let points = radii.len();

    for (slot, radius) in weight.iter_mut().zip(radii) {
        *slot = radius.powi(k);
    }
    accumulate(grid, weight, first, second, kind, yk, quadrature)?;
    for (value, scale) in yk.iter_mut().zip(weight.iter()) {
        *value /= scale;
    }

    let cutoff = if k > 2 {
        cutoff_index(radii, first, second)
    } else {
        0
    };
    let r_cut = radii[cutoff];
    for (index, slot) in weight.iter_mut().enumerate() {
        *slot = if index < cutoff {
            0.0
        } else {
            (r_cut / radii[index]).powi(k + 1)
        };
    }
    accumulate(grid, weight, first, second, kind, inward, quadrature)?;

    let total = inward[points - 1];
    for index in cutoff..points {
        yk[index] += (total - inward[index]) / weight[index];
    }
    let beyond_cutoff = total - inward[cutoff];
    for index in 0..cutoff {
        yk[index] += (radii[index] / r_cut).powi(k + 1) * beyond_cutoff;
    }
    Ok(())
}

/// Same as [`fill_yk`] but copies the result into `out`.
pub fn build_yk(
    grid: &RadialGrid,
    k: i32,
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    out: &mut [f64],
    workspace: &mut Workspace,
) -> RadialResult<()> {
    if out.len() != grid.len() {
        return Err(RadialError::LengthMismatch {
            name: "yk output",
            need: grid.len(),
            got: out.len(),
        });
    }
    fill_yk(grid, k, first, second, kind, workspace)?;
    out.copy_from_slice(&workspace.yk);
    Ok(())
}

fn cutoff_index(radii: &[f64], first: &OrbitalTable<'_>, second: &OrbitalTable<'_>) -> usize {
    let end = first.ilast.min(second.ilast).min(radii.len() - 1);
    let density = |index: usize| (first.large[index] * second.large[index] * radii[index]).abs();
    let peak = (0..=end).map(density).fold(0.0, f64::max);
    let floor = CUTOFF_FRACTION * peak;
    (0..end).find(|&index| density(index) > floor).unwrap_or(end)
}
