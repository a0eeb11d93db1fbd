//! Inner products of two orbitals over a sampled weight function.
//!
//! The grid splits at the two `ilast` values. Where both orbitals are
//! tabulated the product is integrated pointwise by Newton-Cotes. Where one
//! is tabulated and the other asymptotic, or both asymptotic, the
//! asymptotic form `P = A sin φ`, `Q = c cos φ + s sin φ` turns the
//! integrand into `x sin Φ + y cos Φ` handed to the oscillatory integrator
//! (twice, for `φ1 + φ2` and `φ1 - φ2`, when both are asymptotic).

use super::orbital::{AsymptoticSample, OrbitalTable};
use super::oscillatory::{SinCosSamples, integrate_sin_cos};
use super::workspace::{QuadratureScratch, Workspace};
use crate::domain::{RadialError, RadialResult};
use crate::numerics::{RadialGrid, newton_cotes_running};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegralKind {
    /// `P1 P2 + Q1 Q2`
    Sum,
    /// `P1 P2`
    Large,
    /// `Q1 Q2`
    Small,
    /// `P1 Q2 + Q1 P2`
    CrossSum,
    /// `P1 Q2 - Q1 P2`
    CrossDifference,
}

impl IntegralKind {
    /// Decodes an integer type code; a negative code requests the running
    /// integral and `0` means `1`.
    pub fn from_code(code: i32) -> RadialResult<(Self, bool)> {
        let kind = match code.abs() {
            0 | 1 => Self::Sum,
            2 => Self::Large,
            3 => Self::Small,
            4 => Self::CrossSum,
            5 => Self::CrossDifference,
            _ => return Err(RadialError::UnsupportedIntegralType(code)),
        };
        Ok((kind, code < 0))
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Sum => 1,
            Self::Large => 2,
            Self::Small => 3,
            Self::CrossSum => 4,
            Self::CrossDifference => 5,
        }
    }

    fn combine(self, p1: f64, q1: f64, p2: f64, q2: f64) -> f64 {
        match self {
            Self::Sum => p1 * p2 + q1 * q2,
            Self::Large => p1 * p2,
            Self::Small => q1 * q2,
            Self::CrossSum => p1 * q2 + q1 * p2,
            Self::CrossDifference => p1 * q2 - q1 * p2,
        }
    }

    /// `(sin, cos)` coefficients of the product of a tabulated `(P, Q)` with
    /// an asymptotic sample. `tabulated_first` tells whether the tabulated
    /// orbital is operand 1.
    fn mixed(self, p: f64, q: f64, sample: &AsymptoticSample, tabulated_first: bool) -> (f64, f64) {
        let a = sample.amplitude;
        let c = sample.cos_coeff;
        let s = sample.sin_coeff;
        let (sin_part, cos_part) = match self {
            Self::Sum => (p * a + q * s, q * c),
            Self::Large => (p * a, 0.0),
            Self::Small => (q * s, q * c),
            Self::CrossSum => (p * s + q * a, p * c),
            Self::CrossDifference => (p * s - q * a, p * c),
        };
        if self == Self::CrossDifference && !tabulated_first {
            (-sin_part, -cos_part)
        } else {
            (sin_part, cos_part)
        }
    }

    /// Coefficients of `sin(φ1 + φ2)`, `cos(φ1 + φ2)` and of
    /// `sin(φ1 - φ2)`, `cos(φ1 - φ2)` for two asymptotic samples.
    fn asymptotic(self, one: &AsymptoticSample, two: &AsymptoticSample) -> [f64; 4] {
        let (a1, c1, s1) = (one.amplitude, one.cos_coeff, one.sin_coeff);
        let (a2, c2, s2) = (two.amplitude, two.cos_coeff, two.sin_coeff);
        let half = 0.5;
        match self {
            Self::Sum => [
                half * (c1 * s2 + s1 * c2),
                half * (c1 * c2 - s1 * s2 - a1 * a2),
                half * (s1 * c2 - c1 * s2),
                half * (c1 * c2 + s1 * s2 + a1 * a2),
            ],
            Self::Large => [0.0, -half * a1 * a2, 0.0, half * a1 * a2],
            Self::Small => [
                half * (c1 * s2 + s1 * c2),
                half * (c1 * c2 - s1 * s2),
                half * (s1 * c2 - c1 * s2),
                half * (c1 * c2 + s1 * s2),
            ],
            Self::CrossSum => [
                half * (a1 * c2 + a2 * c1),
                -half * (a1 * s2 + a2 * s1),
                half * (a1 * c2 - a2 * c1),
                half * (a1 * s2 + a2 * s1),
            ],
            Self::CrossDifference => [
                half * (a1 * c2 - a2 * c1),
                -half * (a1 * s2 - a2 * s1),
                half * (a1 * c2 + a2 * c1),
                half * (a1 * s2 - a2 * s1),
            ],
        }
    }
}

/// `∫ f (orbital product) dr` over the whole grid.
pub fn integrate(
    grid: &RadialGrid,
    f: &[f64],
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    workspace: &mut Workspace,
) -> RadialResult<f64> {
    let Workspace {
        quadrature,
        running,
        ..
    } = workspace;
    accumulate(grid, f, first, second, kind, running, quadrature)?;
    Ok(running[running.len() - 1])
}

/// Running integral written to every grid point of `out`.
pub fn integrate_running(
    grid: &RadialGrid,
    f: &[f64],
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    out: &mut [f64],
    workspace: &mut Workspace,
) -> RadialResult<()> {
    accumulate(grid, f, first, second, kind, out, &mut workspace.quadrature)
}

pub(crate) fn accumulate(
    grid: &RadialGrid,
    f: &[f64],
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    out: &mut [f64],
    scratch: &mut QuadratureScratch,
) -> RadialResult<()> {
    let points = grid.len();
    check_length("weight function", points, f.len())?;
    check_length("running integral", points, out.len())?;
    check_length("first orbital", points, first.len())?;
    check_length("second orbital", points, second.len())?;
    check_length("quadrature scratch", points, scratch.integrand.len())?;

    let jacobian = grid.dr_drho();
    let common = first.ilast.min(second.ilast).min(points - 1);
    for i in 0..=common {
        scratch.integrand[i] =
            kind.combine(first.large[i], first.small[i], second.large[i], second.small[i])
                * f[i]
                * jacobian[i];
    }
    newton_cotes_running(&scratch.integrand[..=common], 0.0, &mut out[..=common])?;

    let ends_bound = |table: &OrbitalTable<'_>| table.ilast == common && !table.continuum;
    let start = common + 1;
    if ends_bound(first) || ends_bound(second) || start + 1 >= points {
        hold_from(out, common);
        return Ok(());
    }

    let junction = Junction {
        running: out[common],
        previous: common.checked_sub(1).map(|i| scratch.integrand[i]),
        last: scratch.integrand[common],
    };
    let last = if first.ilast == second.ilast {
        both_asymptotic(grid, f, first, second, kind, start, Some(junction), out, scratch)?
    } else {
        let (tabulated, asymptotic, tabulated_first) = if first.ilast > second.ilast {
            (first, second, true)
        } else {
            (second, first, false)
        };
        let closing = one_asymptotic(
            grid,
            f,
            tabulated,
            asymptotic,
            tabulated_first,
            kind,
            start,
            junction,
            out,
            scratch,
        )?;
        if tabulated.continuum && closing == tabulated.ilast + 1 && closing + 1 < points {
            both_asymptotic(grid, f, first, second, kind, closing, None, out, scratch)?
        } else {
            closing
        }
    };
    hold_from(out, last);
    Ok(())
}

/// Running value and the last two tabulated integrand samples (per unit
/// index) where the tabulated range hands over to asymptotic samples.
#[derive(Debug, Clone, Copy)]
struct Junction {
    running: f64,
    previous: Option<f64>,
    last: f64,
}

impl Junction {
    /// Running value one grid step later, given the integrand there. The
    /// step is integrated on the parabola through `previous`, `last` and
    /// `next`.
    fn across(self, next: f64) -> f64 {
        let step = match self.previous {
            Some(previous) => (-previous + 8.0 * self.last + 5.0 * next) / 12.0,
            None => 0.5 * (self.last + next),
        };
        self.running + step
    }
}

/// Tabulated orbital against an asymptotic one, from `start` until one
/// sample past the end of the tabulated range. Returns the last sample index.
#[allow(clippy::too_many_arguments)]
fn one_asymptotic(
    grid: &RadialGrid,
    f: &[f64],
    tabulated: &OrbitalTable<'_>,
    asymptotic: &OrbitalTable<'_>,
    tabulated_first: bool,
    kind: IntegralKind,
    start: usize,
    junction: Junction,
    out: &mut [f64],
    scratch: &mut QuadratureScratch,
) -> RadialResult<usize> {
    let points = grid.len();
    let QuadratureScratch {
        samples,
        sum_running,
        sin_cos,
        threshold,
        ..
    } = scratch;
    samples.reset(start);
    let mut index = start;
    while index + 1 < points {
        let sample = asymptotic.asymptotic(index);
        let (p, q) = tabulated.components(index);
        let (sin_part, cos_part) = kind.mixed(p, q, &sample, tabulated_first);
        samples.push(
            sin_part * f[index],
            cos_part * f[index],
            sample.phase,
            sample.phase_derivative(),
        );
        if index > tabulated.ilast {
            break;
        }
        index += 2;
    }

    let baseline = junction.across(samples.value(0) * grid.dr_drho()[start]);
    integrate_sin_cos(grid, samples, baseline, *threshold, sum_running, sin_cos)?;
    Ok(scatter(samples, sum_running, None, out))
}

/// Both orbitals asymptotic from `start` to the end of the grid. With a
/// `junction` the region follows the tabulated range directly; otherwise it
/// continues from `out[start]`.
#[allow(clippy::too_many_arguments)]
fn both_asymptotic(
    grid: &RadialGrid,
    f: &[f64],
    first: &OrbitalTable<'_>,
    second: &OrbitalTable<'_>,
    kind: IntegralKind,
    start: usize,
    junction: Option<Junction>,
    out: &mut [f64],
    scratch: &mut QuadratureScratch,
) -> RadialResult<usize> {
    let points = grid.len();
    let QuadratureScratch {
        samples,
        difference,
        sum_running,
        difference_running,
        sin_cos,
        threshold,
        ..
    } = scratch;
    samples.reset(start);
    difference.reset(start);
    for index in (start..points - 1).step_by(2) {
        let one = first.asymptotic(index);
        let two = second.asymptotic(index);
        let [sum_sin, sum_cos, diff_sin, diff_cos] = kind.asymptotic(&one, &two);
        let weight = f[index];
        samples.push(
            sum_sin * weight,
            sum_cos * weight,
            one.phase + two.phase,
            one.phase_derivative() + two.phase_derivative(),
        );
        difference.push(
            diff_sin * weight,
            diff_cos * weight,
            one.phase - two.phase,
            one.phase_derivative() - two.phase_derivative(),
        );
    }

    let baseline = match junction {
        Some(junction) => {
            junction.across((samples.value(0) + difference.value(0)) * grid.dr_drho()[start])
        }
        None => out[start],
    };
    integrate_sin_cos(grid, samples, baseline, *threshold, sum_running, sin_cos)?;
    integrate_sin_cos(grid, difference, 0.0, *threshold, difference_running, sin_cos)?;
    Ok(scatter(samples, sum_running, Some(difference_running.as_slice()), out))
}

/// Writes sample values to their grid points and averages the odd points
/// in between. Returns the grid index of the last sample.
fn scatter(
    samples: &SinCosSamples,
    running: &[f64],
    extra: Option<&[f64]>,
    out: &mut [f64],
) -> usize {
    for (m, value) in running.iter().enumerate() {
        let index = samples.grid_index(m);
        out[index] = value + extra.map_or(0.0, |extra| extra[m]);
        if m > 0 {
            out[index - 1] = 0.5 * (out[index - 2] + out[index]);
        }
    }
    samples.grid_index(running.len().saturating_sub(1))
}

fn hold_from(out: &mut [f64], last: usize) {
    let value = out[last];
    for slot in out.iter_mut().skip(last + 1) {
        *slot = value;
    }
}

fn check_length(name: &'static str, need: usize, got: usize) -> RadialResult<()> {
    if need != got {
        return Err(RadialError::LengthMismatch { name, need, got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{IntegralKind, Junction, integrate, integrate_running};
    use crate::atom::orbital::OrbitalTable;
    use crate::atom::workspace::Workspace;
    use crate::domain::RadialError;
    use crate::numerics::RadialGrid;

    fn hydrogen_1s(grid: &RadialGrid) -> (Vec<f64>, Vec<f64>) {
        let large = grid
            .radii()
            .iter()
            .map(|r| 2.0 * r * (-r).exp())
            .collect();
        (large, vec![0.0; grid.len()])
    }

    #[test]
    fn type_codes_decode_with_running_flag() {
        assert_eq!(
            IntegralKind::from_code(0).expect("code 0"),
            (IntegralKind::Sum, false)
        );
        assert_eq!(
            IntegralKind::from_code(-5).expect("code -5"),
            (IntegralKind::CrossDifference, true)
        );
        assert!(matches!(
            IntegralKind::from_code(6),
            Err(RadialError::UnsupportedIntegralType(6))
        ));
    }

    #[test]
    fn bound_norm_and_running_integral() {
        let grid = RadialGrid::new(1.0e-5, 60.0, 801).expect("grid");
        let (large, small) = hydrogen_1s(&grid);
        let table = OrbitalTable {
            large: &large,
            small: &small,
            ilast: grid.len() - 1,
            continuum: false,
        };
        let mut workspace = Workspace::new(grid.len());
        let ones = vec![1.0; grid.len()];
        let norm = integrate(&grid, &ones, &table, &table, IntegralKind::Sum, &mut workspace)
            .expect("norm");
        assert!((norm - 1.0).abs() < 1.0e-7, "norm={norm}");

        let radii = grid.radii().to_vec();
        let mean_r = integrate(&grid, &radii, &table, &table, IntegralKind::Large, &mut workspace)
            .expect("<r>");
        assert!((mean_r - 1.5).abs() < 1.0e-6, "<r>={mean_r}");

        let mut running = vec![0.0; grid.len()];
        integrate_running(
            &grid,
            &ones,
            &table,
            &table,
            IntegralKind::Sum,
            &mut running,
            &mut workspace,
        )
        .expect("running");
        assert!(running.windows(2).all(|pair| pair[1] >= pair[0] - 1.0e-15));
        assert!((running[grid.len() - 1] - norm).abs() < 1.0e-14);
    }

    #[test]
    fn truncated_bound_orbitals_hold_value_past_shorter_table() {
        let grid = RadialGrid::new(1.0e-5, 60.0, 801).expect("grid");
        let (large, small) = hydrogen_1s(&grid);
        let long = OrbitalTable {
            large: &large,
            small: &small,
            ilast: 700,
            continuum: false,
        };
        let short = OrbitalTable { ilast: 500, ..long };
        let mut workspace = Workspace::new(grid.len());
        let ones = vec![1.0; grid.len()];
        let mut running = vec![0.0; grid.len()];
        integrate_running(
            &grid,
            &ones,
            &long,
            &short,
            IntegralKind::Large,
            &mut running,
            &mut workspace,
        )
        .expect("running");
        assert!(running[501..].iter().all(|value| *value == running[500]));
    }

    #[test]
    fn cross_difference_is_antisymmetric() {
        let grid = RadialGrid::new(1.0e-5, 40.0, 401).expect("grid");
        let (large, _) = hydrogen_1s(&grid);
        let small: Vec<f64> = large.iter().map(|value| 0.01 * value).collect();
        let other: Vec<f64> = grid
            .radii()
            .iter()
            .map(|r| r * r * (-0.5 * r).exp())
            .collect();
        let one = OrbitalTable {
            large: &large,
            small: &small,
            ilast: 400,
            continuum: false,
        };
        let two = OrbitalTable {
            large: &other,
            small: &large,
            ilast: 400,
            continuum: false,
        };
        let mut workspace = Workspace::new(grid.len());
        let ones = vec![1.0; grid.len()];
        let forward = integrate(
            &grid,
            &ones,
            &one,
            &two,
            IntegralKind::CrossDifference,
            &mut workspace,
        )
        .expect("forward");
        let backward = integrate(
            &grid,
            &ones,
            &two,
            &one,
            IntegralKind::CrossDifference,
            &mut workspace,
        )
        .expect("backward");
        assert!(forward.abs() > 1.0e-3);
        assert!((forward + backward).abs() < 1.0e-14);
    }

    #[test]
    fn rejects_short_weight_function() {
        let grid = RadialGrid::new(1.0e-5, 40.0, 101).expect("grid");
        let (large, small) = hydrogen_1s(&grid);
        let table = OrbitalTable {
            large: &large,
            small: &small,
            ilast: 100,
            continuum: false,
        };
        let mut workspace = Workspace::new(grid.len());
        let error = integrate(&grid, &[1.0; 10], &table, &table, IntegralKind::Sum, &mut workspace)
            .expect_err("short weight");
        assert!(matches!(
            error,
            RadialError::LengthMismatch {
                name: "weight function",
                need: 101,
                got: 10
            }
        ));
    }

    #[test]
    fn junction_step_is_exact_for_parabolas() {
        // f(x) = 2 + 3x - x² sampled at x = -1, 0, 1
        let junction = Junction {
            running: 0.5,
            previous: Some(-2.0),
            last: 2.0,
        };
        let expected = 0.5 + 2.0 + 1.5 - 1.0 / 3.0;
        assert!((junction.across(4.0) - expected).abs() < 1.0e-14);

        let first_point = Junction {
            previous: None,
            ..junction
        };
        assert_eq!(first_point.across(4.0), 0.5 + 3.0);
    }
}
