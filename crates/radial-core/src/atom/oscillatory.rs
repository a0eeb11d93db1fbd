//! Running integral of `x(r) sin φ(r) + y(r) cos φ(r)` over asymptotic
//! samples spaced two grid points apart.
//!
//! While the phase advances slowly relative to the sample spacing the
//! integrand is resolved by the grid and plain Newton-Cotes is used. Once it
//! advances faster, `x/φ'` and `y/φ'` are splined against `φ` and each
//! segment is integrated exactly as a cubic in `φ - φ0` times `sin`/`cos`.

use crate::domain::RadialResult;
use crate::numerics::{RadialGrid, natural_spline, newton_cotes_running};

/// Largest `(|φ'_{i-1}| + |φ'_i|) Δr` still treated as slowly varying.
pub const SLOW_PHASE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SinCosSamples {
    pub sin_amp: Vec<f64>,
    pub cos_amp: Vec<f64>,
    pub phase: Vec<f64>,
    pub dphase: Vec<f64>,
    /// Grid index of the first sample; sample `m` sits at `first_index + 2m`.
    pub first_index: usize,
}

impl SinCosSamples {
    pub fn reset(&mut self, first_index: usize) {
        self.sin_amp.clear();
        self.cos_amp.clear();
        self.phase.clear();
        self.dphase.clear();
        self.first_index = first_index;
    }

    pub fn push(&mut self, sin_amp: f64, cos_amp: f64, phase: f64, dphase: f64) {
        self.sin_amp.push(sin_amp);
        self.cos_amp.push(cos_amp);
        self.phase.push(phase);
        self.dphase.push(dphase);
    }

    pub fn len(&self) -> usize {
        self.phase.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phase.is_empty()
    }

    pub fn grid_index(&self, sample: usize) -> usize {
        self.first_index + 2 * sample
    }

    /// Integrand per unit `r` at one sample.
    pub fn value(&self, sample: usize) -> f64 {
        let phase = self.phase[sample];
        self.sin_amp[sample] * phase.sin() + self.cos_amp[sample] * phase.cos()
    }
}

/// Reusable buffers for [`integrate_sin_cos`]. They grow to the longest
/// sample run seen and are never shrunk.
#[derive(Debug, Clone, Default)]
pub struct SinCosScratch {
    sin_ratio: Vec<f64>,
    cos_ratio: Vec<f64>,
    sin_second: Vec<f64>,
    cos_second: Vec<f64>,
    spline: Vec<f64>,
    integrand: Vec<f64>,
    partial: Vec<f64>,
}

/// Writes the running integral at each sample to `running`, starting from
/// `baseline`.
pub fn integrate_sin_cos(
    grid: &RadialGrid,
    samples: &SinCosSamples,
    baseline: f64,
    threshold: f64,
    running: &mut Vec<f64>,
    scratch: &mut SinCosScratch,
) -> RadialResult<()> {
    let count = samples.len();
    running.clear();
    running.resize(count, baseline);
    if count < 2 {
        return Ok(());
    }

    let radii = grid.radii();
    let mut slow_end = 1;
    while slow_end < count {
        let spread = samples.dphase[slow_end - 1].abs() + samples.dphase[slow_end].abs();
        let step = radii[samples.grid_index(slow_end)] - radii[samples.grid_index(slow_end - 1)];
        if spread * step > threshold {
            break;
        }
        slow_end += 1;
    }

    if slow_end > 1 {
        integrate_slow(grid, samples, 0, slow_end, running, scratch)?;
    }
    if slow_end == count {
        return Ok(());
    }

    let first_knot = slow_end.saturating_sub(2);
    if !phase_is_monotonic(samples, first_knot) {
        tracing::trace!(
            first_index = samples.first_index,
            from_sample = slow_end - 1,
            "asymptotic phase not monotonic, using direct quadrature"
        );
        return integrate_slow(grid, samples, slow_end - 1, count, running, scratch);
    }

    let knots = &samples.phase[first_knot..];
    let SinCosScratch {
        sin_ratio,
        cos_ratio,
        sin_second,
        cos_second,
        spline,
        ..
    } = scratch;
    sin_ratio.clear();
    sin_ratio.extend((first_knot..count).map(|m| samples.sin_amp[m] / samples.dphase[m]));
    cos_ratio.clear();
    cos_ratio.extend((first_knot..count).map(|m| samples.cos_amp[m] / samples.dphase[m]));
    for buffer in [&mut *sin_second, &mut *cos_second, &mut *spline] {
        buffer.clear();
        buffer.resize(knots.len(), 0.0);
    }
    natural_spline(knots, sin_ratio, sin_second, spline)?;
    natural_spline(knots, cos_ratio, cos_second, spline)?;

    for m in slow_end..count {
        let local = m - first_knot;
        let phase0 = samples.phase[m - 1];
        let phase1 = samples.phase[m];
        let (is, ic) = trig_moments(phase0, phase1);
        let delta = phase1 - phase0;
        let a = cubic_coefficients(
            sin_ratio[local - 1],
            sin_ratio[local],
            sin_second[local - 1],
            sin_second[local],
            delta,
        );
        let b = cubic_coefficients(
            cos_ratio[local - 1],
            cos_ratio[local],
            cos_second[local - 1],
            cos_second[local],
            delta,
        );
        let mut segment = 0.0;
        for power in 0..4 {
            segment += a[power] * is[power] + b[power] * ic[power];
        }
        running[m] = running[m - 1] + segment;
    }

    Ok(())
}

/// `∫ s^m sin φ dφ` and `∫ s^m cos φ dφ` over `[φ0, φ1]` with `s = φ - φ0`,
/// `m = 0..=3`.
pub(crate) fn trig_moments(phase0: f64, phase1: f64) -> ([f64; 4], [f64; 4]) {
    let (sin0, cos0) = phase0.sin_cos();
    let (sin1, cos1) = phase1.sin_cos();
    let delta = phase1 - phase0;
    let mut is = [0.0; 4];
    let mut ic = [0.0; 4];
    is[0] = -(cos1 - cos0);
    ic[0] = sin1 - sin0;
    let mut power = delta;
    for m in 1..4 {
        let order = m as f64;
        is[m] = -power * cos1 + order * ic[m - 1];
        ic[m] = power * sin1 - order * is[m - 1];
        power *= delta;
    }
    (is, ic)
}

/// Spline segment as `a0 + a1 s + a2 s² + a3 s³`, `s = φ - φ0`.
fn cubic_coefficients(y0: f64, y1: f64, z0: f64, z1: f64, delta: f64) -> [f64; 4] {
    [
        y0,
        (y1 - y0) / delta - delta * (2.0 * z0 + z1) / 6.0,
        0.5 * z0,
        (z1 - z0) / (6.0 * delta),
    ]
}

fn phase_is_monotonic(samples: &SinCosSamples, first_knot: usize) -> bool {
    let phase = &samples.phase[first_knot..];
    let dphase = &samples.dphase[first_knot..];
    if dphase.iter().any(|value| *value == 0.0 || !value.is_finite()) {
        return false;
    }
    let increasing = phase[1] > phase[0];
    phase
        .windows(2)
        .all(|pair| pair[1] != pair[0] && (pair[1] > pair[0]) == increasing)
}

/// Newton-Cotes over samples `from..to`, continuing from `running[from]`.
fn integrate_slow(
    grid: &RadialGrid,
    samples: &SinCosSamples,
    from: usize,
    to: usize,
    running: &mut [f64],
    scratch: &mut SinCosScratch,
) -> RadialResult<()> {
    let jacobian = grid.dr_drho();
    let SinCosScratch {
        integrand, partial, ..
    } = scratch;
    integrand.clear();
    integrand.extend((from..to).map(|m| samples.value(m) * jacobian[samples.grid_index(m)]));
    partial.clear();
    partial.resize(integrand.len(), 0.0);
    newton_cotes_running(integrand, 0.0, partial)?;
    let start = running[from];
    for (offset, value) in partial.iter().enumerate().skip(1) {
        running[from + offset] = start + 2.0 * value;
    }
    Ok(())
}
