/// Radial mesh uniform in the internal coordinate `rho = ln r + alpha * r`.
///
/// Points are logarithmically dense near the nucleus and become linear at
/// large radius, which keeps continuum oscillations resolved. `dr_drho[i]`
/// is the Jacobian per unit index step, so `sum g[i] * dr_drho[i]` over a
/// quadrature rule in index space approximates `∫ g dr`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGrid {
    radii: Vec<f64>,
    dr_drho: Vec<f64>,
    rho_step: f64,
    alpha: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    #[error("radial grid requires at least 8 points, got {actual}")]
    TooFewPoints { actual: usize },
    #[error("radial grid extent must satisfy 0 < r_min < r_max, got r_min={r_min}, r_max={r_max}")]
    InvalidExtent { r_min: f64, r_max: f64 },
    #[error("radial grid inversion failed to stay increasing at index {index}")]
    NonMonotonic { index: usize },
}

const INVERSION_MAX_ITER: usize = 200;
const INVERSION_TOL: f64 = 1.0e-14;

impl RadialGrid {
    pub fn new(r_min: f64, r_max: f64, point_count: usize) -> Result<Self, GridError> {
        if point_count < 8 {
            return Err(GridError::TooFewPoints {
                actual: point_count,
            });
        }
        if !r_min.is_finite() || !r_max.is_finite() || r_min <= 0.0 || r_max <= r_min {
            return Err(GridError::InvalidExtent { r_min, r_max });
        }

        let alpha = (r_max / r_min).ln() / r_max;
        let rho_min = r_min.ln() + alpha * r_min;
        let rho_max = r_max.ln() + alpha * r_max;
        let rho_step = (rho_max - rho_min) / (point_count - 1) as f64;

        let mut radii = Vec::with_capacity(point_count);
        let mut dr_drho = Vec::with_capacity(point_count);
        for index in 0..point_count {
            let radius = if index == 0 {
                r_min
            } else if index + 1 == point_count {
                r_max
            } else {
                invert_rho(rho_min + index as f64 * rho_step, alpha)
            };
            if let Some(previous) = radii.last() {
                if radius <= *previous {
                    return Err(GridError::NonMonotonic { index });
                }
            }
            radii.push(radius);
            dr_drho.push(rho_step * radius / (1.0 + alpha * radius));
        }

        Ok(Self {
            radii,
            dr_drho,
            rho_step,
            alpha,
        })
    }

    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn dr_drho(&self) -> &[f64] {
        &self.dr_drho
    }

    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    pub fn r_min(&self) -> f64 {
        self.radii[0]
    }

    pub fn r_max(&self) -> f64 {
        self.radii[self.radii.len() - 1]
    }

    pub fn rho_step(&self) -> f64 {
        self.rho_step
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

/// Solves `x + alpha * e^x = rho` for `x = ln r`; the left side is convex and
/// increasing, so Newton from `x = rho` descends monotonically onto the root.
fn invert_rho(rho: f64, alpha: f64) -> f64 {
    let mut x = rho;
    if alpha > 0.0 {
        x = x.min((rho / alpha).max(f64::MIN_POSITIVE).ln().max(rho - 700.0));
        if x + alpha * x.exp() < rho {
            x = rho;
        }
    }
    for _ in 0..INVERSION_MAX_ITER {
        let ex = x.exp();
        let residual = x + alpha * ex - rho;
        let step = residual / (1.0 + alpha * ex);
        x -= step;
        if step.abs() <= INVERSION_TOL * x.abs().max(1.0) {
            break;
        }
    }
    x.exp()
}
