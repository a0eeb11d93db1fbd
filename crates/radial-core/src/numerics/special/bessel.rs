//! Spherical Bessel functions of the first kind for real arguments, used by
//! the finite-wavelength multipole weights.

const SERIES_CUTOFF: f64 = 1.0;
const SERIES_MAX_ITER: usize = 160;
const SERIES_REL_TOL: f64 = 1.0e-16;
const MILLER_EXTRA_ORDERS: usize = 24;
const MILLER_RESCALE: f64 = 1.0e150;

pub fn spherical_j(order: usize, argument: f64) -> f64 {
    spherical_j_sequence(order, argument)[order]
}

/// `j_0(x), ..., j_{max_order}(x)`.
pub fn spherical_j_sequence(max_order: usize, argument: f64) -> Vec<f64> {
    let mut values = vec![0.0; max_order + 1];
    let x = argument.abs();
    if x == 0.0 {
        values[0] = 1.0;
        return values;
    }

    if x < SERIES_CUTOFF {
        for (order, value) in values.iter_mut().enumerate() {
            *value = series_j(order, x);
        }
    } else if (max_order as f64) < x {
        values[0] = x.sin() / x;
        if max_order >= 1 {
            values[1] = x.sin() / (x * x) - x.cos() / x;
        }
        for order in 2..=max_order {
            let coefficient = (2 * order - 1) as f64;
            values[order] = coefficient * values[order - 1] / x - values[order - 2];
        }
    } else {
        miller_downward(&mut values, x);
    }

    // j_n(-x) = (-1)^n j_n(x)
    if argument < 0.0 {
        for (order, value) in values.iter_mut().enumerate() {
            if order % 2 == 1 {
                *value = -*value;
            }
        }
    }
    values
}

fn series_j(order: usize, x: f64) -> f64 {
    let mut leading = 1.0;
    for k in 1..=order {
        leading *= x / (2 * k + 1) as f64;
    }
    let half_x2 = 0.5 * x * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=SERIES_MAX_ITER {
        term *= -half_x2 / (k as f64 * (2 * order + 2 * k + 1) as f64);
        sum += term;
        if term.abs() <= SERIES_REL_TOL * sum.abs() {
            break;
        }
    }
    leading * sum
}

fn miller_downward(values: &mut [f64], x: f64) {
    let max_order = values.len() - 1;
    let start = max_order + MILLER_EXTRA_ORDERS + x as usize;
    let mut upper = 0.0;
    let mut current = 1.0e-300;
    for order in (0..start).rev() {
        let lower = (2 * order + 3) as f64 * current / x - upper;
        upper = current;
        current = lower;
        if order <= max_order {
            values[order] = current;
        }
        if current.abs() > MILLER_RESCALE {
            upper /= MILLER_RESCALE;
            current /= MILLER_RESCALE;
            for value in values.iter_mut().skip(order) {
                *value /= MILLER_RESCALE;
            }
        }
    }
    let exact_j0 = x.sin() / x;
    let exact_j1 = x.sin() / (x * x) - x.cos() / x;
    let scale = if exact_j0.abs() >= exact_j1.abs() || max_order == 0 {
        exact_j0 / values[0]
    } else {
        exact_j1 / values[1]
    };
    for value in values.iter_mut() {
        *value *= scale;
    }
}
