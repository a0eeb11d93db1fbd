/// Natural cubic spline: fills `second` with the second derivatives at the
/// knots (zero at both ends). Knots must be strictly monotonic in either
/// direction; `scratch` must be at least as long as the knot list.
pub fn natural_spline(
    x: &[f64],
    y: &[f64],
    second: &mut [f64],
    scratch: &mut [f64],
) -> Result<(), SplineError> {
    let count = x.len();
    if y.len() != count || second.len() != count || scratch.len() < count {
        return Err(SplineError::LengthMismatch {
            knots: count,
            values: y.len(),
            output: second.len(),
        });
    }
    if count < 2 {
        return Err(SplineError::TooFewKnots { actual: count });
    }
    let increasing = x[1] > x[0];
    for index in 1..count {
        let step = x[index] - x[index - 1];
        if step == 0.0 || (step > 0.0) != increasing || !step.is_finite() {
            return Err(SplineError::NonMonotonicKnots { index });
        }
    }

    second[0] = 0.0;
    scratch[0] = 0.0;
    for i in 1..count - 1 {
        let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
        let p = sig * second[i - 1] + 2.0;
        second[i] = (sig - 1.0) / p;
        let slope_jump =
            (y[i + 1] - y[i]) / (x[i + 1] - x[i]) - (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
        scratch[i] = (6.0 * slope_jump / (x[i + 1] - x[i - 1]) - sig * scratch[i - 1]) / p;
    }
    second[count - 1] = 0.0;
    for i in (0..count - 1).rev() {
        second[i] = second[i] * second[i + 1] + scratch[i];
    }

    Ok(())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    #[error("spline input length mismatch: knots={knots}, values={values}, output={output}")]
    LengthMismatch {
        knots: usize,
        values: usize,
        output: usize,
    },
    #[error("spline requires at least 2 knots, got {actual}")]
    TooFewKnots { actual: usize },
    #[error("spline knots must be strictly monotonic, violated at index {index}")]
    NonMonotonicKnots { index: usize },
}
