//! Composite Newton-Cotes quadrature on unit-spaced samples.
//!
//! Even offsets use Simpson's rule; odd offsets use the three-point
//! half-interval rule, so the running integral is fourth order at every
//! sample rather than only at the panel ends.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NewtonCotesError {
    #[error("newton-cotes output length {output} does not match {values} samples")]
    LengthMismatch { values: usize, output: usize },
}

/// Running integral `out[i] = start + ∫_0^i values`.
pub fn newton_cotes_running(
    values: &[f64],
    start: f64,
    out: &mut [f64],
) -> Result<(), NewtonCotesError> {
    if values.len() != out.len() {
        return Err(NewtonCotesError::LengthMismatch {
            values: values.len(),
            output: out.len(),
        });
    }
    let count = values.len();
    if count == 0 {
        return Ok(());
    }

    out[0] = start;
    if count == 2 {
        out[1] = start + 0.5 * (values[0] + values[1]);
        return Ok(());
    }

    let mut index = 0;
    while index + 2 < count {
        let (v0, v1, v2) = (values[index], values[index + 1], values[index + 2]);
        out[index + 1] = out[index] + (5.0 * v0 + 8.0 * v1 - v2) / 12.0;
        out[index + 2] = out[index] + (v0 + 4.0 * v1 + v2) / 3.0;
        index += 2;
    }
    if index + 1 < count {
        let last = count - 1;
        out[last] =
            out[last - 1] + (-values[last - 2] + 8.0 * values[last - 1] + 5.0 * values[last]) / 12.0;
    }

    Ok(())
}

/// Definite integral `∫_0^{n-1} values`.
pub fn newton_cotes_total(values: &[f64]) -> f64 {
    let count = values.len();
    match count {
        0 | 1 => 0.0,
        2 => 0.5 * (values[0] + values[1]),
        _ => {
            let mut total = 0.0;
            let mut index = 0;
            while index + 2 < count {
                total += (values[index] + 4.0 * values[index + 1] + values[index + 2]) / 3.0;
                index += 2;
            }
            if index + 1 < count {
                let last = count - 1;
                total +=
                    (-values[last - 2] + 8.0 * values[last - 1] + 5.0 * values[last]) / 12.0;
            }
            total
        }
    }
}
