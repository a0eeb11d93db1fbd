//! Angular-coefficient seam. All angular momenta are doubled.

use crate::numerics::special::{wigner_3j, wigner_6j};

pub trait AngularCoefficients {
    fn w3j(&self, j1: i32, j2: i32, j3: i32, m1: i32, m2: i32, m3: i32) -> f64;

    fn w6j(&self, j1: i32, j2: i32, j3: i32, j4: i32, j5: i32, j6: i32) -> f64;

    /// `<ja || C^k || jb>`.
    fn reduced_cl(&self, ja: i32, k: i32, jb: i32) -> f64 {
        let value = ((f64::from(ja) + 1.0) * (f64::from(jb) + 1.0)).sqrt()
            * self.w3j(ja, k, jb, 1, 0, -1);
        if ((ja + 1) / 2) % 2 != 0 {
            -value
        } else {
            value
        }
    }
}

/// Closed Racah formulas from `numerics::special::wigner`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RacahAlgebra;

impl AngularCoefficients for RacahAlgebra {
    fn w3j(&self, j1: i32, j2: i32, j3: i32, m1: i32, m2: i32, m3: i32) -> f64 {
        wigner_3j(j1, j2, j3, m1, m2, m3)
    }

    fn w6j(&self, j1: i32, j2: i32, j3: i32, j4: i32, j5: i32, j6: i32) -> f64 {
        wigner_6j(j1, j2, j3, j4, j5, j6)
    }
}

#[cfg(test)]
mod tests {
    use super::{AngularCoefficients, RacahAlgebra};

    #[test]
    fn reduced_cl_of_rank_zero_is_the_multiplicity() {
        let angular = RacahAlgebra;
        for j in [1, 3, 5] {
            let value = angular.reduced_cl(j, 0, j);
            assert!(
                (value.abs() - f64::from(j + 1).sqrt()).abs() < 1.0e-12,
                "j2={j}: {value}"
            );
        }
    }

    #[test]
    fn reduced_cl_follows_the_triangle_rule() {
        let angular = RacahAlgebra;
        assert!(angular.reduced_cl(1, 2, 1).abs() > 1.0e-6);
        assert!(angular.reduced_cl(1, 2, 3).abs() > 1.0e-6);
        assert_eq!(angular.reduced_cl(1, 6, 1), 0.0);
    }

    #[test]
    fn weighted_squares_sum_to_the_multiplicities() {
        let angular = RacahAlgebra;
        let (ja, jb) = (3, 5);
        let total: f64 = (0..=8)
            .step_by(2)
            .map(|k| f64::from(k + 1) * angular.reduced_cl(ja, k, jb).powi(2))
            .sum();
        assert!((total - f64::from((ja + 1) * (jb + 1))).abs() < 1.0e-10, "{total}");
    }
}
