//! Wigner 3j and 6j symbols in doubled quantum numbers (`two_j = 2j`), via
//! the Racah sums with log-factorial prefactors.

/// `true` when `(j1, j2, j3)` (doubled) can couple: integer sum and triangle rule.
pub fn triangle(two_j1: i32, two_j2: i32, two_j3: i32) -> bool {
    if two_j1 < 0 || two_j2 < 0 || two_j3 < 0 {
        return false;
    }
    if (two_j1 + two_j2 + two_j3).rem_euclid(2) != 0 {
        return false;
    }
    two_j3 <= two_j1 + two_j2 && two_j1 <= two_j2 + two_j3 && two_j2 <= two_j1 + two_j3
}

pub fn wigner_3j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_m1: i32,
    two_m2: i32,
    two_m3: i32,
) -> f64 {
    if !triangle(two_j1, two_j2, two_j3) || two_m1 + two_m2 + two_m3 != 0 {
        return 0.0;
    }
    if two_m1.abs() > two_j1 || two_m2.abs() > two_j2 || two_m3.abs() > two_j3 {
        return 0.0;
    }
    if (two_j1 + two_m1).rem_euclid(2) != 0
        || (two_j2 + two_m2).rem_euclid(2) != 0
        || (two_j3 + two_m3).rem_euclid(2) != 0
    {
        return 0.0;
    }

    let half = |value: i32| value / 2;
    let j1_plus_m1 = half(two_j1 + two_m1);
    let j1_minus_m1 = half(two_j1 - two_m1);
    let j2_plus_m2 = half(two_j2 + two_m2);
    let j2_minus_m2 = half(two_j2 - two_m2);
    let j3_plus_m3 = half(two_j3 + two_m3);
    let j3_minus_m3 = half(two_j3 - two_m3);
    let j1_j2_j3 = half(two_j1 + two_j2 - two_j3);
    let j3_j2_m1 = half(two_j3 - two_j2 + two_m1);
    let j3_j1_m2 = half(two_j3 - two_j1 - two_m2);

    let k_min = 0.max(-j3_j2_m1).max(-j3_j1_m2);
    let k_max = j1_j2_j3.min(j1_minus_m1).min(j2_plus_m2);
    if k_min > k_max {
        return 0.0;
    }

    let prefactor = 0.5
        * (log_delta(two_j1, two_j2, two_j3)
            + ln_factorial(j1_plus_m1)
            + ln_factorial(j1_minus_m1)
            + ln_factorial(j2_plus_m2)
            + ln_factorial(j2_minus_m2)
            + ln_factorial(j3_plus_m3)
            + ln_factorial(j3_minus_m3));

    let mut sum = 0.0;
    for k in k_min..=k_max {
        let denominator = ln_factorial(k)
            + ln_factorial(j3_j2_m1 + k)
            + ln_factorial(j3_j1_m2 + k)
            + ln_factorial(j1_j2_j3 - k)
            + ln_factorial(j1_minus_m1 - k)
            + ln_factorial(j2_plus_m2 - k);
        let term = (prefactor - denominator).exp();
        sum += if k % 2 == 0 { term } else { -term };
    }

    if half(two_j1 - two_j2 - two_m3).rem_euclid(2) != 0 {
        -sum
    } else {
        sum
    }
}

pub fn wigner_6j(
    two_j1: i32,
    two_j2: i32,
    two_j3: i32,
    two_j4: i32,
    two_j5: i32,
    two_j6: i32,
) -> f64 {
    if !triangle(two_j1, two_j2, two_j3)
        || !triangle(two_j1, two_j5, two_j6)
        || !triangle(two_j4, two_j2, two_j6)
        || !triangle(two_j4, two_j5, two_j3)
    {
        return 0.0;
    }

    let a = [
        (two_j1 + two_j2 + two_j3) / 2,
        (two_j1 + two_j5 + two_j6) / 2,
        (two_j4 + two_j2 + two_j6) / 2,
        (two_j4 + two_j5 + two_j3) / 2,
    ];
    let b = [
        (two_j1 + two_j2 + two_j4 + two_j5) / 2,
        (two_j2 + two_j3 + two_j5 + two_j6) / 2,
        (two_j3 + two_j1 + two_j6 + two_j4) / 2,
    ];

    let prefactor = 0.5
        * (log_delta(two_j1, two_j2, two_j3)
            + log_delta(two_j1, two_j5, two_j6)
            + log_delta(two_j4, two_j2, two_j6)
            + log_delta(two_j4, two_j5, two_j3));

    let t_min = a.iter().copied().max().unwrap_or(0);
    let t_max = b.iter().copied().min().unwrap_or(-1);
    let mut sum = 0.0;
    for t in t_min..=t_max {
        let mut log_term = prefactor + ln_factorial(t + 1);
        for value in a {
            log_term -= ln_factorial(t - value);
        }
        for value in b {
            log_term -= ln_factorial(value - t);
        }
        let term = log_term.exp();
        sum += if t % 2 == 0 { term } else { -term };
    }
    sum
}

/// `ln Δ(abc) = ln[(a+b-c)!(a-b+c)!(-a+b+c)!/(a+b+c+1)!]` for a coupled triad.
fn log_delta(two_a: i32, two_b: i32, two_c: i32) -> f64 {
    ln_factorial((two_a + two_b - two_c) / 2)
        + ln_factorial((two_a - two_b + two_c) / 2)
        + ln_factorial((-two_a + two_b + two_c) / 2)
        - ln_factorial((two_a + two_b + two_c) / 2 + 1)
}

fn ln_factorial(n: i32) -> f64 {
    (2..=n.max(1)).map(|value| f64::from(value).ln()).sum()
}

#[cfg(test)]
mod tests {
    use super::{triangle, wigner_3j, wigner_6j};
    use std::f64::consts::FRAC_1_SQRT_2;

    #[test]
    fn wigner_3j_returns_zero_for_selection_rule_violations() {
        let cases = [
            (2, 2, 0, 0, 0, 2),
            (2, 2, 8, 0, 0, 0),
            (2, 2, 0, 4, -4, 0),
            (1, 1, 1, 1, -1, 0),
            (2, 2, 2, 1, -1, 0),
        ];
        for (j1, j2, j3, m1, m2, m3) in cases {
            assert_eq!(wigner_3j(j1, j2, j3, m1, m2, m3), 0.0);
        }
    }

    #[test]
    fn wigner_3j_matches_tabulated_values() {
        let cases = [
            ((0, 0, 0, 0, 0, 0), 1.0),
            ((2, 2, 0, 0, 0, 0), -1.0 / 3.0_f64.sqrt()),
            ((2, 2, 4, 0, 0, 0), (2.0_f64 / 15.0).sqrt()),
            ((1, 1, 0, 1, -1, 0), FRAC_1_SQRT_2),
            ((1, 1, 2, 1, 1, -2), -1.0 / 3.0_f64.sqrt()),
            ((3, 2, 1, 1, 0, -1), 1.0 / 6.0_f64.sqrt()),
            ((3, 2, 1, -1, 0, 1), -1.0 / 6.0_f64.sqrt()),
            ((1, 2, 1, -1, 0, 1), 1.0 / 6.0_f64.sqrt()),
        ];
        for ((j1, j2, j3, m1, m2, m3), expected) in cases {
            let actual = wigner_3j(j1, j2, j3, m1, m2, m3);
            assert!(
                (actual - expected).abs() < 1.0e-13,
                "({j1},{j2},{j3};{m1},{m2},{m3}) expected={expected} actual={actual}"
            );
        }
    }

    #[test]
    fn wigner_6j_matches_tabulated_values() {
        let cases = [
            ((1, 1, 2, 1, 1, 0), 0.5),
            ((2, 2, 2, 2, 2, 2), 1.0 / 6.0),
            ((0, 0, 0, 0, 0, 0), 1.0),
            ((2, 2, 0, 2, 2, 0), 1.0 / 3.0),
        ];
        for ((j1, j2, j3, j4, j5, j6), expected) in cases {
            let actual = wigner_6j(j1, j2, j3, j4, j5, j6);
            assert!(
                (actual - expected).abs() < 1.0e-13,
                "{{{j1},{j2},{j3};{j4},{j5},{j6}}} expected={expected} actual={actual}"
            );
        }
    }

    #[test]
    fn triangle_rule() {
        assert!(triangle(1, 1, 0));
        assert!(triangle(3, 1, 2));
        assert!(!triangle(1, 1, 1));
        assert!(!triangle(2, 2, 6));
    }
}
