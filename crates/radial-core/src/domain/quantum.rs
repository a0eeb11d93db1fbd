//! Relativistic angular quantum numbers. `kappa = -(l+1)` for `j = l + 1/2`
//! and `kappa = l` for `j = l - 1/2`; `j` and `l` are carried doubled.

pub const fn j2_from_kappa(kappa: i32) -> i32 {
    2 * kappa.abs() - 1
}

pub const fn l_from_kappa(kappa: i32) -> i32 {
    if kappa < 0 { -kappa - 1 } else { kappa }
}

pub const fn l2_from_kappa(kappa: i32) -> i32 {
    2 * l_from_kappa(kappa)
}

/// Inverse of the two maps above; `None` when `j` and `l` do not pair.
pub const fn kappa_from_jl(j2: i32, l2: i32) -> Option<i32> {
    if j2 == l2 + 1 {
        Some(-(l2 / 2) - 1)
    } else if j2 == l2 - 1 && l2 > 0 {
        Some(l2 / 2)
    } else {
        None
    }
}
