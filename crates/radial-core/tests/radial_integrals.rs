use radial_core::atom::{Orbital, Wavefunction};
use radial_core::common::{CalculationOptions, GridOptions};
use radial_core::{Calculation, IntegralKind, RadialError};

const WAVE_NUMBER: f64 = 0.5;

fn options(r_max: f64, point_count: usize) -> CalculationOptions {
    CalculationOptions {
        grid: GridOptions {
            r_min: 1.0e-5,
            r_max,
            point_count,
        },
        ..CalculationOptions::default()
    }
}

fn assert_scalar_close(label: &str, expected: f64, actual: f64, abs_tol: f64) {
    assert!(
        (expected - actual).abs() <= abs_tol,
        "{label}: expected {expected}, got {actual}"
    );
}

/// `sin(k r)` tabulated on every grid point.
fn tabulated_wave(radii: &[f64]) -> Orbital {
    let mut orbital = Orbital::new(1, -1, -0.1);
    orbital.ilast = radii.len() - 1;
    orbital.wavefunction = Some(Wavefunction {
        large: radii.iter().map(|r| (WAVE_NUMBER * r).sin()).collect(),
        small: vec![0.0; radii.len()],
    });
    orbital
}

/// `r e^{-r/5}`, a bound-like profile.
fn decaying(radii: &[f64]) -> Orbital {
    let mut orbital = Orbital::new(2, -1, -0.1);
    orbital.ilast = radii.len() - 1;
    orbital.wavefunction = Some(Wavefunction {
        large: radii.iter().map(|r| r * (-0.2 * r).exp()).collect(),
        small: vec![0.0; radii.len()],
    });
    orbital
}

/// The same wave, tabulated up to `ilast` and stored as `(A, φ)` pairs after.
fn asymptotic_wave(radii: &[f64], ilast: usize) -> Orbital {
    let points = radii.len();
    assert_eq!((points - 1 - ilast) % 2, 0);
    let mut large: Vec<f64> = radii.iter().map(|r| (WAVE_NUMBER * r).sin()).collect();
    let mut small = vec![0.0; points];
    let mut start = ilast + 1;
    while start + 1 < points {
        large[start] = 1.0;
        large[start + 1] = WAVE_NUMBER * radii[start];
        small[start] = 0.0;
        small[start + 1] = 0.0;
        start += 2;
    }
    let mut orbital = Orbital::new(0, -1, 0.5 * WAVE_NUMBER * WAVE_NUMBER);
    orbital.ilast = ilast;
    orbital.wavefunction = Some(Wavefunction { large, small });
    orbital
}

/// First index at or beyond `r` that leaves whole asymptotic pairs after it.
fn pair_aligned_ilast(radii: &[f64], r: f64) -> usize {
    let points = radii.len();
    let ilast = radii.iter().position(|radius| *radius >= r).expect("radius on grid");
    if (points - 1 - ilast) % 2 == 0 { ilast } else { ilast + 1 }
}

/// `(A, φ, c, s)` of a Coulomb-like wave: `φ = k r + ln(2 k r) / k`,
/// `A = φ'^(-1/2)`, and a slowly varying small component.
fn coulomb_like(k: f64, r: f64) -> (f64, f64, f64, f64) {
    let phase = k * r + (2.0 * k * r).ln() / k;
    let amplitude = (k + 1.0 / (k * r)).powf(-0.5);
    (amplitude, phase, 0.1 * amplitude, 0.3 * amplitude / (1.0 + r))
}

/// A continuum stored as pairs past `ilast`, and its twin tabulated on every
/// grid point under the bound label `twin_n`.
fn coulomb_continuum(radii: &[f64], k: f64, ilast: usize, twin_n: i32) -> (Orbital, Orbital) {
    let points = radii.len();
    let (mut large, mut small): (Vec<f64>, Vec<f64>) = radii
        .iter()
        .map(|r| {
            let (amplitude, phase, c, s) = coulomb_like(k, *r);
            (amplitude * phase.sin(), c * phase.cos() + s * phase.sin())
        })
        .unzip();

    let mut twin = Orbital::new(twin_n, -1, -0.1);
    twin.ilast = points - 1;
    twin.wavefunction = Some(Wavefunction {
        large: large.clone(),
        small: small.clone(),
    });

    let mut start = ilast + 1;
    while start + 1 < points {
        let (amplitude, phase, c, s) = coulomb_like(k, radii[start]);
        large[start] = amplitude;
        large[start + 1] = phase;
        small[start] = c;
        small[start + 1] = s;
        start += 2;
    }
    let mut continuum = Orbital::new(0, -1, 0.5 * k * k);
    continuum.ilast = ilast;
    continuum.wavefunction = Some(Wavefunction { large, small });
    (continuum, twin)
}

#[test]
fn asymptotic_pairs_integrate_like_the_tabulated_wave() {
    let mut calculation = Calculation::new(1.0, options(500.0, 2001)).expect("calculation");
    calculation.ensure_grid().expect("grid");
    let radii = calculation.grid().expect("grid").radii().to_vec();
    let points = radii.len();

    let mut ilast = radii.iter().position(|r| *r > 20.0).expect("r = 20 on grid");
    if (points - 1 - ilast) % 2 != 0 {
        ilast += 1;
    }
    let tabulated = calculation
        .add_orbital(tabulated_wave(&radii))
        .expect("tabulated");
    let asymptotic = calculation
        .add_orbital(asymptotic_wave(&radii, ilast))
        .expect("asymptotic");
    assert!(calculation.orbital(asymptotic).expect("continuum").is_continuum());

    let weight: Vec<f64> = radii.iter().map(|r| 1.0 / (r * r)).collect();
    let reference = calculation
        .integrate(&weight, tabulated, tabulated, IntegralKind::Large)
        .expect("tabulated");
    // ∫ sin²(kr)/r² dr over (0, ∞) is πk/2
    assert_scalar_close("reference", std::f64::consts::FRAC_PI_2 * WAVE_NUMBER, reference, 1.0e-2);

    let profile = calculation.add_orbital(decaying(&radii)).expect("profile");
    let unit = vec![1.0; points];
    let tabulated_overlap = calculation
        .integrate(&unit, profile, tabulated, IntegralKind::Large)
        .expect("tabulated overlap");
    let mixed = calculation
        .integrate(&unit, profile, asymptotic, IntegralKind::Large)
        .expect("mixed");
    // ∫ r e^{-ar} sin(kr) dr = 2ak / (a² + k²)²
    let (a, k) = (0.2, WAVE_NUMBER);
    let analytic = 2.0 * a * k / (a * a + k * k).powi(2);
    assert_scalar_close("tabulated overlap", analytic, tabulated_overlap, 1.0e-4);
    assert_scalar_close("mixed", analytic, mixed, 2.0e-3);

    let both = calculation
        .integrate(&weight, asymptotic, asymptotic, IntegralKind::Large)
        .expect("both asymptotic");
    assert_scalar_close("both", reference, both, 2.0e-3);

    let mut running = vec![0.0; points];
    calculation
        .integrate_running(&weight, tabulated, tabulated, IntegralKind::Large, &mut running)
        .expect("running");
    assert_eq!(running[0], 0.0);
    assert_scalar_close("running end", reference, running[points - 1], 1.0e-12);
}

#[test]
fn two_continua_match_their_tabulated_twins_for_every_kind() {
    let mut calculation = Calculation::new(1.0, options(300.0, 4001)).expect("calculation");
    calculation.ensure_grid().expect("grid");
    let radii = calculation.grid().expect("grid").radii().to_vec();

    let (slow, slow_twin) = coulomb_continuum(&radii, 0.7, pair_aligned_ilast(&radii, 15.0), 3);
    let (fast, fast_twin) = coulomb_continuum(&radii, 1.3, pair_aligned_ilast(&radii, 40.0), 4);
    let slow = calculation.add_orbital(slow).expect("k = 0.7");
    let fast = calculation.add_orbital(fast).expect("k = 1.3");
    let slow_twin = calculation.add_orbital(slow_twin).expect("k = 0.7 twin");
    let fast_twin = calculation.add_orbital(fast_twin).expect("k = 1.3 twin");
    assert_eq!(calculation.num_continua(), 2);

    let weight: Vec<f64> = radii.iter().map(|r| (-r / 30.0).exp()).collect();
    let kinds = [
        (IntegralKind::Sum, 4.0e-4),
        (IntegralKind::Large, 4.0e-4),
        (IntegralKind::Small, 4.0e-5),
        (IntegralKind::CrossSum, 4.0e-5),
        (IntegralKind::CrossDifference, 4.0e-5),
    ];
    for (kind, tolerance) in kinds {
        for (pair, twins) in [
            ((slow, fast), (slow_twin, fast_twin)),
            ((fast, slow), (fast_twin, slow_twin)),
        ] {
            let expected = calculation
                .integrate(&weight, twins.0, twins.1, kind)
                .expect("tabulated twins");
            let actual = calculation
                .integrate(&weight, pair.0, pair.1, kind)
                .expect("continua");
            assert_scalar_close(
                &format!("{kind:?} ({}, {})", pair.0, pair.1),
                expected,
                actual,
                tolerance,
            );
        }
    }

    let forward = calculation
        .integrate(&weight, slow, fast, IntegralKind::CrossDifference)
        .expect("forward");
    let backward = calculation
        .integrate(&weight, fast, slow, IntegralKind::CrossDifference)
        .expect("backward");
    assert!(forward.abs() > 1.0e-5, "{forward}");
    assert_scalar_close("swapped operands", -forward, backward, 1.0e-10);
}

#[test]
fn failed_solves_register_nothing() {
    let mut calculation = Calculation::new(1.0, options(500.0, 801)).expect("calculation");
    // 1p does not exist
    assert!(matches!(
        calculation.orbital_index(1, 1, 0.0),
        Err(RadialError::Solver { n: 1, kappa: 1, .. })
    ));
    assert_eq!(calculation.num_orbitals(), 0);
    assert_eq!(calculation.num_bounds(), 0);
    assert_eq!(calculation.orbital_exists(1, 1, 0.0), None);

    assert!(calculation.orbital_index(0, -1, -0.5).is_err());
    assert_eq!(calculation.num_continua(), 0);
    let continuum = calculation.orbital_index(0, -1, 0.5).expect("continuum");
    assert_eq!(calculation.orbital(continuum).expect("continuum").n, -1);
    assert_eq!(calculation.num_orbitals(), 1);
}

#[test]
fn added_wavefunctions_must_span_the_grid() {
    let mut calculation = Calculation::new(1.0, options(60.0, 801)).expect("calculation");
    let mut empty = Orbital::new(0, -1, 0.5);
    empty.wavefunction = Some(Wavefunction {
        large: Vec::new(),
        small: Vec::new(),
    });
    assert!(matches!(
        calculation.add_orbital(empty),
        Err(RadialError::LengthMismatch {
            need: 801,
            got: 0,
            ..
        })
    ));

    let radii = calculation.grid().expect("grid").radii().to_vec();
    let mut short = tabulated_wave(&radii);
    if let Some(wavefunction) = short.wavefunction.as_mut() {
        wavefunction.small.pop();
    }
    assert!(matches!(
        calculation.add_orbital(short),
        Err(RadialError::LengthMismatch {
            name: "orbital small component",
            need: 801,
            got: 800
        })
    ));

    let odd = asymptotic_wave(&radii, 700);
    let mut misaligned = odd.clone();
    misaligned.ilast = 699;
    assert!(matches!(
        calculation.add_orbital(misaligned),
        Err(RadialError::InvalidAsymptoticLayout { ilast: 699, .. })
    ));
    assert_eq!(calculation.num_orbitals(), 0);
    calculation.add_orbital(odd).expect("aligned continuum");
    assert_eq!(calculation.num_continua(), 1);
}

#[test]
fn integrals_need_resident_orbitals() {
    let mut calculation = Calculation::new(1.0, options(60.0, 801)).expect("calculation");
    let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
    calculation.free_orbital(s).expect("release");
    let weight = vec![1.0; calculation.grid().expect("grid").len()];
    assert!(matches!(
        calculation.integrate(&weight, s, s, IntegralKind::Sum),
        Err(RadialError::OrbitalUnloaded { .. })
    ));
    assert!(matches!(
        calculation.integrate(&weight, s, 42, IntegralKind::Sum),
        Err(RadialError::MissingOrbital { handle: 42 })
    ));
}

#[test]
fn slater_values_do_not_depend_on_index_order() {
    let mut calculation = Calculation::new(3.0, options(60.0, 1001)).expect("calculation");
    let s1 = calculation.orbital_index(1, -1, 0.0).expect("1s");
    let s2 = calculation.orbital_index(2, -1, 0.0).expect("2s");
    let p2 = calculation.orbital_index(2, 1, 0.0).expect("2p");

    let exchange = calculation.slater([s1, p2, p2, s1], 1, 0).expect("G1");
    let (slater_entries, _, _) = calculation.cache_sizes();
    // (k0,k2) <-> (k1,k3) and the swap inside each density share the entry
    for ks in [[p2, s1, s1, p2], [s1, p2, p2, s1]] {
        assert_eq!(calculation.slater(ks, 1, 0).expect("cached"), exchange);
    }
    assert_eq!(calculation.cache_sizes().0, slater_entries);

    calculation.free_slater_array();
    let recomputed = calculation.slater([p2, s1, s1, p2], 1, 0).expect("recomputed");
    assert!(
        (recomputed - exchange).abs() <= 1.0e-4 * exchange.abs(),
        "{recomputed} vs {exchange}"
    );

    let direct = calculation.slater([s1, s2, s1, s2], 0, 0).expect("F0(1s,2s)");
    calculation.free_slater_array();
    let swapped = calculation.slater([s2, s1, s2, s1], 0, 0).expect("F0(2s,1s)");
    assert!((direct - swapped).abs() <= 1.0e-4 * direct.abs(), "{direct} vs {swapped}");
    assert!(direct > 0.0 && exchange > 0.0);
}

#[test]
fn resolving_an_orbital_invalidates_cached_integrals() {
    let mut calculation = Calculation::new(2.0, options(60.0, 801)).expect("calculation");
    let s = calculation.orbital_index(1, -1, 0.0).expect("1s");
    calculation.slater([s, s, s, s], 0, 0).expect("F0");
    calculation.residual_potential(s, s).expect("residual");
    assert_eq!(calculation.cache_sizes(), (1, 1, 0));

    calculation.solve_dirac(s).expect("resolve");
    assert_eq!(calculation.cache_sizes(), (0, 0, 0));
}

#[test]
fn hydrogen_s_wave_carries_the_coulomb_phase() {
    let mut calculation = Calculation::new(1.0, options(500.0, 801)).expect("calculation");
    let continuum = calculation.orbital_index(0, -1, 0.5).expect("continuum");
    let phase = calculation.phase_shift(continuum).expect("phase shift");
    // arg Γ(1 - i) for Z = 1, k = 1
    let expected: f64 = 0.301_640_320_467_533_2;
    let diff = (phase - expected).rem_euclid(std::f64::consts::TAU);
    let diff = diff.min(std::f64::consts::TAU - diff);
    assert!(diff < 5.0e-2, "phase shift {phase} vs {expected}");
}
