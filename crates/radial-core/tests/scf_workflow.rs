use radial_core::atom::{AverageConfig, Configuration, ConfigurationGroups, Shell};
use radial_core::common::{CalculationOptions, GridOptions};
use radial_core::{Calculation, ScfStatus};

fn lithium_options(max_iterations: usize) -> CalculationOptions {
    CalculationOptions {
        tolerance: 1.0e-5,
        max_iterations,
        grid: GridOptions {
            r_min: 1.0e-5,
            r_max: 80.0,
            point_count: 1001,
        },
        ..CalculationOptions::default()
    }
}

fn lithium_ground() -> Configuration {
    Configuration::new(vec![Shell::new(1, -1, 2), Shell::new(2, -1, 1)])
}

#[test]
fn lithium_ground_state_converges_with_screened_tail() {
    let mut calculation = Calculation::new(3.0, lithium_options(200)).expect("calculation");
    let config = AverageConfig::from(&lithium_ground());

    let outcome = calculation.optimize_radial(&config).expect("scf");
    assert_eq!(outcome.status, ScfStatus::Converged, "{outcome:?}");
    assert!(outcome.iterations > 1);
    assert!(outcome.tolerance <= 1.0e-5);
    // the outer electron sees the two 1s electrons
    assert!((outcome.residual_charge - 2.0).abs() < 0.1, "{}", outcome.residual_charge);

    let s1 = calculation.orbital_exists(1, -1, 0.0).expect("1s");
    let s2 = calculation.orbital_exists(2, -1, 0.0).expect("2s");
    let e1 = calculation.orbital(s1).expect("1s").energy;
    let e2 = calculation.orbital(s2).expect("2s").energy;
    assert!((-3.0..-2.0).contains(&e1), "1s energy {e1}");
    assert!((-0.3..-0.1).contains(&e2), "2s energy {e2}");

    let potential = calculation.potential().expect("potential");
    assert!(potential.lambda > 0.0);
    assert!(potential.lambda_tail > 0.0);
    assert_eq!(calculation.residual_z(false).expect("z"), 1.0);

    let total = calculation
        .average_energy_config(&lithium_ground())
        .expect("average energy");
    // Hartree-Fock total energy of Li is -7.43
    assert!((-7.6..-7.2).contains(&total), "total energy {total}");
}

#[test]
fn iteration_cap_is_reported_not_raised() {
    let mut calculation = Calculation::new(3.0, lithium_options(0)).expect("calculation");
    let outcome = calculation
        .optimize_radial(&AverageConfig::from(&lithium_ground()))
        .expect("scf");
    assert_eq!(outcome.status, ScfStatus::MaxIterExceeded);
    assert_eq!(outcome.iterations, 0);
    assert_eq!(calculation.num_orbitals(), 0);

    let mut calculation = Calculation::new(3.0, lithium_options(2)).expect("calculation");
    let outcome = calculation
        .optimize_radial(&AverageConfig::from(&lithium_ground()))
        .expect("scf");
    assert_eq!(outcome.status, ScfStatus::MaxIterExceeded);
    assert_eq!(outcome.iterations, 2);
    assert_eq!(calculation.num_bounds(), 2);
}

#[test]
fn weighted_groups_feed_the_average_configuration() {
    let mut groups = ConfigurationGroups::new();
    let ground = groups.add_group(vec![lithium_ground()]);
    let excited = groups.add_group(vec![Configuration::new(vec![
        Shell::new(1, -1, 2),
        Shell::new(2, 1, 1),
    ])]);

    let mut calculation = Calculation::new(3.0, lithium_options(200)).expect("calculation");
    let outcome = calculation
        .optimize_radial_groups(&groups, &[ground, excited], &[0.5, 0.5])
        .expect("scf");
    assert!(outcome.converged(), "{outcome:?}");
    assert!(calculation.orbital_exists(2, 1, 0.0).is_some());

    let ground_energy = calculation
        .total_energy_group(groups.group(ground).expect("group"))
        .expect("ground energy");
    let excited_energy = calculation
        .total_energy_group(groups.group(excited).expect("group"))
        .expect("excited energy");
    assert!(ground_energy < excited_energy, "{ground_energy} vs {excited_energy}");
}
