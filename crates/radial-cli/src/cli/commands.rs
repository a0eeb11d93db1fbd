use super::CliError;
use anyhow::Context;
use radial_core::atom::{AverageConfig, Configuration, Shell};
use radial_core::common::constants::HARTREE_EV;
use radial_core::common::{CalculationOptions, load_calculation_options};
use radial_core::domain::{RadialError, j2_from_kappa, l_from_kappa};
use radial_core::{Calculation, ScfOutcome};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(clap::Args)]
pub(super) struct OptionFlags {
    /// Calculation options JSON; the flags below override its values
    #[arg(long)]
    options: Option<PathBuf>,

    /// SCF convergence tolerance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Maximum number of SCF iterations
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Principal number from which shells feel the tail screening (0 disables it)
    #[arg(long)]
    screening: Option<i32>,
}

impl OptionFlags {
    fn resolve(&self) -> Result<CalculationOptions, CliError> {
        let mut options = match &self.options {
            Some(path) => load_calculation_options(path).map_err(RadialError::from)?,
            None => CalculationOptions::default(),
        };
        if let Some(tolerance) = self.tolerance {
            options.tolerance = tolerance;
        }
        if let Some(max_iterations) = self.max_iterations {
            options.max_iterations = max_iterations;
        }
        if let Some(screening) = self.screening {
            options.screening = screening;
        }
        options.validate().map_err(RadialError::from)?;
        Ok(options)
    }
}

#[derive(clap::Args)]
pub(super) struct ScfArgs {
    /// Nuclear charge
    #[arg(long = "z", value_name = "Z")]
    nuclear_charge: f64,

    /// Occupied subshell as n:kappa:nq; repeat once per subshell
    #[arg(long = "shell", value_name = "N:KAPPA:NQ", required = true, value_parser = parse_shell)]
    shells: Vec<Shell>,

    /// Also write the JSON report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    flags: OptionFlags,
}

#[derive(clap::Args)]
pub(super) struct OptionsArgs {
    #[command(flatten)]
    flags: OptionFlags,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScfReport {
    nuclear_charge: f64,
    #[serde(flatten)]
    outcome: ScfOutcome,
    average_energy: f64,
    orbitals: Vec<OrbitalReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrbitalReport {
    n: i32,
    kappa: i32,
    nq: i32,
    energy: f64,
    energy_ev: f64,
    ilast: usize,
}

pub(super) fn run_scf_command(args: ScfArgs) -> Result<i32, CliError> {
    let options = args.flags.resolve()?;
    for (index, shell) in args.shells.iter().enumerate() {
        if args.shells[..index]
            .iter()
            .any(|other| other.n == shell.n && other.kappa == shell.kappa)
        {
            return Err(CliError::Usage(format!(
                "subshell {}:{} is listed more than once",
                shell.n, shell.kappa
            )));
        }
    }

    let configuration = Configuration::new(args.shells);
    info!(
        nuclear_charge = args.nuclear_charge,
        shells = configuration.shells.len(),
        electrons = configuration.electron_count(),
        "starting average-configuration scf"
    );
    let mut calculation = Calculation::new(args.nuclear_charge, options)?;
    let outcome = calculation.optimize_radial(&AverageConfig::from(&configuration))?;
    let average_energy = calculation.average_energy_config(&configuration)?;

    let mut orbitals = Vec::with_capacity(configuration.shells.len());
    for shell in &configuration.shells {
        let handle = calculation.orbital_index(shell.n, shell.kappa, 0.0)?;
        let orbital = calculation.orbital(handle)?;
        orbitals.push(OrbitalReport {
            n: shell.n,
            kappa: shell.kappa,
            nq: shell.nq,
            energy: orbital.energy,
            energy_ev: orbital.energy * HARTREE_EV,
            ilast: orbital.ilast,
        });
    }

    let converged = outcome.converged();
    let report = ScfReport {
        nuclear_charge: args.nuclear_charge,
        outcome,
        average_energy,
        orbitals,
    };
    let rendered = serde_json::to_string_pretty(&report).context("failed to serialize SCF report")?;
    if let Some(path) = &args.report {
        write_report(path, &rendered)?;
    }
    println!("{rendered}");

    if converged { Ok(0) } else { Ok(1) }
}

pub(super) fn run_options_command(args: OptionsArgs) -> Result<i32, CliError> {
    let options = args.flags.resolve()?;
    let rendered =
        serde_json::to_string_pretty(&options).context("failed to serialize calculation options")?;
    println!("{rendered}");
    Ok(0)
}

fn write_report(path: &Path, rendered: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory '{}'", parent.display()))?;
    }
    fs::write(path, rendered)
        .with_context(|| format!("failed to write report '{}'", path.display()))?;
    Ok(())
}

fn parse_shell(value: &str) -> Result<Shell, String> {
    let fields: Vec<&str> = value.split(':').collect();
    let [n, kappa, nq] = fields[..] else {
        return Err(format!("expected N:KAPPA:NQ, got '{value}'"));
    };
    let parse = |field: &str, name: &str| {
        field
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("invalid {name} '{field}' in '{value}'"))
    };
    let shell = Shell::new(parse(n, "n")?, parse(kappa, "kappa")?, parse(nq, "nq")?);

    if shell.kappa == 0 {
        return Err("kappa must be nonzero".to_string());
    }
    if shell.n <= 0 || l_from_kappa(shell.kappa) >= shell.n {
        return Err(format!(
            "no bound subshell with n={} and kappa={}",
            shell.n, shell.kappa
        ));
    }
    let capacity = j2_from_kappa(shell.kappa) + 1;
    if shell.nq <= 0 || shell.nq > capacity {
        return Err(format!(
            "occupation {} outside 1..={capacity} for kappa={}",
            shell.nq, shell.kappa
        ));
    }
    Ok(shell)
}
