//! Electron configurations and their fractional-occupation average, the
//! input of the self-consistent field.

use crate::domain::{RadialError, RadialResult};

/// One relativistic subshell with an integer occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shell {
    pub n: i32,
    pub kappa: i32,
    pub nq: i32,
}

impl Shell {
    pub const fn new(n: i32, kappa: i32, nq: i32) -> Self {
        Self { n, kappa, nq }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub shells: Vec<Shell>,
}

impl Configuration {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }

    pub fn electron_count(&self) -> i32 {
        self.shells.iter().map(|shell| shell.nq).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageShell {
    pub n: i32,
    pub kappa: i32,
    pub nq: f64,
}

/// Fractional occupations; each `(n, kappa)` appears once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AverageConfig {
    shells: Vec<AverageShell>,
}

impl AverageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `nq` electrons to `(n, kappa)`, merging with an existing entry.
    pub fn add(&mut self, n: i32, kappa: i32, nq: f64) {
        match self
            .shells
            .iter_mut()
            .find(|shell| shell.n == n && shell.kappa == kappa)
        {
            Some(shell) => shell.nq += nq,
            None => self.shells.push(AverageShell { n, kappa, nq }),
        }
    }

    pub fn shells(&self) -> &[AverageShell] {
        &self.shells
    }

    pub fn len(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    pub fn electron_count(&self) -> f64 {
        self.shells.iter().map(|shell| shell.nq).sum()
    }
}

impl From<&Configuration> for AverageConfig {
    fn from(configuration: &Configuration) -> Self {
        let mut average = Self::new();
        for shell in &configuration.shells {
            average.add(shell.n, shell.kappa, f64::from(shell.nq));
        }
        average
    }
}

/// Source of the average configuration for a weighted set of groups.
pub trait ConfigurationAverager {
    fn average_config(&self, groups: &[usize], weights: &[f64]) -> RadialResult<AverageConfig>;
}

/// Configuration groups held in memory. Every configuration of a group
/// counts equally; groups are mixed with the given weights, normalized to
/// one, or equally when no weights are passed.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationGroups {
    groups: Vec<Vec<Configuration>>,
}

impl ConfigurationGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_group(&mut self, configurations: Vec<Configuration>) -> usize {
        self.groups.push(configurations);
        self.groups.len() - 1
    }

    pub fn group(&self, index: usize) -> RadialResult<&[Configuration]> {
        self.groups
            .get(index)
            .map(Vec::as_slice)
            .ok_or(RadialError::MissingGroup { group: index })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl ConfigurationAverager for ConfigurationGroups {
    fn average_config(&self, groups: &[usize], weights: &[f64]) -> RadialResult<AverageConfig> {
        if !weights.is_empty() && weights.len() != groups.len() {
            return Err(RadialError::LengthMismatch {
                name: "group weights",
                need: groups.len(),
                got: weights.len(),
            });
        }
        let weight_of = |position: usize| weights.get(position).copied().unwrap_or(1.0);
        let total: f64 = (0..groups.len()).map(weight_of).sum();

        let mut average = AverageConfig::new();
        for (position, &index) in groups.iter().enumerate() {
            let configurations = self.group(index)?;
            if configurations.is_empty() || total == 0.0 {
                continue;
            }
            let share = weight_of(position) / total / configurations.len() as f64;
            for configuration in configurations {
                for shell in &configuration.shells {
                    average.add(shell.n, shell.kappa, share * f64::from(shell.nq));
                }
            }
        }
        Ok(average)
    }
}
