//! Simulation configuration read from `config.toml`.

use crate::decode::NegativeRule;
use crate::model::Strategy;
use crate::priors::Priors;
use crate::utils::check_num;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub population: PopulationConfig,
    pub priors: Priors,
    pub run: RunConfig,
    pub strategies: Vec<StrategyConfig>,
}

/// Population and test noise parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals.
    pub size: usize,
    /// Probability that a positive trial reads negative.
    pub false_negative_rate: f64,
    /// Probability that a negative trial reads positive.
    pub false_positive_rate: f64,
}

/// Run length and randomness parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Rounds simulated per strategy and scenario.
    pub rounds: usize,
    /// Scenarios, each with a fresh population and fresh priors.
    pub scenarios: usize,
    /// Seed of the random stream (operating system entropy when absent).
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub negative_rule: NegativeRule,
}

/// Labeled sequence of pooling models.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub id: String,
    pub models: Strategy,
}

impl Config {
    /// Load a [`Config`] from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.population.size, 1..=1_000_000).context("invalid population size")?;
        check_num(self.population.false_negative_rate, 0.0..=1.0)
            .context("invalid false negative rate")?;
        check_num(self.population.false_positive_rate, 0.0..=1.0)
            .context("invalid false positive rate")?;

        self.priors
            .validate(self.population.size)
            .context("invalid priors")?;

        check_num(self.run.rounds, 1..=1_000_000).context("invalid number of rounds")?;
        check_num(self.run.scenarios, 1..=100_000).context("invalid number of scenarios")?;

        if self.strategies.is_empty() {
            bail!("at least one strategy is required");
        }
        for (i_strat, strat) in self.strategies.iter().enumerate() {
            strat
                .validate()
                .with_context(|| format!("invalid strategy {i_strat} ({:?})", strat.id))?;
            if self.strategies[..i_strat].iter().any(|s| s.id == strat.id) {
                bail!("duplicate strategy id {:?}", strat.id);
            }
        }

        Ok(())
    }
}

impl StrategyConfig {
    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            bail!("id must not be empty");
        }
        if self.id.contains(['\t', '\n', '\r']) {
            bail!("id must not contain tabs or line breaks");
        }
        for (i_model, model) in self.models.models().iter().enumerate() {
            model
                .validate()
                .with_context(|| format!("invalid model {i_model}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pooling::PoolingModel;

    const CONFIG: &str = r#"
[population]
size = 100
false_negative_rate = 0.05
false_positive_rate = 0.0

[priors]
kind = "uniform"
probability = 0.02

[run]
rounds = 10
scenarios = 2
seed = 347634739

[[strategies]]
id = "TR4"
models = [{ kind = "tournament", pool_size = 4, order_by_probability = true }]

[[strategies]]
id = "FG3+TR2"
models = [{ kind = "full_grid", grid_size = 3 }, { kind = "tournament", pool_size = 2 }]
"#;

    #[test]
    fn parses_full_config() {
        let cfg = Config::from_toml(CONFIG).unwrap();
        assert_eq!(cfg.population.size, 100);
        assert_eq!(cfg.priors, Priors::Uniform { probability: 0.02 });
        assert_eq!(cfg.run.seed, Some(347634739));
        assert_eq!(cfg.run.negative_rule, NegativeRule::AllTrialsNegative);
        assert_eq!(cfg.strategies.len(), 2);
        assert_eq!(
            cfg.strategies[1].models.models(),
            &[
                PoolingModel::FullGrid { grid_size: 3 },
                PoolingModel::Tournament {
                    pool_size: 2,
                    order_by_probability: false
                }
            ]
        );
    }

    #[test]
    fn parses_negative_rule() {
        let text = CONFIG.replace("seed = 347634739", "negative_rule = \"any_trial_negative\"");
        let cfg = Config::from_toml(&text).unwrap();
        assert_eq!(cfg.run.seed, None);
        assert_eq!(cfg.run.negative_rule, NegativeRule::AnyTrialNegative);
    }

    #[test]
    fn rejects_invalid_values() {
        for (from, to) in [
            ("size = 100", "size = 0"),
            ("false_negative_rate = 0.05", "false_negative_rate = 1.05"),
            ("probability = 0.02", "probability = -0.02"),
            ("rounds = 10", "rounds = 0"),
            ("grid_size = 3", "grid_size = 1"),
            ("id = \"FG3+TR2\"", "id = \"TR4\""),
            ("id = \"TR4\"", "id = \"\""),
            ("kind = \"tournament\", pool_size = 4", "kind = \"pyramid\", pool_size = 4"),
        ] {
            let text = CONFIG.replacen(from, to, 1);
            assert_ne!(text, CONFIG, "pattern {from:?} not found");
            assert!(Config::from_toml(&text).is_err(), "{to:?} accepted");
        }
    }
}
