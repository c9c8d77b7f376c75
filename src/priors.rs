//! Policies assigning prior positive probabilities to a population.

use crate::engine::Simulator;
use crate::random::RandomSource;
use crate::utils::{check_num, check_prob_vec};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Priors {
    /// Same prior for everyone.
    Uniform { probability: f64 },
    /// One prior per individual.
    Values { values: Vec<f64> },
    /// One prior per line of a text file, relative to the simulation directory.
    File { path: PathBuf },
    /// 0/1 priors produced by an imperfect screening of a sampled population.
    Estimated {
        prevalence: f64,
        sensitivity: f64,
        specificity: f64,
    },
}

impl Priors {
    pub fn validate(&self, n_ind: usize) -> Result<()> {
        match self {
            Priors::Uniform { probability } => {
                check_num(*probability, 0.0..=1.0).context("invalid uniform prior")?;
            }
            Priors::Values { values } => {
                check_prob_vec(values, n_ind).context("invalid prior values")?;
            }
            Priors::File { .. } => {}
            Priors::Estimated {
                prevalence,
                sensitivity,
                specificity,
            } => {
                check_num(*prevalence, 0.0..=1.0).context("invalid prevalence")?;
                check_num(*sensitivity, 0.0..=1.0).context("invalid sensitivity")?;
                check_num(*specificity, 0.0..=1.0).context("invalid specificity")?;
            }
        }
        Ok(())
    }

    /// Assign the priors to every individual of `sim`.
    ///
    /// File priors are read leniently: a missing or malformed file leaves
    /// the priors unchanged.
    pub fn assign<S: RandomSource>(
        &self,
        sim: &mut Simulator,
        base_dir: &Path,
        rng: &mut S,
    ) -> Result<()> {
        match self {
            Priors::Uniform { probability } => {
                sim.set_positive_probability(*probability);
            }
            Priors::Values { values } => {
                sim.load_positive_probabilities(values)?;
            }
            Priors::File { path } => {
                sim.load_positive_probability_file(base_dir.join(path));
            }
            Priors::Estimated {
                prevalence,
                sensitivity,
                specificity,
            } => {
                let probs = estimated_priors(
                    sim.n_individuals(),
                    *prevalence,
                    *sensitivity,
                    *specificity,
                    rng,
                )
                .context("failed to estimate priors")?;
                sim.load_positive_probabilities(&probs)?;
            }
        }
        Ok(())
    }
}

/// Screening estimate of a population of `n_ind` individuals.
///
/// The first `P ~ B(n, prevalence)` individuals are truly positive. The
/// first `B(P, 1 - sensitivity)` of them are missed by the screening and
/// the next `B(n - P, 1 - specificity)` negatives are wrongly flagged.
pub fn estimated_priors<S: RandomSource>(
    n_ind: usize,
    prevalence: f64,
    sensitivity: f64,
    specificity: f64,
    rng: &mut S,
) -> Result<Vec<f64>> {
    let n_pos = rng.binomial(n_ind as u64, prevalence)? as usize;
    let n_false_neg = rng.binomial(n_pos as u64, 1.0 - sensitivity)? as usize;
    let n_false_pos = rng.binomial((n_ind - n_pos) as u64, 1.0 - specificity)? as usize;

    let mut probs = vec![0.0; n_ind];
    probs[n_false_neg..n_pos].fill(1.0);
    probs[n_pos..n_pos + n_false_pos].fill(1.0);

    log::debug!(
        "estimated priors: {n_pos} positives, {n_false_neg} missed, {n_false_pos} flagged"
    );
    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedSource};

    #[test]
    fn estimation_layout() {
        let mut rng = ScriptedSource::constant(0.5).with_binomials(vec![3, 1, 2]);
        let probs = estimated_priors(10, 0.3, 0.6, 0.7, &mut rng).unwrap();
        assert_eq!(
            probs,
            vec![0.0, 1.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn perfect_screening_keeps_positives() {
        let mut rng = RngSource::seeded(9);
        let probs = estimated_priors(1000, 0.1, 1.0, 1.0, &mut rng).unwrap();
        let n_pos = probs.iter().filter(|&&p| p == 1.0).count();
        assert!(probs[..n_pos].iter().all(|&p| p == 1.0));
        assert!(probs[n_pos..].iter().all(|&p| p == 0.0));
    }

    #[test]
    fn assign_each_kind() {
        let mut sim = Simulator::new(3, 0.0, 0.0).unwrap();
        let mut rng = RngSource::seeded(1);
        let dir = Path::new(".");

        Priors::Uniform { probability: 0.2 }
            .assign(&mut sim, dir, &mut rng)
            .unwrap();
        assert_eq!(sim.max_positive_probability(), 0.2);

        Priors::Values {
            values: vec![0.0, 0.5, 0.1],
        }
        .assign(&mut sim, dir, &mut rng)
        .unwrap();
        assert_eq!(sim.population()[1].positive_probability(), 0.5);

        Priors::File {
            path: PathBuf::from("does-not-exist.txt"),
        }
        .assign(&mut sim, dir, &mut rng)
        .unwrap();
        assert_eq!(sim.population()[2].positive_probability(), 0.1);
    }

    #[test]
    fn validation() {
        assert!(Priors::Uniform { probability: 1.2 }.validate(3).is_err());
        assert!(
            Priors::Values {
                values: vec![0.1; 2]
            }
            .validate(3)
            .is_err()
        );
        assert!(
            Priors::Estimated {
                prevalence: 0.1,
                sensitivity: 0.9,
                specificity: 0.95
            }
            .validate(3)
            .is_ok()
        );
    }
}
