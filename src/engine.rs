//! Round-by-round simulation of a pooled testing strategy.

use crate::decode::{NegativeRule, decode_group};
use crate::model::{Group, Individual, Strategy};
use crate::pooling::PoolingModel;
use crate::random::RandomSource;
use crate::results::{RoundResult, SimulationResult};
use crate::testing_set::TestingSet;
use crate::utils::{check_num, check_prob_vec};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Pooled testing simulator.
///
/// Owns the population and runs rounds of a [`Strategy`] against it. Every
/// round samples a new ground truth, applies the strategy's models followed
/// by a final one-by-one pass, and tallies trials and errors.
#[derive(Debug, Clone)]
pub struct Simulator {
    population: Vec<Individual>,
    order: Vec<usize>,
    false_neg_rate: f64,
    false_pos_rate: f64,
    negative_rule: NegativeRule,
}

impl Simulator {
    /// Create a simulator for `n_ind` individuals with zero priors.
    ///
    /// The noise rates are applied independently to every trial.
    pub fn new(n_ind: usize, false_neg_rate: f64, false_pos_rate: f64) -> Result<Self> {
        check_num(false_neg_rate, 0.0..=1.0).context("invalid false negative rate")?;
        check_num(false_pos_rate, 0.0..=1.0).context("invalid false positive rate")?;

        Ok(Self {
            population: (0..n_ind).map(Individual::new).collect(),
            order: (0..n_ind).collect(),
            false_neg_rate,
            false_pos_rate,
            negative_rule: NegativeRule::default(),
        })
    }

    pub fn with_negative_rule(mut self, negative_rule: NegativeRule) -> Self {
        self.negative_rule = negative_rule;
        self
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn n_individuals(&self) -> usize {
        self.population.len()
    }

    /// Give every individual the same prior.
    pub fn set_positive_probability(&mut self, prob: f64) -> &mut Self {
        for ind in &mut self.population {
            ind.set_positive_probability(prob);
        }
        self
    }

    /// Set the prior of the individual at `i_ind`.
    pub fn set_positive_probability_at(&mut self, i_ind: usize, prob: f64) -> &mut Self {
        self.population[i_ind].set_positive_probability(prob);
        self
    }

    /// Set one prior per individual.
    pub fn load_positive_probabilities(&mut self, probs: &[f64]) -> Result<&mut Self> {
        check_prob_vec(probs, self.population.len()).context("invalid prior probabilities")?;
        for (ind, &prob) in self.population.iter_mut().zip(probs) {
            ind.set_positive_probability(prob);
        }
        Ok(self)
    }

    /// Load priors from a file with one decimal probability per line.
    ///
    /// Any failure leaves every prior untouched and is only logged.
    pub fn load_positive_probability_file<P: AsRef<Path>>(&mut self, file: P) -> &mut Self {
        let file = file.as_ref();
        match self.read_probability_file(file) {
            Ok(probs) => {
                for (ind, prob) in self.population.iter_mut().zip(probs) {
                    ind.set_positive_probability(prob);
                }
            }
            Err(error) => log::warn!("ignoring priors from {file:?}: {error:#}"),
        }
        self
    }

    fn read_probability_file(&self, file: &Path) -> Result<Vec<f64>> {
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;
        let probs = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i_line, line)| -> Result<f64> {
                let prob = line
                    .parse::<f64>()
                    .with_context(|| format!("failed to parse line {}: {line:?}", i_line + 1))?;
                check_num(prob, 0.0..=1.0)
                    .with_context(|| format!("invalid probability on line {}", i_line + 1))?;
                Ok(prob)
            })
            .collect::<Result<Vec<_>>>()?;
        check_num(probs.len(), 0..=self.population.len())
            .context("more priors than individuals")?;
        Ok(probs)
    }

    /// Largest prior over the population (0 for an empty population).
    pub fn max_positive_probability(&self) -> f64 {
        self.population
            .iter()
            .map(Individual::positive_probability)
            .fold(0.0, f64::max)
    }

    /// Run `n_rounds` rounds of `strategy`.
    pub fn run<S: RandomSource>(
        &mut self,
        n_rounds: usize,
        strategy: &Strategy,
        rng: &mut S,
    ) -> SimulationResult {
        let mut results = SimulationResult::new();
        for i_round in 0..n_rounds {
            let round = self.run_round(strategy, rng);
            log::debug!(
                "round {i_round}: {} trials, {} errors",
                round.trials,
                round.errors
            );
            results.add(round.trials, round.errors);
        }
        results
    }

    fn run_round<S: RandomSource>(&mut self, strategy: &Strategy, rng: &mut S) -> RoundResult {
        for ind in &mut self.population {
            ind.clear();
        }
        self.sample_ground_truth(rng);
        rng.shuffle(&mut self.order);

        let mut trials = 0;
        for model in strategy.models() {
            trials += self.run_model(model, rng);
        }
        trials += self.run_model(&PoolingModel::OneByOne, rng);

        let errors = self.population.iter().filter(|ind| ind.is_error()).count();
        RoundResult { trials, errors }
    }

    fn sample_ground_truth<S: RandomSource>(&mut self, rng: &mut S) {
        for ind in &mut self.population {
            let positive = rng.uniform() < ind.positive_probability();
            ind.set_positive(positive);
        }
    }

    /// Apply one pooling model to the unresolved individuals and return its trial count.
    fn run_model<S: RandomSource>(&mut self, model: &PoolingModel, rng: &mut S) -> usize {
        let mut unresolved: Vec<_> = self
            .order
            .iter()
            .copied()
            .filter(|&i_ind| !self.population[i_ind].is_resolved())
            .collect();
        if unresolved.is_empty() {
            return 0;
        }
        rng.shuffle(&mut unresolved);

        let groups = model.partition(&unresolved, &self.population);

        let mut trials = 0;
        for group in &groups {
            if group.is_empty() {
                continue;
            }
            let set = model.build_trials(group.len());
            let outcomes = self.trial_outcomes(&set, group, rng);
            decode_group(
                &outcomes,
                &set,
                group,
                &mut self.population,
                self.negative_rule,
            );
            trials += set.n_trials();
        }

        log::trace!(
            "{}: {} individuals in {} groups, {trials} trials",
            model.label(),
            unresolved.len(),
            groups.len()
        );
        trials
    }

    /// Noisy outcome of every trial of `set` for the members of `group`.
    fn trial_outcomes<S: RandomSource>(
        &self,
        set: &TestingSet,
        group: &Group,
        rng: &mut S,
    ) -> Vec<bool> {
        (0..set.n_trials())
            .map(|i_trial| {
                let positive = set
                    .individuals_in_trial(i_trial)
                    .into_iter()
                    .any(|local| self.population[group.member(local)].is_positive());
                if positive {
                    rng.uniform() >= self.false_neg_rate
                } else {
                    rng.uniform() < self.false_pos_rate
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{RngSource, ScriptedSource};

    fn tournament(pool_size: usize) -> PoolingModel {
        PoolingModel::Tournament {
            pool_size,
            order_by_probability: false,
        }
    }

    #[test]
    fn all_negative_pool_costs_one_trial() {
        let mut sim = Simulator::new(4, 0.0, 0.0).unwrap();
        let strategy = Strategy::new().add(tournament(4));
        let mut rng = RngSource::seeded(1);

        let res = sim.run(3, &strategy, &mut rng);
        for round in res.rounds() {
            assert_eq!(*round, RoundResult { trials: 1, errors: 0 });
        }
        assert!(
            sim.population()
                .iter()
                .all(|ind| ind.tested_positive() == Some(false))
        );
    }

    #[test]
    fn single_positive_pool_falls_back_to_individual_tests() {
        let mut sim = Simulator::new(4, 0.0, 0.0).unwrap();
        sim.load_positive_probabilities(&[0.0, 1.0, 0.0, 0.0]).unwrap();
        let strategy = Strategy::new().add(tournament(4));
        let mut rng = RngSource::seeded(2);

        let res = sim.run(5, &strategy, &mut rng);
        for round in res.rounds() {
            assert_eq!(*round, RoundResult { trials: 5, errors: 0 });
        }
        let ind = &sim.population()[1];
        assert!(ind.is_positive());
        assert_eq!(ind.tested_positive(), Some(true));
    }

    #[test]
    fn one_by_one_is_exact_without_noise() {
        let mut sim = Simulator::new(200, 0.0, 0.0).unwrap();
        sim.set_positive_probability(0.3);
        let mut rng = RngSource::seeded(3);

        let res = sim.run(10, &Strategy::new(), &mut rng);
        for round in res.rounds() {
            assert_eq!(*round, RoundResult { trials: 200, errors: 0 });
        }
    }

    #[test]
    fn full_grid_with_one_positive() {
        let mut sim = Simulator::new(9, 0.0, 0.0).unwrap();
        sim.set_positive_probability_at(4, 1.0);
        let strategy = Strategy::new().add(PoolingModel::FullGrid { grid_size: 3 });
        let mut rng = RngSource::seeded(4);

        // 6 grid trials clear the 4 individuals outside the positive row and
        // column; the other 5 are tested one by one.
        let res = sim.run(5, &strategy, &mut rng);
        for round in res.rounds() {
            assert_eq!(*round, RoundResult { trials: 11, errors: 0 });
        }
    }

    #[test]
    fn noiseless_decoding_never_errs() {
        let strategies = [
            Strategy::new().add(tournament(5)),
            Strategy::new().add(PoolingModel::FullGrid { grid_size: 4 }),
            Strategy::new().add(PoolingModel::BorderGrid { grid_size: 4 }),
            Strategy::new().add(PoolingModel::ShiftedTraversal {
                group_size: 9,
                trials_per_layer: 3,
                layers: 4,
            }),
            Strategy::new()
                .add(tournament(8))
                .add(tournament(2)),
            Strategy::new().add(PoolingModel::TournamentAdaptive {
                thresholds: crate::pooling::DEFAULT_ADAPTIVE_THRESHOLDS,
            }),
            Strategy::new().add(PoolingModel::TournamentAdaptive2 { pool_size: 6 }),
        ];
        let mut rng = RngSource::seeded(5);
        // Mixed priors so the adaptive models build pools of every size.
        let probs: Vec<_> = (0..103)
            .map(|i| [0.0, 0.02, 0.12, 0.17, 0.3][i % 5])
            .collect();

        for strategy in &strategies {
            let mut sim = Simulator::new(103, 0.0, 0.0).unwrap();
            sim.load_positive_probabilities(&probs).unwrap();
            let res = sim.run(20, strategy, &mut rng);
            assert!(res.rounds().iter().all(|r| r.errors == 0), "{strategy:?}");
            assert!(
                sim.population()
                    .iter()
                    .all(|ind| ind.tested_positive() == Some(ind.is_positive())),
                "{strategy:?}"
            );
        }
    }

    #[test]
    fn false_positives_flip_negative_trials() {
        let mut sim = Simulator::new(4, 0.0, 1.0).unwrap();
        let strategy = Strategy::new().add(tournament(4));
        let mut rng = ScriptedSource::constant(0.5);

        let res = sim.run(1, &strategy, &mut rng);
        // Pool flips positive, then every single test flips positive too.
        assert_eq!(res.rounds(), &[RoundResult { trials: 5, errors: 4 }]);
    }

    #[test]
    fn false_negatives_hide_positives() {
        let mut sim = Simulator::new(4, 1.0, 0.0).unwrap();
        sim.set_positive_probability_at(2, 1.0);
        let mut rng = ScriptedSource::constant(0.5);

        let res = sim.run(1, &Strategy::new(), &mut rng);
        assert_eq!(res.rounds(), &[RoundResult { trials: 4, errors: 1 }]);
        assert_eq!(sim.population()[2].tested_positive(), Some(false));
    }

    #[test]
    fn noise_draws_compare_against_rates() {
        // Uniform 0.5 is below a false negative rate of 0.6 but not below 0.4.
        let mut sim = Simulator::new(1, 0.6, 0.0).unwrap();
        sim.set_positive_probability(1.0);
        let res = sim.run(1, &Strategy::new(), &mut ScriptedSource::constant(0.5));
        assert_eq!(res.rounds()[0].errors, 1);

        let mut sim = Simulator::new(1, 0.4, 0.0).unwrap();
        sim.set_positive_probability(1.0);
        let res = sim.run(1, &Strategy::new(), &mut ScriptedSource::constant(0.5));
        assert_eq!(res.rounds()[0].errors, 0);
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let strategy = Strategy::new().add(PoolingModel::ShiftedTraversal {
            group_size: 20,
            trials_per_layer: 5,
            layers: 3,
        });
        let run = |seed| {
            let mut sim = Simulator::new(150, 0.05, 0.02).unwrap();
            sim.set_positive_probability(0.04);
            sim.run(25, &strategy, &mut RngSource::seeded(seed))
        };
        assert_eq!(run(11), run(11));
    }

    #[test]
    fn later_models_only_see_unresolved() {
        // Everyone negative: the first pool resolves all, the rest cost nothing.
        let mut sim = Simulator::new(8, 0.0, 0.0).unwrap();
        let strategy = Strategy::new()
            .add(tournament(8))
            .add(PoolingModel::FullGrid { grid_size: 2 });
        let res = sim.run(1, &strategy, &mut RngSource::seeded(6));
        assert_eq!(res.rounds(), &[RoundResult { trials: 1, errors: 0 }]);
    }

    #[test]
    fn priors_from_file() {
        let dir = std::env::temp_dir().join(format!("poolsim-priors-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let good = dir.join("good.txt");
        fs::write(&good, "0.1\n0.2\n0.3\n").unwrap();
        let mut sim = Simulator::new(4, 0.0, 0.0).unwrap();
        sim.load_positive_probability_file(&good);
        let probs: Vec<_> = sim
            .population()
            .iter()
            .map(Individual::positive_probability)
            .collect();
        assert_eq!(probs, vec![0.1, 0.2, 0.3, 0.0]);
        assert_eq!(sim.max_positive_probability(), 0.3);

        let bad = dir.join("bad.txt");
        fs::write(&bad, "0.5\nnope\n").unwrap();
        let mut sim = Simulator::new(4, 0.0, 0.0).unwrap();
        sim.set_positive_probability(0.01);
        sim.load_positive_probability_file(&bad);
        sim.load_positive_probability_file(dir.join("missing.txt"));
        assert!(
            sim.population()
                .iter()
                .all(|ind| ind.positive_probability() == 0.01)
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejected_priors_files_leave_priors_untouched() {
        let dir = std::env::temp_dir().join(format!("poolsim-rejected-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let out_of_range = dir.join("out_of_range.txt");
        fs::write(&out_of_range, "1.5\n-0.3\nNaN\n").unwrap();
        let surplus = dir.join("surplus.txt");
        fs::write(&surplus, "0.1\n0.2\n0.3\n0.4\n").unwrap();

        for file in [&out_of_range, &surplus] {
            let mut sim = Simulator::new(3, 0.0, 0.0).unwrap();
            sim.set_positive_probability(0.01);
            sim.load_positive_probability_file(file);
            let probs: Vec<_> = sim
                .population()
                .iter()
                .map(Individual::positive_probability)
                .collect();
            assert_eq!(probs, vec![0.01; 3], "{file:?}");
        }

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn negative_rules_differ_on_noisy_grid() {
        // 2x2 grid with individual 0 positive. Draws: 4 for the ground truth,
        // then rows 0 and 1 and columns 0 and 1; column 0 reads negative
        // (0.1 < false negative rate), then two one-by-one tests.
        let script = vec![0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.1, 0.0, 0.9, 0.9];
        let strategy = Strategy::new().add(PoolingModel::FullGrid { grid_size: 2 });
        let run = |rule| {
            let mut sim = Simulator::new(4, 0.5, 0.0)
                .unwrap()
                .with_negative_rule(rule);
            sim.set_positive_probability_at(0, 1.0);
            let mut rng = ScriptedSource::new(script.clone());
            let res = sim.run(1, &strategy, &mut rng);
            (res.rounds()[0], sim.population()[0].tested_positive())
        };

        // Only row 0 is positive: individuals 0 and 1 stay open and are retested.
        assert_eq!(
            run(NegativeRule::AllTrialsNegative),
            (RoundResult { trials: 6, errors: 0 }, Some(true))
        );
        // The hidden column clears individual 0 and nobody is retested.
        assert_eq!(
            run(NegativeRule::AnyTrialNegative),
            (RoundResult { trials: 4, errors: 1 }, Some(false))
        );
    }

    #[test]
    fn any_trial_rule_saves_trials_without_noise() {
        let strategy = Strategy::new().add(PoolingModel::FullGrid { grid_size: 2 });
        let run = |rule| {
            let mut sim = Simulator::new(4, 0.0, 0.0)
                .unwrap()
                .with_negative_rule(rule);
            sim.set_positive_probability_at(0, 1.0);
            sim.run(3, &strategy, &mut RngSource::seeded(8))
        };

        // Strict rule: 4 grid trials, then the positive row and column are retested.
        for round in run(NegativeRule::AllTrialsNegative).rounds() {
            assert_eq!(*round, RoundResult { trials: 7, errors: 0 });
        }
        // Any-trial rule: the other members clear and the positive is isolated.
        for round in run(NegativeRule::AnyTrialNegative).rounds() {
            assert_eq!(*round, RoundResult { trials: 4, errors: 0 });
        }
    }

    #[test]
    fn rejects_invalid_rates() {
        assert!(Simulator::new(10, 1.5, 0.0).is_err());
        assert!(Simulator::new(10, 0.0, -0.1).is_err());
    }
}
