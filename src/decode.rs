//! Inference of individual outcomes from pooled trial outcomes.

use crate::model::{Group, Individual};
use crate::testing_set::TestingSet;
use serde::{Deserialize, Serialize};

/// Rule used to declare individuals negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeRule {
    /// Negative when every trial the individual takes part in is negative.
    #[default]
    AllTrialsNegative,
    /// Negative when any trial the individual takes part in is negative.
    AnyTrialNegative,
}

/// Resolve the members of `group` from the outcomes of its trials.
///
/// Applies the negative rule first and then isolates single positives,
/// each exactly once.
pub fn decode_group(
    outcomes: &[bool],
    set: &TestingSet,
    group: &Group,
    population: &mut [Individual],
    rule: NegativeRule,
) {
    assert_eq!(outcomes.len(), set.n_trials(), "one outcome per trial");
    assert_eq!(group.len(), set.n_individuals(), "group and set sizes differ");

    match rule {
        NegativeRule::AllTrialsNegative => {
            resolve_all_trials_negative(outcomes, set, group, population)
        }
        NegativeRule::AnyTrialNegative => {
            resolve_any_trial_negative(outcomes, set, group, population)
        }
    }
    resolve_single_positive(outcomes, set, group, population);
}

/// Mark negative every individual whose trials all came back negative.
///
/// Individuals without trials and already resolved individuals are skipped.
pub fn resolve_all_trials_negative(
    outcomes: &[bool],
    set: &TestingSet,
    group: &Group,
    population: &mut [Individual],
) {
    for local in 0..set.n_individuals() {
        let ind = &mut population[group.member(local)];
        if ind.is_resolved() {
            continue;
        }
        let trials = set.trials_with_individual(local);
        if trials.is_empty() || trials.iter().any(|&t| outcomes[t]) {
            continue;
        }
        ind.resolve(false);
    }
}

/// Mark negative every unresolved individual present in at least one negative trial.
pub fn resolve_any_trial_negative(
    outcomes: &[bool],
    set: &TestingSet,
    group: &Group,
    population: &mut [Individual],
) {
    for (i_trial, _) in outcomes.iter().enumerate().filter(|(_, pos)| !**pos) {
        for local in set.individuals_in_trial(i_trial) {
            let ind = &mut population[group.member(local)];
            if !ind.is_resolved() {
                ind.resolve(false);
            }
        }
    }
}

/// Mark positive the only unresolved member of a positive trial whose
/// other members are all resolved negative.
///
/// Trials with several unresolved members are left alone.
pub fn resolve_single_positive(
    outcomes: &[bool],
    set: &TestingSet,
    group: &Group,
    population: &mut [Individual],
) {
    for (i_trial, _) in outcomes.iter().enumerate().filter(|(_, pos)| **pos) {
        let members = set.individuals_in_trial(i_trial);
        let mut n_neg = 0;
        let mut unresolved = Vec::new();

        for &local in &members {
            let ind = &population[group.member(local)];
            match ind.tested_positive() {
                None => unresolved.push(local),
                Some(false) => n_neg += 1,
                Some(true) => {}
            }
        }

        if unresolved.len() == 1 && n_neg == members.len() - 1 {
            population[group.member(unresolved[0])].resolve(true);
        }
    }
}
