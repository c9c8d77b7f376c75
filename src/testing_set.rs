//! Individual-by-trial incidence matrix of a group.

use std::fmt;

/// Incidence matrix of one group: which individual takes part in which trial.
///
/// Indices are local to the group. The shape is fixed at construction and
/// out-of-range indices panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestingSet {
    n_ind: usize,
    n_trials: usize,
    cells: Vec<bool>,
}

impl TestingSet {
    /// Create a set with no memberships.
    pub fn new(n_ind: usize, n_trials: usize) -> Self {
        Self {
            n_ind,
            n_trials,
            cells: vec![false; n_ind * n_trials],
        }
    }

    /// Create a set with one trial containing every individual.
    pub fn single_trial_for_all(n_ind: usize) -> Self {
        let mut set = Self::new(n_ind, 1);
        for i_ind in 0..n_ind {
            set.set(i_ind, 0, true);
        }
        set
    }

    pub fn n_individuals(&self) -> usize {
        self.n_ind
    }

    pub fn n_trials(&self) -> usize {
        self.n_trials
    }

    pub fn set(&mut self, i_ind: usize, i_trial: usize, member: bool) {
        let idx = self.index(i_ind, i_trial);
        self.cells[idx] = member;
    }

    /// Whether individual `i_ind` takes part in trial `i_trial`.
    pub fn contains(&self, i_ind: usize, i_trial: usize) -> bool {
        self.cells[self.index(i_ind, i_trial)]
    }

    pub fn count_individuals_in_trial(&self, i_trial: usize) -> usize {
        (0..self.n_ind)
            .filter(|&i_ind| self.contains(i_ind, i_trial))
            .count()
    }

    pub fn count_trials_with_individual(&self, i_ind: usize) -> usize {
        (0..self.n_trials)
            .filter(|&i_trial| self.contains(i_ind, i_trial))
            .count()
    }

    /// Local indices of the members of trial `i_trial`, ascending.
    pub fn individuals_in_trial(&self, i_trial: usize) -> Vec<usize> {
        (0..self.n_ind)
            .filter(|&i_ind| self.contains(i_ind, i_trial))
            .collect()
    }

    /// Trials that individual `i_ind` takes part in, ascending.
    pub fn trials_with_individual(&self, i_ind: usize) -> Vec<usize> {
        (0..self.n_trials)
            .filter(|&i_trial| self.contains(i_ind, i_trial))
            .collect()
    }

    fn index(&self, i_ind: usize, i_trial: usize) -> usize {
        assert!(
            i_ind < self.n_ind && i_trial < self.n_trials,
            "cell ({i_ind}, {i_trial}) out of range for {}x{} testing set",
            self.n_ind,
            self.n_trials
        );
        i_ind * self.n_trials + i_trial
    }
}

impl fmt::Display for TestingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i_trial in 0..self.n_trials {
            for i_ind in 0..self.n_ind {
                let cell = if self.contains(i_ind, i_trial) { '*' } else { '.' };
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
