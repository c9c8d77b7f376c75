//! Pooling models: how a population is split into groups and how each
//! group is distributed over trials.

mod grid;
mod shifted_traversal;
mod tournament;

pub use shifted_traversal::{compression_power, layers_for, trials_per_layer_for};
pub use tournament::DEFAULT_ADAPTIVE_THRESHOLDS;

use crate::model::{Group, GroupList, Individual};
use crate::testing_set::TestingSet;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Closed set of pooling strategies.
///
/// Each variant only carries its immutable parameters; the behavior lives in
/// [`PoolingModel::partition`] and [`PoolingModel::build_trials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PoolingModel {
    /// Every individual tested on its own.
    OneByOne,
    /// Fixed-size pools, each tested once.
    Tournament {
        pool_size: usize,
        #[serde(default)]
        order_by_probability: bool,
    },
    /// `grid_size x grid_size` groups tested by rows and columns.
    FullGrid { grid_size: usize },
    /// Groups laid on the border of a `grid_size x grid_size` grid, four trials each.
    BorderGrid { grid_size: usize },
    /// Shifted traversal design STD(n, q, k).
    ShiftedTraversal {
        group_size: usize,
        trials_per_layer: usize,
        layers: usize,
    },
    /// Pool size chosen from each individual's prior (8, 4, 2 or 1).
    TournamentAdaptive {
        #[serde(default = "default_adaptive_thresholds")]
        thresholds: [f64; 3],
    },
    /// Individuals with a nonzero prior alone, the rest in fixed-size pools.
    TournamentAdaptive2 { pool_size: usize },
}

fn default_adaptive_thresholds() -> [f64; 3] {
    DEFAULT_ADAPTIVE_THRESHOLDS
}

impl PoolingModel {
    /// Check that the model parameters describe a usable design.
    pub fn validate(&self) -> Result<()> {
        match *self {
            PoolingModel::OneByOne => {}
            PoolingModel::Tournament { pool_size, .. }
            | PoolingModel::TournamentAdaptive2 { pool_size } => {
                if pool_size == 0 {
                    bail!("pool size must be at least 1");
                }
            }
            PoolingModel::FullGrid { grid_size } | PoolingModel::BorderGrid { grid_size } => {
                if grid_size < 2 {
                    bail!("grid size must be at least 2, but is {grid_size}");
                }
            }
            PoolingModel::ShiftedTraversal {
                group_size,
                trials_per_layer,
                layers,
            } => {
                if group_size == 0 {
                    bail!("group size must be at least 1");
                }
                if trials_per_layer < 2 {
                    bail!("trials per layer must be at least 2, but is {trials_per_layer}");
                }
                if layers == 0 {
                    bail!("number of layers must be at least 1");
                }
            }
            PoolingModel::TournamentAdaptive { thresholds } => {
                if thresholds.iter().any(|th| !(0.0..=1.0).contains(th)) {
                    bail!("thresholds must be in the range 0..=1, but are {thresholds:?}");
                }
                if thresholds.windows(2).any(|w| w[0] > w[1]) {
                    bail!("thresholds must be non-decreasing, but are {thresholds:?}");
                }
            }
        }
        Ok(())
    }

    /// Short human-readable label.
    pub fn label(&self) -> String {
        match *self {
            PoolingModel::OneByOne => "OB".to_string(),
            PoolingModel::Tournament { pool_size, .. } => format!("TR{pool_size}"),
            PoolingModel::FullGrid { grid_size } => format!("FG{grid_size}"),
            PoolingModel::BorderGrid { grid_size } => format!("BG{grid_size}"),
            PoolingModel::ShiftedTraversal {
                group_size,
                trials_per_layer,
                layers,
            } => format!("ST({group_size},{trials_per_layer},{layers})"),
            PoolingModel::TournamentAdaptive { .. } => "TA".to_string(),
            PoolingModel::TournamentAdaptive2 { pool_size } => format!("TA{pool_size}"),
        }
    }

    /// Split the individuals `i_inds` (indices into `population`) into disjoint groups.
    pub fn partition(&self, i_inds: &[usize], population: &[Individual]) -> GroupList {
        match *self {
            PoolingModel::OneByOne => split_into_groups(i_inds, 1),
            PoolingModel::Tournament {
                pool_size,
                order_by_probability,
            } => tournament::partition(i_inds, population, pool_size, order_by_probability),
            PoolingModel::FullGrid { grid_size } => {
                split_into_groups(i_inds, grid::full_grid_sample_size(grid_size))
            }
            PoolingModel::BorderGrid { grid_size } => {
                split_into_groups(i_inds, grid::border_grid_sample_size(grid_size))
            }
            PoolingModel::ShiftedTraversal { group_size, .. } => {
                split_into_groups(i_inds, group_size)
            }
            PoolingModel::TournamentAdaptive { thresholds } => {
                tournament::adaptive_partition(i_inds, population, &thresholds)
            }
            PoolingModel::TournamentAdaptive2 { pool_size } => {
                tournament::adaptive2_partition(i_inds, population, pool_size)
            }
        }
    }

    /// Build the incidence matrix for a group of `n_ind` individuals.
    pub fn build_trials(&self, n_ind: usize) -> TestingSet {
        match *self {
            PoolingModel::OneByOne
            | PoolingModel::Tournament { .. }
            | PoolingModel::TournamentAdaptive { .. }
            | PoolingModel::TournamentAdaptive2 { .. } => TestingSet::single_trial_for_all(n_ind),
            PoolingModel::FullGrid { grid_size } => grid::full_grid_trials(n_ind, grid_size),
            PoolingModel::BorderGrid { grid_size } => grid::border_grid_trials(n_ind, grid_size),
            PoolingModel::ShiftedTraversal {
                trials_per_layer,
                layers,
                ..
            } => shifted_traversal::build(n_ind, trials_per_layer, layers),
        }
    }
}

/// Split `i_inds` into consecutive groups of `max_size` (the last one may be smaller).
pub fn split_into_groups(i_inds: &[usize], max_size: usize) -> GroupList {
    assert!(max_size > 0, "group size must be positive");
    let mut groups = GroupList::new();
    for chunk in i_inds.chunks(max_size) {
        groups.push(Group::from(chunk.to_vec()));
    }
    groups
}

/// Copy of `i_inds` sorted by ascending prior, ties kept in input order.
pub fn sorted_by_probability(i_inds: &[usize], population: &[Individual]) -> Vec<usize> {
    let mut sorted = i_inds.to_vec();
    sorted.sort_by(|&a, &b| {
        population[a]
            .positive_probability()
            .total_cmp(&population[b].positive_probability())
    });
    sorted
}
