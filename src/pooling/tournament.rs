//! Tournament partitions, fixed and adaptive.

use super::{sorted_by_probability, split_into_groups};
use crate::model::{Group, GroupList, Individual};

/// Prior cut-offs below which pools of 8, 4 and 2 individuals are used.
pub const DEFAULT_ADAPTIVE_THRESHOLDS: [f64; 3] = [0.10, 0.15, 0.20];

pub(super) fn partition(
    i_inds: &[usize],
    population: &[Individual],
    pool_size: usize,
    order_by_probability: bool,
) -> GroupList {
    if order_by_probability {
        let sorted = sorted_by_probability(i_inds, population);
        split_into_groups(&sorted, pool_size)
    } else {
        split_into_groups(i_inds, pool_size)
    }
}

fn adaptive_pool_size(prob: f64, thresholds: &[f64; 3]) -> usize {
    if prob < thresholds[0] {
        8
    } else if prob < thresholds[1] {
        4
    } else if prob < thresholds[2] {
        2
    } else {
        1
    }
}

pub(super) fn adaptive_partition(
    i_inds: &[usize],
    population: &[Individual],
    thresholds: &[f64; 3],
) -> GroupList {
    let sorted = sorted_by_probability(i_inds, population);

    let mut groups = GroupList::new();
    let mut group = Group::new();
    let mut cur_size = 0;

    for i_ind in sorted {
        let size = adaptive_pool_size(population[i_ind].positive_probability(), thresholds);
        // Open a new pool when the target size changes or the current one is full.
        if size != cur_size || group.len() == cur_size {
            groups.push(std::mem::take(&mut group));
            cur_size = size;
        }
        group.push(i_ind);
    }
    groups.push(group);

    groups
}

pub(super) fn adaptive2_partition(
    i_inds: &[usize],
    population: &[Individual],
    pool_size: usize,
) -> GroupList {
    let sorted = sorted_by_probability(i_inds, population);
    let (likely_pos, likely_neg): (Vec<usize>, Vec<usize>) = sorted
        .into_iter()
        .partition(|&i_ind| population[i_ind].positive_probability() > 0.0);

    let mut groups = split_into_groups(&likely_pos, 1);
    groups.append(split_into_groups(&likely_neg, pool_size));
    groups
}
