//! Full and border grid designs.

use crate::testing_set::TestingSet;

pub(super) fn full_grid_sample_size(grid_size: usize) -> usize {
    grid_size * grid_size
}

/// Number of cells on the border of a `grid_size x grid_size` grid.
pub(super) fn border_grid_sample_size(grid_size: usize) -> usize {
    assert!(grid_size >= 2, "border grid needs a grid size of at least 2");
    2 * grid_size + 2 * (grid_size - 2)
}

/// One trial per row and one per column of a row-major grid.
///
/// Groups of any other size than `grid_size^2` get a single pooled trial.
pub(super) fn full_grid_trials(n_ind: usize, grid_size: usize) -> TestingSet {
    if n_ind != full_grid_sample_size(grid_size) {
        return TestingSet::single_trial_for_all(n_ind);
    }

    let mut set = TestingSet::new(n_ind, 2 * grid_size);
    for row in 0..grid_size {
        for col in 0..grid_size {
            let i_ind = row * grid_size + col;
            set.set(i_ind, row, true);
            set.set(i_ind, grid_size + col, true);
        }
    }
    set
}

/// Four overlapping segments walking around the border of the grid.
///
/// Trial `i` takes `grid_size - 1` consecutive border cells starting at
/// `i * (grid_size - 1)` plus the first cell of the next segment, so each
/// corner is shared by two adjacent trials.
pub(super) fn border_grid_trials(n_ind: usize, grid_size: usize) -> TestingSet {
    let sample_size = border_grid_sample_size(grid_size);
    if n_ind != sample_size {
        return TestingSet::single_trial_for_all(n_ind);
    }

    let side = grid_size - 1;
    let mut set = TestingSet::new(n_ind, 4);
    for i_trial in 0..4 {
        for j in 0..side {
            set.set((i_trial * side + j) % sample_size, i_trial, true);
        }
        set.set(((i_trial + 1) * side) % sample_size, i_trial, true);
    }
    set
}
