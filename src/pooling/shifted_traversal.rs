//! Shifted traversal design STD(n, q, k).
//!
//! The `k * q` trials are arranged in `k` layers of `q` trials. In every
//! layer each individual sits in exactly one trial, chosen by rotating a
//! unit vector of length `q` by a shift derived from the base-`q` digits of
//! the individual's index. With `q` prime and `k = q + 1` any two
//! individuals of a group with `n <= q^2` share at least one trial.

use crate::prime::next_prime;
use crate::testing_set::TestingSet;

/// Compression power `θ = ceil(log_q(n)) - 1`.
///
/// Computed with integer arithmetic; a single individual has `θ = 0`.
pub fn compression_power(n_ind: usize, trials_per_layer: usize) -> u32 {
    assert!(n_ind > 0, "compression power needs at least one individual");
    assert!(
        trials_per_layer >= 2,
        "compression power needs at least two trials per layer"
    );
    let mut n_digits: u32 = 0;
    let mut capacity: u128 = 1;
    while capacity < n_ind as u128 {
        capacity *= trials_per_layer as u128;
        n_digits += 1;
    }
    n_digits.saturating_sub(1)
}

/// Layers needed to detect `n_pos` positives while tolerating `n_err` errors.
pub fn layers_for(n_ind: usize, n_pos: usize, n_err: usize, trials_per_layer: usize) -> usize {
    assert!(n_ind >= 2, "design sizing needs at least two individuals");
    let theta = compression_power(n_ind, trials_per_layer) as usize;
    n_pos * theta + 2 * n_err + 1
}

/// Smallest prime `q` (searched upwards from 2) whose required layer count fits in `q + 1`.
pub fn trials_per_layer_for(n_ind: usize, n_pos: usize, n_err: usize) -> usize {
    let mut trials_per_layer = 2;
    while layers_for(n_ind, n_pos, n_err, trials_per_layer) > trials_per_layer + 1 {
        trials_per_layer = next_prime(trials_per_layer);
    }
    trials_per_layer
}

/// Position of the single set bit in layer `layer` for individual `i_ind`.
fn shift(i_ind: usize, layer: usize, q: usize, theta: u32) -> usize {
    if layer >= q {
        // Redundancy layer: most significant digit only.
        return (i_ind / q.pow(theta)) % q;
    }
    let mut sum = 0;
    let mut layer_pow = 1 % q;
    let mut q_pow = 1;
    for _ in 0..=theta {
        sum = (sum + layer_pow * ((i_ind / q_pow) % q)) % q;
        layer_pow = (layer_pow * layer) % q;
        q_pow = q_pow.saturating_mul(q);
    }
    sum
}

pub(super) fn build(n_ind: usize, trials_per_layer: usize, layers: usize) -> TestingSet {
    let q = trials_per_layer;
    let mut set = TestingSet::new(n_ind, q * layers);
    if n_ind == 0 {
        return set;
    }

    let theta = compression_power(n_ind, q);
    for layer in 0..layers {
        for i_ind in 0..n_ind {
            let pos = shift(i_ind, layer, q, theta);
            set.set(i_ind, layer * q + pos, true);
        }
    }

    log::trace!("STD({n_ind}, {q}, {layers}) with theta {theta}:\n{set}");
    set
}
