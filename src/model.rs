//! Simulation data types.

use crate::pooling::PoolingModel;
use serde::{Deserialize, Serialize};

/// Subject of the simulation.
///
/// The identifier and prior are fixed across rounds; the remaining fields
/// are reset by [`Individual::clear`] at the start of every round.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    id: usize,
    positive_probability: f64,
    positive: bool,
    resolved: bool,
    tested_positive: bool,
    confirmations: u32,
}

impl Individual {
    /// Create an individual with a zero prior and a cleared round state.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            positive_probability: 0.0,
            positive: false,
            resolved: false,
            tested_positive: false,
            confirmations: 0,
        }
    }

    /// Reset the round-scoped state.
    pub fn clear(&mut self) {
        self.positive = false;
        self.resolved = false;
        self.tested_positive = false;
        self.confirmations = 0;
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn positive_probability(&self) -> f64 {
        self.positive_probability
    }

    pub fn set_positive_probability(&mut self, prob: f64) {
        self.positive_probability = prob;
    }

    /// Ground truth for the current round.
    pub fn is_positive(&self) -> bool {
        self.positive
    }

    pub fn set_positive(&mut self, positive: bool) {
        self.positive = positive;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Inferred outcome, `None` until the individual is resolved.
    pub fn tested_positive(&self) -> Option<bool> {
        self.resolved.then_some(self.tested_positive)
    }

    /// Number of times a decoding rule fired for this individual.
    pub fn confirmations(&self) -> u32 {
        self.confirmations
    }

    /// Mark the individual as resolved with the given outcome.
    pub fn resolve(&mut self, tested_positive: bool) {
        self.resolved = true;
        self.tested_positive = tested_positive;
        self.confirmations += 1;
    }

    /// Whether the inferred outcome is missing or disagrees with the ground truth.
    pub fn is_error(&self) -> bool {
        self.tested_positive() != Some(self.positive)
    }
}

/// Ordered group of individuals, stored as indices into the population.
///
/// The local index of a member is its position in the group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    members: Vec<usize>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, i_ind: usize) {
        self.members.push(i_ind);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Population index of the member at local index `local`.
    pub fn member(&self, local: usize) -> usize {
        self.members[local]
    }

    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

impl From<Vec<usize>> for Group {
    fn from(members: Vec<usize>) -> Self {
        Self { members }
    }
}

/// Ordered list of disjoint groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupList {
    groups: Vec<Group>,
}

impl GroupList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a group; empty groups are dropped.
    pub fn push(&mut self, group: Group) {
        if !group.is_empty() {
            self.groups.push(group);
        }
    }

    /// Append every group of `other`, preserving its order.
    pub fn append(&mut self, other: GroupList) {
        self.groups.extend(other.groups);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    /// Total number of individuals over all groups.
    pub fn n_members(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}

impl<'a> IntoIterator for &'a GroupList {
    type Item = &'a Group;
    type IntoIter = std::slice::Iter<'a, Group>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ordered sequence of pooling models applied within one round.
///
/// Later models only see the individuals left unresolved by earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strategy {
    models: Vec<PoolingModel>,
}

impl Strategy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a model to the sequence.
    pub fn add(mut self, model: PoolingModel) -> Self {
        self.models.push(model);
        self
    }

    pub fn models(&self) -> &[PoolingModel] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl From<Vec<PoolingModel>> for Strategy {
    fn from(models: Vec<PoolingModel>) -> Self {
        Self { models }
    }
}
