//! Evidence: a partial assignment of variables to states.
//!
//! [`Evidence`] is name-based so hosts can build it without holding the
//! network. It is resolved against a network with
//! [`BayesianNetwork::resolve_evidence`](crate::engine::network::BayesianNetwork::resolve_evidence),
//! which rejects unknown variables and out-of-domain states up front.

use std::collections::BTreeMap;

use crate::engine::variable::{StateRef, VariableId};

/// Mapping from variable names to one state each.
///
/// Setting a variable twice keeps the last state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evidence {
    assignments: BTreeMap<String, StateRef>,
}

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, variable: impl Into<String>, state: impl Into<StateRef>) -> Self {
        self.insert(variable, state);
        self
    }

    /// Sets `variable` to `state`, returning the previous state if any.
    pub fn insert(
        &mut self,
        variable: impl Into<String>,
        state: impl Into<StateRef>,
    ) -> Option<StateRef> {
        self.assignments.insert(variable.into(), state.into())
    }

    pub fn remove(&mut self, variable: &str) -> Option<StateRef> {
        self.assignments.remove(variable)
    }

    pub fn get(&self, variable: &str) -> Option<&StateRef> {
        self.assignments.get(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.assignments.contains_key(variable)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Assignments in variable-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateRef)> + '_ {
        self.assignments.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, S> FromIterator<(K, S)> for Evidence
where
    K: Into<String>,
    S: Into<StateRef>,
{
    fn from_iter<T: IntoIterator<Item = (K, S)>>(iter: T) -> Self {
        let mut evidence = Evidence::new();
        for (variable, state) in iter {
            evidence.insert(variable, state);
        }
        evidence
    }
}

/// Evidence resolved to variable ids and state indices, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEvidence {
    assignments: Vec<(VariableId, usize)>,
}

impl ResolvedEvidence {
    pub(crate) fn new(assignments: Vec<(VariableId, usize)>) -> Self {
        Self { assignments }
    }

    /// State fixed for `id`, if any.
    pub fn state_of(&self, id: VariableId) -> Option<usize> {
        self.assignments
            .binary_search_by_key(&id, |(v, _)| *v)
            .ok()
            .map(|pos| self.assignments[pos].1)
    }

    pub fn contains(&self, id: VariableId) -> bool {
        self.state_of(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VariableId, usize)> + '_ {
        self.assignments.iter().copied()
    }
}
