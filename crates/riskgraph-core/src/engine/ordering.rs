//! Elimination order selection.
//!
//! The order in which variables are summed out changes the size of the
//! intermediate factors and so the cost of a query, never its result.
//! Greedy heuristics score each candidate on the interaction graph of the
//! current working factors (variables are adjacent when they share a
//! factor), eliminate the cheapest, and connect its neighbours. Ties go to
//! the candidate that comes first in reverse topological order, which keeps
//! every order deterministic.

use std::collections::{BTreeMap, BTreeSet};

use crate::engine::errors::InferenceError;
use crate::engine::factor::Factor;
use crate::engine::network::BayesianNetwork;
use crate::engine::variable::VariableId;

/// Strategy for ordering the variables to eliminate.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EliminationOrder {
    /// Reverse topological order of the network (leaves first).
    #[default]
    ReverseTopological,
    /// Fewest neighbours in the interaction graph.
    MinNeighbors,
    /// Smallest product of neighbour cardinalities.
    MinWeight,
    /// Fewest fill-in edges added by elimination.
    MinFill,
    /// Caller-supplied order naming every non-query, non-evidence variable
    /// exactly once. Variables pruned from a query are skipped.
    Explicit(Vec<String>),
}

impl EliminationOrder {
    pub(crate) fn validate(&self) -> Result<(), InferenceError> {
        if let Self::Explicit(names) = self {
            if names.is_empty() {
                return Err(InferenceError::Validation(
                    "explicit elimination order must not be empty".into(),
                ));
            }
            let unique: BTreeSet<&String> = names.iter().collect();
            if unique.len() != names.len() {
                return Err(InferenceError::Validation(
                    "explicit elimination order repeats a variable".into(),
                ));
            }
        }
        Ok(())
    }

    /// Orders `targets` for elimination from `factors`.
    ///
    /// `hidden` is every variable that is neither queried nor observed,
    /// including ones pruned from this query; an explicit order is checked
    /// against it so that the same order works whatever pruning removed.
    pub(crate) fn order(
        &self,
        network: &BayesianNetwork,
        targets: &BTreeSet<VariableId>,
        hidden: &BTreeSet<VariableId>,
        factors: &[Factor],
    ) -> Result<Vec<VariableId>, InferenceError> {
        let reverse_topo: Vec<VariableId> = network
            .topological_ids()
            .iter()
            .rev()
            .copied()
            .filter(|id| targets.contains(id))
            .collect();

        match self {
            Self::ReverseTopological => Ok(reverse_topo),
            Self::MinNeighbors => Ok(greedy(network, &reverse_topo, factors, Cost::Neighbors)),
            Self::MinWeight => Ok(greedy(network, &reverse_topo, factors, Cost::Weight)),
            Self::MinFill => Ok(greedy(network, &reverse_topo, factors, Cost::Fill)),
            Self::Explicit(names) => explicit(network, names, targets, hidden),
        }
    }
}

fn explicit(
    network: &BayesianNetwork,
    names: &[String],
    targets: &BTreeSet<VariableId>,
    hidden: &BTreeSet<VariableId>,
) -> Result<Vec<VariableId>, InferenceError> {
    let ids = names
        .iter()
        .map(|name| network.require_id(name))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(extra) = ids.iter().find(|id| !hidden.contains(*id)) {
        return Err(InferenceError::Validation(format!(
            "elimination order names '{}', which is queried or observed",
            network.name_of(*extra)
        )));
    }
    let listed: BTreeSet<VariableId> = ids.iter().copied().collect();
    if let Some(missing) = hidden.iter().find(|id| !listed.contains(*id)) {
        return Err(InferenceError::Validation(format!(
            "elimination order omits '{}'",
            network.name_of(*missing)
        )));
    }
    Ok(ids.into_iter().filter(|id| targets.contains(id)).collect())
}

#[derive(Debug, Clone, Copy)]
enum Cost {
    Neighbors,
    Weight,
    Fill,
}

fn greedy(
    network: &BayesianNetwork,
    candidates: &[VariableId],
    factors: &[Factor],
    cost: Cost,
) -> Vec<VariableId> {
    let mut graph: BTreeMap<VariableId, BTreeSet<VariableId>> = BTreeMap::new();
    for factor in factors {
        for &a in factor.scope() {
            let entry = graph.entry(a).or_default();
            entry.extend(factor.scope().iter().copied().filter(|&b| b != a));
        }
    }

    let mut remaining: Vec<VariableId> = candidates.to_vec();
    let mut order = Vec::with_capacity(remaining.len());
    while !remaining.is_empty() {
        let (slot, _) = remaining
            .iter()
            .enumerate()
            .map(|(slot, id)| (slot, score(network, &graph, *id, cost)))
            .min_by_key(|&(slot, score)| (score, slot))
            .unwrap_or((0, 0));
        let chosen = remaining.remove(slot);
        eliminate_from_graph(&mut graph, chosen);
        order.push(chosen);
    }
    order
}

fn score(
    network: &BayesianNetwork,
    graph: &BTreeMap<VariableId, BTreeSet<VariableId>>,
    id: VariableId,
    cost: Cost,
) -> u128 {
    let Some(neighbors) = graph.get(&id) else {
        return 0;
    };
    match cost {
        Cost::Neighbors => neighbors.len() as u128,
        Cost::Weight => neighbors
            .iter()
            .map(|n| network.cardinality_of(*n) as u128)
            .fold(1u128, u128::saturating_mul),
        Cost::Fill => {
            let list: Vec<VariableId> = neighbors.iter().copied().collect();
            let mut fill = 0u128;
            for (i, a) in list.iter().enumerate() {
                for b in &list[i + 1..] {
                    if !graph.get(a).is_some_and(|adj| adj.contains(b)) {
                        fill += 1;
                    }
                }
            }
            fill
        }
    }
}

fn eliminate_from_graph(graph: &mut BTreeMap<VariableId, BTreeSet<VariableId>>, id: VariableId) {
    let neighbors = graph.remove(&id).unwrap_or_default();
    for n in &neighbors {
        if let Some(adj) = graph.get_mut(n) {
            adj.remove(&id);
            adj.extend(neighbors.iter().copied().filter(|m| m != n));
        }
    }
}
