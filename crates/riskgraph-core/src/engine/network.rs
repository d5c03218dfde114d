//! # Bayesian Network
//!
//! A validated, immutable directed acyclic graph of discrete [`Variable`]s,
//! each owning exactly one [`TabularCpd`].
//!
//! ## Construction
//!
//! [`BayesianNetwork::build`] (or the incremental [`NetworkBuilder`]) checks,
//! once, that:
//!
//! - variable names are unique
//! - edges reference declared variables, contain no self-loops or duplicates,
//!   and form no cycle
//! - every variable has exactly one CPD and no CPD names an unknown variable
//! - each CPD's parent set equals the owner's in-edges (order-independent)
//! - each table has `cardinality` rows, `Π parent cardinalities` columns, and
//!   columns summing to one within [`BuildConfig::column_tolerance`]
//!
//! Any violation is an [`InferenceError::Structure`]. A built network is never
//! mutated, so it can be shared freely across threads and queries.

use std::collections::BTreeSet;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::engine::cpd::{TabularCpd, DEFAULT_COLUMN_TOLERANCE};
use crate::engine::errors::InferenceError;
use crate::engine::evidence::{Evidence, ResolvedEvidence};
use crate::engine::factor::Factor;
use crate::engine::variable::{StateRef, Variable, VariableId};

/// Options for network validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildConfig {
    /// Maximum allowed deviation of a CPD column sum from 1.
    pub column_tolerance: f64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            column_tolerance: DEFAULT_COLUMN_TOLERANCE,
        }
    }
}

impl BuildConfig {
    fn validate(self) -> Result<Self, InferenceError> {
        if !self.column_tolerance.is_finite() || self.column_tolerance <= 0.0 {
            return Err(InferenceError::Validation(
                "build: column_tolerance must be finite and > 0".into(),
            ));
        }
        Ok(self)
    }
}

/// Immutable, validated discrete Bayesian network.
#[derive(Debug, Clone)]
pub struct BayesianNetwork {
    variables: Vec<Variable>,
    index: FxHashMap<Arc<str>, VariableId>,
    /// Parents of each variable in its CPD's column order.
    parents: Vec<Vec<VariableId>>,
    /// Children of each variable in id order.
    children: Vec<Vec<VariableId>>,
    cpds: Vec<TabularCpd>,
    /// Each CPD as a factor with scope `[owner, parents...]`.
    factors: Vec<Factor>,
    topological: Vec<VariableId>,
}

impl BayesianNetwork {
    /// Builds and validates a network with the default [`BuildConfig`].
    pub fn build<I, P, C>(
        variables: Vec<Variable>,
        edges: I,
        cpds: Vec<TabularCpd>,
    ) -> Result<Self, InferenceError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        Self::build_with_config(variables, edges, cpds, BuildConfig::default())
    }

    /// Builds and validates a network with explicit configuration.
    pub fn build_with_config<I, P, C>(
        variables: Vec<Variable>,
        edges: I,
        cpds: Vec<TabularCpd>,
        config: BuildConfig,
    ) -> Result<Self, InferenceError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        let config = config.validate()?;

        let mut index: FxHashMap<Arc<str>, VariableId> = FxHashMap::default();
        for (idx, variable) in variables.iter().enumerate() {
            let id = VariableId(idx as u32);
            if index.insert(variable.name_arc().clone(), id).is_some() {
                return Err(InferenceError::Structure(format!(
                    "variable '{}' declared twice",
                    variable.name()
                )));
            }
        }

        let lookup = |name: &str, role: &str| {
            index.get(name).copied().ok_or_else(|| {
                InferenceError::Structure(format!("{} references unknown variable '{}'", role, name))
            })
        };

        let n = variables.len();
        let mut in_edges: Vec<BTreeSet<VariableId>> = vec![BTreeSet::new(); n];
        let mut children: Vec<BTreeSet<VariableId>> = vec![BTreeSet::new(); n];
        for (parent, child) in edges {
            let (parent, child) = (parent.as_ref(), child.as_ref());
            let p = lookup(parent, "edge")?;
            let c = lookup(child, "edge")?;
            if p == c {
                return Err(InferenceError::Structure(format!(
                    "self-loop on variable '{}'",
                    parent
                )));
            }
            if !in_edges[c.index()].insert(p) {
                return Err(InferenceError::Structure(format!(
                    "duplicate edge '{} -> {}'",
                    parent, child
                )));
            }
            children[p.index()].insert(c);
        }

        let topological = topological_order(&variables, &in_edges, &children)?;

        let mut slots: Vec<Option<TabularCpd>> = vec![None; n];
        for cpd in cpds {
            let owner = lookup(cpd.variable(), "cpd")?;
            if slots[owner.index()].is_some() {
                return Err(InferenceError::Structure(format!(
                    "variable '{}' has more than one cpd",
                    cpd.variable()
                )));
            }
            slots[owner.index()] = Some(cpd);
        }

        let mut parents = Vec::with_capacity(n);
        let mut owned_cpds = Vec::with_capacity(n);
        let mut factors = Vec::with_capacity(n);
        for (idx, slot) in slots.into_iter().enumerate() {
            let variable = &variables[idx];
            let cpd = slot.ok_or_else(|| {
                InferenceError::Structure(format!("variable '{}' has no cpd", variable.name()))
            })?;

            let cpd_parents = cpd
                .parents()
                .map(|p| lookup(p, "cpd parent list"))
                .collect::<Result<Vec<_>, _>>()?;
            let declared: BTreeSet<VariableId> = cpd_parents.iter().copied().collect();
            if declared.len() != cpd_parents.len() || declared != in_edges[idx] {
                return Err(InferenceError::Structure(format!(
                    "cpd '{}' lists parents [{}] but the edges declare [{}]",
                    variable.name(),
                    join_names(&variables, cpd_parents.iter().copied()),
                    join_names(&variables, in_edges[idx].iter().copied()),
                )));
            }

            let parent_cards: Vec<usize> = cpd_parents
                .iter()
                .map(|p| variables[p.index()].cardinality())
                .collect();
            cpd.validate_shape(variable.cardinality(), &parent_cards, config.column_tolerance)?;
            factors.push(cpd.to_factor(
                VariableId(idx as u32),
                &cpd_parents,
                variable.cardinality(),
                &parent_cards,
            )?);
            parents.push(cpd_parents);
            owned_cpds.push(cpd);
        }

        Ok(Self {
            variables,
            index,
            parents,
            children: children
                .into_iter()
                .map(|c| c.into_iter().collect())
                .collect(),
            cpds: owned_cpds,
            factors,
            topological,
        })
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables in declaration order (position = [`VariableId`]).
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Looks up a variable id by name.
    pub fn id(&self, name: &str) -> Option<VariableId> {
        self.index.get(name).copied()
    }

    /// Looks up a variable id, failing with [`InferenceError::UnknownVariable`].
    pub fn require_id(&self, name: &str) -> Result<VariableId, InferenceError> {
        self.id(name).ok_or_else(|| {
            InferenceError::UnknownVariable(format!("'{}' is not a variable of this network", name))
        })
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.id(name).map(|id| &self.variables[id.index()])
    }

    pub fn variable_by_id(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.index())
    }

    /// Name of a variable by id. Ids handed out by this network are always valid.
    pub(crate) fn name_of(&self, id: VariableId) -> &str {
        self.variables[id.index()].name()
    }

    pub(crate) fn cardinality_of(&self, id: VariableId) -> usize {
        self.variables[id.index()].cardinality()
    }

    pub fn cpd(&self, name: &str) -> Option<&TabularCpd> {
        self.id(name).map(|id| &self.cpds[id.index()])
    }

    /// Parent names in CPD column order.
    pub fn parents(&self, name: &str) -> Option<Vec<&str>> {
        self.id(name).map(|id| {
            self.parents[id.index()]
                .iter()
                .map(|p| self.name_of(*p))
                .collect()
        })
    }

    pub fn children(&self, name: &str) -> Option<Vec<&str>> {
        self.id(name).map(|id| {
            self.children[id.index()]
                .iter()
                .map(|c| self.name_of(*c))
                .collect()
        })
    }

    pub(crate) fn parent_ids(&self, id: VariableId) -> &[VariableId] {
        &self.parents[id.index()]
    }

    /// All `(parent, child)` edges, grouped by child in id order.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(child, parents)| {
                let mut sorted = parents.clone();
                sorted.sort_unstable();
                sorted
                    .into_iter()
                    .map(move |p| (self.name_of(p), self.variables[child].name()))
            })
            .collect()
    }

    /// Deterministic topological order: among ready variables the one
    /// declared first comes first.
    pub fn topological_order(&self) -> Vec<&str> {
        self.topological.iter().map(|id| self.name_of(*id)).collect()
    }

    pub(crate) fn topological_ids(&self) -> &[VariableId] {
        &self.topological
    }

    /// Parents, children, and the children's other parents of `name`.
    pub fn markov_blanket(&self, name: &str) -> Option<Vec<&str>> {
        let id = self.id(name)?;
        let mut blanket: BTreeSet<VariableId> = self.parents[id.index()].iter().copied().collect();
        for child in &self.children[id.index()] {
            blanket.insert(*child);
            blanket.extend(self.parents[child.index()].iter().copied());
        }
        blanket.remove(&id);
        Some(blanket.into_iter().map(|v| self.name_of(v)).collect())
    }

    /// Number of free parameters: `Σ (cardinality − 1) · Π parent cardinalities`.
    pub fn parameter_count(&self) -> usize {
        self.cpds
            .iter()
            .zip(&self.variables)
            .map(|(cpd, var)| (var.cardinality() - 1) * cpd.shape().1)
            .sum()
    }

    /// The CPD of each variable as a factor, indexed by [`VariableId`].
    pub(crate) fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Resolves a `(variable, state)` reference to ids.
    pub fn resolve_state(
        &self,
        name: &str,
        state: &StateRef,
    ) -> Result<(VariableId, usize), InferenceError> {
        let id = self.require_id(name)?;
        let state = self.variables[id.index()].resolve_state(state)?;
        Ok((id, state))
    }

    /// Resolves evidence against this network, rejecting unknown variables
    /// and out-of-domain states before any computation.
    pub fn resolve_evidence(&self, evidence: &Evidence) -> Result<ResolvedEvidence, InferenceError> {
        let mut assignments = evidence
            .iter()
            .map(|(name, state)| self.resolve_state(name, state))
            .collect::<Result<Vec<_>, _>>()?;
        assignments.sort_unstable_by_key(|(id, _)| *id);
        Ok(ResolvedEvidence::new(assignments))
    }

    /// Ids of `seeds` and all of their ancestors.
    pub(crate) fn ancestral_closure(&self, seeds: impl IntoIterator<Item = VariableId>) -> BTreeSet<VariableId> {
        let mut closure = BTreeSet::new();
        let mut stack: Vec<VariableId> = seeds.into_iter().collect();
        while let Some(id) = stack.pop() {
            if closure.insert(id) {
                stack.extend(self.parents[id.index()].iter().copied());
            }
        }
        closure
    }
}

/// Kahn's algorithm with a declaration-ordered ready set.
fn topological_order(
    variables: &[Variable],
    in_edges: &[BTreeSet<VariableId>],
    children: &[BTreeSet<VariableId>],
) -> Result<Vec<VariableId>, InferenceError> {
    let mut remaining: Vec<usize> = in_edges.iter().map(BTreeSet::len).collect();
    let mut ready: BTreeSet<VariableId> = (0..variables.len())
        .filter(|&i| remaining[i] == 0)
        .map(|i| VariableId(i as u32))
        .collect();

    let mut order = Vec::with_capacity(variables.len());
    while let Some(next) = ready.pop_first() {
        order.push(next);
        for child in &children[next.index()] {
            remaining[child.index()] -= 1;
            if remaining[child.index()] == 0 {
                ready.insert(*child);
            }
        }
    }

    if order.len() != variables.len() {
        let stuck: Vec<VariableId> = (0..variables.len())
            .filter(|&i| remaining[i] > 0)
            .map(|i| VariableId(i as u32))
            .collect();
        return Err(InferenceError::Structure(format!(
            "edges contain a cycle through [{}]",
            join_names(variables, stuck.into_iter())
        )));
    }
    Ok(order)
}

fn join_names(variables: &[Variable], ids: impl Iterator<Item = VariableId>) -> String {
    ids.map(|id| variables[id.index()].name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Incremental construction front-end for [`BayesianNetwork::build`].
#[derive(Debug, Default, Clone)]
pub struct NetworkBuilder {
    variables: Vec<Variable>,
    edges: Vec<(String, String)>,
    cpds: Vec<TabularCpd>,
    config: BuildConfig,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    pub fn add_variable(&mut self, variable: Variable) -> &mut Self {
        self.variables.push(variable);
        self
    }

    pub fn add_edge(&mut self, parent: impl Into<String>, child: impl Into<String>) -> &mut Self {
        self.edges.push((parent.into(), child.into()));
        self
    }

    pub fn add_cpd(&mut self, cpd: TabularCpd) -> &mut Self {
        self.cpds.push(cpd);
        self
    }

    pub fn build(self) -> Result<BayesianNetwork, InferenceError> {
        BayesianNetwork::build_with_config(self.variables, self.edges, self.cpds, self.config)
    }
}
