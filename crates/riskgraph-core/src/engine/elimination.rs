//! # Variable Elimination
//!
//! Exact posterior queries over a [`BayesianNetwork`].
//!
//! ## Algorithm
//!
//! 1. Resolve query variables and evidence (unknown names fail before any work).
//! 2. Optionally prune barren variables: anything that is not a query or
//!    evidence variable nor an ancestor of one. Their CPDs sum to one over
//!    the variable and cannot change the answer.
//! 3. Take each remaining CPD as a factor and restrict it on the evidence.
//! 4. For each hidden variable in the configured [`EliminationOrder`],
//!    multiply the factors that mention it and sum it out.
//! 5. Multiply what is left (now scoped to unobserved query variables) and
//!    normalize. A zero total means the evidence is impossible under the model.
//! 6. Query variables that are also evidence come back as point masses at
//!    the observed state.
//!
//! The engine only borrows the network and keeps no state between queries,
//! so one engine can serve concurrent callers.

use std::collections::BTreeSet;

use crate::engine::distribution::JointDistribution;
use crate::engine::errors::InferenceError;
use crate::engine::evidence::{Evidence, ResolvedEvidence};
use crate::engine::factor::{table_size, Factor};
use crate::engine::network::BayesianNetwork;
use crate::engine::ordering::EliminationOrder;
use crate::engine::variable::{StateRef, VariableId};

/// Configuration for variable elimination.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceConfig {
    /// How hidden variables are ordered for elimination.
    pub elimination_order: EliminationOrder,
    /// Drop variables that cannot influence the query before eliminating.
    pub prune_barren: bool,
    /// Evidence whose total probability is at or below this value is
    /// reported as [`InferenceError::DegenerateEvidence`].
    pub degenerate_threshold: f64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            elimination_order: EliminationOrder::ReverseTopological,
            prune_barren: true,
            degenerate_threshold: 0.0,
        }
    }
}

impl InferenceConfig {
    fn validate(self) -> Result<Self, InferenceError> {
        if !self.degenerate_threshold.is_finite() || self.degenerate_threshold < 0.0 {
            return Err(InferenceError::Validation(
                "inference: degenerate_threshold must be finite and >= 0".into(),
            ));
        }
        self.elimination_order.validate()?;
        Ok(self)
    }
}

/// Runtime diagnostics emitted by a single query.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueryDiagnostics {
    /// Variables summed out, in order.
    pub elimination_order: Vec<String>,
    /// Number of variables removed by barren-node pruning.
    pub pruned_count: usize,
    /// Largest table built during the query.
    pub max_factor_size: usize,
    /// Number of pairwise factor products.
    pub product_count: usize,
    /// Unnormalized total before normalization, i.e. `P(evidence)`.
    pub evidence_probability: f64,
}

/// Most probable joint assignment of the query variables.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MapAssignment {
    /// `(variable, state label)` in query order.
    pub assignment: Vec<(String, String)>,
    /// Posterior probability of the assignment.
    pub probability: f64,
}

/// Variable elimination engine over a borrowed network.
#[derive(Debug, Clone)]
pub struct VariableElimination<'n> {
    network: &'n BayesianNetwork,
    config: InferenceConfig,
}

impl<'n> VariableElimination<'n> {
    /// Creates an engine with the default configuration.
    pub fn new(network: &'n BayesianNetwork) -> Self {
        Self {
            network,
            config: InferenceConfig::default(),
        }
    }

    /// Creates an engine with explicit configuration.
    pub fn with_config(
        network: &'n BayesianNetwork,
        config: InferenceConfig,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            network,
            config: config.validate()?,
        })
    }

    pub fn network(&self) -> &'n BayesianNetwork {
        self.network
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    /// Posterior joint distribution of `variables` given `evidence`.
    pub fn query<S: AsRef<str>>(
        &self,
        variables: &[S],
        evidence: &Evidence,
    ) -> Result<JointDistribution, InferenceError> {
        self.query_with_diagnostics(variables, evidence)
            .map(|(distribution, _)| distribution)
    }

    /// `P(variable = state | evidence)`.
    pub fn probability(
        &self,
        variable: &str,
        state: impl Into<StateRef>,
        evidence: &Evidence,
    ) -> Result<f64, InferenceError> {
        let state = state.into();
        // Validate the state before paying for the query.
        self.network.resolve_state(variable, &state)?;
        self.query(&[variable], evidence)?
            .probability_of(variable, state)
    }

    /// Most probable joint assignment of `variables` given `evidence`.
    pub fn map_query<S: AsRef<str>>(
        &self,
        variables: &[S],
        evidence: &Evidence,
    ) -> Result<MapAssignment, InferenceError> {
        let distribution = self.query(variables, evidence)?;
        let (labels, probability) = distribution.argmax();
        let assignment = distribution
            .variables()
            .iter()
            .cloned()
            .zip(labels.into_iter().map(str::to_string))
            .collect();
        Ok(MapAssignment {
            assignment,
            probability,
        })
    }

    /// Posterior joint distribution together with [`QueryDiagnostics`].
    pub fn query_with_diagnostics<S: AsRef<str>>(
        &self,
        variables: &[S],
        evidence: &Evidence,
    ) -> Result<(JointDistribution, QueryDiagnostics), InferenceError> {
        let network = self.network;
        let query = self.resolve_query(variables)?;
        let evidence = network.resolve_evidence(evidence)?;

        let relevant: BTreeSet<VariableId> = if self.config.prune_barren {
            network.ancestral_closure(query.iter().copied().chain(evidence.iter().map(|(id, _)| id)))
        } else {
            (0..network.len()).map(|i| VariableId(i as u32)).collect()
        };

        let mut diagnostics = QueryDiagnostics {
            elimination_order: Vec::new(),
            pruned_count: network.len() - relevant.len(),
            max_factor_size: 0,
            product_count: 0,
            evidence_probability: 0.0,
        };

        let mut factors = Vec::with_capacity(relevant.len());
        for id in &relevant {
            let factor = restrict_on_evidence(&network.factors()[id.index()], &evidence)?;
            diagnostics.max_factor_size = diagnostics.max_factor_size.max(factor.len());
            factors.push(factor);
        }

        let hidden: BTreeSet<VariableId> = (0..network.len())
            .map(|i| VariableId(i as u32))
            .filter(|id| !query.contains(id) && !evidence.contains(*id))
            .collect();
        let targets: BTreeSet<VariableId> = hidden.intersection(&relevant).copied().collect();
        let order = self
            .config
            .elimination_order
            .order(network, &targets, &hidden, &factors)?;

        for var in &order {
            factors = eliminate(factors, *var, &mut diagnostics)?;
            #[cfg(feature = "tracing")]
            tracing::debug!(
                variable = network.name_of(*var),
                working_factors = factors.len(),
                max_factor_size = diagnostics.max_factor_size,
                "eliminated variable"
            );
            diagnostics
                .elimination_order
                .push(network.name_of(*var).to_string());
        }

        let joint = multiply_all(factors, &mut diagnostics)?;
        let free: Vec<VariableId> = query
            .iter()
            .copied()
            .filter(|id| !evidence.contains(*id))
            .collect();
        let joint = joint.reorder(&free)?;

        let total = joint.total();
        if !total.is_finite() {
            return Err(InferenceError::Numerical(format!(
                "posterior total {} is not finite",
                total
            )));
        }
        if total <= self.config.degenerate_threshold {
            return Err(InferenceError::DegenerateEvidence(format!(
                "evidence {} has probability {} under the model",
                describe_evidence(network, &evidence),
                total
            )));
        }
        diagnostics.evidence_probability = total;

        let distribution = self.expand(&query, &evidence, &joint, total)?;
        Ok((distribution, diagnostics))
    }

    fn resolve_query<S: AsRef<str>>(&self, variables: &[S]) -> Result<Vec<VariableId>, InferenceError> {
        if variables.is_empty() {
            return Err(InferenceError::Validation(
                "query needs at least one variable".into(),
            ));
        }
        let mut ids = Vec::with_capacity(variables.len());
        for name in variables {
            let id = self.network.require_id(name.as_ref())?;
            if ids.contains(&id) {
                return Err(InferenceError::Validation(format!(
                    "query lists '{}' more than once",
                    name.as_ref()
                )));
            }
            ids.push(id);
        }
        Ok(ids)
    }

    /// Lays the normalized free-variable table out over the full query,
    /// placing evidence-fixed query variables at their observed state.
    fn expand(
        &self,
        query: &[VariableId],
        evidence: &ResolvedEvidence,
        joint: &Factor,
        total: f64,
    ) -> Result<JointDistribution, InferenceError> {
        let network = self.network;
        let cards: Vec<usize> = query.iter().map(|id| network.cardinality_of(*id)).collect();
        let size = table_size(&cards).ok_or_else(|| {
            InferenceError::Validation(format!(
                "joint over {} query variables has more entries than addressable",
                query.len()
            ))
        })?;

        let mut probabilities = Vec::with_capacity(size);
        let mut assignment = vec![0usize; query.len()];
        for offset in 0..size {
            let mut rest = offset;
            for pos in (0..query.len()).rev() {
                assignment[pos] = rest % cards[pos];
                rest /= cards[pos];
            }

            let mut free_offset = 0;
            let mut consistent = true;
            for (pos, id) in query.iter().enumerate() {
                match evidence.state_of(*id) {
                    Some(observed) => consistent &= observed == assignment[pos],
                    None => free_offset = free_offset * cards[pos] + assignment[pos],
                }
            }
            let p = if consistent {
                joint.values()[free_offset] / total
            } else {
                0.0
            };
            probabilities.push(p);
        }

        let variables: Vec<String> = query
            .iter()
            .map(|id| network.name_of(*id).to_string())
            .collect();
        let states: Vec<Vec<String>> = query
            .iter()
            .map(|id| {
                network
                    .variable_by_id(*id)
                    .map(|v| v.states().map(str::to_string).collect::<Vec<_>>())
                    .unwrap_or_default()
            })
            .collect();
        JointDistribution::new(variables, states, probabilities)
    }
}

fn restrict_on_evidence(factor: &Factor, evidence: &ResolvedEvidence) -> Result<Factor, InferenceError> {
    let mut restricted = factor.clone();
    for (var, state) in evidence.iter() {
        if restricted.contains(var) {
            restricted = restricted.restrict(var, state)?;
        }
    }
    Ok(restricted)
}

/// Multiplies every factor mentioning `var`, sums `var` out, and returns the
/// new working set.
fn eliminate(
    factors: Vec<Factor>,
    var: VariableId,
    diagnostics: &mut QueryDiagnostics,
) -> Result<Vec<Factor>, InferenceError> {
    let (mentioning, mut rest): (Vec<Factor>, Vec<Factor>) =
        factors.into_iter().partition(|f| f.contains(var));
    if mentioning.is_empty() {
        return Ok(rest);
    }
    let combined = multiply_all(mentioning, diagnostics)?;
    let reduced = combined.marginalize(var)?;
    rest.push(reduced);
    Ok(rest)
}

fn multiply_all(
    factors: Vec<Factor>,
    diagnostics: &mut QueryDiagnostics,
) -> Result<Factor, InferenceError> {
    let mut iter = factors.into_iter();
    let Some(mut acc) = iter.next() else {
        return Ok(Factor::unit());
    };
    for factor in iter {
        acc = acc.product(&factor)?;
        diagnostics.product_count += 1;
        diagnostics.max_factor_size = diagnostics.max_factor_size.max(acc.len());
    }
    Ok(acc)
}

fn describe_evidence(network: &BayesianNetwork, evidence: &ResolvedEvidence) -> String {
    let parts: Vec<String> = evidence
        .iter()
        .map(|(id, state)| {
            let variable = network.variable_by_id(id);
            format!(
                "{}={}",
                network.name_of(id),
                variable.and_then(|v| v.state_label(state)).unwrap_or("?")
            )
        })
        .collect();
    format!("{{{}}}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::cpd::TabularCpd;
    use crate::engine::network::NetworkBuilder;
    use crate::engine::variable::Variable;

    /// Rain -> Wet <- Sprinkler, plus an unrelated leaf Cloudy -> Umbrella.
    fn network() -> BayesianNetwork {
        let mut b = NetworkBuilder::new();
        for name in ["Rain", "Sprinkler", "Wet", "Cloudy", "Umbrella"] {
            b.add_variable(Variable::binary(name).expect("variable"));
        }
        b.add_edge("Rain", "Wet")
            .add_edge("Sprinkler", "Wet")
            .add_edge("Cloudy", "Umbrella")
            .add_cpd(TabularCpd::prior("Rain", &[0.8, 0.2]).expect("cpd"))
            .add_cpd(TabularCpd::prior("Sprinkler", &[0.6, 0.4]).expect("cpd"))
            .add_cpd(
                TabularCpd::new(
                    "Wet",
                    ["Rain", "Sprinkler"],
                    vec![vec![1.0, 0.1, 0.2, 0.01], vec![0.0, 0.9, 0.8, 0.99]],
                )
                .expect("cpd"),
            )
            .add_cpd(TabularCpd::prior("Cloudy", &[0.5, 0.5]).expect("cpd"))
            .add_cpd(
                TabularCpd::new("Umbrella", ["Cloudy"], vec![vec![0.9, 0.3], vec![0.1, 0.7]])
                    .expect("cpd"),
            );
        b.build().expect("network")
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn prior_marginal_matches_hand_computation() {
        let net = network();
        let engine = VariableElimination::new(&net);
        // P(Wet=1) = .8*.6*0 + .8*.4*.9 + .2*.6*.8 + .2*.4*.99
        let expected = 0.288 + 0.096 + 0.0792;
        let p = engine.probability("Wet", 1usize, &Evidence::new()).expect("query");
        assert!(close(p, expected), "{} vs {}", p, expected);
    }

    #[test]
    fn posterior_explains_away() {
        let net = network();
        let engine = VariableElimination::new(&net);
        let wet = Evidence::new().with("Wet", "1");
        let rain_given_wet = engine.probability("Rain", 1usize, &wet).expect("query");
        let both = wet.clone().with("Sprinkler", "1");
        let rain_given_both = engine.probability("Rain", 1usize, &both).expect("query");
        // P(Rain=1 | Wet=1) = (.096 + .0792) / .4632
        assert!(close(rain_given_wet, 0.1752 / 0.4632));
        assert!(rain_given_both < rain_given_wet);
    }

    #[test]
    fn joint_query_follows_query_order() {
        let net = network();
        let engine = VariableElimination::new(&net);
        let d = engine
            .query(&["Sprinkler", "Rain"], &Evidence::new())
            .expect("query");
        // independent priors: P(S=1, R=0) = .4 * .8
        assert!(close(d.probability(&[1, 0]).expect("entry"), 0.32));
        assert!(close(d.total(), 1.0));
    }

    #[test]
    fn evidence_query_variable_collapses_to_point_mass() {
        let net = network();
        let engine = VariableElimination::new(&net);
        let evidence = Evidence::new().with("Rain", "1");
        let d = engine.query(&["Rain", "Wet"], &evidence).expect("query");
        let rain = d.marginal("Rain").expect("rain");
        assert_eq!(rain.len(), 2);
        assert!(close(rain[0], 0.0), "P(Rain=0) = {}", rain[0]);
        assert!(close(rain[1], 1.0), "P(Rain=1) = {}", rain[1]);
        assert!(close(d.total(), 1.0));
    }

    #[test]
    fn impossible_evidence_is_degenerate() {
        let net = network();
        let engine = VariableElimination::new(&net);
        // Wet=1 is impossible when neither Rain nor Sprinkler is on.
        let evidence = Evidence::new()
            .with("Rain", "0")
            .with("Sprinkler", "0")
            .with("Wet", "1");
        let err = engine.query(&["Cloudy"], &evidence).unwrap_err();
        assert!(matches!(err, InferenceError::DegenerateEvidence(_)));
        assert!(err.to_string().contains("Wet=1"));
    }

    #[test]
    fn rejects_unknown_query_and_duplicates() {
        let net = network();
        let engine = VariableElimination::new(&net);
        assert!(matches!(
            engine.query(&["Snow"], &Evidence::new()),
            Err(InferenceError::UnknownVariable(_))
        ));
        assert!(matches!(
            engine.query(&["Rain", "Rain"], &Evidence::new()),
            Err(InferenceError::Validation(_))
        ));
        let empty: [&str; 0] = [];
        assert!(engine.query(&empty, &Evidence::new()).is_err());
    }

    #[test]
    fn pruning_skips_unrelated_subgraph() {
        let net = network();
        let engine = VariableElimination::new(&net);
        let (_, diagnostics) = engine
            .query_with_diagnostics(&["Rain"], &Evidence::new().with("Wet", "1"))
            .expect("query");
        // Cloudy and Umbrella are not ancestors of Rain or Wet.
        assert_eq!(diagnostics.pruned_count, 2);
        assert_eq!(diagnostics.elimination_order, vec!["Sprinkler"]);
        assert!(close(diagnostics.evidence_probability, 0.4632));
    }

    #[test]
    fn pruning_does_not_change_results() {
        let net = network();
        let pruned = VariableElimination::new(&net);
        let full = VariableElimination::with_config(
            &net,
            InferenceConfig {
                prune_barren: false,
                ..InferenceConfig::default()
            },
        )
        .expect("engine");
        let evidence = Evidence::new().with("Umbrella", "1");
        let a = pruned.query(&["Wet", "Cloudy"], &evidence).expect("pruned");
        let b = full.query(&["Wet", "Cloudy"], &evidence).expect("full");
        for (x, y) in a.probabilities().iter().zip(b.probabilities()) {
            assert!(close(*x, *y));
        }
    }

    #[test]
    fn min_weight_handles_root_with_many_children() {
        let mut b = NetworkBuilder::new();
        b.add_variable(Variable::binary("R").expect("variable"))
            .add_cpd(TabularCpd::prior("R", &[0.5, 0.5]).expect("cpd"));
        for i in 0..130 {
            let child = format!("C{}", i);
            b.add_variable(Variable::binary(child.as_str()).expect("variable"))
                .add_edge("R", child.as_str())
                .add_cpd(
                    TabularCpd::new(child.as_str(), ["R"], vec![vec![0.9, 0.2], vec![0.1, 0.8]])
                        .expect("cpd"),
                );
        }
        let net = b.build().expect("network");
        let engine = VariableElimination::with_config(
            &net,
            InferenceConfig {
                elimination_order: EliminationOrder::MinWeight,
                prune_barren: false,
                ..InferenceConfig::default()
            },
        )
        .expect("engine");
        let p = engine
            .probability("C0", 1usize, &Evidence::new().with("C1", "1"))
            .expect("query");
        // P(R=1 | C1=1) = .8 / .9, so P(C0=1 | C1=1) = (.1 * .1 + .8 * .8) / .9
        assert!(close(p, 0.65 / 0.9), "P(C0=1 | C1=1) = {}", p);
    }

    #[test]
    fn every_order_heuristic_agrees() {
        let net = network();
        let evidence = Evidence::new().with("Umbrella", "0");
        let orders = [
            EliminationOrder::ReverseTopological,
            EliminationOrder::MinNeighbors,
            EliminationOrder::MinWeight,
            EliminationOrder::MinFill,
            EliminationOrder::Explicit(vec!["Cloudy".into(), "Sprinkler".into(), "Wet".into()]),
        ];
        let baseline = VariableElimination::new(&net)
            .query(&["Rain"], &evidence)
            .expect("baseline");
        for order in orders {
            let engine = VariableElimination::with_config(
                &net,
                InferenceConfig {
                    elimination_order: order.clone(),
                    prune_barren: false,
                    ..InferenceConfig::default()
                },
            )
            .expect("engine");
            let d = engine.query(&["Rain"], &evidence).expect("query");
            assert!(
                close(d.probabilities()[1], baseline.probabilities()[1]),
                "{:?} disagrees",
                order
            );
        }
    }

    #[test]
    fn explicit_order_must_cover_hidden_variables() {
        let net = network();
        let engine = VariableElimination::with_config(
            &net,
            InferenceConfig {
                elimination_order: EliminationOrder::Explicit(vec!["Sprinkler".into()]),
                ..InferenceConfig::default()
            },
        )
        .expect("engine");
        let err = engine.query(&["Rain"], &Evidence::new()).unwrap_err();
        assert!(err.to_string().contains("omits"));

        let engine = VariableElimination::with_config(
            &net,
            InferenceConfig {
                elimination_order: EliminationOrder::Explicit(vec![
                    "Rain".into(),
                    "Sprinkler".into(),
                ]),
                ..InferenceConfig::default()
            },
        )
        .expect("engine");
        let err = engine.query(&["Rain"], &Evidence::new()).unwrap_err();
        assert!(err.to_string().contains("queried or observed"));
    }

    #[test]
    fn map_query_picks_most_probable_assignment() {
        let net = network();
        let engine = VariableElimination::new(&net);
        let map = engine
            .map_query(&["Rain", "Sprinkler"], &Evidence::new().with("Wet", "1"))
            .expect("map");
        // joint with Wet=1: (0,1)=.288 (1,0)=.096 (1,1)=.0792
        assert_eq!(
            map.assignment,
            vec![
                ("Rain".to_string(), "0".to_string()),
                ("Sprinkler".to_string(), "1".to_string())
            ]
        );
        assert!(close(map.probability, 0.288 / 0.4632));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let net = network();
        let result = VariableElimination::with_config(
            &net,
            InferenceConfig {
                degenerate_threshold: f64::NAN,
                ..InferenceConfig::default()
            },
        );
        assert!(matches!(result, Err(InferenceError::Validation(_))));
    }
}
