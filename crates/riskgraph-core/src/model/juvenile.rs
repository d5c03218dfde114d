//! # Juvenile Risk Model
//!
//! Five binary variables describing how parenting and legal education
//! influence a disciplinary outcome:
//!
//! ```text
//! Parenting -> Psychology -> Discipline
//! Parenting -> Peer       -> Discipline
//! LawEdu                  -> Discipline
//! ```
//!
//! State `"1"` is the risk state of every variable. `Parenting` and `LawEdu`
//! are the controllable factors that scenarios set.

use std::sync::OnceLock;

use crate::engine::cpd::TabularCpd;
use crate::engine::errors::InferenceError;
use crate::engine::evidence::Evidence;
use crate::engine::network::BayesianNetwork;
use crate::engine::variable::Variable;

pub const PARENTING: &str = "Parenting";
pub const LAW_EDU: &str = "LawEdu";
pub const PSYCHOLOGY: &str = "Psychology";
pub const PEER: &str = "Peer";
pub const DISCIPLINE: &str = "Discipline";

/// Outcome variable of the what-if comparisons.
pub const OUTCOME: &str = DISCIPLINE;
pub const ADVERSE_STATE: &str = "1";

pub const BASELINE: &str = "Baseline";
pub const PARENTING_ONLY: &str = "ParentingOnly";
pub const FULL_INTERVENTION: &str = "FullIntervention";

/// The same model in the description language.
pub const SOURCE: &str = include_str!("../../models/juvenile_risk.rgm");

static NETWORK: OnceLock<Result<BayesianNetwork, InferenceError>> = OnceLock::new();

/// Process-wide juvenile risk network, built on first use.
///
/// Construction happens at most once and the result is never reset; a build
/// failure is cached and returned to every caller.
pub fn juvenile_risk_network() -> Result<&'static BayesianNetwork, InferenceError> {
    NETWORK
        .get_or_init(|| {
            let network = build_juvenile_risk_network();
            #[cfg(feature = "tracing")]
            match &network {
                Ok(net) => tracing::info!(
                    variables = net.len(),
                    parameters = net.parameter_count(),
                    "built juvenile risk network"
                ),
                Err(err) => tracing::error!(error = %err, "juvenile risk network is invalid"),
            }
            network
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Builds a fresh copy of the juvenile risk network.
pub fn build_juvenile_risk_network() -> Result<BayesianNetwork, InferenceError> {
    let variables = [PARENTING, LAW_EDU, PSYCHOLOGY, PEER, DISCIPLINE]
        .into_iter()
        .map(Variable::binary)
        .collect::<Result<Vec<_>, _>>()?;

    let edges = [
        (PARENTING, PSYCHOLOGY),
        (PARENTING, PEER),
        (PEER, DISCIPLINE),
        (PSYCHOLOGY, DISCIPLINE),
        (LAW_EDU, DISCIPLINE),
    ];

    let cpds = vec![
        TabularCpd::prior(PARENTING, &[0.6, 0.4])?,
        TabularCpd::prior(LAW_EDU, &[0.7, 0.3])?,
        TabularCpd::new(
            PSYCHOLOGY,
            [PARENTING],
            vec![vec![0.8, 0.6], vec![0.2, 0.4]],
        )?,
        TabularCpd::new(PEER, [PARENTING], vec![vec![0.8, 0.5], vec![0.2, 0.5]])?,
        TabularCpd::new(
            DISCIPLINE,
            [PEER, PSYCHOLOGY, LAW_EDU],
            vec![
                vec![0.96, 0.9, 0.8, 0.4, 0.9, 0.1, 0.3, 0.1],
                vec![0.04, 0.1, 0.2, 0.6, 0.1, 0.9, 0.7, 0.9],
            ],
        )?,
    ];

    BayesianNetwork::build(variables, edges, cpds)
}

/// Poor parenting and no legal education.
pub fn baseline_evidence() -> Evidence {
    Evidence::new().with(PARENTING, "1").with(LAW_EDU, "1")
}

/// Parenting improved, legal education unchanged.
pub fn parenting_only_evidence() -> Evidence {
    Evidence::new().with(PARENTING, "0").with(LAW_EDU, "1")
}

/// Both controllable factors improved.
pub fn full_intervention_evidence() -> Evidence {
    Evidence::new().with(PARENTING, "0").with(LAW_EDU, "0")
}

/// The named evidence sets, baseline first.
pub fn evidence_sets() -> Vec<(&'static str, Evidence)> {
    vec![
        (BASELINE, baseline_evidence()),
        (PARENTING_ONLY, parenting_only_evidence()),
        (FULL_INTERVENTION, full_intervention_evidence()),
    ]
}
