//! What-if comparison of an outcome's risk under two evidence sets.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::engine::elimination::VariableElimination;
use crate::engine::errors::InferenceError;
use crate::engine::evidence::Evidence;
use crate::engine::variable::StateRef;

/// Risk of one outcome state under a baseline and an intervened scenario.
///
/// `relative_reduction` is `0.0` when `baseline_risk` is zero. In that case
/// a zero does not mean "no change"; check `baseline_risk` before reading it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioComparison {
    pub outcome: String,
    /// Label of the state treated as adverse.
    pub adverse_state: String,
    pub baseline_risk: f64,
    pub scenario_risk: f64,
    /// `baseline_risk - scenario_risk`; negative when the scenario is worse.
    pub absolute_reduction: f64,
    /// `absolute_reduction / baseline_risk`, or `0.0` for a zero baseline.
    pub relative_reduction: f64,
}

impl ScenarioComparison {
    /// Derives the reductions from two risks.
    pub fn from_risks(
        outcome: impl Into<String>,
        adverse_state: impl Into<String>,
        baseline_risk: f64,
        scenario_risk: f64,
    ) -> Self {
        let absolute_reduction = baseline_risk - scenario_risk;
        let relative_reduction = if baseline_risk > 0.0 {
            absolute_reduction / baseline_risk
        } else {
            0.0
        };
        Self {
            outcome: outcome.into(),
            adverse_state: adverse_state.into(),
            baseline_risk,
            scenario_risk,
            absolute_reduction,
            relative_reduction,
        }
    }

    pub fn baseline_percent(&self) -> f64 {
        self.baseline_risk * 100.0
    }

    pub fn scenario_percent(&self) -> f64 {
        self.scenario_risk * 100.0
    }

    /// Absolute change in percentage points.
    pub fn absolute_reduction_points(&self) -> f64 {
        self.absolute_reduction * 100.0
    }

    pub fn relative_reduction_percent(&self) -> f64 {
        self.relative_reduction * 100.0
    }

    /// True when the scenario raises the adverse outcome's probability.
    pub fn risk_increased(&self) -> bool {
        self.absolute_reduction < 0.0
    }
}

/// Runs the engine under `baseline` and `scenario` and compares the
/// probability of `outcome = adverse`.
pub fn compare(
    engine: &VariableElimination<'_>,
    outcome: &str,
    adverse: impl Into<StateRef>,
    baseline: &Evidence,
    scenario: &Evidence,
) -> Result<ScenarioComparison, InferenceError> {
    let adverse = AdverseState::resolve(engine, outcome, adverse.into())?;
    let baseline_risk = adverse.risk(engine, outcome, baseline)?;
    let scenario_risk = adverse.risk(engine, outcome, scenario)?;
    Ok(ScenarioComparison::from_risks(
        outcome,
        adverse.label,
        baseline_risk,
        scenario_risk,
    ))
}

/// Compares several named scenarios against one baseline.
///
/// The baseline is evaluated once. Results follow the input order; with the
/// `parallel` feature scenarios run on rayon's global pool.
pub fn compare_many<S>(
    engine: &VariableElimination<'_>,
    outcome: &str,
    adverse: impl Into<StateRef>,
    baseline: &Evidence,
    scenarios: &[(S, Evidence)],
) -> Result<Vec<(String, ScenarioComparison)>, InferenceError>
where
    S: AsRef<str> + Sync,
{
    let adverse = AdverseState::resolve(engine, outcome, adverse.into())?;
    let baseline_risk = adverse.risk(engine, outcome, baseline)?;

    let evaluate = |(name, evidence): &(S, Evidence)| -> Result<_, InferenceError> {
        let scenario_risk = adverse.risk(engine, outcome, evidence)?;
        Ok((
            name.as_ref().to_string(),
            ScenarioComparison::from_risks(
                outcome,
                adverse.label.clone(),
                baseline_risk,
                scenario_risk,
            ),
        ))
    };

    #[cfg(feature = "parallel")]
    let results = scenarios.par_iter().map(evaluate).collect();
    #[cfg(not(feature = "parallel"))]
    let results = scenarios.iter().map(evaluate).collect();
    results
}

struct AdverseState {
    index: usize,
    label: String,
}

impl AdverseState {
    fn resolve(
        engine: &VariableElimination<'_>,
        outcome: &str,
        state: StateRef,
    ) -> Result<Self, InferenceError> {
        let network = engine.network();
        let (id, index) = network.resolve_state(outcome, &state)?;
        let label = network
            .variable_by_id(id)
            .and_then(|v| v.state_label(index))
            .ok_or_else(|| {
                InferenceError::Internal(format!("state {} of '{}' has no label", index, outcome))
            })?
            .to_string();
        Ok(Self { index, label })
    }

    fn risk(
        &self,
        engine: &VariableElimination<'_>,
        outcome: &str,
        evidence: &Evidence,
    ) -> Result<f64, InferenceError> {
        let distribution = engine.query(&[outcome], evidence)?;
        distribution
            .probabilities()
            .get(self.index)
            .copied()
            .ok_or_else(|| {
                InferenceError::Internal(format!(
                    "posterior of '{}' has no entry for state {}",
                    outcome, self.index
                ))
            })
    }
}
