//! Posterior distributions returned by queries.

use crate::engine::errors::InferenceError;
use crate::engine::variable::StateRef;

/// Normalized joint distribution over the query variables.
///
/// Entries follow the query order in mixed radix, first query variable most
/// significant. Probabilities sum to one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointDistribution {
    variables: Vec<String>,
    states: Vec<Vec<String>>,
    probabilities: Vec<f64>,
}

impl JointDistribution {
    pub(crate) fn new(
        variables: Vec<String>,
        states: Vec<Vec<String>>,
        probabilities: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        let expected: usize = states.iter().map(Vec::len).product();
        if variables.len() != states.len() || probabilities.len() != expected {
            return Err(InferenceError::Internal(format!(
                "distribution over {} variables has {} entries, expected {}",
                variables.len(),
                probabilities.len(),
                expected
            )));
        }
        Ok(Self {
            variables,
            states,
            probabilities,
        })
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// State labels of the `i`-th query variable.
    pub fn states(&self, variable: usize) -> Option<&[String]> {
        self.states.get(variable).map(Vec::as_slice)
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Sum of all entries (1 within rounding).
    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    fn position(&self, variable: &str) -> Result<usize, InferenceError> {
        self.variables
            .iter()
            .position(|v| v == variable)
            .ok_or_else(|| {
                InferenceError::UnknownVariable(format!(
                    "'{}' is not part of this distribution",
                    variable
                ))
            })
    }

    fn resolve(&self, pos: usize, state: &StateRef) -> Result<usize, InferenceError> {
        let labels = &self.states[pos];
        match state {
            StateRef::Index(idx) if *idx < labels.len() => Ok(*idx),
            StateRef::Label(label) => labels.iter().position(|l| l == label).ok_or_else(|| {
                InferenceError::UnknownVariable(format!(
                    "variable '{}' has no state '{}'",
                    self.variables[pos], label
                ))
            }),
            StateRef::Index(idx) => Err(InferenceError::UnknownVariable(format!(
                "state index {} is outside the domain of '{}'",
                idx, self.variables[pos]
            ))),
        }
    }

    /// Probability of a full assignment given as state indices in query order.
    pub fn probability(&self, assignment: &[usize]) -> Option<f64> {
        if assignment.len() != self.states.len() {
            return None;
        }
        let mut offset = 0;
        for (&state, labels) in assignment.iter().zip(&self.states) {
            if state >= labels.len() {
                return None;
            }
            offset = offset * labels.len() + state;
        }
        self.probabilities.get(offset).copied()
    }

    /// Marginal distribution of one query variable.
    pub fn marginal(&self, variable: &str) -> Result<Vec<f64>, InferenceError> {
        let pos = self.position(variable)?;
        let card = self.states[pos].len();
        let inner: usize = self.states[pos + 1..].iter().map(Vec::len).product();
        let mut out = vec![0.0; card];
        for (offset, p) in self.probabilities.iter().enumerate() {
            out[(offset / inner) % card] += p;
        }
        Ok(out)
    }

    /// Marginal probability that `variable` takes `state`.
    pub fn probability_of(
        &self,
        variable: &str,
        state: impl Into<StateRef>,
    ) -> Result<f64, InferenceError> {
        let pos = self.position(variable)?;
        let state = self.resolve(pos, &state.into())?;
        Ok(self.marginal(variable)?[state])
    }

    /// `(state labels, probability)` for every joint assignment.
    pub fn entries(&self) -> impl Iterator<Item = (Vec<&str>, f64)> + '_ {
        self.probabilities
            .iter()
            .enumerate()
            .map(move |(offset, p)| (self.labels_at(offset), *p))
    }

    fn labels_at(&self, mut offset: usize) -> Vec<&str> {
        let mut labels = vec![""; self.states.len()];
        for (pos, states) in self.states.iter().enumerate().rev() {
            labels[pos] = states[offset % states.len()].as_str();
            offset /= states.len();
        }
        labels
    }

    /// Most probable joint assignment; ties resolve to the lowest offset.
    pub fn argmax(&self) -> (Vec<&str>, f64) {
        let (offset, p) = self.probabilities.iter().enumerate().fold(
            (0, f64::NEG_INFINITY),
            |(best, best_p), (offset, &p)| {
                if p > best_p {
                    (offset, p)
                } else {
                    (best, best_p)
                }
            },
        );
        (self.labels_at(offset), p)
    }
}
