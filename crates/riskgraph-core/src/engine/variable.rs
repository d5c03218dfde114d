//! Discrete random variables and their state domains.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::engine::errors::InferenceError;

/// Dense index of a variable inside one [`BayesianNetwork`](crate::engine::network::BayesianNetwork).
///
/// Ids follow declaration order, which makes every tie-break in the engine
/// deterministic.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VariableId(pub u32);

impl VariableId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A discrete random variable with a finite, ordered set of labelled states.
///
/// State `i` is the `i`-th label. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: Arc<str>,
    states: SmallVec<[Arc<str>; 2]>,
}

impl Variable {
    /// Creates a variable from a name and its ordered state labels.
    ///
    /// Fails with [`InferenceError::Structure`] if the name is empty, fewer
    /// than two states are given, or a label repeats.
    pub fn new<N, I, S>(name: N, states: I) -> Result<Self, InferenceError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(InferenceError::Structure(
                "variable name must not be empty".into(),
            ));
        }
        let states: SmallVec<[Arc<str>; 2]> = states.into_iter().map(Into::into).collect();
        if states.len() < 2 {
            return Err(InferenceError::Structure(format!(
                "variable '{}' needs at least 2 states, found {}",
                name,
                states.len()
            )));
        }
        for (idx, label) in states.iter().enumerate() {
            if states[..idx].contains(label) {
                return Err(InferenceError::Structure(format!(
                    "variable '{}' declares state '{}' twice",
                    name, label
                )));
            }
        }
        Ok(Self { name, states })
    }

    /// Creates a variable whose states are labelled `"0"`, `"1"`, ... `"n-1"`.
    pub fn with_cardinality(
        name: impl Into<Arc<str>>,
        cardinality: usize,
    ) -> Result<Self, InferenceError> {
        Self::new(name, (0..cardinality).map(|i| i.to_string()))
    }

    /// Creates a binary variable with states `"0"` and `"1"`.
    pub fn binary(name: impl Into<Arc<str>>) -> Result<Self, InferenceError> {
        Self::with_cardinality(name, 2)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    pub fn states(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.states.iter().map(|s| s.as_ref())
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    /// Index of the state with the given label.
    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s.as_ref() == label)
    }

    /// Label of the state at `index`.
    pub fn state_label(&self, index: usize) -> Option<&str> {
        self.states.get(index).map(|s| s.as_ref())
    }

    /// Resolves a [`StateRef`] against this variable's domain.
    pub fn resolve_state(&self, state: &StateRef) -> Result<usize, InferenceError> {
        match state {
            StateRef::Index(idx) if *idx < self.cardinality() => Ok(*idx),
            StateRef::Index(idx) => Err(InferenceError::UnknownVariable(format!(
                "state index {} is outside the domain of '{}' (cardinality {})",
                idx,
                self.name,
                self.cardinality()
            ))),
            StateRef::Label(label) => self.state_index(label).ok_or_else(|| {
                InferenceError::UnknownVariable(format!(
                    "variable '{}' has no state '{}'",
                    self.name, label
                ))
            }),
        }
    }
}

/// A reference to one state of a variable, by position or by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateRef {
    Index(usize),
    Label(String),
}

impl fmt::Display for StateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(idx) => write!(f, "#{}", idx),
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl From<usize> for StateRef {
    fn from(idx: usize) -> Self {
        Self::Index(idx)
    }
}

impl From<&str> for StateRef {
    fn from(label: &str) -> Self {
        Self::Label(label.to_string())
    }
}

impl From<String> for StateRef {
    fn from(label: String) -> Self {
        Self::Label(label)
    }
}
