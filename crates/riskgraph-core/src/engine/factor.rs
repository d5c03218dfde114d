//! # Factor Algebra
//!
//! A [`Factor`] maps every joint assignment of an ordered set of variables to a
//! non-negative weight. Tables are dense and indexed in mixed radix: the first
//! variable of the scope is the most significant digit and the last variable
//! the least significant, so for scope `[A, B]` the entries run
//! `(a0,b0), (a0,b1), (a1,b0), (a1,b1)`.
//!
//! The three operations used by variable elimination:
//!
//! - [`Factor::restrict`] fixes one variable to a state and drops it from scope
//! - [`Factor::product`] multiplies two factors over the union of their scopes
//! - [`Factor::marginalize`] sums one variable out
//!
//! All operations return fresh factors and preserve non-negativity. A factor
//! with empty scope holds exactly one entry (a scalar).

use smallvec::SmallVec;

use crate::engine::errors::InferenceError;
use crate::engine::variable::VariableId;

type Scope = SmallVec<[VariableId; 4]>;
type Radix = SmallVec<[usize; 4]>;

/// Dense non-negative weight table over an ordered variable scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    scope: Scope,
    cardinalities: Radix,
    values: Vec<f64>,
}

impl Factor {
    /// Creates a factor from its scope, the cardinality of each scope
    /// variable, and the weights in mixed-radix order.
    pub fn new(
        scope: &[VariableId],
        cardinalities: &[usize],
        values: Vec<f64>,
    ) -> Result<Self, InferenceError> {
        if scope.len() != cardinalities.len() {
            return Err(InferenceError::Internal(format!(
                "factor scope has {} variables but {} cardinalities",
                scope.len(),
                cardinalities.len()
            )));
        }
        for (idx, var) in scope.iter().enumerate() {
            if scope[..idx].contains(var) {
                return Err(InferenceError::Internal(format!(
                    "factor scope lists {:?} twice",
                    var
                )));
            }
        }
        if cardinalities.iter().any(|&c| c == 0) {
            return Err(InferenceError::Internal(
                "factor variable with zero cardinality".into(),
            ));
        }
        let expected = table_size(cardinalities).ok_or_else(|| {
            InferenceError::Internal(format!(
                "factor over {} variables has more entries than addressable",
                scope.len()
            ))
        })?;
        if values.len() != expected {
            return Err(InferenceError::Internal(format!(
                "factor table has {} entries, scope requires {}",
                values.len(),
                expected
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(InferenceError::Numerical(format!(
                "factor weight {} is negative or not finite",
                bad
            )));
        }
        Ok(Self {
            scope: scope.iter().copied().collect(),
            cardinalities: cardinalities.iter().copied().collect(),
            values,
        })
    }

    /// A factor with empty scope holding a single weight.
    pub fn scalar(value: f64) -> Self {
        Self {
            scope: Scope::new(),
            cardinalities: Radix::new(),
            values: vec![value],
        }
    }

    /// The multiplicative identity.
    pub fn unit() -> Self {
        Self::scalar(1.0)
    }

    pub fn scope(&self) -> &[VariableId] {
        &self.scope
    }

    pub fn cardinalities(&self) -> &[usize] {
        &self.cardinalities
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.scope.is_empty()
    }

    pub fn contains(&self, var: VariableId) -> bool {
        self.scope.contains(&var)
    }

    fn position(&self, var: VariableId) -> Option<usize> {
        self.scope.iter().position(|&v| v == var)
    }

    /// Cardinality of `var` if it is in scope.
    pub fn cardinality_of(&self, var: VariableId) -> Option<usize> {
        self.position(var).map(|pos| self.cardinalities[pos])
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Weight of a full assignment given in scope order.
    pub fn value(&self, assignment: &[usize]) -> Option<f64> {
        if assignment.len() != self.scope.len() {
            return None;
        }
        let mut offset = 0;
        for (&state, &card) in assignment.iter().zip(self.cardinalities.iter()) {
            if state >= card {
                return None;
            }
            offset = offset * card + state;
        }
        self.values.get(offset).copied()
    }

    /// Keeps only the slice consistent with `var = state` and drops `var`.
    pub fn restrict(&self, var: VariableId, state: usize) -> Result<Factor, InferenceError> {
        let pos = self.position(var).ok_or_else(|| {
            InferenceError::UnknownVariable(format!("{:?} is not in the factor scope", var))
        })?;
        if state >= self.cardinalities[pos] {
            return Err(InferenceError::UnknownVariable(format!(
                "state {} is outside the domain of {:?} (cardinality {})",
                state, var, self.cardinalities[pos]
            )));
        }

        let strides = strides(&self.cardinalities);
        let (scope, cards, kept_strides) = without_position(self, &strides, pos);
        let mut values = Vec::with_capacity(cards.iter().product());
        walk(&cards, &kept_strides, state * strides[pos], |offset| {
            values.push(self.values[offset])
        });

        Ok(Factor {
            scope,
            cardinalities: cards,
            values,
        })
    }

    /// Sums `var` out of the factor.
    pub fn marginalize(&self, var: VariableId) -> Result<Factor, InferenceError> {
        let pos = self.position(var).ok_or_else(|| {
            InferenceError::UnknownVariable(format!("{:?} is not in the factor scope", var))
        })?;

        let strides = strides(&self.cardinalities);
        let (scope, cards, kept_strides) = without_position(self, &strides, pos);
        let var_stride = strides[pos];
        let var_card = self.cardinalities[pos];
        let mut values = Vec::with_capacity(cards.iter().product());
        walk(&cards, &kept_strides, 0, |offset| {
            let sum = (0..var_card)
                .map(|k| self.values[offset + k * var_stride])
                .sum::<f64>();
            values.push(sum)
        });

        Ok(Factor {
            scope,
            cardinalities: cards,
            values,
        })
    }

    /// Outer-join product: the result's scope is `self`'s scope followed by
    /// the variables of `other` not already present.
    pub fn product(&self, other: &Factor) -> Result<Factor, InferenceError> {
        let mut scope = self.scope.clone();
        let mut cards = self.cardinalities.clone();
        for (&var, &card) in other.scope.iter().zip(other.cardinalities.iter()) {
            match self.cardinality_of(var) {
                Some(existing) if existing != card => {
                    return Err(InferenceError::Internal(format!(
                        "{:?} has cardinality {} in one factor and {} in another",
                        var, existing, card
                    )));
                }
                Some(_) => {}
                None => {
                    scope.push(var);
                    cards.push(card);
                }
            }
        }

        let lhs_strides = strides_in(&scope, self);
        let rhs_strides = strides_in(&scope, other);
        let total = table_size(&cards).ok_or_else(|| {
            InferenceError::Internal(format!(
                "product over {} variables has more entries than addressable",
                scope.len()
            ))
        })?;
        let mut values = Vec::with_capacity(total);

        let mut assignment: Radix = SmallVec::from_elem(0, scope.len());
        let (mut lhs, mut rhs) = (0usize, 0usize);
        for _ in 0..total {
            values.push(self.values[lhs] * other.values[rhs]);
            for pos in (0..scope.len()).rev() {
                assignment[pos] += 1;
                lhs += lhs_strides[pos];
                rhs += rhs_strides[pos];
                if assignment[pos] < cards[pos] {
                    break;
                }
                lhs -= lhs_strides[pos] * cards[pos];
                rhs -= rhs_strides[pos] * cards[pos];
                assignment[pos] = 0;
            }
        }

        Ok(Factor {
            scope,
            cardinalities: cards,
            values,
        })
    }

    /// Rearranges the table so that its scope follows `order`.
    ///
    /// `order` must be a permutation of the current scope.
    pub fn reorder(&self, order: &[VariableId]) -> Result<Factor, InferenceError> {
        let is_permutation = order.len() == self.scope.len()
            && order
                .iter()
                .enumerate()
                .all(|(i, v)| self.contains(*v) && !order[..i].contains(v));
        if !is_permutation {
            return Err(InferenceError::Internal(format!(
                "reorder target {:?} is not a permutation of {:?}",
                order,
                self.scope.as_slice()
            )));
        }
        let strides = strides(&self.cardinalities);
        let mut cards = Radix::new();
        let mut source_strides = Radix::new();
        for var in order {
            let pos = self.position(*var).ok_or_else(|| {
                InferenceError::Internal(format!("{:?} vanished during reorder", var))
            })?;
            cards.push(self.cardinalities[pos]);
            source_strides.push(strides[pos]);
        }
        let mut values = Vec::with_capacity(self.values.len());
        walk(&cards, &source_strides, 0, |offset| {
            values.push(self.values[offset])
        });
        Ok(Factor {
            scope: order.iter().copied().collect(),
            cardinalities: cards,
            values,
        })
    }

    /// Divides every weight by the total.
    ///
    /// Fails with [`InferenceError::DegenerateEvidence`] when the total is
    /// zero, since no distribution is consistent with the weights.
    pub fn normalized(&self) -> Result<Factor, InferenceError> {
        let total = self.total();
        if !total.is_finite() {
            return Err(InferenceError::Numerical(format!(
                "factor total {} is not finite",
                total
            )));
        }
        if total <= 0.0 {
            return Err(InferenceError::DegenerateEvidence(
                "all weights are zero".into(),
            ));
        }
        Ok(Factor {
            scope: self.scope.clone(),
            cardinalities: self.cardinalities.clone(),
            values: self.values.iter().map(|v| v / total).collect(),
        })
    }
}

/// Mixed-radix strides with the first variable most significant.
/// Number of entries in a table over `cardinalities`, or `None` on overflow.
pub(crate) fn table_size(cardinalities: &[usize]) -> Option<usize> {
    cardinalities
        .iter()
        .try_fold(1usize, |acc, &c| acc.checked_mul(c))
}

fn strides(cardinalities: &[usize]) -> Radix {
    let mut out: Radix = SmallVec::from_elem(1, cardinalities.len());
    for pos in (0..cardinalities.len().saturating_sub(1)).rev() {
        out[pos] = out[pos + 1] * cardinalities[pos + 1];
    }
    out
}

/// Strides of `factor` laid out along `scope`; zero where `factor` lacks the variable.
fn strides_in(scope: &[VariableId], factor: &Factor) -> Radix {
    let own = strides(&factor.cardinalities);
    scope
        .iter()
        .map(|var| factor.position(*var).map_or(0, |pos| own[pos]))
        .collect()
}

fn without_position(factor: &Factor, strides: &[usize], pos: usize) -> (Scope, Radix, Radix) {
    let keep = |idx: &usize| *idx != pos;
    let scope = (0..factor.scope.len())
        .filter(keep)
        .map(|i| factor.scope[i])
        .collect();
    let cards = (0..factor.scope.len())
        .filter(keep)
        .map(|i| factor.cardinalities[i])
        .collect();
    let kept = (0..factor.scope.len())
        .filter(keep)
        .map(|i| strides[i])
        .collect();
    (scope, cards, kept)
}

/// Visits every assignment of `cardinalities` in mixed-radix order and hands
/// `f` the matching source offset `base + Σ state_i * strides_i`.
fn walk(cardinalities: &[usize], strides: &[usize], base: usize, mut f: impl FnMut(usize)) {
    let total: usize = cardinalities.iter().product();
    let mut assignment: Radix = SmallVec::from_elem(0, cardinalities.len());
    let mut offset = base;
    for _ in 0..total {
        f(offset);
        for pos in (0..cardinalities.len()).rev() {
            assignment[pos] += 1;
            offset += strides[pos];
            if assignment[pos] < cardinalities[pos] {
                break;
            }
            offset -= strides[pos] * cardinalities[pos];
            assignment[pos] = 0;
        }
    }
}
