//! # Conditional Probability Tables
//!
//! A [`TabularCpd`] stores `P(variable | parents)` as a table with one row per
//! state of the owning variable and one column per joint parent assignment.
//!
//! ## Column convention
//!
//! The column for a parent assignment is the parent states read as
//! mixed-radix digits, **first listed parent most significant, last listed
//! parent least significant**. For parents `[Peer, Psychology, LawEdu]`,
//! all binary, column `5 = 0b101` is `Peer=1, Psychology=0, LawEdu=1`.
//!
//! Parent order is significant for indexing only. The network checks the
//! parent *set* against the declared edges.

use std::sync::Arc;

use crate::engine::errors::InferenceError;
use crate::engine::factor::{table_size, Factor};
use crate::engine::variable::VariableId;

/// Default tolerance for column sums.
pub const DEFAULT_COLUMN_TOLERANCE: f64 = 1e-6;

/// Conditional probability table for one variable.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularCpd {
    variable: Arc<str>,
    parents: Vec<Arc<str>>,
    rows: usize,
    columns: usize,
    /// Row-major: `values[row * columns + column]`.
    values: Vec<f64>,
}

impl TabularCpd {
    /// Creates a table from rows indexed by the owner's states.
    ///
    /// Checks that the table is non-empty, rectangular, finite and
    /// non-negative. Shape against cardinalities and column sums are checked
    /// when the table joins a network, since only the network knows the
    /// parents' domains.
    pub fn new<N, I, P>(variable: N, parents: I, rows: Vec<Vec<f64>>) -> Result<Self, InferenceError>
    where
        N: Into<Arc<str>>,
        I: IntoIterator<Item = P>,
        P: Into<Arc<str>>,
    {
        let variable = variable.into();
        let parents: Vec<Arc<str>> = parents.into_iter().map(Into::into).collect();

        let row_count = rows.len();
        let columns = rows.first().map_or(0, Vec::len);
        if row_count == 0 || columns == 0 {
            return Err(InferenceError::Structure(format!(
                "cpd '{}' has an empty table",
                variable
            )));
        }
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns) {
            return Err(InferenceError::Structure(format!(
                "cpd '{}' row {} has {} columns, expected {}",
                variable,
                idx,
                row.len(),
                columns
            )));
        }

        let values: Vec<f64> = rows.into_iter().flatten().collect();
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(InferenceError::Structure(format!(
                "cpd '{}' contains entry {}; probabilities must be finite and non-negative",
                variable, bad
            )));
        }

        Ok(Self {
            variable,
            parents,
            rows: row_count,
            columns,
            values,
        })
    }

    /// A parentless table: one probability per state.
    pub fn prior<N: Into<Arc<str>>>(
        variable: N,
        probabilities: &[f64],
    ) -> Result<Self, InferenceError> {
        let rows = probabilities.iter().map(|p| vec![*p]).collect();
        Self::new(variable, std::iter::empty::<Arc<str>>(), rows)
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Parents in column-index order (first = most significant).
    pub fn parents(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.parents.iter().map(|p| p.as_ref())
    }

    pub fn parent_count(&self) -> usize {
        self.parents.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// `P(variable = row | parent assignment with index column)`.
    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        Some(self.values[row * self.columns + column])
    }

    /// The conditional distribution for one parent assignment.
    pub fn column(&self, column: usize) -> Option<Vec<f64>> {
        (column < self.columns)
            .then(|| (0..self.rows).map(|r| self.values[r * self.columns + column]).collect())
    }

    /// Column index for parent states given in this table's parent order.
    pub fn column_index(parent_states: &[usize], parent_cardinalities: &[usize]) -> Option<usize> {
        if parent_states.len() != parent_cardinalities.len() {
            return None;
        }
        let mut column = 0;
        for (&state, &card) in parent_states.iter().zip(parent_cardinalities) {
            if state >= card {
                return None;
            }
            column = column * card + state;
        }
        Some(column)
    }

    /// Checks the table against the owner's and parents' cardinalities and
    /// that every column sums to one within `tolerance`.
    pub(crate) fn validate_shape(
        &self,
        cardinality: usize,
        parent_cardinalities: &[usize],
        tolerance: f64,
    ) -> Result<(), InferenceError> {
        if self.rows != cardinality {
            return Err(InferenceError::Structure(format!(
                "cpd '{}' has {} rows but the variable has {} states",
                self.variable, self.rows, cardinality
            )));
        }
        let expected_columns = table_size(parent_cardinalities).ok_or_else(|| {
            InferenceError::Structure(format!(
                "cpd '{}' parents require more columns than addressable",
                self.variable
            ))
        })?;
        if self.columns != expected_columns {
            return Err(InferenceError::Structure(format!(
                "cpd '{}' has {} columns but its parents require {}",
                self.variable, self.columns, expected_columns
            )));
        }
        for column in 0..self.columns {
            let sum: f64 = (0..self.rows)
                .map(|r| self.values[r * self.columns + column])
                .sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(InferenceError::Structure(format!(
                    "cpd '{}' column {} sums to {}, expected 1",
                    self.variable, column, sum
                )));
            }
        }
        Ok(())
    }

    /// The table as a factor with scope `[owner, parents...]`.
    ///
    /// With the owner as the most significant digit, the row-major table is
    /// already in the factor's mixed-radix layout.
    pub(crate) fn to_factor(
        &self,
        owner: VariableId,
        parents: &[VariableId],
        cardinality: usize,
        parent_cardinalities: &[usize],
    ) -> Result<Factor, InferenceError> {
        let mut scope = Vec::with_capacity(parents.len() + 1);
        scope.push(owner);
        scope.extend_from_slice(parents);
        let mut cards = Vec::with_capacity(parents.len() + 1);
        cards.push(cardinality);
        cards.extend_from_slice(parent_cardinalities);
        Factor::new(&scope, &cards, self.values.clone())
    }
}
