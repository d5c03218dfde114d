//! # Abstract Syntax Tree
//!
//! Data structures produced by the model description parser.
//!
//! A model consists of:
//! - **Variables**: discrete random variables with ordered, labelled states
//! - **Edges**: parent -> child dependencies
//! - **CPDs**: one conditional probability table per variable
//! - **Evidence sets**: named partial assignments used as scenarios
//!
//! The AST is purely syntactic. Structural checks (acyclicity, table shapes,
//! column sums) belong to the network builder in `riskgraph-core`.

use crate::errors::SourceRange;

/// The root of a parsed model description.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelAst {
    /// Network name
    pub name: String,
    /// Variable declarations in source order
    pub variables: Vec<VariableDecl>,
    /// Edge declarations in source order
    pub edges: Vec<EdgeDecl>,
    /// Conditional probability tables
    pub cpds: Vec<CpdDecl>,
    /// Named evidence sets
    pub evidence_sets: Vec<EvidenceSetDecl>,
}

impl ModelAst {
    /// Looks up a variable declaration by name.
    pub fn variable(&self, name: &str) -> Option<&VariableDecl> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Looks up an evidence set by name.
    pub fn evidence_set(&self, name: &str) -> Option<&EvidenceSetDecl> {
        self.evidence_sets.iter().find(|e| e.name == name)
    }
}

/// `variable Name { states: [a, b, ...] }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDecl {
    pub name: String,
    /// Ordered state labels; index `i` is state `i`.
    pub states: Vec<String>,
    pub range: Option<SourceRange>,
}

/// `edge Parent -> Child`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeDecl {
    pub parent: String,
    pub child: String,
    pub range: Option<SourceRange>,
}

/// `cpd Name given P1, P2 { [row0...], [row1...] }`
///
/// Rows are indexed by the owner's state; columns by the parent assignment
/// read as mixed-radix digits with the first listed parent most significant.
#[derive(Debug, Clone, PartialEq)]
pub struct CpdDecl {
    pub variable: String,
    pub parents: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub range: Option<SourceRange>,
}

/// `evidence Name { Var = state, ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceSetDecl {
    pub name: String,
    /// `(variable, state label)` pairs in source order.
    pub assignments: Vec<(String, String)>,
    pub range: Option<SourceRange>,
}
