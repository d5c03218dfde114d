//! Turns a parsed model description into a validated network.
//!
//! The frontend checks names and references; everything structural
//! (acyclicity, parent sets, table shapes, column sums) is checked here by
//! [`BayesianNetwork::build`].

use riskgraph_frontend::errors::SourceRange;
use riskgraph_frontend::{CpdDecl, ModelAst};

use crate::engine::cpd::TabularCpd;
use crate::engine::errors::InferenceError;
use crate::engine::evidence::Evidence;
use crate::engine::network::BayesianNetwork;
use crate::engine::variable::{StateRef, Variable};

/// A network together with the evidence sets declared next to it.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub network: BayesianNetwork,
    /// Named evidence sets in declaration order.
    pub evidence_sets: Vec<(String, Evidence)>,
}

impl LoadedModel {
    pub fn evidence(&self, name: &str) -> Option<&Evidence> {
        self.evidence_sets
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Like [`evidence`](Self::evidence), but an unknown name is an error.
    pub fn require_evidence(&self, name: &str) -> Result<&Evidence, InferenceError> {
        self.evidence(name).ok_or_else(|| {
            InferenceError::Validation(format!(
                "model '{}' declares no evidence set '{}'",
                self.name, name
            ))
        })
    }
}

/// Parses, validates, and builds a model description.
pub fn load_model(source: &str) -> Result<LoadedModel, InferenceError> {
    let ast = riskgraph_frontend::parse_and_validate(source)?;
    build_model(&ast)
}

/// Builds a network from an already validated AST.
pub fn build_model(ast: &ModelAst) -> Result<LoadedModel, InferenceError> {
    let variables = ast
        .variables
        .iter()
        .map(|decl| Variable::new(decl.name.as_str(), decl.states.iter().map(String::as_str)))
        .collect::<Result<Vec<_>, _>>()?;

    let edges = ast
        .edges
        .iter()
        .map(|edge| (edge.parent.as_str(), edge.child.as_str()));

    let cpds = ast
        .cpds
        .iter()
        .map(build_cpd)
        .collect::<Result<Vec<_>, _>>()?;

    let network = BayesianNetwork::build(variables, edges, cpds)?;

    let evidence_sets = ast
        .evidence_sets
        .iter()
        .map(|set| {
            let evidence = set
                .assignments
                .iter()
                .map(|(var, state)| (var.clone(), StateRef::from(state.as_str())))
                .collect::<Evidence>();
            // Names were checked by the frontend; this catches hand-built ASTs.
            network.resolve_evidence(&evidence)?;
            Ok((set.name.clone(), evidence))
        })
        .collect::<Result<Vec<_>, InferenceError>>()?;

    Ok(LoadedModel {
        name: ast.name.clone(),
        network,
        evidence_sets,
    })
}

fn build_cpd(decl: &CpdDecl) -> Result<TabularCpd, InferenceError> {
    TabularCpd::new(
        decl.variable.as_str(),
        decl.parents.iter().map(String::as_str),
        decl.rows.clone(),
    )
    .map_err(|err| match (err, decl.range) {
        (InferenceError::Structure(msg), Some(range)) => {
            InferenceError::Structure(format!("{} {}", msg, location(range)))
        }
        (err, _) => err,
    })
}

fn location(range: SourceRange) -> String {
    format!(
        "(at {}:{}-{}:{})",
        range.start.line, range.start.column, range.end.line, range.end.column
    )
}
