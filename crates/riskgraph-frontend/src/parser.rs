//! # Model Parser
//!
//! Parser for the riskgraph model description language, built on the Pest
//! parser generator.
//!
//! The parser transforms source text into a typed [`ModelAst`] without
//! semantic validation. Numbers are parsed to `f64` at parse time so that
//! table values never travel as strings.
//!
//! ## Grammar
//!
//! The grammar is defined in `grammar.pest` at the crate root.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::*;
use crate::errors::{FrontendError, SourceRange};

#[derive(Parser)]
#[grammar = "../grammar.pest"]
pub struct ModelParser;

/// Parses a model description into an Abstract Syntax Tree.
///
/// This is a pure syntactic parser. Use [`crate::validate::validate_model`]
/// to check name references in the resulting AST.
///
/// # Example
///
/// ```rust,ignore
/// use riskgraph_frontend::parse_model;
///
/// let ast = parse_model("network N { variable A { states: [0, 1] } cpd A { [0.5], [0.5] } }")?;
/// assert_eq!(ast.variables.len(), 1);
/// ```
pub fn parse_model(source: &str) -> Result<ModelAst, FrontendError> {
    let mut pairs = ModelParser::parse(Rule::program, source)
        .map_err(|e| FrontendError::ParseError(e.to_string()))?;

    let program = pairs
        .next()
        .ok_or_else(|| FrontendError::ParseError("empty model description".to_string()))?;

    let network = program
        .into_inner()
        .find(|p| p.as_rule() == Rule::network_decl)
        .ok_or_else(|| FrontendError::ParseError("missing network declaration".to_string()))?;

    build_network(network)
}

fn build_network(pair: Pair<Rule>) -> Result<ModelAst, FrontendError> {
    let mut name = String::new();
    let mut variables = Vec::new();
    let mut edges = Vec::new();
    let mut cpds = Vec::new();
    let mut evidence_sets = Vec::new();

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::ident if name.is_empty() => name = p.as_str().to_string(),
            Rule::variable_decl => variables.push(build_variable(p)?),
            Rule::edge_decl => edges.push(build_edge(p)?),
            Rule::cpd_decl => cpds.push(build_cpd(p)?),
            Rule::evidence_decl => evidence_sets.push(build_evidence(p)?),
            _ => {}
        }
    }

    Ok(ModelAst {
        name,
        variables,
        edges,
        cpds,
        evidence_sets,
    })
}

fn build_variable(pair: Pair<Rule>) -> Result<VariableDecl, FrontendError> {
    let range = Some(SourceRange::from_span(pair.as_span()));
    let mut inner = pair.into_inner();
    let name = extract_ident(&mut inner, "missing variable name")?;

    let mut states = Vec::new();
    for p in inner {
        if p.as_rule() == Rule::state_list {
            states.extend(
                p.into_inner()
                    .filter(|s| s.as_rule() == Rule::state_label)
                    .map(|s| s.as_str().to_string()),
            );
        }
    }

    Ok(VariableDecl {
        name,
        states,
        range,
    })
}

fn build_edge(pair: Pair<Rule>) -> Result<EdgeDecl, FrontendError> {
    let range = Some(SourceRange::from_span(pair.as_span()));
    let mut inner = pair.into_inner();
    let parent = extract_ident(&mut inner, "missing edge parent")?;
    let child = extract_ident(&mut inner, "missing edge child")?;
    Ok(EdgeDecl {
        parent,
        child,
        range,
    })
}

fn build_cpd(pair: Pair<Rule>) -> Result<CpdDecl, FrontendError> {
    let range = Some(SourceRange::from_span(pair.as_span()));
    let mut inner = pair.into_inner();
    let variable = extract_ident(&mut inner, "missing cpd variable")?;

    let mut parents = Vec::new();
    let mut rows = Vec::new();
    for p in inner {
        match p.as_rule() {
            Rule::given_clause => {
                parents.extend(
                    p.into_inner()
                        .filter(|g| g.as_rule() == Rule::ident)
                        .map(|g| g.as_str().to_string()),
                );
            }
            Rule::row_list => {
                for row in p.into_inner().filter(|r| r.as_rule() == Rule::row) {
                    rows.push(build_row(row)?);
                }
            }
            _ => {}
        }
    }

    Ok(CpdDecl {
        variable,
        parents,
        rows,
        range,
    })
}

fn build_row(pair: Pair<Rule>) -> Result<Vec<f64>, FrontendError> {
    pair.into_inner()
        .filter(|n| n.as_rule() == Rule::number)
        .map(|n| {
            n.as_str().parse::<f64>().map_err(|e| {
                FrontendError::ParseError(format!("invalid number '{}': {}", n.as_str(), e))
            })
        })
        .collect()
}

fn build_evidence(pair: Pair<Rule>) -> Result<EvidenceSetDecl, FrontendError> {
    let range = Some(SourceRange::from_span(pair.as_span()));
    let mut inner = pair.into_inner();
    let name = extract_ident(&mut inner, "missing evidence name")?;

    let mut assignments = Vec::new();
    for p in inner {
        if p.as_rule() == Rule::assignment {
            let mut parts = p.into_inner();
            let variable = extract_ident(&mut parts, "missing evidence variable")?;
            let state = parts
                .find(|s| s.as_rule() == Rule::state_label)
                .map(|s| s.as_str().to_string())
                .ok_or_else(|| FrontendError::ParseError("missing evidence state".to_string()))?;
            assignments.push((variable, state));
        }
    }

    Ok(EvidenceSetDecl {
        name,
        assignments,
        range,
    })
}

/// Helper to extract the next ident from an iterator
fn extract_ident(
    iter: &mut pest::iterators::Pairs<Rule>,
    error_msg: &str,
) -> Result<String, FrontendError> {
    iter.find(|p| p.as_rule() == Rule::ident)
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| FrontendError::ParseError(error_msg.to_string()))
}
