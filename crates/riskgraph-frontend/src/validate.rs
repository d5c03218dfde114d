//! # Semantic Validation
//!
//! Checks a parsed model for naming and reference errors:
//!
//! - variable names are unique and each variable has at least two distinct states
//! - edges, CPD owners, and CPD parents reference declared variables
//! - evidence set names are unique, assign each variable at most once, and
//!   name states that exist in the variable's domain
//!
//! Structural checks (cycles, parent sets matching edges, table shapes and
//! column sums) are left to the network builder, which owns those invariants.

use std::collections::HashSet;

use crate::ast::*;
use crate::errors::{FrontendError, ValidationContext};

/// Performs semantic validation on a parsed model.
///
/// # Example
///
/// ```rust,ignore
/// use riskgraph_frontend::{parse_model, validate_model};
///
/// let ast = parse_model(source)?;
/// validate_model(&ast)?;
/// ```
pub fn validate_model(ast: &ModelAst) -> Result<(), FrontendError> {
    let mut names = HashSet::new();
    for variable in &ast.variables {
        if !names.insert(variable.name.as_str()) {
            return Err(variable_error(variable, "duplicate variable declaration"));
        }
        validate_states(variable)?;
    }

    for edge in &ast.edges {
        for endpoint in [&edge.parent, &edge.child] {
            if !names.contains(endpoint.as_str()) {
                return Err(FrontendError::validation(
                    format!("unknown variable '{}'", endpoint),
                    Some(ValidationContext::Edge {
                        parent: edge.parent.clone(),
                        child: edge.child.clone(),
                    }),
                    edge.range,
                ));
            }
        }
    }

    for cpd in &ast.cpds {
        validate_cpd_references(cpd, &names)?;
    }

    let mut evidence_names = HashSet::new();
    for evidence in &ast.evidence_sets {
        if !evidence_names.insert(evidence.name.as_str()) {
            return Err(evidence_error(evidence, "duplicate evidence set"));
        }
        validate_evidence(evidence, ast)?;
    }

    Ok(())
}

fn validate_states(variable: &VariableDecl) -> Result<(), FrontendError> {
    if variable.states.len() < 2 {
        return Err(variable_error(
            variable,
            format!(
                "a variable needs at least 2 states, found {}",
                variable.states.len()
            ),
        ));
    }
    let mut seen = HashSet::new();
    for state in &variable.states {
        if !seen.insert(state.as_str()) {
            return Err(variable_error(
                variable,
                format!("duplicate state '{}'", state),
            ));
        }
    }
    Ok(())
}

fn validate_cpd_references(cpd: &CpdDecl, names: &HashSet<&str>) -> Result<(), FrontendError> {
    let context = || {
        Some(ValidationContext::Cpd {
            variable: cpd.variable.clone(),
        })
    };

    if !names.contains(cpd.variable.as_str()) {
        return Err(FrontendError::validation(
            format!("cpd for unknown variable '{}'", cpd.variable),
            context(),
            cpd.range,
        ));
    }

    let mut seen = HashSet::new();
    for parent in &cpd.parents {
        if !names.contains(parent.as_str()) {
            return Err(FrontendError::validation(
                format!("unknown parent '{}'", parent),
                context(),
                cpd.range,
            ));
        }
        if !seen.insert(parent.as_str()) {
            return Err(FrontendError::validation(
                format!("parent '{}' listed twice", parent),
                context(),
                cpd.range,
            ));
        }
    }
    Ok(())
}

fn validate_evidence(evidence: &EvidenceSetDecl, ast: &ModelAst) -> Result<(), FrontendError> {
    let mut assigned = HashSet::new();
    for (variable, state) in &evidence.assignments {
        let decl = ast.variable(variable).ok_or_else(|| {
            evidence_error(evidence, format!("unknown variable '{}'", variable))
        })?;
        if !decl.states.iter().any(|s| s == state) {
            return Err(evidence_error(
                evidence,
                format!("variable '{}' has no state '{}'", variable, state),
            ));
        }
        if !assigned.insert(variable.as_str()) {
            return Err(evidence_error(
                evidence,
                format!("variable '{}' assigned more than once", variable),
            ));
        }
    }
    Ok(())
}

fn variable_error(variable: &VariableDecl, message: impl Into<String>) -> FrontendError {
    FrontendError::validation(
        message,
        Some(ValidationContext::Variable {
            variable: variable.name.clone(),
        }),
        variable.range,
    )
}

fn evidence_error(evidence: &EvidenceSetDecl, message: impl Into<String>) -> FrontendError {
    FrontendError::validation(
        message,
        Some(ValidationContext::Evidence {
            evidence: evidence.name.clone(),
        }),
        evidence.range,
    )
}
