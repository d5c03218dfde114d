//! Error types for model construction and inference.

use thiserror::Error;

impl From<riskgraph_frontend::FrontendError> for InferenceError {
    fn from(err: riskgraph_frontend::FrontendError) -> Self {
        match err {
            riskgraph_frontend::FrontendError::ParseError(msg) => InferenceError::Parse(msg),
            riskgraph_frontend::FrontendError::ValidationError(msg) => {
                InferenceError::Validation(msg)
            }
            riskgraph_frontend::FrontendError::ValidationDiagnostic(diag) => {
                InferenceError::Validation(diag.detail())
            }
            _ => InferenceError::Internal(format!("unexpected frontend error: {:?}", err)),
        }
    }
}

/// Errors raised while building a network or answering a query.
///
/// All failures are detected before any probability is computed and none are
/// worth retrying: the computation is deterministic in its inputs.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InferenceError {
    /// Malformed network: cycle, parent/CPD mismatch, bad table shape,
    /// non-normalized column, missing or duplicate CPD.
    #[error("structure error: {0}")]
    Structure(String),

    /// Evidence or query names a variable absent from the network, or a
    /// state outside a variable's domain.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Evidence has zero total probability under the model.
    #[error("degenerate evidence: {0}")]
    DegenerateEvidence(String),

    /// NaN/Inf or otherwise unusable numeric input.
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Syntax error in a model description.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid configuration or semantic error in a model description.
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal invariant violation (programmer error, not user error).
    #[error("internal error: {0}")]
    Internal(String),
}
