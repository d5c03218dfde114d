//! Error types for parsing and validation.

use std::fmt;

use thiserror::Error;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

/// Source range with inclusive start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceRange {
    pub(crate) fn from_span(span: pest::Span<'_>) -> Self {
        let (start_line, start_col) = span.start_pos().line_col();
        let (end_line, end_col) = span.end_pos().line_col();
        SourceRange {
            start: SourcePosition {
                line: start_line as u32,
                column: start_col as u32,
            },
            end: SourcePosition {
                line: end_line as u32,
                column: end_col as u32,
            },
        }
    }
}

/// Semantic validation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationContext {
    Variable { variable: String },
    Edge { parent: String, child: String },
    Cpd { variable: String },
    Evidence { evidence: String },
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable { variable } => write!(f, "variable '{}'", variable),
            Self::Edge { parent, child } => write!(f, "edge '{} -> {}'", parent, child),
            Self::Cpd { variable } => write!(f, "cpd '{}'", variable),
            Self::Evidence { evidence } => write!(f, "evidence '{}'", evidence),
        }
    }
}

/// Rich semantic validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub message: String,
    pub context: Option<ValidationContext>,
    pub range: Option<SourceRange>,
}

impl ValidationDiagnostic {
    /// Context, message and location without the "validation error" prefix,
    /// for callers that wrap the diagnostic in their own error category.
    pub fn detail(&self) -> String {
        let mut out = match &self.context {
            Some(ctx) => format!("{}: {}", ctx, self.message),
            None => self.message.clone(),
        };
        if let Some(range) = self.range {
            out.push_str(&format_range(range));
        }
        out
    }
}

fn format_range(range: SourceRange) -> String {
    format!(
        " (at {}:{}-{}:{})",
        range.start.line, range.start.column, range.end.line, range.end.column
    )
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error")?;
        if let Some(ctx) = &self.context {
            write!(f, " [{}]", ctx)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(range) = self.range {
            f.write_str(&format_range(range))?;
        }
        Ok(())
    }
}

/// Errors that can occur during parsing or validation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum FrontendError {
    /// Syntax error during parsing.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Semantic validation error.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Semantic validation error with context and optional source range.
    #[error("{0}")]
    ValidationDiagnostic(ValidationDiagnostic),
}

impl FrontendError {
    /// Build a context-aware validation diagnostic.
    pub fn validation(
        message: impl Into<String>,
        context: Option<ValidationContext>,
        range: Option<SourceRange>,
    ) -> Self {
        Self::ValidationDiagnostic(ValidationDiagnostic {
            message: message.into(),
            context,
            range,
        })
    }

    /// Returns the rich validation diagnostic if present.
    pub fn validation_diagnostic(&self) -> Option<&ValidationDiagnostic> {
        match self {
            Self::ValidationDiagnostic(diag) => Some(diag),
            _ => None,
        }
    }
}
