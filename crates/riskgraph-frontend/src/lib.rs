//! # Riskgraph Frontend
//!
//! Parser, AST, and validation for riskgraph model descriptions.

pub mod ast;
pub mod errors;
pub mod parser;
pub mod validate;

// Re-export commonly used types
pub use ast::*;
pub use errors::FrontendError;
pub use parser::parse_model;
pub use validate::validate_model;

/// Parses and validates a model description in one step.
pub fn parse_and_validate(source: &str) -> Result<ModelAst, FrontendError> {
    let ast = parse_model(source)?;
    validate_model(&ast)?;
    Ok(ast)
}
