//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations detected by pure, in-memory logic.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("line {line}: {message}")]
    KeyFileSyntax { line: usize, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
