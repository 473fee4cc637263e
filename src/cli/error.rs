//! CLI-level errors (wraps infrastructure and application errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Application(#[from] ApplicationError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("{} has {errors} error(s)", path.display())]
    ValidationFailed { path: PathBuf, errors: usize },
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::ValidationFailed { .. } => exitcode::INVALID,
            CliError::Application(e) => application_exit_code(e),
            CliError::Infra(e) => infra_exit_code(e),
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::MenuLoad { source, .. } => match source.downcast_ref::<InfraError>() {
            Some(infra) => infra_exit_code(infra),
            None => exitcode::NOINPUT,
        },
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::Domain(_) => exitcode::DATAERR,
        ApplicationError::OperationFailed { .. } => exitcode::IOERR,
    }
}

fn infra_exit_code(e: &InfraError) -> i32 {
    match e {
        InfraError::Application(inner) => application_exit_code(inner),
        InfraError::Canonicalize { .. } => exitcode::NOINPUT,
        InfraError::Io { .. } => exitcode::IOERR,
        InfraError::Xml { .. } | InfraError::NotAMenu { .. } => exitcode::DATAERR,
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;

    use super::*;

    #[test]
    fn given_missing_menu_when_mapping_exit_code_then_noinput() {
        let err = CliError::Application(ApplicationError::MenuLoad {
            path: PathBuf::from("/nope.menu"),
            source: Box::new(InfraError::Canonicalize {
                path: PathBuf::from("/nope.menu"),
                source: io::Error::from(io::ErrorKind::NotFound),
            }),
        });

        assert_eq!(err.exit_code(), exitcode::NOINPUT);
    }

    #[test]
    fn given_malformed_menu_when_mapping_exit_code_then_dataerr() {
        let err = CliError::Application(ApplicationError::MenuLoad {
            path: PathBuf::from("/bad.menu"),
            source: Box::new(InfraError::NotAMenu {
                path: PathBuf::from("/bad.menu"),
                found: "Other".into(),
            }),
        });

        assert_eq!(err.exit_code(), exitcode::DATAERR);
    }

    #[test]
    fn given_config_and_validation_errors_when_mapping_exit_code_then_distinct_codes() {
        let config = CliError::Application(ApplicationError::Config {
            message: "bad".into(),
        });
        let validation = CliError::ValidationFailed {
            path: Path::new("/a.desktop").to_path_buf(),
            errors: 2,
        };

        assert_eq!(config.exit_code(), exitcode::CONFIG);
        assert_eq!(validation.exit_code(), exitcode::INVALID);
    }
}
