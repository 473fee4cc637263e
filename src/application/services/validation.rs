//! Descriptor validation service

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::validate::validate_bytes;
use crate::domain::ValidationReport;
use crate::infrastructure::traits::FileSystem;

/// Runs the descriptor validator over files read through a [`FileSystem`].
pub struct ValidationService {
    fs: Arc<dyn FileSystem>,
}

impl ValidationService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Validate the descriptor at `path`. Only failing to read the file is an error;
    /// everything wrong with its content lands in the report.
    #[instrument(level = "debug", skip(self))]
    pub fn validate_file(&self, path: &Path) -> ApplicationResult<ValidationReport> {
        let bytes = self.fs.read(path).with_path_context("read descriptor", path)?;
        let report = validate_bytes(&bytes);
        debug!(
            "{}: {} errors, {} warnings",
            path.display(),
            report.errors().count(),
            report.warnings().count()
        );
        Ok(report)
    }
}
