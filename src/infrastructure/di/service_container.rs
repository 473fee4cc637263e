//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{MenuService, ValidationService};
use crate::config::Settings;
use crate::domain::EntryDirectorySource;
use crate::infrastructure::traits::{FileSystem, MenuLoader, RealFileSystem};
use crate::infrastructure::{FsEntryScanner, XmlMenuLoader};

/// Container holding all application services.
///
/// The descriptor scanner is shared, so every menu opened through one container reuses
/// directory scans.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    pub menu_service: MenuService,
    pub validation_service: ValidationService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with a custom filesystem (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let loader: Arc<dyn MenuLoader> = Arc::new(XmlMenuLoader::new(Arc::clone(&fs)));
        let scanner: Arc<dyn EntryDirectorySource + Send + Sync> =
            Arc::new(FsEntryScanner::new(Arc::clone(&fs)));

        Self {
            menu_service: MenuService::new(Arc::clone(&fs), loader, scanner),
            validation_service: ValidationService::new(Arc::clone(&fs)),
            settings,
            fs,
        }
    }
}
