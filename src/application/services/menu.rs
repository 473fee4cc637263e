//! Menu resolution service
//!
//! Loads a menu file, expands merge directives, removes duplicate declarations and hands
//! out a [`MenuTree`] that builds the category tree on first query.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{
    strip_duplicates, Category, CategoryBuilder, EntryDirectorySource, EvalContext, KeyFile,
    MenuDocument, MergeResolver, Walk,
};
use crate::infrastructure::traits::{FileSystem, MenuLoader};

/// Resolution handle for one menu file.
///
/// Owns the document as loaded, the merge-resolved and deduplicated working document, and
/// the category tree built from it on first query. The tree is never rebuilt.
pub struct MenuTree {
    original: MenuDocument,
    resolved: MenuDocument,
    root: OnceLock<Option<Category>>,
    source: Arc<dyn EntryDirectorySource + Send + Sync>,
    context: EvalContext,
}

impl MenuTree {
    pub fn new(
        original: MenuDocument,
        resolved: MenuDocument,
        source: Arc<dyn EntryDirectorySource + Send + Sync>,
        context: EvalContext,
    ) -> Self {
        Self {
            original,
            resolved,
            root: OnceLock::new(),
            source,
            context,
        }
    }

    /// The document as it was loaded, before merging.
    pub fn original(&self) -> &MenuDocument {
        &self.original
    }

    /// The normalized working document.
    pub fn resolved(&self) -> &MenuDocument {
        &self.resolved
    }

    pub fn context(&self) -> &EvalContext {
        &self.context
    }

    /// Root category; `None` when the root menu is broken.
    pub fn root(&self) -> Option<&Category> {
        self.root
            .get_or_init(|| {
                debug!("building category tree");
                CategoryBuilder::new(&self.resolved, &*self.source, &self.context).build()
            })
            .as_ref()
    }

    /// Category at a `/`-delimited path from the root.
    pub fn find(&self, path: &str) -> Option<&Category> {
        self.root()?.find(path)
    }

    /// Names of the immediate subcategories; empty when the path is not found.
    pub fn list_subdirs(&self, path: &str) -> Vec<String> {
        self.find(path)
            .map(Category::subdir_names)
            .unwrap_or_default()
    }

    /// Absolute paths of the entries of a category; empty when the path is not found.
    pub fn list_entries(&self, path: &str) -> Vec<PathBuf> {
        self.find(path)
            .map(Category::entry_paths)
            .unwrap_or_default()
    }

    /// Absolute path of the directory descriptor of a category.
    pub fn get_directory(&self, path: &str) -> Option<PathBuf> {
        self.find(path).map(|c| c.directory.path.clone())
    }

    /// Depth-first pre-order walk starting at `path`; empty when the path is not found.
    pub fn walk(&self, path: &str) -> Walk<'_> {
        match self.find(path) {
            Some(category) => category.walk(path),
            None => Walk::empty(),
        }
    }
}

/// Service that opens menu files into [`MenuTree`] handles.
pub struct MenuService {
    fs: Arc<dyn FileSystem>,
    loader: Arc<dyn MenuLoader>,
    source: Arc<dyn EntryDirectorySource + Send + Sync>,
}

impl MenuService {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        loader: Arc<dyn MenuLoader>,
        source: Arc<dyn EntryDirectorySource + Send + Sync>,
    ) -> Self {
        Self { fs, loader, source }
    }

    /// Load, merge-resolve and deduplicate a menu file.
    ///
    /// Only a failure to load `path` itself is an error; broken merge targets are skipped.
    #[instrument(level = "debug", skip(self, context))]
    pub fn open(&self, path: &Path, context: EvalContext) -> ApplicationResult<Arc<MenuTree>> {
        let original = self
            .loader
            .load(path)
            .map_err(|e| ApplicationError::MenuLoad {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;

        let mut resolved = original.deep_copy();
        MergeResolver::new(&self.loader).resolve(&mut resolved);
        strip_duplicates(&mut resolved);
        debug!(
            "resolved {}: {} nodes loaded, {} after normalization",
            path.display(),
            original.len(),
            resolved.len()
        );

        Ok(Arc::new(MenuTree::new(
            original,
            resolved,
            Arc::clone(&self.source),
            context,
        )))
    }

    /// Read display fields of a descriptor. Each `keys` item maps to its localized value,
    /// `None` when the descriptor lacks it.
    pub fn read_fields(
        &self,
        path: &Path,
        keys: &[&str],
        locale: Option<&str>,
    ) -> ApplicationResult<Vec<Option<String>>> {
        let bytes = self.fs.read(path).with_path_context("read descriptor", path)?;
        let file = KeyFile::parse(&bytes)?;
        Ok(keys
            .iter()
            .map(|key| file.locale_string(key, locale))
            .collect())
    }
}
