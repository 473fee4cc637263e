//! Category tree: build from a normalized document, then query by `/`-delimited path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::context::EvalContext;
use crate::domain::entry::{
    Entry, EntryDirectory, EntryDirectoryList, EntryIndex, EntryKind, EntrySet,
};
use crate::domain::node::{MenuDocument, NodeKind};
use crate::domain::rules::RuleEvaluator;

/// Supplies scanned entry directories to the builder.
pub trait EntryDirectorySource {
    /// All descriptors of `kind` below `path`. A missing directory yields an empty one.
    fn load_directory(&self, path: &Path, kind: EntryKind) -> Arc<EntryDirectory>;
}

/// A resolved menu folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Directory-metadata descriptor (`.directory`)
    pub directory: Entry,
    /// Matched application entries, ordered by absolute path
    pub entries: Vec<Entry>,
    /// Child categories in declaration order
    pub subdirs: Vec<Category>,
}

/// Build artifact: a category whose name or directory may still be unresolved.
#[derive(Debug, Default)]
struct CategoryRecord {
    name: Option<String>,
    directory: Option<Entry>,
    entries: Vec<Entry>,
    subdirs: Vec<Category>,
}

impl CategoryRecord {
    /// `None` for a broken record (missing name or directory metadata).
    fn into_category(self) -> Option<Category> {
        Some(Category {
            name: self.name?,
            directory: self.directory?,
            entries: self.entries,
            subdirs: self.subdirs,
        })
    }
}

impl Category {
    /// Descend one subdirectory per non-empty `/`-separated segment.
    pub fn find(&self, path: &str) -> Option<&Category> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |current, segment| {
                current.subdirs.iter().find(|c| c.name == segment)
            })
    }

    pub fn subdir_names(&self) -> Vec<String> {
        self.subdirs.iter().map(|c| c.name.clone()).collect()
    }

    pub fn entry_paths(&self) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Pre-order walk: this category, its entries, then each subdirectory in turn.
    /// `menu_path` is the path reported for this category.
    pub fn walk(&self, menu_path: &str) -> Walk<'_> {
        Walk {
            stack: vec![Pending::Category {
                category: self,
                depth: 0,
                menu_path: normalize(menu_path),
            }],
        }
    }
}

fn normalize(path: &str) -> String {
    format!("/{}", path.split('/').filter(|s| !s.is_empty()).join("/"))
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitKind {
    Category,
    Entry,
}

/// One step of a [`Walk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit<'a> {
    pub kind: VisitKind,
    /// 0 for the starting category; entries share the depth of their category
    pub depth: usize,
    /// Path of the category being visited, or of the category owning the entry
    pub menu_path: String,
    /// Directory descriptor of a category, descriptor file of an entry
    pub path: &'a Path,
}

enum Pending<'a> {
    Category {
        category: &'a Category,
        depth: usize,
        menu_path: String,
    },
    Entry {
        entry: &'a Entry,
        depth: usize,
        menu_path: String,
    },
}

/// Lazy depth-first walk over a category subtree. Dropping it ends the traversal.
pub struct Walk<'a> {
    stack: Vec<Pending<'a>>,
}

impl<'a> Walk<'a> {
    /// A walk that yields nothing.
    pub fn empty() -> Self {
        Self { stack: Vec::new() }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.stack.pop()? {
            Pending::Category {
                category,
                depth,
                menu_path,
            } => {
                for sub in category.subdirs.iter().rev() {
                    self.stack.push(Pending::Category {
                        category: sub,
                        depth: depth + 1,
                        menu_path: child_path(&menu_path, &sub.name),
                    });
                }
                for entry in category.entries.iter().rev() {
                    self.stack.push(Pending::Entry {
                        entry,
                        depth,
                        menu_path: menu_path.clone(),
                    });
                }
                Some(Visit {
                    kind: VisitKind::Category,
                    depth,
                    menu_path,
                    path: category.directory.path.as_path(),
                })
            }
            Pending::Entry {
                entry,
                depth,
                menu_path,
            } => Some(Visit {
                kind: VisitKind::Entry,
                depth,
                menu_path,
                path: entry.path.as_path(),
            }),
        }
    }
}

/// Materializes the category tree of a merge-resolved, deduplicated document.
pub struct CategoryBuilder<'a> {
    doc: &'a MenuDocument,
    source: &'a dyn EntryDirectorySource,
    context: &'a EvalContext,
}

impl<'a> CategoryBuilder<'a> {
    pub fn new(
        doc: &'a MenuDocument,
        source: &'a dyn EntryDirectorySource,
        context: &'a EvalContext,
    ) -> Self {
        Self {
            doc,
            source,
            context,
        }
    }

    /// Root category, or `None` when the document has no `<Menu>` or the root is broken.
    #[instrument(level = "debug", skip_all)]
    pub fn build(&self) -> Option<Category> {
        let menu = self.doc.top_menu()?;
        let root = self.build_menu(menu, &[]);
        if root.is_none() {
            debug!("root category is broken, tree is empty");
        }
        root
    }

    fn build_menu(&self, menu: Index, inherited: &[Arc<EntryDirectory>]) -> Option<Category> {
        let mut dirs = inherited.to_vec();
        for &child in self.doc.children(menu) {
            let kind = match self.doc.kind(child) {
                Some(NodeKind::AppDir) => EntryKind::Application,
                Some(NodeKind::DirectoryDir) => EntryKind::Directory,
                _ => continue,
            };
            if let Some(path) = self.doc.content(child) {
                dirs.push(self.source.load_directory(Path::new(path), kind));
            }
        }

        let index = EntryDirectoryList::new(dirs, self.context.preferred_desktop.clone());
        let evaluator = RuleEvaluator::new(self.doc, &index);

        let mut record = CategoryRecord::default();
        let mut included = EntrySet::new();
        let mut excluded = EntrySet::new();

        for &child in self.doc.children(menu) {
            match self.doc.kind(child) {
                Some(NodeKind::Name) => {
                    record.name = self.doc.content(child).map(str::to_string);
                }
                Some(NodeKind::Directory) => {
                    if let Some(found) = self.doc.content(child).and_then(|n| index.directory(n)) {
                        record.directory = Some(found);
                    }
                }
                Some(NodeKind::Include) => included.union(&evaluator.union_of_children(child)),
                Some(NodeKind::Exclude) => excluded.union(&evaluator.union_of_children(child)),
                Some(NodeKind::Menu) => {
                    match self.build_menu(child, index.dirs()) {
                        Some(category) => record.subdirs.push(category),
                        None => debug!(
                            "broken category {:?} pruned",
                            self.doc.menu_name(child).unwrap_or("<unnamed>")
                        ),
                    }
                }
                _ => {}
            }
        }

        included.subtract(&excluded);
        record.entries = included.into_entries();
        record.into_category()
    }
}
