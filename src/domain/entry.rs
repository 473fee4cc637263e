//! Application entries, entry sets and scanned entry directories.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::desktop_file::KeyFile;

/// Kind of descriptor an entry directory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `.desktop` files below an `<AppDir>`
    Application,
    /// `.directory` files below a `<DirectoryDir>`
    Directory,
}

impl EntryKind {
    pub fn extension(self) -> &'static str {
        match self {
            EntryKind::Application => "desktop",
            EntryKind::Directory => "directory",
        }
    }
}

/// An on-disk descriptor, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntry {
    /// Absolute path of the descriptor file
    pub path: PathBuf,
    /// Path relative to the directory it was scanned from, `/`-separated
    pub id: String,
    pub categories: Vec<String>,
    pub only_show_in: Option<Vec<String>>,
    pub not_show_in: Vec<String>,
    pub hidden: bool,
}

impl DesktopEntry {
    /// Entry with no metadata, visible everywhere.
    pub fn new(path: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            categories: Vec::new(),
            only_show_in: None,
            not_show_in: Vec::new(),
            hidden: false,
        }
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Build from a parsed descriptor.
    pub fn from_key_file(path: PathBuf, id: String, file: &KeyFile) -> Self {
        Self {
            path,
            id,
            categories: file.list("Categories").unwrap_or_default(),
            only_show_in: file.list("OnlyShowIn"),
            not_show_in: file.list("NotShowIn").unwrap_or_default(),
            hidden: file.boolean("Hidden"),
        }
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Visibility under an optional preferred desktop. Hidden entries are never visible.
    pub fn is_visible_in(&self, desktop: Option<&str>) -> bool {
        if self.hidden {
            return false;
        }
        match desktop {
            None => true,
            Some(d) => {
                let allowed = self
                    .only_show_in
                    .as_ref()
                    .map(|list| list.iter().any(|x| x == d))
                    .unwrap_or(true);
                allowed && !self.not_show_in.iter().any(|x| x == d)
            }
        }
    }
}

/// Shared reference to an entry; sets and categories never copy the descriptor.
pub type Entry = Arc<DesktopEntry>;

/// Set of entries, unique by path and iterated in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    entries: BTreeMap<PathBuf, Entry>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.insert(entry.path.clone(), entry);
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn union(&mut self, other: &EntrySet) {
        for (path, entry) in &other.entries {
            self.entries
                .entry(path.clone())
                .or_insert_with(|| Arc::clone(entry));
        }
    }

    pub fn intersection(&mut self, other: &EntrySet) {
        self.entries.retain(|path, _| other.entries.contains_key(path));
    }

    pub fn subtract(&mut self, other: &EntrySet) {
        self.entries.retain(|path, _| !other.entries.contains_key(path));
    }

    /// `universe - self`.
    pub fn inverted(&self, universe: &EntrySet) -> EntrySet {
        let mut result = universe.clone();
        result.subtract(self);
        result
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.keys().cloned().collect()
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries.into_values().collect()
    }
}

impl FromIterator<Entry> for EntrySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut set = EntrySet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

/// All descriptors of one kind found below one directory, keyed by id.
#[derive(Debug, Clone)]
pub struct EntryDirectory {
    pub path: PathBuf,
    pub kind: EntryKind,
    entries: BTreeMap<String, Entry>,
}

impl EntryDirectory {
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind) -> Self {
        Self {
            path: path.into(),
            kind,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, entry: DesktopEntry) {
        self.entries.insert(entry.id.clone(), Arc::new(entry));
    }

    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }
}

/// Queries the rule evaluator and tree builder ask of the entries in scope.
pub trait EntryIndex {
    /// The entry universe.
    fn all(&self) -> EntrySet;

    /// The entry with exactly this desktop-file id.
    fn by_filename(&self, id: &str) -> Option<Entry>;

    /// Entries tagged with `category`.
    fn by_category(&self, category: &str) -> EntrySet;

    /// Complement of `set` against the universe.
    fn invert(&self, set: &EntrySet) -> EntrySet {
        set.inverted(&self.all())
    }

    /// Directory-metadata descriptor with this id.
    fn directory(&self, name: &str) -> Option<Entry>;
}

/// Ordered list of scanned directories, filtered by the preferred desktop.
///
/// When several directories provide the same id, the one listed last wins.
#[derive(Debug, Clone, Default)]
pub struct EntryDirectoryList {
    dirs: Vec<Arc<EntryDirectory>>,
    desktop: Option<String>,
}

impl EntryDirectoryList {
    pub fn new(dirs: Vec<Arc<EntryDirectory>>, desktop: Option<String>) -> Self {
        Self { dirs, desktop }
    }

    pub fn dirs(&self) -> &[Arc<EntryDirectory>] {
        &self.dirs
    }

    // An id shadowed by a later directory stays shadowed even when the later entry is hidden.
    fn visible(&self, kind: EntryKind) -> Vec<&Entry> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for dir in self.dirs.iter().rev().filter(|d| d.kind == kind) {
            for entry in dir.iter() {
                if seen.insert(entry.id.as_str()) && entry.is_visible_in(self.desktop.as_deref()) {
                    out.push(entry);
                }
            }
        }
        out
    }

    fn lookup(&self, kind: EntryKind, id: &str) -> Option<Entry> {
        self.dirs
            .iter()
            .rev()
            .filter(|d| d.kind == kind)
            .find_map(|d| d.get(id))
            .filter(|e| e.is_visible_in(self.desktop.as_deref()))
            .cloned()
    }
}

impl EntryIndex for EntryDirectoryList {
    fn all(&self) -> EntrySet {
        self.visible(EntryKind::Application)
            .into_iter()
            .cloned()
            .collect()
    }

    fn by_filename(&self, id: &str) -> Option<Entry> {
        self.lookup(EntryKind::Application, id)
    }

    fn by_category(&self, category: &str) -> EntrySet {
        self.visible(EntryKind::Application)
            .into_iter()
            .filter(|e| e.has_category(category))
            .cloned()
            .collect()
    }

    fn directory(&self, name: &str) -> Option<Entry> {
        self.lookup(EntryKind::Directory, name)
    }
}
