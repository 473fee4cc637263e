//! Descriptor directory scanner.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

use crate::domain::{DesktopEntry, EntryDirectory, EntryDirectorySource, EntryKind, KeyFile};
use crate::infrastructure::traits::FileSystem;

/// Scans `.desktop`/`.directory` files below a directory, caching each scan per
/// `(path, kind)` for the lifetime of the scanner.
pub struct FsEntryScanner {
    fs: Arc<dyn FileSystem>,
    cache: Mutex<HashMap<(PathBuf, EntryKind), Arc<EntryDirectory>>>,
}

impl FsEntryScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[instrument(level = "debug", skip(self))]
    fn scan(&self, root: &Path, kind: EntryKind) -> EntryDirectory {
        let mut dir = EntryDirectory::new(root, kind);
        if !self.fs.is_dir(root) {
            debug!("{} is not a directory, nothing to scan", root.display());
            return dir;
        }

        let files = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some(kind.extension()));

        for file in files {
            let path = file.path();
            match self.read_entry(root, path) {
                Some(entry) => {
                    trace!("found {}", entry.id);
                    dir.insert(entry);
                }
                None => debug!("skipping unreadable descriptor {}", path.display()),
            }
        }
        debug!("{} descriptors below {}", dir.len(), root.display());
        dir
    }

    fn read_entry(&self, root: &Path, path: &Path) -> Option<DesktopEntry> {
        let bytes = self.fs.read(path).ok()?;
        let file = KeyFile::parse(&bytes).ok()?;
        file.main_section()?;
        Some(DesktopEntry::from_key_file(
            path.to_path_buf(),
            desktop_file_id(root, path)?,
            &file,
        ))
    }
}

/// Path of `file` relative to `root`, `/`-separated.
fn desktop_file_id(root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

impl EntryDirectorySource for FsEntryScanner {
    fn load_directory(&self, path: &Path, kind: EntryKind) -> Arc<EntryDirectory> {
        let key = (path.to_path_buf(), kind);
        if let Some(hit) = self.cache.lock().ok().and_then(|c| c.get(&key).cloned()) {
            trace!("cache hit for {}", path.display());
            return hit;
        }

        let dir = Arc::new(self.scan(path, kind));
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, Arc::clone(&dir));
        }
        dir
    }
}
