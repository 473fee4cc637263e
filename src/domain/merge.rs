//! Merge-directive expansion.
//!
//! Every `<MergeFile>` is replaced in place by the children of the referenced document's
//! top-level `<Menu>` (its `<Name>` excluded). The referenced document is loaded as a private
//! copy and fully resolved before it is spliced in. `<MergeDir>` and `<LegacyDir>` are
//! recognized and dropped without expansion.
//!
//! There is no cycle detection: a document that merges itself, directly or through other
//! files, recurses until the stack is exhausted.

use std::path::Path;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::node::{MenuDocument, NodeKind};

/// Supplies merge-target documents.
pub trait DocumentSource {
    /// Load the document at `path` as a fresh, independently owned tree.
    /// `None` when the file is missing, unreadable or malformed.
    fn load_merge_target(&self, path: &Path) -> Option<MenuDocument>;
}

/// Expands merge directives using a [`DocumentSource`].
pub struct MergeResolver<'a> {
    source: &'a dyn DocumentSource,
}

impl<'a> MergeResolver<'a> {
    pub fn new(source: &'a dyn DocumentSource) -> Self {
        Self { source }
    }

    /// Expand every merge directive of `doc` in place.
    #[instrument(level = "debug", skip_all)]
    pub fn resolve(&self, doc: &mut MenuDocument) {
        let root = doc.root();
        self.resolve_children(doc, root);
    }

    fn resolve_children(&self, doc: &mut MenuDocument, parent: Index) {
        let mut position = 0;
        while let Some(&child) = doc.children(parent).get(position) {
            match doc.kind(child) {
                Some(NodeKind::MergeFile) => {
                    let spliced = self.merge_file(doc, child);
                    doc.remove(child);
                    // spliced nodes come from an already resolved document
                    position += spliced;
                }
                Some(NodeKind::MergeDir) | Some(NodeKind::LegacyDir) => {
                    debug!(
                        "dropping unsupported {} directive {:?}",
                        doc.kind(child).map(|k| k.to_string()).unwrap_or_default(),
                        doc.content(child)
                    );
                    doc.remove(child);
                }
                _ => {
                    self.resolve_children(doc, child);
                    position += 1;
                }
            }
        }
    }

    /// Splice the resolved contents of the file named by `directive` right after it.
    /// Returns the number of nodes inserted.
    fn merge_file(&self, doc: &mut MenuDocument, directive: Index) -> usize {
        let Some(path) = doc.content(directive).map(|p| Path::new(p).to_path_buf()) else {
            debug!("empty <MergeFile> directive dropped");
            return 0;
        };
        debug!("merging file {}", path.display());

        let Some(mut target) = self.source.load_merge_target(&path) else {
            debug!("merge target {} missing or malformed, skipped", path.display());
            return 0;
        };
        self.resolve(&mut target);

        let Some(target_menu) = target.top_menu() else {
            debug!("merge target {} has no <Menu>, skipped", path.display());
            return 0;
        };
        let (Some(parent), Some(at)) = (
            doc.get(directive).and_then(|n| n.parent),
            doc.position(directive),
        ) else {
            return 0;
        };

        let mut inserted = 0;
        for child in target.children(target_menu).to_vec() {
            if target.kind(child) == Some(NodeKind::Name) {
                continue;
            }
            if doc
                .adopt(&mut target, child, parent, at + 1 + inserted)
                .is_some()
            {
                inserted += 1;
            }
        }
        inserted
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    /// In-memory document source keyed by path.
    #[derive(Default)]
    struct MapSource {
        docs: HashMap<PathBuf, MenuDocument>,
    }

    impl DocumentSource for MapSource {
        fn load_merge_target(&self, path: &Path) -> Option<MenuDocument> {
            self.docs.get(path).map(MenuDocument::deep_copy)
        }
    }

    /// Root > Menu > [(kind, content)...]
    fn menu_doc(children: &[(NodeKind, &str)]) -> MenuDocument {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = doc.append(root, NodeKind::Menu, None);
        for (kind, content) in children {
            doc.append(menu, *kind, Some(content.to_string()));
        }
        doc
    }

    fn top_children(doc: &MenuDocument) -> Vec<(NodeKind, String)> {
        let menu = doc.top_menu().unwrap();
        doc.children(menu)
            .iter()
            .map(|&c| {
                (
                    doc.kind(c).unwrap(),
                    doc.content(c).unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn given_merge_file_when_resolving_then_children_are_spliced_in_place() {
        let mut source = MapSource::default();
        source.docs.insert(
            PathBuf::from("/m/other.menu"),
            menu_doc(&[
                (NodeKind::Name, "Other"),
                (NodeKind::AppDir, "/other/apps"),
                (NodeKind::Directory, "other.directory"),
            ]),
        );
        let mut doc = menu_doc(&[
            (NodeKind::Name, "Apps"),
            (NodeKind::MergeFile, "/m/other.menu"),
            (NodeKind::AppDir, "/main/apps"),
        ]);

        MergeResolver::new(&source).resolve(&mut doc);

        assert_eq!(
            top_children(&doc),
            vec![
                (NodeKind::Name, "Apps".to_string()),
                (NodeKind::AppDir, "/other/apps".to_string()),
                (NodeKind::Directory, "other.directory".to_string()),
                (NodeKind::AppDir, "/main/apps".to_string()),
            ]
        );
        assert!(!doc.contains_kind(NodeKind::MergeFile));
    }

    #[test]
    fn given_nested_merge_when_resolving_then_target_is_resolved_first() {
        let mut source = MapSource::default();
        source.docs.insert(
            PathBuf::from("/m/inner.menu"),
            menu_doc(&[(NodeKind::Name, "Inner"), (NodeKind::AppDir, "/inner")]),
        );
        source.docs.insert(
            PathBuf::from("/m/outer.menu"),
            menu_doc(&[
                (NodeKind::Name, "Outer"),
                (NodeKind::MergeFile, "/m/inner.menu"),
                (NodeKind::AppDir, "/outer"),
            ]),
        );
        let mut doc = menu_doc(&[(NodeKind::MergeFile, "/m/outer.menu")]);

        MergeResolver::new(&source).resolve(&mut doc);

        assert_eq!(
            top_children(&doc),
            vec![
                (NodeKind::AppDir, "/inner".to_string()),
                (NodeKind::AppDir, "/outer".to_string()),
            ]
        );
    }

    #[test]
    fn given_missing_merge_file_when_resolving_then_directive_dropped_and_siblings_kept() {
        let source = MapSource::default();
        let mut doc = menu_doc(&[
            (NodeKind::Name, "Apps"),
            (NodeKind::MergeFile, "/nowhere.menu"),
            (NodeKind::AppDir, "/apps"),
        ]);

        MergeResolver::new(&source).resolve(&mut doc);

        assert_eq!(
            top_children(&doc),
            vec![
                (NodeKind::Name, "Apps".to_string()),
                (NodeKind::AppDir, "/apps".to_string()),
            ]
        );
    }

    #[test]
    fn given_merge_dir_and_legacy_dir_when_resolving_then_dropped() {
        let source = MapSource::default();
        let mut doc = menu_doc(&[
            (NodeKind::MergeDir, "/merged"),
            (NodeKind::LegacyDir, "/legacy"),
            (NodeKind::Name, "Apps"),
        ]);

        MergeResolver::new(&source).resolve(&mut doc);

        assert_eq!(top_children(&doc), vec![(NodeKind::Name, "Apps".to_string())]);
        assert!(!doc.contains_kind(NodeKind::MergeDir));
        assert!(!doc.contains_kind(NodeKind::LegacyDir));
    }

    #[test]
    fn given_merge_file_in_submenu_when_resolving_then_expanded_there() {
        let mut source = MapSource::default();
        source.docs.insert(
            PathBuf::from("/m/games.menu"),
            menu_doc(&[(NodeKind::Name, "Ignored"), (NodeKind::Category, "Game")]),
        );
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = doc.append(root, NodeKind::Menu, None);
        let sub = doc.append(menu, NodeKind::Menu, None);
        doc.append(sub, NodeKind::Name, Some("Games".into()));
        doc.append(sub, NodeKind::MergeFile, Some("/m/games.menu".into()));

        MergeResolver::new(&source).resolve(&mut doc);

        let kinds: Vec<NodeKind> = doc.children(sub).iter().filter_map(|&c| doc.kind(c)).collect();
        assert_eq!(kinds, vec![NodeKind::Name, NodeKind::Category]);
        assert_eq!(doc.menu_name(sub), Some("Games"));
    }

    #[test]
    fn given_source_document_when_merging_then_source_is_untouched() {
        let mut source = MapSource::default();
        let target = menu_doc(&[(NodeKind::Name, "T"), (NodeKind::AppDir, "/t")]);
        let before = target.len();
        source.docs.insert(PathBuf::from("/m/t.menu"), target);
        let mut doc = menu_doc(&[(NodeKind::MergeFile, "/m/t.menu")]);

        MergeResolver::new(&source).resolve(&mut doc);

        assert_eq!(source.docs[&PathBuf::from("/m/t.menu")].len(), before);
    }
}
