//! Duplicate-declaration elimination over a merge-resolved document.
//!
//! Scopes are the document root and every `<Menu>` body. Within a scope:
//! - `<AppDir>`, `<DirectoryDir>` and `<Directory>` siblings with equal `(kind, content)`
//!   collapse to the occurrence declared last;
//! - `<Menu>` siblings with equal names coalesce into the earliest one. The children of each
//!   later duplicate are moved, in document order, to the front of the survivor.
//!
//! `<Move>` directives are left in place and never applied.

use std::collections::{HashMap, HashSet};

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::node::{MenuDocument, NodeKind};

/// Normalize `doc` in place. Running it twice yields the same tree as running it once.
#[instrument(level = "debug", skip_all)]
pub fn strip_duplicates(doc: &mut MenuDocument) {
    let root = doc.root();
    strip_scope(doc, root);
}

fn strip_scope(doc: &mut MenuDocument, scope: Index) {
    strip_simple(doc, scope);
    coalesce_menus(doc, scope);

    let menus: Vec<Index> = doc
        .children(scope)
        .iter()
        .copied()
        .filter(|&c| doc.kind(c) == Some(NodeKind::Menu))
        .collect();
    for menu in menus {
        strip_scope(doc, menu);
    }
}

fn strip_simple(doc: &mut MenuDocument, scope: Index) {
    let mut seen: HashSet<(NodeKind, Option<String>)> = HashSet::new();
    let mut doomed = Vec::new();

    for &child in doc.children(scope).iter().rev() {
        let Some(node) = doc.get(child) else { continue };
        if !matches!(
            node.kind,
            NodeKind::AppDir | NodeKind::DirectoryDir | NodeKind::Directory
        ) {
            continue;
        }
        if !seen.insert((node.kind, node.content.clone())) {
            doomed.push(child);
        }
    }

    for child in doomed {
        debug!(
            "dropping duplicate {} {:?}",
            doc.kind(child).map(|k| k.to_string()).unwrap_or_default(),
            doc.content(child)
        );
        doc.remove(child);
    }
}

fn coalesce_menus(doc: &mut MenuDocument, scope: Index) {
    let mut survivors: HashMap<String, Index> = HashMap::new();
    let menus: Vec<Index> = doc
        .children(scope)
        .iter()
        .copied()
        .filter(|&c| doc.kind(c) == Some(NodeKind::Menu))
        .collect();

    for menu in menus {
        let Some(name) = doc.menu_name(menu).map(str::to_string) else {
            continue;
        };
        match survivors.get(&name) {
            Some(&survivor) => {
                debug!("coalescing duplicate menu '{}'", name);
                doc.move_children_to_front(menu, survivor);
                doc.remove(menu);
            }
            None => {
                survivors.insert(name, menu);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_menu(doc: &mut MenuDocument, parent: Index, name: &str) -> Index {
        let menu = doc.append(parent, NodeKind::Menu, None);
        doc.append(menu, NodeKind::Name, Some(name.to_string()));
        menu
    }

    fn shape(doc: &MenuDocument, idx: Index) -> Vec<(NodeKind, Option<String>)> {
        doc.children(idx)
            .iter()
            .map(|&c| (doc.kind(c).unwrap(), doc.content(c).map(str::to_string)))
            .collect()
    }

    fn dump(doc: &MenuDocument) -> Vec<(NodeKind, Option<String>)> {
        doc.iter()
            .map(|(_, n)| (n.kind, n.content.clone()))
            .collect()
    }

    #[test]
    fn given_repeated_app_dirs_when_stripping_then_last_occurrence_survives() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = add_menu(&mut doc, root, "Apps");
        doc.append(menu, NodeKind::AppDir, Some("/a".into()));
        doc.append(menu, NodeKind::AppDir, Some("/b".into()));
        doc.append(menu, NodeKind::AppDir, Some("/a".into()));

        strip_duplicates(&mut doc);

        assert_eq!(
            shape(&doc, menu),
            vec![
                (NodeKind::Name, Some("Apps".into())),
                (NodeKind::AppDir, Some("/b".into())),
                (NodeKind::AppDir, Some("/a".into())),
            ]
        );
    }

    #[test]
    fn given_same_content_with_different_kinds_when_stripping_then_both_kept() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = add_menu(&mut doc, root, "Apps");
        doc.append(menu, NodeKind::AppDir, Some("/x".into()));
        doc.append(menu, NodeKind::DirectoryDir, Some("/x".into()));

        strip_duplicates(&mut doc);

        assert_eq!(doc.children(menu).len(), 3);
    }

    #[test]
    fn given_three_same_named_menus_when_coalescing_then_children_are_prepended_in_order() {
        // Arrange
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let top = add_menu(&mut doc, root, "Apps");
        let a = add_menu(&mut doc, top, "Games");
        doc.append(a, NodeKind::Category, Some("A".into()));
        let b = add_menu(&mut doc, top, "Games");
        doc.append(b, NodeKind::Category, Some("B".into()));
        let c = add_menu(&mut doc, top, "Games");
        doc.append(c, NodeKind::Category, Some("C".into()));

        // Act
        strip_duplicates(&mut doc);

        // Assert
        let menus: Vec<Index> = doc
            .children(top)
            .iter()
            .copied()
            .filter(|&m| doc.kind(m) == Some(NodeKind::Menu))
            .collect();
        assert_eq!(menus, vec![a]);
        let categories: Vec<Option<String>> = shape(&doc, a)
            .into_iter()
            .filter(|(k, _)| *k == NodeKind::Category)
            .map(|(_, c)| c)
            .collect();
        assert_eq!(
            categories,
            vec![Some("C".into()), Some("B".into()), Some("A".into())]
        );
        assert!(doc.get(b).is_none());
        assert!(doc.get(c).is_none());
    }

    #[test]
    fn given_coalesced_menus_when_stripping_then_merged_body_is_deduplicated() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let top = add_menu(&mut doc, root, "Apps");
        let first = add_menu(&mut doc, top, "Office");
        doc.append(first, NodeKind::Directory, Some("office.directory".into()));
        let second = add_menu(&mut doc, top, "Office");
        doc.append(second, NodeKind::Directory, Some("office.directory".into()));

        strip_duplicates(&mut doc);

        let directories = shape(&doc, first)
            .into_iter()
            .filter(|(k, _)| *k == NodeKind::Directory)
            .count();
        assert_eq!(directories, 1);
        // both Name children remain, the name is unchanged
        assert_eq!(doc.menu_name(first), Some("Office"));
    }

    #[test]
    fn given_unnamed_menus_when_coalescing_then_never_collide() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let top = add_menu(&mut doc, root, "Apps");
        doc.append(top, NodeKind::Menu, None);
        doc.append(top, NodeKind::Menu, None);

        strip_duplicates(&mut doc);

        assert_eq!(doc.children(top).len(), 3);
    }

    #[test]
    fn given_move_directive_when_stripping_then_left_untouched() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let top = add_menu(&mut doc, root, "Apps");
        doc.append(top, NodeKind::Move, None);
        doc.append(top, NodeKind::Move, None);

        strip_duplicates(&mut doc);

        assert_eq!(doc.children(top).len(), 3);
    }

    #[test]
    fn given_normalized_document_when_stripping_again_then_unchanged() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let top = add_menu(&mut doc, root, "Apps");
        doc.append(top, NodeKind::AppDir, Some("/a".into()));
        doc.append(top, NodeKind::AppDir, Some("/a".into()));
        let g1 = add_menu(&mut doc, top, "Games");
        doc.append(g1, NodeKind::DirectoryDir, Some("/d".into()));
        let g2 = add_menu(&mut doc, top, "Games");
        doc.append(g2, NodeKind::DirectoryDir, Some("/d".into()));
        strip_duplicates(&mut doc);
        let once = dump(&doc);

        strip_duplicates(&mut doc);

        assert_eq!(dump(&doc), once);
    }
}
