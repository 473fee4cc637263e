//! Arena-backed menu document tree.
//!
//! A [`MenuDocument`] owns every node of one menu definition. Nodes are addressed by
//! generational indices, so unlinking a subtree invalidates its indices instead of leaving
//! dangling references. Moving a subtree between documents goes through [`MenuDocument::adopt`],
//! which takes the nodes out of the source arena: a node is only ever owned by one document.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

/// Syntactic kind of a menu document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Root,
    Menu,
    Name,
    Directory,
    AppDir,
    DirectoryDir,
    Include,
    Exclude,
    And,
    Or,
    Not,
    All,
    Category,
    Filename,
    MergeFile,
    MergeDir,
    LegacyDir,
    Move,
    Passthrough,
}

impl NodeKind {
    /// Map a markup element name to a node kind. Unknown elements become `Passthrough`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Menu" => NodeKind::Menu,
            "Name" => NodeKind::Name,
            "Directory" => NodeKind::Directory,
            "AppDir" => NodeKind::AppDir,
            "DirectoryDir" => NodeKind::DirectoryDir,
            "Include" => NodeKind::Include,
            "Exclude" => NodeKind::Exclude,
            "And" => NodeKind::And,
            "Or" => NodeKind::Or,
            "Not" => NodeKind::Not,
            "All" => NodeKind::All,
            "Category" => NodeKind::Category,
            "Filename" => NodeKind::Filename,
            "MergeFile" => NodeKind::MergeFile,
            "MergeDir" => NodeKind::MergeDir,
            "LegacyDir" => NodeKind::LegacyDir,
            "Move" => NodeKind::Move,
            _ => NodeKind::Passthrough,
        }
    }

    /// Whether the text content of this kind names a filesystem path.
    pub fn holds_path(self) -> bool {
        matches!(
            self,
            NodeKind::AppDir
                | NodeKind::DirectoryDir
                | NodeKind::MergeFile
                | NodeKind::MergeDir
                | NodeKind::LegacyDir
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One node of a menu document.
#[derive(Debug, Clone)]
pub struct MenuNode {
    pub kind: NodeKind,
    /// Trimmed text content; `None` when the element had no text
    pub content: Option<String>,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in declaration order
    pub children: Vec<Index>,
}

/// A menu definition held in an arena.
///
/// `Clone` is a deep copy: the clone shares no nodes with the original.
#[derive(Debug, Clone)]
pub struct MenuDocument {
    arena: Arena<MenuNode>,
    root: Index,
}

impl Default for MenuDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuDocument {
    /// Create a document holding only a `Root` node.
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(MenuNode {
            kind: NodeKind::Root,
            content: None,
            parent: None,
            children: Vec::new(),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.len() <= 1
    }

    /// Independent copy of the whole document.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    pub fn get(&self, idx: Index) -> Option<&MenuNode> {
        self.arena.get(idx)
    }

    pub fn kind(&self, idx: Index) -> Option<NodeKind> {
        self.arena.get(idx).map(|n| n.kind)
    }

    pub fn content(&self, idx: Index) -> Option<&str> {
        self.arena.get(idx).and_then(|n| n.content.as_deref())
    }

    /// Children of `idx` in declaration order; empty for unknown indices.
    pub fn children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `idx` among its siblings.
    pub fn position(&self, idx: Index) -> Option<usize> {
        let parent = self.arena.get(idx)?.parent?;
        self.children(parent).iter().position(|&c| c == idx)
    }

    /// First child of `idx` with the given kind.
    pub fn find_child(&self, idx: Index, kind: NodeKind) -> Option<Index> {
        self.children(idx)
            .iter()
            .copied()
            .find(|&c| self.kind(c) == Some(kind))
    }

    /// The document's top-level `<Menu>`.
    pub fn top_menu(&self) -> Option<Index> {
        self.find_child(self.root, NodeKind::Menu)
    }

    /// Name of a `<Menu>` node: the content of its last `<Name>` child.
    pub fn menu_name(&self, menu: Index) -> Option<&str> {
        self.children(menu)
            .iter()
            .rev()
            .find(|&&c| self.kind(c) == Some(NodeKind::Name))
            .and_then(|&c| self.content(c))
    }

    /// Append a new node as the last child of `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn append(&mut self, parent: Index, kind: NodeKind, content: Option<String>) -> Index {
        let idx = self.arena.insert(MenuNode {
            kind,
            content,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(p) = self.arena.get_mut(parent) {
            p.children.push(idx);
        }
        idx
    }

    /// Unlink `idx` from its parent and free it together with its subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, idx: Index) {
        if idx == self.root {
            return;
        }
        self.detach(idx);
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children);
            }
        }
    }

    /// Move all children of `from` to the front of `to`'s children, keeping their order.
    /// `from` is left empty but stays in the tree.
    #[instrument(level = "trace", skip(self))]
    pub fn move_children_to_front(&mut self, from: Index, to: Index) {
        if from == to {
            return;
        }
        let moved = match self.arena.get_mut(from) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for &child in &moved {
            if let Some(node) = self.arena.get_mut(child) {
                node.parent = Some(to);
            }
        }
        if let Some(target) = self.arena.get_mut(to) {
            target.children.splice(0..0, moved);
        }
    }

    /// Move the subtree rooted at `node` out of `other` and insert it as child number
    /// `position` of `parent` in this document. Returns the subtree's new index.
    #[instrument(level = "trace", skip(self, other))]
    pub fn adopt(
        &mut self,
        other: &mut MenuDocument,
        node: Index,
        parent: Index,
        position: usize,
    ) -> Option<Index> {
        self.arena.get(parent)?;
        other.detach(node);
        let new_idx = self.transplant(other, node, parent)?;
        if let Some(p) = self.arena.get_mut(parent) {
            let at = position.min(p.children.len());
            p.children.insert(at, new_idx);
        }
        Some(new_idx)
    }

    fn transplant(&mut self, other: &mut MenuDocument, node: Index, parent: Index) -> Option<Index> {
        let MenuNode {
            kind,
            content,
            children,
            ..
        } = other.arena.remove(node)?;
        let idx = self.arena.insert(MenuNode {
            kind,
            content,
            parent: Some(parent),
            children: Vec::with_capacity(children.len()),
        });
        for child in children {
            if let Some(moved) = self.transplant(other, child, idx) {
                if let Some(n) = self.arena.get_mut(idx) {
                    n.children.push(moved);
                }
            }
        }
        Some(idx)
    }

    fn detach(&mut self, idx: Index) {
        let parent = match self.arena.get_mut(idx) {
            Some(node) => node.parent.take(),
            None => return,
        };
        if let Some(p) = parent.and_then(|p| self.arena.get_mut(p)) {
            p.children.retain(|&c| c != idx);
        }
    }

    /// Pre-order iterator over all nodes, starting at the root.
    pub fn iter(&self) -> NodeIterator<'_> {
        NodeIterator {
            doc: self,
            stack: vec![self.root],
        }
    }

    /// Whether any node of the given kind is still present.
    pub fn contains_kind(&self, kind: NodeKind) -> bool {
        self.iter().any(|(_, n)| n.kind == kind)
    }
}

pub struct NodeIterator<'a> {
    doc: &'a MenuDocument,
    stack: Vec<Index>,
}

impl<'a> Iterator for NodeIterator<'a> {
    type Item = (Index, &'a MenuNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.doc.get(current) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev());
                return Some((current, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_with_children(doc: &mut MenuDocument, names: &[&str]) -> Index {
        let root = doc.root();
        let menu = doc.append(root, NodeKind::Menu, None);
        for name in names {
            doc.append(menu, NodeKind::Category, Some(name.to_string()));
        }
        menu
    }

    fn contents(doc: &MenuDocument, idx: Index) -> Vec<String> {
        doc.children(idx)
            .iter()
            .filter_map(|&c| doc.content(c).map(str::to_string))
            .collect()
    }

    #[test]
    fn given_removed_subtree_when_accessing_then_indices_are_dead() {
        let mut doc = MenuDocument::new();
        let menu = menu_with_children(&mut doc, &["A", "B"]);
        let child = doc.children(menu)[0];

        doc.remove(menu);

        assert!(doc.get(menu).is_none());
        assert!(doc.get(child).is_none());
        assert_eq!(doc.len(), 1);
        assert!(doc.children(doc.root()).is_empty());
    }

    #[test]
    fn given_two_menus_when_moving_children_to_front_then_order_is_preserved() {
        let mut doc = MenuDocument::new();
        let first = menu_with_children(&mut doc, &["A", "B"]);
        let second = menu_with_children(&mut doc, &["C", "D"]);

        doc.move_children_to_front(second, first);

        assert_eq!(contents(&doc, first), vec!["C", "D", "A", "B"]);
        assert!(doc.children(second).is_empty());
        let moved = doc.children(first)[0];
        assert_eq!(doc.get(moved).and_then(|n| n.parent), Some(first));
    }

    #[test]
    fn given_foreign_subtree_when_adopting_then_source_loses_it() {
        let mut target = MenuDocument::new();
        let anchor = menu_with_children(&mut target, &["X", "Y"]);
        let mut source = MenuDocument::new();
        let donor = menu_with_children(&mut source, &["A"]);

        let adopted = target.adopt(&mut source, donor, anchor, 1).unwrap();

        assert_eq!(source.len(), 1);
        assert_eq!(target.children(anchor)[1], adopted);
        assert_eq!(contents(&target, adopted), vec!["A"]);
        assert_eq!(target.position(adopted), Some(1));
    }

    #[test]
    fn given_document_when_deep_copied_then_copies_are_independent() {
        let mut doc = MenuDocument::new();
        let menu = menu_with_children(&mut doc, &["A"]);
        let copy = doc.deep_copy();

        doc.remove(menu);

        assert_eq!(copy.len(), 3);
        assert_eq!(contents(&copy, menu), vec!["A"]);
    }

    #[test]
    fn given_menu_with_repeated_names_when_reading_name_then_last_wins() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = doc.append(root, NodeKind::Menu, None);
        doc.append(menu, NodeKind::Name, Some("First".into()));
        doc.append(menu, NodeKind::Name, Some("Second".into()));

        assert_eq!(doc.menu_name(menu), Some("Second"));
    }

    #[test]
    fn given_nested_document_when_iterating_then_visits_pre_order() {
        let mut doc = MenuDocument::new();
        let root = doc.root();
        let menu = doc.append(root, NodeKind::Menu, None);
        let include = doc.append(menu, NodeKind::Include, None);
        doc.append(include, NodeKind::All, None);
        doc.append(menu, NodeKind::Name, Some("Apps".into()));

        let kinds: Vec<NodeKind> = doc.iter().map(|(_, n)| n.kind).collect();

        assert_eq!(
            kinds,
            vec![
                NodeKind::Root,
                NodeKind::Menu,
                NodeKind::Include,
                NodeKind::All,
                NodeKind::Name
            ]
        );
    }

    #[test]
    fn given_unknown_tag_when_mapping_then_passthrough() {
        assert_eq!(NodeKind::from_tag("Layout"), NodeKind::Passthrough);
        assert_eq!(NodeKind::from_tag("MergeFile"), NodeKind::MergeFile);
        assert!(NodeKind::MergeFile.holds_path());
        assert!(!NodeKind::Name.holds_path());
    }
}
