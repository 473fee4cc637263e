//! Boolean rule evaluation: `<Include>`/`<Exclude>` rule trees to entry sets.

use generational_arena::Index;
use tracing::trace;

use crate::domain::entry::{EntryIndex, EntrySet};
use crate::domain::node::{MenuDocument, NodeKind};

/// Evaluates rule nodes of one document against an entry index.
pub struct RuleEvaluator<'a> {
    doc: &'a MenuDocument,
    index: &'a dyn EntryIndex,
}

impl<'a> RuleEvaluator<'a> {
    pub fn new(doc: &'a MenuDocument, index: &'a dyn EntryIndex) -> Self {
        Self { doc, index }
    }

    /// Entry set matched by a single rule node.
    pub fn evaluate(&self, rule: Index) -> EntrySet {
        let Some(kind) = self.doc.kind(rule) else {
            return EntrySet::new();
        };
        match kind {
            NodeKind::And => {
                let mut result: Option<EntrySet> = None;
                for &child in self.doc.children(rule) {
                    let child_set = self.evaluate(child);
                    let running = match result.take() {
                        None => child_set,
                        Some(mut acc) => {
                            acc.intersection(&child_set);
                            acc
                        }
                    };
                    let empty = running.is_empty();
                    result = Some(running);
                    if empty {
                        trace!("And short-circuits on empty intersection");
                        break;
                    }
                }
                result.unwrap_or_default()
            }
            NodeKind::Or => self.union_of_children(rule),
            NodeKind::Not => {
                let union = self.union_of_children(rule);
                self.index.invert(&union)
            }
            NodeKind::All => self.index.all(),
            NodeKind::Category => match self.doc.content(rule) {
                Some(category) => self.index.by_category(category),
                None => EntrySet::new(),
            },
            NodeKind::Filename => self
                .doc
                .content(rule)
                .and_then(|id| self.index.by_filename(id))
                .into_iter()
                .collect(),
            NodeKind::Root
            | NodeKind::Menu
            | NodeKind::Name
            | NodeKind::Directory
            | NodeKind::AppDir
            | NodeKind::DirectoryDir
            | NodeKind::Include
            | NodeKind::Exclude
            | NodeKind::MergeFile
            | NodeKind::MergeDir
            | NodeKind::LegacyDir
            | NodeKind::Move
            | NodeKind::Passthrough => EntrySet::new(),
        }
    }

    /// Union of the sets of every child of `node`. Used for `<Or>`, `<Not>`, and for the
    /// independent top-level rules of `<Include>`/`<Exclude>`.
    pub fn union_of_children(&self, node: Index) -> EntrySet {
        let mut set = EntrySet::new();
        for &child in self.doc.children(node) {
            set.union(&self.evaluate(child));
        }
        set
    }
}
