use termtree::Tree;
use tracing::instrument;

use crate::domain::category::Category;

/// Conversion of a category tree into a printable `termtree`.
pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for Category {
    #[instrument(level = "trace", skip(self), fields(name = %self.name))]
    fn to_tree_string(&self) -> Tree<String> {
        // Subcategories first, then the entries by desktop-file id
        let leaves = self
            .subdirs
            .iter()
            .map(|c| c.to_tree_string())
            .chain(self.entries.iter().map(|e| Tree::new(e.id.clone())));

        Tree::new(format!("{}/", self.name)).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entry::DesktopEntry;

    fn category(name: &str, entries: &[&str], subdirs: Vec<Category>) -> Category {
        Category {
            name: name.to_string(),
            directory: Arc::new(DesktopEntry::new(
                format!("/dirs/{}.directory", name),
                format!("{}.directory", name),
            )),
            entries: entries
                .iter()
                .map(|id| Arc::new(DesktopEntry::new(format!("/apps/{}", id), *id)))
                .collect(),
            subdirs,
        }
    }

    #[test]
    fn given_category_tree_when_rendering_then_subdirs_precede_entries() {
        let root = category(
            "Applications",
            &["top.desktop"],
            vec![category("Games", &["a.desktop"], vec![])],
        );

        let rendered = root.to_tree_string().to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Applications/");
        assert!(lines[1].ends_with("Games/"));
        assert!(lines[2].ends_with("a.desktop"));
        assert!(lines[3].ends_with("top.desktop"));
    }
}
