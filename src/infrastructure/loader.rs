//! XML menu file loader.
//!
//! ```xml
//! <Menu>
//!   <Name>Applications</Name>
//!   <Directory>apps.directory</Directory>
//!   <AppDir>applications</AppDir>
//!   <MergeFile>extra.menu</MergeFile>
//!   <Include><Category>Game</Category></Include>
//! </Menu>
//! ```

use std::path::Path;
use std::sync::Arc;

use generational_arena::Index;
use roxmltree::{Document, Node, ParsingOptions};
use tracing::{debug, instrument};

use crate::domain::{MenuDocument, NodeKind};
use crate::infrastructure::traits::{FileSystem, MenuLoader};
use crate::infrastructure::{InfraError, InfraResult};

/// Loads menu files through a [`FileSystem`].
pub struct XmlMenuLoader {
    fs: Arc<dyn FileSystem>,
}

impl XmlMenuLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl MenuLoader for XmlMenuLoader {
    #[instrument(level = "debug", skip(self))]
    fn load(&self, path: &Path) -> InfraResult<MenuDocument> {
        let path = self
            .fs
            .canonicalize(path)
            .map_err(|e| InfraError::Canonicalize {
                path: path.to_path_buf(),
                source: e,
            })?;
        let text = self
            .fs
            .read_to_string(&path)
            .map_err(|e| InfraError::io(format!("read menu file {}", path.display()), e))?;
        parse_menu(&text, &path)
    }
}

/// Parse menu markup read from `path`. Relative paths in path-valued elements are resolved
/// against the directory of `path`.
pub fn parse_menu(text: &str, path: &Path) -> InfraResult<MenuDocument> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let xml = Document::parse_with_options(text, options).map_err(|e| InfraError::Xml {
        path: path.to_path_buf(),
        source: e,
    })?;

    let element = xml.root_element();
    if element.tag_name().name() != "Menu" {
        return Err(InfraError::NotAMenu {
            path: path.to_path_buf(),
            found: element.tag_name().name().to_string(),
        });
    }

    let base_dir = path.parent().unwrap_or(Path::new("/"));
    let mut doc = MenuDocument::new();
    let root = doc.root();
    append_element(&mut doc, root, element, base_dir);
    debug!("loaded {} with {} nodes", path.display(), doc.len());
    Ok(doc)
}

fn append_element(
    doc: &mut MenuDocument,
    parent: Index,
    element: Node<'_, '_>,
    base_dir: &Path,
) {
    let tag = element.tag_name().name();
    let kind = NodeKind::from_tag(tag);
    let content = match kind {
        NodeKind::Passthrough => Some(tag.to_string()),
        _ => text_content(element).map(|text| {
            if kind.holds_path() {
                base_dir.join(&text).to_string_lossy().into_owned()
            } else {
                text
            }
        }),
    };

    let idx = doc.append(parent, kind, content);
    for child in element.children().filter(Node::is_element) {
        append_element(doc, idx, child, base_dir);
    }
}

/// Concatenated direct text children, trimmed; `None` when empty.
fn text_content(element: Node<'_, '_>) -> Option<String> {
    let text: String = element
        .children()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect();
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
