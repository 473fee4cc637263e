//! Domain layer: menu documents, entry sets and the resolution passes
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).
//! Documents and entry directories reach it through the [`DocumentSource`] and
//! [`EntryDirectorySource`] traits.

pub mod category;
pub mod context;
pub mod dedup;
pub mod desktop_file;
pub mod display;
pub mod entry;
pub mod error;
pub mod merge;
pub mod node;
pub mod rules;
pub mod validate;

pub use category::{Category, CategoryBuilder, EntryDirectorySource, Visit, VisitKind, Walk};
pub use context::EvalContext;
pub use dedup::strip_duplicates;
pub use desktop_file::KeyFile;
pub use display::TreeDisplay;
pub use entry::{
    DesktopEntry, Entry, EntryDirectory, EntryDirectoryList, EntryIndex, EntryKind, EntrySet,
};
pub use error::{DomainError, DomainResult};
pub use merge::{DocumentSource, MergeResolver};
pub use node::{MenuDocument, MenuNode, NodeKind};
pub use rules::RuleEvaluator;
pub use validate::{Diagnostic, Severity, ValidationReport};
