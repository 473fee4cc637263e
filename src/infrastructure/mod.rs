//! Infrastructure layer: I/O implementations and DI container
//!
//! This layer implements the document and entry-directory seams on top of the filesystem
//! and wires up services.

pub mod di;
pub mod error;
pub mod loader;
pub mod scanner;
pub mod traits;

pub use error::{InfraError, InfraResult};
pub use loader::XmlMenuLoader;
pub use scanner::FsEntryScanner;
