//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, MenuLoader, EntryDirectorySource)
//! but are themselves concrete structs, not traits.

mod menu;
mod validation;

pub use menu::{MenuService, MenuTree};
pub use validation::ValidationService;
