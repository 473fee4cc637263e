//! deskmenu: desktop application menu resolution.
//!
//! A menu file is loaded into an arena-backed document, its merge directives are expanded,
//! duplicate declarations are removed, and the category tree is built on first query from
//! the include/exclude rules evaluated against scanned `.desktop` descriptors.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
