//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Desktop application menus: merge menu files, evaluate their rules, query the category tree
#[derive(Parser, Debug)]
#[command(name = "deskmenu")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Preferred desktop for OnlyShowIn/NotShowIn filtering (overrides settings)
    #[arg(long, global = true)]
    pub desktop: Option<String>,

    /// Menu file (default: menu_file from settings)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub menu: Option<PathBuf>,

    /// Config file to use instead of the global one
    #[arg(long = "config", global = true, value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the resolved category tree
    Tree,

    /// Print every category and entry with descriptor fields
    Print {
        /// Show Name
        #[arg(long)]
        name: bool,
        /// Show GenericName
        #[arg(long)]
        generic_name: bool,
        /// Show Comment
        #[arg(long)]
        comment: bool,
    },

    /// List subcategory names
    Subdirs {
        /// Category path, e.g. /Games/Action
        #[arg(default_value = "/")]
        path: String,
    },

    /// List entry descriptor paths of a category
    Entries {
        /// Category path, e.g. /Games/Action
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show the directory descriptor of a category
    Directory {
        /// Category path, e.g. /Games/Action
        #[arg(default_value = "/")]
        path: String,
    },

    /// Check a .desktop or .directory file
    Validate {
        /// Descriptor file
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config (default: deskmenu.toml in the current directory)
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
