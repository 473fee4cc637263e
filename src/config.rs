//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/deskmenu/deskmenu.toml`
//! 3. Environment variables: `DESKMENU_*` prefix
//! 4. Command-line flags (applied by the CLI)
//!
//! Also holds the process-wide preferred desktop, see [`set_preferred_desktop`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::RwLock;

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;

static PREFERRED_DESKTOP: RwLock<Option<String>> = RwLock::new(None);

/// Set the preferred target desktop for every tree built afterwards in this process.
/// `None` disables `OnlyShowIn`/`NotShowIn` filtering.
pub fn set_preferred_desktop(desktop: Option<&str>) {
    let mut guard = PREFERRED_DESKTOP
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = desktop.map(str::to_string);
}

/// Current process-wide preferred desktop.
pub fn preferred_desktop() -> Option<String> {
    PREFERRED_DESKTOP
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Descriptor field shown by `deskmenu print`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum PrintField {
    Name,
    GenericName,
    Comment,
}

impl PrintField {
    /// Descriptor key holding this field.
    pub fn key(self) -> &'static str {
        match self {
            PrintField::Name => "Name",
            PrintField::GenericName => "GenericName",
            PrintField::Comment => "Comment",
        }
    }
}

impl fmt::Display for PrintField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintField::Name => write!(f, "name"),
            PrintField::GenericName => write!(f, "generic-name"),
            PrintField::Comment => write!(f, "comment"),
        }
    }
}

impl FromStr for PrintField {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(PrintField::Name),
            "generic-name" => Ok(PrintField::GenericName),
            "comment" => Ok(PrintField::Comment),
            other => Err(ApplicationError::Config {
                message: format!(
                    "unknown print field '{}' (expected name, generic-name or comment)",
                    other
                ),
            }),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub preferred_desktop: Option<String>,
    pub menu_file: Option<PathBuf>,
    pub print_fields: Option<Vec<PrintField>>,
}

/// Unified configuration for deskmenu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Desktop used for `OnlyShowIn`/`NotShowIn` filtering; unset shows everything
    pub preferred_desktop: Option<String>,
    /// Menu file used when a command does not name one
    pub menu_file: Option<PathBuf>,
    /// Fields shown by `deskmenu print`
    pub print_fields: Vec<PrintField>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preferred_desktop: None,
            menu_file: None,
            print_fields: vec![PrintField::Name],
        }
    }
}

/// Get the XDG config directory for deskmenu.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "deskmenu").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("deskmenu.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(menu_file) = &self.menu_file {
            let raw = menu_file.to_string_lossy();
            let expanded = shellexpand::full(raw.as_ref())
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| raw.clone().into_owned());
            self.menu_file = Some(PathBuf::from(expanded));
        }
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            preferred_desktop: overlay
                .preferred_desktop
                .clone()
                .or_else(|| self.preferred_desktop.clone()),
            menu_file: overlay
                .menu_file
                .clone()
                .or_else(|| self.menu_file.clone()),
            print_fields: overlay
                .print_fields
                .clone()
                .unwrap_or_else(|| self.print_fields.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `config_file` - Config file to use instead of the global one
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. `config_file`, or the global config `$XDG_CONFIG_HOME/deskmenu/deskmenu.toml`
    /// 3. Environment variables: `DESKMENU_*` prefix
    pub fn load(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        let file = config_file
            .map(Path::to_path_buf)
            .or_else(global_config_path);
        if let Some(path) = file {
            if path.exists() {
                let raw = load_raw_settings(&path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply DESKMENU_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("DESKMENU")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("print_fields")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("preferred_desktop") {
            settings.preferred_desktop = Some(val);
        }
        if let Ok(val) = config.get_string("menu_file") {
            settings.menu_file = Some(PathBuf::from(val));
        }
        if let Ok(val) = config.get::<Vec<String>>("print_fields") {
            settings.print_fields = val
                .iter()
                .map(|s| s.parse())
                .collect::<Result<Vec<PrintField>, _>>()?;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# deskmenu configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/deskmenu/deskmenu.toml
#   Env:    DESKMENU_* environment variables (explicit overrides)
#   Flags:  --desktop on the command line

# Desktop used for OnlyShowIn/NotShowIn filtering (unset shows everything)
# preferred_desktop = "GNOME"

# Menu file used when a command does not name one
# menu_file = "/etc/xdg/menus/applications.menu"

# Fields shown by `deskmenu print`: name, generic-name, comment
# print_fields = ["name"]
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
