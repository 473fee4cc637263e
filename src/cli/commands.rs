//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::MenuTree;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{self, PrintField, Settings};
use crate::domain::{EvalContext, Severity, TreeDisplay};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command line.
pub fn execute(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `deskmenu --help`".into(),
        ));
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let mut settings = Settings::load(cli.config_file.as_deref())?;
    if let Some(desktop) = &cli.desktop {
        settings.preferred_desktop = Some(desktop.clone());
    }
    if let Some(menu) = &cli.menu {
        settings.menu_file = Some(menu.clone());
    }
    config::set_preferred_desktop(settings.preferred_desktop.as_deref());
    debug!("effective settings: {:?}", settings);

    let container = ServiceContainer::new(settings);
    match command {
        Commands::Tree => cmd_tree(&container),
        Commands::Print {
            name,
            generic_name,
            comment,
        } => {
            let flagged: Vec<PrintField> = [
                (*name, PrintField::Name),
                (*generic_name, PrintField::GenericName),
                (*comment, PrintField::Comment),
            ]
            .into_iter()
            .filter_map(|(on, field)| on.then_some(field))
            .collect();
            let fields = if flagged.is_empty() {
                container.settings.print_fields.clone()
            } else {
                flagged
            };
            cmd_print(&container, &fields)
        }
        Commands::Subdirs { path } => cmd_subdirs(&container, path),
        Commands::Entries { path } => cmd_entries(&container, path),
        Commands::Directory { path } => cmd_directory(&container, path),
        Commands::Validate { file } => cmd_validate(&container, file),
        Commands::Config { command } => cmd_config(&container, command, cli.config_file.as_deref()),
        Commands::Completion { .. } => Ok(()),
    }
}

fn menu_file(container: &ServiceContainer) -> CliResult<&Path> {
    container.settings.menu_file.as_deref().ok_or_else(|| {
        CliError::Usage("no menu file: pass --menu or set menu_file in the config".into())
    })
}

fn open_menu(container: &ServiceContainer) -> CliResult<Arc<MenuTree>> {
    let path = menu_file(container)?;
    Ok(container
        .menu_service
        .open(path, EvalContext::from_process())?)
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer) -> CliResult<()> {
    let tree = open_menu(container)?;
    match tree.root() {
        Some(root) => output::info(&root.to_tree_string()),
        None => output::warning("menu has no displayable root category"),
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_print(container: &ServiceContainer, fields: &[PrintField]) -> CliResult<()> {
    let tree = open_menu(container)?;
    let keys: Vec<&str> = fields.iter().map(|f| f.key()).collect();

    for visit in tree.walk("/") {
        match container.menu_service.read_fields(visit.path, &keys, None) {
            Ok(values) => output::info(&format_print_line(visit.depth, &keys, values)),
            Err(e) => output::warning(&format!(
                "failed to load desktop file \"{}\": {}",
                visit.path.display(),
                e
            )),
        }
    }
    Ok(())
}

/// One `print` line: indentation by depth, then the fields separated by ` : `.
fn format_print_line(depth: usize, keys: &[&str], values: Vec<Option<String>>) -> String {
    let fields = keys
        .iter()
        .zip(values)
        .map(|(key, value)| value.unwrap_or_else(|| format!("<missing {}>", key)))
        .join(" : ");
    format!("{}{}", " ".repeat(depth), fields)
}

#[instrument(skip(container))]
fn cmd_subdirs(container: &ServiceContainer, path: &str) -> CliResult<()> {
    let tree = open_menu(container)?;
    for name in tree.list_subdirs(path) {
        output::info(&name);
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_entries(container: &ServiceContainer, path: &str) -> CliResult<()> {
    let tree = open_menu(container)?;
    for entry in tree.list_entries(path) {
        output::info(&entry.display());
    }
    Ok(())
}

#[instrument(skip(container))]
fn cmd_directory(container: &ServiceContainer, path: &str) -> CliResult<()> {
    let tree = open_menu(container)?;
    match tree.get_directory(path) {
        Some(dir) => {
            output::info(&dir.display());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(format!("no category at {}", path))),
    }
}

#[instrument(skip(container))]
fn cmd_validate(container: &ServiceContainer, file: &Path) -> CliResult<()> {
    let report = container.validation_service.validate_file(file)?;
    for diagnostic in report.diagnostics() {
        match diagnostic.severity {
            Severity::Error => output::failure(diagnostic),
            Severity::Warning => output::warning(diagnostic),
        }
    }

    if report.is_fatal() {
        return Err(CliError::ValidationFailed {
            path: file.to_path_buf(),
            errors: report.errors().count(),
        });
    }
    output::success(&format!("{} is valid", file.display()));
    Ok(())
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    config_file: Option<&Path>,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header("Effective configuration");
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            let global = config::global_config_path();
            output::action(
                "Global",
                &global
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<no config directory>".into()),
            );
            if let Some(file) = config_file {
                output::action("Override", &file.display());
            }
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let target: PathBuf = if *global {
                config::global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine the global config directory".into())
                })?
            } else {
                PathBuf::from("deskmenu.toml")
            };
            if container.fs.exists(&target) {
                return Err(CliError::InvalidArgs(format!(
                    "{} already exists",
                    target.display()
                )));
            }
            container
                .fs
                .ensure_parent(&target)
                .and_then(|_| container.fs.write(&target, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("created {}", target.display()));
            Ok(())
        }
    }
}
