//! Command dispatch and rendering

use std::path::PathBuf;
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::application::services::Assembler;
use crate::application::{Dataset, IoResultExt};
use crate::cli::args::{Cli, Commands, ConfigCommands, ContextArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{Catalog, NodeLevel, TreeNodeConvert, TreeStatistics, ValueTree, ValueTreeNode};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::{InfraError, SourceError};

/// Dispatch a parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `valtree --help`".into(),
        ));
    };
    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        Commands::Config { command } => execute_config(cli, command),
        _ => {
            let settings = load_settings(cli)?;
            if !settings.workbook.is_file() {
                return Err(InfraError::from(SourceError::NotFound(settings.workbook.clone())).into());
            }
            let container = ServiceContainer::new(settings);
            run(command, &container)
        }
    }
}

/// Layered settings plus the `--workbook` override.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(local_dir(cli).as_deref())?;
    if let Some(workbook) = &cli.workbook {
        settings.workbook = workbook.clone();
    }
    debug!("workbook: {}", settings.workbook.display());
    Ok(settings)
}

fn local_dir(cli: &Cli) -> Option<PathBuf> {
    cli.config_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
}

/// Run a data command against a wired container.
pub fn run(command: &Commands, container: &ServiceContainer) -> CliResult<()> {
    match command {
        Commands::Tree {
            context,
            flat,
            json,
            stats,
        } => {
            let format = if *json {
                TreeFormat::Json
            } else if *flat {
                TreeFormat::Flat
            } else {
                TreeFormat::Tree
            };
            cmd_tree(container, context, format, *stats)
        }
        Commands::Stats { context } => cmd_stats(container, context),
        Commands::Contexts { json } => cmd_contexts(container, *json),
        Commands::Validate => cmd_validate(container),
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not read the workbook".into(),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Tree,
    Flat,
    Json,
}

#[derive(Serialize)]
struct TreeReport<'a> {
    tree: &'a ValueTree,
    statistics: TreeStatistics,
}

fn assemble(container: &ServiceContainer, context: &ContextArgs) -> CliResult<(Arc<Dataset>, ValueTree)> {
    let dataset = container.dataset()?;
    let threshold = context
        .threshold
        .unwrap_or(container.settings.default_threshold);
    let tree = Assembler::new(dataset.as_ref()).assemble(
        &context.value_intent,
        &context.industry,
        &context.function,
        threshold,
    );
    Ok((dataset, tree))
}

#[instrument(level = "debug", skip(container))]
fn cmd_tree(
    container: &ServiceContainer,
    context: &ContextArgs,
    format: TreeFormat,
    with_stats: bool,
) -> CliResult<()> {
    let (dataset, tree) = assemble(container, context)?;

    if format == TreeFormat::Json {
        let report = TreeReport {
            tree: &tree,
            statistics: tree.statistics(),
        };
        output::info(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if let Some(description) = dataset.value_intent_description(&context.value_intent) {
        output::header(&format!("{}: {}", context.value_intent, description));
    }
    if tree.is_empty() {
        warn_empty(&tree);
    } else if format == TreeFormat::Flat {
        output::info(&render_flat(&tree));
    } else {
        output::info(&tree.to_tree_string());
    }
    warn_detached(&tree);

    if with_stats {
        print_statistics(&tree);
    }
    Ok(())
}

fn cmd_stats(container: &ServiceContainer, context: &ContextArgs) -> CliResult<()> {
    let (_, tree) = assemble(container, context)?;
    if tree.is_empty() {
        warn_empty(&tree);
    }
    warn_detached(&tree);
    print_statistics(&tree);
    Ok(())
}

#[derive(Serialize)]
struct IntentEntry<'a> {
    name: &'a str,
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct ContextsReport<'a> {
    value_intents: Vec<IntentEntry<'a>>,
    industries: Vec<String>,
    functions: Vec<String>,
}

fn cmd_contexts(container: &ServiceContainer, json: bool) -> CliResult<()> {
    let dataset = container.dataset()?;
    let intents = dataset.distinct_value_intents();
    let report = ContextsReport {
        value_intents: intents
            .iter()
            .map(|name| IntentEntry {
                name: name.as_str(),
                description: dataset.value_intent_description(name),
            })
            .collect(),
        industries: dataset.distinct_industries(),
        functions: dataset.distinct_functions(),
    };

    if json {
        output::info(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    output::header("Value intents");
    for intent in &report.value_intents {
        match intent.description {
            Some(description) => output::detail(&format!("{} - {}", intent.name, description)),
            None => output::detail(&intent.name),
        }
    }
    output::header("Industries");
    for industry in &report.industries {
        output::detail(industry);
    }
    output::header("Functions");
    for function in &report.functions {
        output::detail(function);
    }
    Ok(())
}

fn cmd_validate(container: &ServiceContainer) -> CliResult<()> {
    let source = container.source.describe();
    match container.loader().load() {
        Ok(dataset) => {
            for warning in dataset.warnings() {
                output::warning(warning);
            }
            output::success(&format!(
                "{}: {} nodes, {} rules",
                source,
                dataset.nodes().len(),
                dataset.rules().len()
            ));
            Ok(())
        }
        Err(e) => Err(CliError::Load { errors: e.errors }),
    }
}

fn execute_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => print_config_path("Global", &path),
                None => output::detail("Global: <unavailable>"),
            }
            if let Some(dir) = local_dir(cli) {
                print_config_path("Local", &local_config_path(&dir));
            }
            Ok(())
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path()
                    .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))?
            } else {
                let dir = local_dir(cli)
                    .ok_or_else(|| CliError::Usage("cannot determine current directory".into()))?;
                local_config_path(&dir)
            };
            if path.exists() {
                return Err(CliError::Usage(format!(
                    "config file already exists: {}",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_path_context("create config dir", parent)?;
            }
            std::fs::write(&path, Settings::template()).with_path_context("write config", &path)?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}

fn print_config_path(label: &str, path: &std::path::Path) {
    let marker = if path.exists() { "" } else { " (not found)" };
    output::detail(&format!("{}: {}{}", label, path.display(), marker));
}

fn warn_empty(tree: &ValueTree) {
    output::warning(&format!(
        "no nodes match {} at threshold {}",
        tree.context.business, tree.context.threshold
    ));
}

fn warn_detached(tree: &ValueTree) {
    if !tree.detached_node_ids.is_empty() {
        output::warning(&format!(
            "{} included nodes have no active path to a Lever: {:?}",
            tree.detached_node_ids.len(),
            tree.detached_node_ids
        ));
    }
}

fn print_statistics(tree: &ValueTree) {
    let stats = tree.statistics();
    output::header("Statistics");
    for level in NodeLevel::ALL {
        output::detail(&format!("{:<20} {}", level.label(), stats.count(level)));
    }
    output::detail(&format!("{:<20} {}", "Total", stats.total));
    if tree.node_count != stats.total {
        output::detail(&format!("{:<20} {}", "Included", tree.node_count));
    }
}

/// One line per node in pre-order, indented two spaces per level.
pub fn render_flat(tree: &ValueTree) -> String {
    fn walk(node: &ValueTreeNode, depth: usize, lines: &mut Vec<String>) {
        lines.push(format!(
            "{}{} [{}] {}",
            "  ".repeat(depth),
            node.node_id(),
            node.level().label(),
            node.name()
        ));
        for child in &node.children {
            walk(child, depth + 1, lines);
        }
    }

    let mut lines = Vec::with_capacity(tree.node_count);
    for root in &tree.roots {
        walk(root, 0, &mut lines);
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::MemorySource;
    use crate::util::testing::{sample_builder, sample_workbook};

    fn container() -> ServiceContainer {
        ServiceContainer::with_deps(
            Settings::default(),
            Arc::new(MemorySource::new(sample_workbook())),
        )
    }

    fn context(threshold: Option<i64>) -> ContextArgs {
        ContextArgs {
            value_intent: "X".into(),
            industry: "X".into(),
            function: "X".into(),
            threshold,
        }
    }

    #[test]
    fn given_chain_when_rendering_flat_then_indents_by_depth() {
        let dataset = container().dataset().unwrap();
        let tree = Assembler::new(dataset.as_ref()).assemble("X", "X", "X", 3);
        assert_eq!(
            render_flat(&tree),
            "L1 [Lever] L1 name\n  BO1 [Business Objective] BO1 name\n    VD1 [Value Driver] VD1 name\n      K1 [KPI] K1 name"
        );
    }

    #[test]
    fn given_valid_workbook_when_running_data_commands_then_succeed() {
        let container = container();
        for command in [
            Commands::Tree {
                context: context(None),
                flat: false,
                json: false,
                stats: true,
            },
            Commands::Tree {
                context: context(Some(5)),
                flat: true,
                json: false,
                stats: false,
            },
            Commands::Tree {
                context: context(Some(1)),
                flat: false,
                json: true,
                stats: false,
            },
            Commands::Stats { context: context(None) },
            Commands::Contexts { json: true },
            Commands::Validate,
        ] {
            run(&command, &container).unwrap();
        }
    }

    #[test]
    fn given_invalid_workbook_when_validating_then_load_error_with_dataerr() {
        let workbook = sample_builder().rule("GHOST", ("X", "X", "X"), "9").build();
        let container =
            ServiceContainer::with_deps(Settings::default(), Arc::new(MemorySource::new(workbook)));
        let err = run(&Commands::Validate, &container).unwrap_err();
        assert!(matches!(&err, CliError::Load { errors } if errors.len() == 2));
        assert_eq!(err.exit_code(), crate::exitcode::DATAERR);
    }

    #[test]
    fn given_missing_source_when_running_tree_then_not_loaded() {
        let container =
            ServiceContainer::with_deps(Settings::default(), Arc::new(MemorySource::missing()));
        let err = run(
            &Commands::Stats { context: context(None) },
            &container,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::Load { .. }));
    }
}
