//! notion-tidy binary entry point

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tidy_core::vfs::PhysicalFileSystem;
use tidy_core::{NotionExport, RunSummary, TidyConfig};

#[derive(Debug, Parser)]
#[command(
    name = "notion-tidy",
    about = "Reorganize a hash-suffixed markdown export into per-section folders",
    version
)]
struct Cli {
    /// Index markdown document of the export.
    index: PathBuf,
    /// Plan and report only; change nothing on disk.
    #[arg(long)]
    dry_run: bool,
    /// YAML config file (defaults to .notion-tidy.yaml next to the index).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Leave hashed documents that no section links to alone.
    #[arg(long)]
    no_orphans: bool,
    /// Keep folders left empty by the moves.
    #[arg(long)]
    keep_empty_dirs: bool,
    /// Print the summary (and, on dry run, the plan) as JSON.
    #[arg(long)]
    json: bool,
    /// Enable verbose logging for debugging.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = resolve_config(&cli)?;
    if config.dry_run {
        log::info!("DRY RUN MODE - No changes will be made");
    }

    let export = NotionExport::open(&cli.index, Arc::new(PhysicalFileSystem), config)
        .with_context(|| format!("cannot open export at {}", cli.index.display()))?;

    let plan = export.plan()?;
    let summary = if export.config.dry_run {
        RunSummary::from_plan(&plan)
    } else {
        export.apply(&plan).context("reorganization stopped part-way")?
    };

    if cli.json {
        let output = if summary.dry_run {
            serde_json::json!({ "summary": summary, "plan": plan })
        } else {
            serde_json::json!({ "summary": summary })
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for diagnostic in &summary.diagnostics {
            eprintln!("warning: {}", diagnostic.message);
        }
        println!("{}", summary);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Config file (explicit or next to the index), then command-line overrides.
fn resolve_config(cli: &Cli) -> Result<TidyConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| TidyConfig::path_for_index(&cli.index));

    let mut config = match path {
        Some(path) => load_config(&path)?,
        None => TidyConfig::default(),
    };

    config.dry_run |= cli.dry_run;
    if cli.no_orphans {
        config.rename_orphans = false;
    }
    if cli.keep_empty_dirs {
        config.remove_empty_dirs = false;
    }

    Ok(config)
}

fn load_config(path: &Path) -> Result<TidyConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    TidyConfig::from_yaml(&content).with_context(|| format!("invalid config {}", path.display()))
}
