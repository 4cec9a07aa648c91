//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docsplice_core::{
    ProgressReporter, RunOptions, RunReport, SectionOutcome, SectionStatus, SilentProgress,
    check_boundaries,
};
use docsplice_shared::{
    DegradedPolicy, DocspliceError, ProjectConfig, SectionDefinition, default_config_path,
    init_config, load_config,
};
use docsplice_storage::{DocumentStore, DryRunStore, FsStore};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docsplice: keep documentation pages in sync with a migration guide.
#[derive(Parser)]
#[command(
    name = "docsplice",
    version,
    about = "Extract heading-bounded sections from a Markdown guide and merge them into site pages.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Options shared by every command that reads the project file.
#[derive(Args)]
pub(crate) struct ProjectArgs {
    /// Project file (defaults to ./docsplice.toml).
    #[arg(short, long, env = "DOCSPLICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the source guide.
    #[arg(long)]
    pub source: Option<PathBuf>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Extract every configured section and merge it into its target page.
    Run {
        #[command(flatten)]
        project: ProjectArgs,

        /// Override the content root.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Show what would be written without touching any file.
        #[arg(long)]
        dry_run: bool,

        /// Abort at the first degraded merge.
        #[arg(long)]
        strict: bool,

        /// Print the run report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Validate the project file and check boundaries against the source.
    Check {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Project file management.
    Config {
        /// Project file (defaults to ./docsplice.toml).
        #[arg(short, long, env = "DOCSPLICE_CONFIG", global = true)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a commented starter project file.
    Init,
    /// Show the resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docsplice=info",
        1 => "docsplice=debug",
        _ => "docsplice=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            project,
            root,
            dry_run,
            strict,
            json,
        } => cmd_run(&project, root, dry_run, strict, json),
        Command::Check { project } => cmd_check(&project),
        Command::Config { config, action } => match action {
            ConfigAction::Init => cmd_config_init(config),
            ConfigAction::Show => cmd_config_show(config),
        },
    }
}

/// Load the project file, apply `--source`, and read the source guide.
fn load_project(args: &ProjectArgs) -> Result<(ProjectConfig, Vec<SectionDefinition>, String)> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(source) = &args.source {
        config.source = source.clone();
    }

    let definitions = config.definitions()?;
    let source = std::fs::read_to_string(&config.source)
        .map_err(|e| DocspliceError::io(&config.source, e))?;

    Ok((config, definitions, source))
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(
    project: &ProjectArgs,
    root: Option<PathBuf>,
    dry_run: bool,
    strict: bool,
    json: bool,
) -> Result<()> {
    let (mut config, definitions, source) = load_project(project)?;
    if let Some(root) = root {
        config.content_root = root;
    }

    let options = RunOptions {
        on_degraded: if strict {
            DegradedPolicy::Fail
        } else {
            config.on_degraded
        },
        dry_run,
    };

    info!(
        source = %config.source.display(),
        root = %config.content_root.display(),
        sections = definitions.len(),
        dry_run,
        "running docsplice"
    );

    let progress: Box<dyn ProgressReporter> = if json {
        Box::new(SilentProgress)
    } else {
        Box::new(CliProgress::new())
    };

    let mut store = FsStore::open(&config.content_root);
    let report = if dry_run {
        let mut dry = DryRunStore::new(&store);
        let report =
            docsplice_core::run(&source, &definitions, &mut dry, &options, progress.as_ref())?;
        if !json {
            print_changes(&dry);
        }
        report
    } else {
        docsplice_core::run(&source, &definitions, &mut store, &options, progress.as_ref())?
    };
    drop(progress);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    if report.dry_run {
        println!("  Dry run {} (nothing written)", report.run_id);
    } else {
        println!("  Run {}", report.run_id);
    }
    println!();

    for outcome in &report.outcomes {
        println!("  {}", format_outcome(outcome));
    }

    println!();
    println!(
        "  {} section(s): {} written, {} unchanged, {} skipped, {} degraded",
        report.outcomes.len(),
        report.written().count(),
        report.count(SectionStatus::Unchanged),
        report.count(SectionStatus::SkippedEmpty)
            + report.count(SectionStatus::SkippedExists),
        report.degraded().count(),
    );
    println!();
}

fn format_outcome(outcome: &SectionOutcome) -> String {
    let mut line = format!(
        "{:<18} {} -> {}",
        outcome.status.as_str(),
        outcome.name,
        outcome.target
    );
    if let Some(reason) = outcome.reason {
        line.push_str(&format!(" ({reason})"));
    }
    if outcome.bytes > 0 {
        line.push_str(&format!(" [{} bytes]", outcome.bytes));
    }
    line
}

fn print_changes<S: DocumentStore + ?Sized>(dry: &DryRunStore<'_, S>) {
    let changes: Vec<_> = dry.changes().collect();
    if changes.is_empty() {
        return;
    }
    println!();
    println!("  Would write:");
    for (path, content) in changes {
        println!("    {path} ({} bytes)", content.len());
    }
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(project: &ProjectArgs) -> Result<()> {
    let (config, definitions, source) = load_project(project)?;
    let checks = check_boundaries(&source, &definitions)?;
    let store = FsStore::open_readonly(&config.content_root);

    println!();
    println!("  Source: {}", config.source.display());
    println!("  Root:   {}", store.root().display());
    println!();

    let mut missing = 0;
    for (def, check) in definitions.iter().zip(&checks) {
        let start = if check.start_found { "found" } else { "MISSING" };
        let end = match check.end_found {
            Some(true) => "found",
            Some(false) => "not found, runs to end",
            None => "-",
        };
        let target = if store.read(&def.target)?.is_some() {
            "exists"
        } else {
            "new"
        };
        println!(
            "  {:<20} start: {start:<8} end: {end:<24} target: {} ({target}, {})",
            check.name,
            def.target,
            def.strategy.kind(),
        );
        if !check.start_found {
            missing += 1;
        }
    }
    println!();

    if missing > 0 {
        return Err(eyre!(
            "{missing} start boundar{} not found in {}",
            if missing == 1 { "y" } else { "ies" },
            config.source.display()
        ));
    }

    info!(sections = definitions.len(), "project file is valid");
    println!("  All {} section(s) located.", definitions.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn section_done(&self, outcome: &SectionOutcome, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "[{current}/{total}] {} -> {}",
            outcome.name, outcome.status
        ));
    }

    fn done(&self, _report: &RunReport) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => default_config_path()?,
    };
    let path = init_config(&path)?;
    println!("Project file created at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<PathBuf>) -> Result<()> {
    let config: ProjectConfig = load_config(path.as_deref())?;
    // Validates strategies and patterns as a side effect.
    config.definitions()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
