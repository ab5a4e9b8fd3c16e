//! kinetix-recalc: batch auto-validation recalculation from the command line.
//!
//! Loads the rule definition catalog and a YAML scenario (accounts,
//! activity definitions, workflows, existing activities), recalculates
//! every workflow and prints the accumulated changes as JSON.
//!
//! With `--watch` the rules directory is watched and the batch re-runs
//! every `--interval` seconds against the live catalog.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use kinetix_core::{Config, ErrorPolicy};
use kinetix_rules::loader::RuleLoader;
use kinetix_rules::RuleManager;
use kinetix_workflow::scenario::Scenario;
use kinetix_workflow::{Recalculator, WorkflowEngine};

#[derive(Parser, Debug)]
#[command(name = "kinetix-recalc", version, about)]
struct Cli {
    /// Scenario file with accounts, workflows and activities.
    #[arg(long)]
    scenario: PathBuf,

    /// Rules directory (overrides RULES_DIR).
    #[arg(long)]
    rules_dir: Option<PathBuf>,

    /// Worker threads, 0 for one per core (overrides RECALC_THREADS).
    #[arg(long)]
    threads: Option<usize>,

    /// abort | skip (overrides RECALC_ERROR_POLICY).
    #[arg(long)]
    on_error: Option<ErrorPolicy>,

    /// Keep running and recalculate on an interval (overrides RULES_WATCH).
    #[arg(long)]
    watch: bool,

    /// Seconds between recalculations in watch mode.
    #[arg(long, env = "RECALC_INTERVAL", default_value_t = 30)]
    interval: u64,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    kinetix_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.rules_dir {
        config.rules.dir = dir;
    }
    if let Some(threads) = cli.threads {
        config.recalculation.threads = threads;
    }
    if let Some(policy) = cli.on_error {
        config.recalculation.on_error = policy;
    }
    config.rules.watch |= cli.watch;
    config.log_summary();

    let mut loader = RuleLoader::new(config.rules.dir.clone());
    for result in loader.load_all()?.iter().filter(|r| r.needs_attention()) {
        warn!(path = %result.path.display(), status = ?result.status, "definition needs attention");
    }

    let (accounts, store) = Scenario::from_file(&cli.scenario)?.into_stores();
    let manager = RuleManager::new(loader.catalog(), accounts);
    let engine = WorkflowEngine::new(store, Recalculator::new(manager, config.recalculation.clone()));

    let print = |outcome: &kinetix_workflow::BatchOutcome| -> anyhow::Result<()> {
        let json = if cli.pretty {
            serde_json::to_string_pretty(outcome)?
        } else {
            serde_json::to_string(outcome)?
        };
        println!("{}", json);
        Ok(())
    };

    print(&engine.recalculate_all()?)?;

    if !config.rules.watch {
        return Ok(());
    }

    loader.watch()?;
    info!(interval_secs = cli.interval, "watch mode, recalculating on an interval");
    loop {
        std::thread::sleep(Duration::from_secs(cli.interval));
        match engine.recalculate_all() {
            Ok(outcome) => print(&outcome)?,
            Err(e) => warn!(error = %e, "recalculation failed"),
        }
    }
}
