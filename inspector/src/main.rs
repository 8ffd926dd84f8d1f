//! Inspector CLI Application
//!
//! A command-line interface for finding which web platforms a username is
//! registered on. This CLI application provides a user-friendly interface
//! to the inspector-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use futures::StreamExt;
use inspector_lib::{
    load_env_config, parse_duration, validate_username, Catalogue, ConfigManager, EnvConfig,
    FileConfig, ProbeConfig, ProbeEngine, ProbeError, ProbeOutcome, DEFAULT_GROUP,
    MAX_CONCURRENCY,
};
use std::process;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for inspector
#[derive(Parser, Debug)]
#[command(name = "inspector")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search for a username across web platforms")]
#[command(
    long_about = "Search for a username across web platforms.\n\nEach platform in the selected groups is probed over HTTP with a bounded number of requests in flight; platforms that answer with a profile page are reported as matches."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Username to search for
    #[arg(value_name = "USERNAME", required_unless_present = "list_platforms")]
    pub username: Option<String>,

    /// Platform groups to search (comma-separated or multiple -p flags) [default: social]
    #[arg(short = 'p', long = "platform", value_name = "GROUP", value_delimiter = ',', action = clap::ArgAction::Append, help_heading = "Platform Selection")]
    pub platforms: Option<Vec<String>>,

    /// Search every known platform group
    #[arg(long = "all", conflicts_with = "platforms", help_heading = "Platform Selection")]
    pub all: bool,

    /// List all platform groups and their platforms, then exit
    #[arg(long = "list-platforms", help_heading = "Platform Selection")]
    pub list_platforms: bool,

    /// Output matches in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Only print the final list of matches
    #[arg(short = 'q', long = "quiet", help_heading = "Output Format")]
    pub quiet: bool,

    /// Max requests in flight (1-100) [default: number of CPUs]
    #[arg(short = 'c', long = "concurrency", value_name = "N", help_heading = "Performance")]
    pub concurrency: Option<usize>,

    /// Per-request timeout, e.g. 10s, 500ms, 1m [default: 10s]
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Everything resolved from flags, environment and config files.
#[derive(Debug)]
struct Settings {
    probe: ProbeConfig,
    platforms: Vec<String>,
    catalogue: Catalogue,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the defaults.
fn init_logging(verbose: bool) {
    // Per-target failures are already shown in the result lines.
    let default_filter = if verbose {
        "inspector=debug,inspector_lib=debug"
    } else {
        "warn,inspector_lib::engine=error"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main search logic
async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let settings = resolve_settings(&args)?;

    if args.list_platforms {
        ui::print_platforms(&settings.catalogue);
        return Ok(());
    }

    let username = args
        .username
        .as_deref()
        .ok_or_else(|| ProbeError::invalid_username("", "A username is required"))?;
    validate_username(username)?;

    // Configuration errors surface here, before any request is made.
    let targets = settings
        .catalogue
        .build_targets(username, &settings.platforms)?;

    tracing::debug!(
        username,
        platforms = ?settings.platforms,
        targets = targets.len(),
        concurrency = settings.probe.concurrency,
        timeout = ?settings.probe.timeout,
        "starting search"
    );

    let engine = ProbeEngine::new(settings.probe)?;
    let show_progress = !args.quiet && !args.json;

    if show_progress {
        ui::print_header(username, targets.len(), engine.config().concurrency);
    }

    let spinner = if args.quiet && !args.json {
        ui::Spinner::start(format!("Searching {} platforms...", targets.len()))
    } else {
        None
    };

    let start_time = std::time::Instant::now();
    let total = targets.len();
    let mut counts = ui::Counts::default();
    let mut matches = Vec::new();
    let mut completed = 0usize;

    let mut stream = engine.probe_stream(targets);
    while let Some(report) = stream.next().await {
        completed += 1;
        match &report.outcome {
            ProbeOutcome::Matched { .. } => counts.found += 1,
            ProbeOutcome::NotMatched { .. } => counts.not_found += 1,
            ProbeOutcome::Failed { .. } => counts.failed += 1,
        }

        if show_progress {
            ui::print_report(&report, Some((completed, total)));
        }

        if let Some(result) = report.into_result() {
            matches.push(result);
        }
    }

    if let Some(s) = spinner {
        s.stop().await;
    }

    matches.sort_by_key(|m| m.name.to_lowercase());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if show_progress {
        println!();
        ui::print_summary(&counts, start_time.elapsed());
    }

    ui::print_matches(username, &matches);

    Ok(())
}

/// Build settings from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments (explicit user input)
/// 2. Environment variables (INSPECTOR_*)
/// 3. Explicit config file (--config / INSPECTOR_CONFIG) or discovered config files
/// 4. Built-in defaults
fn resolve_settings(args: &Args) -> Result<Settings, ProbeError> {
    let env_config = load_env_config();
    let file_config = load_file_config(args, &env_config)?;
    resolve_from(args, env_config, file_config)
}

/// Apply file, environment and CLI values on top of the built-in defaults.
fn resolve_from(
    args: &Args,
    env_config: EnvConfig,
    file_config: FileConfig,
) -> Result<Settings, ProbeError> {
    let defaults = file_config.defaults.unwrap_or_default();
    let catalogue =
        Catalogue::builtin().with_custom_groups(file_config.custom_platforms.unwrap_or_default());

    let mut probe = ProbeConfig::default();

    // Step 1: config file values
    if let Some(concurrency) = defaults.concurrency {
        probe = probe.with_concurrency(concurrency);
    }
    if let Some(timeout) = defaults.timeout.as_deref().and_then(parse_duration) {
        probe = probe.with_timeout(timeout);
    }
    if let Some(user_agent) = defaults.user_agent {
        probe = probe.with_user_agent(user_agent);
    }

    // Step 2: environment variables
    if let Some(concurrency) = env_config.concurrency {
        probe = probe.with_concurrency(concurrency);
    }
    if let Some(timeout) = env_config.timeout.as_deref().and_then(parse_duration) {
        probe = probe.with_timeout(timeout);
    }
    if let Some(user_agent) = env_config.user_agent {
        probe = probe.with_user_agent(user_agent);
    }

    // Step 3: CLI arguments (highest precedence)
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > MAX_CONCURRENCY {
            return Err(ProbeError::config(format!(
                "Concurrency must be between 1 and {}",
                MAX_CONCURRENCY
            )));
        }
        probe = probe.with_concurrency(concurrency);
    }
    if let Some(timeout_str) = &args.timeout {
        let timeout = parse_duration(timeout_str).ok_or_else(|| {
            ProbeError::config(format!(
                "Invalid timeout '{}'. Use format like '500ms', '10s', '1m'",
                timeout_str
            ))
        })?;
        probe = probe.with_timeout(timeout);
    }

    // Platform selection: --all > -p > env > config file > default group
    let platforms = if args.all {
        catalogue.group_ids()
    } else if let Some(platforms) = &args.platforms {
        platforms
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    } else if let Some(platforms) = env_config.platforms {
        platforms
    } else if let Some(platforms) = defaults.platforms {
        platforms
    } else {
        vec![DEFAULT_GROUP.to_string()]
    };

    Ok(Settings {
        probe,
        platforms,
        catalogue,
    })
}

/// Load the config file named on the command line or in the environment,
/// falling back to automatic discovery.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, ProbeError> {
    let manager = ConfigManager::new();

    if let Some(path) = &args.config {
        tracing::debug!(path = %path, "using explicit config file (CLI --config)");
        manager.load_file(path)
    } else if let Some(path) = &env_config.config {
        tracing::debug!(path = %path, "using explicit config file (INSPECTOR_CONFIG)");
        manager.load_file(path)
    } else {
        Ok(manager.discover_and_load())
    }
}
