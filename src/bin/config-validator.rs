//! # Planner Configuration Validator
//!
//! Command-line tool for validating planner configuration files across
//! environments before shipping them.

use clap::{Parser, Subcommand, ValueEnum};
use post_planner::config::{ConfigManager, PlannerConfig};
use post_planner::constants::system::{KNOWN_ENVIRONMENTS, PLANNER_CORE_VERSION};
use post_planner::logging::log_error;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "planner-config-validator")]
#[command(about = "Validate post planner configuration files")]
#[command(version = PLANNER_CORE_VERSION)]
pub struct Cli {
    /// Environment to validate (development, test, production)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for `show`
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration for the selected environment
    Validate,

    /// Validate every known environment
    All,

    /// Print the effective configuration with secrets masked
    Show,

    /// List known environments
    Environments,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate_environment(&cli, &cli.environment),
        Some(Commands::All) => validate_all(&cli),
        Some(Commands::Show) => show_config(&cli),
        Some(Commands::Environments) => {
            list_environments();
            Ok(())
        }
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {}", e);
            process::exit(1);
        }
    }
}

fn validate_environment(cli: &Cli, environment: &str) -> anyhow::Result<()> {
    println!("🔧 Validating planner configuration (post-planner-core {PLANNER_CORE_VERSION})");
    println!("Environment: {environment}");
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }

    match ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), environment) {
        Ok(manager) => {
            println!("✅ Configuration loaded and validated");
            print_summary(manager.config());
            Ok(())
        }
        Err(e) => {
            println!("❌ {e}");
            log_error("config-validator", "validate", &e.to_string(), Some(environment));
            Err(e.into())
        }
    }
}

fn validate_all(cli: &Cli) -> anyhow::Result<()> {
    let mut failures = Vec::new();

    for environment in KNOWN_ENVIRONMENTS {
        if validate_environment(cli, environment).is_err() {
            failures.push(*environment);
        }
        println!();
    }

    if failures.is_empty() {
        println!("✅ All environments valid");
        Ok(())
    } else {
        anyhow::bail!("invalid environments: {}", failures.join(", "))
    }
}

fn show_config(cli: &Cli) -> anyhow::Result<()> {
    let manager = ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), &cli.environment)?;
    let masked = manager.debug_config();

    let rendered = match cli.format {
        OutputFormat::Json => serde_json::to_string_pretty(&masked)?,
        OutputFormat::Yaml => serde_yaml::to_string(&masked)?,
    };
    println!("{rendered}");
    Ok(())
}

fn list_environments() {
    println!("📋 Known environments:");
    for environment in KNOWN_ENVIRONMENTS {
        println!("  - {environment}");
    }
}

fn print_summary(config: &PlannerConfig) {
    let policy = config.retry.to_policy();
    println!("  Generation endpoint: {}", config.generation.base_url);
    println!(
        "  Timeouts (ms): ideas {} / post {} / variants {} / quota {}",
        config.generation.ideas_timeout_ms,
        config.generation.post_timeout_ms,
        config.generation.variants_timeout_ms,
        config.generation.quota_timeout_ms
    );
    println!(
        "  Retry: {} attempts, first delay {:?}, cap {} ms",
        policy.max_attempts(),
        policy.backoff_delay(0),
        policy.max_delay_ms
    );
    println!(
        "  Batch plan: {} then {}",
        config.batch.first.platform, config.batch.second.platform
    );
    println!(
        "  Auto-save: {} every {} ms",
        if config.auto_save.enabled { "enabled" } else { "disabled" },
        config.auto_save.delay_ms
    );
}
