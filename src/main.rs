use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use sysprobe::config::{self, Config, load_config, load_config_from_path};
use sysprobe::probe::Registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sysprobe",
    version,
    about = "Print a one-shot JSON report of host and network state"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run these probes (repeatable)
    #[arg(long, value_name = "PROBE")]
    only: Vec<String>,

    /// Skip these probes (repeatable)
    #[arg(long, value_name = "PROBE")]
    skip: Vec<String>,

    /// List probe names and exit
    #[arg(long, default_value_t = false)]
    list_probes: bool,

    /// Print the report on a single line
    #[arg(long, default_value_t = false)]
    compact: bool,

    /// Log more to stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = Registry::builtin();
    if cli.list_probes {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let config = load_config_for_cli(&cli);
    let registry = select_probes(registry, &cli, &config)?;
    info!(probes = ?registry.names(), "collecting report");

    let report = registry.collect(Arc::new(config)).await;

    let rendered = if cli.compact {
        report.to_json()?
    } else {
        report.to_pretty_json()?
    };
    println!("{rendered}");
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };
    config.general.skip.extend(cli.skip.iter().cloned());
    config
}

fn select_probes(mut registry: Registry, cli: &Cli, config: &Config) -> Result<Registry> {
    let unknown: Vec<&str> = cli
        .only
        .iter()
        .chain(&cli.skip)
        .map(String::as_str)
        .filter(|name| !registry.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(eyre!(
            "unknown probe(s): {}; available: {}",
            unknown.join(", "),
            registry.names().join(", ")
        ));
    }

    if !cli.only.is_empty() {
        registry.retain(&cli.only);
    }
    registry.without(&config.general.skip);
    if registry.is_empty() {
        info!(config = ?config::config_path(), "every probe was skipped");
    }
    Ok(registry)
}
