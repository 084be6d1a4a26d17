//! `routest` command line
//!
//! - `routest version`: print the engine version
//! - `routest inspect --env <name>`: load an environment's configuration and
//!   requirements and print what a suite would run against

use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use routest_core::{
    ConfigSelection, ConfigStore, Host, RequirementsSource, TransportSettings,
    YamlRequirementsSource,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn build_cli() -> Command {
    Command::new("routest")
        .version(routest_core::VERSION)
        .about("Hierarchical HTTP API test suites")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("version").about("Print the RouTest version"))
        .subcommand(
            Command::new("inspect")
                .about("Load an environment and print its host and requirements")
                .arg(
                    Arg::new("env")
                        .long("env")
                        .required(true)
                        .help("Environment name, e.g. staging"),
                )
                .arg(
                    Arg::new("config-dir")
                        .long("config-dir")
                        .default_value("./config")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Directory holding <env>.json, .yaml, .yml or .env"),
                )
                .arg(
                    Arg::new("requirements")
                        .long("requirements")
                        .default_value("./config/requirements.yaml")
                        .value_parser(clap::value_parser!(PathBuf))
                        .help("Requirements YAML file"),
                ),
        )
}

#[derive(Debug, PartialEq, Eq)]
struct InspectReport {
    environment: String,
    base_url: String,
    timeout_secs: Option<u64>,
    requirements: Vec<String>,
}

impl InspectReport {
    fn render(&self) -> String {
        let mut out = format!(
            "Environment: {}\nBase URL: {}\n",
            self.environment, self.base_url
        );
        if let Some(timeout) = self.timeout_secs {
            out.push_str(&format!("Timeout: {timeout}s\n"));
        }
        out.push_str(&format!("Requirements ({}):\n", self.requirements.len()));
        for name in &self.requirements {
            out.push_str(&format!("  {name}\n"));
        }
        out
    }
}

fn inspect(environment: &str, config_dir: &Path, requirements: &Path) -> anyhow::Result<InspectReport> {
    let selection = ConfigSelection::new(environment, config_dir);
    let config = ConfigStore::from_map(
        selection
            .load()
            .with_context(|| format!("failed to load configuration for '{environment}'"))?,
    );
    let host = Host::from_config(&config)?;
    let settings = TransportSettings::from_config(&config)?;
    let table = YamlRequirementsSource
        .load(requirements)
        .context("failed to load requirements")?;

    Ok(InspectReport {
        environment: environment.to_string(),
        base_url: host.base_url(),
        timeout_secs: settings.timeout.map(|t| t.as_secs()),
        requirements: table.names().map(str::to_string).collect(),
    })
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    match matches.subcommand() {
        Some(("version", _)) => {
            println!("routest {}", routest_core::VERSION);
        }
        Some(("inspect", args)) => {
            let environment = args
                .get_one::<String>("env")
                .context("--env is required")?;
            let config_dir = args
                .get_one::<PathBuf>("config-dir")
                .context("--config-dir has no value")?;
            let requirements = args
                .get_one::<PathBuf>("requirements")
                .context("--requirements has no value")?;

            tracing::info!("Inspecting environment: {}", environment);
            let report = inspect(environment, config_dir, requirements)?;
            print!("{}", report.render());
        }
        Some((other, _)) => anyhow::bail!("unknown subcommand: {other}"),
        None => anyhow::bail!("no subcommand given"),
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = build_cli().get_matches();
    if let Err(err) = run(&matches) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
