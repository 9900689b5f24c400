use clap::Parser;
use color_eyre::eyre::{bail, WrapErr};
use color_eyre::Result;
use env_logger::Env;
use log::info;
use std::path::PathBuf;

use netforge::config_loader;
use netforge::orchestrator::{generate_network, regenerate_network, GenerationContext};
use netforge::registry::DockerRegistry;

/// Generate configuration for a local Quorum test network
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the answers file (YAML or JSON)
    #[arg(short, long, conflicts_with = "state")]
    config: Option<PathBuf>,

    /// Regenerate from a persisted network config.json
    #[arg(long)]
    state: Option<PathBuf>,

    /// Base directory; networks are created under <output>/network/<name>
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Custom docker registry host, without http(s)://
    #[arg(long)]
    registry: Option<String>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    // Initialize logging with default filter level of "info"
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let registry = DockerRegistry::parse(args.registry.as_deref())?;
    let ctx = GenerationContext::new(&args.output, registry);
    info!("Output directory: {:?}", args.output);

    let summary = match (&args.config, &args.state) {
        (Some(config), _) => {
            info!("Answers file: {:?}", config);
            let topology = config_loader::load_topology(config)
                .wrap_err_with(|| format!("Invalid network configuration in {:?}", config))?;
            generate_network(&topology, &ctx)?
        }
        (None, Some(state)) => {
            info!("Regenerating from state: {:?}", state);
            regenerate_network(state, &ctx)?
        }
        (None, None) => bail!("Either --config or --state must be given"),
    };

    info!("Generated {} artifacts", summary.artifacts.len());
    info!(
        "Start the network with: {}",
        summary.network_path.join("start.sh").display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let args = Args::parse_from(["netforge", "--config", "answers.yaml"]);

        assert_eq!(args.config, Some(PathBuf::from("answers.yaml")));
        assert_eq!(args.output, PathBuf::from("."));
        assert!(args.registry.is_none());
    }

    #[test]
    fn test_state_and_registry_args() {
        let args = Args::parse_from([
            "netforge",
            "--state",
            "network/demo/config.json",
            "--registry",
            "mirror.example.com",
            "--output",
            "/tmp/out",
        ]);

        assert_eq!(args.state, Some(PathBuf::from("network/demo/config.json")));
        assert_eq!(args.registry.as_deref(), Some("mirror.example.com"));
        assert_eq!(args.output, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_config_conflicts_with_state() {
        let result = Args::try_parse_from(["netforge", "--config", "a.yaml", "--state", "b.json"]);
        assert!(result.is_err());
    }
}
