use anyhow::{Context, Result};
use snakebot_client::HttpActionClient;
use snakebot_config::load_from_env_or_default;
use snakebot_inputs::InputLists;
use snakebot_proxy::TransportCache;
use snakebot_runtime::{CycleTimer, RunSettings, Scheduler};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "configs/snakebot.toml";

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    config: Option<PathBuf>,
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli_args(env::args().skip(1));
    let default_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let (config, loaded_config_path) = load_from_env_or_default(&default_path)?;

    init_tracing(&config.system.log_level, config.system.log_json);
    info!(
        config_path = %loaded_config_path.display(),
        env = %config.system.env,
        "configuration loaded"
    );

    let inputs = Arc::new(InputLists::load(&config.inputs).context("failed to load input lists")?);
    let client = Arc::new(
        HttpActionClient::new(&config.remote).context("failed to initialize action client")?,
    );
    info!(base_url = client.base_url(), "action client ready");

    let settings = RunSettings::from_config(&config.run);
    let transport_cache = Arc::new(TransportCache::new(config.remote.request_timeout()));
    let scheduler = Arc::new(Scheduler::new(client, settings, transport_cache));

    let max_cycles = if cli.once { 1 } else { config.run.max_cycles };
    let timer = CycleTimer::new(
        scheduler,
        inputs,
        config.run.restart_interval(),
        max_cycles,
    );
    let stats = timer
        .run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(error = %error, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(
        started = stats.started,
        completed = stats.completed,
        aborted = stats.aborted,
        "snakebot stopped"
    );
    Ok(())
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut cli = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--once" {
            cli.once = true;
        } else if arg == "--config" {
            cli.config = args.next().map(PathBuf::from);
        } else if let Some(inline) = arg.strip_prefix("--config=") {
            cli.config = Some(PathBuf::from(inline));
        }
    }
    cli
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    if json {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .json()
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(false)
            .with_env_filter(filter)
            .compact()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn no_arguments_use_defaults() {
        assert_eq!(parse_cli_args(args(&[])), CliArgs::default());
    }

    #[test]
    fn config_path_accepts_both_forms() {
        let spaced = parse_cli_args(args(&["--config", "configs/prod.toml"]));
        assert_eq!(spaced.config, Some(PathBuf::from("configs/prod.toml")));

        let inline = parse_cli_args(args(&["--config=legacy.json", "--once"]));
        assert_eq!(inline.config, Some(PathBuf::from("legacy.json")));
        assert!(inline.once);
    }

    #[test]
    fn dangling_config_flag_falls_back_to_default() {
        let cli = parse_cli_args(args(&["--once", "--config"]));
        assert!(cli.once);
        assert_eq!(cli.config, None);
    }
}
