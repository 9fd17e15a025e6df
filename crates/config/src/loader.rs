use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::env_parsing::{
    non_empty_env, normalize_legacy_json, parse_env_bool, parse_env_number, validate_config,
};
use super::AppConfig;

pub fn load_from_path(path: impl AsRef<Path>) -> Result<AppConfig> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let cfg: AppConfig = if is_json {
        let document: serde_json::Value = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
        serde_json::from_value(normalize_legacy_json(document))
            .with_context(|| format!("invalid config document: {}", path.display()))?
    } else {
        toml::from_str(&raw).with_context(|| format!("failed to parse TOML: {}", path.display()))?
    };
    Ok(cfg)
}

pub fn load_from_env_or_default(default_path: &Path) -> Result<(AppConfig, PathBuf)> {
    let configured = env::var("SNAKEBOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_path.to_path_buf());
    let mut config = load_from_path(&configured)?;
    apply_env_overrides(&mut config);
    validate_config(&config)
        .with_context(|| format!("invalid config: {}", configured.display()))?;
    Ok((config, configured))
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(env_name) = env::var("SNAKEBOT_ENV").ok().and_then(non_empty_env) {
        config.system.env = env_name;
    }
    if let Some(log_level) = env::var("SNAKEBOT_LOG_LEVEL").ok().and_then(non_empty_env) {
        config.system.log_level = log_level;
    }
    if let Some(log_json) = env::var("SNAKEBOT_LOG_JSON").ok().and_then(parse_env_bool) {
        config.system.log_json = log_json;
    }

    if let Some(concurrency) = env::var("SNAKEBOT_CONCURRENCY")
        .ok()
        .and_then(parse_env_number::<usize>)
    {
        config.run.concurrency = concurrency;
    }
    if let Some(rotate_proxy) = env::var("SNAKEBOT_ROTATE_PROXY")
        .ok()
        .and_then(parse_env_bool)
    {
        config.run.rotate_proxy = rotate_proxy;
    }
    if let Some(do_tasks) = env::var("SNAKEBOT_DO_TASKS").ok().and_then(parse_env_bool) {
        config.run.do_tasks = do_tasks;
    }
    if let Some(play_games) = env::var("SNAKEBOT_PLAY_GAMES").ok().and_then(parse_env_bool) {
        config.run.play_games = play_games;
    }
    if let Some(task_delay) = env::var("SNAKEBOT_TASK_DELAY_SECONDS")
        .ok()
        .and_then(parse_env_number::<f64>)
    {
        config.run.delay_seconds[0] = task_delay;
    }
    if let Some(game_delay) = env::var("SNAKEBOT_GAME_DELAY_SECONDS")
        .ok()
        .and_then(parse_env_number::<f64>)
    {
        config.run.delay_seconds[1] = game_delay;
    }
    if let Some(restart_minutes) = env::var("SNAKEBOT_RESTART_INTERVAL_MINUTES")
        .ok()
        .and_then(parse_env_number::<f64>)
    {
        config.run.restart_interval_minutes = restart_minutes;
    }
    if let Some(max_cycles) = env::var("SNAKEBOT_MAX_CYCLES")
        .ok()
        .and_then(parse_env_number::<u64>)
    {
        config.run.max_cycles = max_cycles;
    }

    if let Some(path) = env::var("SNAKEBOT_IDENTITIES_PATH").ok().and_then(non_empty_env) {
        config.inputs.identities_path = path;
    }
    if let Some(path) = env::var("SNAKEBOT_WALLETS_PATH").ok().and_then(non_empty_env) {
        config.inputs.wallets_path = path;
    }
    if let Some(path) = env::var("SNAKEBOT_PROXIES_PATH").ok().and_then(non_empty_env) {
        config.inputs.proxies_path = path;
    }
    if let Some(path) = env::var("SNAKEBOT_USER_AGENTS_PATH")
        .ok()
        .and_then(non_empty_env)
    {
        config.inputs.user_agents_path = path;
    }

    if let Some(base_url) = env::var("SNAKEBOT_BASE_URL").ok().and_then(non_empty_env) {
        config.remote.base_url = base_url;
    }
    if let Some(timeout_ms) = env::var("SNAKEBOT_REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(parse_env_number::<u64>)
    {
        config.remote.request_timeout_ms = timeout_ms;
    }
}
