use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::str::FromStr;

use super::schema::MAX_DURATION_SECS;
use super::AppConfig;

const SECTION_KEYS: [&str; 4] = ["system", "run", "inputs", "remote"];
const LEGACY_RUN_KEYS: [(&str, &str); 6] = [
    ("howManyAccountsRunInOneTime", "concurrency"),
    ("rotateProxy", "rotate_proxy"),
    ("doTasks", "do_tasks"),
    ("playGames", "play_games"),
    ("delayEachAccount", "delay_seconds"),
    ("timeToRestartAllAccounts", "restart_interval_minutes"),
];

pub(crate) fn parse_env_bool(value: String) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn parse_env_number<T: FromStr>(value: String) -> Option<T> {
    value.trim().parse::<T>().ok()
}

pub(crate) fn non_empty_env(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Moves the camelCase keys of a flat legacy JSON document under `run`,
/// renamed to their canonical names. Keys already set in `run` win.
pub(crate) fn normalize_legacy_json(document: Value) -> Value {
    let Value::Object(root) = document else {
        return document;
    };
    let mut sections = Map::new();
    let mut legacy = Map::new();
    for (key, value) in root {
        if SECTION_KEYS.contains(&key.as_str()) {
            sections.insert(key, value);
        } else if let Some((_, canonical)) = LEGACY_RUN_KEYS
            .iter()
            .find(|(legacy_key, _)| *legacy_key == key)
        {
            legacy.insert((*canonical).to_string(), value);
        }
    }
    if !legacy.is_empty() {
        if let Value::Object(run) = sections
            .entry("run")
            .or_insert_with(|| Value::Object(Map::new()))
        {
            for (key, value) in legacy {
                run.entry(key).or_insert(value);
            }
        }
    }
    Value::Object(sections)
}

pub(crate) fn validate_config(config: &AppConfig) -> Result<()> {
    let run = &config.run;
    if run.concurrency == 0 {
        return Err(anyhow!("run.concurrency must be at least 1"));
    }
    for (index, delay) in run.delay_seconds.iter().enumerate() {
        if !delay.is_finite() || *delay < 0.0 {
            return Err(anyhow!(
                "run.delay_seconds[{}] must be a finite non-negative number, got {}",
                index,
                delay
            ));
        }
        if *delay > MAX_DURATION_SECS {
            return Err(anyhow!(
                "run.delay_seconds[{}] must be at most {} seconds, got {}",
                index,
                MAX_DURATION_SECS,
                delay
            ));
        }
    }
    if !run.restart_interval_minutes.is_finite() || run.restart_interval_minutes <= 0.0 {
        return Err(anyhow!(
            "run.restart_interval_minutes must be positive, got {}",
            run.restart_interval_minutes
        ));
    }
    if run.restart_interval_minutes * 60.0 > MAX_DURATION_SECS {
        return Err(anyhow!(
            "run.restart_interval_minutes must be at most {} minutes, got {}",
            MAX_DURATION_SECS / 60.0,
            run.restart_interval_minutes
        ));
    }

    let base_url = config.remote.base_url.trim();
    let lowered = base_url.to_ascii_lowercase();
    if !lowered.starts_with("http://") && !lowered.starts_with("https://") {
        return Err(anyhow!(
            "remote.base_url must be an http(s) URL, got {:?}",
            base_url
        ));
    }
    if config.remote.request_timeout_ms == 0 {
        return Err(anyhow!("remote.request_timeout_ms must be positive"));
    }

    let inputs = &config.inputs;
    for (name, path) in [
        ("inputs.identities_path", &inputs.identities_path),
        ("inputs.wallets_path", &inputs.wallets_path),
        ("inputs.user_agents_path", &inputs.user_agents_path),
    ] {
        if path.trim().is_empty() {
            return Err(anyhow!("{} must not be empty", name));
        }
    }
    Ok(())
}
