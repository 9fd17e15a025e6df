use anyhow::{Context, Result};
use snakebot_config::InputsConfig;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Line-delimited record lists a run works from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLists {
    pub identities: Vec<String>,
    pub wallets: Vec<String>,
    pub proxies: Vec<String>,
    pub user_agents: Vec<String>,
}

impl InputLists {
    /// Reads every list named in the config. The proxy list is optional and
    /// loads as empty when its file is absent; the rest must exist.
    pub fn load(config: &InputsConfig) -> Result<Self> {
        let identities = read_lines(&config.identities_path)?;
        let wallets = read_lines(&config.wallets_path)?;
        let user_agents = read_lines(&config.user_agents_path)?;
        let proxies = read_optional_lines(&config.proxies_path)?;
        let lists = Self {
            identities,
            wallets,
            proxies,
            user_agents,
        };
        info!(
            identities = lists.identities.len(),
            wallets = lists.wallets.len(),
            proxies = lists.proxies.len(),
            user_agents = lists.user_agents.len(),
            "input lists loaded"
        );
        Ok(lists)
    }
}

pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read input list: {}", path.display()))?;
    Ok(parse_lines(&raw))
}

fn read_optional_lines(path: &str) -> Result<Vec<String>> {
    if path.trim().is_empty() {
        return Ok(Vec::new());
    }
    match fs::read_to_string(path) {
        Ok(raw) => Ok(parse_lines(&raw)),
        Err(error) if error.kind() == ErrorKind::NotFound => {
            warn!(path, "optional input list not found, treating as empty");
            Ok(Vec::new())
        }
        Err(error) => {
            Err(error).with_context(|| format!("failed to read input list: {}", path))
        }
    }
}

/// One record per line; surrounding whitespace (including `\r`) is trimmed
/// and blank lines are dropped.
pub fn parse_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_path(name: &str) -> PathBuf {
        let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "snakebot-inputs-{}-{}-{}.txt",
            std::process::id(),
            seq,
            name
        ))
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        fs::write(&path, contents).expect("write temp list");
        path
    }

    #[test]
    fn blank_lines_and_carriage_returns_are_dropped() {
        let lines = parse_lines("query_id=a\r\n\r\n  \nquery_id=b\n\n");
        assert_eq!(lines, vec!["query_id=a", "query_id=b"]);
    }

    #[test]
    fn order_is_preserved() {
        let lines = parse_lines("3\n1\n2");
        assert_eq!(lines, vec!["3", "1", "2"]);
    }

    #[test]
    fn missing_proxy_file_loads_as_empty() {
        let identities = write_temp("identities", "acc1\nacc2\n");
        let wallets = write_temp("wallets", "0xw1\n");
        let user_agents = write_temp("uas", "UA1\n");
        let config = InputsConfig {
            identities_path: identities.display().to_string(),
            wallets_path: wallets.display().to_string(),
            proxies_path: temp_path("missing-proxies").display().to_string(),
            user_agents_path: user_agents.display().to_string(),
        };

        let lists = InputLists::load(&config).expect("lists must load");
        assert_eq!(lists.identities, vec!["acc1", "acc2"]);
        assert_eq!(lists.wallets, vec!["0xw1"]);
        assert!(lists.proxies.is_empty());
        assert_eq!(lists.user_agents, vec!["UA1"]);

        for path in [identities, wallets, user_agents] {
            let _ = fs::remove_file(path);
        }
    }

    #[test]
    fn missing_identity_file_is_an_error() {
        let config = InputsConfig {
            identities_path: temp_path("missing-identities").display().to_string(),
            ..InputsConfig::default()
        };
        let error = InputLists::load(&config).expect_err("missing identities must fail");
        assert!(format!("{:#}", error).contains("failed to read input list"));
    }
}
