use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub system: SystemConfig,
    pub run: RunConfig,
    pub inputs: InputsConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub env: String,
    pub log_level: String,
    pub log_json: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            env: "dev".to_string(),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

/// Cycle behaviour. The camelCase aliases accept the legacy JSON key names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(alias = "howManyAccountsRunInOneTime")]
    pub concurrency: usize,
    #[serde(alias = "rotateProxy")]
    pub rotate_proxy: bool,
    #[serde(alias = "doTasks")]
    pub do_tasks: bool,
    #[serde(alias = "playGames")]
    pub play_games: bool,
    /// `[after each task, after the game]`, in seconds.
    #[serde(alias = "delayEachAccount")]
    pub delay_seconds: [f64; 2],
    #[serde(alias = "timeToRestartAllAccounts")]
    pub restart_interval_minutes: f64,
    /// 0 means run forever.
    pub max_cycles: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            rotate_proxy: false,
            do_tasks: true,
            play_games: true,
            delay_seconds: [1.0, 1.0],
            restart_interval_minutes: 60.0,
            max_cycles: 0,
        }
    }
}

impl RunConfig {
    pub fn task_delay(&self) -> Duration {
        seconds_to_duration(self.delay_seconds[0])
    }

    pub fn game_delay(&self) -> Duration {
        seconds_to_duration(self.delay_seconds[1])
    }

    pub fn restart_interval(&self) -> Duration {
        seconds_to_duration(self.restart_interval_minutes * 60.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputsConfig {
    pub identities_path: String,
    pub wallets_path: String,
    pub proxies_path: String,
    pub user_agents_path: String,
}

impl Default for InputsConfig {
    fn default() -> Self {
        Self {
            identities_path: "datas.txt".to_string(),
            wallets_path: "wallets.txt".to_string(),
            proxies_path: "proxies.txt".to_string(),
            user_agents_path: "userAgents.txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://snakeshouse.live/api".to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

/// Floor applied to `request_timeout_ms` for every outbound client.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 500;

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(MIN_REQUEST_TIMEOUT_MS))
    }
}

/// Upper bound for every configured delay and interval: one year.
pub const MAX_DURATION_SECS: f64 = 365.0 * 24.0 * 60.0 * 60.0;

fn seconds_to_duration(seconds: f64) -> Duration {
    if seconds.is_nan() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds.min(MAX_DURATION_SECS)).unwrap_or(Duration::ZERO)
}
