mod env_parsing;
mod loader;
mod schema;

pub use self::loader::{load_from_env_or_default, load_from_path};
pub use self::schema::{
    AppConfig, InputsConfig, RemoteConfig, RunConfig, SystemConfig, MAX_DURATION_SECS,
    MIN_REQUEST_TIMEOUT_MS,
};

pub fn validate(config: &AppConfig) -> anyhow::Result<()> {
    env_parsing::validate_config(config)
}
