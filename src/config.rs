use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use snafu::ResultExt;

use crate::database::DatabaseConfig;
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::player::PlayerConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// `EnvFilter` directives; falls back to `RUST_LOG`, then `info`.
    pub log_filter: Option<String>,
    #[serde(default = "default_true")]
    pub seed_catalog: bool,

    #[serde(default = "default_debounce", deserialize_with = "human_duration")]
    pub progress_debounce: Duration,
    #[serde(default = "default_max_wait", deserialize_with = "human_duration")]
    pub progress_max_wait: Duration,
    #[serde(default = "default_countdown")]
    pub autoplay_countdown: u32,
    #[serde(default = "default_tick", deserialize_with = "human_duration")]
    pub autoplay_tick: Duration,

    #[serde(flatten)]
    pub database: DatabaseConfig,
}

impl Config {
    pub fn player(&self) -> PlayerConfig {
        PlayerConfig {
            debounce: self.progress_debounce,
            max_wait: self.progress_max_wait,
            countdown_ticks: self.autoplay_countdown,
            countdown_tick: self.autoplay_tick,
        }
    }
}

/// Reads the configuration from the environment. Call `dotenvy::dotenv` first to pick up a `.env` file.
pub fn load() -> Result<Config, ApplicationError> {
    envy::from_env::<Config>().context(ConfigLoadSnafu)
}

fn human_duration<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(&text).map_err(serde::de::Error::custom)
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_true() -> bool {
    true
}

fn default_debounce() -> Duration {
    PlayerConfig::default().debounce
}

fn default_max_wait() -> Duration {
    PlayerConfig::default().max_wait
}

fn default_countdown() -> u32 {
    PlayerConfig::default().countdown_ticks
}

fn default_tick() -> Duration {
    PlayerConfig::default().countdown_tick
}
