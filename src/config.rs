use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::data::types::PerfType;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_completed_limit")]
    pub completed_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardConfig {
    #[serde(default)]
    pub default_perf: PerfType,
    #[serde(default = "default_count")]
    pub default_count: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            completed_limit: default_completed_limit(),
        }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_perf: PerfType::default(),
            default_count: default_count(),
        }
    }
}

fn default_base_url() -> String { "https://lichess.org/api".to_string() }
fn default_user_agent() -> String { "Lichess-Dashboard/1.0".to_string() }
fn default_timeout_secs() -> u64 { 10 }
fn default_refresh_interval_secs() -> u64 { 60 }
fn default_completed_limit() -> usize { 10 }
fn default_count() -> u32 { 10 }

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl FeedConfig {
    pub fn refresh_interval(&self) -> Duration {
        // A zero period would make tokio::time::interval panic
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

/// Values read from the environment (and `.env`), applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub lichess_api_url: Option<String>,
    pub lichess_user_agent: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    /// Loads `path` if it exists, otherwise falls back to built-in defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn apply_env(&mut self, env: &EnvConfig) {
        if let Some(url) = &env.lichess_api_url {
            self.api.base_url = url.clone();
        }
        if let Some(agent) = &env.lichess_user_agent {
            self.api.user_agent = agent.clone();
        }
    }
}

impl EnvConfig {
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            lichess_api_url: std::env::var("LICHESS_API_URL").ok(),
            lichess_user_agent: std::env::var("LICHESS_USER_AGENT").ok(),
        }
    }
}
