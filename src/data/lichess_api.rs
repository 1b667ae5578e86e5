use anyhow::{anyhow, Context};
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Client, ClientBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::data::types::{
    Leaderboard, LeaderboardPayload, PerfType, Tournament, TournamentListing, UserProfile,
};
use crate::feed::aggregator::TournamentSource;

/// Lichess caps `/player/top/{n}` at 200.
pub const MAX_LEADERBOARD_SIZE: u32 = 200;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("User not found")]
    NotFound,

    #[error("Fetch failed: {0:#}")]
    FetchFailure(#[from] anyhow::Error),
}

pub struct LichessClient {
    client: Client,
    base_url: String,
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,28}[A-Za-z0-9]$").expect("username pattern is valid")
    })
}

/// Every request carries these headers and the configured timeout.
fn client_builder(config: &ApiConfig) -> ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .default_headers(headers)
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout())
}

/// Whether `username` could name a Lichess account at all.
pub fn is_valid_username(username: &str) -> bool {
    username_pattern().is_match(username)
}

impl LichessClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = client_builder(config)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch a user's public profile.
    pub async fn fetch_user_profile(&self, username: &str) -> Result<UserProfile, ApiError> {
        let username = username.trim();
        if !is_valid_username(username) {
            debug!("Rejecting malformed username {:?} without a request", username);
            return Err(ApiError::NotFound);
        }

        let response = self.get(&format!("/user/{}", username)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }

        read_json(response).await
    }

    /// Fetch the top `nb` players for one time control.
    pub async fn fetch_leaderboard(&self, perf: PerfType, nb: u32) -> Result<Leaderboard, ApiError> {
        let clamped = nb.clamp(1, MAX_LEADERBOARD_SIZE);
        if clamped != nb {
            warn!("Leaderboard size {} out of range, using {}", nb, clamped);
        }

        let response = self
            .get(&format!("/player/top/{}/{}", clamped, perf.as_str()))
            .await?;
        let payload: LeaderboardPayload = read_json(response).await?;

        Ok(Leaderboard {
            perf,
            users: payload.into_users(),
        })
    }

    /// Fetch every time control concurrently, in `PerfType::ALL` order.
    pub async fn fetch_all_leaderboards(&self, nb: u32) -> Result<Vec<Leaderboard>, ApiError> {
        futures::future::try_join_all(
            PerfType::ALL
                .into_iter()
                .map(|perf| self.fetch_leaderboard(perf, nb)),
        )
        .await
    }

    /// Fetch the current tournament listing, flattened into a single list.
    pub async fn fetch_tournaments(&self) -> Result<Vec<Tournament>, ApiError> {
        let response = self.get("/tournament").await?;
        let listing: TournamentListing = read_json(response).await?;
        Ok(listing.into_tournaments())
    }

    /// Fetch the API status document.
    pub async fn fetch_status(&self) -> Result<serde_json::Value, ApiError> {
        let response = self.get("/status").await?;
        read_json(response).await
    }

    async fn get(&self, path: &str) -> Result<Response, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", url))?;

        Ok(response)
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let url = response.url().clone();
    if !status.is_success() {
        return Err(anyhow!("{} returned {}", url, status).into());
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response from {}", url))?;

    let parsed = serde_json::from_str(&body)
        .with_context(|| format!("Failed to parse response from {}", url))?;

    Ok(parsed)
}

impl TournamentSource for LichessClient {
    async fn fetch_tournaments(&self) -> Result<Vec<Tournament>, ApiError> {
        LichessClient::fetch_tournaments(self).await
    }
}
