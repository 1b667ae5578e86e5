use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lichess sends instants as epoch milliseconds; RFC 3339 strings are accepted too.
mod instant {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    fn convert<E: de::Error>(raw: Raw) -> Result<DateTime<Utc>, E> {
        match raw {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp out of range: {}", ms))),
            Raw::Text(s) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(E::custom),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        convert(Raw::deserialize(deserializer)?)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Raw>::deserialize(deserializer)?
            .map(convert)
            .transpose()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PerfType {
    Bullet,
    #[default]
    Blitz,
    Rapid,
    Classical,
    UltraBullet,
}

impl PerfType {
    pub const ALL: [PerfType; 5] = [
        PerfType::Bullet,
        PerfType::Blitz,
        PerfType::Rapid,
        PerfType::Classical,
        PerfType::UltraBullet,
    ];

    /// Key used in URLs and in `perfs` maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            PerfType::Bullet => "bullet",
            PerfType::Blitz => "blitz",
            PerfType::Rapid => "rapid",
            PerfType::Classical => "classical",
            PerfType::UltraBullet => "ultraBullet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerfType::Bullet => "Bullet",
            PerfType::Blitz => "Blitz",
            PerfType::Rapid => "Rapid",
            PerfType::Classical => "Classical",
            PerfType::UltraBullet => "UltraBullet",
        }
    }
}

impl fmt::Display for PerfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerfType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PerfType::ALL
            .into_iter()
            .find(|perf| perf.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown time control '{}', expected one of: bullet, blitz, rapid, classical, ultraBullet",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Clock {
    /// Initial time in seconds
    #[serde(default)]
    pub limit: u32,
    /// Increment in seconds
    #[serde(default)]
    pub increment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Variant {
    Key(String),
    Detailed {
        key: String,
        #[serde(default)]
        short: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl Variant {
    pub fn key(&self) -> &str {
        match self {
            Variant::Key(key) => key,
            Variant::Detailed { key, .. } => key,
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Key("standard".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub full_name: String,
    #[serde(deserialize_with = "instant::deserialize")]
    pub starts_at: DateTime<Utc>,
    #[serde(deserialize_with = "instant::deserialize")]
    pub finishes_at: DateTime<Utc>,
    #[serde(default)]
    pub nb_players: u32,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub clock: Clock,
    #[serde(default)]
    pub minutes: Option<u32>,
}

impl Tournament {
    /// Player cap, `None` when unbounded (Lichess sends 0 or omits it).
    pub fn capacity(&self) -> Option<u32> {
        self.limit.filter(|&limit| limit > 0)
    }

    pub fn url(&self) -> String {
        format!("https://lichess.org/tournament/{}", self.id)
    }
}

/// `GET /tournament` answers with an object of pre-grouped arrays; a flat array is accepted as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TournamentListing {
    Flat(Vec<Tournament>),
    Grouped {
        #[serde(default)]
        created: Vec<Tournament>,
        #[serde(default)]
        started: Vec<Tournament>,
        #[serde(default)]
        finished: Vec<Tournament>,
    },
}

impl TournamentListing {
    pub(crate) fn into_tournaments(self) -> Vec<Tournament> {
        match self {
            TournamentListing::Flat(tournaments) => tournaments,
            TournamentListing::Grouped { mut created, started, finished } => {
                created.extend(started);
                created.extend(finished);
                created
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerfStats {
    #[serde(default)]
    pub games: u32,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub prog: i32,
    #[serde(default)]
    pub prov: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GameCounts {
    #[serde(default)]
    pub all: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Whitespace-separated URLs
    #[serde(default)]
    pub links: Option<String>,
}

impl ProfileDetails {
    pub fn display_name(&self) -> Option<String> {
        if let Some(name) = self.real_name.as_deref().filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    pub fn country(&self) -> Option<&str> {
        self.flag.as_deref().or(self.country.as_deref())
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref().map(str::trim).filter(|b| !b.is_empty())
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.links.as_deref().unwrap_or_default().split_whitespace()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "instant::deserialize_option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "instant::deserialize_option")]
    pub seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub perfs: BTreeMap<String, PerfStats>,
    #[serde(default)]
    pub count: Option<GameCounts>,
    #[serde(default)]
    pub profile: Option<ProfileDetails>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub nb_followers: u32,
    #[serde(default)]
    pub online: bool,
    /// URL of the game in progress, if any
    #[serde(default)]
    pub playing: Option<String>,
    #[serde(default)]
    pub patron: bool,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub tos_violation: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LeaderboardPerf {
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub progress: i32,
    #[serde(default)]
    pub games: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeaderboardPlayer {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub patron: bool,
    #[serde(default)]
    pub perfs: BTreeMap<String, LeaderboardPerf>,
}

impl LeaderboardPlayer {
    pub fn rating_for(&self, perf: PerfType) -> Option<i32> {
        self.perfs.get(perf.as_str()).and_then(|p| p.rating)
    }

    pub fn games_for(&self, perf: PerfType) -> u32 {
        self.perfs
            .get(perf.as_str())
            .and_then(|p| p.games)
            .unwrap_or(0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LeaderboardPayload {
    Wrapped { users: Vec<LeaderboardPlayer> },
    Flat(Vec<LeaderboardPlayer>),
}

impl LeaderboardPayload {
    pub(crate) fn into_users(self) -> Vec<LeaderboardPlayer> {
        match self {
            LeaderboardPayload::Wrapped { users } => users,
            LeaderboardPayload::Flat(users) => users,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leaderboard {
    pub perf: PerfType,
    pub users: Vec<LeaderboardPlayer>,
}
