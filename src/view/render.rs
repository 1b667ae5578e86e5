use chrono::{DateTime, Utc};

use crate::data::lichess_api::ApiError;
use crate::data::types::{Leaderboard, Tournament, UserProfile};
use crate::feed::aggregator::FeedSnapshot;
use crate::feed::categorize::{classify, Bucket};
use crate::view::format;

pub const TOURNAMENTS_FAILED: &str = "Failed to fetch tournaments. Please try again later.";
pub const LEADERBOARD_FAILED: &str = "Failed to fetch leaderboard. Please try again later.";
pub const PROFILE_FAILED: &str = "Failed to fetch profile. Please check the username and try again.";
pub const STATUS_FAILED: &str = "Failed to fetch API status. Please try again later.";
pub const USER_NOT_FOUND: &str = "User not found";

pub fn profile_error_message(err: &ApiError) -> &'static str {
    match err {
        ApiError::NotFound => USER_NOT_FOUND,
        ApiError::FetchFailure(_) => PROFILE_FAILED,
    }
}

pub fn render_profile(user: &UserProfile, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();

    let mut heading = match &user.title {
        Some(title) => format!("{} {}", title.to_uppercase(), user.username),
        None => user.username.clone(),
    };
    if user.online {
        heading.push_str(" ● online");
    }
    lines.push(heading);

    let badges: Vec<&str> = [(user.patron, "♛ Patron"), (user.verified, "✓ Verified")]
        .into_iter()
        .filter_map(|(set, badge)| set.then_some(badge))
        .collect();
    if !badges.is_empty() {
        lines.push(format!("  {}", badges.join("  ")));
    }

    if let Some(details) = &user.profile {
        if let Some(bio) = details.bio() {
            lines.push(format!("  Bio:          {}", bio));
        }
        if let Some(name) = details.display_name() {
            lines.push(format!("  Name:         {}", name));
        }
        if let Some(country) = details.country() {
            lines.push(format!("  Country:      {}", country));
        }
        if let Some(location) = details.location.as_deref().filter(|l| !l.is_empty()) {
            lines.push(format!("  Location:     {}", location));
        }
        let links: Vec<&str> = details.links().map(format::link_label).collect();
        if !links.is_empty() {
            lines.push(format!("  Links:        {}", links.join(", ")));
        }
    }

    let games = user.count.as_ref().map_or(0, |c| c.all);
    lines.push(format!("  Games played: {}", games));
    lines.push(format!("  Followers:    {}", user.nb_followers));

    if let Some(created_at) = user.created_at {
        lines.push(format!(
            "  Member since: {} ({} ago)",
            created_at.format("%Y-%m-%d"),
            format::account_age(created_at, now)
        ));
    }
    if let Some(seen_at) = user.seen_at {
        let mut activity = format::last_seen(seen_at, now);
        if user.playing.is_some() {
            activity.push_str(" (Currently playing)");
        }
        lines.push(format!("  Activity:     {}", activity));
    }
    if user.disabled {
        lines.push("  Account closed".to_string());
    }
    if user.tos_violation {
        lines.push("  Account flagged for terms of service violation".to_string());
    }

    let rated: Vec<_> = user
        .perfs
        .iter()
        .filter_map(|(key, stats)| stats.rating.map(|rating| (key, stats, rating)))
        .collect();
    if !rated.is_empty() {
        lines.push(String::new());
        lines.push("  Ratings".to_string());
        for (key, stats, rating) in rated {
            let provisional = if stats.prov { "?" } else { "" };
            let mut line = format!(
                "    {:<16}{:>5}{:<1}",
                format::perf_label(key),
                rating,
                provisional
            );
            if let Some(progress) = format::progress(stats.prog) {
                line.push_str(&format!("  {:<6}", progress));
            } else {
                line.push_str(&format!("  {:<6}", ""));
            }
            line.push_str(&format!(
                "  {} games  {}",
                stats.games,
                format::percentile(rating)
            ));
            lines.push(line);
        }
    }

    if let Some(url) = &user.url {
        lines.push(String::new());
        lines.push(format!("  {}", url));
    }

    lines.join("\n")
}

pub fn render_leaderboard(board: &Leaderboard) -> String {
    let mut lines = vec![
        format!("{} Leaderboard", board.perf.label()),
        format!("  {:>4}  {:<24}{:<6}{:>7}{:>8}", "Rank", "Player", "Title", "Rating", "Games"),
    ];

    for (index, player) in board.users.iter().enumerate() {
        let rating = player
            .rating_for(board.perf)
            .map_or_else(|| "N/A".to_string(), |r| r.to_string());
        let mut name = player.username.clone();
        if player.patron {
            name.push_str(" ♛");
        }
        if player.online {
            name.push_str(" ●");
        }
        lines.push(format!(
            "  {:>4}  {:<24}{:<6}{:>7}{:>8}",
            index + 1,
            name,
            player.title.as_deref().map(str::to_uppercase).unwrap_or_default(),
            rating,
            player.games_for(board.perf)
        ));
    }

    if board.users.is_empty() {
        lines.push("  No players".to_string());
    }

    lines.join("\n")
}

fn render_tournament(tournament: &Tournament, now: DateTime<Utc>) -> Vec<String> {
    let bucket = classify(tournament, now);
    let mut lines = vec![
        format!("  {} [{}]", tournament.full_name, bucket.label()),
        format!(
            "    Time control: {} | Players: {} | Variant: {}",
            format::clock(&tournament.clock),
            format::capacity(tournament.nb_players, tournament.capacity()),
            format::variant(&tournament.variant)
        ),
    ];

    let mut schedule = format!("    Starts: {}", format::local_time(tournament.starts_at));
    if let Some(minutes) = tournament.minutes {
        schedule.push_str(&format!(" | Duration: {} minutes", minutes));
    }
    lines.push(schedule);

    if bucket == Bucket::Upcoming {
        lines.push(format!("    {}", format::time_left(tournament.starts_at, now)));
    }
    lines.push(format!("    Join: {}", tournament.url()));

    lines
}

fn render_section(
    title: &str,
    tournaments: &[Tournament],
    now: DateTime<Utc>,
    lines: &mut Vec<String>,
) {
    lines.push(format!("== {} ({}) ==", title, tournaments.len()));
    if tournaments.is_empty() {
        lines.push("  No tournaments".to_string());
    }
    for tournament in tournaments {
        lines.extend(render_tournament(tournament, now));
    }
    lines.push(String::new());
}

pub fn render_tournaments(snapshot: &FeedSnapshot, now: DateTime<Utc>) -> String {
    let mut lines = vec!["Chess Tournaments".to_string()];

    if snapshot.error.is_some() {
        lines.push(TOURNAMENTS_FAILED.to_string());
    }
    match snapshot.last_updated {
        Some(updated) => lines.push(format!("Updated {}", format::local_time(updated))),
        None if snapshot.error.is_none() => lines.push("Loading tournaments...".to_string()),
        None => {}
    }
    lines.push(String::new());

    let buckets = &snapshot.buckets;
    render_section(Bucket::InProgress.label(), &buckets.in_progress, now, &mut lines);
    render_section(Bucket::Upcoming.label(), &buckets.upcoming, now, &mut lines);
    render_section(Bucket::Completed.label(), &buckets.completed, now, &mut lines);

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{
        Clock, GameCounts, LeaderboardPerf, LeaderboardPlayer, PerfStats, PerfType,
        ProfileDetails, Variant,
    };
    use crate::feed::aggregator::FeedFailure;
    use crate::feed::categorize::categorize;
    use anyhow::anyhow;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn tournament(id: &str, start_min: i64, finish_min: i64) -> Tournament {
        Tournament {
            id: id.to_string(),
            full_name: format!("{} Arena", id),
            starts_at: now() + Duration::minutes(start_min),
            finishes_at: now() + Duration::minutes(finish_min),
            nb_players: 7,
            limit: Some(0),
            variant: Variant::Key("crazyhouse".to_string()),
            clock: Clock { limit: 60, increment: 1 },
            minutes: Some((finish_min - start_min) as u32),
        }
    }

    #[test]
    fn test_profile_error_messages() {
        assert_eq!(profile_error_message(&ApiError::NotFound), "User not found");
        assert_eq!(
            profile_error_message(&ApiError::FetchFailure(anyhow!("timeout"))),
            PROFILE_FAILED
        );
    }

    #[test]
    fn test_render_profile() {
        let mut perfs = BTreeMap::new();
        perfs.insert(
            "blitz".to_string(),
            PerfStats { games: 300, rating: Some(2100), prog: 14, prov: false },
        );
        perfs.insert("storm".to_string(), PerfStats::default());

        let user = UserProfile {
            id: "someone".to_string(),
            username: "Someone".to_string(),
            title: Some("fm".to_string()),
            created_at: Some(now() - Duration::days(400)),
            seen_at: Some(now() - Duration::hours(3)),
            perfs,
            count: Some(GameCounts { all: 1234 }),
            profile: None,
            url: Some("https://lichess.org/@/Someone".to_string()),
            nb_followers: 0,
            online: false,
            playing: None,
            patron: false,
            verified: false,
            disabled: false,
            tos_violation: false,
        };

        let text = render_profile(&user, now());
        assert!(text.starts_with("FM Someone"));
        assert!(text.contains("Games played: 1234"));
        assert!(text.contains("(1 year, 1 month ago)"));
        assert!(text.contains("Last seen 3 hours ago"));
        assert!(text.contains("Blitz"));
        assert!(text.contains("↑ 14"));
        assert!(text.contains("Followers:    0"));
        assert!(!text.contains("storm"));
        assert!(!text.contains("online"));
        assert!(!text.contains("Patron"));
        assert!(!text.contains("Currently playing"));
        assert!(!text.contains("Bio:"));
        assert!(!text.contains("Links:"));
    }

    #[test]
    fn test_render_profile_presence_badges_and_details() {
        let user = UserProfile {
            id: "someone".to_string(),
            username: "Someone".to_string(),
            title: None,
            created_at: None,
            seen_at: Some(now()),
            perfs: BTreeMap::new(),
            count: None,
            profile: Some(ProfileDetails {
                bio: Some("Endgame enjoyer".to_string()),
                links: Some("https://github.com/someone/ https://twitch.tv/someone".to_string()),
                ..ProfileDetails::default()
            }),
            url: None,
            nb_followers: 4321,
            online: true,
            playing: Some("https://lichess.org/abcdefgh".to_string()),
            patron: true,
            verified: true,
            disabled: false,
            tos_violation: false,
        };

        let text = render_profile(&user, now());
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "Someone ● online");
        assert_eq!(rows[1], "  ♛ Patron  ✓ Verified");
        assert!(text.contains("Bio:          Endgame enjoyer"));
        assert!(text.contains("Links:        github.com/someone, twitch.tv/someone"));
        assert!(text.contains("Followers:    4321"));
        assert!(text.contains("Online now (Currently playing)"));
    }

    #[test]
    fn test_render_leaderboard_defaults() {
        let mut perfs = BTreeMap::new();
        perfs.insert(
            "bullet".to_string(),
            LeaderboardPerf { rating: Some(3200), progress: 3, games: None },
        );
        let board = Leaderboard {
            perf: PerfType::Bullet,
            users: vec![
                LeaderboardPlayer {
                    id: "a".to_string(),
                    username: "Alpha".to_string(),
                    title: Some("gm".to_string()),
                    online: true,
                    patron: true,
                    perfs,
                },
                LeaderboardPlayer {
                    id: "b".to_string(),
                    username: "Bravo".to_string(),
                    title: None,
                    online: false,
                    patron: false,
                    perfs: BTreeMap::new(),
                },
            ],
        };

        let text = render_leaderboard(&board);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "Bullet Leaderboard");
        assert!(rows[2].contains("Alpha") && rows[2].contains("GM") && rows[2].contains("3200"));
        assert!(rows[2].contains("Alpha ♛ ●"));
        assert!(rows[3].contains("Bravo") && rows[3].contains("N/A"));
        assert!(!rows[3].contains('♛') && !rows[3].contains('●'));
        assert!(rows[3].trim_end().ends_with('0'));
    }

    #[test]
    fn test_render_tournaments_sections() {
        let input = vec![
            tournament("live", -10, 50),
            tournament("soon", 90, 150),
            tournament("done", -200, -100),
        ];
        let snapshot = FeedSnapshot {
            buckets: categorize(&input, now(), 10),
            last_updated: Some(now()),
            error: None,
        };

        let text = render_tournaments(&snapshot, now());
        let live = text.find("== In Progress (1) ==").unwrap();
        let upcoming = text.find("== Upcoming (1) ==").unwrap();
        let completed = text.find("== Completed (1) ==").unwrap();
        assert!(live < upcoming && upcoming < completed);

        assert!(text.contains("live Arena [In Progress]"));
        assert!(text.contains("Starts in 1h 30m"));
        assert!(text.contains("1 + 1"));
        assert!(text.contains("7 / ∞"));
        assert!(text.contains("Crazyhouse"));
        assert!(text.contains("Duration: 60 minutes"));
        assert!(text.contains("https://lichess.org/tournament/done"));
        assert!(!text.contains(TOURNAMENTS_FAILED));
    }

    #[test]
    fn test_render_tournaments_with_error_keeps_buckets() {
        let snapshot = FeedSnapshot {
            buckets: categorize(&[tournament("kept", -10, 50)], now(), 10),
            last_updated: Some(now() - Duration::minutes(1)),
            error: Some(FeedFailure),
        };

        let text = render_tournaments(&snapshot, now());
        assert!(text.contains(TOURNAMENTS_FAILED));
        assert!(text.contains("kept Arena"));
    }

    #[test]
    fn test_render_tournaments_before_first_fetch() {
        let text = render_tournaments(&FeedSnapshot::default(), now());
        assert!(text.contains("Loading tournaments..."));
        assert!(text.contains("== Completed (0) =="));
    }
}
