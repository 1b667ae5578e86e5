use chrono::{DateTime, Local, Utc};

use crate::data::types::{Clock, Variant};

const MINUTE_MS: i64 = 60 * 1000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Countdown shown on upcoming tournaments, e.g. `Starts in 1d 2h 5m`.
pub fn time_left(starts_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = (starts_at - now).num_milliseconds();
    if diff_ms <= 0 {
        return "Starting now".to_string();
    }

    let total_minutes = diff_ms / MINUTE_MS;
    let total_hours = total_minutes / 60;
    let days = total_hours / 24;
    let hours = total_hours % 24;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(format!("{}m", minutes));
    }

    format!("Starts in {}", parts.join(" "))
}

/// Coarse account age using 365-day years and 30-day months.
pub fn account_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff_ms = (now - created_at).num_milliseconds().abs();
    let days = (diff_ms + DAY_MS - 1) / DAY_MS;
    let years = days / 365;
    let months = (days % 365) / 30;

    if years > 0 {
        let mut age = format!("{} year{}", years, plural(years));
        if months > 0 {
            age.push_str(&format!(", {} month{}", months, plural(months)));
        }
        return age;
    }

    format!("{} month{}", months, plural(months))
}

pub fn last_seen(seen_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - seen_at).num_milliseconds().div_euclid(MINUTE_MS);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if minutes < 1 {
        "Online now".to_string()
    } else if minutes < 60 {
        format!("Last seen {} minute{} ago", minutes, plural(minutes))
    } else if hours < 24 {
        format!("Last seen {} hour{} ago", hours, plural(hours))
    } else if days < 7 {
        format!("Last seen {} day{} ago", days, plural(days))
    } else {
        format!("Last seen on {}", seen_at.format("%Y-%m-%d"))
    }
}

/// `minutes + increment`, with fractional minutes for sub-minute bases (`0.5 + 0`).
pub fn clock(clock: &Clock) -> String {
    format!("{} + {}", clock.limit as f64 / 60.0, clock.increment)
}

pub fn capacity(players: u32, limit: Option<u32>) -> String {
    match limit {
        Some(limit) => format!("{} / {}", players, limit),
        None => format!("{} / ∞", players),
    }
}

pub fn variant(variant: &Variant) -> String {
    if let Variant::Detailed { name: Some(name), .. } = variant {
        return name.clone();
    }

    variant
        .key()
        .split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Rough "top N%" figure against a 3000 ceiling, never below 1%.
pub fn percentile(rating: i32) -> String {
    let top = (100.0 - f64::from(rating) / 3000.0 * 100.0).max(1.0);
    format!("Top {:.1}%", top)
}

pub fn progress(prog: i32) -> Option<String> {
    match prog {
        0 => None,
        p if p > 0 => Some(format!("↑ {}", p)),
        p => Some(format!("↓ {}", p.abs())),
    }
}

pub fn perf_label(key: &str) -> &str {
    match key {
        "bullet" => "Bullet",
        "blitz" => "Blitz",
        "rapid" => "Rapid",
        "classical" => "Classical",
        "ultraBullet" => "UltraBullet",
        "correspondence" => "Correspondence",
        "puzzle" => "Puzzle",
        "chess960" => "Chess960",
        "crazyhouse" => "Crazyhouse",
        "kingOfTheHill" => "King of the Hill",
        "threeCheck" => "Three-check",
        "antichess" => "Antichess",
        "atomic" => "Atomic",
        "horde" => "Horde",
        "racingKings" => "Racing Kings",
        other => other,
    }
}

/// A profile link without its scheme or trailing slash.
pub fn link_label(link: &str) -> &str {
    let link = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    link.strip_suffix('/').unwrap_or(link)
}

pub fn local_time(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_time_left() {
        assert_eq!(time_left(now(), now()), "Starting now");
        assert_eq!(time_left(now() - Duration::minutes(5), now()), "Starting now");
        assert_eq!(time_left(now() + Duration::seconds(30), now()), "Starts in 0m");
        assert_eq!(time_left(now() + Duration::minutes(45), now()), "Starts in 45m");
        assert_eq!(time_left(now() + Duration::hours(2), now()), "Starts in 2h");
        assert_eq!(
            time_left(now() + Duration::days(1) + Duration::hours(3) + Duration::minutes(7), now()),
            "Starts in 1d 3h 7m"
        );
        assert_eq!(time_left(now() + Duration::days(2) + Duration::minutes(1), now()), "Starts in 2d 1m");
    }

    #[test]
    fn test_account_age() {
        assert_eq!(account_age(now() - Duration::days(10), now()), "0 months");
        assert_eq!(account_age(now() - Duration::days(30), now()), "1 month");
        assert_eq!(account_age(now() - Duration::days(95), now()), "3 months");
        assert_eq!(account_age(now() - Duration::days(365), now()), "1 year");
        assert_eq!(account_age(now() - Duration::days(365 + 61), now()), "1 year, 2 months");
        assert_eq!(account_age(now() - Duration::days(3 * 365 + 30), now()), "3 years, 1 month");
    }

    #[test]
    fn test_account_age_rounds_partial_days_up() {
        // 29 days and an hour counts as 30 days
        let created = now() - Duration::days(29) - Duration::hours(1);
        assert_eq!(account_age(created, now()), "1 month");
    }

    #[test]
    fn test_last_seen() {
        assert_eq!(last_seen(now() - Duration::seconds(20), now()), "Online now");
        assert_eq!(last_seen(now() + Duration::minutes(3), now()), "Online now");
        assert_eq!(last_seen(now() - Duration::minutes(1), now()), "Last seen 1 minute ago");
        assert_eq!(last_seen(now() - Duration::minutes(59), now()), "Last seen 59 minutes ago");
        assert_eq!(last_seen(now() - Duration::hours(1), now()), "Last seen 1 hour ago");
        assert_eq!(last_seen(now() - Duration::hours(23), now()), "Last seen 23 hours ago");
        assert_eq!(last_seen(now() - Duration::days(6), now()), "Last seen 6 days ago");
        assert_eq!(last_seen(now() - Duration::days(7), now()), "Last seen on 2024-05-25");
    }

    #[test]
    fn test_clock() {
        assert_eq!(clock(&Clock { limit: 180, increment: 2 }), "3 + 2");
        assert_eq!(clock(&Clock { limit: 30, increment: 0 }), "0.5 + 0");
        assert_eq!(clock(&Clock { limit: 15, increment: 0 }), "0.25 + 0");
        assert_eq!(clock(&Clock { limit: 90, increment: 1 }), "1.5 + 1");
    }

    #[test]
    fn test_capacity() {
        assert_eq!(capacity(12, None), "12 / ∞");
        assert_eq!(capacity(12, Some(50)), "12 / 50");
    }

    #[test]
    fn test_variant() {
        assert_eq!(variant(&Variant::Key("standard".into())), "Standard");
        assert_eq!(variant(&Variant::Key("king-of-the-hill".into())), "King Of The Hill");
        assert_eq!(
            variant(&Variant::Detailed {
                key: "threeCheck".into(),
                short: Some("3check".into()),
                name: Some("Three-check".into()),
            }),
            "Three-check"
        );
        assert_eq!(
            variant(&Variant::Detailed { key: "atomic".into(), short: None, name: None }),
            "Atomic"
        );
    }

    #[test]
    fn test_percentile_and_progress() {
        assert_eq!(percentile(1500), "Top 50.0%");
        assert_eq!(percentile(3200), "Top 1.0%");
        assert_eq!(progress(0), None);
        assert_eq!(progress(12).as_deref(), Some("↑ 12"));
        assert_eq!(progress(-7).as_deref(), Some("↓ 7"));
    }

    #[test]
    fn test_perf_label_falls_back_to_key() {
        assert_eq!(perf_label("blitz"), "Blitz");
        assert_eq!(perf_label("storm"), "storm");
    }

    #[test]
    fn test_link_label() {
        assert_eq!(link_label("https://github.com/ornicar/"), "github.com/ornicar");
        assert_eq!(link_label("http://example.org"), "example.org");
        assert_eq!(link_label("twitch.tv/someone"), "twitch.tv/someone");
    }
}
