use chrono::{DateTime, Utc};
use std::cmp::Reverse;

use crate::data::types::Tournament;

/// How many finished tournaments are kept after sorting.
pub const DEFAULT_COMPLETED_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Upcoming,
    InProgress,
    Completed,
}

impl Bucket {
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::Upcoming => "Upcoming",
            Bucket::InProgress => "In Progress",
            Bucket::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentBuckets {
    pub upcoming: Vec<Tournament>,
    pub in_progress: Vec<Tournament>,
    pub completed: Vec<Tournament>,
}

impl TournamentBuckets {
    pub fn len(&self) -> usize {
        self.upcoming.len() + self.in_progress.len() + self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Start is checked first, so an inverted interval that has not started yet stays upcoming.
pub fn classify(tournament: &Tournament, now: DateTime<Utc>) -> Bucket {
    if now < tournament.starts_at {
        Bucket::Upcoming
    } else if now <= tournament.finishes_at {
        Bucket::InProgress
    } else {
        Bucket::Completed
    }
}

/// Partition `tournaments` into buckets as of `now`.
///
/// Upcoming and in-progress are ordered by start ascending, completed by start
/// descending and cut to `completed_limit`. Sorts are stable, so equal start
/// times keep their input order.
pub fn categorize(
    tournaments: &[Tournament],
    now: DateTime<Utc>,
    completed_limit: usize,
) -> TournamentBuckets {
    let mut buckets = TournamentBuckets::default();

    for tournament in tournaments {
        let target = match classify(tournament, now) {
            Bucket::Upcoming => &mut buckets.upcoming,
            Bucket::InProgress => &mut buckets.in_progress,
            Bucket::Completed => &mut buckets.completed,
        };
        target.push(tournament.clone());
    }

    buckets.upcoming.sort_by_key(|t| t.starts_at);
    buckets.in_progress.sort_by_key(|t| t.starts_at);
    buckets.completed.sort_by_key(|t| Reverse(t.starts_at));
    buckets.completed.truncate(completed_limit);

    buckets
}
