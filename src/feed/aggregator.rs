use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::data::lichess_api::ApiError;
use crate::data::types::Tournament;
use crate::feed::categorize::{categorize, TournamentBuckets};

/// Anything that can produce the raw tournament list.
pub trait TournamentSource: Send + Sync + 'static {
    fn fetch_tournaments(&self) -> impl Future<Output = Result<Vec<Tournament>, ApiError>> + Send;
}

/// Set when the latest refresh failed. Carries no detail; the cause is traced where it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedFailure;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub buckets: TournamentBuckets,
    /// When `buckets` were last replaced by a successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    pub error: Option<FeedFailure>,
}

/// Fetches tournaments, buckets them and publishes the result.
///
/// The snapshot is only ever written here; readers subscribe through
/// [`TournamentFeed::subscribe`] or [`FeedHandle::subscribe`].
pub struct TournamentFeed<S> {
    source: Arc<S>,
    completed_limit: usize,
    state: watch::Sender<FeedSnapshot>,
}

impl<S: TournamentSource> TournamentFeed<S> {
    pub fn new(source: Arc<S>, completed_limit: usize) -> Self {
        let (state, _) = watch::channel(FeedSnapshot::default());
        Self {
            source,
            completed_limit,
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    pub async fn refresh(&self) -> Result<(), ApiError> {
        self.refresh_at(Utc::now()).await
    }

    /// One fetch-and-classify pass, classifying against `now`.
    ///
    /// On failure the previous buckets are left as they were and only the
    /// error flag is raised.
    pub async fn refresh_at(&self, now: DateTime<Utc>) -> Result<(), ApiError> {
        match self.source.fetch_tournaments().await {
            Ok(tournaments) => {
                let buckets = categorize(&tournaments, now, self.completed_limit);
                debug!(
                    "Classified {} tournaments: {} upcoming, {} in progress, {} completed",
                    tournaments.len(),
                    buckets.upcoming.len(),
                    buckets.in_progress.len(),
                    buckets.completed.len()
                );
                self.state.send_replace(FeedSnapshot {
                    buckets,
                    last_updated: Some(now),
                    error: None,
                });
                Ok(())
            }
            Err(e) => {
                warn!("Error fetching tournaments: {}", e);
                self.state.send_modify(|snapshot| snapshot.error = Some(FeedFailure));
                Err(e)
            }
        }
    }

    /// Refresh now and then every `period` until the returned handle is shut down or dropped.
    pub fn spawn(self, period: Duration) -> FeedHandle {
        let receiver = self.subscribe();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval(period);
            // A slow fetch swallows the ticks that elapse during it
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        tokio::select! {
                            biased;
                            _ = &mut stop_rx => break,
                            _ = self.refresh() => {}
                        }
                    }
                }
            }

            info!("Tournament feed stopped");
        });

        info!("Tournament feed started, refreshing every {:?}", period);

        FeedHandle {
            task: Some(task),
            stop: Some(stop_tx),
            receiver,
        }
    }
}

/// Owns a running feed task. Dropping it aborts the task.
pub struct FeedHandle {
    task: Option<JoinHandle<()>>,
    stop: Option<oneshot::Sender<()>>,
    receiver: watch::Receiver<FeedSnapshot>,
}

impl FeedHandle {
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.receiver.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stop the timer and wait for the task to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                if !e.is_cancelled() {
                    warn!("Tournament feed task failed: {}", e);
                }
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
