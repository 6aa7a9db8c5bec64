//! Live sync of today's session.
//!
//! While the selected day is today, a background task asks the store for
//! records newer than the session's high-watermark at a fixed interval and
//! appends them to the open chart in place.
//!
//! The task is stopped via the cancellation token held by
//! [`LiveSyncHandle`]. Requests are issued one at a time and a response is
//! applied only if the task has not been cancelled and its session token is
//! still current, so a response that arrives after a restart is discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use co2dash_types::{DayKey, Record};

use crate::chart::ChartRenderer;
use crate::clock::Clock;
use crate::session::{Mode, ReadingsPanel, SessionPhase, Shared};
use crate::store::RecordStore;

/// Handle to a running live sync task.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct LiveSyncHandle {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

impl LiveSyncHandle {
    /// Stop the task. An in-flight request is abandoned and its response
    /// never applied.
    pub fn cancel(self) {
        self.cancel_token.cancel();
    }

    /// Get a cancellation token that stops the task when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Check if the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Check if the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for LiveSyncHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

enum Tick {
    Applied(usize),
    NoChange,
    Stale,
}

/// Polls for new records on behalf of one session.
pub(crate) struct LiveSyncEngine<S: ?Sized, R> {
    store: Arc<S>,
    shared: Arc<Mutex<Shared<R>>>,
    clock: Arc<dyn Clock>,
    token: u64,
    day: DayKey,
    poll_interval: Duration,
}

impl<S, R> LiveSyncEngine<S, R>
where
    S: RecordStore + ?Sized + 'static,
    R: ChartRenderer,
{
    pub(crate) fn new(
        store: Arc<S>,
        shared: Arc<Mutex<Shared<R>>>,
        clock: Arc<dyn Clock>,
        token: u64,
        day: DayKey,
        poll_interval: Duration,
    ) -> Self {
        Self {
            store,
            shared,
            clock,
            token,
            day,
            poll_interval,
        }
    }

    /// Run the engine on a background task.
    pub(crate) fn spawn(self) -> LiveSyncHandle {
        let cancel_token = CancellationToken::new();
        let task_token = cancel_token.clone();
        let handle = tokio::spawn(async move { self.run(task_token).await });

        LiveSyncHandle {
            handle,
            cancel_token,
        }
    }

    async fn run(self, cancel: CancellationToken) {
        // First request one interval after the session loaded.
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Live sync for {} started (every {:?})",
            self.day, self.poll_interval
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Live sync cancelled, stopping");
                    break;
                }
                _ = ticker.tick() => {}
            }

            if self.clock.today() != self.day {
                self.demote(&cancel).await;
                break;
            }

            let Some(last_seen_id) = self.last_seen_id().await else {
                debug!("Session for {} was released, stopping live sync", self.day);
                break;
            };

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Live sync cancelled during request, stopping");
                    break;
                }
                result = self.store.fetch_incremental(last_seen_id) => result,
            };

            match result {
                Ok(records) => match self.apply(records, &cancel).await {
                    Tick::Applied(n) => debug!("Appended {} record(s) after id {}", n, last_seen_id),
                    Tick::NoChange => debug!("No records after id {}", last_seen_id),
                    Tick::Stale => {
                        debug!("Discarded response for a released session");
                        break;
                    }
                },
                Err(e) => warn!("Live sync request failed, retrying next tick: {}", e),
            }
        }
    }

    async fn last_seen_id(&self) -> Option<i64> {
        let shared = self.shared.lock().await;
        if !shared.is_current(self.token) {
            return None;
        }
        shared
            .session
            .as_ref()
            .filter(|s| s.mode == Mode::Live)
            .map(|s| s.last_seen_id)
    }

    async fn apply(&self, mut records: Vec<Record>, cancel: &CancellationToken) -> Tick {
        let mut guard = self.shared.lock().await;
        if cancel.is_cancelled() || !guard.is_current(self.token) {
            return Tick::Stale;
        }

        // Records past midnight belong to the next day's chart.
        let received = records.len();
        records.retain(|r| self.day.contains(r.time));
        if records.len() < received {
            debug!(
                "Ignored {} record(s) outside {}",
                received - records.len(),
                self.day
            );
        }
        if records.is_empty() {
            return Tick::NoChange;
        }

        let shared = &mut *guard;
        let Some(session) = shared.session.as_mut() else {
            return Tick::Stale;
        };
        let Some(increment) = session.append(records) else {
            return Tick::NoChange;
        };

        shared
            .renderer
            .apply_increment(&increment.co2, &increment.temperature);
        shared.panel.send_replace(ReadingsPanel::for_session(session));
        Tick::Applied(increment.len())
    }

    /// The day has ended: keep the data, stop updating.
    async fn demote(&self, cancel: &CancellationToken) {
        let mut guard = self.shared.lock().await;
        if cancel.is_cancelled() || !guard.is_current(self.token) {
            return;
        }

        let shared = &mut *guard;
        if let Some(session) = shared.session.as_mut() {
            session.mode = Mode::Historic;
            shared.phase = SessionPhase::Historic;
            shared.panel.send_replace(ReadingsPanel::for_session(session));
            info!("{} has ended, session is now historic", self.day);
        }
    }
}
