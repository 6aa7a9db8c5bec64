//! Session lifecycle.
//!
//! A session is created by [`SessionController::start`] and lives until the
//! next start or [`SessionController::stop`]. The controller is the single
//! owner of the session state; the live sync task only reaches it through
//! the shared handle and only while its session token is still current.
//!
//! ```text
//! Idle ──start──▶ Loading ──▶ Empty
//!                         ├─▶ Historic
//!                         └─▶ Live ──(midnight)──▶ Historic
//! ```
//!
//! Every start first releases the previous session: the live task is
//! cancelled, the chart instance destroyed, series and aggregates dropped and
//! the readings panel cleared. A failed fetch therefore leaves the
//! controller `Idle` with nothing drawn.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use co2dash_types::{Channel, DayKey, Record, SeriesPoint, format_timestamp};

use crate::aggregate::{Aggregates, format_co2, format_temperature};
use crate::chart::{AxisConfig, ChartRenderer};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::live::{LiveSyncEngine, LiveSyncHandle};
use crate::selector::DaySelector;
use crate::store::{ALL_RECORDS, RecordStore};

/// Polling cadence of the live sync task.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Status line shown when a day has no records.
pub const NO_DATA_MESSAGE: &str = "No data available";

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session. Initial state, and the state after a failed start.
    Idle,
    /// Waiting for the day's records.
    Loading,
    /// The day has no records. Nothing is drawn.
    Empty,
    /// A completed day; no further updates.
    Historic,
    /// Today; new records are polled for.
    Live,
}

/// Update mode of a populated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Historic,
    Live,
}

/// Everything loaded for the selected day.
///
/// `co2` and `temperature` are index-aligned and ascending in time.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub selected_day: DayKey,
    pub mode: Mode,
    /// High-watermark used to request only newer records.
    pub last_seen_id: i64,
    pub co2: Vec<SeriesPoint>,
    pub temperature: Vec<SeriesPoint>,
    pub aggregates: Aggregates,
    /// Most recent record received.
    pub latest: Record,
}

/// Points appended by one live update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Increment {
    pub co2: Vec<SeriesPoint>,
    pub temperature: Vec<SeriesPoint>,
}

impl Increment {
    pub fn len(&self) -> usize {
        self.co2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.co2.is_empty()
    }
}

impl SessionState {
    /// Build the session from a full day's records. `None` when empty.
    pub fn from_records(day: DayKey, mode: Mode, mut records: Vec<Record>) -> Option<Self> {
        records.sort_by_key(|r| r.id);
        let latest = records.last()?.clone();
        let co2: Vec<SeriesPoint> = records.iter().map(|r| r.point(Channel::Co2)).collect();
        let temperature: Vec<SeriesPoint> = records
            .iter()
            .map(|r| r.point(Channel::Temperature))
            .collect();
        let aggregates = Aggregates::compute(&co2, &temperature)?;

        Some(Self {
            selected_day: day,
            mode,
            last_seen_id: latest.id,
            co2,
            temperature,
            aggregates,
            latest,
        })
    }

    /// Append records newer than the high-watermark.
    ///
    /// Records at or below `last_seen_id` are out of order and dropped.
    /// Returns the appended points, or `None` when nothing was new.
    pub fn append(&mut self, mut records: Vec<Record>) -> Option<Increment> {
        records.sort_by_key(|r| r.id);
        let received = records.len();
        records.retain(|r| r.id > self.last_seen_id);
        if records.len() < received {
            warn!(
                "Dropped {} record(s) at or below last seen id {}",
                received - records.len(),
                self.last_seen_id
            );
        }

        let latest = records.last()?.clone();
        let increment = Increment {
            co2: records.iter().map(|r| r.point(Channel::Co2)).collect(),
            temperature: records
                .iter()
                .map(|r| r.point(Channel::Temperature))
                .collect(),
        };

        self.co2.extend_from_slice(&increment.co2);
        self.temperature.extend_from_slice(&increment.temperature);
        self.last_seen_id = latest.id;
        self.latest = latest;
        if let Some(aggregates) = Aggregates::compute(&self.co2, &self.temperature) {
            self.aggregates = aggregates;
        }

        Some(increment)
    }

    /// Number of points per channel.
    pub fn len(&self) -> usize {
        self.co2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.co2.is_empty()
    }
}

/// The text displays next to the chart. All fields `None` means hidden.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReadingsPanel {
    pub status: Option<String>,
    /// Latest reading, shown while live.
    pub current: Option<Record>,
    pub aggregates: Option<Aggregates>,
}

impl ReadingsPanel {
    /// Panel for a day without records.
    pub fn no_data() -> Self {
        Self {
            status: Some(NO_DATA_MESSAGE.to_string()),
            ..Self::default()
        }
    }

    /// Panel describing a populated session.
    pub fn for_session(state: &SessionState) -> Self {
        match state.mode {
            Mode::Live => Self {
                status: None,
                current: Some(state.latest.clone()),
                aggregates: Some(state.aggregates),
            },
            Mode::Historic => Self {
                status: Some(format!("Selected day: {}", state.selected_day)),
                current: None,
                aggregates: Some(state.aggregates),
            },
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.status.is_none() && self.current.is_none() && self.aggregates.is_none()
    }

    /// The visible lines, top to bottom.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(status) = &self.status {
            lines.push(status.clone());
        }
        if let Some(r) = &self.current {
            lines.push(format!(
                "Current: {}  CO2 {}  Temperature {}",
                format_timestamp(r.time),
                format_co2(r.co2),
                format_temperature(r.temperature)
            ));
        }
        if let Some(aggregates) = &self.aggregates {
            lines.extend(aggregates.lines());
        }
        lines
    }
}

/// State reachable from both the controller and the live task.
pub(crate) struct Shared<R> {
    /// Incremented on every release; work tagged with an older value is stale.
    pub(crate) token: u64,
    pub(crate) phase: SessionPhase,
    pub(crate) session: Option<SessionState>,
    pub(crate) renderer: R,
    pub(crate) chart_active: bool,
    pub(crate) panel: watch::Sender<ReadingsPanel>,
}

impl<R> Shared<R> {
    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.token == token
    }
}

/// Tunables for sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Interval between live sync requests. Default: 5 seconds.
    pub poll_interval: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SessionOptions {
    /// Create options with a specific poll interval.
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    /// Validate the options and return an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Orchestrates start, teardown and the live sync task.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use co2dash_core::{RecordingRenderer, SessionController, SessionPhase};
/// use co2dash_core::client::StoreClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(StoreClient::new("http://localhost/co2")?);
/// let mut controller = SessionController::new(store, RecordingRenderer::new());
///
/// match controller.start("2024-01-02".parse()?).await? {
///     SessionPhase::Empty => println!("No data available"),
///     phase => println!("{:?}: {:?}", phase, controller.panel().lines()),
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionController<S: ?Sized, R> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    options: SessionOptions,
    shared: Arc<Mutex<Shared<R>>>,
    panel_rx: watch::Receiver<ReadingsPanel>,
    live: Option<LiveSyncHandle>,
}

impl<S, R> SessionController<S, R>
where
    S: RecordStore + ?Sized + 'static,
    R: ChartRenderer,
{
    /// Create an idle controller using the system clock and default options.
    pub fn new(store: Arc<S>, renderer: R) -> Self {
        let (panel_tx, panel_rx) = watch::channel(ReadingsPanel::default());
        Self {
            store,
            clock: Arc::new(SystemClock),
            options: SessionOptions::default(),
            shared: Arc::new(Mutex::new(Shared {
                token: 0,
                phase: SessionPhase::Idle,
                session: None,
                renderer,
                chart_active: false,
                panel: panel_tx,
            })),
            panel_rx,
            live: None,
        }
    }

    /// Use another source of "today".
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use custom options.
    #[must_use]
    pub fn options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// The store sessions are loaded from.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Start a session for the selector's day (or the newest day).
    pub async fn start_selected(&mut self, selector: &DaySelector) -> Result<SessionPhase> {
        let day = selector.selected_or_newest()?;
        self.start(day).await
    }

    /// Release the current session and load `day`.
    ///
    /// Returns the phase entered. On invalid options or a store failure the
    /// error is returned and the controller stays `Idle`.
    pub async fn start(&mut self, day: DayKey) -> Result<SessionPhase> {
        let token = self.release().await;
        self.options.validate()?;
        self.shared.lock().await.phase = SessionPhase::Loading;
        info!("Starting session for {} (token {})", day, token);

        let records = match self.store.fetch_day_records(day, ALL_RECORDS).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load records for {}: {}", day, e);
                let mut shared = self.shared.lock().await;
                if shared.is_current(token) {
                    shared.phase = SessionPhase::Idle;
                }
                return Err(e);
            }
        };

        let mode = if day == self.clock.today() {
            Mode::Live
        } else {
            Mode::Historic
        };

        let phase = {
            let mut shared = self.shared.lock().await;
            if !shared.is_current(token) {
                return Err(Error::Superseded);
            }

            let Some(state) = SessionState::from_records(day, mode, records) else {
                info!("No records for {}", day);
                shared.phase = SessionPhase::Empty;
                shared.panel.send_replace(ReadingsPanel::no_data());
                return Ok(SessionPhase::Empty);
            };

            shared
                .renderer
                .reinitialize(&state.co2, &state.temperature, &AxisConfig::for_day(day));
            shared.chart_active = true;
            shared.panel.send_replace(ReadingsPanel::for_session(&state));

            let phase = match mode {
                Mode::Live => SessionPhase::Live,
                Mode::Historic => SessionPhase::Historic,
            };
            info!(
                "Loaded {} point(s) for {} (last id {}), {:?}",
                state.len(),
                day,
                state.last_seen_id,
                phase
            );
            shared.session = Some(state);
            shared.phase = phase;
            phase
        };

        if phase == SessionPhase::Live {
            let engine = LiveSyncEngine::new(
                Arc::clone(&self.store),
                Arc::clone(&self.shared),
                Arc::clone(&self.clock),
                token,
                day,
                self.options.poll_interval,
            );
            self.live = Some(engine.spawn());
        }

        Ok(phase)
    }

    /// Release the current session without starting another.
    pub async fn stop(&mut self) {
        self.release().await;
    }

    /// Cancel the live task, destroy the chart and clear all session state.
    /// Returns the token of the next session.
    async fn release(&mut self) -> u64 {
        if let Some(live) = self.live.take() {
            live.cancel();
        }

        let mut shared = self.shared.lock().await;
        shared.token += 1;
        if shared.chart_active {
            shared.renderer.destroy();
            shared.chart_active = false;
        }
        if let Some(previous) = shared.session.take() {
            debug!("Released session for {}", previous.selected_day);
        }
        shared.phase = SessionPhase::Idle;
        shared.panel.send_replace(ReadingsPanel::default());
        shared.token
    }

    /// Current phase.
    pub async fn phase(&self) -> SessionPhase {
        self.shared.lock().await.phase
    }

    /// Copy of the current session state, if populated.
    pub async fn snapshot(&self) -> Option<SessionState> {
        self.shared.lock().await.session.clone()
    }

    /// Current readings panel.
    pub fn panel(&self) -> ReadingsPanel {
        self.panel_rx.borrow().clone()
    }

    /// Receive every readings panel update.
    pub fn subscribe(&self) -> watch::Receiver<ReadingsPanel> {
        self.panel_rx.clone()
    }

    /// Stream of readings panel changes, starting with the next one.
    ///
    /// Intermediate values may be skipped if the consumer falls behind; the
    /// latest panel is always delivered.
    pub fn panel_updates(&self) -> BoxStream<'static, ReadingsPanel> {
        let mut rx = self.panel_rx.clone();
        rx.mark_unchanged();
        stream::unfold(rx, |mut rx| async move {
            rx.changed().await.ok()?;
            let panel = rx.borrow_and_update().clone();
            Some((panel, rx))
        })
        .boxed()
    }

    /// Whether a live sync task is running.
    pub fn is_syncing(&self) -> bool {
        self.live.as_ref().is_some_and(LiveSyncHandle::is_active)
    }
}
