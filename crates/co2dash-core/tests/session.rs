//! Session lifecycle tests against the in-memory store.
//!
//! Time is paused, so interval-driven behaviour runs instantly:
//! `cargo test --package co2dash-core --test session`

use std::sync::Arc;
use std::time::Duration;

use co2dash_core::{
    Clock, DayCatalog, DayKey, DaySelector, Error, FixedClock, MockStore, MockStoreBuilder,
    Mode, Record, RecordingRenderer, SessionController, SessionOptions, SessionPhase,
};
use co2dash_types::{DayBoundary, parse_timestamp};
use futures::StreamExt;

const POLL: Duration = Duration::from_secs(5);

fn day(s: &str) -> DayKey {
    s.parse().unwrap()
}

fn record(id: i64, time: &str, co2: f64, temperature: f64) -> Record {
    Record {
        id,
        time: parse_timestamp(time).unwrap(),
        co2,
        temperature,
    }
}

/// Records for today (2024-01-03) with ids 10..=12.
fn today_records() -> Vec<Record> {
    vec![
        record(10, "2024-01-03 08:00:00", 450.0, 20.5),
        record(11, "2024-01-03 08:05:00", 620.0, 21.0),
        record(12, "2024-01-03 08:10:00", 580.0, 19.8),
    ]
}

struct Harness {
    store: Arc<MockStore>,
    clock: Arc<FixedClock>,
    renderer: RecordingRenderer,
    controller: SessionController<MockStore, RecordingRenderer>,
}

fn harness(store: MockStore) -> Harness {
    let store = Arc::new(store);
    let clock = Arc::new(FixedClock::new(day("2024-01-03")));
    let renderer = RecordingRenderer::new();
    let controller = SessionController::new(Arc::clone(&store), renderer.clone())
        .clock(Arc::clone(&clock) as Arc<dyn Clock>)
        .options(SessionOptions::with_poll_interval(POLL));
    Harness {
        store,
        clock,
        renderer,
        controller,
    }
}

/// Sleep just past the next `n` ticks.
async fn ticks(n: u32) {
    tokio::time::sleep(POLL * n + Duration::from_millis(100)).await;
}

// =============================================================================
// End-to-end
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_end_to_end_historic_day() {
    let json = r#"[{"id": 5, "time": "2024-01-02 08:00:00", "co2": "420", "temperature": "21.3"}]"#;
    let records: Vec<Record> = serde_json::from_str(json).unwrap();
    let mut h = harness(
        MockStoreBuilder::new()
            .boundary(DayBoundary {
                id: 1,
                time: parse_timestamp("2024-01-01 00:00:00").unwrap(),
            })
            .records(records)
            .build(),
    );

    let catalog = DayCatalog::fetch(h.store.as_ref(), h.clock.as_ref()).await.unwrap();
    let days: Vec<String> = catalog.days().iter().map(ToString::to_string).collect();
    assert_eq!(days, ["2024-01-03", "2024-01-02", "2024-01-01"]);

    let mut selector = DaySelector::new(catalog);
    selector.select_str("2024-01-02").unwrap();
    let phase = h.controller.start_selected(&selector).await.unwrap();
    assert_eq!(phase, SessionPhase::Historic);

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.mode, Mode::Historic);
    assert_eq!(state.last_seen_id, 5);
    assert_eq!(state.aggregates.co2.min, 420.0);
    assert_eq!(state.aggregates.co2.max, 420.0);
    assert_eq!(state.aggregates.temperature.min, 21.3);
    assert_eq!(state.aggregates.temperature.max, 21.3);

    let lines = h.controller.panel().lines();
    assert!(lines.contains(&"Max CO2 concentration: 420ppm".to_string()));
    assert!(lines.contains(&"Min temperature: 21.3°C".to_string()));
    assert!(!h.controller.is_syncing());

    ticks(3).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

// =============================================================================
// Start outcomes
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_start_without_records_is_empty() {
    let mut h = harness(MockStore::new());

    let phase = h.controller.start(day("2024-01-03")).await.unwrap();
    assert_eq!(phase, SessionPhase::Empty);
    assert_eq!(h.controller.phase().await, SessionPhase::Empty);
    assert_eq!(h.controller.panel().lines(), ["No data available"]);
    assert!(h.controller.snapshot().await.is_none());
    assert_eq!(h.renderer.state().created, 0);
    assert!(!h.controller.is_syncing());

    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_today_is_live() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());

    let phase = h.controller.start(day("2024-01-03")).await.unwrap();
    assert_eq!(phase, SessionPhase::Live);

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.last_seen_id, 12);
    assert_eq!(state.aggregates.co2.min, 450.0);
    assert_eq!(state.aggregates.co2.max, 620.0);
    assert_eq!(state.aggregates.temperature.min, 19.8);
    assert_eq!(state.aggregates.temperature.max, 21.0);
    assert!(h.controller.is_syncing());

    let panel = h.controller.panel();
    assert_eq!(panel.current.unwrap().id, 12);
    assert!(panel.status.is_none());

    let instance = h.renderer.state().instance.unwrap();
    assert_eq!(instance.len(), 3);
    assert_eq!(instance.axis().x_min, day("2024-01-03").start());

    ticks(1).await;
    assert_eq!(h.store.incremental_requests(), 1);
    assert_eq!(h.store.requested_watermarks().await, vec![12]);
}

#[tokio::test(start_paused = true)]
async fn test_start_past_day_schedules_no_polling() {
    let mut h = harness(
        MockStoreBuilder::new()
            .record(record(1, "2024-01-01 09:00:00", 700.0, 18.0))
            .record(record(2, "2024-01-01 10:00:00", 400.0, 22.5))
            .build(),
    );

    let phase = h.controller.start(day("2024-01-01")).await.unwrap();
    assert_eq!(phase, SessionPhase::Historic);
    assert_eq!(h.controller.panel().status.as_deref(), Some("Selected day: 2024-01-01"));

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.aggregates.co2.max, 700.0);
    assert_eq!(state.aggregates.temperature.max, 22.5);

    ticks(4).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_start_returns_to_idle() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();
    assert_eq!(h.renderer.state().created, 1);

    h.store.set_should_fail(true, Some("connection refused")).await;
    let err = h.controller.start(day("2024-01-03")).await.unwrap_err();
    assert!(err.is_store_failure());

    assert_eq!(h.controller.phase().await, SessionPhase::Idle);
    assert!(h.controller.snapshot().await.is_none());
    assert!(h.controller.panel().is_hidden());
    assert!(!h.renderer.is_active());
    assert_eq!(h.renderer.state().destroyed, 1);
    assert!(!h.controller.is_syncing());

    let before = h.store.incremental_requests();
    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), before);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_options_still_release_previous_session() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();
    assert!(h.controller.is_syncing());

    h.controller = h
        .controller
        .options(SessionOptions::with_poll_interval(Duration::ZERO));
    let err = h.controller.start(day("2024-01-03")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));

    assert_eq!(h.controller.phase().await, SessionPhase::Idle);
    assert!(h.controller.snapshot().await.is_none());
    assert!(!h.renderer.is_active());
    assert!(!h.controller.is_syncing());
    assert_eq!(h.store.day_requests(), 1);

    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_start_with_nothing_to_select() {
    let mut h = harness(MockStore::new());
    let selector = DaySelector::new(DayCatalog::default());
    let err = h.controller.start_selected(&selector).await.unwrap_err();
    assert!(matches!(err, Error::NoDaySelected));
    assert_eq!(h.store.day_requests(), 0);
}

// =============================================================================
// Live sync
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_increment_changes_nothing() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();
    let before = h.controller.snapshot().await.unwrap();

    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), 2);

    let after = h.controller.snapshot().await.unwrap();
    assert_eq!(after.last_seen_id, before.last_seen_id);
    assert_eq!(after.co2, before.co2);
    assert_eq!(after.temperature, before.temperature);
    assert_eq!(after.aggregates, before.aggregates);
    assert_eq!(h.renderer.state().increments, 0);
}

#[tokio::test(start_paused = true)]
async fn test_increment_appends_in_order() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();

    h.store
        .add_records(vec![
            record(14, "2024-01-03 08:20:00", 990.0, 23.4),
            record(13, "2024-01-03 08:15:00", 400.0, 19.0),
        ])
        .await;
    ticks(1).await;

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.last_seen_id, 14);
    assert_eq!(state.len(), 5);
    let tail: Vec<f64> = state.co2[3..].iter().map(|p| p.y).collect();
    assert_eq!(tail, [400.0, 990.0]);
    assert_eq!(state.temperature[4].y, 23.4);
    assert_eq!(state.aggregates.co2.min, 400.0);
    assert_eq!(state.aggregates.co2.max, 990.0);
    assert_eq!(state.aggregates.temperature.min, 19.0);

    let renderer = h.renderer.state();
    assert_eq!(renderer.created, 1);
    assert_eq!(renderer.increments, 1);
    assert_eq!(renderer.instance.unwrap().len(), 5);

    assert_eq!(h.controller.panel().current.unwrap().id, 14);

    // The next request uses the advanced watermark.
    ticks(1).await;
    assert_eq!(h.store.requested_watermarks().await, vec![12, 14]);
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_is_skipped() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();

    h.store.set_transient_failures(1);
    h.store
        .push_record(record(13, "2024-01-03 08:15:00", 500.0, 20.0))
        .await;

    ticks(1).await;
    assert_eq!(h.controller.snapshot().await.unwrap().last_seen_id, 12);
    assert_eq!(h.controller.phase().await, SessionPhase::Live);

    ticks(1).await;
    assert_eq!(h.controller.snapshot().await.unwrap().last_seen_id, 13);
    assert_eq!(h.store.requested_watermarks().await, vec![12, 12]);
}

#[tokio::test(start_paused = true)]
async fn test_requests_never_overlap() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();
    h.store.set_latency(Duration::from_secs(12));

    // A slow response delays the following ticks instead of stacking requests.
    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(h.store.incremental_requests(), 1);
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.store.incremental_requests(), 2);
}

// =============================================================================
// Restart and teardown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_restart_destroys_previous_chart() {
    let mut h = harness(
        MockStoreBuilder::new()
            .records(today_records())
            .record(record(1, "2024-01-02 12:00:00", 410.0, 21.0))
            .build(),
    );

    h.controller.start(day("2024-01-03")).await.unwrap();
    h.controller.start(day("2024-01-02")).await.unwrap();
    h.controller.start(day("2024-01-03")).await.unwrap();

    let state = h.renderer.state();
    assert_eq!(state.created, 3);
    assert_eq!(state.destroyed, 2);
    assert_eq!(state.instance.unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_switching_away_from_live_stops_polling() {
    let mut h = harness(
        MockStoreBuilder::new()
            .records(today_records())
            .record(record(1, "2024-01-02 12:00:00", 410.0, 21.0))
            .build(),
    );

    h.controller.start(day("2024-01-03")).await.unwrap();
    ticks(1).await;
    assert_eq!(h.store.incremental_requests(), 1);

    h.controller.start(day("2024-01-02")).await.unwrap();
    ticks(3).await;
    assert_eq!(h.store.incremental_requests(), 1);
    assert_eq!(h.controller.snapshot().await.unwrap().selected_day, day("2024-01-02"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() {
    let mut h = harness(
        MockStoreBuilder::new()
            .records(today_records())
            .record(record(1, "2024-01-02 12:00:00", 410.0, 21.0))
            .build(),
    );

    h.controller.start(day("2024-01-03")).await.unwrap();
    h.store.set_latency(Duration::from_secs(3));
    h.store
        .push_record(record(13, "2024-01-03 08:15:00", 1100.0, 30.0))
        .await;

    // The incremental request is in flight from t=5s to t=8s.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(h.store.incremental_requests(), 1);

    h.store.set_latency(Duration::ZERO);
    h.controller.start(day("2024-01-02")).await.unwrap();
    ticks(2).await;

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.selected_day, day("2024-01-02"));
    assert_eq!(state.len(), 1);
    assert_eq!(state.aggregates.co2.max, 410.0);
    assert_eq!(h.renderer.state().increments, 0);
    assert_eq!(h.renderer.state().instance.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_releases_everything() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();

    h.controller.stop().await;
    assert_eq!(h.controller.phase().await, SessionPhase::Idle);
    assert!(h.controller.snapshot().await.is_none());
    assert!(h.controller.panel().is_hidden());
    assert!(!h.renderer.is_active());

    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_midnight_rollover_demotes_to_historic() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();

    h.clock.set(day("2024-01-04"));
    h.store
        .push_record(record(13, "2024-01-04 00:00:05", 999.0, 30.0))
        .await;
    ticks(1).await;

    assert_eq!(h.controller.phase().await, SessionPhase::Historic);
    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.mode, Mode::Historic);
    assert_eq!(state.len(), 3);
    assert_eq!(state.last_seen_id, 12);
    assert_eq!(state.aggregates.co2.max, 620.0);
    assert_eq!(h.controller.panel().status.as_deref(), Some("Selected day: 2024-01-03"));
    assert_eq!(h.renderer.state().increments, 0);
    assert!(!h.controller.is_syncing());

    ticks(2).await;
    assert_eq!(h.store.incremental_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_next_day_records_are_not_appended() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    h.controller.start(day("2024-01-03")).await.unwrap();

    // The store has already crossed midnight; the local clock has not.
    h.store
        .add_records(vec![
            record(13, "2024-01-03 23:59:58", 700.0, 20.0),
            record(14, "2024-01-04 00:00:05", 999.0, 30.0),
        ])
        .await;
    ticks(1).await;

    let state = h.controller.snapshot().await.unwrap();
    assert_eq!(state.mode, Mode::Live);
    assert_eq!(state.len(), 4);
    assert_eq!(state.last_seen_id, 13);
    assert_eq!(state.aggregates.co2.max, 700.0);
    assert_eq!(h.controller.panel().current.unwrap().id, 13);

    let chart = h.renderer.state().instance.unwrap();
    assert_eq!(chart.len(), 4);
    assert!(chart.co2().iter().all(|p| p.x < chart.axis().x_max));
}

#[tokio::test(start_paused = true)]
async fn test_panel_updates_stream() {
    let mut h = harness(MockStoreBuilder::new().records(today_records()).build());
    let mut updates = h.controller.panel_updates();

    h.controller.start(day("2024-01-03")).await.unwrap();
    h.store
        .push_record(record(13, "2024-01-03 08:15:00", 500.0, 20.0))
        .await;
    ticks(1).await;

    let panel = updates.next().await.unwrap();
    assert_eq!(panel.current.unwrap().id, 13);
}
