//! Integration tests for paced beacon playback.
//!
//! All async tests run with paused Tokio time, so sleeps auto-advance and
//! the elapsed virtual time between updates can be asserted exactly.

use std::time::Duration;

use geobeacon_protocol::{EventId, TrackCatalog, TrackPoint};
use geobeacon_tick::{BeaconPlayback, PlaybackConfig, PlaybackMetrics};
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

fn catalog(n: usize) -> TrackCatalog {
    (0..n)
        .map(|i| TrackPoint::new(53.0 + i as f64 * 0.001, 10.0 + i as f64 * 0.001))
        .collect()
}

fn beacon() -> EventId {
    EventId::parse("$beacon:example.org").unwrap()
}

fn playback(n: usize, offset: usize) -> BeaconPlayback {
    BeaconPlayback::new(catalog(n), offset, beacon(), PlaybackConfig::default())
}

// =========================================================================
// PlaybackConfig
// =========================================================================

#[test]
fn test_default_config() {
    let cfg = PlaybackConfig::default();
    assert_eq!(cfg.interval, Duration::from_secs(1));
    assert_eq!(cfg.offset_stride, 25);
}

#[test]
fn test_offset_for_is_index_times_stride() {
    let cfg = PlaybackConfig::default();
    assert_eq!(cfg.offset_for(0), 0);
    assert_eq!(cfg.offset_for(1), 25);
    assert_eq!(cfg.offset_for(4), 100);
}

#[test]
fn test_offset_for_saturates() {
    let cfg = PlaybackConfig::default();
    assert_eq!(cfg.offset_for(usize::MAX), usize::MAX);
}

// =========================================================================
// Ordering and slicing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_yields_slice_in_catalog_order() {
    let track = catalog(30);
    let mut p = BeaconPlayback::new(track.clone(), 25, beacon(), PlaybackConfig::default());
    assert_eq!(p.remaining(), 5);

    let mut indices = Vec::new();
    while let Some(tick) = p.next_update().await {
        let expected = track.get(tick.index).unwrap();
        let uri = format!("geo:{:.6},{:.6};u=10", expected.latitude, expected.longitude);
        assert_eq!(tick.update.uri(), uri);
        indices.push(tick.index);
        p.record_delivery(true);
    }

    assert_eq!(indices, vec![25, 26, 27, 28, 29]);
    assert!(p.is_exhausted());
}

#[tokio::test(start_paused = true)]
async fn test_every_update_references_the_beacon() {
    let mut p = playback(3, 0);

    while let Some(tick) = p.next_update().await {
        assert_eq!(tick.update.beacon_event_id(), &beacon());
    }
    assert_eq!(p.beacon(), &beacon());
}

#[tokio::test(start_paused = true)]
async fn test_sequence_counts_from_zero() {
    let mut p = playback(10, 7);

    let first = p.next_update().await.unwrap();
    let second = p.next_update().await.unwrap();

    assert_eq!((first.index, first.sequence), (7, 0));
    assert_eq!((second.index, second.sequence), (8, 1));
}

#[tokio::test(start_paused = true)]
async fn test_offset_at_end_yields_nothing() {
    let mut p = playback(30, 30);
    assert_eq!(p.remaining(), 0);
    assert!(p.next_update().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_offset_far_past_end_yields_nothing() {
    let mut p = playback(30, 50);
    assert!(p.is_exhausted());
    assert!(p.next_update().await.is_none());
    assert_eq!(p.offset(), 50);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_playback_stays_exhausted() {
    let mut p = playback(1, 0);
    assert!(p.next_update().await.is_some());
    assert!(p.next_update().await.is_none());
    assert!(p.next_update().await.is_none());
}

// =========================================================================
// Pacing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_update_is_immediate() {
    let mut p = playback(5, 0);
    let start = Instant::now();

    p.next_update().await.unwrap();

    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_updates_are_one_interval_apart() {
    let mut p = playback(4, 0);
    let start = Instant::now();

    let mut emitted_at = Vec::new();
    while p.next_update().await.is_some() {
        emitted_at.push(start.elapsed());
        p.record_delivery(true);
    }

    assert_eq!(
        emitted_at,
        vec![
            Duration::ZERO,
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(3),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_no_wait_after_last_update() {
    let mut p = playback(2, 0);
    let start = Instant::now();

    p.next_update().await.unwrap();
    p.record_delivery(true);
    p.next_update().await.unwrap();
    p.record_delivery(true);
    assert!(p.next_update().await.is_none());

    assert_eq!(start.elapsed(), Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_pause_restarts_after_slow_delivery() {
    let mut p = playback(2, 0);
    let start = Instant::now();

    p.next_update().await.unwrap();
    // Delivery took 3 seconds.
    tokio::time::sleep(Duration::from_secs(3)).await;
    p.record_delivery(true);
    p.next_update().await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_custom_interval() {
    let config = PlaybackConfig {
        interval: Duration::from_millis(250),
        ..PlaybackConfig::default()
    };
    let mut p = BeaconPlayback::new(catalog(3), 0, beacon(), config);
    let start = Instant::now();

    while p.next_update().await.is_some() {
        p.record_delivery(true);
    }

    assert_eq!(start.elapsed(), Duration::from_millis(500));
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_metrics_count_deliveries_and_failures() {
    let mut p = playback(5, 0);

    let mut n = 0;
    while p.next_update().await.is_some() {
        p.record_delivery(n % 2 == 0);
        n += 1;
    }

    assert_eq!(
        *p.metrics(),
        PlaybackMetrics {
            emitted: 5,
            delivered: 3,
            failed: 2,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_remaining_counts_down() {
    let mut p = playback(3, 1);
    assert_eq!(p.remaining(), 2);
    p.next_update().await.unwrap();
    assert_eq!(p.remaining(), 1);
    p.next_update().await.unwrap();
    assert_eq!(p.remaining(), 0);
}
