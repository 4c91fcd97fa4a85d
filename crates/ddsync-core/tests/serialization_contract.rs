//! Contract Test: Attempt Serialization
//!
//! Concurrent `sync` calls on one engine must queue, never interleave.
//! If this test fails, someone has released the state lock mid-attempt.

mod common;

use common::*;
use ddsync_core::{SyncEngine, SyncOutcome};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn concurrent_syncs_do_not_overlap() {
    let ip_source =
        ScriptedIpSource::fixed(ip(5, 6, 7, 8)).with_delay(Duration::from_millis(50));

    let (engine, _event_rx) = SyncEngine::new(
        minimal_config("home.example.com"),
        Box::new(ScriptedIpSource::sharing_counters_with(&ip_source)),
        Box::new(ScriptedLookup::fixed(ip(5, 6, 7, 8))),
        Box::new(RecordingUpdateClient::answering("good")),
    )
    .expect("engine construction succeeds");

    let (first, second) = tokio::join!(engine.sync(false), engine.sync(false));

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(ip_source.fetch_count(), 2, "both attempts ran");
    assert_eq!(ip_source.max_in_flight(), 1, "attempts never overlapped");
}

#[tokio::test]
async fn queued_attempt_sees_previous_state() {
    let lookup = ScriptedLookup::fixed(ip(5, 6, 7, 8));

    let (engine, _event_rx) = SyncEngine::new(
        minimal_config("home.example.com"),
        Box::new(ScriptedIpSource::fixed(ip(5, 6, 7, 8)).with_delay(Duration::from_millis(20))),
        Box::new(ScriptedLookup::sharing_counters_with(&lookup)),
        Box::new(RecordingUpdateClient::answering("good")),
    )
    .expect("engine construction succeeds");
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.sync(false).await })
        })
        .collect();

    for handle in handles {
        let outcome = handle.await.expect("task completes").expect("sync succeeds");
        assert_eq!(outcome, SyncOutcome::Unchanged { ip: ip(5, 6, 7, 8) });
    }

    // Only the first attempt looked the host up, the rest hit the cache
    assert_eq!(lookup.lookup_count(), 1);
}
