//! Contract Test: Host Resolution Tolerance
//!
//! Verifies how failed host lookups flow through whole sync attempts.
//!
//! Constraints verified:
//! - Failures below the limit fall back to the previous address
//! - The failure that reaches the limit ends the attempt
//! - Fail-fast escalates the first failure
//! - A successful lookup resets the failure count

mod common;

use common::*;
use ddsync_core::engine::SyncEvent;
use ddsync_core::state::UNRESOLVED_SENTINEL;
use ddsync_core::{Error, SyncEngine};

#[tokio::test]
async fn tolerates_failures_until_limit() {
    // Scenario: three consecutive DNS failures with a limit of three
    let updater = RecordingUpdateClient::answering("good 5.6.7.8");
    let config = minimal_config("home.example.com").with_unresolved_policy(false, 3);

    let (engine, mut event_rx) = SyncEngine::new(
        config,
        Box::new(ScriptedIpSource::fixed(ip(5, 6, 7, 8))),
        Box::new(ScriptedLookup::failing("SERVFAIL")),
        Box::new(RecordingUpdateClient::sharing_counters_with(&updater)),
    )
    .expect("engine construction succeeds");

    for attempt in 1..=2u32 {
        let outcome = engine
            .sync(false)
            .await
            .unwrap_or_else(|e| panic!("attempt {} should be tolerated: {}", attempt, e));
        assert!(outcome.update().is_some(), "sentinel differs from public IP");

        let state = engine.state().await;
        assert_eq!(state.current_ip, UNRESOLVED_SENTINEL);
        assert_eq!(state.unresolved_host_name_error_count, attempt);
    }

    let err = engine.sync(false).await.expect_err("third failure escalates");
    match err {
        Error::DnsResolution { hostname, .. } => assert_eq!(hostname, "home.example.com"),
        other => panic!("expected DNS resolution error, got {:?}", other),
    }

    assert_eq!(updater.update_count(), 2, "escalated attempt sends nothing");

    let tolerated: Vec<u32> = std::iter::from_fn(|| event_rx.try_recv().ok())
        .filter_map(|event| match event {
            SyncEvent::HostResolutionTolerated { failures, .. } => Some(failures),
            _ => None,
        })
        .collect();
    assert_eq!(tolerated, vec![1, 2]);
}

#[tokio::test]
async fn fail_fast_escalates_first_failure() {
    let updater = RecordingUpdateClient::answering("good");
    let config = minimal_config("home.example.com").with_unresolved_policy(true, 3);

    let (engine, _event_rx) = SyncEngine::new(
        config,
        Box::new(ScriptedIpSource::fixed(ip(5, 6, 7, 8))),
        Box::new(ScriptedLookup::failing("NXDOMAIN")),
        Box::new(RecordingUpdateClient::sharing_counters_with(&updater)),
    )
    .expect("engine construction succeeds");

    let result = engine.sync(true).await;
    assert!(matches!(result, Err(Error::DnsResolution { .. })));
    assert_eq!(updater.update_count(), 0);
}

#[tokio::test]
async fn tolerated_failure_keeps_previous_address() {
    // Cache disabled so every attempt performs a lookup
    let config = minimal_config("home.example.com")
        .with_unresolved_policy(false, 3)
        .with_host_cache(false, 120);
    let lookup = ScriptedLookup::scripted(
        vec![Ok(vec![ip(5, 6, 7, 8)]), Err("timeout".to_string())],
        Ok(vec![ip(5, 6, 7, 8)]),
    );
    let updater = RecordingUpdateClient::answering("good");

    let (engine, _event_rx) = SyncEngine::new(
        config,
        Box::new(ScriptedIpSource::fixed(ip(5, 6, 7, 8))),
        Box::new(ScriptedLookup::sharing_counters_with(&lookup)),
        Box::new(RecordingUpdateClient::sharing_counters_with(&updater)),
    )
    .expect("engine construction succeeds");

    engine.sync(false).await.expect("first attempt resolves");
    engine.sync(false).await.expect("second attempt is tolerated");

    let state = engine.state().await;
    assert_eq!(state.current_ip, ip(5, 6, 7, 8), "previous address is reused");
    assert_eq!(state.unresolved_host_name_error_count, 1);
    assert_eq!(updater.update_count(), 0, "previous address still matches");

    engine.sync(false).await.expect("third attempt resolves");
    assert_eq!(engine.state().await.unresolved_host_name_error_count, 0);
    assert_eq!(lookup.lookup_count(), 3);
}

#[tokio::test]
async fn success_between_failures_resets_count() {
    let config = minimal_config("home.example.com")
        .with_unresolved_policy(false, 2)
        .with_host_cache(false, 120);
    let lookup = ScriptedLookup::scripted(
        vec![
            Err("timeout".to_string()),
            Ok(vec![ip(5, 6, 7, 8)]),
            Err("timeout".to_string()),
        ],
        Err("timeout".to_string()),
    );

    let (engine, _event_rx) = SyncEngine::new(
        config,
        Box::new(ScriptedIpSource::fixed(ip(5, 6, 7, 8))),
        Box::new(lookup),
        Box::new(RecordingUpdateClient::answering("good")),
    )
    .expect("engine construction succeeds");

    assert!(engine.sync(false).await.is_ok());
    assert!(engine.sync(false).await.is_ok());
    assert!(engine.sync(false).await.is_ok(), "count restarted after success");
    assert!(engine.sync(false).await.is_err());
}
