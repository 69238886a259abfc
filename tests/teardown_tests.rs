// SPDX-License-Identifier: MIT

//! Teardown: exactly-once release, idempotent shutdown, and silence after.

mod common;

use std::time::Duration;

use common::{go_live, start_engine, test_identity, wait_for};
use sultan_session::models::ProfileUpdate;
use sultan_session::{ProfileStore, SessionState};

#[tokio::test]
async fn shutdown_twice_does_not_panic() {
    let session = start_engine(5);
    go_live(&session, "u1").await;

    session.handle.shutdown();
    session.handle.shutdown();
}

#[tokio::test]
async fn no_state_changes_after_shutdown() {
    let session = start_engine(5);
    let profile = go_live(&session, "u1").await;
    assert_eq!(profile.uid, "u1");

    session.handle.shutdown();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let frozen = session.handle.snapshot();

    // Neither remote pushes nor auth transitions may reach the snapshot
    let update = ProfileUpdate {
        points: Some(42),
        ..Default::default()
    };
    session.store.update_fields("u1", &update).await.unwrap();
    session.auth.emit_signed_out();
    session.auth.emit_signed_in(test_identity("u2"));
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(session.handle.snapshot(), frozen);
}

#[tokio::test]
async fn shutdown_during_loading_terminates_cleanly() {
    let session = start_engine(50);
    session.auth.emit_signed_in(test_identity("u1"));

    let mut rx = session.handle.state();
    wait_for(&mut rx, |s| matches!(s, SessionState::Loading(_))).await;

    // Shut down mid-retry; the poll loop must stop without forcing a
    // provider sign-out
    session.handle.shutdown();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.auth.sign_out_count(), 0);
}

#[tokio::test]
async fn handle_drop_tears_down() {
    let session = start_engine(5);
    go_live(&session, "u1").await;

    let auth = session.auth.clone();
    let store = session.store.clone();
    drop(session);
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Emissions into a dropped session go nowhere; this must not panic
    auth.emit_signed_out();
    let update = ProfileUpdate {
        points: Some(7),
        ..Default::default()
    };
    store.update_fields("u1", &update).await.unwrap();
}
