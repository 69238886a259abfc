// SPDX-License-Identifier: MIT

//! Session lifecycle: creation-race resolution, forced sign-out, live
//! mirroring, and the single-writer snapshot discipline.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{go_live, start_engine, test_identity, test_profile, wait_for};
use sultan_session::models::ProfileUpdate;
use sultan_session::{ProfileMutator, ProfileStore, SessionState};

#[tokio::test]
async fn creation_race_resolves_within_ceiling() {
    let session = start_engine(5);
    session.auth.emit_signed_in(test_identity("u1"));

    // Simulate the first-login write landing while the engine is polling
    let store = Arc::clone(&session.store);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        store.create(&test_profile("u1")).await.unwrap();
    });

    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, SessionState::is_active).await;

    assert_eq!(state.profile().unwrap().uid, "u1");
    assert_eq!(session.auth.sign_out_count(), 0);
}

#[tokio::test]
async fn missing_profile_forces_sign_out() {
    let session = start_engine(5);
    session.auth.emit_signed_in(test_identity("ghost"));

    // The profile never appears; the session must end signed-out rather
    // than pending forever
    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, |s| matches!(s, SessionState::SignedOut)).await;

    assert_eq!(state, SessionState::SignedOut);
    assert_eq!(session.auth.sign_out_count(), 1);
}

#[tokio::test]
async fn fatal_store_error_degrades_to_signed_out() {
    let session = start_engine(5);
    session.store.fail_reads(true);
    session.auth.emit_signed_in(test_identity("u1"));

    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, |s| matches!(s, SessionState::SignedOut)).await;

    // A store failure is terminal for the session but is not the forced
    // sign-out path
    assert_eq!(state, SessionState::SignedOut);
    assert_eq!(session.auth.sign_out_count(), 0);
}

#[tokio::test]
async fn live_pushes_replace_snapshot_wholesale() {
    let session = start_engine(5);
    let profile = go_live(&session, "u1").await;
    assert_eq!(profile.points, 1000);

    let update = ProfileUpdate {
        points: Some(1500),
        is_ghost_mode: Some(true),
        ..Default::default()
    };
    session.store.update_fields("u1", &update).await.unwrap();

    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, |s| {
        s.profile().is_some_and(|p| p.points == 1500)
    })
    .await;

    let mirrored = state.profile().unwrap();
    assert!(mirrored.is_ghost_mode);
    assert_eq!(mirrored.level, 1);
}

#[tokio::test]
async fn mutation_is_invisible_until_push_arrives() {
    let session = start_engine(5);
    go_live(&session, "u1").await;

    let mutator = ProfileMutator::new(session.store.clone(), session.handle.state());

    // Delay delivery so the gap between write acceptance and the
    // subscription round-trip is observable
    session.store.hold_pushes();
    mutator.adjust_points(50).await.unwrap();

    // Write accepted, but the snapshot still shows the pre-call value:
    // nothing writes it except the sync task's subscription push
    let before = session.handle.snapshot();
    assert_eq!(before.profile().unwrap().points, 1000);

    session.store.release_pushes().await;
    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, |s| {
        s.profile().is_some_and(|p| p.points == 1050)
    })
    .await;
    assert_eq!(state.profile().unwrap().points, 1050);
}

#[tokio::test]
async fn sign_out_stops_live_mirroring() {
    let session = start_engine(5);
    go_live(&session, "u1").await;

    session.auth.emit_signed_out();
    let mut rx = session.handle.state();
    wait_for(&mut rx, |s| matches!(s, SessionState::SignedOut)).await;

    // A remote write after teardown must not reach the snapshot
    let update = ProfileUpdate {
        points: Some(9999),
        ..Default::default()
    };
    session.store.update_fields("u1", &update).await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(session.handle.snapshot(), SessionState::SignedOut);
}

#[tokio::test]
async fn new_identity_supersedes_live_session() {
    let session = start_engine(5);
    go_live(&session, "u1").await;

    session.store.create(&test_profile("u2")).await.unwrap();
    session.auth.emit_signed_in(test_identity("u2"));

    let mut rx = session.handle.state();
    let state = wait_for(&mut rx, |s| {
        s.profile().is_some_and(|p| p.uid == "u2")
    })
    .await;
    assert_eq!(state.profile().unwrap().uid, "u2");
}
