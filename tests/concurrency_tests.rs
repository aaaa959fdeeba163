// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Overlapping store operations.
//!
//! Responses are delayed with `MemoryTables::delay_next` so that requests
//! complete in a different order than they were issued.

use chrono::NaiveDate;
use skill_tracker::models::{NewGoal, NewProgressEntry};
use skill_tracker::store::SessionPhase;
use std::time::Duration;

mod common;

fn new_goal(title: &str) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: None,
        target_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        skill_id: None,
        completed: false,
    }
}

#[tokio::test]
async fn test_stale_fetch_result_is_discarded() {
    let (stores, backend) = common::signed_in_stores().await;
    let goals = &stores.goals;

    // First fetch sees no goals but answers late.
    backend.tables.delay_next(Duration::from_millis(200));
    let slow = goals.fetch_goals();

    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        goals.add_goal(new_goal("Added meanwhile")).await.unwrap();
        goals.fetch_goals().await
    };

    let (slow_result, fast_result) = tokio::join!(slow, fast);

    // Each caller gets its own answer...
    assert_eq!(slow_result.unwrap().len(), 0);
    assert_eq!(fast_result.unwrap().len(), 1);
    // ...but only the newest fetch lands in the snapshot.
    let snapshot = goals.snapshot();
    assert_eq!(snapshot.data.len(), 1);
    assert_eq!(snapshot.data[0].title, "Added meanwhile");
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_stale_fetch_failure_is_not_reported() {
    let (stores, backend) = common::signed_in_stores().await;
    let goals = &stores.goals;

    backend.tables.fail_next("old request failed");
    backend.tables.delay_next(Duration::from_millis(200));
    let slow = goals.fetch_goals();
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        goals.fetch_goals().await
    };

    let (slow_result, fast_result) = tokio::join!(slow, fast);
    assert!(slow_result.is_none());
    assert!(fast_result.is_some());
    assert_eq!(goals.snapshot().error, None);
}

#[tokio::test]
async fn test_loading_stays_set_while_fetch_in_flight() {
    let (stores, backend) = common::signed_in_stores().await;
    let goals = &stores.goals;

    backend.tables.delay_next(Duration::from_millis(200));
    let slow = goals.fetch_goals();

    let quick = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        goals.add_goal(new_goal("Quick")).await.unwrap();
        // The add settled, the fetch has not.
        goals.snapshot().loading
    };

    let (_, loading_after_add) = tokio::join!(slow, quick);
    assert!(loading_after_add);
    assert!(!goals.snapshot().loading);
}

#[tokio::test]
async fn test_mutation_does_not_invalidate_fetch() {
    let (stores, backend) = common::signed_in_stores().await;
    let goals = &stores.goals;
    goals.add_goal(new_goal("Existing")).await.unwrap();

    backend.tables.delay_next(Duration::from_millis(100));
    let fetch = goals.fetch_goals();
    let add = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        goals.add_goal(new_goal("Second")).await
    };

    let (fetched, added) = tokio::join!(fetch, add);
    assert!(added.is_some());
    // The fetch was computed before the add; it is still the newest fetch,
    // so its result replaces the snapshot.
    assert_eq!(fetched.unwrap().len(), 1);
    assert_eq!(goals.snapshot().data.len(), 1);
}

#[tokio::test]
async fn test_progress_fetches_are_sequenced_per_skill() {
    let (stores, backend) = common::signed_in_stores().await;
    let skills = &stores.skills;
    let entry = NewProgressEntry {
        skill_id: "skill-a".to_string(),
        date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        progress_value: 60,
        notes: None,
    };

    // Slow fetch of skill-a sees no entries.
    backend.tables.delay_next(Duration::from_millis(200));
    let slow = skills.fetch_progress("skill-a");
    let fast = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        skills.add_progress(&entry).await.unwrap();
        // A fetch of another skill does not supersede skill-a's.
        skills.fetch_progress("skill-b").await.unwrap();
        skills.fetch_progress("skill-a").await.unwrap()
    };

    let (stale, fresh) = tokio::join!(slow, fast);
    assert_eq!(stale.unwrap().len(), 0);
    assert_eq!(fresh.len(), 1);
    assert_eq!(skills.progress_for("skill-a").len(), 1);
    assert!(!skills.progress_snapshot().loading);
}

#[tokio::test]
async fn test_cancelled_operation_clears_loading() {
    let (stores, backend) = common::signed_in_stores().await;
    let goals = &stores.goals;

    backend.tables.delay_next(Duration::from_secs(5));
    let result = tokio::time::timeout(Duration::from_millis(20), goals.fetch_goals()).await;

    assert!(result.is_err());
    let snapshot = goals.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_cancelled_sign_in_restores_phase() {
    let (stores, backend) = common::signed_in_stores().await;
    let session = &stores.session;

    // Credentials are accepted, then the profile load hangs.
    backend.tables.delay_next(Duration::from_secs(5));
    let result = tokio::time::timeout(
        Duration::from_millis(20),
        session.sign_in("user@example.com", "password"),
    )
    .await;

    assert!(result.is_err());
    let snapshot = session.snapshot();
    assert_eq!(snapshot.data.phase, SessionPhase::SignedIn);
    assert!(snapshot.data.identity.is_some());
    assert!(!snapshot.loading);
    assert!(session.is_signed_in());
}

#[tokio::test]
async fn test_cancelled_sign_up_returns_to_signed_out() {
    let backend = common::TestBackend::new();
    let stores = backend.stores();

    backend.tables.delay_next(Duration::from_secs(5));
    let result = tokio::time::timeout(
        Duration::from_millis(20),
        stores.session.sign_up("late@example.com", "pw", "Late"),
    )
    .await;

    assert!(result.is_err());
    let snapshot = stores.session.snapshot();
    assert_eq!(snapshot.data.phase, SessionPhase::SignedOut);
    assert!(!snapshot.loading);
}
