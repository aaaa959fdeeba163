// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community feed store tests.

use skill_tracker::models::NewPost;
use skill_tracker::store::FeedStats;

mod common;

fn post(title: &str, content: &str) -> NewPost {
    NewPost {
        title: title.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_publish_prepends_and_trims() {
    let (stores, _backend) = common::signed_in_stores().await;
    let feed = &stores.feed;

    feed.publish(&post("First", "Hello")).await.unwrap();
    let second = feed.publish(&post("  Second ", " World ")).await.unwrap();

    assert_eq!(second.title, "Second");
    assert_eq!(second.content, "World");
    let titles: Vec<String> = feed.posts().into_iter().map(|p| p.title).collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_blank_post_is_rejected_without_remote_call() {
    let (stores, backend) = common::signed_in_stores().await;
    let calls = backend.tables.call_count();

    assert!(stores.feed.publish(&post("   ", "body")).await.is_none());

    assert_eq!(backend.tables.call_count(), calls);
    assert!(stores.feed.snapshot().error.is_some());
    assert!(stores.feed.posts().is_empty());
}

#[tokio::test]
async fn test_like_increments_and_updates_stats() {
    let (stores, _backend) = common::signed_in_stores().await;
    let feed = &stores.feed;
    let p = feed.publish(&post("Progress", "Day 10")).await.unwrap();
    feed.publish(&post("Other", "Day 1")).await.unwrap();

    feed.like(&p.id).await.unwrap();
    let liked = feed.like(&p.id).await.unwrap();

    assert_eq!(liked.likes, 2);
    assert_eq!(feed.stats(), FeedStats { posts: 2, likes: 2 });
}

#[tokio::test]
async fn test_like_unknown_post_records_error() {
    let (stores, backend) = common::signed_in_stores().await;
    let calls = backend.tables.call_count();

    assert!(stores.feed.like("nope").await.is_none());

    assert_eq!(backend.tables.call_count(), calls);
    assert!(stores.feed.snapshot().error.unwrap().contains("not found"));
}

#[tokio::test]
async fn test_search_and_delete() {
    let (stores, _backend) = common::signed_in_stores().await;
    let feed = &stores.feed;
    let rust = feed
        .publish(&post("Rust week", "Lifetimes finally clicked"))
        .await
        .unwrap();
    feed.publish(&post("Piano", "Scales")).await.unwrap();

    assert_eq!(feed.search("LIFETIMES").len(), 1);
    assert_eq!(feed.search("").len(), 2);

    assert!(feed.delete_post(&rust.id).await);
    assert!(feed.search("rust").is_empty());

    // Posts are shared, so a fresh fetch sees the remaining one.
    let fetched = feed.fetch_posts().await.unwrap();
    assert_eq!(fetched.len(), 1);
}
