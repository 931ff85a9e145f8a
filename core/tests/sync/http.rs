// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! The pipeline against a real HTTP server.

use std::sync::Arc;
use std::time::Duration;

use shiftsync_core::localdb::{FeedPatch, SyncStatus};
use shiftsync_feed::{FetchConfig, HttpFetcher, UrlPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{IcsBuilder, test_env_with};

fn local_policy() -> UrlPolicy {
    UrlPolicy::new(["http"], ["127.0.0.1"])
}

#[tokio::test]
async fn sync_over_http_then_timeout_keeps_records() {
    // Arrange
    let mock_server = MockServer::start().await;
    let body = IcsBuilder::new()
        .event("A", "Early", "20250110T060000Z", "20250110T140000Z")
        .event("B", "Late", "20250111T140000Z", "20250111T220000Z")
        .build();
    Mock::given(method("GET"))
        .and(path("/published/rota"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.clone(), "text/calendar"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/published/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, "text/calendar")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let fetcher =
        HttpFetcher::with_timeout(&FetchConfig::default(), Duration::from_millis(200)).unwrap();
    let env = test_env_with(
        Arc::new(fetcher),
        local_policy(),
        &format!("{}/published/rota", mock_server.uri()),
    )
    .await;

    let counts = env.engine.run_sync(env.feed_id()).await.unwrap();
    assert_eq!(counts.created, 2);
    let stamped = env.reload_feed().await.last_synced_at();

    // Act
    env.engine
        .update_feed(
            env.feed_id(),
            FeedPatch {
                url: Some(format!("{}/published/slow", mock_server.uri())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = env.engine.run_sync(env.feed_id()).await.unwrap_err();

    // Assert
    assert_eq!(err.to_string(), "fetch timeout");
    let entries = env.db().sync_logs.list(env.feed_id(), None).await.unwrap();
    assert_eq!(entries[0].status(), SyncStatus::Error);
    assert_eq!(entries[0].message(), "fetch timeout");
    assert_eq!(entries[1].status(), SyncStatus::Success);
    assert_eq!(env.external_ids().await, vec!["A", "B"]);
    assert_eq!(env.reload_feed().await.last_synced_at(), stamped);
}

#[tokio::test]
async fn sync_over_http_logs_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/published/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let env = test_env_with(
        Arc::new(fetcher),
        local_policy(),
        &format!("{}/published/gone", mock_server.uri()),
    )
    .await;

    let err = env.engine.run_sync(env.feed_id()).await.unwrap_err();

    assert_eq!(err.to_string(), "unexpected HTTP status 404");
    assert_eq!(
        env.db().sync_logs.unread_error_count(env.feed_id()).await.unwrap(),
        1
    );
}
