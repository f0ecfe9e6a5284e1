//! Cross-process live query tests
//!
//! An API server and a gateway share PostgreSQL and Redis, as they do in
//! production. Writes made over HTTP must reach gateway subscribers through
//! the Redis relay.
//!
//! These tests require:
//! - Running PostgreSQL instance (DATABASE_URL)
//! - Running Redis instance (REDIS_URL)
//!
//! Run with: cargo test -p integration-tests --test live_tests

use std::time::Duration;

use grace_common::StoreBackend;
use integration_tests::{
    assert_json, check_shared_env, fixtures::*, test_config, token, TestGateway, TestServer,
};
use reqwest::StatusCode;
use serde_json::json;

async fn start_pair() -> (TestServer, TestGateway) {
    let server = TestServer::start_with_config(test_config(StoreBackend::Postgres, 11))
        .await
        .expect("Failed to start API");
    let gateway = TestGateway::start_with_config(test_config(StoreBackend::Postgres, 12))
        .await
        .expect("Failed to start gateway");
    // Let the relay finish subscribing before writes start
    tokio::time::sleep(Duration::from_millis(200)).await;
    (server, gateway)
}

#[tokio::test]
async fn test_like_over_http_reaches_gateway() {
    if !check_shared_env() {
        return;
    }
    let (server, gateway) = start_pair().await;
    assert!(gateway.state.relay().is_some());

    let author = token(&unique_user("author"), "Hannah");
    let response = server
        .post_auth("/api/v1/posts", &author, &CreatePostRequest::new("prayer"))
        .await
        .unwrap();
    let post: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client.identify(None).await.unwrap();
    client
        .subscribe(json!({ "query": "like_count", "post_id": post.id }))
        .await
        .unwrap();
    client
        .wait_for("LIKE_COUNT", |d| d["like_count"] == 0)
        .await
        .unwrap();

    let liker = token(&unique_user("a"), "Abel");
    server
        .put_auth(&format!("/api/v1/posts/{}/like", post.id), &liker)
        .await
        .unwrap();

    client
        .wait_for("LIKE_COUNT", |d| d["like_count"] == 1)
        .await
        .unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_comment_over_http_reaches_gateway() {
    if !check_shared_env() {
        return;
    }
    let (server, gateway) = start_pair().await;

    let author = token(&unique_user("author"), "Hannah");
    let response = server
        .post_auth("/api/v1/posts", &author, &CreatePostRequest::new("testimony"))
        .await
        .unwrap();
    let post: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let mut client = gateway.connect().await.unwrap();
    client
        .subscribe(json!({ "query": "comments", "post_id": post.id }))
        .await
        .unwrap();
    client
        .wait_for("COMMENTS_SNAPSHOT", |d| d["comments"] == json!([]))
        .await
        .unwrap();

    let commenter = token(&unique_user("c"), "Caleb");
    server
        .post_auth(
            &format!("/api/v1/posts/{}/comments", post.id),
            &commenter,
            &AddCommentRequest::new("Praying for you"),
        )
        .await
        .unwrap();

    let snapshot = client
        .wait_for("COMMENTS_SNAPSHOT", |d| {
            d["comments"].as_array().is_some_and(|c| !c.is_empty())
        })
        .await
        .unwrap();
    assert_eq!(snapshot["comments"][0]["content"], "Praying for you");
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_new_post_reaches_feed_subscription() {
    if !check_shared_env() {
        return;
    }
    let (server, gateway) = start_pair().await;

    let mut client = gateway.connect().await.unwrap();
    client
        .subscribe(json!({ "query": "posts", "type": "thought" }))
        .await
        .unwrap();
    client.wait_for("POSTS_SNAPSHOT", |_| true).await.unwrap();

    let author = token(&unique_user("author"), "Hannah");
    let response = server
        .post_auth("/api/v1/posts", &author, &CreatePostRequest::new("thought"))
        .await
        .unwrap();
    let post: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();

    let id = post.id.clone();
    client
        .wait_for("POSTS_SNAPSHOT", move |d| d["items"][0]["id"] == id.as_str())
        .await
        .unwrap();
    client.close().await.unwrap();
}
