//! API Integration Tests
//!
//! Drive a real HTTP server on an ephemeral port backed by the in-memory
//! store. No external services are needed.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use futures_util::future::join_all;
use integration_tests::{assert_json, assert_status, fixtures::*, token, TestServer};
use reqwest::StatusCode;

async fn create_post(server: &TestServer, token: &str, post_type: &str) -> PostResponse {
    let response = server
        .post_auth("/api/v1/posts", token, &CreatePostRequest::new(post_type))
        .await
        .unwrap();
    assert_json(response, StatusCode::CREATED).await.unwrap()
}

async fn fetch_post(server: &TestServer, id: &str) -> PostResponse {
    let response = server.get(&format!("/api/v1/posts/{id}")).await.unwrap();
    assert_json(response, StatusCode::OK).await.unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_health_ready() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Post Tests
// ============================================================================

#[tokio::test]
async fn test_new_post_heads_the_feed() {
    let server = TestServer::start().await.unwrap();
    let token = token(&unique_user("author"), "Hannah");

    create_post(&server, &token, "prayer").await;
    let request = CreatePostRequest {
        post_type: "testimony".to_string(),
        title: "Healed".to_string(),
        content: "Thankful".to_string(),
        client_token: None,
    };
    let response = server.post_auth("/api/v1/posts", &token, &request).await.unwrap();
    let created: PostResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(created.like_count, 0);
    assert_eq!(created.comment_count, 0);
    assert_eq!(created.author_display_name, "Hannah");

    let response = server.get("/api/v1/posts?type=all").await.unwrap();
    let page: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(page.items[0].id, created.id);
    assert_eq!(page.items[0].title, "Healed");
    assert!(page.next_cursor.is_none());
}

#[tokio::test]
async fn test_feed_type_filter() {
    let server = TestServer::start().await.unwrap();
    let token = token(&unique_user("author"), "Hannah");

    create_post(&server, &token, "prayer").await;
    let thought = create_post(&server, &token, "thought").await;

    let response = server.get("/api/v1/posts?type=thought").await.unwrap();
    let page: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, thought.id);
    assert_eq!(page.items[0].post_type, "thought");
}

#[tokio::test]
async fn test_feed_pagination() {
    let server = TestServer::start().await.unwrap();
    let token = token(&unique_user("author"), "Hannah");

    let mut created = Vec::new();
    for _ in 0..21 {
        created.push(create_post(&server, &token, "prayer").await.id);
    }

    let response = server.get("/api/v1/posts").await.unwrap();
    let first: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(first.items.len(), 20);
    let cursor = first.next_cursor.expect("a second page");

    let response = server
        .get(&format!("/api/v1/posts?cursor={cursor}"))
        .await
        .unwrap();
    let second: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].id, created[0]);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn test_client_token_replay_returns_same_post() {
    let server = TestServer::start().await.unwrap();
    let token = token(&unique_user("author"), "Hannah");
    let retry_key = format!("retry-{}", unique_suffix());

    let first = server
        .post_auth(
            "/api/v1/posts",
            &token,
            &CreatePostRequest::new("thought").with_client_token(retry_key.clone()),
        )
        .await
        .unwrap();
    let first: PostResponse = assert_json(first, StatusCode::CREATED).await.unwrap();

    let again = server
        .post_auth(
            "/api/v1/posts",
            &token,
            &CreatePostRequest::new("thought").with_client_token(retry_key),
        )
        .await
        .unwrap();
    let again: PostResponse = assert_json(again, StatusCode::CREATED).await.unwrap();
    assert_eq!(again.id, first.id);

    let response = server.get("/api/v1/posts").await.unwrap();
    let page: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(page.items.len(), 1);
}

#[tokio::test]
async fn test_empty_title_writes_nothing() {
    let server = TestServer::start().await.unwrap();
    let token = token(&unique_user("author"), "Hannah");
    let mut request = CreatePostRequest::new("prayer");
    request.title = String::new();

    let response = server.post_auth("/api/v1/posts", &token, &request).await.unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error.error.code, "VALIDATION_ERROR");

    let response = server.get("/api/v1/posts").await.unwrap();
    let page: PostPage = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn test_create_requires_identity() {
    let server = TestServer::start().await.unwrap();

    let response = server
        .post("/api/v1/posts", &CreatePostRequest::new("prayer"))
        .await
        .unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

// ============================================================================
// Like Tests
// ============================================================================

#[tokio::test]
async fn test_like_toggle_round_trip() {
    let server = TestServer::start().await.unwrap();
    let author = token(&unique_user("author"), "Hannah");
    let user_a = token(&unique_user("a"), "Abel");
    let post = create_post(&server, &author, "prayer").await;
    let like_path = format!("/api/v1/posts/{}/like", post.id);

    let response = server.put_auth(&like_path, &user_a).await.unwrap();
    let toggled: LikeToggleResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(toggled.liked);
    assert_eq!(toggled.post_id, post.id);
    assert_eq!(fetch_post(&server, &post.id).await.like_count, 1);

    let response = server.put_auth(&like_path, &user_a).await.unwrap();
    let toggled: LikeToggleResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!toggled.liked);
    assert_eq!(fetch_post(&server, &post.id).await.like_count, 0);
}

#[tokio::test]
async fn test_concurrent_likes_from_two_users() {
    let server = TestServer::start().await.unwrap();
    let author = token(&unique_user("author"), "Hannah");
    let post = create_post(&server, &author, "testimony").await;
    let like_path = format!("/api/v1/posts/{}/like", post.id);

    let users = [
        token(&unique_user("a"), "Abel"),
        token(&unique_user("b"), "Bethany"),
    ];
    let responses = join_all(users.iter().map(|t| server.put_auth(&like_path, t))).await;
    for response in responses {
        let toggled: LikeToggleResponse =
            assert_json(response.unwrap(), StatusCode::OK).await.unwrap();
        assert!(toggled.liked);
    }

    assert_eq!(fetch_post(&server, &post.id).await.like_count, 2);
    for user in &users {
        let response = server.get_auth(&like_path, user).await.unwrap();
        let reacted: ReactedResponse = assert_json(response, StatusCode::OK).await.unwrap();
        assert!(reacted.reacted);
    }

    let response = server
        .get(&format!("/api/v1/posts/{}/reactions/count", post.id))
        .await
        .unwrap();
    let count: ReactionCountResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(count.post_id, post.id);
    assert_eq!(count.count, 2);
    assert_eq!(count.like_count, 2);
}

#[tokio::test]
async fn test_has_reacted_anonymous_is_false() {
    let server = TestServer::start().await.unwrap();
    let author = token(&unique_user("author"), "Hannah");
    let post = create_post(&server, &author, "prayer").await;

    let response = server
        .get(&format!("/api/v1/posts/{}/like", post.id))
        .await
        .unwrap();
    let reacted: ReactedResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert!(!reacted.reacted);
}

// ============================================================================
// Comment Tests
// ============================================================================

#[tokio::test]
async fn test_comment_flow() {
    let server = TestServer::start().await.unwrap();
    let author = token(&unique_user("author"), "Hannah");
    let commenter_id = unique_user("c");
    let commenter = token(&commenter_id, "Caleb");
    let post = create_post(&server, &author, "prayer").await;
    let path = format!("/api/v1/posts/{}/comments", post.id);

    let response = server
        .post_auth(&path, &commenter, &AddCommentRequest::new("Praying for you"))
        .await
        .unwrap();
    let comment: CommentResponse = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(comment.post_id, post.id);
    assert_eq!(comment.author_id, commenter_id);

    let response = server.get(&path).await.unwrap();
    let comments: Vec<CommentResponse> = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "Praying for you");

    assert_eq!(fetch_post(&server, &post.id).await.comment_count, 1);
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let server = TestServer::start().await.unwrap();
    let commenter = token(&unique_user("c"), "Caleb");

    let response = server
        .post_auth(
            "/api/v1/posts/123456/comments",
            &commenter,
            &AddCommentRequest::new("Praying for you"),
        )
        .await
        .unwrap();
    let error: ErrorResponse = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert!(!error.error.message.is_empty());
}
