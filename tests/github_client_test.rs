//! Tests for the GitHub API client against a local mock server
//!
//! These tests exercise the read-path degradation contract (any failure
//! collapses to an empty record set), the issue/PR tagging at ingestion,
//! the token write-access probe and the two-step stale close.

use fleethealth::fleet::actions::close_stale_item;
use fleethealth::fleet::config::RepositoryRef;
use fleethealth::fleet::github::models::ItemKind;
use fleethealth::fleet::github::GithubClient;
use chrono::{Duration, Utc};

fn client_for(server: &mockito::Server, token: Option<&str>) -> GithubClient {
    GithubClient::with_base_url(
        reqwest::Client::new(),
        token.map(String::from),
        server.url(),
    )
}

fn repo() -> RepositoryRef {
    RepositoryRef::new("acme", "engine")
}

#[tokio::test]
async fn test_list_issues_tags_pull_requests_and_sends_auth() {
    let mut server = mockito::Server::new_async().await;
    let now = Utc::now();
    let body = serde_json::json!([
        {
            "number": 10,
            "title": "Actual issue",
            "state": "open",
            "user": {"login": "alice"},
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
            "comments": 2
        },
        {
            "number": 11,
            "title": "Actually a PR",
            "state": "open",
            "user": {"login": "bob"},
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
            "pull_request": {"url": "https://example.invalid/pulls/11"}
        }
    ]);

    let mock = server
        .mock("GET", "/repos/acme/engine/issues")
        .match_query(mockito::Matcher::Any)
        .match_header("authorization", "Bearer test-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = client_for(&server, Some("test-token"));
    let records = client
        .list_issues(&repo(), now - Duration::days(30), 100)
        .await;

    mock.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, ItemKind::Issue);
    assert_eq!(records[0].author, "alice");
    assert_eq!(records[1].kind, ItemKind::PullRequest);
}

async fn stale_page_mock(
    server: &mut mockito::Server,
    repo_path: &str,
    page: &str,
    status: usize,
    body: &serde_json::Value,
) -> mockito::Mock {
    server
        .mock("GET", format!("/repos/{}/issues", repo_path).as_str())
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("labels".into(), "stale".into()),
            mockito::Matcher::UrlEncoded("state".into(), "open".into()),
            mockito::Matcher::UrlEncoded("page".into(), page.into()),
        ]))
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

fn stale_item(number: u64, title: &str, updated_at: &str, pr: bool) -> serde_json::Value {
    let mut item = serde_json::json!({
        "number": number,
        "title": title,
        "state": "open",
        "user": {"login": "alice"},
        "created_at": "2026-05-01T00:00:00Z",
        "updated_at": updated_at,
    });
    if pr {
        item["pull_request"] = serde_json::json!({"url": "https://example.invalid/p"});
    }
    item
}

#[tokio::test]
async fn test_list_stale_items_walks_pages_until_empty() {
    let mut server = mockito::Server::new_async().await;
    let page_one = serde_json::json!([
        stale_item(1, "Old issue", "2026-06-01T00:00:00Z", false),
        stale_item(2, "Old PR", "2026-06-02T00:00:00Z", true),
    ]);
    let empty = serde_json::json!([]);

    let first = stale_page_mock(&mut server, "acme/engine", "1", 200, &page_one).await;
    let second = stale_page_mock(&mut server, "acme/engine", "2", 200, &empty).await;

    let client = client_for(&server, None);
    let records = client.list_stale_items(&repo()).await;

    first.assert_async().await;
    second.assert_async().await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].kind, ItemKind::Issue);
    assert_eq!(records[1].kind, ItemKind::PullRequest);
}

#[tokio::test]
async fn test_list_stale_items_keeps_earlier_pages_on_failure() {
    let mut server = mockito::Server::new_async().await;
    let page_one = serde_json::json!([stale_item(1, "Survivor", "2026-06-01T00:00:00Z", false)]);
    let error = serde_json::json!({"message": "boom"});

    let _first = stale_page_mock(&mut server, "acme/engine", "1", 200, &page_one).await;
    let _second = stale_page_mock(&mut server, "acme/engine", "2", 500, &error).await;

    let client = client_for(&server, None);
    let records = client.list_stale_items(&repo()).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].number, 1);
}

#[tokio::test]
async fn test_fleet_stale_inventory_sorts_newest_first() {
    let mut server = mockito::Server::new_async().await;
    let empty = serde_json::json!([]);
    let engine_page =
        serde_json::json!([stale_item(5, "Older", "2026-06-01T00:00:00Z", false)]);
    let web_page = serde_json::json!([stale_item(9, "Newer", "2026-07-01T00:00:00Z", true)]);

    let _m1 = stale_page_mock(&mut server, "acme/engine", "1", 200, &engine_page).await;
    let _m2 = stale_page_mock(&mut server, "acme/engine", "2", 200, &empty).await;
    let _m3 = stale_page_mock(&mut server, "acme/web", "1", 200, &web_page).await;
    let _m4 = stale_page_mock(&mut server, "acme/web", "2", 200, &empty).await;

    let client = client_for(&server, None);
    let fleet = vec![
        RepositoryRef::new("acme", "engine"),
        RepositoryRef::new("acme", "web"),
    ];
    let items = fleethealth::services::list_stale(&client, &fleet).await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].repository, "acme/web");
    assert_eq!(items[0].record.number, 9);
    assert_eq!(items[1].repository, "acme/engine");
}

#[tokio::test]
async fn test_read_path_failures_degrade_to_empty() {
    let mut server = mockito::Server::new_async().await;

    // 500 on issues, garbage body on pulls
    server
        .mock("GET", "/repos/acme/engine/issues")
        .match_query(mockito::Matcher::Any)
        .with_status(500)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/engine/pulls")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body("not json at all")
        .create_async()
        .await;

    let client = client_for(&server, None);
    let issues = client
        .list_issues(&repo(), Utc::now() - Duration::days(30), 100)
        .await;
    let pulls = client.list_pulls(&repo()).await;

    assert!(issues.is_empty());
    assert!(pulls.is_empty());
}

#[tokio::test]
async fn test_token_probe_reads_scope_header() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/user")
        .with_status(200)
        .with_header("X-OAuth-Scopes", "repo, read:org")
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server, Some("t"));
    assert!(client.probe_token_access().await.has_write_access);
}

#[tokio::test]
async fn test_token_probe_denies_read_only_scopes() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/user")
        .with_status(200)
        .with_header("X-OAuth-Scopes", "read:org, gist")
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server, Some("t"));
    assert!(!client.probe_token_access().await.has_write_access);
}

#[tokio::test]
async fn test_token_probe_without_token_denies() {
    let server = mockito::Server::new_async().await;
    let client = client_for(&server, None);
    // No mock registered: the probe must short-circuit before any request
    assert!(!client.probe_token_access().await.has_write_access);
}

#[tokio::test]
async fn test_close_stale_posts_comment_then_closes() {
    let mut server = mockito::Server::new_async().await;
    let comment = server
        .mock("POST", "/repos/acme/engine/issues/42/comments")
        .match_body(mockito::Matcher::PartialJson(
            serde_json::json!({"body": "closing as stale"}),
        ))
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;
    let close = server
        .mock("PATCH", "/repos/acme/engine/issues/42")
        .match_body(mockito::Matcher::PartialJson(
            serde_json::json!({"state": "closed"}),
        ))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let client = client_for(&server, Some("t"));
    let result = close_stale_item(&client, &repo(), 42, "closing as stale").await;

    assert!(result.is_ok());
    comment.assert_async().await;
    close.assert_async().await;
}

#[tokio::test]
async fn test_close_stale_reports_posted_comment_on_close_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/repos/acme/engine/issues/42/comments")
        .with_status(201)
        .with_body("{}")
        .create_async()
        .await;
    server
        .mock("PATCH", "/repos/acme/engine/issues/42")
        .with_status(403)
        .create_async()
        .await;

    let client = client_for(&server, Some("t"));
    let err = close_stale_item(&client, &repo(), 42, "closing as stale")
        .await
        .unwrap_err();

    assert!(err.comment_posted);
    assert!(err.to_string().contains("duplicate"));
}

#[tokio::test]
async fn test_close_stale_failure_before_comment() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/repos/acme/engine/issues/42/comments")
        .with_status(403)
        .create_async()
        .await;

    let client = client_for(&server, Some("t"));
    let err = close_stale_item(&client, &repo(), 42, "closing as stale")
        .await
        .unwrap_err();

    assert!(!err.comment_posted);
}
