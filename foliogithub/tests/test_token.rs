//! Integration tests for the GitHub token check

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use foliogithub::{GithubClient, GithubState, create_api_router};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GithubClient {
    GithubClient::builder("ghp_test")
        .api_base(server.uri())
        .build()
        .unwrap()
}

async fn call_route(state: GithubState) -> (StatusCode, serde_json::Value) {
    let response = create_api_router(state)
        .oneshot(Request::get("/api/test-token").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_valid_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", "Bearer ghp_test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-oauth-scopes", "repo, read:user")
                .set_body_json(json!({"login": "octocat", "id": 1})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(json!({"query": "query { viewer { login } }"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"viewer": {"login": "octocat"}}})),
        )
        .mount(&server)
        .await;

    let (status, body) = call_route(GithubState::new(client_for(&server))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["user"], "octocat");
    assert_eq!(body["tokenWorks"], true);
    assert_eq!(body["graphqlWorks"], true);
    assert_eq!(body["tokenScopes"], "repo, read:user");
    assert_eq!(body["hint"], "All systems operational");
}

#[tokio::test]
async fn test_graphql_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"login": "octocat"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Resource not accessible by integration"}]
        })))
        .mount(&server)
        .await;

    let report = client_for(&server).check_token().await.unwrap();
    assert!(report.success);
    assert_eq!(report.graphql_works, Some(false));
    assert!(report.token_scopes.is_none());
}

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = call_route(GithubState::new(client_for(&server))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": false,
            "error": "GitHub API returned 401",
            "hint": "Token might be invalid or expired"
        })
    );
}

#[tokio::test]
async fn test_missing_token_makes_no_call() {
    let (status, body) = call_route(GithubState::unconfigured()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "GITHUB_TOKEN not found in environment variables");
}

#[tokio::test]
async fn test_transport_error_is_a_failed_report() {
    let client = GithubClient::builder("ghp_test")
        .api_base("http://127.0.0.1:9")
        .build()
        .unwrap();

    let (status, body) = call_route(GithubState::new(client)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("HTTP request failed"));
}
