//! Resource client against an in-process backend.

mod common;

use std::collections::HashMap;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use common::{client_for, spawn_backend};
use rbx_wizard_api::{ApiError, Method, RequestOptions, ResponseBody};
use serde_json::{Value, json};

const SHORT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn json_response_is_parsed() {
    let app = Router::new().route(
        "/statements",
        get(|| async { Json(json!({"statements": [{"name": "main"}]})) }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let body = require_ok!(
        client
            .request(Method::GET, "/statements", RequestOptions::new())
            .await
    );
    assert_eq!(
        body,
        ResponseBody::Json(json!({"statements": [{"name": "main"}]}))
    );
}

#[tokio::test]
async fn text_response_is_returned_raw() {
    let app = Router::new().route(
        "/notes",
        get(|| async { ([(header::CONTENT_TYPE, "text/markdown")], "# Notes") }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let body = require_ok!(
        client
            .request(Method::GET, "/notes", RequestOptions::new())
            .await
    );
    assert_eq!(body, ResponseBody::Text("# Notes".to_string()));
}

#[tokio::test]
async fn query_parameters_are_sent() {
    let app = Router::new().route(
        "/echo",
        get(|Query(params): Query<HashMap<String, String>>| async move { Json(params) }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let options = RequestOptions::new().query("page", 3).query("draft", false);
    let body = require_ok!(client.request(Method::GET, "/echo", options).await);
    assert_eq!(
        body,
        ResponseBody::Json(json!({"page": "3", "draft": "false"}))
    );
}

#[tokio::test]
async fn default_content_type_can_be_overridden() {
    let app = Router::new().route(
        "/headers",
        get(|headers: HeaderMap| async move {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "contentType": content_type }))
        }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let defaulted: Value = require_ok!(client.get_json("/headers").await);
    assert_eq!(defaulted["contentType"], "application/json");

    let options = RequestOptions::new().header("content-type", "text/plain");
    let body = require_ok!(client.request(Method::GET, "/headers", options).await);
    assert_eq!(
        body,
        ResponseBody::Json(json!({"contentType": "text/plain"}))
    );
}

#[tokio::test]
async fn detail_body_becomes_error_message() {
    let app = Router::new().route(
        "/checker",
        get(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"detail": "boom"})),
            )
        }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let err = require_err!(
        client
            .request(Method::GET, "/checker", RequestOptions::new())
            .await
    );
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "boom");
    assert!(!err.is_expected());
}

#[tokio::test]
async fn message_body_becomes_error_message() {
    let app = Router::new().route(
        "/validator",
        get(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"message": "invalid code"})),
            )
        }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let err = require_err!(
        client
            .request(Method::GET, "/validator", RequestOptions::new())
            .await
    );
    assert_eq!(err.message(), "invalid code");
    assert!(err.is_expected());
}

#[tokio::test]
async fn html_error_body_uses_status_line() {
    let app = Router::new().route(
        "/interactor",
        get(|| async { (StatusCode::NOT_FOUND, "<h1>nope</h1>").into_response() }),
    );
    let client = client_for(spawn_backend(app).await, SHORT);

    let err = require_err!(
        client
            .request(Method::GET, "/interactor", RequestOptions::new())
            .await
    );
    assert!(err.is_not_found());
    assert_eq!(err.message(), "HTTP Error 404: Not Found");
}

#[tokio::test]
async fn slow_response_is_a_timeout() {
    let app = Router::new().route(
        "/statements",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"statements": []}))
        }),
    );
    let client = client_for(spawn_backend(app).await, Duration::from_millis(100));

    let err = require_err!(
        client
            .request(Method::GET, "/statements", RequestOptions::new())
            .await
    );
    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    assert!(!matches!(err, ApiError::NetworkError { .. }));
}

#[tokio::test]
async fn opted_out_request_outlives_deadline() {
    let app = Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(300)).await;
            "done"
        }),
    );
    let client = client_for(spawn_backend(app).await, Duration::from_millis(50));

    let body = require_ok!(
        client
            .request(Method::GET, "/slow", RequestOptions::new().no_timeout())
            .await
    );
    assert_eq!(body.into_text(), "done");
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let client = client_for(addr, Duration::from_secs(2));

    let err = require_err!(
        client
            .request(Method::GET, "/statements", RequestOptions::new())
            .await
    );
    assert!(matches!(err, ApiError::NetworkError { .. }), "got {err:?}");
}
