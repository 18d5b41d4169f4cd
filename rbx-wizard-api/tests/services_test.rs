//! Typed services against an in-process backend.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::header;
use axum::routing::{get, post};
use axum::{Json, Router};
use common::{client_for, spawn_backend};
use rbx_wizard_api::{
    CodeTemplatesApi, CodeTemplatesService, LlmService, ReviewApi, ReviewReport, ReviewRequest,
    StatementLanguageReviewRequest, StatementsApi, StatementsService, TemplateKind,
};
use serde_json::{Value, json};

type Saved = Arc<Mutex<Vec<(String, String)>>>;

fn backend(saved: Saved) -> Router {
    Router::new()
        .route(
            "/statements",
            get(|| async {
                Json(json!({"statements": [
                    {"name": "main", "language": "en"},
                    {"name": "pt-br", "language": "pt"}
                ]}))
            }),
        )
        .route(
            "/statement/:id",
            get(|Path(id): Path<String>| async move {
                Json(json!({"name": id, "language": "en"}))
            }),
        )
        .route(
            "/statement/:id/code",
            get(|Path(id): Path<String>| async move {
                Json(json!({"path": format!("statement/{id}.tex"), "code": "\\section{A}"}))
            })
            .put(
                |State(saved): State<Saved>, Path(id): Path<String>, Json(body): Json<Value>| async move {
                    let code = body["code"].as_str().unwrap_or_default().to_string();
                    saved.lock().unwrap().push((id.clone(), code.clone()));
                    Json(json!({"path": format!("statement/{id}.tex"), "code": code}))
                },
            ),
        )
        .route(
            "/statement/:id/build",
            post(|Path(id): Path<String>| async move {
                Json(json!({"path": format!("build/{id}.pdf")}))
            }),
        )
        .route(
            "/checker",
            get(|| async {
                Json(json!({"path": "checker.cpp", "code": "int main(){}", "language": "cpp"}))
            })
            .put(
                |State(saved): State<Saved>, Json(body): Json<Value>| async move {
                    let code = body["code"].as_str().unwrap_or_default().to_string();
                    saved.lock().unwrap().push(("checker".to_string(), code.clone()));
                    Json(json!({"path": "checker.cpp", "code": code}))
                },
            ),
        )
        .route(
            "/llm/review",
            post(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                ([(header::CONTENT_TYPE, "text/plain")], "## Review\nAll good")
            }),
        )
        .route(
            "/llm/review/statement",
            post(|Json(body): Json<Value>| async move {
                Json(Value::String(format!("Reviewed {}", body["language"])))
            }),
        )
        .route(
            "/llm/models",
            get(|| async { Json(json!({"models": ["gpt-4o", "claude-3"]})) }),
        )
        .with_state(saved)
}

#[tokio::test]
async fn statements_round_trip() {
    let saved = Saved::default();
    let client = client_for(spawn_backend(backend(saved.clone())).await, Duration::from_secs(2));
    let service = StatementsService::new(client);

    let list = require_ok!(service.list_statements().await);
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].language.as_deref(), Some("pt"));

    let one = require_ok!(service.get_statement("main").await);
    assert_eq!(one.name, "main");

    let code = require_ok!(service.get_statement_code("main").await);
    assert_eq!(code.path, "statement/main.tex");

    let stored = require_ok!(service.save_statement_code("main", "new body").await);
    assert_eq!(stored.code, "new body");
    assert_eq!(
        saved.lock().unwrap().as_slice(),
        &[("main".to_string(), "new body".to_string())]
    );

    let build = require_ok!(service.build_statement("main").await);
    assert_eq!(build.path, "build/main.pdf");
}

#[tokio::test]
async fn templates_get_and_put() {
    let saved = Saved::default();
    let client = client_for(spawn_backend(backend(saved.clone())).await, Duration::from_secs(2));
    let service = CodeTemplatesService::new(client);

    let checker = require_ok!(service.get_template(TemplateKind::Checker).await);
    assert_eq!(checker.language.as_deref(), Some("cpp"));

    require_ok!(service.save_template(TemplateKind::Checker, "// v2").await);
    assert_eq!(saved.lock().unwrap()[0], ("checker".to_string(), "// v2".to_string()));

    let err = require_err!(service.get_template(TemplateKind::Interactor).await);
    assert!(err.is_not_found());
}

#[tokio::test]
async fn review_is_not_bound_by_deadline() {
    let client = client_for(
        spawn_backend(backend(Saved::default())).await,
        Duration::from_millis(50),
    );
    let service = LlmService::new(client);

    let request = ReviewRequest {
        statement: "Sum two numbers".into(),
        language: "en".into(),
        validator: "// v".into(),
        checker: Some("// c".into()),
        interactor: None,
        model: "gpt-4o".into(),
    };
    let report = require_ok!(service.review(&request).await);
    assert_eq!(report, ReviewReport::Markdown("## Review\nAll good".into()));
}

#[tokio::test]
async fn statement_review_and_models() {
    let client = client_for(
        spawn_backend(backend(Saved::default())).await,
        Duration::from_secs(2),
    );
    let service = LlmService::new(client);

    let request = StatementLanguageReviewRequest {
        statement: "Texto".into(),
        language: "pt".into(),
        model: "claude-3".into(),
    };
    let report = require_ok!(service.review_statement_language(&request).await);
    assert_eq!(report, ReviewReport::Markdown("Reviewed \"pt\"".into()));

    let models = require_ok!(service.list_models().await);
    assert_eq!(models, vec!["gpt-4o".to_string(), "claude-3".to_string()]);
}
