//! Test helpers
//!
//! In-memory mocks of every trait seam plus factories for a wired workbench.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rbx_wizard_api::{
    ApiError, CodeTemplatesApi, Result as ApiResult, ReviewApi, StatementsApi,
};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::{ServiceContext, Workbench};
use crate::traits::{DocumentSaver, InMemoryStateStorage, StateStorage};
use crate::types::{
    CodeResponse, ReviewReport, ReviewRequest, Statement, StatementBuildResponse,
    StatementLanguageReviewRequest, TemplateKind, WorkbenchSettings,
};

fn not_found(path: String) -> ApiError {
    ApiError::HttpStatus {
        path,
        status: 404,
        message: "HTTP Error 404: Not Found".to_string(),
    }
}

// ===== MockStatementsApi =====

#[derive(Default)]
pub struct MockStatementsApi {
    /// name -> (metadata, source)
    statements: RwLock<BTreeMap<String, (Statement, String)>>,
}

impl MockStatementsApi {
    pub async fn insert(&self, name: &str, language: &str, code: &str) {
        self.statements.write().await.insert(
            name.to_string(),
            (Statement::new(name, Some(language)), code.to_string()),
        );
    }

    pub async fn code_of(&self, name: &str) -> Option<String> {
        self.statements
            .read()
            .await
            .get(name)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl StatementsApi for MockStatementsApi {
    async fn list_statements(&self) -> ApiResult<Vec<Statement>> {
        Ok(self
            .statements
            .read()
            .await
            .values()
            .map(|(statement, _)| statement.clone())
            .collect())
    }

    async fn get_statement(&self, id: &str) -> ApiResult<Statement> {
        self.statements
            .read()
            .await
            .get(id)
            .map(|(statement, _)| statement.clone())
            .ok_or_else(|| not_found(format!("/statement/{id}")))
    }

    async fn get_statement_code(&self, id: &str) -> ApiResult<CodeResponse> {
        self.statements
            .read()
            .await
            .get(id)
            .map(|(_, code)| CodeResponse {
                path: format!("statements/{id}.tex"),
                code: code.clone(),
                language: None,
            })
            .ok_or_else(|| not_found(format!("/statement/{id}/code")))
    }

    async fn save_statement_code(&self, id: &str, code: &str) -> ApiResult<CodeResponse> {
        let mut statements = self.statements.write().await;
        let entry = statements
            .get_mut(id)
            .ok_or_else(|| not_found(format!("/statement/{id}/code")))?;
        entry.1 = code.to_string();
        Ok(CodeResponse {
            path: format!("statements/{id}.tex"),
            code: code.to_string(),
            language: None,
        })
    }

    async fn build_statement(&self, id: &str) -> ApiResult<StatementBuildResponse> {
        if !self.statements.read().await.contains_key(id) {
            return Err(not_found(format!("/statement/{id}/build")));
        }
        Ok(StatementBuildResponse {
            path: format!("build/{id}.pdf"),
        })
    }
}

// ===== MockCodeTemplatesApi =====

#[derive(Default)]
pub struct MockCodeTemplatesApi {
    templates: RwLock<HashMap<TemplateKind, String>>,
    saved: RwLock<Vec<(TemplateKind, String)>>,
    get_calls: AtomicUsize,
}

impl MockCodeTemplatesApi {
    pub async fn set(&self, kind: TemplateKind, code: &str) {
        self.templates.write().await.insert(kind, code.to_string());
    }

    /// Every successful save, in order.
    pub async fn saved(&self) -> Vec<(TemplateKind, String)> {
        self.saved.read().await.clone()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeTemplatesApi for MockCodeTemplatesApi {
    async fn get_template(&self, kind: TemplateKind) -> ApiResult<CodeResponse> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.templates
            .read()
            .await
            .get(&kind)
            .map(|code| CodeResponse {
                path: format!("{kind}.cpp"),
                code: code.clone(),
                language: None,
            })
            .ok_or_else(|| not_found(kind.endpoint().to_string()))
    }

    async fn save_template(&self, kind: TemplateKind, code: &str) -> ApiResult<CodeResponse> {
        self.templates.write().await.insert(kind, code.to_string());
        self.saved.write().await.push((kind, code.to_string()));
        Ok(CodeResponse {
            path: format!("{kind}.cpp"),
            code: code.to_string(),
            language: None,
        })
    }
}

// ===== MockReviewApi =====

pub struct MockReviewApi {
    models: RwLock<Vec<String>>,
    fail_models: AtomicBool,
    report: RwLock<ReviewReport>,
    reviews: RwLock<Vec<ReviewRequest>>,
    statement_reviews: RwLock<Vec<StatementLanguageReviewRequest>>,
}

impl Default for MockReviewApi {
    fn default() -> Self {
        Self {
            models: RwLock::new(vec!["gpt-4o".to_string()]),
            fail_models: AtomicBool::new(false),
            report: RwLock::new(ReviewReport::Markdown("No issues.".to_string())),
            reviews: RwLock::new(Vec::new()),
            statement_reviews: RwLock::new(Vec::new()),
        }
    }
}

impl MockReviewApi {
    pub async fn set_models(&self, models: &[&str]) {
        *self.models.write().await = models.iter().map(ToString::to_string).collect();
    }

    pub fn fail_models(&self, fail: bool) {
        self.fail_models.store(fail, Ordering::SeqCst);
    }

    pub async fn set_report(&self, report: ReviewReport) {
        *self.report.write().await = report;
    }

    pub async fn last_review(&self) -> Option<ReviewRequest> {
        self.reviews.read().await.last().cloned()
    }

    pub async fn last_statement_review(&self) -> Option<StatementLanguageReviewRequest> {
        self.statement_reviews.read().await.last().cloned()
    }
}

#[async_trait]
impl ReviewApi for MockReviewApi {
    async fn review(&self, request: &ReviewRequest) -> ApiResult<ReviewReport> {
        self.reviews.write().await.push(request.clone());
        Ok(self.report.read().await.clone())
    }

    async fn review_statement_language(
        &self,
        request: &StatementLanguageReviewRequest,
    ) -> ApiResult<ReviewReport> {
        self.statement_reviews.write().await.push(request.clone());
        Ok(self.report.read().await.clone())
    }

    async fn list_models(&self) -> ApiResult<Vec<String>> {
        if self.fail_models.load(Ordering::SeqCst) {
            return Err(ApiError::NetworkError {
                path: "/llm/models".to_string(),
                detail: "connection refused".to_string(),
            });
        }
        Ok(self.models.read().await.clone())
    }
}

// ===== FailingStateStorage =====

/// In-memory storage whose writes can be switched to fail.
#[derive(Default)]
pub struct FailingStateStorage {
    inner: InMemoryStateStorage,
    fail_stores: AtomicBool,
}

impl FailingStateStorage {
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StateStorage for FailingStateStorage {
    async fn load(&self, key: &str) -> CoreResult<Option<String>> {
        self.inner.load(key).await
    }

    async fn store(&self, key: &str, value: &str) -> CoreResult<()> {
        if self.fail_stores.load(Ordering::SeqCst) {
            return Err(CoreError::StorageError("disk full".to_string()));
        }
        self.inner.store(key, value).await
    }
}

// ===== RecordingSaver =====

/// Document saver recording every write, with optional latency and failures.
#[derive(Default)]
pub struct RecordingSaver {
    saves: RwLock<Vec<String>>,
    latency: Duration,
    fail: AtomicBool,
    in_flight: AtomicUsize,
    max_concurrent: AtomicUsize,
}

impl RecordingSaver {
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Contents of every successful save, in order.
    pub async fn saves(&self) -> Vec<String> {
        self.saves.read().await.clone()
    }

    /// Highest number of saves observed running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSaver for RecordingSaver {
    async fn save(&self, text: &str) -> CoreResult<()> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(running, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::Api(ApiError::HttpStatus {
                path: "/validator".to_string(),
                status: 500,
                message: "write failed".to_string(),
            }));
        }
        self.saves.write().await.push(text.to_string());
        Ok(())
    }
}

// ===== Factories =====

/// The three backend mocks.
pub fn mock_apis() -> (
    Arc<MockStatementsApi>,
    Arc<MockCodeTemplatesApi>,
    Arc<MockReviewApi>,
) {
    (
        Arc::new(MockStatementsApi::default()),
        Arc::new(MockCodeTemplatesApi::default()),
        Arc::new(MockReviewApi::default()),
    )
}

/// Handles on the mocks behind a test workbench.
pub struct TestMocks {
    pub statements: Arc<MockStatementsApi>,
    pub templates: Arc<MockCodeTemplatesApi>,
    pub review: Arc<MockReviewApi>,
    pub storage: InMemoryStateStorage,
}

/// Create a test `Workbench` over empty mocks and the default columns.
pub async fn create_test_workbench() -> (Workbench, TestMocks) {
    let (statements, templates, review) = mock_apis();
    let storage = InMemoryStateStorage::new();

    let ctx = Arc::new(ServiceContext::new(
        statements.clone(),
        templates.clone(),
        review.clone(),
        Arc::new(storage.clone()),
        WorkbenchSettings::default(),
    ));
    let workbench = Workbench::load(ctx).await;

    (
        workbench,
        TestMocks {
            statements,
            templates,
            review,
            storage,
        },
    )
}
