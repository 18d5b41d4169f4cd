use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    CodeResponse, ReviewReport, ReviewRequest, Statement, StatementBuildResponse,
    StatementLanguageReviewRequest, TemplateKind,
};

/// Problem statement endpoints.
///
/// One method per remote operation; no caching, no retries.
#[async_trait]
pub trait StatementsApi: Send + Sync {
    /// List every statement.
    async fn list_statements(&self) -> Result<Vec<Statement>>;

    /// Statement metadata by id.
    async fn get_statement(&self, id: &str) -> Result<Statement>;

    /// Statement source.
    async fn get_statement_code(&self, id: &str) -> Result<CodeResponse>;

    /// Replace the statement source.
    async fn save_statement_code(&self, id: &str, code: &str) -> Result<CodeResponse>;

    /// Rebuild the statement artifact (PDF).
    async fn build_statement(&self, id: &str) -> Result<StatementBuildResponse>;
}

/// Validator / checker / interactor endpoints.
#[async_trait]
pub trait CodeTemplatesApi: Send + Sync {
    /// Current source for `kind`.
    async fn get_template(&self, kind: TemplateKind) -> Result<CodeResponse>;

    /// Replace the source for `kind`.
    async fn save_template(&self, kind: TemplateKind, code: &str) -> Result<CodeResponse>;
}

/// LLM review endpoints.
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// Full package review (statement + validator + checker or interactor).
    ///
    /// Not subject to the request deadline.
    async fn review(&self, request: &ReviewRequest) -> Result<ReviewReport>;

    /// Language and clarity review of a statement.
    ///
    /// Not subject to the request deadline.
    async fn review_statement_language(
        &self,
        request: &StatementLanguageReviewRequest,
    ) -> Result<ReviewReport>;

    /// Names of the available models.
    async fn list_models(&self) -> Result<Vec<String>>;
}
