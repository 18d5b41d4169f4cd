use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::http_client::{ApiClient, RequestOptions, ResponseBody};
use crate::traits::ReviewApi;
use crate::types::{ModelsResponse, ReviewReport, ReviewRequest, StatementLanguageReviewRequest};
use crate::utils::log_sanitizer::describe_source;

const REVIEW_PATH: &str = "/llm/review";
const STATEMENT_REVIEW_PATH: &str = "/llm/review/statement";
const MODELS_PATH: &str = "/llm/models";

/// LLM review endpoints.
#[derive(Debug, Clone)]
pub struct LlmService {
    client: ApiClient,
}

impl LlmService {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Reviews can take minutes, so they never use the request deadline.
    async fn post_review<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<ReviewReport> {
        let options = RequestOptions::new().json(body)?.no_timeout();
        let body = self.client.request(Method::POST, path, options).await?;
        Ok(into_report(body))
    }
}

fn into_report(body: ResponseBody) -> ReviewReport {
    match body {
        ResponseBody::Json(Value::String(markdown)) | ResponseBody::Text(markdown) => {
            ReviewReport::Markdown(markdown)
        }
        ResponseBody::Json(other) => ReviewReport::Legacy(other),
    }
}

#[async_trait]
impl ReviewApi for LlmService {
    async fn review(&self, request: &ReviewRequest) -> Result<ReviewReport> {
        log::info!("Requesting package review with model {}", request.model);
        log::debug!(
            "Review inputs: statement {}, validator {}",
            describe_source(&request.statement),
            describe_source(&request.validator)
        );
        self.post_review(REVIEW_PATH, request).await
    }

    async fn review_statement_language(
        &self,
        request: &StatementLanguageReviewRequest,
    ) -> Result<ReviewReport> {
        log::info!(
            "Requesting statement review ({}) with model {}",
            request.language,
            request.model
        );
        self.post_review(STATEMENT_REVIEW_PATH, request).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let response: ModelsResponse = self.client.get_json(MODELS_PATH).await?;
        Ok(response.models)
    }
}
