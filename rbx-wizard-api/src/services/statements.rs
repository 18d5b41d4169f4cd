use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::http_client::{ApiClient, RequestOptions};
use crate::traits::StatementsApi;
use crate::types::{
    CodeResponse, SaveCodeRequest, Statement, StatementBuildResponse, StatementsResponse,
};
use crate::utils::log_sanitizer::describe_source;

/// Statement endpoints.
#[derive(Debug, Clone)]
pub struct StatementsService {
    client: ApiClient,
}

impl StatementsService {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

/// `/statement/{id}` with the id percent-encoded as one path segment.
fn statement_path(id: &str, suffix: &str) -> String {
    format!("/statement/{}{suffix}", urlencoding::encode(id))
}

#[async_trait]
impl StatementsApi for StatementsService {
    async fn list_statements(&self) -> Result<Vec<Statement>> {
        let response: StatementsResponse = self.client.get_json("/statements").await?;
        Ok(response.statements)
    }

    async fn get_statement(&self, id: &str) -> Result<Statement> {
        self.client.get_json(&statement_path(id, "")).await
    }

    async fn get_statement_code(&self, id: &str) -> Result<CodeResponse> {
        self.client.get_json(&statement_path(id, "/code")).await
    }

    async fn save_statement_code(&self, id: &str, code: &str) -> Result<CodeResponse> {
        log::debug!("Saving statement {id} ({})", describe_source(code));
        let body = SaveCodeRequest {
            code: code.to_string(),
        };
        self.client
            .send_json(Method::PUT, &statement_path(id, "/code"), &body)
            .await
    }

    async fn build_statement(&self, id: &str) -> Result<StatementBuildResponse> {
        let path = statement_path(id, "/build");
        log::info!("Building statement {id}");
        self.client
            .request(Method::POST, &path, RequestOptions::new())
            .await?
            .into_json(&path)
    }
}
