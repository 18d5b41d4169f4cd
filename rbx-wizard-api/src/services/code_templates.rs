use async_trait::async_trait;
use reqwest::Method;

use crate::error::Result;
use crate::http_client::ApiClient;
use crate::traits::CodeTemplatesApi;
use crate::types::{CodeResponse, SaveCodeRequest, TemplateKind};
use crate::utils::log_sanitizer::describe_source;

/// Validator / checker / interactor endpoints.
#[derive(Debug, Clone)]
pub struct CodeTemplatesService {
    client: ApiClient,
}

impl CodeTemplatesService {
    #[must_use]
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CodeTemplatesApi for CodeTemplatesService {
    async fn get_template(&self, kind: TemplateKind) -> Result<CodeResponse> {
        self.client.get_json(kind.endpoint()).await
    }

    async fn save_template(&self, kind: TemplateKind, code: &str) -> Result<CodeResponse> {
        log::debug!("Saving {kind} template ({})", describe_source(code));
        let body = SaveCodeRequest {
            code: code.to_string(),
        };
        self.client
            .send_json(Method::PUT, kind.endpoint(), &body)
            .await
    }
}
