//! Assistant columns: model selection and LLM reviews

use std::collections::BTreeSet;
use std::sync::Arc;

use rbx_wizard_api::ApiError;

use crate::error::{CoreError, CoreResult};
use crate::services::{ColumnRegistry, Loadable, RemoteResources, ServiceContext};
use crate::types::{
    report_to_markdown, AssistantConfig, AssistantMode, AssistantPatch, CodeResponse, ColumnKind,
    ReviewRequest, StatementLanguageReviewRequest, TemplateKind,
};

/// Offered when the backend cannot list its models.
pub const FALLBACK_MODELS: [&str; 3] = ["gpt-4o", "claude-3", "llama-3"];

/// Language assumed for statements that do not declare one.
const DEFAULT_STATEMENT_LANGUAGE: &str = "en";

/// Whether the problem is judged by a checker or talks to an interactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblemMode {
    Standard,
    Interactive,
}

pub struct ReviewService {
    ctx: Arc<ServiceContext>,
    registry: Arc<ColumnRegistry>,
    resources: Arc<RemoteResources>,
}

impl ReviewService {
    pub fn new(
        ctx: Arc<ServiceContext>,
        registry: Arc<ColumnRegistry>,
        resources: Arc<RemoteResources>,
    ) -> Self {
        Self {
            ctx,
            registry,
            resources,
        }
    }

    /// Models to offer, falling back to [`FALLBACK_MODELS`].
    pub async fn available_models(&self) -> Vec<String> {
        match self.resources.models.load(Some(&())).await {
            Loadable::Ready(models) if !models.is_empty() => models.as_ref().clone(),
            _ => FALLBACK_MODELS.iter().map(ToString::to_string).collect(),
        }
    }

    pub async fn select_model(&self, column_id: &str, model: impl Into<String>) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                AssistantPatch {
                    selected_model: Some(model.into()),
                    ..AssistantPatch::default()
                },
            )
            .await
    }

    /// Leave the report view.
    pub async fn clear_review(&self, column_id: &str) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                AssistantPatch {
                    assistant_mode: Some(None),
                    review_results: Some(None),
                    ..AssistantPatch::default()
                },
            )
            .await
    }

    /// The one statement selected across all statement columns.
    pub fn selected_statement(&self) -> CoreResult<String> {
        let columns = self.registry.columns();
        let configs: Vec<_> = columns.iter().filter_map(|c| c.as_statement()).collect();
        if configs.is_empty() {
            return Err(CoreError::NoStatementColumns);
        }

        let selected: BTreeSet<&str> = configs
            .iter()
            .filter_map(|config| config.selected_statement_id.as_deref())
            .collect();
        let mut ids = selected.into_iter();
        match (ids.next(), ids.next()) {
            (None, _) => Err(CoreError::NoStatementSelected),
            (Some(id), None) => Ok(id.to_string()),
            (Some(_), Some(_)) => Err(CoreError::MultipleStatementsSelected),
        }
    }

    /// Interactive when the backend holds a non-empty interactor.
    ///
    /// A missing (404) or empty interactor means a checker-judged problem; any other
    /// failure is reported.
    pub async fn resolve_problem_mode(&self) -> CoreResult<ProblemMode> {
        Ok(match self.interactor().await? {
            Some(_) => ProblemMode::Interactive,
            None => ProblemMode::Standard,
        })
    }

    async fn interactor(&self) -> CoreResult<Option<String>> {
        match self
            .ctx
            .templates_api
            .get_template(TemplateKind::Interactor)
            .await
        {
            Ok(response) if !response.code.trim().is_empty() => Ok(Some(response.code)),
            Ok(_) => Ok(None),
            Err(e) if e.is_not_found() => {
                log::debug!("No interactor, assuming a checker-judged problem");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Review statement, validator and checker or interactor together.
    ///
    /// Returns the markdown report, also stored in the column.
    pub async fn run_full_review(&self, column_id: &str) -> CoreResult<String> {
        let config = self.assistant(column_id)?;
        let statement_id = self.selected_statement()?;
        self.begin(column_id, AssistantMode::FullReview).await?;

        let result = self.full_review(&statement_id, &config.selected_model).await;
        self.finish(column_id, result).await
    }

    /// Review the statement text alone for language and clarity.
    pub async fn run_statement_review(&self, column_id: &str) -> CoreResult<String> {
        let config = self.assistant(column_id)?;
        let statement_id = self.selected_statement()?;
        self.begin(column_id, AssistantMode::StatementReview).await?;

        let result = self
            .statement_review(&statement_id, &config.selected_model)
            .await;
        self.finish(column_id, result).await
    }

    async fn full_review(&self, statement_id: &str, model: &str) -> CoreResult<String> {
        let language = self.statement_language(statement_id).await?;

        let (statement, validator) = futures::join!(
            self.ctx.statements_api.get_statement_code(statement_id),
            self.ctx.templates_api.get_template(TemplateKind::Validator),
        );
        let statement = required(statement, "statement content")?;
        let validator = required(validator, "validator code")?;

        let mut request = ReviewRequest {
            statement,
            language,
            validator,
            checker: None,
            interactor: None,
            model: model.to_string(),
        };
        if let Some(interactor) = self.interactor().await? {
            request.interactor = Some(interactor);
        } else {
            let checker = self
                .ctx
                .templates_api
                .get_template(TemplateKind::Checker)
                .await;
            request.checker = Some(required(checker, "checker code")?);
        }

        log::info!("Requesting full review of {statement_id} with {model}");
        let report = self.ctx.review_api.review(&request).await?;
        Ok(report_to_markdown(report))
    }

    async fn statement_review(&self, statement_id: &str, model: &str) -> CoreResult<String> {
        let language = self.statement_language(statement_id).await?;
        let statement = self
            .ctx
            .statements_api
            .get_statement_code(statement_id)
            .await;
        let request = StatementLanguageReviewRequest {
            statement: required(statement, "statement content")?,
            language,
            model: model.to_string(),
        };

        log::info!("Requesting statement review of {statement_id} with {model}");
        let report = self.ctx.review_api.review_statement_language(&request).await?;
        Ok(report_to_markdown(report))
    }

    async fn statement_language(&self, statement_id: &str) -> CoreResult<String> {
        let statements = self.resources.statements().await;
        let statement = statements
            .iter()
            .find(|s| s.name == statement_id)
            .ok_or_else(|| CoreError::StatementNotFound(statement_id.to_string()))?;
        Ok(statement
            .language
            .clone()
            .unwrap_or_else(|| DEFAULT_STATEMENT_LANGUAGE.to_string()))
    }

    fn assistant(&self, column_id: &str) -> CoreResult<AssistantConfig> {
        let column = self.registry.require(column_id, ColumnKind::Assistant)?;
        Ok(column.as_assistant().cloned().unwrap_or_default())
    }

    async fn begin(&self, column_id: &str, mode: AssistantMode) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                AssistantPatch {
                    assistant_mode: Some(Some(mode)),
                    is_loading: Some(true),
                    ..AssistantPatch::default()
                },
            )
            .await
    }

    async fn finish(&self, column_id: &str, result: CoreResult<String>) -> CoreResult<String> {
        match result {
            Ok(markdown) => {
                self.registry
                    .update_column(
                        column_id,
                        AssistantPatch {
                            review_results: Some(Some(markdown.clone())),
                            is_loading: Some(false),
                            ..AssistantPatch::default()
                        },
                    )
                    .await?;
                Ok(markdown)
            }
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Review in column {column_id} failed: {e}");
                } else {
                    log::error!("Review in column {column_id} failed: {e}");
                }
                let cleared = self
                    .registry
                    .update_column(
                        column_id,
                        AssistantPatch {
                            is_loading: Some(false),
                            ..AssistantPatch::default()
                        },
                    )
                    .await;
                if let Err(clear_err) = cleared {
                    log::error!("Failed to clear loading state of {column_id}: {clear_err}");
                }
                Err(e)
            }
        }
    }
}

/// The fetched code, or `MissingContent(what)` when the fetch failed or came back empty.
fn required(response: Result<CodeResponse, ApiError>, what: &str) -> CoreResult<String> {
    match response {
        Ok(response) if !response.code.is_empty() => Ok(response.code),
        Ok(_) => Err(CoreError::MissingContent(what.to_string())),
        Err(e) => {
            log::warn!("Failed to fetch {what}: {e}");
            Err(CoreError::MissingContent(what.to_string()))
        }
    }
}
