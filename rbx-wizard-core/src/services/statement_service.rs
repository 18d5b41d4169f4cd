//! Statement viewer columns

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::CoreResult;
use crate::services::{ColumnRegistry, Loadable, RemoteResources, ServiceContext};
use crate::types::{
    CodeResponse, ColumnKind, ConfigPatch, PanelConfig, Statement, StatementBuildResponse,
    StatementPatch, ViewMode,
};

/// What a statement column renders.
#[derive(Debug, Clone)]
pub enum StatementContent {
    /// No statement selected.
    Empty,
    /// Built artifact; the URL changes after every rebuild.
    Pdf { url: String },
    Code(Loadable<CodeResponse>),
}

/// Statement viewer service
pub struct StatementService {
    ctx: Arc<ServiceContext>,
    registry: Arc<ColumnRegistry>,
    resources: Arc<RemoteResources>,
    /// Rebuild counter per statement, appended to PDF URLs to defeat caching.
    pdf_versions: RwLock<HashMap<String, u64>>,
}

impl StatementService {
    pub fn new(
        ctx: Arc<ServiceContext>,
        registry: Arc<ColumnRegistry>,
        resources: Arc<RemoteResources>,
    ) -> Self {
        Self {
            ctx,
            registry,
            resources,
            pdf_versions: RwLock::new(HashMap::new()),
        }
    }

    /// All statements (empty when the list is unavailable).
    pub async fn statements(&self) -> Vec<Statement> {
        self.resources.statements().await
    }

    /// Point a statement column at `statement_id`, or clear its selection.
    pub async fn select_statement(
        &self,
        column_id: &str,
        statement_id: Option<String>,
    ) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                StatementPatch {
                    selected_statement_id: Some(statement_id),
                    ..StatementPatch::default()
                },
            )
            .await
    }

    /// Switch a statement column between PDF and source view.
    pub async fn toggle_view_mode(&self, column_id: &str) -> CoreResult<ViewMode> {
        self.registry
            .update_column_with(column_id, |panel| {
                let current = match panel {
                    PanelConfig::Statement(config) => config.view_mode,
                    _ => ViewMode::default(),
                };
                ConfigPatch::Statement(StatementPatch {
                    view_mode: Some(current.toggled()),
                    ..StatementPatch::default()
                })
            })
            .await?;

        let column = self.registry.require(column_id, ColumnKind::Statement)?;
        Ok(column
            .as_statement()
            .map(|config| config.view_mode)
            .unwrap_or_default())
    }

    /// Content for a statement column in its current view mode.
    pub async fn statement_content(&self, column_id: &str) -> CoreResult<StatementContent> {
        let column = self.registry.require(column_id, ColumnKind::Statement)?;
        let Some(config) = column.as_statement() else {
            return Ok(StatementContent::Empty);
        };
        let Some(statement_id) = config.selected_statement_id.as_ref() else {
            return Ok(StatementContent::Empty);
        };

        Ok(match config.view_mode {
            ViewMode::Pdf => StatementContent::Pdf {
                url: self.pdf_url(statement_id).await,
            },
            ViewMode::Code => StatementContent::Code(
                self.resources
                    .statement_code
                    .load(Some(statement_id))
                    .await,
            ),
        })
    }

    /// `{pdf_base_url}/statement/{id}?v={version}`
    pub async fn pdf_url(&self, statement_id: &str) -> String {
        let version = self
            .pdf_versions
            .read()
            .await
            .get(statement_id)
            .copied()
            .unwrap_or(0);
        format!(
            "{}/statement/{}?v={version}",
            self.ctx.settings.pdf_base_url.trim_end_matches('/'),
            urlencoding::encode(statement_id)
        )
    }

    /// Rebuild a statement's PDF.
    ///
    /// On success viewers get a fresh PDF URL and the cached source is refetched.
    pub async fn build_statement(&self, statement_id: &str) -> CoreResult<StatementBuildResponse> {
        let response = match self.ctx.statements_api.build_statement(statement_id).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_expected() {
                    log::warn!("Build of statement {statement_id} failed: {e}");
                } else {
                    log::error!("Build of statement {statement_id} failed: {e}");
                }
                return Err(e.into());
            }
        };

        *self
            .pdf_versions
            .write()
            .await
            .entry(statement_id.to_string())
            .or_insert(0) += 1;
        log::info!("Built statement {statement_id} at {}", response.path);

        self.resources
            .statement_code
            .refetch(&statement_id.to_string())
            .await;
        Ok(response)
    }
}
