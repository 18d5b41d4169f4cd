//! Platform-agnostic application bootstrap for rbx-wizard.
//!
//! Provides `AppConfig` (environment configuration), `AppState` (service container),
//! `AppStateBuilder` (adapter injection) and `init_logging`.

pub mod adapters;
pub mod config;
pub mod logging;

pub use config::AppConfig;
pub use logging::init_logging;

use std::sync::Arc;

use rbx_wizard_api::{
    ApiClient, ClientConfig, CodeTemplatesApi, CodeTemplatesService, LlmService, ReviewApi,
    StatementsApi, StatementsService,
};
use rbx_wizard_core::error::{CoreError, CoreResult};
use rbx_wizard_core::services::{
    ColumnRegistry, DocumentHub, EditorService, RemoteResources, ReviewService, ServiceContext,
    StatementService, Workbench,
};
use rbx_wizard_core::traits::StateStorage;
use rbx_wizard_core::types::WorkbenchSettings;

use crate::adapters::JsonFileStateStorage;

/// Platform-agnostic application state.
///
/// Holds the `ServiceContext` and every workbench service. Every frontend
/// constructs this once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (backend clients, storage, settings)
    pub ctx: Arc<ServiceContext>,
    /// Column registry
    pub registry: Arc<ColumnRegistry>,
    /// Backend read caches
    pub resources: Arc<RemoteResources>,
    /// Shared editable documents
    pub documents: Arc<DocumentHub>,
    /// Statement viewer service
    pub statement_service: StatementService,
    /// Code editor service
    pub editor_service: EditorService,
    /// Assistant / review service
    pub review_service: ReviewService,
}

impl AppState {
    /// Build the state for `config`: HTTP backend services and file-backed storage.
    pub async fn from_config(config: &AppConfig) -> CoreResult<Self> {
        AppStateBuilder::from_config(config).build().await
    }

    /// Prefetch the statement list and the model list.
    ///
    /// Failures are not fatal; the caches report them as unavailable.
    pub async fn warm_up(&self) {
        let (statements, models) = tokio::join!(
            self.resources.statements(),
            self.review_service.available_models(),
        );
        log::info!(
            "Workbench ready: {} statements, {} models",
            statements.len(),
            models.len()
        );
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `storage`: where the column layout is persisted
///
/// # Optional
/// - `statements_api` / `templates_api` / `review_api`: default to the HTTP services
///   over `client_config`
pub struct AppStateBuilder {
    client_config: ClientConfig,
    settings: WorkbenchSettings,
    storage: Option<Arc<dyn StateStorage>>,
    statements_api: Option<Arc<dyn StatementsApi>>,
    templates_api: Option<Arc<dyn CodeTemplatesApi>>,
    review_api: Option<Arc<dyn ReviewApi>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client_config: ClientConfig::default(),
            settings: WorkbenchSettings::default(),
            storage: None,
            statements_api: None,
            templates_api: None,
            review_api: None,
        }
    }

    /// Builder preloaded with `config`, persisting to `config.state_dir`.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new()
            .client_config(config.client.clone())
            .settings(config.settings.clone())
            .storage(Arc::new(JsonFileStateStorage::new(config.state_dir.clone())))
    }

    #[must_use]
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    #[must_use]
    pub fn settings(mut self, settings: WorkbenchSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn StateStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn statements_api(mut self, api: Arc<dyn StatementsApi>) -> Self {
        self.statements_api = Some(api);
        self
    }

    #[must_use]
    pub fn templates_api(mut self, api: Arc<dyn CodeTemplatesApi>) -> Self {
        self.templates_api = Some(api);
        self
    }

    #[must_use]
    pub fn review_api(mut self, api: Arc<dyn ReviewApi>) -> Self {
        self.review_api = Some(api);
        self
    }

    /// Build the `AppState`, hydrating the column registry from storage.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if required adapters are missing.
    pub async fn build(self) -> CoreResult<AppState> {
        let storage = self
            .storage
            .ok_or_else(|| CoreError::ValidationError("storage is required".to_string()))?;

        let client = ApiClient::new(self.client_config);
        let statements_api = self
            .statements_api
            .unwrap_or_else(|| Arc::new(StatementsService::new(client.clone())));
        let templates_api = self
            .templates_api
            .unwrap_or_else(|| Arc::new(CodeTemplatesService::new(client.clone())));
        let review_api = self
            .review_api
            .unwrap_or_else(|| Arc::new(LlmService::new(client.clone())));
        log::info!("Backend at {}", client.base_url());

        let ctx = Arc::new(ServiceContext::new(
            statements_api,
            templates_api,
            review_api,
            storage,
            self.settings,
        ));

        let Workbench {
            ctx,
            registry,
            resources,
            documents,
            statements,
            editors,
            review,
        } = Workbench::load(ctx).await;

        Ok(AppState {
            ctx,
            registry,
            resources,
            documents,
            statement_service: statements,
            editor_service: editors,
            review_service: review,
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
