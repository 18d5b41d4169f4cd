//! Workbench services

mod column_registry;
mod editor_service;
mod resource_cache;
mod review_service;
mod shared_document;
mod statement_service;

pub use column_registry::{ColumnRegistry, APP_STATE_KEY};
pub use editor_service::EditorService;
pub use resource_cache::{CacheBinding, Loadable, RemoteResources, ResourceCache};
pub use review_service::{ProblemMode, ReviewService, FALLBACK_MODELS};
pub use shared_document::{
    DocumentHub, EditorHandle, SharedDocument, StatementSaver, TemplateSaver,
};
pub use statement_service::{StatementContent, StatementService};

use std::sync::Arc;

use rbx_wizard_api::{CodeTemplatesApi, ReviewApi, StatementsApi};

use crate::traits::StateStorage;
use crate::types::WorkbenchSettings;

/// Service context - holds every injected dependency
///
/// The platform layer builds this once, plugging in the backend clients and a
/// durable storage implementation.
pub struct ServiceContext {
    pub statements_api: Arc<dyn StatementsApi>,
    pub templates_api: Arc<dyn CodeTemplatesApi>,
    pub review_api: Arc<dyn ReviewApi>,
    /// Durable local key/value storage (layout persistence).
    pub storage: Arc<dyn StateStorage>,
    pub settings: WorkbenchSettings,
}

impl ServiceContext {
    #[must_use]
    pub fn new(
        statements_api: Arc<dyn StatementsApi>,
        templates_api: Arc<dyn CodeTemplatesApi>,
        review_api: Arc<dyn ReviewApi>,
        storage: Arc<dyn StateStorage>,
        settings: WorkbenchSettings,
    ) -> Self {
        Self {
            statements_api,
            templates_api,
            review_api,
            storage,
            settings,
        }
    }

    /// Caches over the backend reads.
    #[must_use]
    pub fn remote_resources(&self) -> RemoteResources {
        RemoteResources::new(
            Arc::clone(&self.statements_api),
            Arc::clone(&self.templates_api),
            Arc::clone(&self.review_api),
        )
    }

    /// Shared documents writing through the backend.
    #[must_use]
    pub fn document_hub(&self) -> DocumentHub {
        DocumentHub::new(
            Arc::clone(&self.statements_api),
            Arc::clone(&self.templates_api),
            self.settings.clone(),
        )
    }
}

/// Everything the workbench UI binds to, wired over one [`ServiceContext`].
pub struct Workbench {
    pub ctx: Arc<ServiceContext>,
    pub registry: Arc<ColumnRegistry>,
    pub resources: Arc<RemoteResources>,
    pub documents: Arc<DocumentHub>,
    pub statements: StatementService,
    pub editors: EditorService,
    pub review: ReviewService,
}

impl Workbench {
    /// Hydrate the column registry from storage and wire the services.
    pub async fn load(ctx: Arc<ServiceContext>) -> Self {
        let registry = Arc::new(ColumnRegistry::load(Arc::clone(&ctx.storage)).await);
        let resources = Arc::new(ctx.remote_resources());
        let documents = Arc::new(ctx.document_hub());

        let statements = StatementService::new(
            Arc::clone(&ctx),
            Arc::clone(&registry),
            Arc::clone(&resources),
        );
        let editors = EditorService::new(
            Arc::clone(&registry),
            Arc::clone(&resources),
            Arc::clone(&documents),
        );
        let review = ReviewService::new(
            Arc::clone(&ctx),
            Arc::clone(&registry),
            Arc::clone(&resources),
        );

        Self {
            ctx,
            registry,
            resources,
            documents,
            statements,
            editors,
            review,
        }
    }
}
