//! Code editor columns and editor bindings

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::services::{ColumnRegistry, DocumentHub, EditorHandle, Loadable, RemoteResources};
use crate::types::{
    CodeEditorPatch, ColumnKind, ConfigPatch, DocumentKey, PanelConfig, TemplateKind,
};

pub struct EditorService {
    registry: Arc<ColumnRegistry>,
    resources: Arc<RemoteResources>,
    documents: Arc<DocumentHub>,
}

impl EditorService {
    pub fn new(
        registry: Arc<ColumnRegistry>,
        resources: Arc<RemoteResources>,
        documents: Arc<DocumentHub>,
    ) -> Self {
        Self {
            registry,
            resources,
            documents,
        }
    }

    /// Switch a code editor column to another template.
    ///
    /// The kind and title change right away; the code and language follow once
    /// the template is loaded, unless the column moved on to another kind meanwhile.
    pub async fn select_template(&self, column_id: &str, kind: TemplateKind) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                CodeEditorPatch {
                    template_type: Some(kind),
                    title: Some(kind.title().to_string()),
                    ..CodeEditorPatch::default()
                },
            )
            .await?;

        let Loadable::Ready(template) = self.resources.templates.load(Some(&kind)).await else {
            log::warn!("Template {kind} unavailable, keeping the editor contents");
            return Ok(());
        };

        self.registry
            .update_column_with(column_id, move |panel| {
                let still_selected = matches!(
                    panel,
                    PanelConfig::CodeEditor(config) if config.template_type == kind
                );
                if !still_selected {
                    return ConfigPatch::CodeEditor(CodeEditorPatch::default());
                }
                ConfigPatch::CodeEditor(CodeEditorPatch {
                    code: Some(template.code.clone()),
                    language: template.language.clone(),
                    ..CodeEditorPatch::default()
                })
            })
            .await
    }

    pub async fn set_code(&self, column_id: &str, code: impl Into<String>) -> CoreResult<()> {
        self.registry
            .update_column(column_id, CodeEditorPatch::code(code))
            .await
    }

    pub async fn update_title(&self, column_id: &str, title: impl Into<String>) -> CoreResult<()> {
        self.registry
            .update_column(
                column_id,
                CodeEditorPatch {
                    title: Some(title.into()),
                    ..CodeEditorPatch::default()
                },
            )
            .await
    }

    /// Editor bound to the shared `template:<kind>` document.
    pub async fn open_template_editor(&self, kind: TemplateKind, editable: bool) -> EditorHandle {
        let handle = self
            .documents
            .open(&DocumentKey::Template(kind), editable)
            .await;
        if !handle.document().is_hydrated().await {
            if let Loadable::Ready(template) = self.resources.templates.load(Some(&kind)).await {
                handle.document().hydrate(&template.code).await;
            }
        }
        handle
    }

    /// Editor bound to the shared `statement:<id>` document.
    pub async fn open_statement_editor(&self, statement_id: &str, editable: bool) -> EditorHandle {
        let handle = self
            .documents
            .open(&DocumentKey::Statement(statement_id.to_string()), editable)
            .await;
        if !handle.document().is_hydrated().await {
            let key = statement_id.to_string();
            if let Loadable::Ready(code) = self.resources.statement_code.load(Some(&key)).await {
                handle.document().hydrate(&code.code).await;
            }
        }
        handle
    }

    /// Editor for what a column shows: its template, or its selected statement's source.
    pub async fn open_column_editor(
        &self,
        column_id: &str,
        editable: bool,
    ) -> CoreResult<EditorHandle> {
        let column = self
            .registry
            .column(column_id)
            .ok_or_else(|| CoreError::ColumnNotFound(column_id.to_string()))?;
        match &column.panel {
            PanelConfig::CodeEditor(config) => {
                Ok(self.open_template_editor(config.template_type, editable).await)
            }
            PanelConfig::Statement(config) => {
                let statement_id = config
                    .selected_statement_id
                    .as_deref()
                    .ok_or(CoreError::NoStatementSelected)?;
                Ok(self.open_statement_editor(statement_id, editable).await)
            }
            PanelConfig::Assistant(_) => Err(CoreError::ColumnKindMismatch {
                id: column_id.to_string(),
                expected: ColumnKind::CodeEditor.to_string(),
            }),
        }
    }

    /// An unshared editor that never writes to the backend.
    pub async fn open_scratch_editor(&self) -> EditorHandle {
        self.documents.open(&DocumentKey::local(), true).await
    }
}
