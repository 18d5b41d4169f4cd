//! Shared editable documents
//!
//! One buffer and one save status per [`DocumentKey`], shared by every editor
//! bound to that key. Saves for a key are serialized: while one is in flight,
//! further save requests collapse into a single follow-up that carries the
//! latest buffer.
//!
//! Status cycle: `idle -> saving -> saved | error -> idle`, where the last step
//! happens after `status_display` unless another transition came first.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rbx_wizard_api::{CodeTemplatesApi, StatementsApi};
use tokio::sync::{watch, Mutex};

use crate::error::CoreResult;
use crate::traits::DocumentSaver;
use crate::types::{
    DocumentKey, DocumentState, SaveOutcome, SaveStatus, TemplateKind, WorkbenchSettings,
};

struct Inner {
    text: String,
    /// Last content known to be persisted.
    baseline: String,
    status: SaveStatus,
    last_saved_at: Option<DateTime<Utc>>,
    hydrated: bool,
    debounce_epoch: u64,
    status_epoch: u64,
    saving: bool,
    rerun: bool,
}

impl Inner {
    fn is_dirty(&self) -> bool {
        self.text != self.baseline
    }

    fn snapshot(&self) -> DocumentState {
        DocumentState {
            text: self.text.clone(),
            status: self.status,
            is_dirty: self.is_dirty(),
            last_saved_at: self.last_saved_at,
        }
    }
}

/// The per-key document cell.
pub struct SharedDocument {
    key: DocumentKey,
    saver: Option<Arc<dyn DocumentSaver>>,
    debounce: Duration,
    status_display: Duration,
    inner: Mutex<Inner>,
    tx: watch::Sender<DocumentState>,
}

impl SharedDocument {
    /// A document with no content. Without a saver it never writes anywhere.
    pub fn new(
        key: DocumentKey,
        saver: Option<Arc<dyn DocumentSaver>>,
        settings: &WorkbenchSettings,
    ) -> Arc<Self> {
        let (tx, _rx) = watch::channel(DocumentState::default());
        Arc::new(Self {
            key,
            saver,
            debounce: settings.autosave_debounce,
            status_display: settings.status_display,
            inner: Mutex::new(Inner {
                text: String::new(),
                baseline: String::new(),
                status: SaveStatus::Idle,
                last_saved_at: None,
                hydrated: false,
                debounce_epoch: 0,
                status_epoch: 0,
                saving: false,
                rerun: false,
            }),
            tx,
        })
    }

    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    pub fn state(&self) -> DocumentState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.tx.subscribe()
    }

    pub async fn is_hydrated(&self) -> bool {
        self.inner.lock().await.hydrated
    }

    /// Seed the buffer and the persisted baseline with fetched content.
    ///
    /// Only the first call (before any edit) has an effect; returns whether it applied.
    pub async fn hydrate(&self, text: &str) -> bool {
        let mut inner = self.inner.lock().await;
        if inner.hydrated {
            return false;
        }
        inner.hydrated = true;
        inner.text = text.to_string();
        inner.baseline = text.to_string();
        self.publish(&inner);
        true
    }

    /// Replace the buffer.
    ///
    /// With `autosave`, a change arms the debounce timer. An edit that lands while a
    /// save is in flight is picked up by the single follow-up save instead.
    pub async fn edit(self: &Arc<Self>, text: String, autosave: bool) {
        let mut inner = self.inner.lock().await;
        inner.hydrated = true;
        inner.text = text;
        // Supersedes any armed timer.
        inner.debounce_epoch += 1;

        let autosave = autosave && self.saver.is_some();
        let arm = if autosave && inner.saving {
            // Dirtiness is judged against the in-flight content once it lands.
            inner.rerun = true;
            None
        } else if autosave && inner.is_dirty() {
            Some(inner.debounce_epoch)
        } else {
            None
        };
        self.publish(&inner);
        drop(inner);

        if let Some(epoch) = arm {
            let document = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(document.debounce).await;
                document.fire_debounce(epoch).await;
            });
        }
    }

    /// Save the current buffer now, bypassing the debounce.
    pub async fn save_now(self: &Arc<Self>) -> SaveOutcome {
        let Some(saver) = self.saver.clone() else {
            return SaveOutcome::Skipped;
        };

        let mut content = {
            let mut inner = self.inner.lock().await;
            if inner.saving {
                inner.rerun = true;
                return SaveOutcome::Queued;
            }
            if !inner.is_dirty() {
                return SaveOutcome::Skipped;
            }
            inner.saving = true;
            inner.debounce_epoch += 1;
            inner.status = SaveStatus::Saving;
            inner.status_epoch += 1;
            self.publish(&inner);
            inner.text.clone()
        };

        loop {
            let result = saver.save(&content).await;

            let mut inner = self.inner.lock().await;
            let outcome = match result {
                Ok(()) => {
                    log::debug!("Saved {} ({} bytes)", self.key, content.len());
                    inner.baseline = std::mem::take(&mut content);
                    inner.last_saved_at = Some(Utc::now());
                    inner.status = SaveStatus::Saved;
                    SaveOutcome::Saved
                }
                Err(e) => {
                    log::error!("Failed to save {}: {e}", self.key);
                    inner.status = SaveStatus::Error;
                    SaveOutcome::Failed
                }
            };
            inner.status_epoch += 1;
            self.publish(&inner);

            if inner.rerun && inner.is_dirty() {
                inner.rerun = false;
                content = inner.text.clone();
                inner.status = SaveStatus::Saving;
                inner.status_epoch += 1;
                self.publish(&inner);
                continue;
            }

            inner.rerun = false;
            inner.saving = false;
            let status_epoch = inner.status_epoch;
            drop(inner);
            self.schedule_revert(status_epoch);
            return outcome;
        }
    }

    /// Entering edit mode clears any lingering save status.
    pub async fn enter_edit_mode(&self) {
        let mut inner = self.inner.lock().await;
        inner.status = SaveStatus::Idle;
        inner.status_epoch += 1;
        self.publish(&inner);
    }

    /// Leaving edit mode flushes unsaved changes immediately, or queues them
    /// behind a save already in flight.
    pub async fn leave_edit_mode(self: &Arc<Self>) -> SaveOutcome {
        self.save_now().await
    }

    async fn fire_debounce(self: &Arc<Self>, epoch: u64) {
        if self.inner.lock().await.debounce_epoch != epoch {
            return;
        }
        self.save_now().await;
    }

    fn schedule_revert(self: &Arc<Self>, epoch: u64) {
        let document = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(document.status_display).await;
            let mut inner = document.inner.lock().await;
            if inner.status_epoch == epoch
                && matches!(inner.status, SaveStatus::Saved | SaveStatus::Error)
            {
                inner.status = SaveStatus::Idle;
                document.publish(&inner);
            }
        });
    }

    fn publish(&self, inner: &Inner) {
        self.tx.send_replace(inner.snapshot());
    }
}

// ===== Savers =====

/// Writes a code template (`PUT /{kind}`).
pub struct TemplateSaver {
    api: Arc<dyn CodeTemplatesApi>,
    kind: TemplateKind,
}

impl TemplateSaver {
    pub fn new(api: Arc<dyn CodeTemplatesApi>, kind: TemplateKind) -> Self {
        Self { api, kind }
    }
}

#[async_trait]
impl DocumentSaver for TemplateSaver {
    async fn save(&self, text: &str) -> CoreResult<()> {
        self.api.save_template(self.kind, text).await?;
        Ok(())
    }
}

/// Writes statement source (`PUT /statement/{id}/code`).
pub struct StatementSaver {
    api: Arc<dyn StatementsApi>,
    id: String,
}

impl StatementSaver {
    pub fn new(api: Arc<dyn StatementsApi>, id: impl Into<String>) -> Self {
        Self { api, id: id.into() }
    }
}

#[async_trait]
impl DocumentSaver for StatementSaver {
    async fn save(&self, text: &str) -> CoreResult<()> {
        self.api.save_statement_code(&self.id, text).await?;
        Ok(())
    }
}

// ===== Hub =====

/// Process-wide map of shared documents, created lazily per key.
pub struct DocumentHub {
    statements_api: Arc<dyn StatementsApi>,
    templates_api: Arc<dyn CodeTemplatesApi>,
    settings: WorkbenchSettings,
    documents: Mutex<HashMap<DocumentKey, Arc<SharedDocument>>>,
}

impl DocumentHub {
    pub fn new(
        statements_api: Arc<dyn StatementsApi>,
        templates_api: Arc<dyn CodeTemplatesApi>,
        settings: WorkbenchSettings,
    ) -> Self {
        Self {
            statements_api,
            templates_api,
            settings,
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// The document for `key`, created on first use.
    pub async fn document(&self, key: &DocumentKey) -> Arc<SharedDocument> {
        let mut documents = self.documents.lock().await;
        if let Some(document) = documents.get(key) {
            return Arc::clone(document);
        }
        let document = SharedDocument::new(key.clone(), self.saver_for(key), &self.settings);
        documents.insert(key.clone(), Arc::clone(&document));
        log::debug!("Created shared document {key}");
        document
    }

    /// Bind a new editor to `key`.
    pub async fn open(&self, key: &DocumentKey, editable: bool) -> EditorHandle {
        EditorHandle {
            document: self.document(key).await,
            editable,
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    fn saver_for(&self, key: &DocumentKey) -> Option<Arc<dyn DocumentSaver>> {
        match key {
            DocumentKey::Template(kind) => Some(Arc::new(TemplateSaver::new(
                Arc::clone(&self.templates_api),
                *kind,
            ))),
            DocumentKey::Statement(id) => Some(Arc::new(StatementSaver::new(
                Arc::clone(&self.statements_api),
                id.clone(),
            ))),
            DocumentKey::Local(_) => None,
        }
    }
}

/// One editor instance bound to a shared document.
///
/// Edit mode is per instance; buffer and status are shared.
pub struct EditorHandle {
    document: Arc<SharedDocument>,
    editable: bool,
}

impl EditorHandle {
    pub fn key(&self) -> &DocumentKey {
        self.document.key()
    }

    pub fn document(&self) -> &Arc<SharedDocument> {
        &self.document
    }

    pub fn state(&self) -> DocumentState {
        self.document.state()
    }

    pub fn text(&self) -> String {
        self.document.state().text
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.document.subscribe()
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Replace the buffer; auto-saves only in edit mode.
    pub async fn edit(&self, text: impl Into<String>) {
        self.document.edit(text.into(), self.editable).await;
    }

    pub async fn save(&self) -> SaveOutcome {
        self.document.save_now().await
    }

    /// Switch edit mode. Leaving it with unsaved changes saves them right away.
    pub async fn set_editable(&mut self, editable: bool) -> SaveOutcome {
        if self.editable == editable {
            return SaveOutcome::Skipped;
        }
        self.editable = editable;
        if editable {
            self.document.enter_edit_mode().await;
            SaveOutcome::Skipped
        } else {
            self.document.leave_edit_mode().await
        }
    }

    pub async fn toggle_edit_mode(&mut self) -> SaveOutcome {
        self.set_editable(!self.editable).await
    }
}
