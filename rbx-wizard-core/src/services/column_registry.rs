//! Column registry: identity, order and layout of the workbench panels

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};

use crate::error::{CoreError, CoreResult};
use crate::traits::StateStorage;
use crate::types::{
    default_columns, AssistantConfig, CodeEditorConfig, Column, ColumnIdGenerator, ColumnKind,
    ConfigPatch, LayoutSnapshot, PanelConfig, StatementConfig, TemplateKind,
};

/// Storage key of the persisted `{columns, columnSizes}` record.
pub const APP_STATE_KEY: &str = "rbx-wizard-app-state";

/// Separator of [`ColumnRegistry::layout_key`].
const LAYOUT_KEY_SEPARATOR: &str = "|";

/// Column registry
///
/// Mutations run one at a time. Each one writes the full snapshot to storage
/// before it is committed in memory and published, so a failed write leaves the
/// registry unchanged.
pub struct ColumnRegistry {
    storage: Arc<dyn StateStorage>,
    state: Mutex<LayoutSnapshot>,
    tx: watch::Sender<LayoutSnapshot>,
    ids: ColumnIdGenerator,
}

impl ColumnRegistry {
    /// Hydrate from storage, falling back to the default columns when nothing usable is stored.
    pub async fn load(storage: Arc<dyn StateStorage>) -> Self {
        let snapshot = match storage.load(APP_STATE_KEY).await {
            Ok(Some(raw)) => parse_snapshot(&raw),
            Ok(None) => {
                log::debug!("No persisted layout, using default columns");
                None
            }
            Err(e) => {
                log::error!("Failed to read persisted layout: {e}");
                None
            }
        };

        let snapshot = snapshot.unwrap_or_else(|| LayoutSnapshot {
            columns: default_columns(),
            column_sizes: Vec::new(),
        });
        log::info!("Column registry loaded with {} columns", snapshot.columns.len());

        let (tx, _rx) = watch::channel(snapshot.clone());
        Self {
            storage,
            state: Mutex::new(snapshot),
            tx,
            ids: ColumnIdGenerator::new(),
        }
    }

    // ===== Reads =====

    /// Current columns and sizes.
    pub fn snapshot(&self) -> LayoutSnapshot {
        self.tx.borrow().clone()
    }

    pub fn columns(&self) -> Vec<Column> {
        self.tx.borrow().columns.clone()
    }

    pub fn column(&self, id: &str) -> Option<Column> {
        self.tx.borrow().columns.iter().find(|c| c.id == id).cloned()
    }

    /// Persisted sizes as last set (may be stale, see [`Self::effective_sizes`]).
    pub fn column_sizes(&self) -> Vec<f64> {
        self.tx.borrow().column_sizes.clone()
    }

    pub fn statement_config(&self, id: &str) -> Option<StatementConfig> {
        self.column(id)
            .and_then(|c| c.as_statement().cloned())
    }

    pub fn code_editor_config(&self, id: &str) -> Option<CodeEditorConfig> {
        self.column(id)
            .and_then(|c| c.as_code_editor().cloned())
    }

    pub fn assistant_config(&self, id: &str) -> Option<AssistantConfig> {
        self.column(id)
            .and_then(|c| c.as_assistant().cloned())
    }

    /// The column `id`, failing when it is missing or not of `kind`.
    pub fn require(&self, id: &str, kind: ColumnKind) -> CoreResult<Column> {
        let column = self
            .column(id)
            .ok_or_else(|| CoreError::ColumnNotFound(id.to_string()))?;
        if column.kind() != kind {
            return Err(CoreError::ColumnKindMismatch {
                id: id.to_string(),
                expected: kind.to_string(),
            });
        }
        Ok(column)
    }

    /// Sizes to lay the panel group out with.
    ///
    /// The persisted sizes when they line up with the columns, otherwise each
    /// column's default size (an equal share when it has none).
    pub fn effective_sizes(&self) -> Vec<f64> {
        let snapshot = self.tx.borrow();
        if !snapshot.column_sizes.is_empty()
            && snapshot.column_sizes.len() == snapshot.columns.len()
        {
            return snapshot.column_sizes.clone();
        }
        #[allow(clippy::cast_precision_loss)]
        let share = 100.0 / snapshot.columns.len().max(1) as f64;
        snapshot
            .columns
            .iter()
            .map(|c| c.default_size.unwrap_or(share))
            .collect()
    }

    /// Identity of the current column order.
    ///
    /// The panel group must be rebuilt from scratch whenever this changes.
    pub fn layout_key(&self) -> String {
        self.tx
            .borrow()
            .columns
            .iter()
            .map(|c| c.id.as_str())
            .collect::<Vec<_>>()
            .join(LAYOUT_KEY_SEPARATOR)
    }

    pub fn subscribe(&self) -> watch::Receiver<LayoutSnapshot> {
        self.tx.subscribe()
    }

    // ===== Mutations =====

    /// Append a column.
    pub async fn add_column(&self, column: Column) -> CoreResult<()> {
        self.mutate(|next| {
            if next.columns.iter().any(|c| c.id == column.id) {
                return Err(CoreError::DuplicateColumn(column.id.clone()));
            }
            log::info!("Adding {} column {}", column.kind(), column.id);
            next.columns.push(column);
            Ok(())
        })
        .await
    }

    /// Append a new statement column and return its id.
    pub async fn add_statement_column(&self) -> CoreResult<String> {
        let column = Column::statement(self.ids.statement());
        let id = column.id.clone();
        self.add_column(column).await?;
        Ok(id)
    }

    /// Append a new code editor column for `kind` and return its id.
    pub async fn add_code_editor_column(&self, kind: TemplateKind) -> CoreResult<String> {
        let column = Column::code_editor(self.ids.code_editor(kind), kind);
        let id = column.id.clone();
        self.add_column(column).await?;
        Ok(id)
    }

    /// Append a new assistant column and return its id.
    pub async fn add_assistant_column(&self) -> CoreResult<String> {
        let column = Column::assistant(self.ids.assistant());
        let id = column.id.clone();
        self.add_column(column).await?;
        Ok(id)
    }

    /// Remove a column. The last remaining column cannot be removed.
    pub async fn remove_column(&self, id: &str) -> CoreResult<()> {
        self.mutate(|next| {
            let index = next
                .columns
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| CoreError::ColumnNotFound(id.to_string()))?;
            if next.columns.len() == 1 {
                return Err(CoreError::LastColumn);
            }
            next.columns.remove(index);
            log::info!("Removed column {id}");
            Ok(())
        })
        .await
    }

    /// Merge a partial config update into one column.
    pub async fn update_column(&self, id: &str, patch: impl Into<ConfigPatch>) -> CoreResult<()> {
        let patch = patch.into();
        self.mutate(|next| {
            let column = next
                .columns
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::ColumnNotFound(id.to_string()))?;
            patch.apply_to(column)
        })
        .await
    }

    /// Merge the patch computed from the column's current config.
    pub async fn update_column_with<F>(&self, id: &str, updater: F) -> CoreResult<()>
    where
        F: FnOnce(&PanelConfig) -> ConfigPatch + Send,
    {
        self.mutate(|next| {
            let column = next
                .columns
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::ColumnNotFound(id.to_string()))?;
            updater(&column.panel).apply_to(column)
        })
        .await
    }

    /// Re-sequence the columns.
    ///
    /// Unknown and repeated ids are ignored; columns missing from `order` keep their
    /// relative order after the listed ones. A change of order discards the persisted
    /// sizes, which were aligned to the previous order.
    pub async fn reorder<S: AsRef<str>>(&self, order: &[S]) -> CoreResult<()> {
        self.mutate(|next| {
            let mut seen: HashSet<&str> = HashSet::new();
            let mut reordered: Vec<Column> = Vec::with_capacity(next.columns.len());
            for id in order {
                let id = id.as_ref();
                if !seen.insert(id) {
                    continue;
                }
                if let Some(column) = next.columns.iter().find(|c| c.id == id) {
                    reordered.push(column.clone());
                }
            }
            for column in &next.columns {
                if !seen.contains(column.id.as_str()) {
                    reordered.push(column.clone());
                }
            }

            let changed = reordered
                .iter()
                .zip(&next.columns)
                .any(|(a, b)| a.id != b.id);
            if changed {
                next.columns = reordered;
                next.column_sizes.clear();
            }
            Ok(())
        })
        .await
    }

    /// Replace the persisted sizes (aligned to the current order).
    pub async fn set_layout_sizes(&self, sizes: Vec<f64>) -> CoreResult<()> {
        self.mutate(|next| {
            next.column_sizes = sizes;
            Ok(())
        })
        .await
    }

    /// Apply `change` to a copy of the snapshot, persist it, then commit and publish.
    async fn mutate<F>(&self, change: F) -> CoreResult<()>
    where
        F: FnOnce(&mut LayoutSnapshot) -> CoreResult<()>,
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        change(&mut next)?;
        if next == *state {
            return Ok(());
        }

        self.persist(&next).await?;
        *state = next.clone();
        self.tx.send_replace(next);
        Ok(())
    }

    /// Write `{columns, columnSizes}` over the stored record, keeping its other fields.
    async fn persist(&self, snapshot: &LayoutSnapshot) -> CoreResult<()> {
        let mut record = match self.storage.load(APP_STATE_KEY).await? {
            Some(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                _ => {
                    log::warn!("Persisted layout is malformed, overwriting it");
                    Map::new()
                }
            },
            None => Map::new(),
        };

        let columns = serde_json::to_value(&snapshot.columns)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        let sizes = serde_json::to_value(&snapshot.column_sizes)
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        record.insert("columns".to_string(), columns);
        record.insert("columnSizes".to_string(), sizes);

        let raw = serde_json::to_string(&Value::Object(record))
            .map_err(|e| CoreError::SerializationError(e.to_string()))?;
        self.storage
            .store(APP_STATE_KEY, &raw)
            .await
            .inspect_err(|e| log::error!("Failed to persist layout: {e}"))
    }
}

/// Parse a stored record; anything unusable counts as absent.
fn parse_snapshot(raw: &str) -> Option<LayoutSnapshot> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Persisted layout is not valid JSON, using defaults: {e}");
            return None;
        }
    };
    let record = value.as_object()?;

    let columns = match record
        .get("columns")
        .cloned()
        .map(serde_json::from_value::<Vec<Column>>)
    {
        Some(Ok(columns)) if is_valid_column_set(&columns) => columns,
        Some(Ok(_)) => {
            log::warn!("Persisted columns are empty or repeat an id, using defaults");
            default_columns()
        }
        Some(Err(e)) => {
            log::warn!("Persisted columns have an unexpected shape, using defaults: {e}");
            default_columns()
        }
        None => default_columns(),
    };

    let column_sizes = record
        .get("columnSizes")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<f64>>(v).ok())
        .unwrap_or_default();

    Some(LayoutSnapshot {
        columns,
        column_sizes,
    })
}

fn is_valid_column_set(columns: &[Column]) -> bool {
    let mut ids = HashSet::new();
    !columns.is_empty() && columns.iter().all(|c| ids.insert(c.id.as_str()))
}
