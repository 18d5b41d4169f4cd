//! Column (panel) type definitions

use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

pub use rbx_wizard_api::TemplateKind;

/// Default model for new assistant columns.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default source language for code editor columns.
pub const DEFAULT_LANGUAGE: &str = "cpp";

/// Panel kind, the discriminant of [`PanelConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColumnKind {
    Statement,
    CodeEditor,
    Assistant,
}

impl ColumnKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Statement => "statement",
            Self::CodeEditor => "code-editor",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a statement column renders its statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Pdf,
    Code,
}

impl ViewMode {
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Pdf => Self::Code,
            Self::Code => Self::Pdf,
        }
    }
}

/// What the assistant column is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssistantMode {
    FullReview,
    ValidatorReview,
    StatementReview,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementConfig {
    pub selected_statement_id: Option<String>,
    #[serde(default)]
    pub view_mode: ViewMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeEditorConfig {
    pub template_type: TemplateKind,
    #[serde(default)]
    pub code: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub title: String,
}

impl CodeEditorConfig {
    #[must_use]
    pub fn new(kind: TemplateKind) -> Self {
        Self {
            template_type: kind,
            code: String::new(),
            language: DEFAULT_LANGUAGE.to_string(),
            title: kind.title().to_string(),
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantConfig {
    pub selected_model: String,
    #[serde(default)]
    pub assistant_mode: Option<AssistantMode>,
    /// Markdown report of the last review.
    #[serde(default)]
    pub review_results: Option<String>,
    #[serde(default)]
    pub is_loading: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            selected_model: DEFAULT_MODEL.to_string(),
            assistant_mode: None,
            review_results: None,
            is_loading: false,
        }
    }
}

/// Kind-specific column configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelConfig {
    Statement(StatementConfig),
    CodeEditor(CodeEditorConfig),
    Assistant(AssistantConfig),
}

impl PanelConfig {
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Statement(_) => ColumnKind::Statement,
            Self::CodeEditor(_) => ColumnKind::CodeEditor,
            Self::Assistant(_) => ColumnKind::Assistant,
        }
    }
}

/// One workbench panel.
///
/// Serialized as `{id, type, config, minSize?, maxSize?, defaultSize?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumn", into = "RawColumn")]
pub struct Column {
    pub id: String,
    pub panel: PanelConfig,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub default_size: Option<f64>,
}

impl Column {
    #[must_use]
    pub fn new(id: impl Into<String>, panel: PanelConfig) -> Self {
        Self {
            id: id.into(),
            panel,
            min_size: None,
            max_size: None,
            default_size: None,
        }
    }

    /// Set the layout hints (percent of the panel group width).
    #[must_use]
    pub fn with_sizes(mut self, min: f64, max: f64, default: f64) -> Self {
        self.min_size = Some(min);
        self.max_size = Some(max);
        self.default_size = Some(default);
        self
    }

    /// New statement column with nothing selected.
    #[must_use]
    pub fn statement(id: impl Into<String>) -> Self {
        Self::new(id, PanelConfig::Statement(StatementConfig::default()))
            .with_sizes(15.0, 50.0, 25.0)
    }

    /// New empty code editor column for `kind`.
    #[must_use]
    pub fn code_editor(id: impl Into<String>, kind: TemplateKind) -> Self {
        Self::new(id, PanelConfig::CodeEditor(CodeEditorConfig::new(kind)))
            .with_sizes(20.0, 60.0, 30.0)
    }

    /// New assistant column with the default model.
    #[must_use]
    pub fn assistant(id: impl Into<String>) -> Self {
        Self::new(id, PanelConfig::Assistant(AssistantConfig::default()))
            .with_sizes(20.0, 60.0, 30.0)
    }

    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        self.panel.kind()
    }

    #[must_use]
    pub fn as_statement(&self) -> Option<&StatementConfig> {
        match &self.panel {
            PanelConfig::Statement(config) => Some(config),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_code_editor(&self) -> Option<&CodeEditorConfig> {
        match &self.panel {
            PanelConfig::CodeEditor(config) => Some(config),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_assistant(&self) -> Option<&AssistantConfig> {
        match &self.panel {
            PanelConfig::Assistant(config) => Some(config),
            _ => None,
        }
    }
}

/// Columns used when nothing (valid) is persisted.
#[must_use]
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new(
            "statement-viewer",
            PanelConfig::Statement(StatementConfig::default()),
        )
        .with_sizes(15.0, 50.0, 30.0),
        Column::new(
            "validator-editor",
            PanelConfig::CodeEditor(CodeEditorConfig::new(TemplateKind::Validator)),
        )
        .with_sizes(20.0, 60.0, 35.0),
        Column::new(
            "checker-editor",
            PanelConfig::CodeEditor(CodeEditorConfig::new(TemplateKind::Checker)),
        )
        .with_sizes(20.0, 60.0, 35.0),
    ]
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumn {
    id: String,
    #[serde(rename = "type")]
    kind: ColumnKind,
    config: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_size: Option<f64>,
}

impl TryFrom<RawColumn> for Column {
    type Error = serde_json::Error;

    fn try_from(raw: RawColumn) -> Result<Self, Self::Error> {
        let panel = match raw.kind {
            ColumnKind::Statement => PanelConfig::Statement(serde_json::from_value(raw.config)?),
            ColumnKind::CodeEditor => PanelConfig::CodeEditor(serde_json::from_value(raw.config)?),
            ColumnKind::Assistant => PanelConfig::Assistant(serde_json::from_value(raw.config)?),
        };
        Ok(Self {
            id: raw.id,
            panel,
            min_size: raw.min_size,
            max_size: raw.max_size,
            default_size: raw.default_size,
        })
    }
}

impl From<Column> for RawColumn {
    fn from(column: Column) -> Self {
        let kind = column.kind();
        // Plain structs of strings/bools/enums always serialize.
        let config = match column.panel {
            PanelConfig::Statement(c) => serde_json::to_value(c),
            PanelConfig::CodeEditor(c) => serde_json::to_value(c),
            PanelConfig::Assistant(c) => serde_json::to_value(c),
        }
        .unwrap_or(Value::Null);
        Self {
            id: column.id,
            kind,
            config,
            min_size: column.min_size,
            max_size: column.max_size,
            default_size: column.default_size,
        }
    }
}

// ============ Partial updates ============

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatementPatch {
    pub selected_statement_id: Option<Option<String>>,
    pub view_mode: Option<ViewMode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeEditorPatch {
    pub template_type: Option<TemplateKind>,
    pub code: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
}

impl CodeEditorPatch {
    /// Patch that only replaces the code.
    #[must_use]
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantPatch {
    pub selected_model: Option<String>,
    pub assistant_mode: Option<Option<AssistantMode>>,
    pub review_results: Option<Option<String>>,
    pub is_loading: Option<bool>,
}

/// A partial config update for one column; absent fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigPatch {
    Statement(StatementPatch),
    CodeEditor(CodeEditorPatch),
    Assistant(AssistantPatch),
}

impl From<StatementPatch> for ConfigPatch {
    fn from(patch: StatementPatch) -> Self {
        Self::Statement(patch)
    }
}

impl From<CodeEditorPatch> for ConfigPatch {
    fn from(patch: CodeEditorPatch) -> Self {
        Self::CodeEditor(patch)
    }
}

impl From<AssistantPatch> for ConfigPatch {
    fn from(patch: AssistantPatch) -> Self {
        Self::Assistant(patch)
    }
}

impl ConfigPatch {
    #[must_use]
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Statement(_) => ColumnKind::Statement,
            Self::CodeEditor(_) => ColumnKind::CodeEditor,
            Self::Assistant(_) => ColumnKind::Assistant,
        }
    }

    /// Merge into `column`'s config. Only the config changes; id, kind and sizes do not.
    pub fn apply_to(self, column: &mut Column) -> CoreResult<()> {
        match (self, &mut column.panel) {
            (Self::Statement(patch), PanelConfig::Statement(config)) => {
                if let Some(selected) = patch.selected_statement_id {
                    config.selected_statement_id = selected;
                }
                if let Some(mode) = patch.view_mode {
                    config.view_mode = mode;
                }
            }
            (Self::CodeEditor(patch), PanelConfig::CodeEditor(config)) => {
                if let Some(kind) = patch.template_type {
                    config.template_type = kind;
                }
                if let Some(code) = patch.code {
                    config.code = code;
                }
                if let Some(language) = patch.language {
                    config.language = language;
                }
                if let Some(title) = patch.title {
                    config.title = title;
                }
            }
            (Self::Assistant(patch), PanelConfig::Assistant(config)) => {
                if let Some(model) = patch.selected_model {
                    config.selected_model = model;
                }
                if let Some(mode) = patch.assistant_mode {
                    config.assistant_mode = mode;
                }
                if let Some(results) = patch.review_results {
                    config.review_results = results;
                }
                if let Some(loading) = patch.is_loading {
                    config.is_loading = loading;
                }
            }
            (patch, _) => {
                return Err(CoreError::ColumnKindMismatch {
                    id: column.id.clone(),
                    expected: patch.kind().to_string(),
                });
            }
        }
        Ok(())
    }
}

// ============ Ids ============

/// Timestamp-derived column ids, strictly increasing per generator.
#[derive(Debug, Default)]
pub struct ColumnIdGenerator {
    last: AtomicI64,
}

impl ColumnIdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_stamp(&self) -> i64 {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }

    /// `statement-<ms>`
    pub fn statement(&self) -> String {
        format!("statement-{}", self.next_stamp())
    }

    /// `code-editor-<kind>-<ms>`
    pub fn code_editor(&self, kind: TemplateKind) -> String {
        format!("code-editor-{kind}-{}", self.next_stamp())
    }

    /// `assistant-<ms>`
    pub fn assistant(&self) -> String {
        format!("assistant-{}", self.next_stamp())
    }
}

// ============ Persisted snapshot ============

/// The persisted `{columns, columnSizes}` record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub column_sizes: Vec<f64>,
}
