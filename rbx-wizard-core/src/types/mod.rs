//! Type definition module

mod column;
mod document;
mod review;
mod settings;

pub use column::{
    default_columns, AssistantConfig, AssistantMode, AssistantPatch, CodeEditorConfig,
    CodeEditorPatch, Column, ColumnIdGenerator, ColumnKind, ConfigPatch, LayoutSnapshot,
    PanelConfig, StatementConfig, StatementPatch, ViewMode, DEFAULT_LANGUAGE, DEFAULT_MODEL,
};
pub use document::{DocumentKey, DocumentState, SaveOutcome, SaveStatus};
pub use review::{legacy_to_markdown, report_to_markdown};
pub use settings::{WorkbenchSettings, DEFAULT_AUTOSAVE_DEBOUNCE, DEFAULT_STATUS_DISPLAY};

// Re-export api library types used across the core
pub use rbx_wizard_api::{
    CodeResponse, ReviewReport, ReviewRequest, Statement, StatementBuildResponse,
    StatementLanguageReviewRequest, TemplateKind,
};
