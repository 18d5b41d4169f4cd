//! Workbench behavior settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Quiet period after the last edit before an auto-save fires.
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

/// How long `saved` / `error` stay visible before reverting to `idle`.
pub const DEFAULT_STATUS_DISPLAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbenchSettings {
    pub autosave_debounce: Duration,
    pub status_display: Duration,
    /// Base URL statement PDFs are served from.
    pub pdf_base_url: String,
}

impl Default for WorkbenchSettings {
    fn default() -> Self {
        Self {
            autosave_debounce: DEFAULT_AUTOSAVE_DEBOUNCE,
            status_display: DEFAULT_STATUS_DISPLAY,
            pdf_base_url: rbx_wizard_api::DEFAULT_BASE_URL.to_string(),
        }
    }
}
