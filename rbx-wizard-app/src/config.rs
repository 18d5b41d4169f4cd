//! Application configuration
//!
//! Every value has a default; the environment can override:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `RBX_WIZARD_API_URL` | backend base URL |
//! | `RBX_WIZARD_TIMEOUT_MS` | request deadline in milliseconds |
//! | `RBX_WIZARD_AUTOSAVE_MS` | auto-save debounce in milliseconds |
//! | `RBX_WIZARD_STATE_DIR` | directory of the persisted local state |

use std::path::PathBuf;
use std::time::Duration;

use rbx_wizard_api::ClientConfig;
use rbx_wizard_core::types::WorkbenchSettings;

pub const ENV_API_URL: &str = "RBX_WIZARD_API_URL";
pub const ENV_TIMEOUT_MS: &str = "RBX_WIZARD_TIMEOUT_MS";
pub const ENV_AUTOSAVE_MS: &str = "RBX_WIZARD_AUTOSAVE_MS";
pub const ENV_STATE_DIR: &str = "RBX_WIZARD_STATE_DIR";

/// Directory name under the platform data directory.
const APP_DIR_NAME: &str = "rbx-wizard";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    pub settings: WorkbenchSettings,
    /// Where [`JsonFileStateStorage`](crate::adapters::JsonFileStateStorage) keeps its files.
    pub state_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            settings: WorkbenchSettings::default(),
            state_dir: default_state_dir(),
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            config.client = ClientConfig::new(url.trim());
            // The PDF artifacts are served by the same backend.
            config.settings.pdf_base_url.clone_from(&config.client.base_url);
        }
        if let Some(timeout) = parse_millis(&lookup, ENV_TIMEOUT_MS) {
            config.client.timeout = timeout;
        }
        if let Some(debounce) = parse_millis(&lookup, ENV_AUTOSAVE_MS) {
            config.settings.autosave_debounce = debounce;
        }
        if let Some(dir) = lookup(ENV_STATE_DIR).filter(|v| !v.trim().is_empty()) {
            config.state_dir = PathBuf::from(dir);
        }

        config
    }
}

fn parse_millis<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(e) => {
            log::warn!("Ignoring {name}={raw:?}: {e}");
            None
        }
    }
}

/// Platform data directory:
/// - Linux: `~/.local/share/rbx-wizard/`
/// - macOS: `~/Library/Application Support/rbx-wizard/`
/// - Windows: `%LOCALAPPDATA%/rbx-wizard/`
///
/// Falls back to the working directory when the platform has none.
fn default_state_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
