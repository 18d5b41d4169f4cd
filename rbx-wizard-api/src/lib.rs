//! # rbx-wizard-api
//!
//! HTTP client and typed endpoint services for the rbx-wizard problem-package backend.
//!
//! ## Layers
//!
//! - [`ApiClient`]: one request primitive with a configurable base URL, default headers,
//!   query parameters, a per-request deadline and normalized errors.
//! - Services ([`StatementsService`], [`CodeTemplatesService`], [`LlmService`]): one method
//!   per remote operation, exposed through the [`StatementsApi`], [`CodeTemplatesApi`] and
//!   [`ReviewApi`] traits so callers can substitute fakes.
//!
//! ## Feature Flags
//!
//! - **`native-tls`** *(default)*: use the platform's native TLS implementation.
//! - **`rustls`**: use rustls.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rbx_wizard_api::{ApiClient, ClientConfig, StatementsApi, StatementsService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ClientConfig::new("http://localhost:8000"));
//!     let statements = StatementsService::new(client);
//!
//!     for statement in statements.list_statements().await? {
//!         println!("{} ({:?})", statement.name, statement.language);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, ApiError>`](ApiError):
//!
//! - [`ApiError::Timeout`]: the deadline elapsed (distinct from other transport failures)
//! - [`ApiError::HttpStatus`]: non-success status with the backend's `message`/`detail`
//! - [`ApiError::NetworkError`]: connection-level failure
//!
//! Nothing is retried.

mod config;
mod error;
mod http_client;
mod services;
mod traits;
mod types;
mod utils;

pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use error::{ApiError, Result};
pub use http_client::{ApiClient, RequestOptions, RequestTimeout, ResponseBody};
pub use reqwest::Method;
pub use services::{CodeTemplatesService, LlmService, StatementsService};
pub use traits::{CodeTemplatesApi, ReviewApi, StatementsApi};
pub use types::{
    CodeResponse, ModelsResponse, ReviewReport, ReviewRequest, SaveCodeRequest, Statement,
    StatementBuildResponse, StatementLanguageReviewRequest, StatementsResponse, TemplateKind,
};
pub use utils::log_sanitizer;
