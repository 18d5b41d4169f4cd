//! Shared document persistence abstract Trait

use async_trait::async_trait;

use crate::error::CoreResult;

/// Writes a shared document's text to its backing resource
///
/// Implementations must not retry; a failure is reported to the document,
/// which keeps the buffer for the next attempt.
#[async_trait]
pub trait DocumentSaver: Send + Sync {
    async fn save(&self, text: &str) -> CoreResult<()>;
}
