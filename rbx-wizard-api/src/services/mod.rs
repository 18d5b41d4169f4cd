//! Typed endpoint wrappers over [`ApiClient`](crate::ApiClient).

mod code_templates;
mod llm;
mod statements;

pub use code_templates::CodeTemplatesService;
pub use llm::LlmService;
pub use statements::StatementsService;
