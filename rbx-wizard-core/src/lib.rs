//! rbx-wizard Core Library
//!
//! Client-side state core of the rbx-wizard problem workbench:
//! - Column registry (panel identity, order and layout, persisted locally)
//! - Remote resource cache (memoized, deduplicated backend reads)
//! - Shared editable documents (one buffer and save status per resource, debounced auto-save)
//! - Statement, editor and review services built on the three above
//!
//! The library is platform-independent: backend access goes through the traits of
//! `rbx-wizard-api` and durable state through [`StateStorage`].

pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{ServiceContext, Workbench};
pub use traits::{DocumentSaver, InMemoryStateStorage, StateStorage};
