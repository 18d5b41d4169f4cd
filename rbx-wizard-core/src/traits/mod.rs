//! Storage layer abstraction trait definition

mod document_saver;
mod state_storage;

pub use document_saver::DocumentSaver;
pub use state_storage::{InMemoryStateStorage, StateStorage};
