//! Platform-agnostic storage adapters.

mod json_file_storage;

pub use json_file_storage::JsonFileStateStorage;
