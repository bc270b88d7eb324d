//! Suggestion provider implementations.
//!
//! Every deployed provider speaks the same HTTP contract, so one client type
//! implements [`crate::provider::Suggester`]; the variants differ only in
//! name, endpoint, and declared capabilities.

pub mod suggestion_api;

pub use suggestion_api::SuggestionApi;
