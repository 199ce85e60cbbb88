//! Storage abstractions for service layer
//!
//! File-backed stores that persist small collections as JSON documents.

pub mod json_array_store;

pub use json_array_store::{JsonArrayStore, Outcome};
