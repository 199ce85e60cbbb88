//! Service layer providing note CRUD operations on top of `models`.
//! - Separates business rules (not-found policy, views) from persistence.
//! - Persists through a whole-file JSON store with atomic replace.

pub mod errors;
pub mod storage;
pub mod notes;
