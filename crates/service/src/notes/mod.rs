//! Notes module: repository abstraction, file-backed implementation and service.

pub mod repository;
pub mod repo;
pub mod service;

pub use repo::file::FileNoteRepository;
pub use service::NoteService;
