pub mod errors;
pub mod note;
pub mod sort;
pub mod views;

pub use note::{NewNote, Note, NotePatch};
pub use sort::{SortField, SortOrder, SortSpec};
pub use views::{NoteDetail, NoteSummary};
