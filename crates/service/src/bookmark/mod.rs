//! Bookmarks: persistence plus the edit-and-save form the popup drives.

pub mod form;
pub mod repository;
pub mod repo;

pub use form::{BookmarkForm, BookmarkFormController, FieldEdit, FormError, FormState};
pub use repository::BookmarkRepository;
