//! Page capture: pull bookmark metadata out of the active tab's document.

pub mod metadata;
pub mod tab;

use thiserror::Error;

pub use metadata::{extract_metadata, PageMetadata};
pub use tab::{ActiveTab, HttpTabSource, StaticTabSource, TabCapture, TabSource};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no active tab")]
    NoActiveTab,
    #[error("page cannot be captured: {0}")]
    RestrictedPage(String),
    #[error("failed to read page: {0}")]
    Document(String),
}
