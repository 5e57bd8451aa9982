//! Extension runtime: the background worker answering typed messages, the popup
//! flow that prefills and saves a bookmark, and the tab-change icon hook.

pub mod background;
pub mod messages;
pub mod popup;

pub use background::{spawn_background, spawn_background_from_config, BackgroundHandle, BackgroundWorker, StaticTokenSource, TokenSource};
pub use messages::{ExtensionRequest, ExtensionResponse, MessageError};
pub use popup::{on_tab_updated, Popup, PopupError, PopupSession};
