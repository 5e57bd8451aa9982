//! Service layer for the bookmark app.
//! - Identity resolution, page capture, the bookmark form and saved-state check.
//! - Repositories sit behind traits with SeaORM and in-memory implementations.
//! - The extension side (background worker, popup flow) is driven through typed messages.

pub mod errors;
pub mod identity;
pub mod capture;
pub mod bookmark;
pub mod saved_state;
pub mod registry;
pub mod extension;
#[cfg(test)]
pub mod test_support;
