//! Service registry: owner-scoped collections addressed by a unique path.

pub mod errors;
pub mod repository;
pub mod repo;
pub mod service;

pub use errors::RegistryError;
pub use repository::{ServiceRepository, MAX_SERVICES_PER_USER};
pub use service::ServiceRegistry;
