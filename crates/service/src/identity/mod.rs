//! Identity: who is signed in, and which stored user that profile maps to.
//!
//! Split the same way as the other service modules (domain, repository, service);
//! the external profile lookup sits behind [`provider::IdentityProvider`].

pub mod domain;
pub mod errors;
pub mod provider;
pub mod repository;
pub mod repo;
pub mod service;
pub mod session;

pub use errors::IdentityError;
pub use service::IdentityResolver;
