pub mod errors;
pub mod db;
pub mod user;
pub mod service;
pub mod bookmark;

#[cfg(test)]
mod tests;
