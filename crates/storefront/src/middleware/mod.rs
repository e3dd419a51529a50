//! Request middleware and extractors.

pub mod auth;

pub use auth::{Identity, bearer_token};
