//! Core types for Libaas.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{SHIPPING_FEE_RUPEES, format_pkr, shipping_fee};
pub use status::*;
