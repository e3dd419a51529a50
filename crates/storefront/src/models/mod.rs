//! Domain types mirroring the content store's document shapes.
//!
//! Store documents use camelCase field names on the wire; the serde renames
//! here keep the Rust types idiomatic while staying byte-compatible with the
//! existing dataset.

pub mod order;
pub mod product;
pub mod user;

pub use order::{LineItem, NewOrder, Order, OrderSnapshot, ShippingInfo};
pub use product::Product;
pub use user::{Address, ProfileUpdate, User};
