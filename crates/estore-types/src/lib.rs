//! Foundation types for the e-store ledger.
//!
//! Every other `estore` crate depends on `estore-types`. The only entity the
//! store tracks is a [`Product`]: a listing released by a vendor that can be
//! bought exactly once.
//!
//! # Key Types
//!
//! - [`Product`]: immutable product record with pure state transitions
//! - [`is_truthy`]: the `bought` normalization rule shared by every entry point

pub mod error;
pub mod product;

pub use error::TypeError;
pub use product::{is_truthy, is_truthy_str, Product};
