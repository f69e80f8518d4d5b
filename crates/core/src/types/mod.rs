//! Core types for Emporium.
//!
//! Wire shapes of the records kept by the catalog store, plus type-safe ids.

pub mod account;
pub mod id;
pub mod product;

pub use account::{AdminAccount, AdminSession, NewSession};
pub use id::*;
pub use product::{DEFAULT_PRICE_LABEL, Product, ProductPayload, Specifications};
