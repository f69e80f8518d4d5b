//! Emporium Core - Shared catalog types and pure catalog logic.
//!
//! This crate provides what every Emporium component agrees on:
//! - `admin` - Catalog client and the admin workspace
//! - `cli` - Command-line shopfront search and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Products, record identifiers, admin accounts and sessions
//! - [`filter`] - Free-text product search
//! - [`hierarchy`] - Category/subcategory/sub-subcategory tree derived from products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod filter;
pub mod hierarchy;
pub mod types;

pub use filter::filter_products;
pub use hierarchy::{CategoryHierarchy, Subcategories};
pub use types::*;
