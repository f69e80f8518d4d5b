//! Emporium admin library.
//!
//! Client for the catalog store and the admin workspace built on top of it.
//!
//! # Modules
//!
//! - [`catalog`] - JSON client for the products, admins and sessions collections
//! - [`config`] - Environment configuration
//! - [`error`] - Workspace errors and Sentry user context
//! - [`workspace`] - Session, product list and product form state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod workspace;

pub use catalog::{CatalogClient, CatalogError};
pub use config::AdminConfig;
pub use error::WorkspaceError;
pub use workspace::{AdminWorkspace, AuthState, Confirm, WorkspaceState};
