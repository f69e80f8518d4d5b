//! Command implementations.
//!
//! Each command builds a fresh client from configuration. Admin commands
//! mount a workspace, which adopts the latest active session stored in the
//! catalog backend.

#![allow(clippy::print_stdout)]

pub mod products;
pub mod search;
pub mod session;

use std::path::PathBuf;

use thiserror::Error;

use emporium_admin::{AdminConfig, AdminWorkspace, CatalogClient, CatalogError, WorkspaceError};
use emporium_core::{DEFAULT_PRICE_LABEL, Product};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Catalog backend request failed outside the workspace.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Workspace operation failed.
    #[error("{}", .0.user_message())]
    Workspace(#[from] WorkspaceError),

    /// Image file could not be read.
    #[error("Could not read image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Admin command run without an active session.
    #[error("Not signed in. Run `emporium login` first.")]
    NotSignedIn,

    /// The workspace reported a failure in its state.
    #[error("{0}")]
    Failed(String),
}

/// Client for the configured backend.
fn client(config: &AdminConfig) -> Result<CatalogClient, CommandError> {
    Ok(CatalogClient::from_config(config)?)
}

/// Mount a workspace and require an adopted session.
async fn signed_in_workspace(config: &AdminConfig) -> Result<AdminWorkspace, CommandError> {
    let workspace = AdminWorkspace::mount(client(config)?).await;
    let state = workspace.snapshot().await;
    if !state.is_authenticated() {
        return Err(CommandError::NotSignedIn);
    }
    if let Some(message) = state.product_error {
        return Err(CommandError::Failed(message));
    }
    Ok(workspace)
}

/// Category path, e.g. `Beverages > Coffee > Espresso`.
fn category_path(product: &Product) -> String {
    [
        product.category_name(),
        product.subcategory_name(),
        product.sub_subcategory_name(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" > ")
}

/// One line per product.
fn print_products<'a>(products: impl IntoIterator<Item = &'a Product>) {
    let mut count = 0_usize;
    for product in products {
        count += 1;
        println!(
            "{:>6}  {}  [{}]  {}{}",
            product.id.to_string(),
            product.name.as_deref().unwrap_or("(unnamed)"),
            category_path(product),
            product.price.as_deref().unwrap_or(DEFAULT_PRICE_LABEL),
            if product.is_new { "  NEW" } else { "" },
        );
    }
    if count == 0 {
        println!("No products found.");
    }
}
