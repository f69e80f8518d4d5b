//! Shopfront search.

use emporium_admin::AdminConfig;
use emporium_core::filter_products;

use super::{CommandError, client, print_products};

/// Print products matching `query`. No sign-in needed.
pub async fn search(config: &AdminConfig, query: &str) -> Result<(), CommandError> {
    let products = client(config)?.list_products().await?;
    let matches = filter_products(&products, query);
    tracing::debug!(query, matches = matches.len(), "Searched catalog");
    print_products(matches);
    Ok(())
}
