//! Shopfront product search.
//!
//! A linear, case-insensitive substring match over a handful of text fields.
//! Cheap enough to run on every keystroke.

use crate::types::Product;

/// Return the products matching `query`.
///
/// A product matches when its name, description, category, subcategory or
/// sub-subcategory contains `query`, ignoring case. Missing fields never
/// match. An empty query returns every product in the original order.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    if query.is_empty() {
        return products.iter().collect();
    }

    let needle = query.to_lowercase();
    products
        .iter()
        .filter(|product| matches(product, &needle))
        .collect()
}

fn matches(product: &Product, needle: &str) -> bool {
    product
        .searchable_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(needle))
}
