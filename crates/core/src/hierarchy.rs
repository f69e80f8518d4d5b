//! Category hierarchy derived from the product list.
//!
//! Products carry up to three levels of classification: category,
//! subcategory and sub-subcategory. The admin form offers cascading choices
//! built from what existing products already use. Each category is stored in
//! one of two shapes:
//!
//! - [`Subcategories::Flat`] - a plain list of subcategory names, when no
//!   product in the category has a sub-subcategory.
//! - [`Subcategories::Nested`] - subcategory names mapped to their
//!   sub-subcategory names, once any product in the category has one.
//!
//! The shape tells the form whether to render one dropdown or a two-level
//! cascade. A `Flat` category is upgraded to `Nested` in place the first time
//! a product with a sub-subcategory shows up; existing subcategories keep
//! their position with no children.
//!
//! Every list keeps first-seen order and holds no duplicates. The result is
//! recomputed from scratch whenever the product list changes.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::Product;

/// Subcategory structure of a single category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcategories {
    /// Subcategory names with no further nesting.
    Flat(Vec<String>),
    /// Subcategory names, each with its sub-subcategory names.
    Nested(Vec<(String, Vec<String>)>),
}

impl Subcategories {
    fn seed(subcategory: Option<&str>, sub_subcategory: Option<&str>) -> Self {
        match (subcategory, sub_subcategory) {
            (Some(sub), Some(subsub)) => {
                Self::Nested(vec![(sub.to_owned(), vec![subsub.to_owned()])])
            }
            (Some(sub), None) => Self::Flat(vec![sub.to_owned()]),
            (None, _) => Self::Flat(Vec::new()),
        }
    }

    fn merge(&mut self, subcategory: Option<&str>, sub_subcategory: Option<&str>) {
        match (subcategory, sub_subcategory) {
            (Some(sub), Some(subsub)) => {
                self.upgrade();
                if let Self::Nested(entries) = self {
                    if let Some((_, children)) = entries.iter_mut().find(|(n, _)| n == sub) {
                        if !children.iter().any(|c| c == subsub) {
                            children.push(subsub.to_owned());
                        }
                    } else {
                        entries.push((sub.to_owned(), vec![subsub.to_owned()]));
                    }
                }
            }
            (Some(sub), None) => match self {
                Self::Flat(names) => {
                    if !names.iter().any(|n| n == sub) {
                        names.push(sub.to_owned());
                    }
                }
                Self::Nested(entries) => {
                    if !entries.iter().any(|(n, _)| n == sub) {
                        entries.push((sub.to_owned(), Vec::new()));
                    }
                }
            },
            (None, _) => {}
        }
    }

    /// Turn a flat list into a mapping whose existing names have no children.
    fn upgrade(&mut self) {
        if let Self::Flat(names) = self {
            let entries = std::mem::take(names)
                .into_iter()
                .map(|name| (name, Vec::new()))
                .collect();
            *self = Self::Nested(entries);
        }
    }

    /// Whether this category has a second level.
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }

    /// Subcategory names in first-seen order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Flat(names) => names.iter().map(String::as_str).collect(),
            Self::Nested(entries) => entries.iter().map(|(n, _)| n.as_str()).collect(),
        }
    }

    /// Sub-subcategory names under `subcategory`; empty for flat categories.
    #[must_use]
    pub fn children(&self, subcategory: &str) -> &[String] {
        match self {
            Self::Flat(_) => &[],
            Self::Nested(entries) => entries
                .iter()
                .find(|(n, _)| n == subcategory)
                .map(|(_, children)| children.as_slice())
                .unwrap_or_default(),
        }
    }
}

impl Serialize for Subcategories {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Flat(names) => names.serialize(serializer),
            Self::Nested(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (name, children) in entries {
                    map.serialize_entry(name, children)?;
                }
                map.end()
            }
        }
    }
}

/// Categories in first-seen order, each with its subcategory structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryHierarchy {
    entries: Vec<(String, Subcategories)>,
}

impl CategoryHierarchy {
    /// Fold `products` left to right into a hierarchy.
    ///
    /// Products without a category are skipped.
    #[must_use]
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let mut hierarchy = Self::default();
        for product in products {
            hierarchy.add(product);
        }
        hierarchy
    }

    /// Merge one product into the hierarchy.
    pub fn add(&mut self, product: &Product) {
        let Some(category) = product.category_name() else {
            return;
        };
        let sub = product.subcategory_name();
        let subsub = product.sub_subcategory_name();

        match self.entries.iter_mut().find(|(name, _)| name == category) {
            Some((_, subcategories)) => subcategories.merge(sub, subsub),
            None => self
                .entries
                .push((category.to_owned(), Subcategories::seed(sub, subsub))),
        }
    }

    /// Structure recorded for `category`.
    #[must_use]
    pub fn get(&self, category: &str) -> Option<&Subcategories> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, subcategories)| subcategories)
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Subcategory names of `category`, or nothing for an unknown category.
    #[must_use]
    pub fn subcategories(&self, category: &str) -> Vec<&str> {
        self.get(category).map(Subcategories::names).unwrap_or_default()
    }

    /// Sub-subcategory names under `category` / `subcategory`.
    #[must_use]
    pub fn sub_subcategories(&self, category: &str, subcategory: &str) -> &[String] {
        self.get(category)
            .map(|subcategories| subcategories.children(subcategory))
            .unwrap_or_default()
    }

    /// Number of categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no product had a category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for CategoryHierarchy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, subcategories) in &self.entries {
            map.serialize_entry(name, subcategories)?;
        }
        map.end()
    }
}
