//! Product form state.
//!
//! The form holds everything as editable text and converts to and from the
//! stored [`Product`] shape at the edges: [`ProductForm::from_product`] when
//! an admin starts editing, [`ProductForm::to_payload`] on submit.

use thiserror::Error;

use emporium_core::{DEFAULT_PRICE_LABEL, Product, ProductId, ProductPayload, Specifications};

/// Rating text a fresh form starts with.
pub const DEFAULT_RATING_TEXT: &str = "4.8";

/// Local validation failure; no request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Name and category are required.")]
    MissingRequired,
}

/// One editable specification entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecificationRow {
    pub key: String,
    pub value: String,
}

impl SpecificationRow {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// The local file behind the form's current image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Editable product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductForm {
    /// Set while editing an existing product; submit replaces instead of inserting.
    pub id: Option<ProductId>,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub sub_subcategory: String,
    pub price: String,
    /// Data URL or remote URL.
    pub image: String,
    pub image_file: Option<AttachedImage>,
    pub rating: String,
    pub description: String,
    pub detailed_description: String,
    /// Comma-separated.
    pub features: String,
    pub specifications: Vec<SpecificationRow>,
    pub is_new: bool,
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            category: String::new(),
            subcategory: String::new(),
            sub_subcategory: String::new(),
            price: String::new(),
            image: String::new(),
            image_file: None,
            rating: DEFAULT_RATING_TEXT.to_string(),
            description: String::new(),
            detailed_description: String::new(),
            features: String::new(),
            specifications: Vec::new(),
            is_new: false,
        }
    }
}

impl ProductForm {
    /// Seed the form from an existing product.
    ///
    /// Specification rows follow the product's mapping order; non-string
    /// values are rendered as JSON text.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        let specifications = product
            .specifications
            .iter()
            .map(|(key, value)| {
                let value = value
                    .as_str()
                    .map_or_else(|| value.to_string(), str::to_owned);
                SpecificationRow::new(key.clone(), value)
            })
            .collect();

        Self {
            id: Some(product.id.clone()),
            name: product.name.clone().unwrap_or_default(),
            category: product.category.clone().unwrap_or_default(),
            subcategory: product.subcategory.clone().unwrap_or_default(),
            sub_subcategory: product.sub_subcategory.clone().unwrap_or_default(),
            price: product.price.clone().unwrap_or_default(),
            image: product.image.clone().unwrap_or_default(),
            image_file: None,
            rating: product
                .rating
                .map_or_else(|| "0".to_string(), |r| r.to_string()),
            description: product.description.clone().unwrap_or_default(),
            detailed_description: product.detailed_description.clone().unwrap_or_default(),
            features: product.features.join(", "),
            specifications,
            is_new: product.is_new,
        }
    }

    /// Whether submit will replace an existing product.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.id.is_some()
    }

    /// Change the category. Clears subcategory and sub-subcategory.
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
        self.subcategory.clear();
        self.sub_subcategory.clear();
    }

    /// Change the subcategory. Clears the sub-subcategory.
    pub fn set_subcategory(&mut self, subcategory: impl Into<String>) {
        self.subcategory = subcategory.into();
        self.sub_subcategory.clear();
    }

    /// Append an empty specification row.
    pub fn add_specification(&mut self) {
        self.specifications.push(SpecificationRow::default());
    }

    /// Edit the row at `index`. Returns `false` if there is no such row.
    pub fn set_specification(
        &mut self,
        index: usize,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> bool {
        match self.specifications.get_mut(index) {
            Some(row) => {
                row.key = key.into();
                row.value = value.into();
                true
            }
            None => false,
        }
    }

    /// Drop the row at `index`, if any.
    pub fn remove_specification(&mut self, index: usize) {
        if index < self.specifications.len() {
            self.specifications.remove(index);
        }
    }

    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MissingRequired` if name or category is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() || self.category.trim().is_empty() {
            return Err(ValidationError::MissingRequired);
        }
        Ok(())
    }

    /// Build the body for a create or replace request.
    #[must_use]
    pub fn to_payload(&self) -> ProductPayload {
        ProductPayload {
            name: self.name.clone(),
            category: self.category.clone(),
            subcategory: non_blank(&self.subcategory),
            sub_subcategory: non_blank(&self.sub_subcategory),
            price: if self.price.is_empty() {
                DEFAULT_PRICE_LABEL.to_string()
            } else {
                self.price.clone()
            },
            image: self.image.clone(),
            rating: parse_rating(&self.rating),
            description: self.description.clone(),
            detailed_description: self.detailed_description.clone(),
            features: split_features(&self.features),
            specifications: collect_specifications(&self.specifications),
            is_new: self.is_new,
        }
    }
}

/// Split comma-separated feature text into trimmed, non-empty entries.
#[must_use]
pub fn split_features(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Fold rows into a mapping, dropping rows with a blank key or value.
///
/// A repeated key keeps the position of its first row and the value of its last.
#[must_use]
pub fn collect_specifications(rows: &[SpecificationRow]) -> Specifications {
    let mut specifications = Specifications::new();
    for row in rows {
        if row.key.is_empty() || row.value.is_empty() {
            continue;
        }
        specifications.insert(
            row.key.clone(),
            serde_json::Value::String(row.value.clone()),
        );
    }
    specifications
}

/// Parse rating text; anything unparseable counts as 0.
fn parse_rating(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .unwrap_or(0.0)
}

fn non_blank(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn coffee_form() -> ProductForm {
        ProductForm {
            name: "Coffee".to_string(),
            category: "Beverages".to_string(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_default_form() {
        let form = ProductForm::default();
        assert_eq!(form.rating, "4.8");
        assert!(!form.is_editing());
        assert!(form.specifications.is_empty());
    }

    #[test]
    fn test_blank_price_uses_default_label() {
        let payload = coffee_form().to_payload();
        assert_eq!(payload.price, "Request Price");
        assert_eq!(payload.name, "Coffee");
        assert_eq!(payload.category, "Beverages");
    }

    #[test]
    fn test_features_are_split_and_trimmed() {
        let mut form = coffee_form();
        form.features = "a, b ,c".to_string();
        assert_eq!(form.to_payload().features, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_features_are_dropped() {
        assert!(split_features("").is_empty());
        assert_eq!(split_features(" , x ,, "), vec!["x"]);
    }

    #[test]
    fn test_rating_parsing() {
        let mut form = coffee_form();
        assert!((form.to_payload().rating - 4.8).abs() < f64::EPSILON);

        form.rating = " 3 ".to_string();
        assert!((form.to_payload().rating - 3.0).abs() < f64::EPSILON);

        form.rating = "great".to_string();
        assert!(form.to_payload().rating.abs() < f64::EPSILON);

        form.rating = "NaN".to_string();
        assert!(form.to_payload().rating.abs() < f64::EPSILON);
    }

    #[test]
    fn test_specification_rows_become_mapping() {
        let rows = vec![
            SpecificationRow::new("Weight", "250g"),
            SpecificationRow::new("", "orphan value"),
            SpecificationRow::new("Origin", ""),
            SpecificationRow::new("Roast", "Dark"),
            SpecificationRow::new("Weight", "500g"),
        ];
        let specs = collect_specifications(&rows);
        assert_eq!(
            serde_json::Value::Object(specs.clone()),
            json!({"Weight": "500g", "Roast": "Dark"})
        );
        assert_eq!(specs.keys().collect::<Vec<_>>(), vec!["Weight", "Roast"]);
    }

    #[test]
    fn test_blank_subcategories_are_omitted() {
        let mut form = coffee_form();
        form.sub_subcategory = "Espresso".to_string();
        let payload = form.to_payload();
        assert_eq!(payload.subcategory, None);
        assert_eq!(payload.sub_subcategory.as_deref(), Some("Espresso"));
    }

    #[test]
    fn test_validation() {
        assert!(coffee_form().validate().is_ok());

        let mut form = coffee_form();
        form.name.clear();
        assert_eq!(form.validate(), Err(ValidationError::MissingRequired));

        let mut form = coffee_form();
        form.category = "   ".to_string();
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Name and category are required."
        );
    }

    #[test]
    fn test_category_change_clears_lower_levels() {
        let mut form = coffee_form();
        form.subcategory = "Hot".to_string();
        form.sub_subcategory = "Filter".to_string();

        form.set_subcategory("Cold");
        assert_eq!(form.subcategory, "Cold");
        assert!(form.sub_subcategory.is_empty());

        form.sub_subcategory = "Nitro".to_string();
        form.set_category("Food");
        assert!(form.subcategory.is_empty());
        assert!(form.sub_subcategory.is_empty());
    }

    #[test]
    fn test_specification_row_editing() {
        let mut form = coffee_form();
        form.add_specification();
        form.add_specification();
        assert!(form.set_specification(1, "Size", "Large"));
        assert!(!form.set_specification(5, "x", "y"));
        form.remove_specification(0);
        form.remove_specification(9);
        assert_eq!(form.specifications, vec![SpecificationRow::new("Size", "Large")]);
    }

    #[test]
    fn test_from_product() {
        let product: Product = serde_json::from_value(json!({
            "id": 12,
            "name": "Grinder",
            "category": "Equipment",
            "rating": 4,
            "features": ["Burr", "Quiet"],
            "specifications": {"Power": "150W", "Settings": 40, "Portable": false},
            "isNew": true
        }))
        .unwrap();

        let form = ProductForm::from_product(&product);
        assert_eq!(form.id, Some(ProductId::new(12)));
        assert_eq!(form.rating, "4");
        assert_eq!(form.features, "Burr, Quiet");
        assert_eq!(form.subcategory, "");
        assert!(form.is_new);
        assert_eq!(
            form.specifications,
            vec![
                SpecificationRow::new("Power", "150W"),
                SpecificationRow::new("Settings", "40"),
                SpecificationRow::new("Portable", "false"),
            ]
        );
    }

    #[test]
    fn test_from_product_without_rating() {
        let product = Product::new(ProductId::new(1), "Filter papers");
        assert_eq!(ProductForm::from_product(&product).rating, "0");
    }

    #[test]
    fn test_edit_then_submit_keeps_values() {
        let mut product = Product::new(ProductId::new(5), "Kettle");
        product.category = Some("Equipment".to_string());
        product.price = Some("$40".to_string());
        product.features = vec!["Gooseneck".to_string()];

        let payload = ProductForm::from_product(&product).to_payload();
        assert_eq!(payload.price, "$40");
        assert_eq!(payload.features, vec!["Gooseneck"]);
        assert!(payload.rating.abs() < f64::EPSILON);
    }
}
