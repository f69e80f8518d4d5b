//! Product records as stored in the catalog.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::id::ProductId;

/// Price label stored when an admin leaves the price blank.
pub const DEFAULT_PRICE_LABEL: &str = "Request Price";

/// Specification key/value pairs.
///
/// Keys are unique. Iteration order is whatever order the store returned,
/// which is what the edit form shows.
pub type Specifications = serde_json::Map<String, serde_json::Value>;

/// A product as read from the catalog store.
///
/// Reads are lenient: only `id` is required. Everything else may be missing,
/// `null` or of an unexpected type, which reads as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    /// Only meaningful when `subcategory` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_subcategory: Option<String>,
    /// Free-text price label, e.g. "$12.50" or "Request Price".
    #[serde(
        default,
        deserialize_with = "text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<String>,
    /// Data URL or remote URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// 0 to 5. Numeric strings such as `"4.5"` are accepted.
    #[serde(
        default,
        deserialize_with = "lenient_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_features")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "lenient_specifications")]
    pub specifications: Specifications,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_new: bool,
}

impl Product {
    /// Create a product with only an id and a name, everything else empty.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: Some(name.into()),
            category: None,
            subcategory: None,
            sub_subcategory: None,
            price: None,
            image: None,
            rating: None,
            description: None,
            detailed_description: None,
            features: Vec::new(),
            specifications: Specifications::new(),
            is_new: false,
        }
    }

    /// Category name, treating an empty string as absent.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        present(self.category.as_deref())
    }

    /// Subcategory name, treating an empty string as absent.
    #[must_use]
    pub fn subcategory_name(&self) -> Option<&str> {
        present(self.subcategory.as_deref())
    }

    /// Sub-subcategory name, treating an empty string as absent.
    #[must_use]
    pub fn sub_subcategory_name(&self) -> Option<&str> {
        present(self.sub_subcategory.as_deref())
    }

    /// The text fields that shopfront search looks at.
    #[must_use]
    pub fn searchable_fields(&self) -> [Option<&str>; 5] {
        [
            self.name.as_deref(),
            self.description.as_deref(),
            self.category.as_deref(),
            self.subcategory.as_deref(),
            self.sub_subcategory.as_deref(),
        ]
    }
}

/// The body sent when creating or replacing a product.
///
/// Unlike [`Product`] every field has a concrete value; blank subcategories are
/// left out of the JSON entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub name: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_subcategory: Option<String>,
    pub price: String,
    pub image: String,
    pub rating: f64,
    pub description: String,
    pub detailed_description: String,
    pub features: Vec<String>,
    pub specifications: Specifications,
    pub is_new: bool,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn lenient_rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let rating = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(rating.filter(|r| r.is_finite()))
}

/// A list of labels. A single comma-separated string is split; numbers keep
/// their text form and any other entry is dropped.
fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_specifications<'de, D>(deserializer: D) -> Result<Specifications, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => map,
        _ => Specifications::new(),
    })
}

/// `true`, `"true"` and non-zero numbers are set; anything else is not.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

/// Accept `"$5"` as well as a bare `5` for price labels.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Option::<Label>::deserialize(deserializer)? {
        Some(Label::Text(s)) => Some(s),
        Some(Label::Number(n)) => Some(n.to_string()),
        None => None,
    })
}
