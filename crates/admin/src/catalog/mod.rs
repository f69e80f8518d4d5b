//! Catalog store API client.
//!
//! Talks to a json-server style document store that exposes three
//! collections: products, admin accounts and sessions.
//!
//! # Architecture
//!
//! - One base URL, read from configuration at startup
//! - A generic JSON request helper: single attempt, no retry, no timeout
//! - Named operations for every collection call the workspace makes

pub mod client;

pub use client::{CatalogClient, RequestOptions};

use std::fmt::Display;

use thiserror::Error;
use url::Url;

/// Message used when the store fails a request without saying why.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Request failed";

/// Errors that can occur when talking to the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The store could not be reached or the transfer failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    ///
    /// `message` is the response body, or [`DEFAULT_FAILURE_MESSAGE`] when
    /// the body was empty.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The response body was not the JSON we expected.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A resource URL could not be built from the base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl CatalogError {
    /// HTTP status for API errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Collection URLs derived from the base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Product records.
    pub products: Url,
    /// Admin accounts (queried by email and password).
    pub admins: Url,
    /// Admin sessions.
    pub sessions: Url,
}

impl Endpoints {
    /// Derive collection URLs from `base`.
    ///
    /// A path prefix on the base URL is kept, so `https://host/api` yields
    /// `https://host/api/products`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidUrl` if a collection path cannot be joined.
    pub fn new(base: &Url) -> Result<Self, CatalogError> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);

        Ok(Self {
            products: base.join("products")?,
            admins: base.join("admins")?,
            sessions: base.join("sessions")?,
        })
    }

    /// URL of one record in `collection`.
    #[must_use]
    pub fn item(collection: &Url, id: &impl Display) -> Url {
        let mut url = collection.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&id.to_string());
        }
        url
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_from_root() {
        let endpoints = Endpoints::new(&Url::parse("http://localhost:5000").unwrap()).unwrap();
        assert_eq!(endpoints.products.as_str(), "http://localhost:5000/products");
        assert_eq!(endpoints.admins.as_str(), "http://localhost:5000/admins");
        assert_eq!(endpoints.sessions.as_str(), "http://localhost:5000/sessions");
    }

    #[test]
    fn test_endpoints_keep_path_prefix() {
        let base = Url::parse("https://store.example.com/api/v1?debug=1").unwrap();
        let endpoints = Endpoints::new(&base).unwrap();
        assert_eq!(
            endpoints.products.as_str(),
            "https://store.example.com/api/v1/products"
        );
    }

    #[test]
    fn test_item_url_escapes_id() {
        let endpoints = Endpoints::new(&Url::parse("http://localhost:5000/").unwrap()).unwrap();
        assert_eq!(
            Endpoints::item(&endpoints.products, &7).as_str(),
            "http://localhost:5000/products/7"
        );
        assert_eq!(
            Endpoints::item(&endpoints.sessions, &"a b").as_str(),
            "http://localhost:5000/sessions/a%20b"
        );
    }

    #[test]
    fn test_api_error_displays_body() {
        let err = CatalogError::Api {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(err.to_string(), "Not Found");
        assert_eq!(err.status(), Some(404));
    }
}
