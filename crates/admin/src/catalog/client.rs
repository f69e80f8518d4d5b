//! Catalog store HTTP client.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use emporium_core::{
    AdminAccount, AdminSession, NewSession, Product, ProductId, ProductPayload, SessionId,
};

use super::{CatalogError, DEFAULT_FAILURE_MESSAGE, Endpoints};
use crate::config::AdminConfig;

/// Extra headers and an optional JSON body for [`CatalogClient::request`].
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// Merged over the default `Content-Type: application/json`; these win.
    pub headers: HeaderMap,
    /// Serialized as the request body.
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    /// Options carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(body: &B) -> Result<Self, CatalogError> {
        Ok(Self {
            headers: HeaderMap::new(),
            body: Some(serde_json::to_value(body)?),
        })
    }

    /// Add or replace a header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Catalog store API client.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl CatalogClient {
    /// Create a client for the store at `base_url`.
    ///
    /// No request timeout is configured: calls are single attempts that fail
    /// only when the transport does.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the collection URLs
    /// cannot be derived.
    pub fn new(base_url: &Url) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().build()?;
        let endpoints = Endpoints::new(base_url)?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner { client, endpoints }),
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// See [`CatalogClient::new`].
    pub fn from_config(config: &AdminConfig) -> Result<Self, CatalogError> {
        Self::new(&config.api_base_url)
    }

    /// Collection URLs this client talks to.
    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    // =========================================================================
    // Generic request helper
    // =========================================================================

    /// Send one JSON request and parse the JSON response.
    ///
    /// Sets `Content-Type: application/json`, then applies the caller's
    /// headers on top. An empty success body parses as JSON `null`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` with the response text (or "Request failed"
    /// if it is empty) on a non-success status, `CatalogError::Http` on
    /// transport failure, and `CatalogError::Parse` if the body is not the
    /// expected JSON.
    #[instrument(skip(self, options), fields(method = %method, url = %url))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        options: RequestOptions,
    ) -> Result<T, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);

        let mut request = self.inner.client.request(method, url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(serde_json::to_vec(&body)?);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                DEFAULT_FAILURE_MESSAGE.to_string()
            } else {
                text
            };
            warn!(status = status.as_u16(), %message, "Catalog request failed");
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await?;
        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        Ok(serde_json::from_str(body)?)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List every product, sorted by id ascending on the server.
    ///
    /// `null` entries and records without a usable `id` are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        let mut url = self.inner.endpoints.products.clone();
        url.query_pairs_mut()
            .append_pair("_sort", "id")
            .append_pair("_order", "asc");

        let records: Vec<serde_json::Value> =
            self.request(Method::GET, url, RequestOptions::default()).await?;
        let products: Vec<Product> = decode_records("products", records);
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Api` with status 404 if it does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let url = Endpoints::item(&self.inner.endpoints.products, id);
        self.request(Method::GET, url, RequestOptions::default())
            .await
    }

    /// Insert a new product; the store assigns its id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self, payload), fields(name = %payload.name))]
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, CatalogError> {
        let url = self.inner.endpoints.products.clone();
        self.request(Method::POST, url, RequestOptions::json(payload)?)
            .await
    }

    /// Replace a product in full.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self, payload), fields(product_id = %id))]
    pub async fn replace_product(
        &self,
        id: &ProductId,
        payload: &ProductPayload,
    ) -> Result<Product, CatalogError> {
        let url = Endpoints::item(&self.inner.endpoints.products, id);
        self.request(Method::PUT, url, RequestOptions::json(payload)?)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let url = Endpoints::item(&self.inner.endpoints.products, id);
        let _: serde_json::Value = self
            .request(Method::DELETE, url, RequestOptions::default())
            .await?;
        Ok(())
    }

    // =========================================================================
    // Admin accounts and sessions
    // =========================================================================

    /// Find admin accounts matching `email` and `password` exactly.
    ///
    /// # Security
    ///
    /// The store compares plaintext: both values travel as query parameters.
    /// Only use over a trusted transport.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn find_admins(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Vec<AdminAccount>, CatalogError> {
        let mut url = self.inner.endpoints.admins.clone();
        url.query_pairs_mut()
            .append_pair("email", email)
            .append_pair("password", password.expose_secret());

        let records: Vec<serde_json::Value> =
            self.request(Method::GET, url, RequestOptions::default()).await?;
        Ok(decode_records("admins", records))
    }

    /// List every stored session.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> Result<Vec<AdminSession>, CatalogError> {
        let url = self.inner.endpoints.sessions.clone();
        let records: Vec<serde_json::Value> =
            self.request(Method::GET, url, RequestOptions::default()).await?;
        Ok(decode_records("sessions", records))
    }

    /// Insert a session record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self, session), fields(email = %session.email))]
    pub async fn create_session(&self, session: &NewSession) -> Result<AdminSession, CatalogError> {
        let url = self.inner.endpoints.sessions.clone();
        self.request(Method::POST, url, RequestOptions::json(session)?)
            .await
    }

    /// Delete a session record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the request fails.
    #[instrument(skip(self), fields(session_id = %id))]
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), CatalogError> {
        let url = Endpoints::item(&self.inner.endpoints.sessions, id);
        let _: serde_json::Value = self
            .request(Method::DELETE, url, RequestOptions::default())
            .await?;
        Ok(())
    }
}

/// Decode a collection one record at a time.
///
/// `null` entries are dropped silently. Records that still do not fit `T` are
/// dropped with a warning, so one bad record never hides the rest.
fn decode_records<T: DeserializeOwned>(collection: &str, records: Vec<serde_json::Value>) -> Vec<T> {
    records
        .into_iter()
        .enumerate()
        .filter(|(_, record)| !record.is_null())
        .filter_map(|(index, record)| {
            let id = record.get("id").map(ToString::to_string);
            serde_json::from_value(record)
                .inspect_err(|e| {
                    warn!(
                        collection,
                        index,
                        id = id.as_deref().unwrap_or("none"),
                        error = %e,
                        "Skipping malformed record"
                    );
                })
                .ok()
        })
        .collect()
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("endpoints", &self.inner.endpoints)
            .finish_non_exhaustive()
    }
}
