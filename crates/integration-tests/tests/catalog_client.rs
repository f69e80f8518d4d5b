//! Integration tests for the catalog client against the mock store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use chrono::Utc;
use emporium_admin::CatalogError;
use emporium_admin::catalog::RequestOptions;
use emporium_core::{NewSession, ProductId, ProductPayload, Specifications};
use emporium_integration_tests::MockStore;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use secrecy::SecretString;
use serde_json::{Value, json};

fn payload(name: &str, category: &str) -> ProductPayload {
    ProductPayload {
        name: name.to_string(),
        category: category.to_string(),
        subcategory: None,
        sub_subcategory: None,
        price: "Request Price".to_string(),
        image: String::new(),
        rating: 4.8,
        description: String::new(),
        detailed_description: String::new(),
        features: Vec::new(),
        specifications: Specifications::new(),
        is_new: false,
    }
}

// =============================================================================
// Request helper
// =============================================================================

#[tokio::test]
async fn test_error_body_becomes_message() {
    let store = MockStore::start().await;
    store
        .fail(Method::GET, "products", StatusCode::INTERNAL_SERVER_ERROR, "database locked")
        .await;

    let err = store.client().list_products().await.unwrap_err();
    assert!(matches!(err, CatalogError::Api { status: 500, .. }));
    assert_eq!(err.to_string(), "database locked");
}

#[tokio::test]
async fn test_empty_error_body_uses_default_message() {
    let store = MockStore::start().await;
    store
        .fail(Method::DELETE, "products", StatusCode::BAD_GATEWAY, "")
        .await;

    let err = store
        .client()
        .delete_product(&ProductId::new(1))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.to_string(), "Request failed");
}

#[tokio::test]
async fn test_request_headers_and_body() {
    let store = MockStore::start().await;
    let client = store.client();

    let options = RequestOptions::json(&json!({"name": "Tea", "category": "Beverages"}))
        .unwrap()
        .header(AUTHORIZATION, HeaderValue::from_static("Bearer token"));
    let created: Value = client
        .request(Method::POST, client.endpoints().products.clone(), options)
        .await
        .unwrap();
    assert_eq!(created["name"], "Tea");
    assert_eq!(created["id"], 1);

    let requests = store.requests().await;
    let request = requests.last().unwrap();
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer token");
    assert_eq!(request.body.as_ref().unwrap()["category"], "Beverages");
}

#[tokio::test]
async fn test_caller_headers_win() {
    let store = MockStore::start().await;
    let client = store.client();

    let options = RequestOptions::json(&json!({"name": "Tea"}))
        .unwrap()
        .header(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
    let _: Value = client
        .request(Method::POST, client.endpoints().products.clone(), options)
        .await
        .unwrap();

    let requests = store.requests().await;
    assert_eq!(
        requests.last().unwrap().content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );
}

#[tokio::test]
async fn test_unreachable_store_is_http_error() {
    let store = MockStore::start().await;
    let client = emporium_admin::CatalogClient::new(
        &url::Url::parse("http://127.0.0.1:9").unwrap(),
    )
    .unwrap();
    let err = client.list_sessions().await.unwrap_err();
    assert!(matches!(err, CatalogError::Http(_)));
    assert_eq!(store.request_count().await, 0);
}

// =============================================================================
// Products
// =============================================================================

#[tokio::test]
async fn test_list_products_sorted_and_skips_nulls() {
    let store = MockStore::start().await;
    store.insert("products", json!({"id": 3, "name": "C"})).await;
    store.insert("products", json!({"id": 1, "name": "A"})).await;
    store.insert("products", Value::Null).await;
    store.insert("products", json!({"id": 2, "name": "B"})).await;

    let products = store.client().list_products().await.unwrap();
    let names: Vec<_> = products.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    let requests = store.requests().await;
    assert_eq!(requests[0].path, "/products");
    assert_eq!(
        requests[0].query_pairs(),
        vec![
            ("_sort".to_string(), "id".to_string()),
            ("_order".to_string(), "asc".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_list_products_tolerates_mistyped_fields() {
    let store = MockStore::start().await;
    store
        .insert("products", json!({"id": 1, "name": "Espresso", "rating": 4.9}))
        .await;
    store
        .insert(
            "products",
            json!({"id": 2, "name": "Grinder", "rating": "4.5", "isNew": "true", "specifications": "none"}),
        )
        .await;
    store
        .insert("products", json!({"id": 3.5, "name": "Scale"}))
        .await;
    store
        .insert("products", json!({"id": [3], "name": "Unreadable"}))
        .await;

    let products = store.client().list_products().await.unwrap();
    let names: Vec<_> = products.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(names, vec!["Espresso", "Grinder", "Scale"]);

    let grinder = &products[1];
    assert_eq!(grinder.rating, Some(4.5));
    assert!(grinder.is_new);
    assert!(grinder.specifications.is_empty());
    assert_eq!(products[2].id.to_string(), "3.5");
}

#[tokio::test]
async fn test_list_sessions_skips_unreadable_records() {
    let store = MockStore::start().await;
    store
        .insert("sessions", json!({"id": 1, "isActive": "false"}))
        .await;
    store
        .insert("sessions", json!({"id": null, "isActive": true}))
        .await;

    let sessions = store.client().list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert!(!sessions[0].is_active());
}

#[tokio::test]
async fn test_product_crud() {
    let store = MockStore::start().await;
    let client = store.client();

    let created = client.create_product(&payload("Kettle", "Equipment")).await.unwrap();
    assert_eq!(created.id, ProductId::new(1));
    assert_eq!(created.price.as_deref(), Some("Request Price"));

    let mut update = payload("Kettle", "Equipment");
    update.price = "$40".to_string();
    let replaced = client.replace_product(&created.id, &update).await.unwrap();
    assert_eq!(replaced.price.as_deref(), Some("$40"));

    let fetched = client.get_product(&created.id).await.unwrap();
    assert_eq!(fetched.price.as_deref(), Some("$40"));

    client.delete_product(&created.id).await.unwrap();
    let err = client.get_product(&created.id).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_payload_omits_blank_subcategories() {
    let store = MockStore::start().await;
    store
        .client()
        .create_product(&payload("Kettle", "Equipment"))
        .await
        .unwrap();

    let records = store.records("products").await;
    let record = records[0].as_object().unwrap();
    assert!(!record.contains_key("subcategory"));
    assert!(!record.contains_key("subSubcategory"));
    assert_eq!(record["isNew"], false);
    assert_eq!(record["detailedDescription"], "");
}

#[tokio::test]
async fn test_string_ids_round_trip() {
    let store = MockStore::start().await;
    store
        .insert("products", json!({"id": "a1b2", "name": "Mug"}))
        .await;

    let client = store.client();
    let products = client.list_products().await.unwrap();
    assert_eq!(products[0].id.to_string(), "a1b2");

    client.delete_product(&products[0].id).await.unwrap();
    assert!(store.records("products").await.is_empty());
}

// =============================================================================
// Admins and sessions
// =============================================================================

#[tokio::test]
async fn test_find_admins_sends_credentials_as_query() {
    let store = MockStore::start().await;
    store
        .seed_admin("admin@example.com", "p&ss word", Some("Ada"))
        .await;
    let client = store.client();

    let found = client
        .find_admins("admin@example.com", &SecretString::from("p&ss word"))
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].display_name(), "Ada");

    let none = client
        .find_admins("admin@example.com", &SecretString::from("wrong"))
        .await
        .unwrap();
    assert!(none.is_empty());

    let requests = store.requests().await;
    assert!(
        requests[0]
            .query_pairs()
            .contains(&("password".to_string(), "p&ss word".to_string()))
    );
}

#[tokio::test]
async fn test_session_lifecycle() {
    let store = MockStore::start().await;
    let admin = store.seed_admin("admin@example.com", "secret", None).await;
    let client = store.client();

    let account = client
        .find_admins("admin@example.com", &SecretString::from("secret"))
        .await
        .unwrap()
        .remove(0);
    let session = client
        .create_session(&NewSession::for_account(&account, Utc::now()))
        .await
        .unwrap();
    assert_eq!(session.admin_name.as_deref(), Some("admin@example.com"));

    let record = &store.records("sessions").await[0];
    assert_eq!(record["adminId"], admin["id"]);
    assert_eq!(record["isActive"], true);

    let sessions = client.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 1);

    client.delete_session(&session.id).await.unwrap();
    assert!(client.list_sessions().await.unwrap().is_empty());
}
